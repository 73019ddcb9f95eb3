//! Application layer
//!
//! Use cases turning operator commands into calls on the direct debit
//! service and shaping the results for the HTTP adapters.

pub mod direct_debit;
