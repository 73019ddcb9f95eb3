pub mod clock;
pub mod config;
pub mod metrics;
pub mod persistence;
pub mod sepa;
