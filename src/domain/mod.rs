pub mod direct_debit;
