//! Learning from user interactions

pub mod ledger;
pub mod learner;
pub mod persistence;
