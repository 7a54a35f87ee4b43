pub mod inventory;
pub mod ledger;
pub mod manager;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use ledger::ReviewLedger;
pub use manager::{CirculationManager, LOAN_PERIOD_DAYS};
