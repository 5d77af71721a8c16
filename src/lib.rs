//! AENZ chain simulator: an in-memory mock blockchain whose gas price is
//! steered by a rule-based network advisor.
//!
//! [`simulation::Simulation`] wires everything together. The
//! [`ledger::Ledger`] mines mock blocks on a fixed period, the
//! [`advisor::NetworkAdvisor`] scans recent throughput on another, and the
//! [`staking::StakingDesk`] accrues rewards on a third. Observers subscribe
//! to [`events::SimEvent`]s through the [`events::EventBus`].

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod advisor;
pub mod config;
pub mod error;
pub mod events;
pub mod fees;
pub mod ids;
pub mod ledger;
pub mod model;
pub mod scheduler;
pub mod simulation;
pub mod staking;

pub use advisor::{NetworkAdvisor, NetworkStatus, ScanOutcome};
pub use config::SimulationConfig;
pub use error::{LedgerError, Result, SimulationError};
pub use ledger::Ledger;
pub use simulation::Simulation;

/// Lock a mutex, recovering the data if a previous holder panicked.
/// Every update to the shared state leaves it consistent between statements,
/// so the data behind a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
