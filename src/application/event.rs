//! # event
//!
//! Contains application events

use cryptonotes::blockchain::ChainEvent;
use cryptonotes::mining::MiningOutcome;

/// Event emitted by the application scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Time to mine the pending transactions
    MineBlock,
}

/// Application event
#[derive(Debug)]
pub enum AppEvent {
    Scheduler(SchedulerEvent),
    /// A mining job has returned
    Mined(MiningOutcome),
    Chain(ChainEvent),
    Shutdown,
    None,
}
