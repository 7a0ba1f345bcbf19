//! # Miner
//!
//! This module defines a mining job: a candidate block detached from the chain, which can be
//! mined on a worker thread and then handed back to the chain.

use super::mine_until;
use crate::blockchain::{Block, BlockchainResult, Hash256};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A candidate block waiting for its proof of work
#[derive(Debug)]
pub struct MiningJob {
    block: Block,
    difficulty: u32,
    cancel: Arc<AtomicBool>,
}

/// Result of a `MiningJob`. The block is always returned, so its transactions can be
/// given back to the pending queue if mining failed
#[derive(Debug)]
pub struct MiningOutcome {
    pub block: Block,
    pub result: BlockchainResult<Hash256>,
}

impl MiningJob {
    /// Instantiates a new `MiningJob`
    pub(crate) fn new(block: Block, difficulty: u32) -> Self {
        Self {
            block,
            difficulty,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the candidate block
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Get the difficulty the block is mined with
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Get a handle to cancel the job while it's running
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run the proof of work. CPU bound: never call it from an async task directly
    pub fn run(mut self) -> MiningOutcome {
        let result = mine_until(&mut self.block, self.difficulty, &self.cancel);
        MiningOutcome {
            block: self.block,
            result,
        }
    }
}
