//! # Mining
//!
//! this module exposes the proof-of-work engine.
//!
//! A block is mined when every byte of its hash is less than or equal to the corresponding
//! byte of the target derived from the difficulty (the number of leading zero bits).

mod miner;

pub use miner::{MiningJob, MiningOutcome};

use crate::blockchain::{Block, BlockchainError, BlockchainResult, Hash256, HASH_SIZE};

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};

/// Nonces tried between two checks of the cancel flag
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Above this difficulty, exhausting the nonce space is the likely outcome
const IMPRACTICAL_DIFFICULTY: u32 = 32;

/// Generate the target for `leading_zeros` bits: the first `leading_zeros / 8` bytes are zero,
/// the next byte is `2^(8 - leading_zeros % 8) - 1` and the remaining bytes are `0xff`.
///
/// A difficulty of 256 bits or more gives an all-zero target
pub fn generate_target(leading_zeros: u32) -> [u8; HASH_SIZE] {
    let mut target = [0xff; HASH_SIZE];
    let zero_bytes = (leading_zeros / 8) as usize;
    if zero_bytes >= HASH_SIZE {
        return [0; HASH_SIZE];
    }
    target[..zero_bytes].fill(0);
    target[zero_bytes] = ((1u16 << (8 - leading_zeros % 8)) - 1) as u8;
    target
}

/// Returns whether every byte of `hash` is less or equal than the byte of `target` at the same position
pub fn meets_target(hash: &Hash256, target: &[u8; HASH_SIZE]) -> bool {
    hash.as_bytes().iter().zip(target.iter()).all(|(h, t)| h <= t)
}

/// Search a nonce which makes the block hash meet the target for `difficulty`.
///
/// Nonces are tried from 0 upward; the nonce of the block is left to the last attempted value,
/// also on failure.
pub fn mine(block: &mut Block, difficulty: u32) -> BlockchainResult<Hash256> {
    mine_until(block, difficulty, &AtomicBool::new(false))
}

/// Same as `mine`, but gives up with `MiningCancelled` once `cancel` is set
pub fn mine_until(
    block: &mut Block,
    difficulty: u32,
    cancel: &AtomicBool,
) -> BlockchainResult<Hash256> {
    if difficulty > IMPRACTICAL_DIFFICULTY {
        warn!(
            "difficulty {} may be unsolvable within the nonce space",
            difficulty
        );
    }
    mine_range(block, difficulty, 0..=u32::MAX, cancel)
}

/// Try the nonces in `nonces`, in order; fails with `NoValidNonce` once the range is exhausted
pub(crate) fn mine_range(
    block: &mut Block,
    difficulty: u32,
    nonces: RangeInclusive<u32>,
    cancel: &AtomicBool,
) -> BlockchainResult<Hash256> {
    let target = generate_target(difficulty);
    debug!(
        "mining block #{} with difficulty {} (nonces {:?})",
        block.number(),
        difficulty,
        nonces
    );
    for (attempt, nonce) in nonces.enumerate() {
        if attempt % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            info!("mining of block #{} cancelled", block.number());
            return Err(BlockchainError::MiningCancelled);
        }
        block.set_nonce(nonce);
        let hash = block.hash();
        if meets_target(&hash, &target) {
            debug!("block #{} mined with nonce {}", block.number(), nonce);
            return Ok(hash);
        }
    }
    Err(BlockchainError::NoValidNonce(difficulty))
}
