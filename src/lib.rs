//! # Cryptonotes
//!
//! A tamper-evident note ledger: notes are stored in a content store and their metadata ids
//! are recorded on a local proof-of-work blockchain.

#[macro_use]
extern crate serde;
#[macro_use]
extern crate tracing;

pub mod blockchain;
pub mod bridge;
pub mod mining;
pub mod notes;
