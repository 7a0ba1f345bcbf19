//! # Blockchain
//!
//! Blockchain module expose all the layers concerning the blockchain implementation

// -- modules
mod block;
mod database;
mod errors;

pub use block::{
    decode_body, encode_body, now_millis, recompute_txhash, Block, Hash256, Header, Transaction,
    BLOCK_VERSION, HASH_SIZE, HEADER_SIZE, MAX_TRANSACTION_SIZE,
};
pub use database::{BlockchainDatabase, Verification};
pub use errors::{BlockchainError, BlockchainResult};

use crate::mining::{MiningJob, MiningOutcome};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use std::collections::VecDeque;
use std::iter;
use std::path::{Path, PathBuf};

/// Default directory of the chain
pub const DEFAULT_CHAIN_DIR: &str = "./blockchain";

/// Options to open a `Chain`
#[derive(Debug, Clone)]
pub struct ChainOptions {
    /// directory containing the block files
    pub path: PathBuf,
    /// verify hash linkage of the stored blocks while opening the chain
    pub verify_on_load: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CHAIN_DIR),
            verify_on_load: true,
        }
    }
}

impl ChainOptions {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn verify_on_load(mut self, verify: bool) -> Self {
        self.verify_on_load = verify;
        self
    }
}

/// Event emitted by the chain once a block has been committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A block has been added to the chain
    BlockAdded { number: u32, hash: Hash256 },
    /// A transaction has been observed in the block with number `block`
    Transaction {
        block: u32,
        transaction: Transaction,
    },
}

/// The main blockchain struct: owns the chain database, the tail of the chain and the
/// pending transactions
#[derive(Debug)]
pub struct Chain {
    database: BlockchainDatabase,
    /// last committed block; `None` if the chain is empty
    tail: Option<Block>,
    /// transactions not included in any block yet
    pending: VecDeque<Transaction>,
    /// whether a `MiningJob` is out
    mining: bool,
    subscribers: Vec<UnboundedSender<ChainEvent>>,
    /// result of the verification run while opening the chain
    verification: Option<Verification>,
}

impl Chain {
    /// Open the chain stored at `options.path`.
    ///
    /// If the directory contains no block, the genesis block is created.
    /// Otherwise, if `verify_on_load` is set, the blocks are verified from genesis: if the
    /// verification fails, the chain is usable only up to the last verified block.
    /// Without verification the tail is the highest block which can be decoded.
    /// Block files after the tail are moved aside (see `BlockchainDatabase::truncate_to`).
    pub fn open(options: ChainOptions) -> BlockchainResult<Self> {
        let database = BlockchainDatabase::load(&options.path)?;
        let mut chain = Self {
            database,
            tail: None,
            pending: VecDeque::new(),
            mining: false,
            subscribers: Vec::new(),
            verification: None,
        };
        let last_number = match chain.database.last_number() {
            Some(n) => n,
            None => {
                info!("chain is empty; creating genesis block");
                chain.add_block(Block::genesis())?;
                return Ok(chain);
            }
        };
        let tail_number = if options.verify_on_load {
            let verification = chain.database.verify(0);
            chain.verification = Some(verification);
            if verification.fully_verified {
                info!("blockchain verified up to last block (#{})", last_number);
            } else {
                warn!(
                    "blockchain could only be verified up to block #{}. Last local block: #{}",
                    verification.verified_up_to as i64 - 1,
                    last_number
                );
            }
            verification
                .verified_up_to
                .checked_sub(1)
                .map(|x| x as u32)
                .filter(|x| *x <= last_number)
        } else {
            Some(last_number)
        };
        chain.tail = chain.find_tail(tail_number)?;
        let tail_number = chain.tail_number();
        if tail_number != Some(last_number) {
            warn!(
                "chain truncated to block {:?}; last local block was #{}",
                tail_number, last_number
            );
            chain.database.truncate_to(tail_number)?;
        }
        Ok(chain)
    }

    /// Find the highest readable block, starting from `from` and walking down
    fn find_tail(&mut self, from: Option<u32>) -> BlockchainResult<Option<Block>> {
        let mut number = match from {
            Some(n) => n,
            None => return Ok(None),
        };
        loop {
            match self.database.get_block(number) {
                Ok(block) => return Ok(Some(block.clone())),
                Err(BlockchainError::Io(err)) => return Err(BlockchainError::Io(err)),
                Err(err) => warn!("block #{} is unusable: {}", number, err),
            }
            number = match number.checked_sub(1) {
                Some(n) => n,
                None => return Ok(None),
            };
        }
    }

    /// Get the chain directory
    pub fn path(&self) -> &Path {
        self.database.path()
    }

    /// Result of the verification run while opening the chain, if any
    pub fn verification(&self) -> Option<Verification> {
        self.verification
    }

    /// Get the last committed block
    pub fn tail(&self) -> Option<&Block> {
        self.tail.as_ref()
    }

    /// Get the number of the last committed block; `None` if the chain is empty
    pub fn tail_number(&self) -> Option<u32> {
        self.tail.as_ref().map(|x| x.number())
    }

    /// Get committed block with `number`
    pub fn get_block(&mut self, number: u32) -> BlockchainResult<&Block> {
        match self.tail_number() {
            Some(tail) if number <= tail => self.database.get_block(number),
            _ => Err(BlockchainError::BlockNotFound(number)),
        }
    }

    /// Verify stored blocks starting from `start`.
    /// The chain is fully verified if verification reached the tail
    pub fn verify(&mut self, start: u32) -> Verification {
        let verification = self.database.verify(start);
        let end = self.tail_number().map(|x| x as u64 + 1).unwrap_or_default();
        Verification {
            verified_up_to: verification.verified_up_to.min(end.max(start as u64)),
            fully_verified: verification.verified_up_to >= end,
        }
    }

    /// Subscribe to chain events
    pub fn subscribe(&mut self) -> UnboundedReceiver<ChainEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Queue a transaction to be included in the next mined block
    pub fn add_transaction(&mut self, transaction: Transaction) {
        debug!(
            "queued transaction ({} bytes); {} pending",
            transaction.byte_len(),
            self.pending.len() + 1
        );
        self.pending.push_back(transaction);
    }

    /// Iterate over pending transactions, in queue order
    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.pending.iter()
    }

    /// Amount of pending transactions
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns whether a mining job is currently out
    pub fn is_mining(&self) -> bool {
        self.mining
    }

    /// Push new block to the end of the blockchain.
    ///
    /// The block is accepted if it's the genesis block of an empty chain, or if it follows
    /// the tail and is linked to it. An accepted block is written to the database before the
    /// tail moves. Returns whether the block has been accepted.
    pub fn add_block(&mut self, block: Block) -> BlockchainResult<bool> {
        let accepted = match self.tail.as_ref() {
            None => block.number() == 0,
            Some(tail) => block.number() != 0 && block.validate(Some(tail)),
        };
        if !accepted {
            debug!(
                "rejected block #{} (tail: {:?})",
                block.number(),
                self.tail_number()
            );
            return Ok(false);
        }
        self.database.save(&block)?;
        info!("added block #{} ({})", block.number(), block.hash());
        self.notify(&block);
        self.tail = Some(block);
        Ok(true)
    }

    /// Drain up to `batch_limit` pending transactions (all of them if `None`) into a new
    /// candidate block following the tail.
    ///
    /// Only one job can be out at a time: the job must be given back with `complete_mining`
    pub fn prepare_mining(
        &mut self,
        difficulty: u32,
        batch_limit: Option<usize>,
    ) -> BlockchainResult<MiningJob> {
        if self.mining {
            return Err(BlockchainError::MiningInProgress);
        }
        let (number, prevhash) = match self.tail.as_ref() {
            None => (0, Hash256::ZERO),
            Some(tail) => (
                tail.number()
                    .checked_add(1)
                    .ok_or_else(|| BlockchainError::malformed("block number overflow"))?,
                tail.hash(),
            ),
        };
        let amount = batch_limit
            .unwrap_or(usize::MAX)
            .min(self.pending.len());
        let transactions: Vec<Transaction> = self.pending.drain(..amount).collect();
        debug!(
            "preparing block #{} with {} transactions; {} left pending",
            number,
            transactions.len(),
            self.pending.len()
        );
        self.mining = true;
        Ok(MiningJob::new(
            Block::new(number, prevhash, now_millis(), transactions),
            difficulty,
        ))
    }

    /// Give back the outcome of a `MiningJob`.
    ///
    /// A mined block is added to the chain; if mining failed or the block has been rejected,
    /// its transactions are put back in front of the pending queue, in their original order
    pub fn complete_mining(&mut self, outcome: MiningOutcome) -> BlockchainResult<bool> {
        self.mining = false;
        let MiningOutcome { block, result } = outcome;
        if let Err(err) = result {
            error!("could not mine block #{}: {}", block.number(), err);
            self.requeue(block.into_transactions());
            return Err(err);
        }
        let transactions = block.transactions().to_vec();
        match self.add_block(block) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!("mined block has been rejected; transactions are pending again");
                self.requeue(transactions);
                Ok(false)
            }
            Err(err) => {
                self.requeue(transactions);
                Err(err)
            }
        }
    }

    /// Mine a block with up to `batch_limit` pending transactions and add it to the chain.
    ///
    /// Runs the proof of work on the calling thread
    pub fn mine(&mut self, difficulty: u32, batch_limit: Option<usize>) -> BlockchainResult<bool> {
        let job = self.prepare_mining(difficulty, batch_limit)?;
        let outcome = job.run();
        self.complete_mining(outcome)
    }

    fn requeue(&mut self, transactions: Vec<Transaction>) {
        for transaction in transactions.into_iter().rev() {
            self.pending.push_front(transaction);
        }
    }

    fn notify(&mut self, block: &Block) {
        let number = block.number();
        let events: Vec<ChainEvent> = iter::once(ChainEvent::BlockAdded {
            number,
            hash: block.hash(),
        })
        .chain(
            block
                .transactions()
                .iter()
                .cloned()
                .map(|transaction| ChainEvent::Transaction {
                    block: number,
                    transaction,
                }),
        )
        .collect();
        self.subscribers.retain(|subscriber| {
            events
                .iter()
                .all(|event| subscriber.unbounded_send(event.clone()).is_ok())
        });
    }
}
