//! # Application
//!
//! the application module is the core of the cryptonotes client

// -- modules
mod config;
mod event;
mod note_helper;
mod scheduler;

pub use config::Config;

use event::{AppEvent, SchedulerEvent};
use note_helper::NoteHelper;
use scheduler::Scheduler;

use cryptonotes::blockchain::{Chain, ChainEvent, ChainOptions};
use cryptonotes::bridge::content_store::LocalContentStore;
use cryptonotes::mining::MiningOutcome;
use cryptonotes::notes::NoteIndex;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cryptonotes client application
pub struct Application {
    blockchain: Chain,
    chain_events: UnboundedReceiver<ChainEvent>,
    config: Config,
    content_store: LocalContentStore,
    mining_cancel: Option<Arc<AtomicBool>>,
    mining_receiver: UnboundedReceiver<MiningOutcome>,
    mining_sender: UnboundedSender<MiningOutcome>,
    notes: NoteIndex,
}

impl Application {
    /// Initialize new `Application`
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        // setup blockchain
        let options = ChainOptions::new(config.blockchain_dir())
            .verify_on_load(config.verify_on_load());
        let mut blockchain = tokio::task::spawn_blocking(move || Chain::open(options)).await??;
        info!(
            "blockchain ready at {}! Last block: {:?}",
            blockchain.path().display(),
            blockchain.tail_number()
        );
        // setup content store
        let content_store = LocalContentStore::init(config.content_dir()).map_err(|e| {
            anyhow::anyhow!(
                "failed to open content store at {}: {}",
                config.content_dir().display(),
                e
            )
        })?;
        let notes = NoteHelper::rebuild_index(&mut blockchain, &content_store)?;
        let chain_events = blockchain.subscribe();
        let (mining_sender, mining_receiver) = mpsc::unbounded();
        Ok(Self {
            blockchain,
            chain_events,
            config,
            content_store,
            mining_cancel: None,
            mining_receiver,
            mining_sender,
            notes,
        })
    }

    /// Submit the note at `path` to the chain
    pub async fn add_note_file(&mut self, path: &Path) -> anyhow::Result<()> {
        NoteHelper::add_note_file(path, &mut self.blockchain, &self.content_store)
            .await
            .map(|_| ())
    }

    /// Get notes found on the chain
    #[allow(dead_code)]
    pub fn notes(&self) -> &NoteIndex {
        &self.notes
    }

    /// Mine the pending transactions into a single block, then return.
    /// Returns whether a block has been added to the chain
    pub async fn mine_once(&mut self) -> anyhow::Result<bool> {
        if self.blockchain.pending_len() == 0 {
            info!("no pending notes; nothing to mine");
            return Ok(false);
        }
        let job = self
            .blockchain
            .prepare_mining(self.config.difficulty(), self.config.batch_limit())?;
        let outcome = tokio::task::spawn_blocking(move || job.run()).await?;
        let added = self.blockchain.complete_mining(outcome)?;
        while let Ok(event) = self.chain_events.try_recv() {
            self.on_chain_event(event);
        }
        Ok(added)
    }

    /// run application
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut scheduler = Scheduler::new().await?;
        scheduler.configure(self.config.mining_schedule()).await?;
        info!("scheduler started");
        // main loop
        loop {
            let event: AppEvent = tokio::select! {
                event = scheduler.select_next_some() => AppEvent::Scheduler(event),
                outcome = self.mining_receiver.next() => {
                    match outcome {
                        Some(outcome) => AppEvent::Mined(outcome),
                        None => AppEvent::None,
                    }
                }
                event = self.chain_events.next() => {
                    match event {
                        Some(event) => AppEvent::Chain(event),
                        None => AppEvent::None,
                    }
                }
                _ = tokio::signal::ctrl_c() => AppEvent::Shutdown,
            };
            match event {
                AppEvent::Scheduler(SchedulerEvent::MineBlock) => self.start_mining(),
                AppEvent::Mined(outcome) => self.on_block_mined(outcome),
                AppEvent::Chain(event) => self.on_chain_event(event),
                AppEvent::Shutdown => {
                    self.shutdown().await;
                    return Ok(());
                }
                AppEvent::None => {}
            }
        }
    }

    /// Start a mining job on the blocking thread pool
    fn start_mining(&mut self) {
        if self.blockchain.is_mining() {
            debug!("a block is already being mined");
            return;
        }
        if self.blockchain.pending_len() == 0 {
            debug!("no pending notes; nothing to mine");
            return;
        }
        let job = match self
            .blockchain
            .prepare_mining(self.config.difficulty(), self.config.batch_limit())
        {
            Ok(job) => job,
            Err(err) => {
                error!("could not prepare mining job: {}", err);
                return;
            }
        };
        info!(
            "mining block #{} with {} notes (difficulty {})",
            job.block().number(),
            job.block().transactions().len(),
            job.difficulty()
        );
        self.mining_cancel = Some(job.cancel_handle());
        let sender = self.mining_sender.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = job.run();
            if let Err(err) = sender.unbounded_send(outcome) {
                error!("failed to send mining outcome: {}", err);
            }
        });
    }

    /// code to run when a mining job returns
    fn on_block_mined(&mut self, outcome: MiningOutcome) {
        self.mining_cancel = None;
        let number = outcome.block.number();
        match self.blockchain.complete_mining(outcome) {
            Ok(true) => debug!("mined block #{} added to the chain", number),
            Ok(false) => warn!("mined block #{} has been rejected", number),
            Err(err) if err.is_retryable() => {
                warn!("block #{} not mined ({}); will retry later", number, err)
            }
            Err(err) => error!("failed to add mined block #{}: {}", number, err),
        }
    }

    /// code to run on chain event
    fn on_chain_event(&mut self, event: ChainEvent) {
        match event {
            ChainEvent::BlockAdded { number, hash } => {
                info!("block #{} committed with hash {}", number, hash);
            }
            ChainEvent::Transaction { block, transaction } => {
                if NoteHelper::index_transaction(
                    &mut self.notes,
                    &self.content_store,
                    block,
                    &transaction,
                ) {
                    info!("note recorded in block #{}", block);
                }
            }
        }
    }

    /// Cancel the running mining job, if any, and wait for it
    async fn shutdown(&mut self) {
        info!("shutting down...");
        if let Some(cancel) = self.mining_cancel.take() {
            cancel.store(true, Ordering::Relaxed);
            if let Some(outcome) = self.mining_receiver.next().await {
                self.on_block_mined(outcome);
            }
        }
        let pending = self.blockchain.pending_len();
        if pending > 0 {
            warn!("{} notes have not been recorded on the chain", pending);
        }
    }
}
