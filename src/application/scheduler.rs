//! # Application scheduler
//!
//! This module expose the job scheduler for the application

use super::SchedulerEvent;

use futures::{
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    stream::SelectNextSome,
    StreamExt,
};
use tokio_cron_scheduler::{Job, JobScheduler};

/// Application scheduler
pub struct Scheduler {
    scheduler: JobScheduler,
    event_sender: UnboundedSender<SchedulerEvent>,
    event_receiver: UnboundedReceiver<SchedulerEvent>,
}

impl Scheduler {
    /// Instantiates a new scheduler
    pub async fn new() -> anyhow::Result<Self> {
        debug!("initializing scheduler");
        let scheduler = match JobScheduler::new().await {
            Ok(s) => s,
            Err(err) => {
                anyhow::bail!("Failed to initialize job scheduler: {}", err.to_string());
            }
        };
        let (event_sender, event_receiver) = mpsc::unbounded();
        Ok(Self {
            scheduler,
            event_sender,
            event_receiver,
        })
    }

    /// Wait for the next scheduler event.
    /// The stream never ends, since the scheduler holds a sender
    pub fn select_next_some(&mut self) -> SelectNextSome<'_, UnboundedReceiver<SchedulerEvent>> {
        self.event_receiver.select_next_some()
    }

    /// Setup scheduler and start it
    pub async fn configure(&mut self, mining_schedule: &str) -> anyhow::Result<()> {
        self.setup_mine_block_job(mining_schedule).await?;
        if let Err(err) = self.scheduler.start().await {
            anyhow::bail!("could not start scheduler: {}", err);
        }
        Ok(())
    }

    /// Setup mine block job
    async fn setup_mine_block_job(&mut self, schedule: &str) -> anyhow::Result<()> {
        let event_sender = self.event_sender.clone();
        let mining_job = match Job::new(schedule, move |_uuid, _lock| {
            if let Err(err) = event_sender.unbounded_send(SchedulerEvent::MineBlock) {
                error!("failed to send to receiver (thread): {}", err);
            }
        }) {
            Ok(j) => j,
            Err(err) => {
                anyhow::bail!("could not create MineBlock job ({}): {}", schedule, err);
            }
        };
        if let Err(err) = self.scheduler.add(mining_job).await {
            anyhow::bail!("could not schedule MineBlock job: {}", err);
        }
        debug!("MineBlock job scheduled at {}", schedule);
        Ok(())
    }
}
