use anyhow::{bail, Context, Result};
use log::info;
use tokio::{task::JoinHandle, time::Duration};
use tokio_util::sync::CancellationToken;

use super::{
    loop_worker::{poll_loop, PollWorker, ReadingListener},
    PriceCell, PriceClient, PriceReading,
};

pub struct PricePoller {
    worker: PollWorker,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl PricePoller {
    pub fn new(client: PriceClient, interval: Duration, listener: Option<ReadingListener>) -> Self {
        Self {
            worker: PollWorker::new(client, PriceCell::new(), listener),
            interval,
            handle: None,
            cancel_token: None,
        }
    }

    /// Handle for polls outside the timer. Shares the in-flight guard.
    pub fn worker(&self) -> PollWorker {
        self.worker.clone()
    }

    pub fn reading(&self) -> PriceReading {
        self.worker.cell().snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("price poller already active");
        }
        if self.worker.cell().is_disposed() {
            bail!("price poller was stopped and cannot restart");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.worker.clone(),
            self.interval,
            cancel_token.clone(),
        ));

        info!("price poller started (every {:?})", self.interval);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Stops the timer for good. The cell is sealed first, so a tick or an
    /// in-flight request that completes afterwards writes nothing.
    pub async fn stop(&mut self) -> Result<()> {
        self.worker.cell().dispose();

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("price poll loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Drop for PricePoller {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
