use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use log::debug;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{PriceCell, PriceClient, PriceReading};
use crate::{log_error, log_info};

const ENABLE_LOGS: bool = true;

pub type ReadingListener = Arc<dyn Fn(&PriceReading) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    Failed,
    /// Another poll was still running.
    Skipped,
    /// The view went away; nothing was written.
    Discarded,
}

/// Runs single polls against the shared cell. At most one poll is in
/// flight per worker (clones share the guard).
#[derive(Clone)]
pub struct PollWorker {
    client: PriceClient,
    cell: PriceCell,
    in_flight: Arc<AtomicBool>,
    listener: Option<ReadingListener>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Clears `loading` if the poll future is dropped before it finishes.
struct Completion<'a> {
    worker: &'a PollWorker,
    done: bool,
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.worker.apply(PriceReading::finish);
        }
    }
}

impl PollWorker {
    pub fn new(client: PriceClient, cell: PriceCell, listener: Option<ReadingListener>) -> Self {
        Self {
            client,
            cell,
            in_flight: Arc::new(AtomicBool::new(false)),
            listener,
        }
    }

    pub fn cell(&self) -> &PriceCell {
        &self.cell
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn apply(&self, change: impl FnOnce(&mut PriceReading)) -> bool {
        let Some(reading) = self.cell.update(change) else {
            return false;
        };
        if let Some(listener) = &self.listener {
            listener(&reading);
        }
        true
    }

    pub async fn poll_once(&self) -> PollOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("price poll already in flight; dropping this one");
            return PollOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.in_flight);

        if !self.apply(PriceReading::begin) {
            return PollOutcome::Discarded;
        }
        let mut completion = Completion {
            worker: self,
            done: false,
        };

        let result = self.client.fetch_price().await;
        completion.done = true;

        let (applied, outcome) = match &result {
            Ok(value) => {
                let applied = self.apply(|reading| {
                    reading.succeed(*value, Utc::now());
                    reading.finish();
                });
                (applied, PollOutcome::Updated)
            }
            Err(err) => {
                log_error!("price poll failed: {err} ({})", err.detail());
                let applied = self.apply(|reading| {
                    reading.fail(err.to_string());
                    reading.finish();
                });
                (applied, PollOutcome::Failed)
            }
        };

        if !applied {
            log_info!("discarding price poll result; view already unmounted");
            return PollOutcome::Discarded;
        }
        outcome
    }
}

/// Polls immediately, then once per `interval` until cancelled. Ticks that
/// land while a poll is running are skipped rather than queued.
pub async fn poll_loop(worker: PollWorker, interval: Duration, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("price poll loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => {
                        log_info!("price poll loop cancelled mid-poll");
                        break;
                    }
                    outcome = worker.poll_once() => {
                        debug!("price poll finished: {outcome:?}");
                    }
                }
            }
        }
    }
}
