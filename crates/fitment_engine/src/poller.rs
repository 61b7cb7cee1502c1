//! Cooperative, cancelable progress polling.
//!
//! A [`Poller`] runs one read at a time: the next wait starts only after the
//! previous read settled. Each reading is folded into the last known sample
//! with [`ProgressSample::absorb`] before it is handed to `on_sample`. Failed
//! reads are retried on the next tick and hand the last known sample out
//! again, so they never advance progress.
//! Cancellation is observed before each read, while a read is in flight and
//! before each sample is handed out.

use std::sync::Arc;
use std::time::Duration;

use fitment_logging::{fitment_debug, fitment_info, fitment_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{FitmentApi, Generation, JobError, ProgressSample};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Wait between the end of one read and the start of the next.
    pub interval: Duration,
    /// Upper bound for the wait after consecutive failed reads. Equal to
    /// `interval` disables backoff.
    pub max_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    Continue,
    Stop,
}

impl PollDecision {
    /// Stop once `processed >= total > 0`.
    pub fn for_sample(sample: &ProgressSample) -> Self {
        if sample.is_complete() {
            PollDecision::Stop
        } else {
            PollDecision::Continue
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(ProgressSample),
    Cancelled,
}

/// Doubles the wait after a failed read, clamped to `max_interval`.
pub fn next_delay(current: Duration, settings: &PollSettings) -> Duration {
    current
        .saturating_mul(2)
        .min(settings.max_interval)
        .max(settings.interval)
}

/// Handle to one running poll loop. Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    generation: Generation,
    cancel: CancellationToken,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Idempotent; canceling twice is a no-op.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            fitment_info!("Cancelling progress polling for job {}", self.generation);
            self.cancel.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for the loop to end.
    pub async fn join(mut self) -> PollOutcome {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(PollOutcome::Cancelled),
            None => PollOutcome::Cancelled,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct Poller {
    api: Arc<dyn FitmentApi>,
    settings: PollSettings,
}

impl Poller {
    pub fn new(api: Arc<dyn FitmentApi>, settings: PollSettings) -> Self {
        Self { api, settings }
    }

    /// Spawns the poll loop on the current tokio runtime.
    ///
    /// `initial` is what `on_sample` receives if the very first read fails.
    /// `on_complete` runs once, after the `on_sample` call that returned
    /// [`PollDecision::Stop`], and never after cancellation.
    pub fn start<S, C>(
        &self,
        generation: Generation,
        initial: ProgressSample,
        on_sample: S,
        on_complete: C,
    ) -> PollHandle
    where
        S: FnMut(ProgressSample) -> PollDecision + Send + 'static,
        C: FnOnce(ProgressSample) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        fitment_info!("Starting progress polling for job {}", generation);
        let task = tokio::spawn(poll_loop(
            self.api.clone(),
            self.settings.clone(),
            generation,
            initial,
            cancel.clone(),
            on_sample,
            on_complete,
        ));
        PollHandle {
            generation,
            cancel,
            task: Some(task),
        }
    }
}

async fn poll_loop<S, C>(
    api: Arc<dyn FitmentApi>,
    settings: PollSettings,
    generation: Generation,
    initial: ProgressSample,
    cancel: CancellationToken,
    mut on_sample: S,
    on_complete: C,
) -> PollOutcome
where
    S: FnMut(ProgressSample) -> PollDecision + Send,
    C: FnOnce(ProgressSample) + Send,
{
    let mut last = initial;
    let mut delay = settings.interval;

    loop {
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            read = api.read_progress() => read,
        };

        // A response that settled after cancellation is discarded.
        if cancel.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        match read {
            Ok(reading) => {
                fitment_debug!(
                    "Job {} progress {}/{}",
                    generation,
                    reading.processed,
                    reading.total
                );
                last = last.absorb(reading);
                delay = settings.interval;
            }
            Err(err) => {
                fitment_warn!("Job {}: {}", generation, JobError::PollReadFailed(err));
                delay = next_delay(delay, &settings);
            }
        }

        if on_sample(last) == PollDecision::Stop {
            fitment_info!(
                "Job {} complete ({}/{})",
                generation,
                last.processed,
                last.total
            );
            on_complete(last);
            return PollOutcome::Completed(last);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
