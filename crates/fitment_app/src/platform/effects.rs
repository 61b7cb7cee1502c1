use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use fitment_core::{Effect, JobContext, Msg};
use fitment_engine::{
    EngineEvent, EngineHandle, EngineStartError, EventSink, FitmentApi, PollSettings,
    ProgressSample,
};
use fitment_logging::{fitment_debug, fitment_info, fitment_warn};

use super::navigator::Navigator;

/// Executes core effects against the engine and the navigation collaborator.
pub struct EffectRunner {
    engine: EngineHandle,
    navigator: Box<dyn Navigator>,
    report_url: String,
    report_delay: Duration,
}

impl EffectRunner {
    pub fn new(
        api: Arc<dyn FitmentApi>,
        poll_settings: PollSettings,
        msg_tx: mpsc::Sender<Msg>,
        navigator: Box<dyn Navigator>,
        report_url: String,
        report_delay: Duration,
    ) -> Result<Self, EngineStartError> {
        let engine = EngineHandle::new(api, poll_settings, Arc::new(MsgSink { tx: msg_tx }))?;
        Ok(Self {
            engine,
            navigator,
            report_url,
            report_delay,
        })
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob {
                    generation,
                    targets,
                } => {
                    fitment_info!("StartJob generation={} targets={}", generation, targets.len());
                    self.engine.submit(generation, targets.into_vec());
                }
                Effect::StartPolling {
                    generation,
                    initial,
                } => {
                    self.engine.start_polling(
                        generation,
                        ProgressSample::new(initial.total, initial.processed),
                    );
                }
                Effect::CancelPolling { generation } => {
                    self.engine.cancel_polling(generation);
                }
                Effect::OpenReport { generation } => {
                    fitment_info!("Opening report for job {}", generation);
                    // Leave the success message visible before navigating away.
                    thread::sleep(self.report_delay);
                    self.navigator.open_report(&self.report_url);
                }
            }
        }
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

struct MsgSink {
    tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        if self.tx.send(map_event(event)).is_err() {
            fitment_debug!("Dropping engine event; app loop has exited");
        }
    }
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmissionAccepted { generation } => Msg::SubmissionAccepted { generation },
        EngineEvent::SubmissionFailed { generation, error } => {
            fitment_warn!("Job {} failed to start: {}", generation, error);
            Msg::SubmissionFailed {
                generation,
                reason: error.to_string(),
            }
        }
        EngineEvent::Sample { generation, sample } => Msg::ProgressSampled {
            generation,
            sample: to_context(sample),
        },
        EngineEvent::Completed { generation, sample } => Msg::JobCompleted {
            generation,
            context: to_context(sample),
        },
    }
}

fn to_context(sample: ProgressSample) -> JobContext {
    JobContext {
        total: sample.total,
        processed: sample.processed,
    }
}
