use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use fitment_logging::{fitment_debug, fitment_error, fitment_info};

use crate::poller::{PollDecision, PollHandle, PollSettings, Poller};
use crate::{submit, EngineEvent, EngineStartError, FitmentApi, Generation, ProgressSample};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum EngineCommand {
    Submit {
        generation: Generation,
        targets: Vec<String>,
    },
    StartPolling {
        generation: Generation,
        initial: ProgressSample,
    },
    CancelPolling {
        generation: Generation,
    },
    Shutdown,
}

/// Owns the IO thread. At most one poll loop is alive at any time.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    /// Builds the engine runtime and starts the IO thread.
    pub fn new(
        api: Arc<dyn FitmentApi>,
        settings: PollSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineStartError> {
        Self::with_runtime(tokio::runtime::Runtime::new(), api, settings, sink)
    }

    fn with_runtime(
        runtime: io::Result<tokio::runtime::Runtime>,
        api: Arc<dyn FitmentApi>,
        settings: PollSettings,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineStartError> {
        let runtime = runtime.map_err(|err| {
            fitment_error!("Failed to start engine runtime: {}", err);
            EngineStartError::from(err)
        })?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let _guard = runtime.enter();
            let poller = Poller::new(api.clone(), settings);
            let mut active: Option<PollHandle> = None;

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Submit {
                        generation,
                        targets,
                    } => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            let event = match submit(api.as_ref(), &targets).await {
                                Ok(()) => EngineEvent::SubmissionAccepted { generation },
                                Err(error) => EngineEvent::SubmissionFailed { generation, error },
                            };
                            sink.emit(event);
                        });
                    }
                    EngineCommand::StartPolling {
                        generation,
                        initial,
                    } => {
                        if let Some(previous) = active.take() {
                            previous.cancel();
                        }
                        active = Some(start_polling(&poller, generation, initial, &sink));
                    }
                    EngineCommand::CancelPolling { generation } => {
                        match active.take() {
                            Some(handle) if handle.generation() == generation => handle.cancel(),
                            Some(handle) => {
                                fitment_debug!(
                                    "Ignoring cancel for job {}; job {} is polling",
                                    generation,
                                    handle.generation()
                                );
                                active = Some(handle);
                            }
                            None => {}
                        }
                    }
                    EngineCommand::Shutdown => break,
                }
            }

            if let Some(handle) = active.take() {
                handle.cancel();
            }
            fitment_info!("Engine stopped");
        });

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn submit(&self, generation: Generation, targets: Vec<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            generation,
            targets,
        });
    }

    /// Starts polling for `generation`, canceling any loop still running.
    pub fn start_polling(&self, generation: Generation, initial: ProgressSample) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling {
            generation,
            initial,
        });
    }

    /// Cancels the active loop if it belongs to `generation`.
    pub fn cancel_polling(&self, generation: Generation) {
        let _ = self.cmd_tx.send(EngineCommand::CancelPolling { generation });
    }

    /// Cancels polling and waits for the IO thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn start_polling(
    poller: &Poller,
    generation: Generation,
    initial: ProgressSample,
    sink: &Arc<dyn EventSink>,
) -> PollHandle {
    let sample_sink = sink.clone();
    let complete_sink = sink.clone();
    poller.start(
        generation,
        initial,
        move |sample| {
            sample_sink.emit(EngineEvent::Sample { generation, sample });
            PollDecision::for_sample(&sample)
        },
        move |sample| {
            complete_sink.emit(EngineEvent::Completed { generation, sample });
        },
    )
}
