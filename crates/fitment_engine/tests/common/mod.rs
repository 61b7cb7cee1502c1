#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use fitment_engine::{ApiError, FailureKind, FitmentApi, ProgressSample};

#[derive(Debug, Clone)]
pub enum Step {
    Sample(u64, u64),
    Fail,
    Slow(Duration, u64, u64),
}

/// Fake backend answering progress reads from a script.
pub struct ScriptedApi {
    steps: Mutex<VecDeque<Step>>,
    fallback: ProgressSample,
    start_result: Result<(), ApiError>,
    reads: AtomicUsize,
    read_starts: Mutex<Vec<Instant>>,
    started: Mutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: ProgressSample::new(100, 1),
            start_result: Ok(()),
            reads: AtomicUsize::new(0),
            read_starts: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting_start(mut self, status: u16) -> Self {
        self.start_result = Err(ApiError {
            kind: FailureKind::HttpStatus(status),
            message: format!("status {status}"),
        });
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// When each progress read began, in order.
    pub fn read_starts(&self) -> Vec<Instant> {
        self.read_starts.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FitmentApi for ScriptedApi {
    async fn start_job(&self, hostnames: &str) -> Result<(), ApiError> {
        self.started.lock().unwrap().push(hostnames.to_string());
        self.start_result.clone()
    }

    async fn read_progress(&self) -> Result<ProgressSample, ApiError> {
        self.read_starts.lock().unwrap().push(Instant::now());
        self.reads.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Sample(total, processed)) => Ok(ProgressSample::new(total, processed)),
            Some(Step::Fail) => Err(ApiError {
                kind: FailureKind::Network,
                message: "connection refused".to_string(),
            }),
            Some(Step::Slow(delay, total, processed)) => {
                tokio::time::sleep(delay).await;
                Ok(ProgressSample::new(total, processed))
            }
            None => Ok(self.fallback),
        }
    }
}
