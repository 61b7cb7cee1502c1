//! Fitment engine: backend API client, job submission and progress polling.
mod api;
mod engine;
mod poller;
mod submit;
mod types;

pub use api::{ApiSettings, FitmentApi, ReqwestApi};
pub use engine::{ChannelEventSink, EngineHandle, EventSink};
pub use poller::{next_delay, PollDecision, PollHandle, PollOutcome, PollSettings, Poller};
pub use submit::submit;
pub use types::{
    ApiError, EngineEvent, EngineStartError, FailureKind, Generation, JobError, ProgressSample,
};
