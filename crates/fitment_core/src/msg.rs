use crate::{Generation, JobContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the target list input.
    InputChanged(String),
    /// User asked to generate a report for the current input.
    SubmitClicked,
    /// Backend accepted the start-job request.
    SubmissionAccepted { generation: Generation },
    /// Start-job request failed (transport or non-success status).
    SubmissionFailed {
        generation: Generation,
        reason: String,
    },
    /// Poller handed out a sample (or the prior context after a failed read).
    ProgressSampled {
        generation: Generation,
        sample: JobContext,
    },
    /// One-time completion signal from the poller.
    JobCompleted {
        generation: Generation,
        context: JobContext,
    },
    /// Owner is going away; cancel whatever is in flight.
    Teardown,
}
