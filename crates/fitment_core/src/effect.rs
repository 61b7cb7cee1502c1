use crate::{Generation, JobContext, TargetList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue exactly one start-job request.
    StartJob {
        generation: Generation,
        targets: TargetList,
    },
    /// Start the progress poller; cancels any loop still owned by the engine.
    StartPolling {
        generation: Generation,
        initial: JobContext,
    },
    CancelPolling { generation: Generation },
    /// Hand off to the navigation collaborator. Emitted at most once per job.
    OpenReport { generation: Generation },
}
