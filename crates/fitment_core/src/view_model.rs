use crate::{JobContext, JobState, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: JobPhase,
    pub status_text: String,
    pub progress_percent: u8,
    pub processed: u64,
    pub total: u64,
    pub submit_enabled: bool,
    /// Only true once the job is complete, so an unfinished report is never opened.
    pub open_report_enabled: bool,
    pub validation_error: Option<ValidationError>,
    pub dirty: bool,
}

/// Percentage of processed targets, floored and clamped to `0..=100`.
pub fn progress_percent(context: &JobContext) -> u8 {
    if context.total == 0 {
        return 0;
    }
    let percent = u128::from(context.processed) * 100 / u128::from(context.total);
    percent.min(100) as u8
}

pub fn status_text(job: &JobState) -> String {
    match job {
        JobState::Idle => "Checks not started".to_string(),
        JobState::Submitting { .. } => "Checks started...".to_string(),
        JobState::Running { context, .. } => {
            format!("{} / {} VMs complete", context.processed, context.total)
        }
        JobState::Completed { .. } => "Report generated successfully!".to_string(),
        JobState::Failed { reason } => reason.clone(),
    }
}
