use crate::view_model::{AppViewModel, JobPhase};
use crate::{progress_percent, status_text, ValidationError};

/// Tag assigned to each submission; messages carrying another tag are stale.
pub type Generation = u64;

/// Progress of a single backend job.
///
/// `total == 0` means the backend has not sized the job yet and is never
/// treated as completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobContext {
    pub total: u64,
    pub processed: u64,
}

impl JobContext {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            processed: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed >= self.total
    }

    /// Returns the context that replaces `self` after applying `sample`.
    ///
    /// An unsized sample leaves the context untouched. A sized sample sets the
    /// total, and `processed` never decreases; if the backend shrinks the
    /// total below what was already processed, the result is complete.
    pub fn absorb(&self, sample: JobContext) -> JobContext {
        if sample.total == 0 {
            return *self;
        }
        JobContext {
            total: sample.total,
            processed: self.processed.max(sample.processed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting {
        generation: Generation,
        total: u64,
    },
    Running {
        generation: Generation,
        context: JobContext,
    },
    Completed {
        generation: Generation,
        context: JobContext,
        report_opened: bool,
    },
    Failed {
        reason: String,
    },
}

impl JobState {
    pub fn context(&self) -> Option<JobContext> {
        match self {
            JobState::Running { context, .. } | JobState::Completed { context, .. } => {
                Some(*context)
            }
            _ => None,
        }
    }

    /// Whether a new submission may start from this state.
    pub fn accepts_submit(&self) -> bool {
        matches!(
            self,
            JobState::Idle | JobState::Completed { .. } | JobState::Failed { .. }
        )
    }

    pub fn phase(&self) -> JobPhase {
        match self {
            JobState::Idle => JobPhase::Idle,
            JobState::Submitting { .. } => JobPhase::Submitting,
            JobState::Running { .. } => JobPhase::Running,
            JobState::Completed { .. } => JobPhase::Completed,
            JobState::Failed { .. } => JobPhase::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    input: String,
    job: JobState,
    last_generation: Generation,
    validation_error: Option<ValidationError>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self) -> &JobState {
        &self.job
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn view(&self) -> AppViewModel {
        let context = self.job.context().unwrap_or_default();
        let status = match &self.validation_error {
            Some(err) if self.job.accepts_submit() => err.to_string(),
            _ => status_text(&self.job),
        };
        AppViewModel {
            phase: self.job.phase(),
            status_text: status,
            progress_percent: progress_percent(&context),
            processed: context.processed,
            total: context.total,
            submit_enabled: self.job.accepts_submit() && !self.input.trim().is_empty(),
            open_report_enabled: matches!(self.job, JobState::Completed { .. }),
            validation_error: self.validation_error.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        if self.input != input {
            self.input = input;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_validation_error(&mut self, error: Option<ValidationError>) {
        if self.validation_error != error {
            self.validation_error = error;
            self.mark_dirty();
        }
    }

    /// Allocates the next generation; never reuses a previous one.
    pub(crate) fn next_generation(&mut self) -> Generation {
        self.last_generation += 1;
        self.last_generation
    }

    pub(crate) fn set_job(&mut self, job: JobState) {
        if self.job != job {
            self.job = job;
            self.mark_dirty();
        }
    }
}
