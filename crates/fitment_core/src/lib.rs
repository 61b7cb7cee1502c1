//! Fitment core: pure job state machine, input validation and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, Generation, JobContext, JobState};
pub use update::update;
pub use validate::{validate, TargetList, ValidationError};
pub use view_model::{progress_percent, status_text, AppViewModel, JobPhase};
