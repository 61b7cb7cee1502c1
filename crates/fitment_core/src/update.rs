use crate::{validate, AppState, Effect, JobContext, JobState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(raw) => {
            state.set_input(raw);
            state.set_validation_error(None);
            Vec::new()
        }
        Msg::SubmitClicked => {
            // Single flight: the trigger is disabled while a job is in flight.
            if !state.job().accepts_submit() {
                return (state, Vec::new());
            }
            match validate(state.input()) {
                Ok(targets) => {
                    state.set_validation_error(None);
                    let generation = state.next_generation();
                    state.set_job(JobState::Submitting {
                        generation,
                        total: targets.len() as u64,
                    });
                    vec![Effect::StartJob {
                        generation,
                        targets,
                    }]
                }
                Err(err) => {
                    state.set_validation_error(Some(err));
                    Vec::new()
                }
            }
        }
        Msg::SubmissionAccepted { generation } => match state.job().clone() {
            JobState::Submitting {
                generation: active,
                total,
            } if active == generation => {
                let initial = JobContext::new(total);
                state.set_job(JobState::Running {
                    generation,
                    context: initial,
                });
                vec![Effect::StartPolling {
                    generation,
                    initial,
                }]
            }
            _ => Vec::new(),
        },
        Msg::SubmissionFailed { generation, reason } => {
            if matches!(
                state.job(),
                JobState::Submitting { generation: active, .. } if *active == generation
            ) {
                state.set_job(JobState::Failed { reason });
            }
            Vec::new()
        }
        Msg::ProgressSampled { generation, sample } => {
            if let JobState::Running {
                generation: active,
                context,
            } = state.job().clone()
            {
                if active == generation {
                    let next = context.absorb(sample);
                    if next.is_complete() {
                        state.set_job(JobState::Completed {
                            generation,
                            context: next,
                            report_opened: false,
                        });
                    } else {
                        state.set_job(JobState::Running {
                            generation,
                            context: next,
                        });
                    }
                }
            }
            Vec::new()
        }
        Msg::JobCompleted {
            generation,
            context: final_context,
        } => match state.job().clone() {
            JobState::Running {
                generation: active,
                context,
            } if active == generation => {
                state.set_job(JobState::Completed {
                    generation,
                    context: context.absorb(final_context),
                    report_opened: true,
                });
                vec![Effect::OpenReport { generation }]
            }
            JobState::Completed {
                generation: active,
                context,
                report_opened: false,
            } if active == generation => {
                state.set_job(JobState::Completed {
                    generation,
                    context,
                    report_opened: true,
                });
                vec![Effect::OpenReport { generation }]
            }
            _ => Vec::new(),
        },
        Msg::Teardown => {
            let effects = match state.job().clone() {
                JobState::Submitting { generation, .. } | JobState::Running { generation, .. } => {
                    vec![Effect::CancelPolling { generation }]
                }
                _ => Vec::new(),
            };
            state.set_job(JobState::Idle);
            effects
        }
    };

    (state, effects)
}
