use fitment_core::{AppViewModel, JobPhase};

const BAR_WIDTH: usize = 20;

/// One status line for the terminal.
pub fn render(view: &AppViewModel) -> String {
    match view.phase {
        JobPhase::Running | JobPhase::Completed => format!(
            "[{}] {:>3}% {}",
            progress_bar(view.progress_percent),
            view.progress_percent,
            view.status_text
        ),
        JobPhase::Failed => format!("Error: {}", view.status_text),
        JobPhase::Idle if view.validation_error.is_some() => {
            format!("Error: {}", view.status_text)
        }
        JobPhase::Idle | JobPhase::Submitting => view.status_text.clone(),
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
