use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context};
use fitment_core::{update, AppState, JobState, Msg};
use fitment_engine::{FitmentApi, ReqwestApi};
use fitment_logging::{fitment_info, LevelFilter, LogDestination};

use super::cli::Cli;
use super::config::{load_config, AppConfig};
use super::effects::EffectRunner;
use super::navigator::TerminalNavigator;
use super::ui;

const LOG_FILENAME: &str = "fitment.log";

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let loaded = load_config(cli.config.as_deref())?;
    let mut config = loaded.config;
    apply_overrides(&mut config, &cli);

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let destination = if config.log_to_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    fitment_logging::initialize(destination, level, Path::new(LOG_FILENAME));
    match &loaded.source {
        Some(path) => fitment_info!("Loaded config from {}", path.display()),
        None => fitment_info!("No config file found; using defaults"),
    }

    let raw_targets = match cli.targets {
        Some(targets) => targets,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read VM names from stdin")?;
            buf
        }
    };

    let api: Arc<dyn FitmentApi> = Arc::new(ReqwestApi::new(&config.api_settings())?);
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();

    let teardown_tx = msg_tx.clone();
    ctrlc::set_handler(move || {
        let _ = teardown_tx.send(Msg::Teardown);
    })
    .context("failed to install Ctrl-C handler")?;

    let runner = EffectRunner::new(
        api,
        config.poll_settings(),
        msg_tx,
        Box::new(TerminalNavigator::stdout()),
        config.report_url(),
        config.report_delay(),
    )?;
    let mut controller = Controller::new(runner, io::stdout());
    let outcome = controller.run_job(raw_targets, &msg_rx);
    controller.shutdown();

    match outcome? {
        RunOutcome::ReportReady => Ok(()),
        RunOutcome::Interrupted => {
            fitment_info!("Interrupted before the report was ready");
            Ok(())
        }
        RunOutcome::Invalid(reason) | RunOutcome::Failed(reason) => bail!(reason),
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.poll_interval_ms = interval_ms;
        config.max_poll_interval_ms = config.max_poll_interval_ms.max(interval_ms);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    ReportReady,
    Invalid(String),
    Failed(String),
    Interrupted,
}

/// Owns the state machine and applies every message on the calling thread.
pub struct Controller<W: Write> {
    state: AppState,
    runner: EffectRunner,
    out: W,
    last_line: Option<String>,
    torn_down: bool,
}

impl<W: Write> Controller<W> {
    pub fn new(runner: EffectRunner, out: W) -> Self {
        Self {
            state: AppState::new(),
            runner,
            out,
            last_line: None,
            torn_down: false,
        }
    }

    /// Submits `raw_targets` and dispatches messages until the job settles.
    pub fn run_job(
        &mut self,
        raw_targets: String,
        msg_rx: &mpsc::Receiver<Msg>,
    ) -> anyhow::Result<RunOutcome> {
        self.dispatch(Msg::InputChanged(raw_targets))?;
        self.dispatch(Msg::SubmitClicked)?;
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome);
            }
            let msg = msg_rx.recv().context("message channel closed")?;
            self.dispatch(msg)?;
        }
    }

    pub fn dispatch(&mut self, msg: Msg) -> io::Result<()> {
        if matches!(msg, Msg::Teardown) {
            self.torn_down = true;
        }
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;

        if was_dirty {
            self.render()?;
        }
        self.runner.run(effects);
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let line = ui::render::render(&self.state.view());
        if self.last_line.as_deref() != Some(line.as_str()) {
            writeln!(self.out, "{line}")?;
            self.out.flush()?;
            self.last_line = Some(line);
        }
        Ok(())
    }

    fn outcome(&self) -> Option<RunOutcome> {
        match self.state.job() {
            JobState::Completed {
                report_opened: true,
                ..
            } => Some(RunOutcome::ReportReady),
            JobState::Failed { reason } => Some(RunOutcome::Failed(reason.clone())),
            JobState::Idle if self.torn_down => Some(RunOutcome::Interrupted),
            JobState::Idle => self
                .state
                .view()
                .validation_error
                .map(|err| RunOutcome::Invalid(err.to_string())),
            _ => None,
        }
    }

    /// Cancels anything still in flight and stops the engine.
    pub fn shutdown(mut self) {
        if matches!(
            self.state.job(),
            JobState::Submitting { .. } | JobState::Running { .. }
        ) {
            let _ = self.dispatch(Msg::Teardown);
        }
        self.runner.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    use fitment_core::JobState;
    use fitment_engine::{ApiSettings, FitmentApi, PollSettings, ReqwestApi};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{Controller, RunOutcome};
    use crate::platform::effects::EffectRunner;
    use crate::platform::navigator::testing::RecordingNavigator;

    fn controller_for(
        base_url: String,
        navigator: RecordingNavigator,
    ) -> (Controller<Vec<u8>>, mpsc::Receiver<fitment_core::Msg>) {
        let api: Arc<dyn FitmentApi> = Arc::new(
            ReqwestApi::new(&ApiSettings {
                base_url: base_url.clone(),
                ..ApiSettings::default()
            })
            .unwrap(),
        );
        let (tx, rx) = mpsc::channel();
        let runner = EffectRunner::new(
            api,
            PollSettings {
                interval: Duration::from_millis(10),
                max_interval: Duration::from_millis(10),
            },
            tx,
            Box::new(navigator),
            format!("{base_url}/summary"),
            Duration::from_millis(1),
        )
        .unwrap();
        (Controller::new(runner, Vec::new()), rx)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn job_runs_to_report_and_navigates_once() {
        fitment_logging::initialize_for_tests();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/progress"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "total": 2, "processed": 2 })),
            )
            .mount(&server)
            .await;

        let navigator = RecordingNavigator::default();
        let base_url = server.uri();
        let (outcome, output, opened) = {
            let navigator = navigator.clone();
            tokio::task::spawn_blocking(move || {
                let (mut controller, rx) = controller_for(base_url, navigator.clone());
                let outcome = controller.run_job("vm1, vm2".to_string(), &rx).unwrap();
                let output = String::from_utf8(controller.out.clone()).unwrap();
                controller.shutdown();
                (outcome, output, navigator.opened())
            })
            .await
            .unwrap()
        };

        assert_eq!(outcome, RunOutcome::ReportReady);
        assert_eq!(opened, vec![format!("{}/summary", server.uri())]);
        assert!(output.contains("Checks started..."), "{output}");
        assert!(output.contains("Report generated successfully!"), "{output}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_submission_ends_with_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/check"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/progress"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let navigator = RecordingNavigator::default();
        let base_url = server.uri();
        let (outcome, opened) = {
            let navigator = navigator.clone();
            tokio::task::spawn_blocking(move || {
                let (mut controller, rx) = controller_for(base_url, navigator.clone());
                let outcome = controller.run_job("vm1".to_string(), &rx).unwrap();
                controller.shutdown();
                (outcome, navigator.opened())
            })
            .await
            .unwrap()
        };

        assert!(
            matches!(&outcome, RunOutcome::Failed(reason) if reason.starts_with("Failed to start report")),
            "{outcome:?}"
        );
        assert!(opened.is_empty());
    }

    #[test]
    fn empty_input_never_reaches_backend() {
        let navigator = RecordingNavigator::default();
        // Nothing listens here; any request would fail the job instead.
        let (mut controller, rx) = controller_for("http://127.0.0.1:1".to_string(), navigator);

        let outcome = controller.run_job(" , ".to_string(), &rx).unwrap();

        assert_eq!(outcome, RunOutcome::Invalid("Please enter VM names".to_string()));
        assert_eq!(controller.state.job(), &JobState::Idle);
        assert!(rx.try_recv().is_err());
        controller.shutdown();
    }

    #[test]
    fn teardown_while_running_cancels_and_interrupts() {
        let navigator = RecordingNavigator::default();
        let (mut controller, rx) = controller_for("http://127.0.0.1:1".to_string(), navigator);
        controller.dispatch(fitment_core::Msg::InputChanged("vm1".to_string())).unwrap();
        controller.dispatch(fitment_core::Msg::SubmitClicked).unwrap();
        controller
            .dispatch(fitment_core::Msg::SubmissionAccepted { generation: 1 })
            .unwrap();
        assert!(matches!(controller.state.job(), JobState::Running { .. }));

        controller.dispatch(fitment_core::Msg::Teardown).unwrap();

        assert_eq!(controller.outcome(), Some(RunOutcome::Interrupted));
        drop(rx);
        controller.shutdown();
    }
}
