mod export;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, ValueEnum};
use tracing::{Level, error, info, warn};
use veil_api::{SessionClient, SessionOptions, Transport, WebhookNotifier};
use veil_engine::workflow::transcript::{DEGREE_KEY_FIELD, STUDENT_NAME_FIELD};
use veil_engine::{
    CancelHandle, ConfigError, Credentials, SearchTarget, Services, SignupTarget, SystemClock, Workflow, WorkflowConfig,
    WorkflowRunner, build_term_id, lookup_term_description, search_workflow, signup_workflow, transcript_workflow,
};
use veil_types::{CourseRecord, ItemOutcome, TranscriptRecord, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Search,
    Signup,
    Transcript,
}

#[derive(Parser, Debug)]
#[command(name = "veil", version, about = "Automates class search, registration, and transcript export")]
struct Args {
    /// Workflow to run
    #[arg(short, long, env = "MODE", value_enum, ignore_case = true)]
    mode: Mode,

    /// Campus-wide ID used to sign in
    #[arg(long, env = "CAMPUSID")]
    campus_id: Option<String>,

    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Subject code to search, e.g. MATH
    #[arg(long, env = "SUBJECT")]
    subject: Option<String>,

    #[arg(long, env = "YEAR")]
    year: Option<u16>,

    /// summer, fall, winter, or spring
    #[arg(long, env = "QUARTER")]
    quarter: Option<String>,

    /// foothill or deanza
    #[arg(long, env = "CAMPUS")]
    campus: Option<String>,

    /// Comma-separated course reference numbers to register for
    #[arg(long, env = "CRNTOADD")]
    crns: Option<String>,

    #[arg(long, env = "RETRY_AMOUNT", default_value_t = 3)]
    retry_amount: u32,

    /// Seconds between attempts of a failing step
    #[arg(long, env = "RETRY_DURATION", default_value_t = 5)]
    retry_duration: u64,

    /// Chat webhook notified on successful enrollment
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    webhook: Option<String>,

    /// Time zone registration opening times are written in
    #[arg(long, env = "REFERENCE_TZ", default_value = "America/Los_Angeles")]
    reference_tz: String,

    /// Seconds to wait past a registration opening time
    #[arg(long, env = "ELIGIBILITY_MARGIN", default_value_t = 5)]
    eligibility_margin: u64,

    /// Directory CSV exports are written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[arg(long, env = "USER_AGENT")]
    user_agent: Option<String>,

    /// Register each CRN in its own session, concurrently
    #[arg(long)]
    isolated: bool,
}

impl Args {
    fn workflow_config(&self) -> Result<WorkflowConfig, ConfigError> {
        WorkflowConfig::new(
            self.retry_amount,
            Duration::from_secs(self.retry_duration),
            &self.reference_tz,
            Duration::from_secs(self.eligibility_margin),
        )
    }

    fn credentials(&self) -> Result<Credentials, ConfigError> {
        let username = self.campus_id.clone().ok_or(ConfigError::Missing("CAMPUSID"))?;
        let password = self.password.clone().ok_or(ConfigError::Missing("PASSWORD"))?;
        Ok(Credentials::new(username, password))
    }

    fn term_id(&self) -> Result<String, ConfigError> {
        let year = self.year.ok_or(ConfigError::Missing("YEAR"))?;
        let campus = self.campus.as_deref().ok_or(ConfigError::Missing("CAMPUS"))?;
        let quarter = self.quarter.as_deref().ok_or(ConfigError::Missing("QUARTER"))?;
        build_term_id(year, campus, quarter)
    }

    fn webhook(&self) -> Option<String> {
        self.webhook.clone().filter(|url| !url.trim().is_empty())
    }

    fn session_options(&self) -> SessionOptions {
        let mut options = SessionOptions::default();
        if let Some(user_agent) = self.user_agent.clone().filter(|agent| !agent.trim().is_empty()) {
            options.user_agent = user_agent;
        }
        options
    }
}

/// Everything one run needs to build its own session.
#[derive(Debug, Clone)]
struct RunContext {
    session: SessionOptions,
    webhook: Option<String>,
    config: WorkflowConfig,
    cancel: CancelHandle,
}

impl RunContext {
    /// Fresh cookie jar, webhook notifier if configured, and a cancellable clock.
    fn services(&self) -> Result<Services> {
        let client = SessionClient::new(self.session.clone()).context("failed to build http session")?;
        let transport: Arc<dyn Transport> = Arc::new(client);
        let mut services = Services::new(transport.clone()).with_clock(Arc::new(SystemClock::with_cancel_handle(self.cancel.clone())));
        if let Some(url) = &self.webhook {
            services = services.with_notifier(Arc::new(WebhookNotifier::new(url.clone(), transport)));
        }
        Ok(services)
    }

    fn run(&self, workflow: &Workflow) -> Result<WorkflowState> {
        let runner = WorkflowRunner::new(self.config.retry, self.services()?);
        let mut state = WorkflowState::new();
        runner.run(workflow, &mut state)?;
        Ok(state)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let context = RunContext {
        session: args.session_options(),
        webhook: args.webhook(),
        config: args.workflow_config().context("invalid workflow settings")?,
        cancel: CancelHandle::new(),
    };
    listen_for_interrupt(context.cancel.clone());

    match args.mode {
        Mode::Search => run_search(&args, context).await,
        Mode::Signup => run_signup(&args, context).await,
        Mode::Transcript => run_transcript(&args, context).await,
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .try_init();
}

/// Ctrl-C cancels pending retry delays and eligibility waits so runs end promptly.
fn listen_for_interrupt(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling pending waits");
            cancel.cancel();
        }
    });
}

/// Workflows block on the network and the clock, so they run off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.context("workflow thread panicked")?
}

fn describe_term(transport: &dyn Transport, term_id: &str) {
    match lookup_term_description(transport, term_id) {
        Ok(Some(description)) => info!(term = term_id, %description, "found term"),
        Ok(None) => {}
        Err(error) => warn!(term = term_id, %error, "term lookup failed"),
    }
}

async fn run_search(args: &Args, context: RunContext) -> Result<()> {
    let target = SearchTarget {
        term_id: args.term_id().context("cannot build term id")?,
        subject: args.subject.clone().ok_or(ConfigError::Missing("SUBJECT"))?,
    };
    let output_dir = args.output_dir.clone();

    let path = run_blocking(move || {
        let services = context.services()?;
        describe_term(services.transport.as_ref(), &target.term_id);
        let state = context.run(&search_workflow(&target))?;
        let path = output_dir.join(export::search_file_name(Local::now()));
        export::write_records(&path, CourseRecord::HEADER, &state.collected_records)?;
        Ok(path)
    })
    .await?;

    println!("Exported search results to {}", path.display());
    Ok(())
}

async fn run_signup(args: &Args, context: RunContext) -> Result<()> {
    let credentials = args.credentials()?;
    let crns = args.crns.as_deref().ok_or(ConfigError::Missing("CRNTOADD"))?;
    let target = SignupTarget::new(args.term_id().context("cannot build term id")?, crns);
    if target.crns.is_empty() {
        bail!("CRNTOADD does not name any course reference numbers");
    }

    {
        let context = context.clone();
        let term_id = target.term_id.clone();
        run_blocking(move || {
            describe_term(context.services()?.transport.as_ref(), &term_id);
            Ok(())
        })
        .await?;
    }

    let targets = if args.isolated { target.split() } else { vec![target] };
    let total = targets.len();
    let mut handles = Vec::with_capacity(total);
    for target in targets {
        let context = context.clone();
        let credentials = credentials.clone();
        handles.push(tokio::spawn(run_blocking(move || {
            let workflow = signup_workflow(&credentials, &target, &context.config);
            context.run(&workflow).with_context(|| format!("signup for {} failed", target.crns.join(", ")))
        })));
    }

    let mut failed = 0;
    for handle in handles {
        match handle.await.context("signup task aborted")? {
            Ok(state) => print_outcomes(&state),
            Err(error) => {
                error!("{error:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} signup runs failed");
    }
    Ok(())
}

fn print_outcomes(state: &WorkflowState) {
    for (crn, outcome) in &state.item_outcomes {
        match outcome {
            ItemOutcome::Registered { title } => println!("{crn}: registered for {title}"),
            ItemOutcome::Rejected { messages } => println!("{crn}: rejected ({})", messages.join("; ")),
            ItemOutcome::Pending { status } => println!("{crn}: {status}"),
        }
    }
}

async fn run_transcript(args: &Args, context: RunContext) -> Result<()> {
    let credentials = args.credentials()?;
    let output_dir = args.output_dir.clone();

    let path = run_blocking(move || {
        let state = context.run(&transcript_workflow(&credentials))?;
        export_transcript(&output_dir, &state)
    })
    .await?;

    println!("Exported transcript to {}", path.display());
    Ok(())
}

fn export_transcript(output_dir: &Path, state: &WorkflowState) -> Result<PathBuf> {
    let name = state.field_str(STUDENT_NAME_FIELD).unwrap_or_default();
    let degree = state.field_str(DEGREE_KEY_FIELD).unwrap_or_default();
    let path = output_dir.join(export::transcript_file_name(name, degree, Local::now()));
    export::write_records(&path, TranscriptRecord::HEADER, &state.collected_records)?;
    Ok(path)
}
