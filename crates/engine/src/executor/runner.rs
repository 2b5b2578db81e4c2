//! Sequential workflow runner.

use thiserror::Error;
use tracing::{info, warn};
use veil_types::{StepError, WorkflowState};

use super::retry::{RetryError, RetryPolicy};
use super::step::{Services, Step};

/// Ordered list of steps run against one state.
pub struct Workflow {
    name: String,
    steps: Vec<Box<dyn Step>>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step and returns the workflow for chaining.
    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Appends every step of `other`, keeping this workflow's name.
    pub fn extend(mut self, other: Workflow) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}

/// Failure of a whole run, pinned to the step that stopped it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("workflow '{workflow}' failed at step '{failed_step}': {cause}")]
pub struct WorkflowError {
    pub workflow: String,
    pub failed_step: String,
    pub cause: RetryError,
}

impl WorkflowError {
    /// True when the run stopped on a business-rule or handshake failure.
    pub fn is_terminal(&self) -> bool {
        self.cause.is_terminal()
    }

    pub fn root_cause(&self) -> &StepError {
        self.cause.step_error()
    }
}

/// Outcome of one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Emitted after every step attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTelemetryEvent {
    pub workflow: String,
    pub step: String,
    /// 1-based attempt number within the step.
    pub attempt: u32,
    pub status: StepStatus,
    /// Rendered error for failed attempts.
    pub error: Option<String>,
}

/// Collected step events for a run.
#[derive(Debug, Default, Clone)]
pub struct WorkflowTelemetry {
    step_events: Vec<StepTelemetryEvent>,
}

impl WorkflowTelemetry {
    pub fn record_step_event(&mut self, event: StepTelemetryEvent) {
        self.step_events.push(event);
    }

    pub fn step_events(&self) -> &[StepTelemetryEvent] {
        &self.step_events
    }

    /// Number of failed attempts across all steps.
    pub fn failed_attempts(&self) -> usize {
        self.step_events
            .iter()
            .filter(|event| event.status == StepStatus::Failed)
            .count()
    }
}

/// Runs workflows step by step under one retry policy.
#[derive(Debug, Clone)]
pub struct WorkflowRunner {
    policy: RetryPolicy,
    services: Services,
}

impl WorkflowRunner {
    pub fn new(policy: RetryPolicy, services: Services) -> Self {
        Self { policy, services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Runs every step in order; the first step that gives up ends the run.
    ///
    /// Steps after the failed one are never invoked and the state keeps
    /// whatever earlier steps wrote.
    pub fn run(&self, workflow: &Workflow, state: &mut WorkflowState) -> Result<(), WorkflowError> {
        self.run_observed(workflow, state, |_| {})
    }

    /// Like [`run`](Self::run), reporting every attempt to `observer`.
    pub fn run_observed<F>(&self, workflow: &Workflow, state: &mut WorkflowState, mut observer: F) -> Result<(), WorkflowError>
    where
        F: FnMut(&StepTelemetryEvent),
    {
        info!(workflow = workflow.name(), steps = workflow.len(), "workflow started");
        for step in &workflow.steps {
            let outcome = self.policy.execute_observed(step.as_ref(), state, &self.services, |attempt, result| {
                observer(&StepTelemetryEvent {
                    workflow: workflow.name().to_string(),
                    step: step.name().to_string(),
                    attempt,
                    status: if result.is_ok() { StepStatus::Succeeded } else { StepStatus::Failed },
                    error: result.err().map(ToString::to_string),
                });
            });

            match outcome {
                Ok(attempts) => info!(workflow = workflow.name(), step = step.name(), attempts, "step succeeded"),
                Err(cause) => {
                    warn!(
                        workflow = workflow.name(),
                        step = step.name(),
                        attempts = cause.attempts(),
                        terminal = cause.is_terminal(),
                        "workflow stopped"
                    );
                    return Err(WorkflowError {
                        workflow: workflow.name().to_string(),
                        failed_step: step.name().to_string(),
                        cause,
                    });
                }
            }
        }
        info!(workflow = workflow.name(), "workflow completed");
        Ok(())
    }
}
