//! The unit of work executed by the runner.

use std::fmt;
use std::sync::Arc;

use veil_api::{DocumentQuery, MarkupQuery, Notifier, NullNotifier, Transport};
use veil_types::{StepError, WorkflowState};

use crate::clock::{Clock, SystemClock};

/// Capabilities handed to every step attempt.
///
/// A step reaches the outside world only through these. One `Services`
/// value belongs to one run; sharing its transport between runs would
/// share the cookie jar.
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn Transport>,
    pub documents: Arc<dyn DocumentQuery>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Production document query, no notifications, and the wall clock.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            documents: Arc::new(MarkupQuery),
            notifier: Arc::new(NullNotifier),
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// A named operation that reads and mutates the workflow state.
///
/// `run` may be invoked several times for the same state when the retry
/// policy decides to try again, so a step must tolerate partial writes
/// left by an earlier failed attempt.
pub trait Step: Send + Sync {
    /// Stable, human-readable identifier used in logs and errors.
    fn name(&self) -> &str;

    fn run(&self, state: &mut WorkflowState, services: &Services) -> Result<(), StepError>;
}

type StepFn = dyn Fn(&mut WorkflowState, &Services) -> Result<(), StepError> + Send + Sync;

/// A [`Step`] backed by a closure.
pub struct FnStep {
    name: String,
    action: Box<StepFn>,
}

impl FnStep {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut WorkflowState, &Services) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }
}

impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut WorkflowState, services: &Services) -> Result<(), StepError> {
        (self.action)(state, services)
    }
}

impl fmt::Debug for FnStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep").field("name", &self.name).finish_non_exhaustive()
    }
}
