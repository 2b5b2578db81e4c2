//! Bounded retry around a single step.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use veil_types::{StepError, WorkflowState};

use super::step::{Services, Step};
use crate::clock::SleepOutcome;

/// Default number of attempts per step.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How a step failed once the policy gave up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Every permitted attempt failed with a retryable error.
    #[error("exceeded maximum attempts ({attempts}): {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: StepError },

    /// An attempt failed with an error that retrying cannot fix.
    #[error("terminal failure on attempt {attempts}: {error}")]
    Terminal { attempts: u32, error: StepError },
}

impl RetryError {
    /// Attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::MaxAttemptsExceeded { attempts, .. } | RetryError::Terminal { attempts, .. } => *attempts,
        }
    }

    /// The step error that ended the loop.
    pub fn step_error(&self) -> &StepError {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. } => last_error,
            RetryError::Terminal { error, .. } => error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryError::Terminal { .. })
    }
}

/// Attempt budget and inter-attempt delay applied to every step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Builds a policy; `None` when `max_attempts` is zero.
    pub fn new(max_attempts: u32, delay: Duration) -> Option<Self> {
        (max_attempts >= 1).then_some(Self { max_attempts, delay })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `step` until it succeeds, fails terminally, or the budget is spent.
    ///
    /// The clock sleeps for `delay` between attempts and never after the last
    /// one. A cancelled sleep ends the loop early with the error seen so far.
    pub fn execute(&self, step: &dyn Step, state: &mut WorkflowState, services: &Services) -> Result<u32, RetryError> {
        self.execute_observed(step, state, services, |_, _| {})
    }

    /// Like [`execute`](Self::execute), reporting each attempt number and its result.
    pub fn execute_observed<F>(
        &self,
        step: &dyn Step,
        state: &mut WorkflowState,
        services: &Services,
        mut observer: F,
    ) -> Result<u32, RetryError>
    where
        F: FnMut(u32, Result<(), &StepError>),
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(step = step.name(), attempt, max_attempts = self.max_attempts, "step attempt started");

            let error = match step.run(state, services) {
                Ok(()) => {
                    observer(attempt, Ok(()));
                    return Ok(attempt);
                }
                Err(error) => error,
            };
            observer(attempt, Err(&error));

            let class = error.class();
            warn!(step = step.name(), attempt, ?class, error = %error, "step attempt failed");

            if !class.is_retryable() {
                return Err(RetryError::Terminal { attempts: attempt, error });
            }
            if attempt >= self.max_attempts {
                return Err(RetryError::MaxAttemptsExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            }
            if services.clock.sleep(self.delay) == SleepOutcome::Cancelled {
                warn!(step = step.name(), attempt, "retry delay cancelled");
                return Err(RetryError::MaxAttemptsExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            }
        }
    }
}
