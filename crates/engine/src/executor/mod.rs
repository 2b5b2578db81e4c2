//! Step execution: the [`Step`] abstraction, the retry policy wrapped around
//! every step, and the sequential runner that threads one
//! [`WorkflowState`](veil_types::WorkflowState) through a workflow.
//!
//! - `step` defines [`Step`], [`FnStep`], and the [`Services`] bundle
//! - `retry` owns attempt counting, delays, and error classification
//! - `runner` runs steps in order and pins failures to the step that raised them

pub mod retry;
pub mod runner;
pub mod step;

pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryError, RetryPolicy};
pub use runner::{StepStatus, StepTelemetryEvent, Workflow, WorkflowError, WorkflowRunner, WorkflowTelemetry};
pub use step::{FnStep, Services, Step};
