//! # Veil Engine
//!
//! Orchestration core for automating the campus registration portal: a
//! sequential runner of named steps, a bounded retry policy that classifies
//! failures, an eligibility waiter that blocks until a server-announced
//! opening time, and the single sign-on token handoff.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use veil_api::{HttpRequest, HttpResponse, Transport};
//! use veil_engine::{FnStep, RetryPolicy, Services, Workflow, WorkflowRunner};
//! use veil_types::{TransportError, WorkflowState};
//!
//! struct Offline;
//!
//! impl Transport for Offline {
//!     fn send(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
//!         Err(TransportError::Connect("offline".into()))
//!     }
//! }
//!
//! let workflow = Workflow::new("demo").then(FnStep::new("mark", |state: &mut WorkflowState, _: &Services| {
//!     state.set_field("marked", "yes");
//!     Ok(())
//! }));
//! let runner = WorkflowRunner::new(RetryPolicy::default(), Services::new(Arc::new(Offline)));
//!
//! let mut state = WorkflowState::new();
//! runner.run(&workflow, &mut state)?;
//! assert_eq!(state.field_str("marked"), Some("yes"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`executor`**: `Step`, `RetryPolicy`, and `WorkflowRunner`
//! - **`clock`**: injectable time source with cancellable sleeps
//! - **`config`**: validated retry, time zone, and target settings
//! - **`workflow`**: handshake, eligibility, search, signup, and transcript steps

pub mod clock;
pub mod config;
pub mod executor;
pub mod workflow;

pub use clock::{CancelHandle, Clock, ManualClock, SleepOutcome, SystemClock};
pub use config::{ConfigError, Credentials, SearchTarget, SignupTarget, WorkflowConfig};
pub use executor::{
    FnStep, RetryError, RetryPolicy, Services, Step, StepStatus, StepTelemetryEvent, Workflow, WorkflowError, WorkflowRunner,
    WorkflowTelemetry,
};
pub use workflow::eligibility::{Eligibility, EligibilityWindow, assess_eligibility, parse_window_timestamp, wait_for_window};
pub use workflow::handshake::{classify_banner, degree_audit_handshake, extract_token, registration_handshake, require_token};
pub use workflow::search::search_workflow;
pub use workflow::signup::signup_workflow;
pub use workflow::term::{build_term_id, lookup_term_description};
pub use workflow::transcript::transcript_workflow;
