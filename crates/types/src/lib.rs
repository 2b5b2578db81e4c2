//! Shared type definitions for the Veil workspace.
//!
//! The engine, the capability crates, and the CLI all speak in terms of the
//! types defined here:
//!
//! - [`WorkflowState`]: the mutable record threaded through every step of a run
//! - [`Record`]: uniform-shape rows collected by domain steps for export
//! - [`RegistrationModel`]: opaque, order-preserving server fragment resubmitted later
//! - [`StepError`] and friends: the failure taxonomy driving retry decisions
//! - [`payloads`]: serde mirrors of the upstream JSON documents

pub mod errors;
pub mod notification;
pub mod payloads;
pub mod records;
pub mod state;

pub use errors::{DomainError, ErrorClass, HandoffError, ProtocolError, StepError, TransportError};
pub use notification::NotificationEvent;
pub use records::{CourseRecord, Record, TranscriptRecord};
pub use state::{HandshakeStage, ItemOutcome, RegistrationModel, WorkflowState};
