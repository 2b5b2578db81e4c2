//! Concrete workflows against the campus portals.
//!
//! Every builder returns a [`Workflow`](crate::executor::Workflow) whose steps
//! talk to the portals only through the [`Services`](crate::executor::Services)
//! handed to the runner.

pub mod eligibility;
pub mod endpoints;
pub mod handshake;
pub(crate) mod response;
pub mod search;
pub mod signup;
pub mod term;
pub mod transcript;
