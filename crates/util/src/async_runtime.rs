//! Async runtime helpers for blocking callers.
//!
//! Workflow steps are synchronous; the HTTP client is not. This module lets a
//! step drive a future to completion, reusing the current Tokio runtime when
//! the caller is already inside one.

use std::future::Future;

use thiserror::Error;
use tokio::{runtime::Handle, task};

/// Raised when no runtime is available and a fallback one cannot be built.
#[derive(Debug, Error)]
#[error("unable to start async runtime: {0}")]
pub struct RuntimeError(#[from] std::io::Error);

/// Execute an async future from synchronous code.
///
/// # Notes
/// - Reuses the current runtime when available. Callers on a multi-threaded
///   runtime must be on a worker or `spawn_blocking` thread.
/// - Falls back to a single-threaded runtime for call sites outside Tokio.
pub fn block_on_future<F>(future: F) -> Result<F::Output, RuntimeError>
where
    F: Future,
{
    if let Ok(handle) = Handle::try_current() {
        Ok(task::block_in_place(|| handle.block_on(future)))
    } else {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(runtime.block_on(future))
    }
}
