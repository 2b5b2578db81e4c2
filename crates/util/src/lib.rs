pub mod async_runtime;
pub mod redact;
pub mod time_format;

pub use async_runtime::{RuntimeError, block_on_future};
pub use redact::redact_sensitive;
pub use time_format::{format_clock_time_12h, format_wait_duration};
