//! Capabilities consumed by the Veil workflow engine.
//!
//! The engine never talks to the network or parses markup directly. It is
//! handed three capabilities, each a trait with a production implementation
//! here and fakes in the engine's tests:
//!
//! - [`Transport`]: send one HTTP request and return status, headers, and body.
//!   [`SessionClient`] keeps a cookie jar so one run stays on one server session.
//! - [`DocumentQuery`]: find an attribute or the text of an element in an HTML
//!   body. [`MarkupQuery`] understands simple `tag[attr='value']` selectors.
//! - [`Notifier`]: deliver a `{title, description}` event. [`WebhookNotifier`]
//!   posts a chat-webhook embed; [`NullNotifier`] drops events.
//!
//! # Example
//!
//! ```no_run
//! use veil_api::{HttpRequest, SessionClient, SessionOptions, Transport};
//!
//! let client = SessionClient::new(SessionOptions::default())?;
//! let response = client.send(HttpRequest::get("https://example.com/"))?;
//! println!("status: {}", response.status);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod document;
pub mod notify;
pub mod transport;

pub use client::{SessionClient, SessionOptions};
pub use document::{DocumentQuery, MarkupQuery};
pub use notify::{Notifier, NotifyError, NullNotifier, WebhookNotifier};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};
