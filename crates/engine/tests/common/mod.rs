#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use veil_api::{HttpRequest, HttpResponse, Method, Notifier, NotifyError, Transport};
use veil_engine::{ManualClock, RetryPolicy, Services, WorkflowRunner};
use veil_types::{NotificationEvent, TransportError};

struct Route {
    method: Method,
    url_prefix: String,
    responses: VecDeque<Result<HttpResponse, TransportError>>,
}

/// Transport answering from scripted routes.
///
/// Each route replays its responses in order and repeats the last one once
/// the script runs out. Requests without a route fail to connect.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, url_prefix: impl Into<String>, response: Result<HttpResponse, TransportError>) -> Self {
        let url_prefix = url_prefix.into();
        {
            let mut routes = self.routes.lock().unwrap();
            match routes
                .iter_mut()
                .find(|route| route.method == method && route.url_prefix == url_prefix)
            {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    method,
                    url_prefix,
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    pub fn ok(self, method: Method, url_prefix: impl Into<String>, body: impl Into<String>) -> Self {
        self.on(method, url_prefix, Ok(HttpResponse::new(200, body)))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, url_prefix: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.starts_with(url_prefix))
            .collect()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .filter(|route| route.method == request.method && request.url.starts_with(&route.url_prefix))
            .max_by_key(|route| route.url_prefix.len())
            .ok_or_else(|| TransportError::Connect(format!("no route for {} {}", request.method, request.url)))?;
        if route.responses.len() > 1 {
            route.responses.pop_front().unwrap()
        } else {
            route.responses.front().cloned().unwrap()
        }
    }
}

/// Notifier recording every event, optionally failing delivery.
#[derive(Default)]
pub struct FakeNotifier {
    pub events: Mutex<Vec<NotificationEvent>>,
    pub fail: bool,
}

impl Notifier for FakeNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(NotifyError::Rejected(500));
        }
        Ok(())
    }
}

pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 30, 12, 0, 0).unwrap()
}

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<FakeNotifier>,
    pub runner: WorkflowRunner,
}

pub fn harness(transport: FakeTransport, max_attempts: u32, delay: Duration) -> Harness {
    harness_with(transport, max_attempts, delay, FakeNotifier::default(), start_instant())
}

pub fn harness_with(transport: FakeTransport, max_attempts: u32, delay: Duration, notifier: FakeNotifier, now: DateTime<Utc>) -> Harness {
    let transport = Arc::new(transport);
    let clock = Arc::new(ManualClock::new(now));
    let notifier = Arc::new(notifier);
    let services = Services::new(transport.clone())
        .with_clock(clock.clone())
        .with_notifier(notifier.clone());
    let policy = RetryPolicy::new(max_attempts, delay).expect("positive attempts");
    Harness {
        transport,
        clock,
        notifier,
        runner: WorkflowRunner::new(policy, services),
    }
}

/// Auto-submitting SAML form carrying the given hidden inputs.
pub fn saml_form(fields: &[(&str, &str)]) -> String {
    let inputs: String = fields
        .iter()
        .map(|(name, value)| format!(r#"<input type="hidden" name="{name}" value="{value}"/>"#))
        .collect();
    format!(r#"<html><body onload="document.forms[0].submit()"><form method="post">{inputs}</form></body></html>"#)
}

pub fn login_banner(text: &str) -> String {
    format!(r#"<html><body><form><div class="alert alert-danger"><p>{text}</p></div></form></body></html>"#)
}
