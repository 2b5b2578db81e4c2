//! Token-handoff state machine for the campus single sign-on.
//!
//! Each transition is a [`Step`](crate::executor::Step) that posts the tokens
//! held in [`WorkflowState`] to a fixed endpoint, pulls the next tokens out of
//! the hidden inputs of the returned form, and overwrites the previous values.
//!
//! ```text
//! Anonymous -> CredentialsSubmitted -> AssertionIssued -> AssertionRelayed -> ServiceSessionEstablished
//! ```
//!
//! A response without the expected token is terminal: retrying the same hop
//! will not produce one. Once the service session is established, later steps
//! ride on the transport's cookies rather than on state tokens.

use tracing::{debug, info};
use veil_api::{DocumentQuery, HttpRequest};
use veil_types::{DomainError, HandoffError, HandshakeStage, StepError, WorkflowState};

use super::endpoints;
use super::response::{expect_success, send, send_expecting_success};
use crate::config::Credentials;
use crate::executor::{FnStep, Services, Workflow};

pub const SAML_RESPONSE: &str = "SAMLResponse";
pub const SAML_REQUEST: &str = "SAMLRequest";
pub const RELAY_STATE: &str = "RelayState";

/// Selector of the login page's error banner.
pub const BANNER_SELECTOR: &str = "div[class='alert alert-danger']";
pub const INVALID_CREDENTIALS_BANNER: &str = "The password you entered was incorrect.";
pub const SESSION_CORRUPTED_BANNER: &str = "You may be seeing this page because you used the Back button while browsing a secure web site or application. Alternatively, you may have mistakenly bookmarked the web login form instead of the actual web site you wanted to bookmark or used a link created by somebody else who made the same mistake.  Left unchecked, this can cause errors on some browsers or result in you returning to the web site you tried to leave, so this page is presented instead.";

/// Maps login banner text to a handoff failure. No banner, or an empty one, passes.
pub fn classify_banner(banner: Option<&str>) -> Result<(), HandoffError> {
    match banner.map(str::trim) {
        None | Some("") => Ok(()),
        Some(INVALID_CREDENTIALS_BANNER) => Err(HandoffError::InvalidCredentials),
        Some(SESSION_CORRUPTED_BANNER) => Err(HandoffError::SessionCorrupted),
        Some(other) => Err(HandoffError::Rejected(other.to_string())),
    }
}

/// Value of the last non-empty hidden input named `field`.
pub fn extract_token(documents: &dyn DocumentQuery, html: &str, field: &str) -> Option<String> {
    documents
        .find_attribute(html, &format!("input[name='{field}']"), "value")
        .filter(|value| !value.is_empty())
}

/// Like [`extract_token`], failing with `MissingHandoffToken` when absent.
pub fn require_token(documents: &dyn DocumentQuery, html: &str, field: &str) -> Result<String, HandoffError> {
    extract_token(documents, html, field).ok_or_else(|| HandoffError::MissingHandoffToken { field: field.to_string() })
}

fn held(token: &Option<String>, name: &str) -> Result<String, StepError> {
    token
        .clone()
        .ok_or_else(|| DomainError::MissingState(name.to_string()).into())
}

/// GET `url` to pick up session cookies.
pub fn visit(name: &'static str, url: String, require_success: bool) -> FnStep {
    FnStep::new(name, move |_state: &mut WorkflowState, services: &Services| {
        let response = send(services.transport.as_ref(), HttpRequest::get(url.as_str()))?;
        if require_success {
            expect_success(response, &url)?;
        }
        Ok(())
    })
}

/// Posts credentials to the identity provider and captures the issued assertion.
pub fn login(credentials: &Credentials) -> FnStep {
    let credentials = credentials.clone();
    FnStep::new("login", move |state: &mut WorkflowState, services: &Services| {
        info!(username = %credentials.username, "logging in");
        let request = HttpRequest::post(endpoints::IDP_LOGIN).form([
            ("j_username", credentials.username.as_str()),
            ("j_password", credentials.password.as_str()),
            ("_eventId_proceed", ""),
        ]);
        let response = send_expecting_success(services.transport.as_ref(), request)?;
        state.advance_to(HandshakeStage::CredentialsSubmitted);

        let documents = services.documents.as_ref();
        classify_banner(documents.find_text(&response.body, BANNER_SELECTOR).as_deref())?;

        let assertion = require_token(documents, &response.body, SAML_RESPONSE)?;
        state.relay_token = extract_token(documents, &response.body, RELAY_STATE);
        state.assertion_token = Some(assertion);
        state.advance_to(HandshakeStage::AssertionIssued);
        debug!(has_relay = state.relay_token.is_some(), "assertion issued");
        Ok(())
    })
}

/// Relays the assertion to the common-auth endpoint and captures the re-issued one.
///
/// `refresh_relay` also replaces the relay token with the one in the response.
pub fn submit_common_auth(refresh_relay: bool, require_success: bool) -> FnStep {
    FnStep::new("submit_common_auth", move |state: &mut WorkflowState, services: &Services| {
        let relay = state.relay_token.clone().unwrap_or_default();
        let assertion = held(&state.assertion_token, "assertion_token")?;
        let request = HttpRequest::post(endpoints::COMMON_AUTH).form([(RELAY_STATE, relay.as_str()), (SAML_RESPONSE, assertion.as_str())]);
        let mut response = send(services.transport.as_ref(), request)?;
        if require_success {
            response = expect_success(response, endpoints::COMMON_AUTH)?;
        }

        let documents = services.documents.as_ref();
        let assertion = require_token(documents, &response.body, SAML_RESPONSE)?;
        if refresh_relay {
            state.relay_token = extract_token(documents, &response.body, RELAY_STATE);
        }
        state.assertion_token = Some(assertion);
        Ok(())
    })
}

/// Posts relay and assertion to a service provider's assertion consumer.
fn relay_assertion(name: &'static str, url: String, reached: HandshakeStage) -> FnStep {
    FnStep::new(name, move |state: &mut WorkflowState, services: &Services| {
        let relay = state.relay_token.clone().unwrap_or_default();
        let assertion = held(&state.assertion_token, "assertion_token")?;
        let request = HttpRequest::post(url.as_str()).form([(RELAY_STATE, relay.as_str()), (SAML_RESPONSE, assertion.as_str())]);
        send(services.transport.as_ref(), request)?;
        state.advance_to(HandshakeStage::AssertionRelayed);
        state.advance_to(reached);
        Ok(())
    })
}

pub fn submit_sso_manager() -> FnStep {
    relay_assertion("submit_sso_manager", endpoints::SSO_MANAGER_SUBMIT.to_string(), HandshakeStage::AssertionRelayed)
}

/// Fetches the registration portal's authentication request.
pub fn register_post_sign_in() -> FnStep {
    FnStep::new("register_post_sign_in", |state: &mut WorkflowState, services: &Services| {
        let response = send_expecting_success(services.transport.as_ref(), HttpRequest::get(endpoints::register_post_sign_in()))?;
        state.request_token = Some(require_token(services.documents.as_ref(), &response.body, SAML_REQUEST)?);
        Ok(())
    })
}

/// Trades the authentication request for a registration-portal assertion.
pub fn submit_saml_sso() -> FnStep {
    FnStep::new("submit_saml_sso", |state: &mut WorkflowState, services: &Services| {
        let request_token = held(&state.request_token, "request_token")?;
        let request = HttpRequest::post(endpoints::SAML_SSO).form([(SAML_REQUEST, request_token.as_str())]);
        let response = send_expecting_success(services.transport.as_ref(), request)?;
        state.assertion_token = Some(require_token(services.documents.as_ref(), &response.body, SAML_RESPONSE)?);
        Ok(())
    })
}

pub fn submit_service_provider() -> FnStep {
    FnStep::new("submit_service_provider", |state: &mut WorkflowState, services: &Services| {
        let assertion = held(&state.assertion_token, "assertion_token")?;
        let request = HttpRequest::post(endpoints::registration_service_provider()).form([(SAML_RESPONSE, assertion.as_str())]);
        send_expecting_success(services.transport.as_ref(), request)?;
        state.advance_to(HandshakeStage::ServiceSessionEstablished);
        info!("registration session established");
        Ok(())
    })
}

/// Seven-hop handshake into the registration portal.
pub fn registration_handshake(credentials: &Credentials) -> Workflow {
    Workflow::new("registration-handshake")
        .then(visit("visit_homepage", endpoints::SSO_MANAGER_LOGIN.to_string(), true))
        .then(login(credentials))
        .then(submit_common_auth(true, true))
        .then(submit_sso_manager())
        .then(register_post_sign_in())
        .then(submit_saml_sso())
        .then(submit_service_provider())
}

/// Four-hop handshake into the degree-audit portal.
pub fn degree_audit_handshake(credentials: &Credentials) -> Workflow {
    Workflow::new("degree-audit-handshake")
        .then(visit("visit_homepage", endpoints::degree_audit_home(), false))
        .then(login(credentials))
        .then(submit_common_auth(false, false))
        .then(relay_assertion(
            "submit_sso",
            endpoints::degree_audit_sso(),
            HandshakeStage::ServiceSessionEstablished,
        ))
}
