//! Mutable state threaded through a single workflow run.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::Record;

/// Opaque registration fragment returned by the server when an item is added.
///
/// The schema is controlled upstream and only partially known, so the fragment
/// is kept as an order-preserving key/value document and resubmitted untouched.
pub type RegistrationModel = IndexMap<String, Value>;

/// Position reached in the authentication handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandshakeStage {
    #[default]
    Anonymous,
    CredentialsSubmitted,
    AssertionIssued,
    AssertionRelayed,
    ServiceSessionEstablished,
}

/// Final disposition of one item in a batch registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemOutcome {
    /// The server accepted the item and reported it as registered.
    Registered { title: String },
    /// The server refused the item; messages are server-supplied.
    Rejected { messages: Vec<String> },
    /// The server answered with some other status for the item.
    Pending { status: String },
}

/// Mutable bag owned by exactly one runner for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    /// `RelayState` value carried between identity-provider hops.
    pub relay_token: Option<String>,
    /// Latest `SAMLResponse` assertion.
    pub assertion_token: Option<String>,
    /// Latest `SAMLRequest` issued by a service provider.
    pub request_token: Option<String>,
    /// Handshake stage reached so far.
    pub handshake_stage: HandshakeStage,
    /// Loosely typed values extracted from responses (student profile, term description, ...).
    pub extracted_fields: IndexMap<String, Value>,
    /// Registration fragments keyed by the item identifier they were issued for.
    pub registration_models: IndexMap<String, RegistrationModel>,
    /// Per-item outcomes of add and submit operations.
    pub item_outcomes: IndexMap<String, ItemOutcome>,
    /// Rows collected by domain steps, in collection order.
    pub collected_records: Vec<Record>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an extracted field as a string slice when it holds a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extracted_fields.get(key).and_then(Value::as_str)
    }

    /// Stores a string field, replacing any previous value.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extracted_fields.insert(key.into(), Value::String(value.into()));
    }

    /// Moves the handshake forward; stages never move backwards.
    pub fn advance_to(&mut self, stage: HandshakeStage) {
        if stage > self.handshake_stage {
            self.handshake_stage = stage;
        }
    }

    /// Item identifiers whose outcome is `Registered`.
    pub fn registered_items(&self) -> Vec<&str> {
        self.item_outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ItemOutcome::Registered { .. }))
            .map(|(item, _)| item.as_str())
            .collect()
    }
}
