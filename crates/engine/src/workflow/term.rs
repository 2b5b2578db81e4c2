//! Term identifiers and the public term list.

use tracing::{info, warn};
use veil_api::{HttpRequest, Transport};
use veil_types::StepError;
use veil_types::payloads::Term;

use super::endpoints;
use super::response::{decode_json, send_expecting_success};
use crate::config::ConfigError;

fn quarter_code(quarter: &str) -> Option<u8> {
    match quarter.trim().to_ascii_lowercase().as_str() {
        "summer" => Some(1),
        "fall" => Some(2),
        "winter" => Some(3),
        "spring" => Some(4),
        _ => None,
    }
}

fn campus_code(campus: &str) -> Option<u8> {
    match campus.trim().to_ascii_lowercase().as_str() {
        "foothill" => Some(1),
        "deanza" | "de anza" => Some(2),
        _ => None,
    }
}

/// Builds the registration term identifier, e.g. `2024` + fall + De Anza = `"202422"`.
///
/// ```
/// use veil_engine::build_term_id;
///
/// assert_eq!(build_term_id(2024, "DeAnza", "Fall").unwrap(), "202422");
/// assert_eq!(build_term_id(2025, "foothill", "spring").unwrap(), "202541");
/// ```
pub fn build_term_id(year: u16, campus: &str, quarter: &str) -> Result<String, ConfigError> {
    let campus_code = campus_code(campus).ok_or_else(|| ConfigError::UnknownCampus(campus.to_string()))?;
    let quarter_code = quarter_code(quarter).ok_or_else(|| ConfigError::UnknownQuarter(quarter.to_string()))?;
    Ok(format!("{year}{quarter_code}{campus_code}"))
}

/// Looks up the human-readable description of `term_id` in the public term list.
///
/// Returns `Ok(None)` when the term is not listed; callers treat that as a
/// warning since the list only covers recent terms.
pub fn lookup_term_description(transport: &dyn Transport, term_id: &str) -> Result<Option<String>, StepError> {
    let response = send_expecting_success(transport, HttpRequest::get(endpoints::term_list()))?;
    let terms: Vec<Term> = decode_json("term list", &response.body)?;
    let description = terms
        .into_iter()
        .filter(|term| term.code == term_id)
        .map(|term| term.description)
        .last();
    match &description {
        Some(description) => info!(term_id, description = %description, "found term"),
        None => warn!(term_id, "term not found in public term list"),
    }
    Ok(description)
}
