use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization: )([\w\-\.=:/+]+)",
        r"(?i)(j_password=)([^&\s]+)",
        r"(?i)((?:SAMLResponse|SAMLRequest|RelayState)=)([^&\s]+)",
        r#"(?i)(name=["'](?:SAMLResponse|SAMLRequest)["'][^>]*value=["'])([^"']+)"#,
        r"(?i)([A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid redaction pattern"))
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Covers login form passwords, SAML handoff tokens in form bodies or hidden
/// inputs, authorization headers, and `*_TOKEN=`-style assignments.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .to_string();
    }
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_login_form_password() {
        let body = "j_username=20001234&j_password=hunter2&_eventId_proceed=";
        assert_eq!(
            redact_sensitive(body),
            "j_username=20001234&j_password=<redacted>&_eventId_proceed="
        );
    }

    #[test]
    fn redacts_saml_tokens_in_forms_and_markup() {
        let form = "RelayState=abc&SAMLResponse=PHNhbWw%2B";
        assert_eq!(redact_sensitive(form), "RelayState=<redacted>&SAMLResponse=<redacted>");

        let html = r#"<input type="hidden" name="SAMLResponse" value="PHNhbWw+"/>"#;
        assert_eq!(
            redact_sensitive(html),
            r#"<input type="hidden" name="SAMLResponse" value="<redacted>"/>"#
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive("term=202422"), "term=202422");
    }
}
