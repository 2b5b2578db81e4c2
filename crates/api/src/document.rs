//! Document query capability for HTML bodies.
//!
//! Handshake pages are small, server-generated forms: a handful of hidden
//! inputs and at most one alert banner. [`MarkupQuery`] scans start tags
//! instead of building a DOM, which is enough for selectors of the form
//! `tag`, `tag[attr]`, and `tag[attr='value']`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Extracts values from HTML bodies.
pub trait DocumentQuery: Send + Sync {
    /// Returns `attribute` of the last element matching `selector` that carries it.
    fn find_attribute(&self, html: &str, selector: &str, attribute: &str) -> Option<String>;

    /// Returns the trimmed text content of the last element matching `selector`.
    fn find_text(&self, html: &str, selector: &str) -> Option<String>;
}

static START_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<([A-Za-z][\w-]*)((?:\s[^>]*)?)/?>").expect("valid start tag pattern"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+)))?"#).expect("valid attribute pattern")
});
static SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*([A-Za-z][\w-]*)\s*(?:\[\s*([\w:-]+)\s*(?:=\s*(?:'([^']*)'|"([^"]*)"|([^\]\s]+)))?\s*\])?\s*$"#)
        .expect("valid selector pattern")
});
static INNER_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid inner tag pattern"));
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos|nbsp);").expect("valid entity pattern"));

#[derive(Debug, PartialEq, Eq)]
struct Selector {
    tag: String,
    attribute: Option<(String, Option<String>)>,
}

impl Selector {
    fn parse(raw: &str) -> Option<Self> {
        let caps = SELECTOR.captures(raw)?;
        let tag = caps.get(1)?.as_str().to_ascii_lowercase();
        let attribute = caps.get(2).map(|name| {
            let expected = caps
                .get(3)
                .or_else(|| caps.get(4))
                .or_else(|| caps.get(5))
                .map(|value| value.as_str().to_string());
            (name.as_str().to_ascii_lowercase(), expected)
        });
        Some(Self { tag, attribute })
    }

    fn matches(&self, tag: &str, attributes: &[(String, String)]) -> bool {
        if !tag.eq_ignore_ascii_case(&self.tag) {
            return false;
        }
        match &self.attribute {
            None => true,
            Some((name, expected)) => attributes.iter().any(|(key, value)| {
                key == name && expected.as_deref().is_none_or(|expected| expected == value)
            }),
        }
    }
}

struct Element<'a> {
    attributes: Vec<(String, String)>,
    /// Byte offset just past the start tag.
    content_start: usize,
    tag: &'a str,
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|value| decode_entities(value.as_str()))
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

fn matching_elements<'a>(html: &'a str, selector: &Selector) -> Vec<Element<'a>> {
    START_TAG
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tag = caps.get(1)?.as_str();
            let attributes = parse_attributes(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            selector.matches(tag, &attributes).then_some(Element {
                attributes,
                content_start: whole.end(),
                tag,
            })
        })
        .collect()
}

/// Decodes the character references that show up in server-rendered forms.
pub fn decode_entities(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                numeric => {
                    let digits = &numeric[1..];
                    let code = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        digits.parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Regex-backed [`DocumentQuery`] for simple attribute selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupQuery;

impl DocumentQuery for MarkupQuery {
    fn find_attribute(&self, html: &str, selector: &str, attribute: &str) -> Option<String> {
        let selector = Selector::parse(selector)?;
        let attribute = attribute.to_ascii_lowercase();
        matching_elements(html, &selector)
            .into_iter()
            .filter_map(|element| {
                element
                    .attributes
                    .into_iter()
                    .find(|(name, _)| *name == attribute)
                    .map(|(_, value)| value)
            })
            .last()
    }

    fn find_text(&self, html: &str, selector: &str) -> Option<String> {
        let selector = Selector::parse(selector)?;
        let element = matching_elements(html, &selector).into_iter().last()?;
        let rest = &html[element.content_start..];
        let closing = format!("</{}", element.tag.to_ascii_lowercase());
        let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
        let inner = INNER_TAG.replace_all(&rest[..end], "");
        Some(decode_entities(&inner).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_RESPONSE: &str = r#"
        <html><body onload="document.forms[0].submit()">
        <form action="https://eis.example.edu/commonauth" method="post">
            <input type="hidden" name="RelayState" value="ss&#x3a;mem&#x3a;abc"/>
            <input type="hidden" name="SAMLResponse" value="PHNhbWxwOlJlc3BvbnNlIA=="/>
        </form></body></html>"#;

    #[test]
    fn finds_hidden_input_values() {
        let query = MarkupQuery;
        assert_eq!(
            query.find_attribute(LOGIN_RESPONSE, "input[name='SAMLResponse']", "value").as_deref(),
            Some("PHNhbWxwOlJlc3BvbnNlIA==")
        );
        assert_eq!(
            query.find_attribute(LOGIN_RESPONSE, "input[name='RelayState']", "value").as_deref(),
            Some("ss:mem:abc")
        );
        assert_eq!(query.find_attribute(LOGIN_RESPONSE, "input[name='SAMLRequest']", "value"), None);
    }

    #[test]
    fn finds_marker_with_attribute_order_swapped() {
        let html = r#"<input value='XYZ' type=hidden name="SAMLResponse">"#;
        assert_eq!(
            MarkupQuery.find_attribute(html, "input[name='SAMLResponse']", "value").as_deref(),
            Some("XYZ")
        );
    }

    #[test]
    fn last_matching_element_wins() {
        let html = r#"<input name="SAMLResponse" value="first"><input name="SAMLResponse" value="second">"#;
        assert_eq!(
            MarkupQuery.find_attribute(html, "input[name=\"SAMLResponse\"]", "value").as_deref(),
            Some("second")
        );
    }

    #[test]
    fn extracts_banner_text_by_exact_class() {
        let html = r#"
            <div class="alert">ignored</div>
            <div class="alert alert-danger">
                <p>The password you entered was incorrect.</p>
            </div>"#;
        assert_eq!(
            MarkupQuery.find_text(html, "div[class='alert alert-danger']").as_deref(),
            Some("The password you entered was incorrect.")
        );
        assert_eq!(MarkupQuery.find_text("<p>nothing</p>", "div[class='alert alert-danger']"), None);
    }

    #[test]
    fn rejects_unsupported_selectors() {
        assert_eq!(MarkupQuery.find_text("<div></div>", "div > p"), None);
        assert_eq!(Selector::parse("div.alert"), None);
        assert_eq!(
            Selector::parse("INPUT[Name=SAMLRequest]"),
            Some(Selector {
                tag: "input".into(),
                attribute: Some(("name".into(), Some("SAMLRequest".into()))),
            })
        );
    }

    #[test]
    fn decodes_numeric_and_named_entities() {
        assert_eq!(decode_entities("a&#x2b;b&#43;c &amp; &lt;d&gt;"), "a+b+c & <d>");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}
