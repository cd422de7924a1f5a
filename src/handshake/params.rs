//! Hidden form field extraction.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;
use url::form_urlencoded;

/// Hidden inputs as the relay pages render them: `<input name='x' value='y'>`.
#[allow(clippy::expect_used)]
static HIDDEN_FIELD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<input\s+name='([^']+)' value='([^']*)'>")
        .expect("hidden field regex is valid") // Static pattern, safe to panic
});

/// Ordered name/value pairs taken from one handshake response.
///
/// Names are unique; a repeated name keeps the position of its first
/// occurrence and the value of its last. Instances are built once and never
/// modified; every hop derives a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeParameters {
    entries: Vec<(String, String)>,
}

impl HandshakeParameters {
    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Name/value pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Derives the exact field set a relay hop accepts.
    ///
    /// The result holds every name of `fields` in that order; names absent
    /// here get an empty value and names not in `fields` are dropped.
    #[must_use]
    pub fn restricted_to(&self, fields: &[&str]) -> Self {
        fields
            .iter()
            .map(|name| {
                let value = self.get(name).unwrap_or_default();
                ((*name).to_string(), value.to_string())
            })
            .collect()
    }

    /// Encodes the fields as an `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn to_form_body(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.iter() {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    fn upsert(&mut self, name: String, value: String) {
        if let Some(existing) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }
}

impl FromIterator<(String, String)> for HandshakeParameters {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut params = Self::default();
        for (name, value) in iter {
            params.upsert(name, value);
        }
        params
    }
}

/// Extracts every hidden form field from raw HTML.
///
/// Never fails: a page without matching inputs yields an empty set, which
/// callers treat as a failed hop.
///
/// # Examples
///
/// ```
/// use ebook_archiver_core::extract_hidden_fields;
///
/// let html = "<form><input name='oauth_nonce' value='abc'><input name='roles' value='Learner'></form>";
/// let params = extract_hidden_fields(html);
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.get("oauth_nonce"), Some("abc"));
/// ```
#[must_use]
#[tracing::instrument(level = "trace", skip(html), fields(html_len = html.len()))]
pub fn extract_hidden_fields(html: &str) -> HandshakeParameters {
    let params: HandshakeParameters = HIDDEN_FIELD_PATTERN
        .captures_iter(html)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect();
    trace!(fields = params.len(), "extracted hidden fields");
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_returns_one_entry_per_field() {
        let html = "<html><body><form action='https://kat.digi4school.at/lti' method='post'>\
            <input name='resource_link_id' value='55'>\n\
            <input name='lti_version' value='LTI-1p0'>\n\
            <input name='oauth_signature' value='a+b/c='>\n\
            </form></body></html>";
        let params = extract_hidden_fields(html);
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("resource_link_id"), Some("55"));
        assert_eq!(params.get("oauth_signature"), Some("a+b/c="));
    }

    #[test]
    fn test_extract_duplicate_name_last_value_wins() {
        let html = "<input name='a' value='1'><input name='b' value='2'><input name='a' value='3'>";
        let params = extract_hidden_fields(html);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_extract_empty_value_is_kept() {
        let params = extract_hidden_fields("<input name='custom_warn' value=''>");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("custom_warn"), Some(""));
    }

    #[test]
    fn test_extract_no_fields_is_empty_not_error() {
        assert!(extract_hidden_fields("").is_empty());
        assert!(extract_hidden_fields("<html>Login required</html>").is_empty());
    }

    #[test]
    fn test_extract_ignores_other_quoting() {
        // Double-quoted and reordered attributes are not relay fields.
        let html = r#"<input name="q" value="x"><input value='y' name='z'>"#;
        assert!(extract_hidden_fields(html).is_empty());
    }

    #[test]
    fn test_restricted_to_drops_unknown_and_blanks_missing() {
        let params = extract_hidden_fields(
            "<input name='user_id' value='7'><input name='extra' value='nope'>",
        );
        let restricted = params.restricted_to(&["roles", "user_id"]);
        assert_eq!(
            restricted.iter().collect::<Vec<_>>(),
            vec![("roles", ""), ("user_id", "7")]
        );
        assert!(restricted.get("extra").is_none());
        // Source set is untouched.
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_form_body_percent_encodes_values() {
        let params: HandshakeParameters = vec![
            ("oauth_signature".to_string(), "a+b/c=".to_string()),
            ("roles".to_string(), "Learner Instructor".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            params.to_form_body(),
            "oauth_signature=a%2Bb%2Fc%3D&roles=Learner+Instructor"
        );
    }
}
