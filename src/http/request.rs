//! Normalized inbound request handed to the handler.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters: each name maps to its values in request order.
pub type QueryMap = HashMap<String, Vec<String>>;

/// Normalized representation of an inbound request.
///
/// Built fresh by the adapter for every invocation. Header names follow
/// hyper's normalization (lower-case) and hold the first value seen when a
/// header repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// HTTP method, verbatim.
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// Query parameters, repeated names kept in order.
    pub query: QueryMap,
    /// Headers, first value per name.
    pub headers: HashMap<String, String>,
    /// Raw body; `None` when the request had no body or it could not be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Bytes>,
}

impl Event {
    /// Create an event with no query, headers or body.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse an `application/x-www-form-urlencoded` query string into the
    /// ordered multimap form.
    pub fn parse_query(raw: &str) -> QueryMap {
        let mut query = QueryMap::new();
        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query
                .entry(name.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        query
    }

    /// Add a query value, appending if the name is already present.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Add a header; an existing value for the same name is kept.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into().to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Look up a header value, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .or_else(|| self.headers.get(&name.to_ascii_lowercase()))
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// First value of a query parameter.
    pub fn query_first(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of a query parameter, in request order.
    pub fn query_all(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_keeps_repeated_values_in_order() {
        let query = Event::parse_query("a=1&b=x&a=2");

        assert_eq!(query["a"], vec!["1", "2"]);
        assert_eq!(query["b"], vec!["x"]);
    }

    #[test]
    fn test_parse_query_decodes_form_encoding() {
        let query = Event::parse_query("q=hello+world&tag=%F0%9F%A6%80&empty=");

        assert_eq!(query["q"], vec!["hello world"]);
        assert_eq!(query["tag"], vec!["🦀"]);
        assert_eq!(query["empty"], vec![""]);
    }

    #[test]
    fn test_parse_query_empty() {
        assert!(Event::parse_query("").is_empty());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let event = Event::new("GET", "/").with_header("X-Trace", "abc");

        assert_eq!(event.header("x-trace"), Some("abc"));
        assert_eq!(event.header("X-TRACE"), Some("abc"));
        assert_eq!(event.header("x-missing"), None);
    }

    #[test]
    fn test_with_header_keeps_first_value() {
        let event = Event::new("GET", "/")
            .with_header("x-trace", "first")
            .with_header("X-Trace", "second");

        assert_eq!(event.header("x-trace"), Some("first"));
        assert_eq!(event.headers.len(), 1);
    }

    #[test]
    fn test_query_accessors() {
        let event = Event::new("GET", "/")
            .with_query("a", "1")
            .with_query("a", "2");

        assert_eq!(event.query_first("a"), Some("1"));
        assert_eq!(event.query_all("a"), ["1".to_string(), "2".to_string()]);
        assert_eq!(event.query_first("b"), None);
        assert!(event.query_all("b").is_empty());
    }

    #[test]
    fn test_body_helpers() {
        let event = Event::new("POST", "/").with_body(r#"{"x":1}"#);

        assert_eq!(event.text().as_deref(), Some(r#"{"x":1}"#));
        let parsed: serde_json::Value = event.json().unwrap().unwrap();
        assert_eq!(parsed["x"], 1);

        let empty = Event::new("GET", "/");
        assert!(empty.text().is_none());
        assert!(empty.json::<serde_json::Value>().is_none());
    }

    #[test]
    fn test_event_wire_shape_omits_missing_body() {
        let event = Event::new("GET", "/items").with_query("a", "1");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["method"], "GET");
        assert_eq!(value["path"], "/items");
        assert_eq!(value["query"]["a"][0], "1");
        assert!(value.get("body").is_none());
    }
}
