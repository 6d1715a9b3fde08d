//! The handler's declared outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Response produced by a handler and consumed once by the adapter.
///
/// A `status_code` of `0` means "unset" and is written as `200`. `body` is
/// any JSON value; when `None` no payload is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code, `0` when unset.
    #[serde(rename = "statusCode", default)]
    pub status_code: u16,
    /// Headers applied to the outgoing response verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Payload, serialized as JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Response {
    /// Create a response with the given status code and no body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// Create a `200` response with a JSON body.
    pub fn json(body: impl Into<Value>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Serialize any value into the body.
    pub fn serialize<T: Serialize>(body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::json(serde_json::to_value(body)?))
    }

    /// Set the status code.
    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Add a header; a later value for the same name replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The status code the adapter writes: `200` when unset.
    pub fn effective_status(&self) -> u16 {
        if self.status_code == 0 {
            200
        } else {
            self.status_code
        }
    }
}

impl From<Value> for Response {
    fn from(body: Value) -> Self {
        Self::json(body)
    }
}
