//! Structured store responses
//!
//! Every HTTP exchange that reaches the store produces a [`StoreResponse`],
//! whatever its status. Higher layers classify it with [`StatusClass`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Identifier inside a record URL, e.g. `.../accounts(00000000-0000-0000-0000-000000000001)`
static ENTITY_ID_IN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(([0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12})\)\s*$")
        .expect("valid entity id pattern")
});

/// Response body as received
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Body parsed as JSON
    Json(Value),
    /// Non-JSON body kept verbatim
    Text(String),
    /// No body (e.g. 204)
    Empty,
}

impl ResponseBody {
    /// Build from raw text, parsing JSON when possible
    #[must_use]
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }
}

/// Status classification used by every retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 401 / 403
    PermissionDenied,
    /// 404
    NotFound,
    /// 400, the only class the adaptive writer reshapes payloads for
    BadPayload,
    /// 409 / 412
    Conflict,
    /// 429
    RateLimited,
    /// 5xx
    ServerError,
    /// Anything else
    Other,
}

impl StatusClass {
    /// Classify an HTTP status code
    #[must_use]
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            401 | 403 => Self::PermissionDenied,
            404 => Self::NotFound,
            400 => Self::BadPayload,
            409 | 412 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

/// One HTTP exchange with the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers (name, value)
    pub headers: Vec<(String, String)>,
    /// Parsed body
    pub body: ResponseBody,
}

impl StoreResponse {
    /// Create response with JSON body
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Json(body),
        }
    }

    /// Create response with text body
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::from_text(body.into()),
        }
    }

    /// Create response without body
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Add header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status classification
    #[inline]
    #[must_use]
    pub fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }

    /// JSON body, if any
    #[must_use]
    pub fn body_json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Body rendered as diagnostic text
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Text(text) => text.clone(),
            ResponseBody::Empty => String::new(),
        }
    }

    /// Human-readable diagnostic: the store's `error.message` when present,
    /// otherwise the raw body
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let message = self
            .body_json()
            .and_then(|v| v.pointer("/error/message"))
            .and_then(Value::as_str);
        match message {
            Some(m) => m.to_string(),
            None if matches!(self.body, ResponseBody::Empty) => format!("HTTP {}", self.status),
            None => self.body_text(),
        }
    }

    /// Header value, name compared case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Identifier of a created record
    ///
    /// Read from the `OData-EntityId` or `Location` header, then from the
    /// first `...id` field of a JSON body holding a UUID-shaped string.
    #[must_use]
    pub fn entity_id(&self) -> Option<String> {
        for name in ["OData-EntityId", "Location"] {
            if let Some(caps) = self.header(name).and_then(|v| ENTITY_ID_IN_URL.captures(v)) {
                return Some(caps[1].to_string());
            }
        }

        let object = self.body_json()?.as_object()?;
        object
            .iter()
            .filter(|(k, _)| k.ends_with("id") && !k.contains('@'))
            .filter_map(|(_, v)| v.as_str())
            .find(|v| v.len() == 36 && v.matches('-').count() == 4)
            .map(str::to_string)
    }

    /// Entries of an OData collection response (`{"value": [...]}`)
    #[must_use]
    pub fn value_array(&self) -> &[Value] {
        self.body_json()
            .and_then(|v| v.get("value"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn classifies_statuses() {
        assert_eq!(StatusClass::of(204), StatusClass::Success);
        assert_eq!(StatusClass::of(401), StatusClass::PermissionDenied);
        assert_eq!(StatusClass::of(403), StatusClass::PermissionDenied);
        assert_eq!(StatusClass::of(404), StatusClass::NotFound);
        assert_eq!(StatusClass::of(400), StatusClass::BadPayload);
        assert_eq!(StatusClass::of(412), StatusClass::Conflict);
        assert_eq!(StatusClass::of(503), StatusClass::ServerError);
        assert_eq!(StatusClass::of(302), StatusClass::Other);
    }

    #[test]
    fn entity_id_from_header() {
        let response = StoreResponse::empty(204).with_header(
            "odata-entityid",
            "https://org.example/api/data/v9.2/acme_batches(6f1c2a3b-0000-4000-8000-000000000001)",
        );
        assert_eq!(
            response.entity_id().as_deref(),
            Some("6f1c2a3b-0000-4000-8000-000000000001")
        );
    }

    #[test]
    fn entity_id_from_body() {
        let response = StoreResponse::json(
            201,
            json!({
                "@odata.etag": "W/\"1\"",
                "acme_batchid": "6f1c2a3b-0000-4000-8000-000000000002",
            }),
        );
        assert_eq!(
            response.entity_id().as_deref(),
            Some("6f1c2a3b-0000-4000-8000-000000000002")
        );
    }

    #[test]
    fn diagnostic_prefers_error_message() {
        let response = StoreResponse::json(
            400,
            json!({"error": {"code": "0x0", "message": "Invalid property 'acme_bogus'"}}),
        );
        assert_eq!(response.diagnostic(), "Invalid property 'acme_bogus'");

        let raw = StoreResponse::text(500, "upstream unavailable");
        assert_eq!(raw.diagnostic(), "upstream unavailable");
        assert_eq!(StoreResponse::empty(503).diagnostic(), "HTTP 503");
    }

    #[test]
    fn from_text_detects_json() {
        assert!(matches!(ResponseBody::from_text("{\"a\":1}".into()), ResponseBody::Json(_)));
        assert!(matches!(ResponseBody::from_text("oops".into()), ResponseBody::Text(_)));
        assert!(matches!(ResponseBody::from_text("  ".into()), ResponseBody::Empty));
    }
}
