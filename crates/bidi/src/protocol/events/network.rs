// network module event payloads
//
// See: https://w3c.github.io/webdriver-bidi/#module-network-events
//
// Every network event shares `network.BaseParameters`; the event-specific
// fields are flattened next to it.

use serde::{Deserialize, Serialize};

/// Header or cookie value; either UTF-8 text or base64 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum BytesValue {
    String(String),
    Base64(String),
}

impl BytesValue {
    /// Returns the text form, if the value was sent as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BytesValue::String(s) => Some(s),
            BytesValue::Base64(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: BytesValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: BytesValue,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub secure: Option<bool>,
    #[serde(default)]
    pub same_site: Option<String>,
    #[serde(default)]
    pub expiry: Option<u64>,
}

/// `network.FetchTimingInfo`; all offsets in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchTimingInfo {
    pub time_origin: f64,
    pub request_time: f64,
    pub redirect_start: f64,
    pub redirect_end: f64,
    pub fetch_start: f64,
    pub dns_start: f64,
    pub dns_end: f64,
    pub connect_start: f64,
    pub connect_end: f64,
    pub tls_start: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    /// Request id, stable across redirects
    pub request: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub headers_size: Option<u64>,
    #[serde(default)]
    pub body_size: Option<u64>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub initiator_type: Option<String>,
    #[serde(default)]
    pub timings: Option<FetchTimingInfo>,
}

impl RequestData {
    /// First header with the given name (case-insensitive), as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContent {
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub scheme: String,
    pub realm: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    pub url: String,
    #[serde(default)]
    pub protocol: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub from_cache: bool,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub bytes_received: Option<u64>,
    #[serde(default)]
    pub headers_size: Option<u64>,
    #[serde(default)]
    pub body_size: Option<u64>,
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub auth_challenges: Option<Vec<AuthChallenge>>,
}

impl ResponseData {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .and_then(|h| h.value.as_str())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Initiator {
    #[serde(default, rename = "type")]
    pub initiator_type: Option<String>,
    #[serde(default)]
    pub column_number: Option<u64>,
    #[serde(default)]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<serde_json::Value>,
}

/// `network.BaseParameters`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseParameters {
    /// Owning browsing context; null for requests not tied to a document
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub navigation: Option<String>,
    #[serde(default)]
    pub redirect_count: u32,
    pub request: RequestData,
    pub timestamp: u64,
    #[serde(default)]
    pub intercepts: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeRequestSent {
    #[serde(flatten)]
    pub base: BaseParameters,
    #[serde(default)]
    pub initiator: Option<Initiator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchError {
    #[serde(flatten)]
    pub base: BaseParameters,
    pub error_text: String,
}

/// Shared by `responseStarted`, `responseCompleted` and `authRequired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseParams {
    #[serde(flatten)]
    pub base: BaseParameters,
    pub response: ResponseData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> serde_json::Value {
        json!({
            "request": "req-1",
            "url": "https://example.com/api",
            "method": "POST",
            "headers": [
                {"name": "Content-Type", "value": {"type": "string", "value": "application/json"}},
                {"name": "X-Bin", "value": {"type": "base64", "value": "AAE="}}
            ],
            "cookies": [],
            "headersSize": 120,
            "bodySize": 2,
            "timings": {"timeOrigin": 1.0, "requestTime": 2.5}
        })
    }

    #[test]
    fn test_before_request_sent() {
        let params: BeforeRequestSent = serde_json::from_value(json!({
            "context": "A1",
            "isBlocked": false,
            "navigation": null,
            "redirectCount": 0,
            "request": request(),
            "timestamp": 1700000000000u64,
            "initiator": {"type": "script"}
        }))
        .unwrap();
        assert_eq!(params.base.context.as_deref(), Some("A1"));
        assert_eq!(params.base.request.header("content-type"), Some("application/json"));
        assert_eq!(params.base.request.header("x-bin"), None);
        assert_eq!(
            params.initiator.unwrap().initiator_type.as_deref(),
            Some("script")
        );
    }

    #[test]
    fn test_response_requires_status() {
        let err = serde_json::from_value::<ResponseParams>(json!({
            "context": "A1",
            "request": request(),
            "timestamp": 1,
            "response": {"url": "https://example.com/api"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("missing field `status`"), "{err}");
    }

    #[test]
    fn test_fetch_error() {
        let params: FetchError = serde_json::from_value(json!({
            "context": null,
            "request": request(),
            "timestamp": 1,
            "errorText": "net::ERR_NAME_NOT_RESOLVED"
        }))
        .unwrap();
        assert!(params.base.context.is_none());
        assert_eq!(params.error_text, "net::ERR_NAME_NOT_RESOLVED");
    }
}
