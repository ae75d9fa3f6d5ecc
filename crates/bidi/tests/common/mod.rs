// Shared helpers for integration tests

#![allow(dead_code)]

use serde_json::{Value as JsonValue, json};

/// Installs a fmt subscriber once per test binary.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=bidi_rs=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Serializes an inbound event frame.
pub fn event(method: &str, params: JsonValue) -> String {
    json!({"type": "event", "method": method, "params": params}).to_string()
}

pub fn load(context: &str, url: &str) -> String {
    event(
        "browsingContext.load",
        json!({"context": context, "navigation": "nav-1", "timestamp": 1700000000000u64, "url": url}),
    )
}

pub fn context_created(context: &str, parent: Option<&str>, user_context: &str) -> String {
    event(
        "browsingContext.contextCreated",
        json!({
            "context": context,
            "url": "about:blank",
            "children": null,
            "parent": parent,
            "userContext": user_context,
            "originalOpener": null,
            "clientWindow": "w-1"
        }),
    )
}

pub fn context_destroyed(context: &str, user_context: &str) -> String {
    event(
        "browsingContext.contextDestroyed",
        json!({
            "context": context,
            "url": "about:blank",
            "children": [],
            "parent": null,
            "userContext": user_context
        }),
    )
}

pub fn before_request_sent(context: &str, request: &str, url: &str) -> String {
    event(
        "network.beforeRequestSent",
        json!({
            "context": context,
            "isBlocked": false,
            "navigation": null,
            "redirectCount": 0,
            "request": {
                "request": request,
                "url": url,
                "method": "GET",
                "headers": [{"name": "accept", "value": {"type": "string", "value": "*/*"}}],
                "cookies": [],
                "headersSize": 0,
                "bodySize": 0,
                "destination": "",
                "initiatorType": null,
                "timings": {
                    "timeOrigin": 0, "requestTime": 0, "redirectStart": 0, "redirectEnd": 0,
                    "fetchStart": 0, "dnsStart": 0, "dnsEnd": 0, "connectStart": 0,
                    "connectEnd": 0, "tlsStart": 0, "requestStart": 0, "responseStart": 0,
                    "responseEnd": 0
                }
            },
            "timestamp": 1700000000000u64,
            "initiator": {"type": "other"}
        }),
    )
}
