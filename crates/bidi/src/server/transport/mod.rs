// Transport layer
//
// The duplex channel to the browser runtime lives outside this crate. The
// core only needs two things from it:
// - send a command and get back its correlated result (session calls)
// - hand inbound text frames to the router (see `Connection::run`)
//
// Command sending is synchronous from the caller's side; a transport backed
// by an async socket blocks on its own runtime or answers from a queue.

use crate::error::TransportError;
use serde_json::Value as JsonValue;

/// Command half of the channel to the browser runtime.
pub trait Transport: Send + Sync {
    /// Sends `{"method": method, "params": params}` and returns the `result`
    /// of the matching success response.
    ///
    /// Error responses and lost connections are both a [`TransportError`].
    fn send_command(&self, method: &str, params: JsonValue) -> Result<JsonValue, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&str, JsonValue) -> Result<JsonValue, TransportError> + Send + Sync,
{
    fn send_command(&self, method: &str, params: JsonValue) -> Result<JsonValue, TransportError> {
        self(method, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closure_transport() {
        let transport = |method: &str, params: JsonValue| {
            if method == "session.subscribe" {
                Ok(json!({"subscription": "s-1", "echo": params}))
            } else {
                Err(TransportError::new(format!("unknown command {method}")))
            }
        };

        let result = transport
            .send_command("session.subscribe", json!({"events": []}))
            .unwrap();
        assert_eq!(result["subscription"], "s-1");

        let err = transport.send_command("bogus", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "unknown command bogus");
    }
}
