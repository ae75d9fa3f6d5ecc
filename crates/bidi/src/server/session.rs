// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Session - subscribe/unsubscribe wire calls
//
// Subscriptions on the remote side are scoped the same way targets are:
//
//   {"method": "session.subscribe",
//    "params": {"events": ["browsingContext.load"], "contexts": ["A1"]}}
//
//   {"method": "session.subscribe",
//    "params": {"events": ["network.beforeRequestSent"], "userContexts": ["uc-1"]}}
//
// The runtime answers with a subscription id that later identifies the
// subscription in `session.unsubscribe`. Older runtimes return nothing; for
// those the unsubscribe call repeats the event names and contexts instead.

use crate::error::Result;
use crate::protocol::events::EventKind;
use crate::protocol::target::Target;
use crate::server::transport::Transport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscribeParams<'a> {
    events: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contexts: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_contexts: Option<Vec<&'a str>>,
}

impl<'a> SubscribeParams<'a> {
    fn new(kinds: &[EventKind], target: &'a Target) -> Self {
        let events = kinds.iter().map(|kind| kind.wire_name()).collect();
        match target {
            Target::Page(id) => Self {
                events,
                contexts: Some(vec![id.as_str()]),
                user_contexts: None,
            },
            Target::Context(id) => Self {
                events,
                contexts: None,
                user_contexts: Some(vec![id.as_str()]),
            },
        }
    }
}

#[derive(Deserialize)]
struct SubscribeResult {
    #[serde(default)]
    subscription: Option<String>,
}

#[derive(Serialize)]
struct UnsubscribeById<'a> {
    subscriptions: [&'a str; 1],
}

/// Issues session commands through a [`Transport`].
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Sends a command and decodes its result as `R`.
    pub fn send<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
        let params = serde_json::to_value(params)?;
        let response = self.transport.send_command(method, params)?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Sends a command whose result is ignored.
    pub fn send_no_result<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        let _: JsonValue = self.send(method, params)?;
        Ok(())
    }

    /// Subscribes `target` to `kinds` on the remote side.
    ///
    /// Returns the subscription id when the runtime hands one out.
    pub fn subscribe(&self, kinds: &[EventKind], target: &Target) -> Result<Option<String>> {
        tracing::debug!("session.subscribe {:?} on {}", kinds, target);
        let result: Option<SubscribeResult> =
            self.send("session.subscribe", SubscribeParams::new(kinds, target))?;
        Ok(result.and_then(|r| r.subscription))
    }

    /// Drops a remote subscription.
    ///
    /// With an id the call names just that subscription; without one it
    /// names the events and target it was created for.
    pub fn unsubscribe(
        &self,
        subscription: Option<&str>,
        kinds: &[EventKind],
        target: &Target,
    ) -> Result<()> {
        tracing::debug!("session.unsubscribe {:?} on {}", kinds, target);
        match subscription {
            Some(id) => self.send_no_result(
                "session.unsubscribe",
                UnsubscribeById {
                    subscriptions: [id],
                },
            ),
            None => self.send_no_result(
                "session.unsubscribe",
                SubscribeParams::new(kinds, target),
            ),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, TransportError};
    use parking_lot::Mutex;
    use serde_json::json;

    type Log = Arc<Mutex<Vec<(String, JsonValue)>>>;

    fn session(reply: JsonValue) -> (Session, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::clone(&log);
        let transport = move |method: &str, params: JsonValue| {
            sent.lock().push((method.to_string(), params));
            Ok::<_, TransportError>(reply.clone())
        };
        (Session::new(Arc::new(transport)), log)
    }

    #[test]
    fn test_subscribe_page_uses_contexts() {
        let (session, log) = session(json!({"subscription": "sub-7"}));
        let id = session
            .subscribe(&[EventKind::Load], &Target::Page("A1".into()))
            .unwrap();

        assert_eq!(id.as_deref(), Some("sub-7"));
        assert_eq!(
            log.lock()[0],
            (
                "session.subscribe".to_string(),
                json!({"events": ["browsingContext.load"], "contexts": ["A1"]})
            )
        );
    }

    #[test]
    fn test_subscribe_context_uses_user_contexts() {
        let (session, log) = session(json!({}));
        let id = session
            .subscribe(
                &[EventKind::BeforeRequestSent, EventKind::FetchError],
                &Target::Context("uc-1".into()),
            )
            .unwrap();

        assert_eq!(id, None);
        assert_eq!(
            log.lock()[0].1,
            json!({
                "events": ["network.beforeRequestSent", "network.fetchError"],
                "userContexts": ["uc-1"]
            })
        );
    }

    #[test]
    fn test_subscribe_accepts_null_result() {
        let (session, _) = session(JsonValue::Null);
        let id = session
            .subscribe(&[EventKind::Load], &Target::Page("A1".into()))
            .unwrap();
        assert_eq!(id, None);
    }

    #[test]
    fn test_unsubscribe_by_id_and_by_attributes() {
        let (session, log) = session(json!({}));
        let target = Target::Page("A1".into());
        session
            .unsubscribe(Some("sub-7"), &[EventKind::Load], &target)
            .unwrap();
        session.unsubscribe(None, &[EventKind::Load], &target).unwrap();

        let log = log.lock();
        assert_eq!(log[0].1, json!({"subscriptions": ["sub-7"]}));
        assert_eq!(
            log[1].1,
            json!({"events": ["browsingContext.load"], "contexts": ["A1"]})
        );
    }

    #[test]
    fn test_transport_error_propagates() {
        let transport =
            |_: &str, _: JsonValue| -> std::result::Result<JsonValue, TransportError> {
                Err(TransportError::new("connection closed"))
            };
        let session = Session::new(Arc::new(transport));
        let err = session
            .subscribe(&[EventKind::Load], &Target::Page("A1".into()))
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
