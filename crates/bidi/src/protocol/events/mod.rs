//! Typed event model
//!
//! An inbound event is identified by its wire `method`; [`catalog`] maps that
//! name to an [`EventKind`] and a decoder producing one variant of [`Event`].
//! Unknown extra fields in `params` are ignored; a missing protocol-mandated
//! field is a [`DecodeError`].

pub mod browsing_context;
pub mod catalog;
pub mod input;
pub mod log;
pub mod network;
pub mod script;

pub use catalog::{AppliesTo, CATALOG, CatalogEntry, EventKind, lookup};

use crate::error::DecodeError;
use crate::protocol::target::ContextId;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A decoded event payload, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ContextCreated(browsing_context::Info),
    ContextDestroyed(browsing_context::Info),
    NavigationStarted(browsing_context::NavigationInfo),
    FragmentNavigated(browsing_context::NavigationInfo),
    HistoryUpdated(browsing_context::HistoryUpdated),
    DomContentLoaded(browsing_context::NavigationInfo),
    Load(browsing_context::NavigationInfo),
    DownloadWillBegin(browsing_context::DownloadWillBegin),
    NavigationAborted(browsing_context::NavigationInfo),
    NavigationCommitted(browsing_context::NavigationInfo),
    NavigationFailed(browsing_context::NavigationInfo),
    UserPromptClosed(browsing_context::UserPromptClosed),
    UserPromptOpened(browsing_context::UserPromptOpened),
    AuthRequired(network::ResponseParams),
    BeforeRequestSent(network::BeforeRequestSent),
    FetchError(network::FetchError),
    ResponseCompleted(network::ResponseParams),
    ResponseStarted(network::ResponseParams),
    Message(script::Message),
    RealmCreated(script::RealmInfo),
    RealmDestroyed(script::RealmDestroyed),
    EntryAdded(log::LogEntry),
    FileDialogOpened(input::FileDialogInfo),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ContextCreated(_) => EventKind::ContextCreated,
            Event::ContextDestroyed(_) => EventKind::ContextDestroyed,
            Event::NavigationStarted(_) => EventKind::NavigationStarted,
            Event::FragmentNavigated(_) => EventKind::FragmentNavigated,
            Event::HistoryUpdated(_) => EventKind::HistoryUpdated,
            Event::DomContentLoaded(_) => EventKind::DomContentLoaded,
            Event::Load(_) => EventKind::Load,
            Event::DownloadWillBegin(_) => EventKind::DownloadWillBegin,
            Event::NavigationAborted(_) => EventKind::NavigationAborted,
            Event::NavigationCommitted(_) => EventKind::NavigationCommitted,
            Event::NavigationFailed(_) => EventKind::NavigationFailed,
            Event::UserPromptClosed(_) => EventKind::UserPromptClosed,
            Event::UserPromptOpened(_) => EventKind::UserPromptOpened,
            Event::AuthRequired(_) => EventKind::AuthRequired,
            Event::BeforeRequestSent(_) => EventKind::BeforeRequestSent,
            Event::FetchError(_) => EventKind::FetchError,
            Event::ResponseCompleted(_) => EventKind::ResponseCompleted,
            Event::ResponseStarted(_) => EventKind::ResponseStarted,
            Event::Message(_) => EventKind::Message,
            Event::RealmCreated(_) => EventKind::RealmCreated,
            Event::RealmDestroyed(_) => EventKind::RealmDestroyed,
            Event::EntryAdded(_) => EventKind::EntryAdded,
            Event::FileDialogOpened(_) => EventKind::FileDialogOpened,
        }
    }

    /// Browsing context named by the payload itself, if any.
    ///
    /// `realmDestroyed` names only a realm; the router resolves it through
    /// the realms it has seen created.
    pub fn context(&self) -> Option<&str> {
        match self {
            Event::ContextCreated(info) | Event::ContextDestroyed(info) => Some(&info.context),
            Event::NavigationStarted(nav)
            | Event::FragmentNavigated(nav)
            | Event::DomContentLoaded(nav)
            | Event::Load(nav)
            | Event::NavigationAborted(nav)
            | Event::NavigationCommitted(nav)
            | Event::NavigationFailed(nav) => Some(&nav.context),
            Event::DownloadWillBegin(p) => Some(&p.navigation.context),
            Event::HistoryUpdated(p) => Some(&p.context),
            Event::UserPromptClosed(p) => Some(&p.context),
            Event::UserPromptOpened(p) => Some(&p.context),
            Event::AuthRequired(p) | Event::ResponseCompleted(p) | Event::ResponseStarted(p) => {
                p.base.context.as_deref()
            }
            Event::BeforeRequestSent(p) => p.base.context.as_deref(),
            Event::FetchError(p) => p.base.context.as_deref(),
            Event::Message(p) => p.source.context.as_deref(),
            Event::RealmCreated(p) => p.context.as_deref(),
            Event::RealmDestroyed(_) => None,
            Event::EntryAdded(p) => p.source.context.as_deref(),
            Event::FileDialogOpened(p) => Some(&p.context),
        }
    }
}

/// One decoded inbound event.
///
/// Built once per wire message and handed by reference to every matching
/// typed listener; nothing retains it after dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub method: String,
    pub context: Option<ContextId>,
    pub payload: Event,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// An inbound event before (or instead of) typed decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub method: String,
    pub kind: Option<EventKind>,
    pub context: Option<ContextId>,
    pub params: JsonValue,
}

/// Decodes a `params` object into a payload struct, classifying failures.
pub(crate) fn parse_params<T: DeserializeOwned>(params: &JsonValue) -> Result<T, DecodeError> {
    if !params.is_object() {
        return Err(DecodeError::shape("params object", params));
    }
    T::deserialize(params).map_err(|e| DecodeError::from_serde(&e))
}

/// Finds the owning browsing context in raw `params`.
///
/// Used when a payload could not be decoded or names no context. Looks at
/// the usual locations first, then searches nested objects up to
/// `max_depth` levels for a string `context` field.
pub fn extract_context_id(params: &JsonValue, max_depth: usize) -> Option<ContextId> {
    const PATHS: [&[&str]; 6] = [
        &["context"],
        &["source", "context"],
        &["realm", "context"],
        &["target", "context"],
        &["params", "context"],
        &["browsingContext"],
    ];

    PATHS
        .iter()
        .find_map(|path| string_at(params, path))
        .or_else(|| deep_find(params, "context", max_depth))
        .map(ContextId::from)
}

/// Finds the user context named in raw `params`, if any.
pub fn extract_user_context_id(params: &JsonValue) -> Option<ContextId> {
    string_at(params, &["userContext"]).map(ContextId::from)
}

fn string_at<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |current, key| current.get(key))?
        .as_str()
        .filter(|s| !s.is_empty())
}

fn deep_find<'a>(value: &'a JsonValue, key: &str, depth: usize) -> Option<&'a str> {
    if depth == 0 {
        return None;
    }
    match value {
        JsonValue::Object(map) => {
            if let Some(found) = map.get(key).and_then(JsonValue::as_str) {
                if !found.is_empty() {
                    return Some(found);
                }
            }
            map.values().find_map(|v| deep_find(v, key, depth - 1))
        }
        JsonValue::Array(items) => items.iter().find_map(|v| deep_find(v, key, depth - 1)),
        _ => None,
    }
}
