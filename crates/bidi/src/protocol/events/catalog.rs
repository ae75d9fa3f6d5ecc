// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Event Catalog - Maps wire event names to kinds and payload decoders
//
// Protocol Reference:
// - https://w3c.github.io/webdriver-bidi/#modules (per-module "Events" sections)
//
// The catalog is a closed, process-wide table. Each entry pins an event's wire
// name (a permanent contract), the historical constant-style key older
// listeners used, which target classes may receive it, and the decoder that
// turns `params` into a typed payload. Payload decoders may gain fields over
// time; wire names never change.

use crate::error::DecodeError;
use crate::protocol::events::{
    Event, browsing_context, input, log, network, parse_params, script,
};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::fmt;

/// Every event this client understands.
///
/// The discriminant order matches [`CATALOG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    // browsingContext
    ContextCreated,
    ContextDestroyed,
    NavigationStarted,
    FragmentNavigated,
    HistoryUpdated,
    DomContentLoaded,
    Load,
    DownloadWillBegin,
    NavigationAborted,
    NavigationCommitted,
    NavigationFailed,
    UserPromptClosed,
    UserPromptOpened,
    // network
    AuthRequired,
    BeforeRequestSent,
    FetchError,
    ResponseCompleted,
    ResponseStarted,
    // script
    Message,
    RealmCreated,
    RealmDestroyed,
    // log
    EntryAdded,
    // input
    FileDialogOpened,
}

/// Target classes that may receive an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliesTo {
    /// A single top-level browsing context (and its frames)
    pub page: bool,
    /// A user context, covering all pages opened in it
    pub context: bool,
}

const PAGE_ONLY: AppliesTo = AppliesTo {
    page: true,
    context: false,
};

const PAGE_AND_CONTEXT: AppliesTo = AppliesTo {
    page: true,
    context: true,
};

/// Decoder turning a `params` object into a typed [`Event`].
pub type DecodeFn = fn(&JsonValue) -> Result<Event, DecodeError>;

/// One row of the event catalog.
pub struct CatalogEntry {
    pub kind: EventKind,
    pub wire_name: &'static str,
    pub legacy_name: &'static str,
    pub description: &'static str,
    pub applies_to: AppliesTo,
    pub decode: DecodeFn,
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("kind", &self.kind)
            .field("wire_name", &self.wire_name)
            .field("applies_to", &self.applies_to)
            .finish_non_exhaustive()
    }
}

macro_rules! entry {
    ($kind:ident, $wire:literal, $legacy:literal, $applies:expr, $module:ident::$payload:ident, $desc:literal) => {
        CatalogEntry {
            kind: EventKind::$kind,
            wire_name: $wire,
            legacy_name: $legacy,
            description: $desc,
            applies_to: $applies,
            decode: |params| parse_params::<$module::$payload>(params).map(Event::$kind),
        }
    };
}

/// The closed event table, in [`EventKind`] discriminant order.
pub static CATALOG: [CatalogEntry; 23] = [
    entry!(
        ContextCreated,
        "browsingContext.contextCreated",
        "CONTEXT_CREATED",
        PAGE_AND_CONTEXT,
        browsing_context::Info,
        "A browsing context (tab, window or frame) was created."
    ),
    entry!(
        ContextDestroyed,
        "browsingContext.contextDestroyed",
        "CONTEXT_DESTROYED",
        PAGE_AND_CONTEXT,
        browsing_context::Info,
        "A browsing context was closed."
    ),
    entry!(
        NavigationStarted,
        "browsingContext.navigationStarted",
        "NAVIGATION_STARTED",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "A navigation to a new URL has started."
    ),
    entry!(
        FragmentNavigated,
        "browsingContext.fragmentNavigated",
        "FRAGMENT_NAVIGATED",
        PAGE_AND_CONTEXT,
        browsing_context::NavigationInfo,
        "Only the URL fragment changed; the document was not reloaded."
    ),
    entry!(
        HistoryUpdated,
        "browsingContext.historyUpdated",
        "HISTORY_UPDATED",
        PAGE_ONLY,
        browsing_context::HistoryUpdated,
        "The session history was updated (pushState/replaceState)."
    ),
    entry!(
        DomContentLoaded,
        "browsingContext.domContentLoaded",
        "DOM_CONTENT_LOADED",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "The document was parsed; subresources may still be loading."
    ),
    entry!(
        Load,
        "browsingContext.load",
        "LOAD",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "The document and all subresources finished loading."
    ),
    entry!(
        DownloadWillBegin,
        "browsingContext.downloadWillBegin",
        "DOWNLOAD_WILL_BEGIN",
        PAGE_AND_CONTEXT,
        browsing_context::DownloadWillBegin,
        "A file download is about to start."
    ),
    entry!(
        NavigationAborted,
        "browsingContext.navigationAborted",
        "NAVIGATION_ABORTED",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "A started navigation was aborted."
    ),
    entry!(
        NavigationCommitted,
        "browsingContext.navigationCommitted",
        "NAVIGATION_COMMITTED",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "A navigation was committed; the new document is being displayed."
    ),
    entry!(
        NavigationFailed,
        "browsingContext.navigationFailed",
        "NAVIGATION_FAILED",
        PAGE_ONLY,
        browsing_context::NavigationInfo,
        "A navigation failed (for example, a network error)."
    ),
    entry!(
        UserPromptClosed,
        "browsingContext.userPromptClosed",
        "USER_PROMPT_CLOSED",
        PAGE_AND_CONTEXT,
        browsing_context::UserPromptClosed,
        "A user prompt (alert, confirm, prompt) was closed."
    ),
    entry!(
        UserPromptOpened,
        "browsingContext.userPromptOpened",
        "USER_PROMPT_OPENED",
        PAGE_AND_CONTEXT,
        browsing_context::UserPromptOpened,
        "A user prompt (alert, confirm, prompt) was opened."
    ),
    entry!(
        AuthRequired,
        "network.authRequired",
        "AUTH_REQUIRED",
        PAGE_AND_CONTEXT,
        network::ResponseParams,
        "The server asked for HTTP authentication credentials."
    ),
    entry!(
        BeforeRequestSent,
        "network.beforeRequestSent",
        "BEFORE_REQUEST_SENT",
        PAGE_AND_CONTEXT,
        network::BeforeRequestSent,
        "A network request is about to be sent."
    ),
    entry!(
        FetchError,
        "network.fetchError",
        "FETCH_ERROR",
        PAGE_AND_CONTEXT,
        network::FetchError,
        "A network request failed."
    ),
    entry!(
        ResponseCompleted,
        "network.responseCompleted",
        "RESPONSE_COMPLETED",
        PAGE_AND_CONTEXT,
        network::ResponseParams,
        "A response body was fully received."
    ),
    entry!(
        ResponseStarted,
        "network.responseStarted",
        "RESPONSE_STARTED",
        PAGE_AND_CONTEXT,
        network::ResponseParams,
        "Response headers were received."
    ),
    entry!(
        Message,
        "script.message",
        "MESSAGE",
        PAGE_ONLY,
        script::Message,
        "A preload script or function sent a message on a channel."
    ),
    entry!(
        RealmCreated,
        "script.realmCreated",
        "REALM_CREATED",
        PAGE_ONLY,
        script::RealmInfo,
        "A JavaScript realm (window, worker, worklet) was created."
    ),
    entry!(
        RealmDestroyed,
        "script.realmDestroyed",
        "REALM_DESTROYED",
        PAGE_ONLY,
        script::RealmDestroyed,
        "A JavaScript realm was destroyed."
    ),
    entry!(
        EntryAdded,
        "log.entryAdded",
        "ENTRY_ADDED",
        PAGE_AND_CONTEXT,
        log::LogEntry,
        "A console message or uncaught JavaScript error was logged."
    ),
    entry!(
        FileDialogOpened,
        "input.fileDialogOpened",
        "FILE_DIALOG_OPENED",
        PAGE_ONLY,
        input::FileDialogInfo,
        "The browser opened a file chooser dialog."
    ),
];

impl EventKind {
    pub const ALL: [EventKind; 23] = [
        EventKind::ContextCreated,
        EventKind::ContextDestroyed,
        EventKind::NavigationStarted,
        EventKind::FragmentNavigated,
        EventKind::HistoryUpdated,
        EventKind::DomContentLoaded,
        EventKind::Load,
        EventKind::DownloadWillBegin,
        EventKind::NavigationAborted,
        EventKind::NavigationCommitted,
        EventKind::NavigationFailed,
        EventKind::UserPromptClosed,
        EventKind::UserPromptOpened,
        EventKind::AuthRequired,
        EventKind::BeforeRequestSent,
        EventKind::FetchError,
        EventKind::ResponseCompleted,
        EventKind::ResponseStarted,
        EventKind::Message,
        EventKind::RealmCreated,
        EventKind::RealmDestroyed,
        EventKind::EntryAdded,
        EventKind::FileDialogOpened,
    ];

    /// Looks a kind up by wire name (`network.beforeRequestSent`) or by its
    /// historical constant key (`BEFORE_REQUEST_SENT`).
    pub fn from_name(name: &str) -> Option<EventKind> {
        lookup(name)
            .or_else(|| CATALOG.iter().find(|e| e.legacy_name == name))
            .map(|e| e.kind)
    }

    pub fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    pub fn wire_name(self) -> &'static str {
        self.entry().wire_name
    }

    pub fn legacy_name(self) -> &'static str {
        self.entry().legacy_name
    }

    pub fn description(self) -> &'static str {
        self.entry().description
    }

    pub fn applies_to(self) -> AppliesTo {
        self.entry().applies_to
    }

    /// Protocol module the event belongs to (`browsingContext`, `network`, ...).
    pub fn module(self) -> &'static str {
        let wire = self.wire_name();
        wire.split_once('.').map_or(wire, |(module, _)| module)
    }

    /// Decodes `params` into this kind's typed payload.
    pub fn decode(self, params: &JsonValue) -> Result<Event, DecodeError> {
        (self.entry().decode)(params)
    }
}

/// Finds the catalog entry for a wire method name.
pub fn lookup(method: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.wire_name == method)
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        EventKind::from_name(&name)
            .ok_or_else(|| D::Error::custom(format!("unknown variant `{name}`, expected an event name")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_catalog_order_matches_kinds() {
        for (index, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(CATALOG[index].kind, *kind);
            assert_eq!(*kind as usize, index);
        }
    }

    #[test]
    fn test_from_name_wire_and_legacy() {
        assert_eq!(
            EventKind::from_name("network.beforeRequestSent"),
            Some(EventKind::BeforeRequestSent)
        );
        assert_eq!(
            EventKind::from_name("CONTEXT_CREATED"),
            Some(EventKind::ContextCreated)
        );
        assert_eq!(EventKind::from_name("network.nope"), None);
        assert_eq!(EventKind::from_name(""), None);
    }

    #[test]
    fn test_wire_names_unique_and_namespaced() {
        let mut seen = std::collections::HashSet::new();
        for entry in CATALOG.iter() {
            assert!(seen.insert(entry.wire_name), "duplicate {}", entry.wire_name);
            assert!(seen.insert(entry.legacy_name), "duplicate {}", entry.legacy_name);
            assert!(entry.wire_name.contains('.'));
        }
    }

    #[test]
    fn test_module() {
        assert_eq!(EventKind::Load.module(), "browsingContext");
        assert_eq!(EventKind::EntryAdded.module(), "log");
        assert_eq!(EventKind::FileDialogOpened.module(), "input");
    }

    #[test]
    fn test_serde_uses_wire_name() {
        assert_eq!(
            serde_json::to_value(EventKind::FetchError).unwrap(),
            json!("network.fetchError")
        );
        let kind: EventKind = serde_json::from_value(json!("RESPONSE_STARTED")).unwrap();
        assert_eq!(kind, EventKind::ResponseStarted);
        assert!(serde_json::from_value::<EventKind>(json!("bogus")).is_err());
    }

    #[test]
    fn test_decode_through_entry() {
        let event = EventKind::HistoryUpdated
            .decode(&json!({"context": "ctx-1", "url": "https://example.com/#a"}))
            .unwrap();
        assert_eq!(event.kind(), EventKind::HistoryUpdated);
        assert_eq!(event.context(), Some("ctx-1"));
    }
}
