// Wiring configuration for event targets
//
// Decides, per target class, which event kinds are delivered on the raw path
// (params as received) and which on the typed extension path (decoded
// payload). A kind listed for neither path is inert on that target class.
// The event catalog still has the last word: a kind it does not allow for a
// class is never wired there, whatever this config says.

use crate::protocol::events::EventKind;
use crate::protocol::target::Target;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw and typed wiring per target class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WiringConfig {
    /// Kinds pages receive raw
    pub page_raw: BTreeSet<EventKind>,
    /// Kinds browser contexts receive raw
    pub context_raw: BTreeSet<EventKind>,
    /// Kinds served by the typed extension path (both classes)
    pub typed: BTreeSet<EventKind>,
}

impl Default for WiringConfig {
    fn default() -> Self {
        use EventKind::*;

        Self {
            page_raw: BTreeSet::from([
                ContextDestroyed,
                EntryAdded,
                UserPromptOpened,
                DomContentLoaded,
                Load,
                BeforeRequestSent,
                FetchError,
                ResponseCompleted,
                ResponseStarted,
                RealmCreated,
                DownloadWillBegin,
                FileDialogOpened,
                ContextCreated,
                NavigationStarted,
            ]),
            context_raw: BTreeSet::from([
                BeforeRequestSent,
                FetchError,
                ResponseCompleted,
                ResponseStarted,
            ]),
            typed: BTreeSet::from([FragmentNavigated]),
        }
    }
}

impl WiringConfig {
    /// Creates the default wiring
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing wired on either path
    pub fn empty() -> Self {
        Self {
            page_raw: BTreeSet::new(),
            context_raw: BTreeSet::new(),
            typed: BTreeSet::new(),
        }
    }

    /// Wire `kind` raw on pages
    pub fn page_raw(mut self, kind: EventKind) -> Self {
        self.page_raw.insert(kind);
        self
    }

    /// Stop wiring `kind` raw on pages
    pub fn without_page_raw(mut self, kind: EventKind) -> Self {
        self.page_raw.remove(&kind);
        self
    }

    /// Wire `kind` raw on browser contexts
    pub fn context_raw(mut self, kind: EventKind) -> Self {
        self.context_raw.insert(kind);
        self
    }

    pub fn without_context_raw(mut self, kind: EventKind) -> Self {
        self.context_raw.remove(&kind);
        self
    }

    /// Serve `kind` through the typed extension path
    pub fn typed(mut self, kind: EventKind) -> Self {
        self.typed.insert(kind);
        self
    }

    pub fn without_typed(mut self, kind: EventKind) -> Self {
        self.typed.remove(&kind);
        self
    }

    pub fn supports_raw(&self, target: &Target, kind: EventKind) -> bool {
        let wired = match target {
            Target::Page(_) => &self.page_raw,
            Target::Context(_) => &self.context_raw,
        };
        target.accepts(kind) && wired.contains(&kind)
    }

    pub fn supports_typed(&self, target: &Target, kind: EventKind) -> bool {
        target.accepts(kind) && self.typed.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wiring_default_sets() {
        let wiring = WiringConfig::default();
        assert_eq!(wiring.page_raw.len(), 14);
        assert_eq!(wiring.context_raw.len(), 4);
        assert!(wiring.typed.contains(&EventKind::FragmentNavigated));
    }

    #[test]
    fn test_wiring_respects_catalog() {
        let page = Target::Page("A1".into());
        let context = Target::Context("default".into());
        let wiring = WiringConfig::empty()
            .context_raw(EventKind::Load)
            .page_raw(EventKind::HistoryUpdated);

        // load is page-only in the catalog
        assert!(!wiring.supports_raw(&context, EventKind::Load));
        assert!(wiring.supports_raw(&page, EventKind::HistoryUpdated));
        assert!(!wiring.supports_raw(&page, EventKind::Load));
    }

    #[test]
    fn test_wiring_builder_removes() {
        let wiring = WiringConfig::default()
            .without_page_raw(EventKind::Load)
            .without_typed(EventKind::FragmentNavigated)
            .typed(EventKind::HistoryUpdated);
        let page = Target::Page("A1".into());
        assert!(!wiring.supports_raw(&page, EventKind::Load));
        assert!(!wiring.supports_typed(&page, EventKind::FragmentNavigated));
        assert!(wiring.supports_typed(&page, EventKind::HistoryUpdated));
    }

    #[test]
    fn test_wiring_deserialize_partial() {
        let wiring: WiringConfig = serde_json::from_value(json!({
            "typed": ["browsingContext.historyUpdated"]
        }))
        .unwrap();
        assert!(wiring.page_raw.contains(&EventKind::Load));
        assert_eq!(
            wiring.typed,
            BTreeSet::from([EventKind::HistoryUpdated])
        );
    }
}
