// Event flags for SubscriptionManager::attach() / update()
//
// A flag set says which event kinds a consumer wants turned on. On the wire
// (config files, UI state) it is a JSON object keyed by event name:
//
//   {"network.beforeRequestSent": true, "browsingContext.load": false}
//
// Historical constant keys ("BEFORE_REQUEST_SENT") are accepted on input.

use crate::protocol::events::EventKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Enabled state per event kind. Absent kinds are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventFlags {
    flags: BTreeMap<EventKind, bool>,
}

/// Kinds that change state between two flag sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagDelta {
    pub enabled: Vec<EventKind>,
    pub disabled: Vec<EventKind>,
}

impl FlagDelta {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty() && self.disabled.is_empty()
    }
}

impl EventFlags {
    /// Creates an empty flag set (everything disabled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Every catalog kind enabled
    pub fn all() -> Self {
        EventKind::ALL
            .iter()
            .fold(Self::new(), |flags, kind| flags.enable(*kind))
    }

    /// Every catalog kind explicitly disabled
    pub fn none() -> Self {
        EventKind::ALL
            .iter()
            .fold(Self::new(), |flags, kind| flags.disable(*kind))
    }

    pub fn with(mut self, kind: EventKind, enabled: bool) -> Self {
        self.flags.insert(kind, enabled);
        self
    }

    pub fn enable(self, kind: EventKind) -> Self {
        self.with(kind, true)
    }

    pub fn disable(self, kind: EventKind) -> Self {
        self.with(kind, false)
    }

    pub fn set(&mut self, kind: EventKind, enabled: bool) {
        self.flags.insert(kind, enabled);
    }

    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.flags.get(&kind).copied().unwrap_or(false)
    }

    /// Enabled kinds in catalog order
    pub fn enabled_kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.flags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(kind, _)| *kind)
    }

    /// What turning `self` into `next` switches on and off.
    ///
    /// A kind that is explicitly `false` and one that is absent are the same.
    pub fn diff(&self, next: &EventFlags) -> FlagDelta {
        let mut delta = FlagDelta::default();
        for kind in EventKind::ALL {
            match (self.is_enabled(kind), next.is_enabled(kind)) {
                (false, true) => delta.enabled.push(kind),
                (true, false) => delta.disabled.push(kind),
                _ => {}
            }
        }
        delta
    }

    /// Same enabled set, regardless of explicit `false` entries
    pub fn same_enabled(&self, other: &EventFlags) -> bool {
        self.diff(other).is_empty()
    }
}

impl FromIterator<EventKind> for EventFlags {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |flags, kind| flags.enable(kind))
    }
}
