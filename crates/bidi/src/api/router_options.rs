// Options for Router::with_options()

use serde::{Deserialize, Serialize};

/// Tuning for event routing and raw recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterOptions {
    /// Maximum events kept per recording accumulator; oldest dropped first.
    /// Unbounded when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_capacity: Option<usize>,

    /// Record events with no attributable context under
    /// [`UNATTRIBUTED`](crate::server::recorder::UNATTRIBUTED)
    pub record_without_context: bool,

    /// How deep the fallback search for a `context` field goes (default: 3)
    pub context_search_depth: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            recording_capacity: None,
            record_without_context: false,
            context_search_depth: 3,
        }
    }
}

impl RouterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording_capacity(mut self, capacity: usize) -> Self {
        self.recording_capacity = Some(capacity);
        self
    }

    pub fn record_without_context(mut self, enabled: bool) -> Self {
        self.record_without_context = enabled;
        self
    }

    pub fn context_search_depth(mut self, depth: usize) -> Self {
        self.context_search_depth = depth;
        self
    }
}
