// Raw event recording
//
// Every inbound event with an attributable browsing context is appended to
// that context's accumulator, whatever listeners happen to be enabled.
// Accumulators are created on first use and only go away through
// `RecordingRegistry::remove`.

use crate::protocol::events::EventKind;
use crate::protocol::target::ContextId;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key for events that name no browsing context, when those are recorded.
pub const UNATTRIBUTED: &str = "<unattributed>";

/// One recorded inbound event, as received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Arrival order across all accumulators of a registry
    pub sequence: u64,
    pub method: String,
    /// `None` for methods missing from the catalog
    pub kind: Option<EventKind>,
    pub params: JsonValue,
}

/// Accumulator for one context.
#[derive(Debug)]
pub struct RecordingSink {
    context: ContextId,
    capacity: Option<usize>,
    events: Mutex<VecDeque<RecordedEvent>>,
    dropped: AtomicU64,
}

impl RecordingSink {
    fn new(context: ContextId, capacity: Option<usize>) -> Self {
        Self {
            context,
            capacity,
            events: Mutex::new(VecDeque::new()),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    pub(crate) fn push(&self, event: RecordedEvent) {
        let mut events = self.events.lock();
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            while events.len() >= capacity {
                events.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        events.push_back(event);
    }

    /// Copies the recorded events, oldest first
    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Takes the recorded events, leaving the accumulator empty
    pub fn drain(&self) -> Vec<RecordedEvent> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Events evicted because the accumulator was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Per-context accumulators, keyed by context id.
#[derive(Debug)]
pub struct RecordingRegistry {
    sinks: Mutex<HashMap<ContextId, Arc<RecordingSink>>>,
    capacity: Option<usize>,
    sequence: AtomicU64,
}

impl RecordingRegistry {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            sinks: Mutex::new(HashMap::new()),
            capacity,
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns the accumulator for `context`, creating it if needed.
    pub fn get_or_create(&self, context: &ContextId) -> Arc<RecordingSink> {
        let mut sinks = self.sinks.lock();
        Arc::clone(sinks.entry(context.clone()).or_insert_with(|| {
            tracing::debug!("Creating recording sink for context {}", context);
            Arc::new(RecordingSink::new(context.clone(), self.capacity))
        }))
    }

    pub fn get(&self, context: &ContextId) -> Option<Arc<RecordingSink>> {
        self.sinks.lock().get(context).cloned()
    }

    /// Removes an accumulator. Events already taken from it are unaffected.
    pub fn remove(&self, context: &ContextId) -> Option<Arc<RecordingSink>> {
        self.sinks.lock().remove(context)
    }

    pub fn contexts(&self) -> Vec<ContextId> {
        let mut contexts: Vec<_> = self.sinks.lock().keys().cloned().collect();
        contexts.sort();
        contexts
    }

    pub(crate) fn record(
        &self,
        context: &ContextId,
        method: &str,
        kind: Option<EventKind>,
        params: &JsonValue,
    ) {
        let sink = self.get_or_create(context);
        sink.push(RecordedEvent {
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            kind,
            params: params.clone(),
        });
    }
}

impl Default for RecordingRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
