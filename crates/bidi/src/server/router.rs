// Event Router - Fans inbound events out to registered listeners
//
// Inbound wire events look like:
//
//   {"type": "event", "method": "network.beforeRequestSent", "params": {...}}
//
// For each message the router looks the method up in the catalog, decodes
// the payload, works out the owning browsing context and delivers the event
// to every registration whose kind matches and whose target is that context
// or one of its ancestors (frame -> page -> user context). Global
// registrations see every event of their kind, with or without a context.
//
// Failures never stop the stream: they go to the error sink and the next
// message is processed normally. Listeners run on the dispatching thread, in
// registration order, with no router lock held.

use crate::api::RouterOptions;
use crate::error::{DispatchError, SubscriptionError};
use crate::protocol::events::{
    self, Event, EventKind, EventRecord, RawEvent, browsing_context, extract_context_id,
    extract_user_context_id,
};
use crate::protocol::target::{ContextId, Target};
use crate::server::recorder::{RecordingRegistry, UNATTRIBUTED};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback receiving an event's params as received
pub type RawCallback = Arc<dyn Fn(&RawEvent) + Send + Sync>;

/// Callback receiving the decoded event
pub type TypedCallback = Arc<dyn Fn(&EventRecord) + Send + Sync>;

/// Receives every dispatch failure
pub type ErrorSink = Arc<dyn Fn(&DispatchError) + Send + Sync>;

/// Receives page lifecycle notifications for one user context
pub type PageHook = Arc<dyn Fn(&PageEvent) + Send + Sync>;

/// A listener callback on one of the two delivery paths.
#[derive(Clone)]
pub enum Listener {
    Raw(RawCallback),
    Typed(TypedCallback),
}

impl Listener {
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&RawEvent) + Send + Sync + 'static,
    {
        Listener::Raw(Arc::new(f))
    }

    pub fn typed<F>(f: F) -> Self
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        Listener::Typed(Arc::new(f))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Raw(_) => f.write_str("Listener::Raw"),
            Listener::Typed(_) => f.write_str("Listener::Typed"),
        }
    }
}

/// Id of one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id of one page hook registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

/// A page appearing in or leaving a user context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Created(ContextId),
    Closed(ContextId),
}

struct Registration {
    id: u64,
    // None for global registrations
    target: Option<Target>,
    kind: EventKind,
    listener: Listener,
}

struct PageHookEntry {
    id: u64,
    user_context: ContextId,
    hook: PageHook,
}

#[derive(Default)]
struct RouterState {
    // Kept in registration order; dispatch walks it front to back.
    registrations: Vec<Registration>,
    // frame -> parent browsing context
    frames: HashMap<ContextId, ContextId>,
    // top-level browsing context -> user context
    pages: HashMap<ContextId, ContextId>,
    // realm id -> owning browsing context
    realms: HashMap<String, ContextId>,
    page_hooks: Vec<PageHookEntry>,
}

impl RouterState {
    /// The context itself followed by its ancestors.
    fn lineage(&self, context: &ContextId) -> Vec<ContextId> {
        let mut chain = vec![context.clone()];
        let mut current = context.clone();
        // bounded in case the runtime ever reports a cycle
        for _ in 0..64 {
            let next = match self.frames.get(&current) {
                Some(parent) => parent.clone(),
                None => match self.pages.get(&current) {
                    Some(user_context) => {
                        chain.push(user_context.clone());
                        break;
                    }
                    None => break,
                },
            };
            chain.push(next.clone());
            current = next;
        }
        chain
    }

    fn hooks_for(&self, user_context: &ContextId) -> Vec<PageHook> {
        self.page_hooks
            .iter()
            .filter(|entry| &entry.user_context == user_context)
            .map(|entry| Arc::clone(&entry.hook))
            .collect()
    }

    /// Drops `roots`, every frame nested below them and every realm they own.
    fn forget_subtree(&mut self, roots: Vec<ContextId>) {
        let mut doomed: HashSet<ContextId> = roots.into_iter().collect();
        loop {
            let below: Vec<ContextId> = self
                .frames
                .iter()
                .filter(|(frame, parent)| doomed.contains(*parent) && !doomed.contains(*frame))
                .map(|(frame, _)| frame.clone())
                .collect();
            if below.is_empty() {
                break;
            }
            doomed.extend(below);
        }

        self.frames.retain(|frame, _| !doomed.contains(frame));
        self.pages.retain(|page, _| !doomed.contains(page));
        self.realms.retain(|_, owner| !doomed.contains(owner));
    }
}

fn subtree_ids(info: &browsing_context::Info, out: &mut Vec<ContextId>) {
    out.push(ContextId::from(info.context.as_str()));
    for child in info.children.iter().flatten() {
        subtree_ids(child, out);
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    message_type: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: JsonValue,
}

/// Work left over after listeners ran.
#[derive(Default)]
struct AfterDelivery {
    hooks: Vec<(PageHook, PageEvent)>,
    destroyed: Vec<ContextId>,
    destroyed_realm: Option<String>,
}

/// Routes inbound events to listeners and recording accumulators.
pub struct Router {
    state: Mutex<RouterState>,
    next_id: AtomicU64,
    error_sink: RwLock<ErrorSink>,
    recordings: RecordingRegistry,
    options: RouterOptions,
}

impl Router {
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    pub fn with_options(options: RouterOptions) -> Self {
        let default_sink: ErrorSink = Arc::new(|err: &DispatchError| {
            tracing::warn!("Dropping inbound event: {}", err);
        });
        Self {
            state: Mutex::new(RouterState::default()),
            next_id: AtomicU64::new(1),
            error_sink: RwLock::new(default_sink),
            recordings: RecordingRegistry::new(options.recording_capacity),
            options,
        }
    }

    /// Replaces the error sink. The default one logs at `warn`.
    pub fn set_error_sink<F>(&self, sink: F)
    where
        F: Fn(&DispatchError) + Send + Sync + 'static,
    {
        *self.error_sink.write() = Arc::new(sink);
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Per-context raw accumulators.
    pub fn recordings(&self) -> &RecordingRegistry {
        &self.recordings
    }

    /// Registers a listener for `kind` events reaching `target`.
    ///
    /// The registration is not checked against the target's capabilities;
    /// that is the subscription manager's job.
    pub fn register(&self, target: Target, kind: EventKind, listener: Listener) -> ListenerHandle {
        tracing::debug!("Registering {:?} listener for {} on {}", listener, kind, target);
        self.push_registration(Some(target), kind, listener)
    }

    /// Registers a listener for every `kind` event, whatever its context.
    ///
    /// Events the router cannot attribute to a browsing context (worker
    /// network traffic, worker console output) only reach global listeners.
    /// Global and targeted listeners share one registration order.
    pub fn register_global(&self, kind: EventKind, listener: Listener) -> ListenerHandle {
        tracing::debug!("Registering global {:?} listener for {}", listener, kind);
        self.push_registration(None, kind, listener)
    }

    fn push_registration(
        &self,
        target: Option<Target>,
        kind: EventKind,
        listener: Listener,
    ) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.lock().registrations.push(Registration {
            id,
            target,
            kind,
            listener,
        });
        ListenerHandle(id)
    }

    pub fn register_raw<F>(&self, target: Target, kind: EventKind, f: F) -> ListenerHandle
    where
        F: Fn(&RawEvent) + Send + Sync + 'static,
    {
        self.register(target, kind, Listener::raw(f))
    }

    pub fn register_typed<F>(&self, target: Target, kind: EventKind, f: F) -> ListenerHandle
    where
        F: Fn(&EventRecord) + Send + Sync + 'static,
    {
        self.register(target, kind, Listener::typed(f))
    }

    /// Removes a registration.
    ///
    /// A dispatch already in progress may still deliver to it once.
    pub fn unregister(&self, handle: ListenerHandle) -> Result<(), SubscriptionError> {
        let mut state = self.state.lock();
        let position = state
            .registrations
            .iter()
            .position(|r| r.id == handle.0)
            .ok_or(SubscriptionError::UnknownHandle(handle.0))?;
        let removed = state.registrations.remove(position);
        tracing::debug!("Unregistered listener {} for {}", handle, removed.kind);
        Ok(())
    }

    pub fn is_registered(&self, handle: ListenerHandle) -> bool {
        self.state
            .lock()
            .registrations
            .iter()
            .any(|r| r.id == handle.0)
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().registrations.len()
    }

    /// Records that `page` is a top-level browsing context of `user_context`.
    ///
    /// Needed for pages that existed before the router saw their
    /// `contextCreated`.
    pub fn attach_page(&self, page: impl Into<ContextId>, user_context: impl Into<ContextId>) {
        let page = page.into();
        let user_context = user_context.into();
        let hooks = {
            let mut state = self.state.lock();
            if state.pages.get(&page) == Some(&user_context) {
                return;
            }
            state.pages.insert(page.clone(), user_context.clone());
            state.hooks_for(&user_context)
        };
        let event = PageEvent::Created(page);
        for hook in hooks {
            hook(&event);
        }
    }

    /// Records a frame under its parent browsing context.
    pub fn attach_frame(&self, frame: impl Into<ContextId>, parent: impl Into<ContextId>) {
        self.state.lock().frames.insert(frame.into(), parent.into());
    }

    /// Top-level browsing contexts currently known for `user_context`.
    pub fn pages_of(&self, user_context: &ContextId) -> Vec<ContextId> {
        let mut pages: Vec<_> = self
            .state
            .lock()
            .pages
            .iter()
            .filter(|(_, uc)| *uc == user_context)
            .map(|(page, _)| page.clone())
            .collect();
        pages.sort();
        pages
    }

    /// `context` followed by its known ancestors.
    pub fn lineage(&self, context: &ContextId) -> Vec<ContextId> {
        self.state.lock().lineage(context)
    }

    pub fn on_page_event(&self, user_context: ContextId, hook: PageHook) -> HookHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.lock().page_hooks.push(PageHookEntry {
            id,
            user_context,
            hook,
        });
        HookHandle(id)
    }

    pub fn off_page_event(&self, handle: HookHandle) {
        self.state.lock().page_hooks.retain(|entry| entry.id != handle.0);
    }

    /// Dispatches one inbound text message.
    pub fn dispatch(&self, message: &str) {
        match serde_json::from_str::<JsonValue>(message) {
            Ok(value) => self.dispatch_value(value),
            Err(e) => self.report(DispatchError::Malformed(e.to_string())),
        }
    }

    /// Dispatches one inbound message already parsed as JSON.
    pub fn dispatch_value(&self, message: JsonValue) {
        let envelope = match Envelope::deserialize(message) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.report(DispatchError::Malformed(e.to_string()));
                return;
            }
        };

        match envelope.message_type.as_deref() {
            Some("event") | None => {}
            Some(other) => {
                // command responses are correlated by the transport
                tracing::debug!("Ignoring non-event message of type '{}'", other);
                return;
            }
        }

        let Some(method) = envelope.method else {
            self.report(DispatchError::Malformed(
                "event message without 'method'".to_string(),
            ));
            return;
        };
        let params = envelope.params;

        let Some(entry) = events::lookup(&method) else {
            let context = extract_context_id(&params, self.options.context_search_depth);
            self.record(context.as_ref(), &method, None, &params);
            self.report(DispatchError::NoCatalogEntry { method });
            return;
        };

        let payload = match (entry.decode)(&params) {
            Ok(payload) => payload,
            Err(source) => {
                let context = extract_context_id(&params, self.options.context_search_depth);
                self.record(context.as_ref(), &method, Some(entry.kind), &params);
                self.report(DispatchError::Decode { method, source });
                return;
            }
        };

        self.deliver(method, entry.kind, params, payload);
    }

    fn deliver(&self, method: String, kind: EventKind, params: JsonValue, payload: Event) {
        let (context, listeners, after) = {
            let mut state = self.state.lock();
            let mut after = AfterDelivery::default();

            let context = match &payload {
                Event::RealmDestroyed(p) => {
                    after.destroyed_realm = Some(p.realm.clone());
                    state.realms.get(&p.realm).cloned()
                }
                other => other.context().map(ContextId::from),
            }
            .or_else(|| extract_context_id(&params, self.options.context_search_depth));

            self.learn_topology(&mut state, &payload, &params, &mut after);

            let lineage = context
                .as_ref()
                .map(|c| state.lineage(c))
                .unwrap_or_default();

            let listeners: Vec<Listener> = state
                .registrations
                .iter()
                .filter(|r| {
                    r.kind == kind
                        && r
                            .target
                            .as_ref()
                            .is_none_or(|target| lineage.contains(target.id()))
                })
                .map(|r| r.listener.clone())
                .collect();

            (context, listeners, after)
        };

        self.record(context.as_ref(), &method, Some(kind), &params);

        if !listeners.is_empty() {
            let mut raw = None;
            let mut typed = None;
            for listener in &listeners {
                match listener {
                    Listener::Raw(callback) => {
                        let event = raw.get_or_insert_with(|| RawEvent {
                            method: method.clone(),
                            kind: Some(kind),
                            context: context.clone(),
                            params: params.clone(),
                        });
                        callback(event);
                    }
                    Listener::Typed(callback) => {
                        let record = typed.get_or_insert_with(|| EventRecord {
                            method: method.clone(),
                            context: context.clone(),
                            payload: payload.clone(),
                        });
                        callback(record);
                    }
                }
            }
        }

        if !after.destroyed.is_empty() || after.destroyed_realm.is_some() {
            let mut state = self.state.lock();
            if !after.destroyed.is_empty() {
                state.forget_subtree(after.destroyed);
            }
            if let Some(realm) = &after.destroyed_realm {
                state.realms.remove(realm);
            }
        }

        for (hook, event) in after.hooks {
            hook(&event);
        }
    }

    fn learn_topology(
        &self,
        state: &mut RouterState,
        payload: &Event,
        params: &JsonValue,
        after: &mut AfterDelivery,
    ) {
        match payload {
            Event::ContextCreated(info) => {
                let context = ContextId::from(info.context.as_str());
                match &info.parent {
                    Some(parent) => {
                        state.frames.insert(context, ContextId::from(parent.as_str()));
                    }
                    None => {
                        let user_context = info
                            .user_context
                            .as_deref()
                            .map(ContextId::from)
                            .or_else(|| extract_user_context_id(params));
                        if let Some(user_context) = user_context {
                            if state.pages.get(&context) != Some(&user_context) {
                                state.pages.insert(context.clone(), user_context.clone());
                                for hook in state.hooks_for(&user_context) {
                                    after.hooks.push((hook, PageEvent::Created(context.clone())));
                                }
                            }
                        }
                    }
                }
            }
            Event::ContextDestroyed(info) => {
                let context = ContextId::from(info.context.as_str());
                if let Some(user_context) = state.pages.get(&context).cloned() {
                    for hook in state.hooks_for(&user_context) {
                        after.hooks.push((hook, PageEvent::Closed(context.clone())));
                    }
                }
                subtree_ids(info, &mut after.destroyed);
            }
            Event::RealmCreated(info) => {
                if let Some(context) = &info.context {
                    state
                        .realms
                        .insert(info.realm.clone(), ContextId::from(context.as_str()));
                }
            }
            _ => {}
        }
    }

    fn record(&self, context: Option<&ContextId>, method: &str, kind: Option<EventKind>, params: &JsonValue) {
        match context {
            Some(context) => self.recordings.record(context, method, kind, params),
            None if self.options.record_without_context => {
                self.recordings
                    .record(&ContextId::from(UNATTRIBUTED), method, kind, params)
            }
            None => tracing::trace!("Not recording '{}': no context", method),
        }
    }

    fn report(&self, error: DispatchError) {
        let sink = Arc::clone(&self.error_sink.read());
        sink(&error);
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Router")
            .field("registrations", &state.registrations.len())
            .field("pages", &state.pages.len())
            .field("frames", &state.frames.len())
            .field("realms", &state.realms.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(method: &str, params: JsonValue) -> String {
        json!({"type": "event", "method": method, "params": params}).to_string()
    }

    fn load(context: &str) -> String {
        event(
            "browsingContext.load",
            json!({"context": context, "navigation": "n", "timestamp": 1, "url": "https://example.com"}),
        )
    }

    fn created(context: &str, parent: Option<&str>, user_context: &str) -> String {
        event(
            "browsingContext.contextCreated",
            json!({
                "context": context,
                "url": "about:blank",
                "children": null,
                "parent": parent,
                "userContext": user_context
            }),
        )
    }

    fn collecting_sink(router: &Router) -> Arc<Mutex<Vec<DispatchError>>> {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        router.set_error_sink(move |e| sink.lock().push(e.clone()));
        errors
    }

    #[test]
    fn test_dispatch_matches_kind_and_page() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        router.register_typed(Target::Page("A1".into()), EventKind::Load, move |record| {
            s.lock().push(record.context.clone());
        });
        let s = Arc::clone(&seen);
        router.register_typed(
            Target::Page("A1".into()),
            EventKind::DomContentLoaded,
            move |_| s.lock().push(None),
        );

        router.dispatch(&load("A1"));
        router.dispatch(&load("B2"));

        assert_eq!(*seen.lock(), vec![Some(ContextId::from("A1"))]);
    }

    #[test]
    fn test_dispatch_reaches_ancestors() {
        let router = Router::new();
        router.dispatch(&created("A1", None, "uc-1"));
        router.dispatch(&created("F1", Some("A1"), "uc-1"));

        let hits = Arc::new(Mutex::new(Vec::new()));
        for target in [
            Target::Page("A1".into()),
            Target::Context("uc-1".into()),
            Target::Context("uc-2".into()),
        ] {
            let h = Arc::clone(&hits);
            let label = target.to_string();
            router.register_raw(target, EventKind::Load, move |_| h.lock().push(label.clone()));
        }

        router.dispatch(&load("F1"));
        assert_eq!(*hits.lock(), vec!["page A1", "context uc-1"]);
        assert_eq!(
            router.lineage(&"F1".into()),
            vec![ContextId::from("F1"), "A1".into(), "uc-1".into()]
        );
    }

    #[test]
    fn test_delivery_in_registration_order() {
        let router = Router::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let o = Arc::clone(&order);
            let listener = if i % 2 == 0 {
                Listener::raw(move |_| o.lock().push(i))
            } else {
                Listener::typed(move |_| o.lock().push(i))
            };
            router.register(Target::Page("A1".into()), EventKind::Load, listener);
        }
        router.dispatch(&load("A1"));
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_malformed_event_does_not_stop_stream() {
        let router = Router::new();
        let errors = collecting_sink(&router);
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        router.register_typed(Target::Page("A1".into()), EventKind::Load, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        router.dispatch(&load("A1"));
        // timestamp is mandatory
        router.dispatch(&event(
            "browsingContext.load",
            json!({"context": "A1", "url": "https://example.com"}),
        ));
        router.dispatch(&load("A1"));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            DispatchError::Decode { method, .. } if method == "browsingContext.load"
        ));
    }

    #[test]
    fn test_unknown_method_reported_and_recorded() {
        let router = Router::new();
        let errors = collecting_sink(&router);

        router.dispatch(&event("vendor.somethingNew", json!({"context": "A1"})));

        assert_eq!(
            *errors.lock(),
            vec![DispatchError::NoCatalogEntry {
                method: "vendor.somethingNew".to_string()
            }]
        );
        let sink = router.recordings().get(&"A1".into()).unwrap();
        assert_eq!(sink.snapshot()[0].kind, None);
    }

    #[test]
    fn test_garbage_and_responses() {
        let router = Router::new();
        let errors = collecting_sink(&router);

        router.dispatch("{not json");
        router.dispatch(r#"{"type": "event", "params": {}}"#);
        router.dispatch(r#"{"type": "success", "id": 3, "result": {}}"#);

        let errors = errors.lock();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, DispatchError::Malformed(_))));
    }

    #[test]
    fn test_recording_is_independent_of_listeners() {
        let router = Router::new();
        router.dispatch(&load("A1"));
        router.dispatch(&load("A1"));
        router.dispatch(&load("B2"));

        assert_eq!(router.recordings().contexts(), vec![ContextId::from("A1"), "B2".into()]);
        assert_eq!(router.recordings().get(&"A1".into()).unwrap().len(), 2);
    }

    #[test]
    fn test_record_without_context_option() {
        let router = Router::with_options(RouterOptions::new().record_without_context(true));
        router.dispatch(&event("script.realmDestroyed", json!({"realm": "unknown"})));
        let sink = router.recordings().get(&UNATTRIBUTED.into()).unwrap();
        assert_eq!(sink.len(), 1);

        let router = Router::new();
        router.dispatch(&event("script.realmDestroyed", json!({"realm": "unknown"})));
        assert!(router.recordings().contexts().is_empty());
    }

    #[test]
    fn test_unregister() {
        let router = Router::new();
        let handle = router.register_raw(Target::Page("A1".into()), EventKind::Load, |_| {});
        assert!(router.is_registered(handle));
        assert_eq!(router.unregister(handle), Ok(()));
        assert_eq!(
            router.unregister(handle),
            Err(SubscriptionError::UnknownHandle(handle.id()))
        );
        assert_eq!(router.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_reenter_router() {
        let router = Arc::new(Router::new());
        let weak = Arc::downgrade(&router);
        let registered = Arc::new(Mutex::new(Vec::new()));
        let r = Arc::clone(&registered);
        router.register_raw(Target::Page("A1".into()), EventKind::Load, move |_| {
            if let Some(router) = weak.upgrade() {
                let handle =
                    router.register_raw(Target::Page("A1".into()), EventKind::Load, |_| {});
                r.lock().push(handle);
            }
        });

        router.dispatch(&load("A1"));
        // the listener added during dispatch was not part of the snapshot
        assert_eq!(registered.lock().len(), 1);
        assert_eq!(router.listener_count(), 2);
    }

    #[test]
    fn test_page_hooks_fire_on_create_and_destroy() {
        let router = Router::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = Arc::clone(&events);
        let hook = router.on_page_event(
            "uc-1".into(),
            Arc::new(move |ev: &PageEvent| e.lock().push(ev.clone())),
        );

        router.dispatch(&created("A1", None, "uc-1"));
        router.dispatch(&created("F1", Some("A1"), "uc-1"));
        router.dispatch(&created("B1", None, "uc-2"));
        assert_eq!(router.pages_of(&"uc-1".into()), vec![ContextId::from("A1")]);

        router.dispatch(&event(
            "browsingContext.contextDestroyed",
            json!({"context": "A1", "url": "about:blank", "userContext": "uc-1"}),
        ));
        assert!(router.pages_of(&"uc-1".into()).is_empty());
        assert_eq!(
            *events.lock(),
            vec![PageEvent::Created("A1".into()), PageEvent::Closed("A1".into())]
        );

        router.off_page_event(hook);
        router.attach_page("A9", "uc-1");
        assert_eq!(events.lock().len(), 2);
    }

    #[test]
    fn test_realm_destroyed_routes_to_owner() {
        let router = Router::new();
        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        router.register_typed(
            Target::Page("A1".into()),
            EventKind::RealmDestroyed,
            move |record| {
                assert_eq!(record.context, Some(ContextId::from("A1")));
                h.fetch_add(1, Ordering::SeqCst);
            },
        );

        router.dispatch(&event(
            "script.realmCreated",
            json!({"realm": "r-1", "origin": "https://example.com", "type": "window", "context": "A1"}),
        ));
        router.dispatch(&event("script.realmDestroyed", json!({"realm": "r-1"})));
        // forgotten after the first destroy
        router.dispatch(&event("script.realmDestroyed", json!({"realm": "r-1"})));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    fn realm_created(realm: &str, context: &str) -> String {
        event(
            "script.realmCreated",
            json!({"realm": realm, "origin": "https://example.com", "type": "window", "context": context}),
        )
    }

    fn nested_page(router: &Router) {
        router.dispatch(&created("A1", None, "uc-1"));
        router.dispatch(&created("F1", Some("A1"), "uc-1"));
        router.dispatch(&created("F2", Some("F1"), "uc-1"));
        router.dispatch(&realm_created("r-a1", "A1"));
        router.dispatch(&realm_created("r-f2", "F2"));
    }

    fn assert_forgotten(router: &Router) {
        let state = router.state.lock();
        assert!(state.pages.is_empty());
        assert!(state.frames.is_empty());
        assert!(state.realms.is_empty());
    }

    #[test]
    fn test_destroying_page_forgets_nested_frames_and_realms() {
        let router = Router::new();
        nested_page(&router);
        assert_eq!(
            router.lineage(&"F2".into()),
            vec![ContextId::from("F2"), "F1".into(), "A1".into(), "uc-1".into()]
        );

        let hits = Arc::new(AtomicU64::new(0));
        let h = Arc::clone(&hits);
        router.register_raw(Target::Page("F1".into()), EventKind::RealmDestroyed, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        router.dispatch(&event(
            "browsingContext.contextDestroyed",
            json!({
                "context": "A1",
                "url": "about:blank",
                "parent": null,
                "userContext": "uc-1",
                "children": [{
                    "context": "F1",
                    "url": "about:blank",
                    "parent": "A1",
                    "children": [{"context": "F2", "url": "about:blank", "parent": "F1", "children": []}]
                }]
            }),
        ));

        assert_eq!(router.lineage(&"F2".into()), vec![ContextId::from("F2")]);
        assert_forgotten(&router);

        router.dispatch(&event("script.realmDestroyed", json!({"realm": "r-f2"})));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_destroying_page_walks_frames_without_children_list() {
        let router = Router::new();
        nested_page(&router);

        router.dispatch(&event(
            "browsingContext.contextDestroyed",
            json!({"context": "A1", "url": "about:blank", "children": null, "userContext": "uc-1"}),
        ));

        assert_forgotten(&router);
    }

    #[test]
    fn test_global_listener_sees_unattributed_events() {
        let router = Router::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        router.register_raw(Target::Page("A1".into()), EventKind::BeforeRequestSent, move |_| {
            s.lock().push("page A1");
        });
        let s = Arc::clone(&seen);
        router.register_global(
            EventKind::BeforeRequestSent,
            Listener::typed(move |record| {
                assert!(matches!(record.payload, Event::BeforeRequestSent(_)));
                s.lock().push(if record.context.is_some() { "global" } else { "global, no context" });
            }),
        );
        let s = Arc::clone(&seen);
        router.register_global(EventKind::Load, Listener::raw(move |_| s.lock().push("load")));

        let request = |context: JsonValue| {
            event(
                "network.beforeRequestSent",
                json!({
                    "context": context,
                    "isBlocked": false,
                    "navigation": null,
                    "redirectCount": 0,
                    "request": {
                        "request": "req-1",
                        "url": "https://example.com/worker.js",
                        "method": "GET",
                        "headers": [],
                        "cookies": [],
                        "headersSize": 0,
                        "bodySize": 0,
                        "destination": "",
                        "initiatorType": null,
                        "timings": {
                            "timeOrigin": 0, "requestTime": 0, "redirectStart": 0,
                            "redirectEnd": 0, "fetchStart": 0, "dnsStart": 0, "dnsEnd": 0,
                            "connectStart": 0, "connectEnd": 0, "tlsStart": 0,
                            "requestStart": 0, "responseStart": 0, "responseEnd": 0
                        }
                    },
                    "timestamp": 1,
                    "initiator": {"type": "other"}
                }),
            )
        };

        router.dispatch(&request(JsonValue::Null));
        router.dispatch(&request(json!("A1")));

        assert_eq!(*seen.lock(), vec!["global, no context", "page A1", "global"]);
    }
}
