// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Subscription Manager - per-target event wiring
//
// A manager owns the enabled/attached state of every event kind for one
// target (a page or a browser context):
//
//   Disabled --attach/update--> Attached(Raw) | Attached(Typed) --update/detach_all--> Disabled
//
// For each enabled kind the raw path is preferred; the typed path is used
// only when the target cannot take the kind raw. At most one path is live
// per kind, so every event is delivered once per target.
//
// A context-scoped manager also owns one child manager per page in the
// context. Children are created as pages appear (seeded with the parent's
// enabled flags), follow every `update()` of the parent and are torn down
// when their page closes or the parent is detached.
//
// Lock order: parent manager, then child manager, then the router. Router
// callbacks (listeners, page hooks) never run with the router lock held.
// Session round trips are queued while the locks are held and sent once
// they are released.

use crate::api::EventFlags;
use crate::error::SubscriptionError;
use crate::protocol::events::{EventKind, EventRecord, RawEvent};
use crate::protocol::target::{ContextId, ContextTarget, EventTarget, Target};
use crate::server::router::{HookHandle, Listener, ListenerHandle, PageEvent, PageHook, Router};
use crate::server::session::Session;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// One event handed to an [`EventSink`].
#[derive(Debug, Clone, Copy)]
pub enum Delivery<'a> {
    /// Params as received
    Raw(&'a RawEvent),
    /// Decoded payload
    Typed(&'a EventRecord),
}

impl Delivery<'_> {
    pub fn method(&self) -> &str {
        match self {
            Delivery::Raw(event) => &event.method,
            Delivery::Typed(record) => &record.method,
        }
    }

    pub fn context(&self) -> Option<&ContextId> {
        match self {
            Delivery::Raw(event) => event.context.as_ref(),
            Delivery::Typed(record) => record.context.as_ref(),
        }
    }

    pub fn path(&self) -> Path {
        match self {
            Delivery::Raw(_) => Path::Raw,
            Delivery::Typed(_) => Path::Typed,
        }
    }
}

/// Consumer of every event a manager attaches, told which target it came through.
pub type EventSink = Arc<dyn Fn(&Target, Delivery<'_>) + Send + Sync>;

/// Which delivery path a kind is attached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Raw,
    Typed,
}

/// State of one (target, kind) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Disabled,
    Attached(Path),
}

/// What a manager needs to wire kinds: the router, an optional session for
/// the remote subscribe calls, and the sink events end up in.
#[derive(Clone)]
pub struct Subscriber {
    router: Arc<Router>,
    session: Option<Arc<Session>>,
    sink: EventSink,
}

impl Subscriber {
    pub fn new<F>(router: Arc<Router>, sink: F) -> Self
    where
        F: Fn(&Target, Delivery<'_>) + Send + Sync + 'static,
    {
        Self {
            router,
            session: None,
            sink: Arc::new(sink),
        }
    }

    /// Mirrors every attach/detach with `session.subscribe` / `session.unsubscribe`.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("router", &self.router)
            .field("session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

enum Scope {
    Page(Arc<dyn EventTarget>),
    Context(Arc<dyn ContextTarget>),
}

impl Scope {
    fn target(&self) -> Target {
        match self {
            Scope::Page(t) => t.target(),
            Scope::Context(t) => t.target(),
        }
    }

    fn path_for(&self, kind: EventKind) -> Option<Path> {
        let (raw, typed) = match self {
            Scope::Page(t) => (t.supports_raw(kind), t.supports_typed(kind)),
            Scope::Context(t) => (t.supports_raw(kind), t.supports_typed(kind)),
        };
        if raw {
            Some(Path::Raw)
        } else if typed {
            Some(Path::Typed)
        } else {
            None
        }
    }
}

struct Slot {
    path: Path,
    handle: ListenerHandle,
    // Whether session.subscribe succeeded, and the id it returned
    remote: bool,
    subscription: Option<String>,
}

#[derive(Default)]
struct ManagerState {
    enabled: EventFlags,
    slots: BTreeMap<EventKind, Slot>,
    children: BTreeMap<ContextId, SubscriptionManager>,
    page_hook: Option<HookHandle>,
    closed: bool,
}

enum RemoteOp {
    Subscribe(ListenerHandle),
    Unsubscribe(Option<String>),
}

/// A session call decided under a manager lock and sent after it is released.
struct RemoteCall {
    owner: Arc<ManagerInner>,
    kind: EventKind,
    op: RemoteOp,
}

type Pending = Vec<RemoteCall>;

fn send_pending(pending: Pending) {
    for call in pending {
        call.owner.send(call.kind, call.op);
    }
}

struct ManagerInner {
    subscriber: Subscriber,
    scope: Scope,
    target: Target,
    state: Mutex<ManagerState>,
}

impl ManagerInner {
    fn new(subscriber: Subscriber, scope: Scope) -> Self {
        let target = scope.target();
        Self {
            subscriber,
            scope,
            target,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Runs `f` and then sends the session calls it queued, with no manager
    /// lock held.
    fn run<F>(self: &Arc<Self>, f: F)
    where
        F: FnOnce(&Arc<Self>, &mut Pending),
    {
        let mut pending = Vec::new();
        f(self, &mut pending);
        send_pending(pending);
    }

    fn attach(self: &Arc<Self>, flags: &EventFlags, pending: &mut Pending) {
        let mut state = self.state.lock();
        state.closed = false;
        for kind in flags.enabled_kinds() {
            state.enabled.set(kind, true);
            self.attach_kind(&mut state, kind, pending);
        }
        self.open_context(&mut state, pending);

        let enabled = state.enabled.clone();
        for child in state.children.values() {
            child.inner.attach(&enabled, pending);
        }
    }

    fn update(self: &Arc<Self>, flags: &EventFlags, pending: &mut Pending) {
        let mut state = self.state.lock();
        if state.closed {
            tracing::debug!("Ignoring update on detached {}", self.target);
            return;
        }
        self.open_context(&mut state, pending);

        let delta = state.enabled.diff(flags);
        if delta.is_empty() {
            return;
        }
        tracing::debug!(
            "Updating {}: +{:?} -{:?}",
            self.target,
            delta.enabled,
            delta.disabled
        );

        for kind in delta.disabled {
            self.detach_kind(&mut state, kind, pending);
        }
        for kind in delta.enabled {
            self.attach_kind(&mut state, kind, pending);
        }
        state.enabled = flags.clone();

        for child in state.children.values() {
            child.inner.update(flags, pending);
        }
    }

    fn detach_all(self: &Arc<Self>, pending: &mut Pending) {
        let mut state = self.state.lock();

        let children = std::mem::take(&mut state.children);
        for child in children.values() {
            child.inner.detach_all(pending);
        }

        let kinds: Vec<EventKind> = state.slots.keys().copied().collect();
        for kind in kinds {
            self.detach_kind(&mut state, kind, pending);
        }

        if let Some(hook) = state.page_hook.take() {
            if let Scope::Context(context) = &self.scope {
                context.off_page(hook);
            }
        }

        if !state.closed {
            tracing::debug!("Detached all subscriptions on {}", self.target);
        }
        state.enabled = EventFlags::new();
        state.closed = true;
    }

    fn attach_kind(
        self: &Arc<Self>,
        state: &mut ManagerState,
        kind: EventKind,
        pending: &mut Pending,
    ) {
        if state.slots.contains_key(&kind) {
            return;
        }

        let Some(path) = self.scope.path_for(kind) else {
            let reason = SubscriptionError::UnsupportedCapability {
                kind,
                target: self.target.clone(),
            };
            tracing::debug!("{}, leaving it inert", reason);
            return;
        };

        let sink = Arc::clone(&self.subscriber.sink);
        let target = self.target.clone();
        let listener = match path {
            Path::Raw => Listener::raw(move |event: &RawEvent| sink(&target, Delivery::Raw(event))),
            Path::Typed => {
                Listener::typed(move |record: &EventRecord| sink(&target, Delivery::Typed(record)))
            }
        };
        let handle = self
            .subscriber
            .router
            .register(self.target.clone(), kind, listener);

        if self.subscriber.session.is_some() {
            pending.push(RemoteCall {
                owner: Arc::clone(self),
                kind,
                op: RemoteOp::Subscribe(handle),
            });
        }

        state.slots.insert(
            kind,
            Slot {
                path,
                handle,
                remote: false,
                subscription: None,
            },
        );
    }

    fn detach_kind(
        self: &Arc<Self>,
        state: &mut ManagerState,
        kind: EventKind,
        pending: &mut Pending,
    ) {
        let Some(slot) = state.slots.remove(&kind) else {
            return;
        };

        if let Err(e) = self.subscriber.router.unregister(slot.handle) {
            tracing::warn!("Failed to detach {} from {}: {}", kind, self.target, e);
        }

        if slot.remote {
            pending.push(RemoteCall {
                owner: Arc::clone(self),
                kind,
                op: RemoteOp::Unsubscribe(slot.subscription),
            });
        }
    }

    /// Sends one queued session call. Must not be called with `state` locked.
    fn send(&self, kind: EventKind, op: RemoteOp) {
        let Some(session) = &self.subscriber.session else {
            return;
        };

        match op {
            RemoteOp::Subscribe(handle) => {
                let id = match session.subscribe(&[kind], &self.target) {
                    Ok(id) => id,
                    // the local listener stays; events arrive once the runtime
                    // is subscribed by some other path
                    Err(e) => {
                        tracing::warn!("Failed to subscribe {} to {}: {}", self.target, kind, e);
                        return;
                    }
                };

                let adopted = {
                    let mut state = self.state.lock();
                    match state.slots.get_mut(&kind) {
                        Some(slot) if slot.handle == handle => {
                            slot.remote = true;
                            slot.subscription = id.clone();
                            true
                        }
                        _ => false,
                    }
                };
                if !adopted {
                    // detached while the subscribe was in flight
                    self.unsubscribe(session, kind, id.as_deref());
                }
            }
            RemoteOp::Unsubscribe(id) => self.unsubscribe(session, kind, id.as_deref()),
        }
    }

    fn unsubscribe(&self, session: &Session, kind: EventKind, id: Option<&str>) {
        if let Err(e) = session.unsubscribe(id, &[kind], &self.target) {
            tracing::warn!("Failed to unsubscribe {} from {}: {}", self.target, kind, e);
        }
    }

    /// Starts following page creation and adopts the pages already open.
    fn open_context(self: &Arc<Self>, state: &mut ManagerState, pending: &mut Pending) {
        let Scope::Context(context) = &self.scope else {
            return;
        };

        if state.page_hook.is_none() {
            let weak: Weak<ManagerInner> = Arc::downgrade(self);
            let hook: PageHook = Arc::new(move |event: &PageEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.run(|inner, pending| inner.on_page_event(event, pending));
                }
            });
            state.page_hook = Some(context.on_page(hook));
        }

        for page in context.pages() {
            if !state.children.contains_key(&page) {
                let child = self.spawn_child(context, &page, &state.enabled, pending);
                state.children.insert(page, child);
            }
        }
    }

    fn on_page_event(&self, event: &PageEvent, pending: &mut Pending) {
        let Scope::Context(context) = &self.scope else {
            return;
        };

        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        match event {
            PageEvent::Created(page) => {
                if !state.children.contains_key(page) {
                    let child = self.spawn_child(context, page, &state.enabled, pending);
                    state.children.insert(page.clone(), child);
                }
            }
            PageEvent::Closed(page) => {
                if let Some(child) = state.children.remove(page) {
                    child.inner.detach_all(pending);
                }
            }
        }
    }

    fn spawn_child(
        &self,
        context: &Arc<dyn ContextTarget>,
        page: &ContextId,
        enabled: &EventFlags,
        pending: &mut Pending,
    ) -> SubscriptionManager {
        tracing::debug!("Propagating {} subscriptions to page {}", self.target, page);
        let child = SubscriptionManager::new(self.subscriber.clone(), context.page(page));
        child.inner.attach(enabled, pending);
        child
    }

    fn live_handles(&self) -> usize {
        let state = self.state.lock();
        state.slots.len()
            + state
                .children
                .values()
                .map(|child| child.inner.live_handles())
                .sum::<usize>()
    }
}

/// Enabled event kinds and live listeners for one target.
///
/// Dropping the manager detaches everything it attached.
///
/// # Example
///
/// ```ignore
/// use bidi_rs::{BrowserContext, EventFlags, EventKind, Router, Subscriber, SubscriptionManager};
/// use std::sync::Arc;
///
/// let router = Arc::new(Router::new());
/// let subscriber = Subscriber::new(Arc::clone(&router), |target, delivery| {
///     println!("{target}: {}", delivery.method());
/// });
/// let context = Arc::new(BrowserContext::new("default", Arc::clone(&router), Default::default()));
///
/// let manager = SubscriptionManager::new_context(subscriber, context);
/// manager.attach(&EventFlags::new().enable(EventKind::BeforeRequestSent));
/// manager.update(&EventFlags::new().enable(EventKind::Load));
/// manager.detach_all();
/// ```
pub struct SubscriptionManager {
    inner: Arc<ManagerInner>,
}

impl SubscriptionManager {
    /// Creates a manager for a page-like target. Nothing is attached yet.
    pub fn new(subscriber: Subscriber, target: Arc<dyn EventTarget>) -> Self {
        Self {
            inner: Arc::new(ManagerInner::new(subscriber, Scope::Page(target))),
        }
    }

    /// Creates a manager for a browser context; its pages get child managers.
    pub fn new_context(subscriber: Subscriber, target: Arc<dyn ContextTarget>) -> Self {
        Self {
            inner: Arc::new(ManagerInner::new(subscriber, Scope::Context(target))),
        }
    }

    /// Enables every kind set in `flags`, on the raw path when the target
    /// supports it and on the typed path otherwise.
    ///
    /// Kinds already attached are left alone and kinds neither path supports
    /// stay inert. Other enabled kinds are kept. A context manager also
    /// starts adopting its pages. Re-opens a manager after `detach_all`.
    pub fn attach(&self, flags: &EventFlags) {
        self.inner.run(|inner, pending| inner.attach(flags, pending));
    }

    /// Moves to `flags`: attaches newly enabled kinds, detaches newly
    /// disabled ones and leaves the rest untouched. Fans out to child pages.
    ///
    /// A context manager starts adopting its pages here too, so `attach` is
    /// not required first. After `detach_all` the manager ignores `update`
    /// until `attach` re-opens it.
    pub fn update(&self, flags: &EventFlags) {
        self.inner.run(|inner, pending| inner.update(flags, pending));
    }

    /// Detaches every live listener here and in every child page, then
    /// stops following page creation. Safe to call repeatedly.
    pub fn detach_all(&self) {
        self.inner.run(|inner, pending| inner.detach_all(pending));
    }

    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    /// Currently enabled kinds, including ones that are inert on this target.
    pub fn enabled(&self) -> EventFlags {
        self.inner.state.lock().enabled.clone()
    }

    /// Kinds attached on the raw path
    pub fn live_raw(&self) -> Vec<EventKind> {
        self.live_on(Path::Raw)
    }

    /// Kinds attached on the typed path
    pub fn live_typed(&self) -> Vec<EventKind> {
        self.live_on(Path::Typed)
    }

    fn live_on(&self, path: Path) -> Vec<EventKind> {
        self.inner
            .state
            .lock()
            .slots
            .iter()
            .filter(|(_, slot)| slot.path == path)
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn state(&self, kind: EventKind) -> SubscriptionState {
        match self.inner.state.lock().slots.get(&kind) {
            Some(slot) => SubscriptionState::Attached(slot.path),
            None => SubscriptionState::Disabled,
        }
    }

    /// Pages with a child manager
    pub fn children(&self) -> Vec<ContextId> {
        self.inner.state.lock().children.keys().cloned().collect()
    }

    /// State of `kind` on one child page; `None` if the page has no child manager.
    pub fn child_state(&self, page: &ContextId, kind: EventKind) -> Option<SubscriptionState> {
        let state = self.inner.state.lock();
        state.children.get(page).map(|child| child.state(kind))
    }

    /// Live listener registrations here and in every child page.
    pub fn live_handle_count(&self) -> usize {
        self.inner.live_handles()
    }

    pub fn is_detached(&self) -> bool {
        self.inner.state.lock().closed
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.inner.run(|inner, pending| inner.detach_all(pending));
    }
}

impl fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SubscriptionManager")
            .field("target", &self.inner.target)
            .field("live", &state.slots.keys().collect::<Vec<_>>())
            .field("children", &state.children.keys().collect::<Vec<_>>())
            .field("closed", &state.closed)
            .finish()
    }
}
