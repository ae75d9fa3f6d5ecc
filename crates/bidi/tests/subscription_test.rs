//! Integration tests for SubscriptionManager
//!
//! A browser context manager is driven through a scripted event stream
//! (pages opening, navigating, closing) while a fake transport records the
//! session commands it is asked to send.

use bidi_rs::server::subscription::Path;
use bidi_rs::{
    BrowserContext, ContextId, Delivery, EventFlags, EventKind, Page, Router, Session, Subscriber,
    SubscriptionManager, SubscriptionState, Target, TransportError, WiringConfig,
};
use parking_lot::Mutex;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

mod common;

type Deliveries = Arc<Mutex<Vec<(Target, String)>>>;
type Commands = Arc<Mutex<Vec<(String, JsonValue)>>>;

struct Harness {
    router: Arc<Router>,
    deliveries: Deliveries,
    commands: Commands,
    subscriber: Subscriber,
}

impl Harness {
    fn new() -> Self {
        let router = Arc::new(Router::new());
        let deliveries: Deliveries = Arc::new(Mutex::new(Vec::new()));
        let commands: Commands = Arc::new(Mutex::new(Vec::new()));

        let c = Arc::clone(&commands);
        let counter = Arc::new(Mutex::new(0u32));
        let transport = move |method: &str, params: JsonValue| {
            c.lock().push((method.to_string(), params));
            let mut n = counter.lock();
            *n += 1;
            Ok::<_, TransportError>(json!({"subscription": format!("sub-{}", *n)}))
        };

        let d = Arc::clone(&deliveries);
        let subscriber = Subscriber::new(Arc::clone(&router), move |target: &Target, delivery: Delivery<'_>| {
            d.lock().push((target.clone(), delivery.method().to_string()));
        })
        .with_session(Arc::new(Session::new(Arc::new(transport))));

        Self {
            router,
            deliveries,
            commands,
            subscriber,
        }
    }

    fn context(&self, id: &str) -> SubscriptionManager {
        let target = Arc::new(BrowserContext::new(
            id,
            Arc::clone(&self.router),
            Arc::new(WiringConfig::default()),
        ));
        SubscriptionManager::new_context(self.subscriber.clone(), target)
    }

    fn commands(&self, method: &str) -> usize {
        self.commands.lock().iter().filter(|(m, _)| m == method).count()
    }
}

#[test]
fn test_context_subscription_follows_pages() {
    common::init_tracing();

    let h = Harness::new();
    let manager = h.context("uc-1");
    manager.attach(
        &EventFlags::new()
            .enable(EventKind::Load)
            .enable(EventKind::BeforeRequestSent),
    );

    h.router.dispatch(&common::context_created("A1", None, "uc-1"));
    h.router.dispatch(&common::load("A1", "https://a.test/"));
    h.router.dispatch(&common::before_request_sent("A1", "r-1", "https://a.test/app.js"));

    let deliveries = h.deliveries.lock().clone();
    assert_eq!(
        deliveries,
        vec![
            (Target::Page("A1".into()), "browsingContext.load".to_string()),
            (
                Target::Context("uc-1".into()),
                "network.beforeRequestSent".to_string()
            ),
            (
                Target::Page("A1".into()),
                "network.beforeRequestSent".to_string()
            ),
        ]
    );

    // the context subscribed once, the page twice
    assert_eq!(h.commands("session.subscribe"), 3);
    assert_eq!(
        h.commands.lock()[0].1,
        json!({"events": ["network.beforeRequestSent"], "userContexts": ["uc-1"]})
    );
}

#[test]
fn test_update_fans_out_without_flicker() {
    common::init_tracing();

    let h = Harness::new();
    let manager = h.context("uc-1");
    let flags = EventFlags::new().enable(EventKind::ResponseCompleted);
    manager.attach(&flags);
    h.router.dispatch(&common::context_created("A1", None, "uc-1"));
    h.router.dispatch(&common::context_created("A2", None, "uc-1"));
    let subscribes = h.commands("session.subscribe");

    manager.update(&flags);
    assert_eq!(h.commands("session.subscribe"), subscribes);
    assert_eq!(h.commands("session.unsubscribe"), 0);

    manager.update(&flags.clone().enable(EventKind::EntryAdded));
    for page in ["A1", "A2"] {
        let page = ContextId::from(page);
        assert_eq!(
            manager.child_state(&page, EventKind::EntryAdded),
            Some(SubscriptionState::Attached(Path::Raw))
        );
        assert_eq!(
            manager.child_state(&page, EventKind::ResponseCompleted),
            Some(SubscriptionState::Attached(Path::Raw))
        );
    }
    // EntryAdded is not wired on the context itself
    assert_eq!(manager.state(EventKind::EntryAdded), SubscriptionState::Disabled);
    assert_eq!(h.commands("session.subscribe"), subscribes + 2);
}

#[test]
fn test_teardown_leaves_nothing_behind() {
    common::init_tracing();

    let h = Harness::new();
    let manager = h.context("uc-1");
    manager.attach(
        &EventFlags::new()
            .enable(EventKind::BeforeRequestSent)
            .enable(EventKind::FetchError)
            .enable(EventKind::FragmentNavigated)
            .enable(EventKind::Load),
    );
    for page in ["A1", "A2", "A3"] {
        h.router.dispatch(&common::context_created(page, None, "uc-1"));
    }
    h.router.dispatch(&common::context_destroyed("A2", "uc-1"));
    assert_eq!(manager.children().len(), 2);
    // context: 2 raw + 1 typed; each page: 3 raw + 1 typed
    assert_eq!(manager.live_handle_count(), 3 + 2 * 4);

    manager.detach_all();
    assert_eq!(manager.live_handle_count(), 0);
    assert_eq!(h.router.listener_count(), 0);
    assert_eq!(
        h.commands("session.unsubscribe"),
        h.commands("session.subscribe")
    );

    // idempotent
    manager.detach_all();
    h.router.dispatch(&common::load("A1", "https://a.test/"));
    h.router.dispatch(&common::context_created("A4", None, "uc-1"));
    assert!(manager.children().is_empty());
    assert!(h.deliveries.lock().is_empty());
}

#[test]
fn test_page_manager_typed_fallback() {
    common::init_tracing();

    let h = Harness::new();
    let page = Arc::new(Page::new("A1", Arc::new(WiringConfig::default())));
    let manager = SubscriptionManager::new(h.subscriber.clone(), page);
    manager.attach(&EventFlags::new().enable(EventKind::FragmentNavigated));
    assert_eq!(manager.live_typed(), vec![EventKind::FragmentNavigated]);
    assert!(manager.live_raw().is_empty());

    h.router.dispatch(&common::event(
        "browsingContext.fragmentNavigated",
        json!({"context": "A1", "navigation": null, "timestamp": 5, "url": "https://a.test/#top"}),
    ));
    assert_eq!(h.deliveries.lock().len(), 1);

    drop(manager);
    assert_eq!(h.router.listener_count(), 0);
}
