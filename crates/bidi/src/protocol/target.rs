// Event targets
//
// A target is anything events can be subscribed on: a page (top-level
// browsing context, including its frames) or a browser context (user
// context, covering every page opened in it).
//
// The traits here describe what a target can receive; the router decides
// which registrations an inbound event reaches.

use crate::api::WiringConfig;
use crate::protocol::events::EventKind;
use crate::server::router::{HookHandle, PageHook, Router};
use std::fmt;
use std::sync::Arc;

/// Id of a browsing context or user context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(Arc<str>);

impl ContextId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextId {
    fn from(value: &str) -> Self {
        ContextId(Arc::from(value))
    }
}

impl From<String> for ContextId {
    fn from(value: String) -> Self {
        ContextId(Arc::from(value))
    }
}

impl AsRef<str> for ContextId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where a registration listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A top-level browsing context and its descendants
    Page(ContextId),
    /// A user context and every page in it
    Context(ContextId),
}

impl Target {
    pub fn id(&self) -> &ContextId {
        match self {
            Target::Page(id) | Target::Context(id) => id,
        }
    }

    pub fn is_page(&self) -> bool {
        matches!(self, Target::Page(_))
    }

    /// Whether the catalog allows this target class to receive `kind` at all.
    pub fn accepts(&self, kind: EventKind) -> bool {
        let applies = kind.applies_to();
        match self {
            Target::Page(_) => applies.page,
            Target::Context(_) => applies.context,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Page(id) => write!(f, "page {id}"),
            Target::Context(id) => write!(f, "context {id}"),
        }
    }
}

/// A target whose event capabilities are known.
///
/// The raw path delivers the event's `params` as received; the typed path
/// delivers the decoded payload. A kind neither path supports is inert.
pub trait EventTarget: Send + Sync {
    fn target(&self) -> Target;

    fn supports_raw(&self, kind: EventKind) -> bool;

    fn supports_typed(&self, kind: EventKind) -> bool;
}

/// A target that owns pages and announces them as they come and go.
pub trait ContextTarget: EventTarget {
    /// Pages currently open in this context.
    fn pages(&self) -> Vec<ContextId>;

    /// Builds the target for one of this context's pages.
    fn page(&self, id: &ContextId) -> Arc<dyn EventTarget>;

    /// Registers a hook fired when a page is created in or closed from this context.
    fn on_page(&self, hook: PageHook) -> HookHandle;

    fn off_page(&self, handle: HookHandle);
}

/// A top-level browsing context.
#[derive(Debug, Clone)]
pub struct Page {
    id: ContextId,
    wiring: Arc<WiringConfig>,
}

impl Page {
    pub fn new(id: impl Into<ContextId>, wiring: Arc<WiringConfig>) -> Self {
        Self {
            id: id.into(),
            wiring,
        }
    }

    pub fn id(&self) -> &ContextId {
        &self.id
    }
}

impl EventTarget for Page {
    fn target(&self) -> Target {
        Target::Page(self.id.clone())
    }

    fn supports_raw(&self, kind: EventKind) -> bool {
        self.wiring.supports_raw(&self.target(), kind)
    }

    fn supports_typed(&self, kind: EventKind) -> bool {
        self.wiring.supports_typed(&self.target(), kind)
    }
}

/// A user context ("browser context"), backed by the router's view of the
/// context tree.
pub struct BrowserContext {
    id: ContextId,
    router: Arc<Router>,
    wiring: Arc<WiringConfig>,
}

impl BrowserContext {
    pub fn new(id: impl Into<ContextId>, router: Arc<Router>, wiring: Arc<WiringConfig>) -> Self {
        Self {
            id: id.into(),
            router,
            wiring,
        }
    }

    pub fn id(&self) -> &ContextId {
        &self.id
    }
}

impl fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserContext")
            .field("id", &self.id)
            .field("wiring", &self.wiring)
            .finish_non_exhaustive()
    }
}

impl EventTarget for BrowserContext {
    fn target(&self) -> Target {
        Target::Context(self.id.clone())
    }

    fn supports_raw(&self, kind: EventKind) -> bool {
        self.wiring.supports_raw(&self.target(), kind)
    }

    fn supports_typed(&self, kind: EventKind) -> bool {
        self.wiring.supports_typed(&self.target(), kind)
    }
}

impl ContextTarget for BrowserContext {
    fn pages(&self) -> Vec<ContextId> {
        self.router.pages_of(&self.id)
    }

    fn page(&self, id: &ContextId) -> Arc<dyn EventTarget> {
        Arc::new(Page::new(id.clone(), Arc::clone(&self.wiring)))
    }

    fn on_page(&self, hook: PageHook) -> HookHandle {
        self.router.on_page_event(self.id.clone(), hook)
    }

    fn off_page(&self, handle: HookHandle) {
        self.router.off_page_event(handle);
    }
}
