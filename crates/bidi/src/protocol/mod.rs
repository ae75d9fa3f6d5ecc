// Protocol types - the wire data model of WebDriver BiDi
//
// - value / value_codec: remote values (`script.RemoteValue` and the
//   argument shapes sent back to the runtime)
// - events: the event catalog and typed payloads
// - target: pages, browser contexts and what each can receive

pub mod events;
pub mod target;
pub mod value;
pub mod value_codec;

pub use events::{
    AppliesTo, CatalogEntry, Event, EventKind, EventRecord, RawEvent, extract_context_id,
    extract_user_context_id, lookup,
};
pub use target::{BrowserContext, ContextId, ContextTarget, EventTarget, Page, Target};
pub use value::{
    Handle, InternalId, IntoValue, ListValue, MappingValue, NodeProperties, NodeValue,
    NumberLiteral, PropertyKey, Reference, RegExpValue, RemoteObjectReference, ShadowRootMode,
    SharedId, SharedReference, Value, WindowValue,
};
