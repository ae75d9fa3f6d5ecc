//! bidi-rs: WebDriver BiDi client core
//!
//! This crate provides the event side of a WebDriver BiDi client: the remote
//! value model and its wire codec, the catalog of typed events, an event
//! router with per-context raw recording, and per-target subscription
//! management. The transport (WebSocket, pipe) is supplied by the caller.
//!
//! # Examples
//!
//! ## Routing inbound events
//!
//! ```ignore
//! use bidi_rs::{EventKind, Router, Target};
//!
//! let router = Router::new();
//! router.register_typed(Target::Page("A1".into()), EventKind::Load, |record| {
//!     println!("loaded: {:?}", record.payload);
//! });
//!
//! router.dispatch(
//!     r#"{"type":"event","method":"browsingContext.load",
//!         "params":{"context":"A1","navigation":"n1","timestamp":1,"url":"https://example.com"}}"#,
//! );
//! ```
//!
//! ## Turning event categories on and off
//!
//! ```ignore
//! use bidi_rs::{
//!     BrowserContext, EventFlags, EventKind, Router, Subscriber, SubscriptionManager, WiringConfig,
//! };
//! use std::sync::Arc;
//!
//! let router = Arc::new(Router::new());
//! let subscriber = Subscriber::new(Arc::clone(&router), |target, delivery| {
//!     println!("{target}: {}", delivery.method());
//! });
//! let context = Arc::new(BrowserContext::new(
//!     "default",
//!     Arc::clone(&router),
//!     Arc::new(WiringConfig::default()),
//! ));
//!
//! let manager = SubscriptionManager::new_context(subscriber, context);
//! manager.attach(&EventFlags::new().enable(EventKind::BeforeRequestSent));
//!
//! // pages opened in "default" from now on get the same subscriptions
//! manager.update(&EventFlags::new().enable(EventKind::Load));
//! ```
//!
//! ## Remote values
//!
//! ```ignore
//! use bidi_rs::protocol::value_codec;
//! use serde_json::json;
//!
//! let value = value_codec::decode(&json!({"type": "number", "value": "-0"}))?;
//! assert_eq!(value_codec::encode(&value), json!({"type": "number", "value": "-0"}));
//! ```
//!
//! ## Driving the router from a transport
//!
//! ```ignore
//! use bidi_rs::{Connection, Router};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (connection, frames) = Connection::channel(Arc::new(Router::new()));
//!     // hand `frames` to the socket reader task
//!     # drop(frames);
//!     connection.run().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
mod error;
pub mod protocol;
pub mod server;

// Re-export error types
pub use error::{DecodeError, DispatchError, Error, Result, SubscriptionError, TransportError};

// Re-export configuration
pub use api::{EventFlags, FlagDelta, RouterOptions, WiringConfig};

// Re-export the value model
pub use protocol::{IntoValue, NumberLiteral, Value};

// Re-export events and targets
pub use protocol::{
    BrowserContext, ContextId, ContextTarget, Event, EventKind, EventRecord, EventTarget, Page,
    RawEvent, Target,
};

// Re-export routing and subscriptions
pub use server::connection::Connection;
pub use server::recorder::{RecordedEvent, RecordingRegistry, RecordingSink};
pub use server::router::{Listener, ListenerHandle, PageEvent, Router};
pub use server::session::Session;
pub use server::subscription::{
    Delivery, Path, Subscriber, SubscriptionManager, SubscriptionState,
};
pub use server::transport::Transport;
