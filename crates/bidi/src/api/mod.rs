// Public API types module
//
// Configuration consumed by the router and the subscription managers. Every
// type is a plain serde struct with builder-style setters.

pub mod event_flags;
pub mod router_options;
pub mod wiring_config;

pub use event_flags::{EventFlags, FlagDelta};
pub use router_options::RouterOptions;
pub use wiring_config::WiringConfig;
