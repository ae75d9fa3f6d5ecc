//! Routing, recording and subscription layer
//!
//! This module turns inbound wire events into listener calls and keeps the
//! per-target subscription state. The transport itself is not part of the
//! crate; [`transport::Transport`] is the seam it plugs into.

pub mod connection;
pub mod recorder;
pub mod router;
pub mod session;
pub mod subscription;
pub mod transport;
