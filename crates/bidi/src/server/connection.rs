// Connection - inbound event pump
//
// The transport's reader pushes every inbound text frame that is not a
// command response onto an unbounded channel. `Connection::run` drains that
// channel and hands each frame to the router, one at a time, in arrival
// order. The pump ends when every sender is dropped.
//
// Command responses are correlated by the transport itself, so a listener
// that issues a (blocking) session call from inside dispatch does not wait
// on this pump.

use crate::error::{Error, Result};
use crate::server::router::Router;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::mpsc;

/// Feeds inbound frames from the transport into a [`Router`].
pub struct Connection {
    router: Arc<Router>,
    frames: TokioMutex<Option<mpsc::UnboundedReceiver<String>>>,
    dispatched: AtomicU64,
}

impl Connection {
    pub fn new(router: Arc<Router>, frames: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            router,
            frames: TokioMutex::new(Some(frames)),
            dispatched: AtomicU64::new(0),
        }
    }

    /// Creates a connection together with the sender the transport reader feeds.
    pub fn channel(router: Arc<Router>) -> (Self, mpsc::UnboundedSender<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(router, rx), tx)
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Frames handed to the router so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Dispatches frames until the channel closes.
    ///
    /// Bad frames are reported through the router's error sink and do not
    /// stop the pump. Fails only if the pump is already running or has run.
    pub async fn run(&self) -> Result<()> {
        let mut frames = self.frames.lock().await.take().ok_or_else(|| {
            Error::InvalidArgument("run() can only be called once".to_string())
        })?;

        tracing::debug!("Event pump started");
        while let Some(frame) = frames.recv().await {
            self.router.dispatch(&frame);
            self.dispatched.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            "Event pump stopped after {} frames: transport closed",
            self.dispatched()
        );
        Ok(())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("dispatched", &self.dispatched())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::events::EventKind;
    use crate::protocol::target::Target;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_run_dispatches_in_order_until_closed() {
        let router = Arc::new(Router::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        router.register_raw(Target::Page("A1".into()), EventKind::Load, move |event| {
            s.lock().push(event.params["url"].as_str().unwrap_or_default().to_string());
        });

        let (connection, tx) = Connection::channel(Arc::clone(&router));
        for url in ["https://a.test/", "https://b.test/"] {
            let frame = serde_json::json!({
                "type": "event",
                "method": "browsingContext.load",
                "params": {"context": "A1", "navigation": null, "timestamp": 0, "url": url}
            });
            tx.send(frame.to_string()).unwrap();
        }
        tx.send("garbage".to_string()).unwrap();
        drop(tx);

        connection.run().await.unwrap();
        assert_eq!(*seen.lock(), vec!["https://a.test/", "https://b.test/"]);
        assert_eq!(connection.dispatched(), 3);
    }

    #[tokio::test]
    async fn test_run_twice_fails() {
        let (connection, tx) = Connection::channel(Arc::new(Router::new()));
        drop(tx);
        connection.run().await.unwrap();
        assert!(connection.run().await.is_err());
    }
}
