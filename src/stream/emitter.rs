use crate::stream::StreamEvent;
use tokio::sync::mpsc;

/// Sending half of a crawl session's event stream
///
/// Once the receiving client goes away every further `emit` is a no-op and
/// [`EventEmitter::is_closed`] reports true, which is how the orchestrator
/// observes cancellation.
#[derive(Debug)]
pub struct EventEmitter {
    tx: mpsc::Sender<StreamEvent>,
    emitted: u64,
    closed: bool,
}

impl EventEmitter {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx,
            emitted: 0,
            closed: false,
        }
    }

    /// Creates an emitter with a bounded channel of `buffer` events
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Sends an event; returns false if the client has disconnected
    pub async fn emit(&mut self, event: StreamEvent) -> bool {
        if self.closed {
            return false;
        }

        tracing::trace!("emit {} {}", event.event, event.id);
        if self.tx.send(event).await.is_err() {
            tracing::debug!("event receiver dropped after {} events", self.emitted);
            self.closed = true;
            return false;
        }

        self.emitted += 1;
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.tx.is_closed()
    }

    /// Completes once the receiving client has gone away
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Number of events delivered to the channel
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
