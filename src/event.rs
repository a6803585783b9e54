use tokio::sync::mpsc;

/// Session-level events emitted by the request pipeline.
///
/// The pipeline never navigates by itself; it only reports what happened.
/// A single top-level consumer (the app layer) owns the redirect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
  /// The remote service rejected the credential (HTTP 401). The in-memory
  /// session and durable storage have already been cleared by the pipeline.
  Expired,
}

/// Receiving side of the session event channel.
pub struct SessionEvents {
  rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SessionEvents {
  /// Create a new event channel, returning the sender handed to the
  /// request pipeline and the receiver kept by the app layer.
  pub fn channel() -> (mpsc::UnboundedSender<SessionEvent>, Self) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Self { rx })
  }

  /// Receive the next event without blocking.
  pub fn try_next(&mut self) -> Option<SessionEvent> {
    self.rx.try_recv().ok()
  }

  /// Receive the next event, waiting until one arrives.
  pub async fn next(&mut self) -> Option<SessionEvent> {
    self.rx.recv().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_try_next_empty_then_delivered() {
    let (tx, mut events) = SessionEvents::channel();
    assert_eq!(events.try_next(), None);

    tx.send(SessionEvent::Expired).unwrap();
    assert_eq!(events.try_next(), Some(SessionEvent::Expired));
    assert_eq!(events.try_next(), None);
  }
}
