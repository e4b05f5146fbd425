//! Last-value observable slots, one per fetched resource.

use tokio::sync::watch;

/// What a [`ResultStream`] currently holds.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamState<T> {
    /// Nothing published yet.
    Empty,
    Ready(T),
    /// The last fetch got no response at all.
    Failed,
}

impl<T> StreamState<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            StreamState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StreamState::Failed)
    }
}

/// Overwritten on every publish; observers only ever see the latest state.
#[derive(Debug)]
pub struct ResultStream<T> {
    tx: watch::Sender<StreamState<T>>,
}

impl<T> ResultStream<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StreamState::Empty);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState<T>> {
        self.tx.subscribe()
    }

    pub fn publish(&self, value: T) {
        self.tx.send_replace(StreamState::Ready(value));
    }

    pub fn fail(&self) {
        self.tx.send_replace(StreamState::Failed);
    }
}

impl<T: Clone> ResultStream<T> {
    pub fn get(&self) -> StreamState<T> {
        self.tx.borrow().clone()
    }
}

impl<T> Default for ResultStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let stream: ResultStream<Vec<u8>> = ResultStream::new();
        assert_eq!(stream.get(), StreamState::Empty);
        assert!(stream.get().value().is_none());
    }

    #[test]
    fn test_failed_is_distinct_from_empty_collection() {
        let stream: ResultStream<Vec<u8>> = ResultStream::new();
        stream.publish(Vec::new());
        assert_eq!(stream.get(), StreamState::Ready(Vec::new()));
        stream.fail();
        assert!(stream.get().is_failed());
    }

    #[tokio::test]
    async fn test_subscriber_sees_latest_value() {
        let stream = ResultStream::new();
        let mut rx = stream.subscribe();
        stream.publish(1);
        stream.publish(2);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), StreamState::Ready(2));
    }
}
