//! Search triggering: debounced input and latest-request-wins sequencing.
//!
//! Typing schedules a search after the input has been quiet for the debounce
//! interval; each keystroke cancels the previously scheduled one. A search
//! that already started cannot be cancelled, so every search carries a ticket
//! and its results are dropped if a newer ticket was issued meanwhile.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Position of a search in issue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic ticket counter
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Cancel-and-reschedule debouncer
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    pending: Mutex<Option<(u64, CancellationToken)>>,
    next_id: AtomicU64,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the input to settle. Returns `None` if a later call superseded this one.
    /// Dropping the returned future cancels it as well.
    pub async fn schedule<T>(&self, value: T) -> Option<T> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.pending.lock().replace((id, token.clone())) {
            previous.cancel();
        }
        let _guard = token.clone().drop_guard();

        let fired = tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(self.interval) => true,
        };

        let mut pending = self.pending.lock();
        if matches!(&*pending, Some((current, _)) if *current == id) {
            *pending = None;
        }
        fired.then_some(value)
    }

    /// Cancel whatever is scheduled, e.g. when the input is cleared
    pub fn cancel(&self) {
        if let Some((_, token)) = self.pending.lock().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_tickets_are_monotonic() {
        let seq = RequestSequence::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(b > a);
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
    }

    #[tokio::test]
    async fn test_single_call_fires() {
        let debouncer = Debouncer::new(Duration::from_millis(10));
        assert_eq!(debouncer.schedule("query").await, Some("query"));
    }

    #[tokio::test]
    async fn test_later_call_supersedes_earlier() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(200)));

        let first = {
            let debouncer = Arc::clone(&debouncer);
            tokio::spawn(async move { debouncer.schedule("sp").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = debouncer.schedule("spring").await;

        assert_eq!(first.await.unwrap(), None);
        assert_eq!(second, Some("spring"));
    }

    #[tokio::test]
    async fn test_cancel_drops_pending() {
        let debouncer = Arc::new(Debouncer::new(Duration::from_millis(200)));
        let pending = {
            let debouncer = Arc::clone(&debouncer);
            tokio::spawn(async move { debouncer.schedule("sp").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        debouncer.cancel();
        assert_eq!(pending.await.unwrap(), None);
    }
}
