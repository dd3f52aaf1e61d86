//! Explicit shutdown signalling
//!
//! A [`CancellationToken`] is created by whoever owns the process lifetime
//! and handed to every component that runs a background loop. Cancelling
//! flips a flag and wakes every registered listener, so blocked threads
//! notice without polling.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Weak,
};

/// Something that must be woken when a token is cancelled
pub trait CancelListener: Send + Sync {
    /// Called once per cancellation, from the cancelling thread
    fn on_cancel(&self);
}

#[derive(Default)]
struct TokenState {
    cancelled: AtomicBool,
    listeners: Mutex<Vec<Weak<dyn CancelListener>>>,
}

/// Shared cancellation flag with wakeups
///
/// Clones observe the same flag.
#[derive(Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; idempotent
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let listeners: Vec<_> = {
            let mut listeners = self
                .state
                .listeners
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            listeners.retain(|listener| listener.strong_count() > 0);
            listeners.clone()
        };

        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.on_cancel();
        }
    }

    /// Check whether shutdown was requested
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Wake `listener` when this token is cancelled
    ///
    /// Only a weak reference is kept. A listener registered after
    /// cancellation is woken immediately.
    pub fn register(&self, listener: &Arc<dyn CancelListener>) {
        {
            let mut listeners = self
                .state
                .listeners
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            listeners.retain(|registered| registered.strong_count() > 0);
            listeners.push(Arc::downgrade(listener));
        }

        if self.is_cancelled() {
            listener.on_cancel();
        }
    }

    #[cfg(test)]
    fn registrations(&self) -> usize {
        self.state
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Number of listeners still alive
    pub fn listener_count(&self) -> usize {
        self.state
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl CancelListener for Counter {
        fn on_cancel(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_cancel_wakes_listeners_once() {
        let token = CancellationToken::new();
        let counter = Arc::new(Counter::default());
        let listener: Arc<dyn CancelListener> = counter.clone();
        token.register(&listener);

        let clone = token.clone();
        clone.cancel();
        clone.cancel();

        assert!(token.is_cancelled());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_registration_fires_immediately() {
        let token = CancellationToken::new();
        token.cancel();

        let counter = Arc::new(Counter::default());
        let listener: Arc<dyn CancelListener> = counter.clone();
        token.register(&listener);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dead_listeners_are_pruned() {
        let token = CancellationToken::new();
        {
            let listener: Arc<dyn CancelListener> = Arc::new(Counter::default());
            token.register(&listener);
            assert_eq!(token.listener_count(), 1);
        }
        assert_eq!(token.listener_count(), 0);
        token.cancel();
    }

    #[test]
    fn test_registration_churn_stays_bounded() {
        let token = CancellationToken::new();
        let kept: Arc<dyn CancelListener> = Arc::new(Counter::default());
        token.register(&kept);

        for _ in 0..1000 {
            let transient: Arc<dyn CancelListener> = Arc::new(Counter::default());
            token.register(&transient);
        }
        assert_eq!(token.registrations(), 2);
        assert_eq!(token.listener_count(), 2);
    }
}
