//! Subscription handles

use super::lock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Teardown = Box<dyn FnOnce() + Send>;

struct SubscriptionInner {
    closed: AtomicBool,
    teardown: Mutex<Option<Teardown>>,
}

/// Handle to an active listener registration
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`]
/// (or hand it to a [`SubscriptionBag`]) to release the listener.
/// Unsubscribing is idempotent.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` the first time it is closed
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                closed: AtomicBool::new(false),
                teardown: Mutex::new(Some(Box::new(teardown))),
            }),
        }
    }

    /// An already-closed subscription
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                closed: AtomicBool::new(true),
                teardown: Mutex::new(None),
            }),
        }
    }

    /// Combine several subscriptions into one handle that closes them all
    pub fn from_many(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || {
            for subscription in subscriptions {
                subscription.unsubscribe();
            }
        })
    }

    /// Release the listener
    pub fn unsubscribe(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let teardown = lock(&self.inner.teardown).take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A group of subscriptions released together
#[derive(Debug, Default)]
pub struct SubscriptionBag {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl SubscriptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a subscription; closed handles are dropped on the way in
    pub fn add(&self, subscription: Subscription) {
        let mut subscriptions = lock(&self.subscriptions);
        subscriptions.retain(|s| !s.is_closed());
        if !subscription.is_closed() {
            subscriptions.push(subscription);
        }
    }

    /// Unsubscribe everything tracked so far
    pub fn unsubscribe_all(&self) {
        let drained: Vec<Subscription> = lock(&self.subscriptions).drain(..).collect();
        for subscription in drained {
            subscription.unsubscribe();
        }
    }

    /// Number of still-open subscriptions
    pub fn len(&self) -> usize {
        lock(&self.subscriptions)
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_unsubscribe_runs_teardown_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        sub.unsubscribe();
        sub.clone().unsubscribe();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sub.is_closed());
    }

    #[test]
    fn test_empty_is_closed() {
        assert!(Subscription::empty().is_closed());
    }

    #[test]
    fn test_bag_releases_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bag = SubscriptionBag::new();
        for _ in 0..3 {
            let counter = calls.clone();
            bag.add(Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(bag.len(), 3);

        bag.unsubscribe_all();
        bag.unsubscribe_all();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_from_many_closes_children() {
        let a = Subscription::new(|| {});
        let b = Subscription::new(|| {});
        let both = Subscription::from_many(vec![a.clone(), b.clone()]);

        both.unsubscribe();

        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
