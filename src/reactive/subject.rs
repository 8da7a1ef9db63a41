//! Multicast subjects
//!
//! A [`Subject`] fans every value out to all current listeners. A
//! [`BehaviorSubject`] additionally remembers the latest value and replays it
//! to each new listener.

use super::{Listener, Observable, Subscription, lock};
use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

struct Slot<T> {
    listener: Listener<T>,
    active: Arc<AtomicBool>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            listener: self.listener.clone(),
            active: self.active.clone(),
        }
    }
}

struct SubjectState<T> {
    listeners: IndexMap<u64, Slot<T>>,
    next_id: u64,
    closed: bool,
}

/// Hot multicast stream without a current value
pub struct Subject<T> {
    state: Arc<Mutex<SubjectState<T>>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Subject")
            .field("listeners", &state.listeners.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SubjectState {
                listeners: IndexMap::new(),
                next_id: 0,
                closed: false,
            })),
        }
    }

    /// Deliver `value` to every listener, in subscription order
    ///
    /// The listener list is snapshotted before delivery so listeners may
    /// subscribe, unsubscribe or emit again without deadlocking. A listener
    /// removed during delivery is skipped.
    pub fn next(&self, value: T) {
        let slots: Vec<Slot<T>> = {
            let state = lock(&self.state);
            if state.closed {
                return;
            }
            state.listeners.values().cloned().collect()
        };

        for slot in slots {
            if slot.active.load(Ordering::SeqCst) {
                (slot.listener)(&value);
            }
        }
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    pub(crate) fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut state = lock(&self.state);
            if state.closed {
                return Subscription::empty();
            }
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.insert(
                id,
                Slot {
                    listener,
                    active: active.clone(),
                },
            );
            id
        };

        let weak: Weak<Mutex<SubjectState<T>>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            active.store(false, Ordering::SeqCst);
            if let Some(state) = weak.upgrade() {
                lock(&state).listeners.shift_remove(&id);
            }
        })
    }

    /// Stop the stream: drop all listeners and ignore further values
    pub fn complete(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        for slot in state.listeners.values() {
            slot.active.store(false, Ordering::SeqCst);
        }
        state.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Number of registered listeners
    pub fn observer_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn as_observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable::new(move |listener| subject.subscribe_listener(listener))
    }
}

/// Subject holding a current value, replayed to every new listener
pub struct BehaviorSubject<T> {
    value: Arc<Mutex<T>>,
    subject: Subject<T>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subject: self.subject.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BehaviorSubject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorSubject")
            .field("value", &*lock(&self.value))
            .field("subject", &self.subject)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> BehaviorSubject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(initial)),
            subject: Subject::new(),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        lock(&self.value).clone()
    }

    /// Replace the current value and notify listeners
    pub fn next(&self, value: T) {
        if self.subject.is_closed() {
            return;
        }
        *lock(&self.value) = value.clone();
        self.subject.next(value);
    }

    /// Mutate the current value in place and notify listeners with the result
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if self.subject.is_closed() {
            return;
        }
        let value = {
            let mut current = lock(&self.value);
            f(&mut current);
            current.clone()
        };
        self.subject.next(value);
    }

    /// Register a listener; it immediately receives the current value
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    pub(crate) fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        let subscription = self.subject.subscribe_listener(listener.clone());
        if !subscription.is_closed() {
            let current = self.get();
            listener(&current);
        }
        subscription
    }

    pub fn complete(&self) {
        self.subject.complete();
    }

    pub fn is_closed(&self) -> bool {
        self.subject.is_closed()
    }

    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }

    pub fn as_observable(&self) -> Observable<T> {
        let subject = self.clone();
        Observable::new(move |listener| subject.subscribe_listener(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync)
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn test_subject_multicasts_in_order() {
        let subject = Subject::new();
        let (a, fa) = collector::<i32>();
        let (b, fb) = collector::<i32>();
        let _sa = subject.subscribe(fa);
        let _sb = subject.subscribe(fb);

        subject.next(1);
        subject.next(2);

        assert_eq!(*a.lock().unwrap(), vec![1, 2]);
        assert_eq!(*b.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_subject_unsubscribe_stops_delivery() {
        let subject = Subject::new();
        let (seen, f) = collector::<i32>();
        let sub = subject.subscribe(f);

        subject.next(1);
        sub.unsubscribe();
        subject.next(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn test_subject_complete_ignores_later_values() {
        let subject = Subject::new();
        let (seen, f) = collector::<i32>();
        let _sub = subject.subscribe(f);

        subject.complete();
        subject.next(5);

        assert!(seen.lock().unwrap().is_empty());
        assert!(subject.subscribe(|_: &i32| {}).is_closed());
    }

    #[test]
    fn test_reentrant_emission_does_not_deadlock() {
        let subject: Subject<i32> = Subject::new();
        let inner = subject.clone();
        let (seen, f) = collector::<i32>();
        let _log = subject.subscribe(f);
        let _echo = subject.subscribe(move |v: &i32| {
            if *v == 1 {
                inner.next(2);
            }
        });

        subject.next(1);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_behavior_subject_replays_current_value() {
        let subject = BehaviorSubject::new(0);
        subject.next(7);
        let (seen, f) = collector::<i32>();
        let _sub = subject.subscribe(f);

        subject.next(8);

        assert_eq!(*seen.lock().unwrap(), vec![7, 8]);
        assert_eq!(subject.get(), 8);
    }

    #[test]
    fn test_behavior_subject_update_in_place() {
        let subject = BehaviorSubject::new(vec![1]);
        subject.update(|v| v.push(2));
        assert_eq!(subject.get(), vec![1, 2]);
    }
}
