//! Cold observables and combinators

use super::{Listener, Subscription, lock};
use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

type SubscribeFn<T> = dyn Fn(Listener<T>) -> Subscription + Send + Sync;

/// A subscribable stream description
///
/// Subscribing runs the stream's setup once per listener, so every
/// subscriber gets its own combinator state (remembered inputs, counters).
pub struct Observable<T> {
    subscribe_fn: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: self.subscribe_fn.clone(),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Build an observable from its subscribe function
    pub fn new<F>(subscribe_fn: F) -> Self
    where
        F: Fn(Listener<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            subscribe_fn: Arc::new(subscribe_fn),
        }
    }

    /// Emit a single value to each subscriber, synchronously
    pub fn of(value: T) -> Self {
        Self::new(move |listener| {
            listener(&value);
            Subscription::empty()
        })
    }

    /// Never emits
    pub fn never() -> Self {
        Self::new(|_| Subscription::empty())
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        (self.subscribe_fn)(Arc::new(listener))
    }

    pub(crate) fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        (self.subscribe_fn)(listener)
    }

    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |listener: Listener<U>| {
            let f = f.clone();
            source.subscribe(move |value| listener(&f(value)))
        })
    }

    /// Map and drop `None` results
    pub fn filter_map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> Option<U> + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |listener: Listener<U>| {
            let f = f.clone();
            source.subscribe(move |value| {
                if let Some(mapped) = f(value) {
                    listener(&mapped);
                }
            })
        })
    }

    /// Run a side effect for each value before passing it on
    pub fn inspect<F>(&self, f: F) -> Observable<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let source = self.clone();
        let f = Arc::new(f);
        Observable::new(move |listener: Listener<T>| {
            let f = f.clone();
            source.subscribe(move |value| {
                f(value);
                listener(value);
            })
        })
    }

    /// Drop the first `count` values of each subscription
    pub fn skip(&self, count: usize) -> Observable<T> {
        let source = self.clone();
        Observable::new(move |listener: Listener<T>| {
            let seen = Mutex::new(0usize);
            source.subscribe(move |value| {
                let pass = {
                    let mut seen = lock(&seen);
                    *seen += 1;
                    *seen > count
                };
                if pass {
                    listener(value);
                }
            })
        })
    }

    /// Suppress values equal to the previous one
    pub fn distinct_until_changed(&self) -> Observable<T>
    where
        T: PartialEq,
    {
        let source = self.clone();
        Observable::new(move |listener: Listener<T>| {
            let last: Mutex<Option<T>> = Mutex::new(None);
            source.subscribe(move |value| {
                let changed = {
                    let mut last = lock(&last);
                    if last.as_ref() == Some(value) {
                        false
                    } else {
                        *last = Some(value.clone());
                        true
                    }
                };
                if changed {
                    listener(value);
                }
            })
        })
    }

    /// Interleave several sources into one stream
    pub fn merge(sources: Vec<Observable<T>>) -> Observable<T> {
        Observable::new(move |listener: Listener<T>| {
            let subscriptions = sources
                .iter()
                .map(|source| source.subscribe_listener(listener.clone()))
                .collect();
            Subscription::from_many(subscriptions)
        })
    }

    /// Bridge into a `tokio::sync::watch` channel for async consumers
    ///
    /// The receiver holds `None` until the first emission. The returned
    /// subscription keeps the bridge alive; unsubscribe it to stop forwarding.
    pub fn to_watch(&self) -> (watch::Receiver<Option<T>>, Subscription) {
        let (tx, rx) = watch::channel(None);
        let subscription = self.subscribe(move |value| {
            // A closed receiver only means nobody is listening any more
            let _ = tx.send(Some(value.clone()));
        });
        (rx, subscription)
    }
}

/// Emit `(a, b)` whenever either input changes, once both have emitted
pub fn combine_latest2<A, B>(a: &Observable<A>, b: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
{
    let (a, b) = (a.clone(), b.clone());
    Observable::new(move |listener: Listener<(A, B)>| {
        let latest: Arc<Mutex<(Option<A>, Option<B>)>> = Arc::new(Mutex::new((None, None)));

        let emit = {
            let latest = latest.clone();
            move || {
                let combined = {
                    let latest = lock(&latest);
                    match &*latest {
                        (Some(a), Some(b)) => Some((a.clone(), b.clone())),
                        _ => None,
                    }
                };
                if let Some(combined) = combined {
                    listener(&combined);
                }
            }
        };
        let emit = Arc::new(emit);

        let sub_a = {
            let latest = latest.clone();
            let emit = emit.clone();
            a.subscribe(move |value| {
                lock(&latest).0 = Some(value.clone());
                emit();
            })
        };
        let sub_b = {
            let latest = latest.clone();
            let emit = emit.clone();
            b.subscribe(move |value| {
                lock(&latest).1 = Some(value.clone());
                emit();
            })
        };

        Subscription::from_many(vec![sub_a, sub_b])
    })
}

/// Three-input variant of [`combine_latest2`]
pub fn combine_latest3<A, B, C>(
    a: &Observable<A>,
    b: &Observable<B>,
    c: &Observable<C>,
) -> Observable<(A, B, C)>
where
    A: Clone + Send + Sync + 'static,
    B: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    combine_latest2(&combine_latest2(a, b), c).map(|((a, b), c)| (a.clone(), b.clone(), c.clone()))
}
