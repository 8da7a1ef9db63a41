//! Single-threaded publish/subscribe primitives
//!
//! Every derived view in the crate is built from these pieces:
//!
//! ```text
//! BehaviorSubject ──┐
//!                   ├──▶ combine_latest ──▶ map ──▶ Observable ──▶ listeners
//! Subject ──────────┘
//! ```
//!
//! Emission is synchronous: `next()` runs every registered listener before it
//! returns. Combinators remember the last value of each input and recompute
//! whenever any of them changes. Deferred work that must not run inside the
//! current notification goes through [`Scheduler`].

mod observable;
mod scheduler;
mod subject;
mod subscription;

pub use observable::{Observable, combine_latest2, combine_latest3};
pub use scheduler::Scheduler;
pub use subject::{BehaviorSubject, Subject};
pub use subscription::{Subscription, SubscriptionBag};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback registered on a stream
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Lock a mutex, recovering the data if a listener panicked while holding it
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
