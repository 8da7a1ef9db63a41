//! Sort-control model: the column-header sort widget

use crate::core::query::{Order, SortBy};
use crate::reactive::{BehaviorSubject, Observable, Subject, lock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Direction shown by a sort control; `None` means "not sorted"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
    #[default]
    None,
}

impl SortDirection {
    /// Registry order for this direction
    ///
    /// Only `Desc` sorts descending; an unsorted column falls back to ascending.
    pub fn to_order(self) -> Order {
        match self {
            SortDirection::Desc => Order::Desc,
            SortDirection::Asc | SortDirection::None => Order::Asc,
        }
    }

    /// Next direction when the same column is clicked again
    fn cycle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::None,
            SortDirection::None => SortDirection::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
            SortDirection::None => Ok(()),
        }
    }
}

/// Emitted when the active column or its direction changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortChange {
    pub active: String,
    pub direction: SortDirection,
}

impl SortChange {
    pub fn to_sort_by(&self) -> SortBy {
        SortBy::new(self.active.clone(), self.direction.to_order())
    }
}

#[derive(Debug, Default)]
struct SortState {
    active: String,
    direction: SortDirection,
}

/// Active column and direction, plus the events a sort widget emits
///
/// Clones share state.
#[derive(Debug, Clone)]
pub struct SortControl {
    state: Arc<Mutex<SortState>>,
    sort_change: Subject<SortChange>,
    initialized: BehaviorSubject<bool>,
}

impl SortControl {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SortState::default())),
            sort_change: Subject::new(),
            initialized: BehaviorSubject::new(false),
        }
    }

    /// Control starting on `active` in `direction`, before any user interaction
    pub fn with_default(active: impl Into<String>, direction: SortDirection) -> Self {
        let control = Self::new();
        {
            let mut state = lock(&control.state);
            state.active = active.into();
            state.direction = direction;
        }
        control
    }

    pub fn active(&self) -> String {
        lock(&self.state).active.clone()
    }

    pub fn direction(&self) -> SortDirection {
        lock(&self.state).direction
    }

    /// Simulate a header click on `active`
    ///
    /// A new column starts ascending; clicking the same column cycles
    /// asc, desc, unsorted.
    pub fn sort(&self, active: impl Into<String>) {
        let active = active.into();
        let change = {
            let mut state = lock(&self.state);
            state.direction = if state.active == active {
                state.direction.cycle()
            } else {
                SortDirection::Asc
            };
            state.active = active;
            SortChange {
                active: state.active.clone(),
                direction: state.direction,
            }
        };
        self.sort_change.next(change);
    }

    /// Set the column and direction programmatically and emit the change
    pub fn set(&self, active: impl Into<String>, direction: SortDirection) {
        let change = {
            let mut state = lock(&self.state);
            state.active = active.into();
            state.direction = direction;
            SortChange {
                active: state.active.clone(),
                direction,
            }
        };
        self.sort_change.next(change);
    }

    /// Mark the control as ready; `initialized()` listeners fire once
    pub fn init(&self) {
        if !self.initialized.get() {
            self.initialized.next(true);
        }
    }

    pub fn sort_change(&self) -> Observable<SortChange> {
        self.sort_change.as_observable()
    }

    pub fn initialized(&self) -> Observable<()> {
        self.initialized
            .as_observable()
            .filter_map(|ready| ready.then_some(()))
    }
}

impl Default for SortControl {
    fn default() -> Self {
        Self::new()
    }
}
