//! Pager model driving the data source's page slice

use crate::config::PaginatorConfig;
use crate::core::query::PaginationMeta;
use crate::reactive::{BehaviorSubject, Observable, Subject, lock};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Emitted when the user changes page or page size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageEvent {
    pub page_index: usize,
    pub previous_page_index: usize,
    pub page_size: usize,
    pub length: usize,
}

#[derive(Debug)]
struct PaginatorState {
    page_index: usize,
    page_size: usize,
    length: usize,
    page_size_options: Vec<usize>,
}

/// Page index, page size and total length, plus the events a pager widget emits
///
/// Clones share state. Property setters (`set_page_index`, `set_length`) are
/// silent: only navigation and page size changes emit on [`page`](Self::page).
#[derive(Debug, Clone)]
pub struct Paginator {
    state: Arc<Mutex<PaginatorState>>,
    page: Subject<PageEvent>,
    initialized: BehaviorSubject<bool>,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self::from_config(&PaginatorConfig {
            page_size,
            ..PaginatorConfig::default()
        })
    }

    pub fn from_config(config: &PaginatorConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaginatorState {
                page_index: 0,
                page_size: config.page_size,
                length: 0,
                page_size_options: config.page_size_options.clone(),
            })),
            page: Subject::new(),
            initialized: BehaviorSubject::new(false),
        }
    }

    pub fn page_index(&self) -> usize {
        lock(&self.state).page_index
    }

    pub fn page_size(&self) -> usize {
        lock(&self.state).page_size
    }

    /// Total number of items being paged
    pub fn length(&self) -> usize {
        lock(&self.state).length
    }

    pub fn page_size_options(&self) -> Vec<usize> {
        lock(&self.state).page_size_options.clone()
    }

    pub fn set_page_index(&self, page_index: usize) {
        lock(&self.state).page_index = page_index;
    }

    pub fn set_length(&self, length: usize) {
        lock(&self.state).length = length;
    }

    /// Change the page size, staying on the page that shows the current first item
    pub fn set_page_size(&self, page_size: usize) {
        let page_size = page_size.max(1);
        let event = {
            let mut state = lock(&self.state);
            let start_index = state.page_index * state.page_size;
            let previous_page_index = state.page_index;
            state.page_index = start_index / page_size;
            state.page_size = page_size;
            event_for(&state, previous_page_index)
        };
        self.page.next(event);
    }

    pub fn number_of_pages(&self) -> usize {
        let state = lock(&self.state);
        if state.page_size == 0 {
            return 0;
        }
        state.length.div_ceil(state.page_size)
    }

    pub fn has_previous_page(&self) -> bool {
        let state = lock(&self.state);
        state.page_index >= 1 && state.page_size != 0
    }

    pub fn has_next_page(&self) -> bool {
        let pages = self.number_of_pages();
        let state = lock(&self.state);
        state.page_size != 0 && state.page_index + 1 < pages
    }

    pub fn next_page(&self) {
        if self.has_next_page() {
            self.go_to(self.page_index() + 1);
        }
    }

    pub fn previous_page(&self) {
        if self.has_previous_page() {
            self.go_to(self.page_index() - 1);
        }
    }

    pub fn first_page(&self) {
        if self.has_previous_page() {
            self.go_to(0);
        }
    }

    pub fn last_page(&self) {
        if self.has_next_page() {
            self.go_to(self.number_of_pages() - 1);
        }
    }

    /// Jump to a page, as if the user picked it; emits when the index changes
    pub fn go_to_page(&self, page_index: usize) {
        if page_index != self.page_index() {
            self.go_to(page_index);
        }
    }

    fn go_to(&self, page_index: usize) {
        let event = {
            let mut state = lock(&self.state);
            let previous_page_index = state.page_index;
            state.page_index = page_index;
            event_for(&state, previous_page_index)
        };
        self.page.next(event);
    }

    /// Mark the pager as ready; `initialized()` listeners fire once
    pub fn init(&self) {
        if !self.initialized.get() {
            self.initialized.next(true);
        }
    }

    /// User-driven page changes
    pub fn page(&self) -> Observable<PageEvent> {
        self.page.as_observable()
    }

    /// Emits once the pager is initialized, immediately for late subscribers
    pub fn initialized(&self) -> Observable<()> {
        self.initialized
            .as_observable()
            .filter_map(|ready| ready.then_some(()))
    }

    /// 1-based pagination summary of the current state
    pub fn meta(&self) -> PaginationMeta {
        let state = lock(&self.state);
        PaginationMeta::from_page_index(state.page_index, state.page_size, state.length)
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::from_config(&PaginatorConfig::default())
    }
}

fn event_for(state: &PaginatorState, previous_page_index: usize) -> PageEvent {
    PageEvent {
        page_index: state.page_index,
        previous_page_index,
        page_size: state.page_size,
        length: state.length,
    }
}
