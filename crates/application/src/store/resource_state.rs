use std::sync::atomic::{AtomicU64, Ordering};

use orbit_domain::DomainRecord;

/// Default page size of list views.
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

/// Revisions are drawn from one process-wide sequence, so two collections
/// never share a revision unless one is a clone of the other.
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Mutation of one resource collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceAction<R> {
    /// Replaces every item with a freshly fetched list.
    Set(Vec<R>),
    /// Appends a created record.
    Add(R),
    /// Replaces the record with the same id; no-op when absent.
    Update(R),
    /// Removes the record with the given id.
    Delete(String),
    /// Sets the free-text query and returns to the first page.
    SetSearch(String),
    /// Moves to a zero-based page.
    SetPage(usize),
    /// Clears the query and returns to the first page.
    ResetFilters,
}

/// Client-held state of one resource collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<R> {
    items: Vec<R>,
    revision: u64,
    search_query: String,
    page: usize,
    rows_per_page: usize,
}

impl<R> Default for ResourceState<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            revision: 0,
            search_query: String::new(),
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl<R: DomainRecord> ResourceState<R> {
    /// Returns items in server order.
    #[must_use]
    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// Returns a stamp that changes whenever `items` changes.
    ///
    /// Stamps are unique across collections; only an empty default
    /// collection reports `0`.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the active free-text query.
    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Returns the zero-based page index.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Finds a record by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|record| record.id() == id)
    }

    /// Applies one action.
    pub fn apply(&mut self, action: ResourceAction<R>) {
        match action {
            ResourceAction::Set(items) => {
                self.items = items;
                self.bump();
            }
            ResourceAction::Add(record) => {
                self.items.push(record);
                self.bump();
            }
            ResourceAction::Update(record) => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id() == record.id()) {
                    *slot = record;
                    self.bump();
                }
            }
            ResourceAction::Delete(id) => {
                let before = self.items.len();
                self.items.retain(|item| item.id() != id);
                if self.items.len() != before {
                    self.bump();
                }
            }
            ResourceAction::SetSearch(query) => {
                self.search_query = query;
                self.page = 0;
            }
            ResourceAction::SetPage(page) => self.page = page,
            ResourceAction::ResetFilters => {
                self.search_query.clear();
                self.page = 0;
            }
        }
    }

    pub(super) fn clear(&mut self) {
        self.items.clear();
        self.search_query.clear();
        self.page = 0;
        self.bump();
    }

    fn bump(&mut self) {
        self.revision = NEXT_REVISION.fetch_add(1, Ordering::Relaxed);
    }
}
