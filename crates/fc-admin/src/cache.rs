//! In-memory list cache backing the admin screens.

use fc_common::{Company, Plan};
use parking_lot::RwLock;

/// Records the cache can address by id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for Company {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Plan {
    fn key(&self) -> &str {
        &self.id
    }
}

/// What the list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl<T> Default for ListView<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            last_error: None,
        }
    }
}

pub(crate) struct ListCache<T> {
    inner: RwLock<ListView<T>>,
}

impl<T: Keyed + Clone> ListCache<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ListView::default()),
        }
    }

    pub fn view(&self) -> ListView<T> {
        self.inner.read().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.read().items.clone()
    }

    pub fn begin_load(&self) {
        let mut view = self.inner.write();
        view.loading = true;
        view.last_error = None;
    }

    pub fn loaded(&self, items: Vec<T>) {
        let mut view = self.inner.write();
        view.items = items;
        view.loading = false;
    }

    pub fn failed(&self, message: String) {
        let mut view = self.inner.write();
        view.loading = false;
        view.last_error = Some(message);
    }

    /// Mutate one cached entry, returning its previous value.
    pub fn modify<F>(&self, id: &str, change: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut view = self.inner.write();
        let entry = view.items.iter_mut().find(|item| item.key() == id)?;
        let previous = entry.clone();
        change(entry);
        Some(previous)
    }

    /// Put back an entry captured by [`ListCache::modify`].
    pub fn restore(&self, previous: T) {
        let mut view = self.inner.write();
        if let Some(entry) = view.items.iter_mut().find(|item| item.key() == previous.key()) {
            *entry = previous;
        }
    }
}
