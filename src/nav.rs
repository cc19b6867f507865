//! Navigable location seam.
//!
//! DESIGN
//! ======
//! The engine mirrors its filter criteria into the query string of the page
//! location. Every write is a replace: no history entry is added and the
//! scroll position is untouched, so typing in the search box does not flood
//! the back button. `Navigator` abstracts the location so the engine runs
//! the same against a browser router, a CLI argument, or a test double.

#[cfg(test)]
#[path = "nav_test.rs"]
mod tests;

use std::sync::{Mutex, PoisonError};

/// Read and replace the query string of the current location.
pub trait Navigator: Send + Sync {
    /// Current query string, without the leading `?`.
    fn query(&self) -> String;

    /// Replace the query string in place (no history push, no scroll).
    fn replace_query(&self, query: &str);
}

/// In-memory location, used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    path: String,
    inner: Mutex<MemoryLocation>,
}

#[derive(Debug, Default)]
struct MemoryLocation {
    query: String,
    replacements: usize,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            inner: Mutex::new(MemoryLocation {
                query: query.strip_prefix('?').unwrap_or(query).to_owned(),
                replacements: 0,
            }),
        }
    }

    /// Parse a full or relative URL such as `/leads?industry=Retail`.
    #[must_use]
    pub fn from_href(href: &str) -> Self {
        match href.split_once('?') {
            Some((path, query)) => Self::new(path, query),
            None => Self::new(href, ""),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of `replace_query` calls so far.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.lock().replacements
    }

    /// `path?query`, or just `path` when the query is empty.
    #[must_use]
    pub fn href(&self) -> String {
        let query = self.query();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{query}", self.path)
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryLocation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for MemoryNavigator {
    fn query(&self) -> String {
        self.lock().query.clone()
    }

    fn replace_query(&self, query: &str) {
        let mut location = self.lock();
        location.query = query.strip_prefix('?').unwrap_or(query).to_owned();
        location.replacements += 1;
    }
}
