//! Browser history collaborator.
//!
//! # Responsibilities
//! - Accept `{path, search}` entries committed by the dispatch engine
//! - Replay entries on back/forward so the router can re-enter dispatch
//!
//! # Design Decisions
//! - [`MemoryHistory`] mirrors the browser model: pushing truncates the forward stack
//! - Replayed entries are handed back to the caller; the router re-dispatches them
//!   without committing again

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// State stored with each history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub path: String,
    pub search: String,
}

impl HistoryEntry {
    pub fn new(path: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            search: search.into(),
        }
    }

    /// The URL shown in the address bar.
    pub fn url(&self) -> String {
        format!("{}{}", self.path, self.search)
    }
}

/// Destination for committed navigations.
pub trait History: Send + Sync {
    fn push(&self, entry: HistoryEntry);
}

#[derive(Debug, Default)]
struct Stack {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
}

/// In-memory session history.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    stack: Mutex<Stack>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step back one entry; returns the entry to re-dispatch.
    pub fn back(&self) -> Option<HistoryEntry> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = stack.cursor?.checked_sub(1)?;
        stack.cursor = Some(cursor);
        stack.entries.get(cursor).cloned()
    }

    /// Step forward one entry; returns the entry to re-dispatch.
    pub fn forward(&self) -> Option<HistoryEntry> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let cursor = stack.cursor? + 1;
        let entry = stack.entries.get(cursor).cloned()?;
        stack.cursor = Some(cursor);
        Some(entry)
    }

    pub fn current(&self) -> Option<HistoryEntry> {
        let stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        stack.cursor.and_then(|i| stack.entries.get(i).cloned())
    }

    pub fn len(&self) -> usize {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl History for MemoryHistory {
    fn push(&self, entry: HistoryEntry) {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let keep = stack.cursor.map_or(0, |i| i + 1);
        stack.entries.truncate(keep);
        stack.entries.push(entry);
        stack.cursor = Some(stack.entries.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_and_forward() {
        let history = MemoryHistory::new();
        assert!(history.back().is_none());

        history.push(HistoryEntry::new("/a", ""));
        history.push(HistoryEntry::new("/b", "?x=1"));

        assert_eq!(history.back(), Some(HistoryEntry::new("/a", "")));
        assert!(history.back().is_none());
        assert_eq!(history.forward(), Some(HistoryEntry::new("/b", "?x=1")));
        assert!(history.forward().is_none());
        assert_eq!(history.current().unwrap().url(), "/b?x=1");
    }

    #[test]
    fn test_push_truncates_forward_stack() {
        let history = MemoryHistory::new();
        history.push(HistoryEntry::new("/a", ""));
        history.push(HistoryEntry::new("/b", ""));
        history.back();
        history.push(HistoryEntry::new("/c", ""));

        assert_eq!(history.len(), 2);
        assert!(history.forward().is_none());
        assert_eq!(history.back(), Some(HistoryEntry::new("/a", "")));
    }
}
