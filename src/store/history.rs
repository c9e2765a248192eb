//! Linear snapshot history for undo/redo.
//!
//! Unlike a command stack, each entry is a full copy of the state. `push`
//! discards everything after the cursor, so redo is only possible until the
//! next change.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_HISTORY;

/// Configuration for the snapshot history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of snapshots to keep
    pub max_history: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Snapshots plus a cursor pointing at the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHistory<T> {
    entries: Vec<T>,
    /// Index of the current snapshot; `None` when empty
    cursor: Option<usize>,
    #[serde(skip)]
    config: HistoryConfig,
}

impl<T> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            config: HistoryConfig::default(),
        }
    }
}

impl<T: Clone> SnapshotHistory<T> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Change the size bound, trimming the oldest entries if needed.
    pub fn set_config(&mut self, config: HistoryConfig) {
        self.config = config;
        self.trim();
    }

    /// Start over with a single snapshot.
    pub fn reset_to(&mut self, snapshot: T) {
        self.entries = vec![snapshot];
        self.cursor = Some(0);
    }

    /// Record a new snapshot after the cursor, dropping the redo tail.
    pub fn push(&mut self, snapshot: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(snapshot);
        self.cursor = Some(self.entries.len() - 1);
        self.trim();
    }

    fn trim(&mut self) {
        let max = self.config.max_history.max(1);
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(..excess);
            self.cursor = self.cursor.map(|c| c.saturating_sub(excess));
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Move back one snapshot and return it.
    pub fn undo(&mut self) -> Option<T> {
        if !self.can_undo() {
            return None;
        }
        let cursor = self.cursor? - 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor).cloned()
    }

    /// Move forward one snapshot and return it.
    pub fn redo(&mut self) -> Option<T> {
        if !self.can_redo() {
            return None;
        }
        let cursor = self.cursor? + 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor).cloned()
    }

    /// Snapshot at the cursor.
    pub fn current(&self) -> Option<&T> {
        self.entries.get(self.cursor?)
    }

    /// Cursor position.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no snapshot is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_redo() {
        let mut history = SnapshotHistory::new();
        history.reset_to(1);
        history.push(2);
        history.push(3);

        assert_eq!(history.undo(), Some(2));
        assert_eq!(history.undo(), Some(1));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(2));
        assert_eq!(history.current(), Some(&2));
    }

    #[test]
    fn test_push_drops_redo_tail() {
        let mut history = SnapshotHistory::new();
        history.reset_to("a");
        history.push("b");
        history.undo();
        history.push("c");

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo(), Some("a"));
    }

    #[test]
    fn test_push_on_empty_history() {
        let mut history = SnapshotHistory::new();
        history.push(5);
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_max_history() {
        let mut history = SnapshotHistory::with_config(HistoryConfig { max_history: 3 });
        for i in 0..5 {
            history.push(i);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&4));
        assert_eq!(history.undo(), Some(3));
        assert_eq!(history.undo(), Some(2));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_clear() {
        let mut history = SnapshotHistory::new();
        history.reset_to(1);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.current(), None);
    }
}
