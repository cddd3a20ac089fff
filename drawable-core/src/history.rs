//! Undo/redo history over committed drawing snapshots.
//!
//! ```text
//! entries: [ s0 | s1 | s2 | s3 ]
//!                      ^ cursor
//! push(s4)  -> [ s0 | s1 | s2 | s4 ]   (s3 is discarded)
//! undo()    -> cursor moves left, reload requested
//! redo()    -> cursor moves right, reload requested
//! reset(s)  -> [ s ], cursor 0
//! ```

use crate::DrawingSnapshot;

/// One-shot signals raised by history operations.
///
/// They are handed out (and cleared) by [`HistoryStore::take_actions`]; the
/// caller that takes them is responsible for acting on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionFlags {
    /// The drawable surface must be reloaded from [`HistoryStore::current`].
    pub should_reload_canvas: bool,
    /// The next host send must bypass the live-update gate.
    pub force_send: bool,
}

impl ActionFlags {
    /// Check if any flag is raised.
    #[must_use]
    pub fn any(&self) -> bool {
        self.should_reload_canvas || self.force_send
    }
}

/// Cursor-based history of drawing snapshots.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<DrawingSnapshot>,
    cursor: usize,
    initial: DrawingSnapshot,
    actions: ActionFlags,
}

impl HistoryStore {
    /// Create a history seeded with `initial` as its only entry.
    #[must_use]
    pub fn new(initial: DrawingSnapshot) -> Self {
        Self {
            entries: vec![initial.clone()],
            cursor: 0,
            initial,
            actions: ActionFlags::default(),
        }
    }

    /// Record a committed snapshot.
    ///
    /// A snapshot equal to the current entry is ignored. Otherwise every entry
    /// after the cursor is dropped before appending. Returns whether the
    /// history changed.
    pub fn push(&mut self, snapshot: DrawingSnapshot) -> bool {
        self.check_invariants();
        if self.entries[self.cursor] == snapshot {
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        self.cursor = self.entries.len() - 1;
        // The surface produced this state, so nothing needs reloading.
        self.actions = ActionFlags::default();
        tracing::debug!("History push: {} entries, cursor {}", self.entries.len(), self.cursor);
        true
    }

    /// Step back one entry. Returns `false` at the oldest entry.
    pub fn undo(&mut self) -> bool {
        self.check_invariants();
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.request_reload();
        true
    }

    /// Step forward one entry. Returns `false` at the newest entry.
    pub fn redo(&mut self) -> bool {
        self.check_invariants();
        if self.cursor + 1 == self.entries.len() {
            return false;
        }
        self.cursor += 1;
        self.request_reload();
        true
    }

    /// Discard all history and start over from `snapshot`.
    pub fn reset(&mut self, snapshot: DrawingSnapshot) {
        self.entries = vec![snapshot.clone()];
        self.cursor = 0;
        self.initial = snapshot;
        self.request_reload();
        tracing::debug!("History reset");
    }

    /// Request a host send regardless of the live-update setting.
    pub fn force_sync(&mut self) {
        self.actions.force_send = true;
    }

    /// Check if [`Self::undo`] would move the cursor.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Check if [`Self::redo`] would move the cursor.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> &DrawingSnapshot {
        &self.entries[self.cursor]
    }

    /// The snapshot the history was last reset to.
    #[must_use]
    pub fn initial(&self) -> &DrawingSnapshot {
        &self.initial
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: a history holds at least its initial entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Peek at the pending action flags without consuming them.
    #[must_use]
    pub fn actions(&self) -> ActionFlags {
        self.actions
    }

    /// Hand out the pending action flags and clear them.
    pub fn take_actions(&mut self) -> ActionFlags {
        std::mem::take(&mut self.actions)
    }

    fn request_reload(&mut self) {
        self.actions = ActionFlags {
            should_reload_canvas: true,
            force_send: true,
        };
    }

    fn check_invariants(&self) {
        assert!(!self.entries.is_empty(), "history has no entries");
        assert!(
            self.cursor < self.entries.len(),
            "history cursor {} out of range for {} entries",
            self.cursor,
            self.entries.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShapeKind, ShapeRecord};

    fn drawing(n: usize) -> DrawingSnapshot {
        let mut snapshot = DrawingSnapshot::empty(Some("#ffffff".to_string()));
        for i in 0..n {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f64 * 10.0;
            snapshot.objects.push(
                ShapeRecord::new(ShapeKind::Line)
                    .with("x1", offset)
                    .with("y1", 0.0)
                    .with("x2", offset)
                    .with("y2", 10.0),
            );
        }
        snapshot
    }

    #[test]
    fn test_new_history() {
        let history = HistoryStore::new(drawing(0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.actions().any());
    }

    #[test]
    fn test_push_does_not_request_reload() {
        let mut history = HistoryStore::new(drawing(0));
        assert!(history.push(drawing(1)));
        assert_eq!(history.take_actions(), ActionFlags::default());
    }

    #[test]
    fn test_push_duplicate_is_ignored() {
        let mut history = HistoryStore::new(drawing(0));
        history.push(drawing(1));
        assert!(!history.push(drawing(1)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_undo_redo_flags_are_one_shot() {
        let mut history = HistoryStore::new(drawing(0));
        history.push(drawing(1));

        assert!(history.undo());
        let flags = history.take_actions();
        assert!(flags.should_reload_canvas);
        assert!(flags.force_send);
        assert!(!history.take_actions().any());

        assert!(history.redo());
        assert!(history.take_actions().should_reload_canvas);
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut history = HistoryStore::new(drawing(0));
        assert!(!history.undo());
        assert!(!history.redo());
        assert_eq!(history.cursor(), 0);
        assert!(!history.actions().any());
    }

    #[test]
    fn test_force_sync_keeps_entries() {
        let mut history = HistoryStore::new(drawing(0));
        history.push(drawing(1));
        history.force_sync();

        let flags = history.take_actions();
        assert!(flags.force_send);
        assert!(!flags.should_reload_canvas);
        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), &drawing(1));
    }

    #[test]
    fn test_reset_replaces_initial() {
        let mut history = HistoryStore::new(drawing(0));
        history.push(drawing(1));
        history.push(drawing(2));
        history.undo();

        history.reset(drawing(5));
        assert_eq!(history.len(), 1);
        assert_eq!(history.initial(), &drawing(5));
        assert_eq!(history.current(), &drawing(5));
        assert!(history.take_actions().should_reload_canvas);
    }
}
