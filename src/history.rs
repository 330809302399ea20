//! Undo/redo history for harmonic edits.
//!
//! Snapshot-based: every edit records the whole harmonic set before it is
//! applied. A set is at most 32 small records, so full copies are cheap.

use crate::harmonics::{HarmonicId, HarmonicSet};
use std::collections::VecDeque;

/// Maximum number of undo/redo states to keep.
const MAX_HISTORY_SIZE: usize = 32;

/// The editor state at a point in time.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    /// The complete harmonic set.
    pub harmonics: HarmonicSet,

    /// The slot that was selected, so undo returns the cursor to the edit.
    pub selected: HarmonicId,

    /// What the edit was, for status messages when undoing/redoing.
    pub description: String,
}

impl StateSnapshot {
    pub fn new(
        harmonics: &HarmonicSet,
        selected: HarmonicId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            harmonics: harmonics.clone(),
            selected,
            description: description.into(),
        }
    }
}

/// Two bounded stacks of snapshots.
///
/// Recording a new edit clears the redo stack, since the timeline branches.
#[derive(Debug, Default)]
pub struct HistoryManager {
    undo_stack: VecDeque<StateSnapshot>,
    redo_stack: VecDeque<StateSnapshot>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            redo_stack: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Records the state before an edit. Call BEFORE mutating.
    pub fn push_undo(&mut self, snapshot: StateSnapshot) {
        self.redo_stack.clear();
        self.push_undo_preserve_redo(snapshot);
    }

    /// Pushes to the undo stack without touching redo (used while redoing).
    pub fn push_undo_preserve_redo(&mut self, snapshot: StateSnapshot) {
        push_bounded(&mut self.undo_stack, snapshot);
    }

    /// Pops the most recent undo state.
    ///
    /// The caller pushes the CURRENT state to redo before applying it.
    pub fn pop_undo(&mut self) -> Option<StateSnapshot> {
        self.undo_stack.pop_back()
    }

    /// Saves the state an undo is replacing.
    pub fn push_redo(&mut self, snapshot: StateSnapshot) {
        push_bounded(&mut self.redo_stack, snapshot);
    }

    /// Pops the most recent redo state.
    pub fn pop_redo(&mut self) -> Option<StateSnapshot> {
        self.redo_stack.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

fn push_bounded(stack: &mut VecDeque<StateSnapshot>, snapshot: StateSnapshot) {
    stack.push_back(snapshot);
    while stack.len() > MAX_HISTORY_SIZE {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(description: impl Into<String>) -> StateSnapshot {
        StateSnapshot::new(&HarmonicSet::default(), HarmonicId::FUNDAMENTAL, description)
    }

    #[test]
    fn test_history_push_and_pop() {
        let mut history = HistoryManager::new();
        history.push_undo(snapshot("Add H3"));
        assert!(history.can_undo());
        assert!(!history.can_redo());

        let restored = history.pop_undo().unwrap();
        assert_eq!(restored.description, "Add H3");
        assert!(!history.can_undo());
    }

    #[test]
    fn test_history_max_size() {
        let mut history = HistoryManager::new();
        for i in 0..MAX_HISTORY_SIZE + 5 {
            history.push_undo(snapshot(format!("Edit {}", i)));
        }
        assert_eq!(history.undo_stack.len(), MAX_HISTORY_SIZE);
        let last = history.pop_undo().unwrap();
        assert_eq!(last.description, format!("Edit {}", MAX_HISTORY_SIZE + 4));
        assert_eq!(history.undo_stack.front().unwrap().description, "Edit 5");
    }

    #[test]
    fn test_new_action_clears_redo_after_undo() {
        let mut history = HistoryManager::new();
        for i in 0..3 {
            history.push_undo(snapshot(format!("Edit {}", i)));
        }
        for _ in 0..2 {
            let undone = history.pop_undo().unwrap();
            history.push_redo(undone);
        }
        assert_eq!(history.redo_stack.len(), 2);

        history.push_undo(snapshot("Branch"));
        assert_eq!(history.undo_stack.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_redo_preserves_remaining_redo() {
        let mut history = HistoryManager::new();
        for i in 0..4 {
            history.push_undo(snapshot(format!("Edit {}", i)));
        }
        for _ in 0..4 {
            let undone = history.pop_undo().unwrap();
            history.push_redo(undone);
        }
        for _ in 0..4 {
            let redone = history.pop_redo().unwrap();
            history.push_undo_preserve_redo(redone);
        }
        assert_eq!(history.undo_stack.len(), 4);
        assert!(!history.can_redo());
    }
}
