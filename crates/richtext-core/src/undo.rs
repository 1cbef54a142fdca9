//! Snapshot-based undo history.
//!
//! Every entry is a serialized document with an embedded selection bookmark. The manager is
//! either [`Clean`](UndoState::Clean), sitting on a recorded checkpoint, or
//! [`Dirty`](UndoState::Dirty), with edits made since the last checkpoint. Undoing from a
//! dirty state first records those edits so they can be redone.

use crate::config::UndoConfig;
use crate::error::EngineError;
use tracing::debug;

/// Whether the document matches the current history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoState {
    /// At a recorded checkpoint.
    Clean,
    /// Changed since the last checkpoint.
    Dirty,
}

/// Undo/redo availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRedoState {
    /// Can undo
    pub can_undo: bool,
    /// Can redo
    pub can_redo: bool,
    /// Entries before the current one
    pub undo_depth: usize,
    /// Entries after the current one
    pub redo_depth: usize,
    /// At a recorded checkpoint
    pub is_clean: bool,
}

/// Linear history of document snapshots.
#[derive(Debug)]
pub struct UndoManager {
    entries: Vec<String>,
    index: usize,
    state: UndoState,
    // Last recorded snapshot was over the size threshold.
    oversized: bool,
    config: UndoConfig,
}

impl UndoManager {
    /// Empty history. The document starts out dirty so that the first edit can be undone.
    pub fn new(config: UndoConfig) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            state: UndoState::Dirty,
            oversized: false,
            config,
        }
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.index = 0;
        self.state = UndoState::Dirty;
        self.oversized = false;
    }

    /// Position of the current entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current state.
    pub fn state(&self) -> UndoState {
        self.state
    }

    /// Record a checkpoint.
    ///
    /// `snapshot` is only called when something is recorded: always when `replace` is set
    /// (the current entry is overwritten), otherwise only from a dirty state (the pointer
    /// advances and any redo entries are dropped). Returns whether an entry was written.
    pub fn record<F>(&mut self, replace: bool, snapshot: F) -> Result<bool, EngineError>
    where
        F: FnOnce() -> Result<String, EngineError>,
    {
        if self.state == UndoState::Clean && !replace {
            return Ok(false);
        }

        let html = snapshot()?;

        let mut index = if self.entries.is_empty() {
            0
        } else if replace {
            self.index
        } else {
            self.index + 1
        };
        self.entries.truncate(index);

        self.oversized = self
            .config
            .document_size_threshold
            .is_some_and(|threshold| html.len() > threshold);
        if self.oversized
            && let Some(limit) = self.config.undo_limit
            && index > limit
        {
            self.entries.drain(..index - limit);
            index = limit;
            debug!(limit, "undo history trimmed");
        }

        self.entries.push(html);
        self.index = index;
        self.state = UndoState::Clean;
        debug!(index, entries = self.entries.len(), "undo checkpoint recorded");
        Ok(true)
    }

    /// Note that the document changed. Returns `true` if this left a checkpoint, which makes
    /// redo unavailable.
    pub fn mark_changed(&mut self) -> bool {
        let was_clean = self.state == UndoState::Clean;
        self.state = UndoState::Dirty;
        was_clean
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        // A large document with a zero limit keeps only the current entry.
        let keeps_history = !(self.oversized && self.config.undo_limit == Some(0));
        self.index > 0
            || (keeps_history && self.state == UndoState::Dirty && !self.entries.is_empty())
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        self.state == UndoState::Clean && self.index + 1 < self.entries.len()
    }

    /// Step back. Pending edits are recorded first through `snapshot`. Returns the snapshot
    /// to restore, or `None` at the start of the history.
    pub fn undo<F>(&mut self, snapshot: F) -> Result<Option<String>, EngineError>
    where
        F: FnOnce() -> Result<String, EngineError>,
    {
        if !self.can_undo() {
            return Ok(None);
        }
        self.record(false, snapshot)?;
        if self.index == 0 {
            return Ok(None);
        }
        self.index -= 1;
        self.state = UndoState::Clean;
        debug!(index = self.index, "undo");
        Ok(self.entries.get(self.index).cloned())
    }

    /// Step forward. Returns the snapshot to restore, or `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<String> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        debug!(index = self.index, "redo");
        self.entries.get(self.index).cloned()
    }

    /// Summary for hosts.
    pub fn status(&self) -> UndoRedoState {
        let recorded = !self.entries.is_empty();
        UndoRedoState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            undo_depth: if recorded { self.index } else { 0 },
            redo_depth: if recorded && self.state == UndoState::Clean {
                self.entries.len() - self.index - 1
            } else {
                0
            },
            is_clean: self.state == UndoState::Clean,
        }
    }
}
