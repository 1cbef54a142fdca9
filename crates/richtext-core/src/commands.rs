//! Command Interface Layer
//!
//! Wraps [`EditorCore`] in a command pattern for host integration.
//!
//! # Overview
//!
//! [`CommandExecutor`] is the entry point hosts talk to. On top of the editor it owns:
//!
//! - **Undo history**: a snapshot checkpoint is taken before every mutating command
//! - **Sanitizing**: markup from the host goes through a [`Sanitizer`] before it is parsed
//! - **Notifications**: path, undo state and input events, delivered to subscribers once per
//!   command
//!
//! # Example
//!
//! ```rust
//! use richtext_core::{BlockCommand, Command, CommandExecutor, EditCommand, EditorConfig};
//!
//! let mut executor = CommandExecutor::new(EditorConfig::default());
//!
//! executor.execute(Command::Edit(EditCommand::SetHtml {
//!     html: "<div>Hello</div>".to_string(),
//! })).unwrap();
//! executor.execute(Command::Block(BlockCommand::IncreaseQuoteLevel)).unwrap();
//! assert!(executor.editor().html().starts_with("<blockquote>"));
//!
//! executor.execute(Command::Edit(EditCommand::Undo)).unwrap();
//! assert_eq!(executor.editor().html(), "<div>Hello</div>");
//! ```

use crate::config::EditorConfig;
use crate::editor::EditorCore;
use crate::error::EngineError;
use crate::markup::{Sanitizer, TrustedMarkup};
use crate::node::{Attributes, NodeId};
use crate::range::Range;
use crate::undo::{UndoManager, UndoRedoState, UndoState};
use tracing::debug;

/// Content editing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Replace the whole content and start a fresh undo history
    SetHtml {
        /// Markup, passed through the sanitizer.
        html: String,
    },
    /// Replace the selection with markup
    InsertHtml {
        /// Markup, passed through the sanitizer.
        html: String,
    },
    /// Replace the selection with plain text, one block per line
    InsertPlainText {
        /// Text to insert.
        text: String,
    },
    /// Insert a new element at the cursor.
    ///
    /// Inline elements go at the cursor; block elements go after the cursor's block.
    InsertElement {
        /// Tag name.
        tag: String,
        /// Attributes, in order.
        attributes: Vec<(String, String)>,
    },
    /// Delete the selection
    DeleteSelection,
    /// Cut the selection out into a detached fragment
    ExtractSelection,
    /// Record an undo checkpoint
    SaveUndoState,
    /// Undo
    Undo,
    /// Redo
    Redo,
}

/// Selection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Replace the selection
    Set(Range),
    /// Collapse the selection at the start of the document
    MoveToDocumentStart,
    /// Collapse the selection at the end of the document
    MoveToDocumentEnd,
    /// Grow the selection to cover whole blocks
    ExpandToBlockBoundaries,
}

/// Block structure commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCommand {
    /// Wrap the selected blocks in a blockquote
    IncreaseQuoteLevel,
    /// Remove the outermost blockquote around the selected blocks
    DecreaseQuoteLevel,
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Content editing commands
    Edit(EditCommand),
    /// Selection commands
    Selection(SelectionCommand),
    /// Block structure commands
    Block(BlockCommand),
}

/// Command execution result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Success, no return value
    Success,
    /// Success, returns a detached fragment owned by the document
    Fragment(NodeId),
    /// Success, returns the inserted node
    Node(NodeId),
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The element path at the selection changed
    PathChanged {
        /// New path, e.g. `BLOCKQUOTE>DIV`.
        path: String,
    },
    /// Undo or redo availability changed
    UndoStateChanged {
        /// Can undo
        can_undo: bool,
        /// Can redo
        can_redo: bool,
    },
    /// The document content changed
    Input,
}

/// Subscriber callback type
pub type EventCallback = Box<dyn FnMut(&EditorEvent) + Send>;

/// Command executor
///
/// Owns the editor, its undo history and the event subscribers. Events raised while a
/// command runs are queued and delivered after it finishes, at most one of each kind.
pub struct CommandExecutor {
    /// Editor Core
    editor: EditorCore,
    /// Snapshot history
    undo: UndoManager,
    /// Cleans host markup
    sanitizer: Box<dyn Sanitizer>,
    /// Command history
    command_history: Vec<Command>,
    callbacks: Vec<EventCallback>,
    pending: Vec<EditorEvent>,
    last_path: String,
    last_undo: (bool, bool),
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("editor", &self.editor)
            .field("undo", &self.undo)
            .field("subscribers", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl CommandExecutor {
    /// Create an executor around a new editor. Markup is trusted as is.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_parts(EditorCore::new(config), Box::new(TrustedMarkup))
    }

    /// Create an executor around an existing editor with a custom sanitizer.
    pub fn with_parts(editor: EditorCore, sanitizer: Box<dyn Sanitizer>) -> Self {
        let undo = UndoManager::new(editor.config().undo);
        let last_path = editor.path();
        let last_undo = (undo.can_undo(), undo.can_redo());
        Self {
            editor,
            undo,
            sanitizer,
            command_history: Vec::new(),
            callbacks: Vec::new(),
            pending: Vec::new(),
            last_path,
            last_undo,
        }
    }

    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, EngineError> {
        self.command_history.push(command.clone());

        let result = match command {
            Command::Edit(cmd) => self.execute_edit(cmd),
            Command::Selection(cmd) => self.execute_selection(cmd),
            Command::Block(cmd) => self.execute_block(cmd),
        };

        let result = match result {
            Err(EngineError::EmptyQuery) => Ok(CommandResult::Success),
            Err(err) => {
                self.editor.report(&err, "execute");
                Err(err)
            }
            ok => ok,
        };

        self.queue_path_change();
        self.queue_undo_state_change();
        self.flush_events();
        result
    }

    /// Batch execute commands, stopping at the first error
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, EngineError> {
        let mut results = Vec::new();

        for command in commands {
            let result = self.execute(command)?;
            results.push(result);
        }

        Ok(results)
    }

    /// Register a callback for [`EditorEvent`]s
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&EditorEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Tell the executor that the host changed the document directly, e.g. by typing into
    /// a text node through [`EditorCore::document_mut`].
    pub fn mark_changed(&mut self) {
        self.note_change();
        self.queue_path_change();
        self.queue_undo_state_change();
        self.flush_events();
    }

    /// Get command history
    pub fn get_command_history(&self) -> &[Command] {
        &self.command_history
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    /// Whether the document sits on a recorded checkpoint
    pub fn is_clean(&self) -> bool {
        self.undo.state() == UndoState::Clean
    }

    /// Undo/redo summary
    pub fn undo_status(&self) -> UndoRedoState {
        self.undo.status()
    }

    /// Get a reference to the Editor Core
    pub fn editor(&self) -> &EditorCore {
        &self.editor
    }

    /// Get a mutable reference to the Editor Core
    pub fn editor_mut(&mut self) -> &mut EditorCore {
        &mut self.editor
    }

    fn execute_edit(&mut self, command: EditCommand) -> Result<CommandResult, EngineError> {
        match command {
            EditCommand::SetHtml { html } => {
                let frag = self.sanitizer.sanitize(self.editor.document_mut(), &html)?;
                self.editor.set_content(frag)?;
                self.undo.reset();
                self.checkpoint()?;
                self.queue_input();
                Ok(CommandResult::Success)
            }
            EditCommand::InsertHtml { html } => self.mutate(|this| {
                let frag = this.sanitizer.sanitize(this.editor.document_mut(), &html)?;
                this.editor.insert_fragment(frag)?;
                Ok(CommandResult::Success)
            }),
            EditCommand::InsertPlainText { text } => self.mutate(|this| {
                this.editor.insert_plain_text(&text)?;
                Ok(CommandResult::Success)
            }),
            EditCommand::InsertElement { tag, attributes } => self.mutate(|this| {
                let attributes: Attributes = attributes.into_iter().collect();
                let element = this
                    .editor
                    .document_mut()
                    .create_element_with(&tag, attributes);
                this.editor.insert_element(element)?;
                Ok(CommandResult::Node(element))
            }),
            EditCommand::DeleteSelection => self.mutate(|this| {
                let frag = this.editor.delete_selection()?;
                Ok(CommandResult::Fragment(frag))
            }),
            EditCommand::ExtractSelection => self.mutate(|this| {
                let frag = this.editor.extract_selection()?;
                Ok(CommandResult::Fragment(frag))
            }),
            EditCommand::SaveUndoState => {
                self.editor.remove_zero_width_fillers()?;
                self.checkpoint()?;
                Ok(CommandResult::Success)
            }
            EditCommand::Undo => {
                let editor = &mut self.editor;
                if let Some(html) = self.undo.undo(|| editor.snapshot())? {
                    self.editor.restore_snapshot(&html)?;
                    self.queue_input();
                }
                Ok(CommandResult::Success)
            }
            EditCommand::Redo => {
                if let Some(html) = self.undo.redo() {
                    self.editor.restore_snapshot(&html)?;
                    self.queue_input();
                }
                Ok(CommandResult::Success)
            }
        }
    }

    fn execute_selection(
        &mut self,
        command: SelectionCommand,
    ) -> Result<CommandResult, EngineError> {
        match command {
            SelectionCommand::Set(range) => self.editor.set_selection(range),
            SelectionCommand::MoveToDocumentStart => self.editor.move_cursor_to_start()?,
            SelectionCommand::MoveToDocumentEnd => self.editor.move_cursor_to_end()?,
            SelectionCommand::ExpandToBlockBoundaries => {
                self.editor.expand_selection_to_blocks()?
            }
        }
        Ok(CommandResult::Success)
    }

    fn execute_block(&mut self, command: BlockCommand) -> Result<CommandResult, EngineError> {
        self.mutate(|this| {
            match command {
                BlockCommand::IncreaseQuoteLevel => this.editor.increase_quote_level()?,
                BlockCommand::DecreaseQuoteLevel => this.editor.decrease_quote_level()?,
            }
            Ok(CommandResult::Success)
        })
    }

    /// Checkpoint, run `edit`, then mark the document changed unless there was nothing to
    /// do.
    fn mutate<F>(&mut self, edit: F) -> Result<CommandResult, EngineError>
    where
        F: FnOnce(&mut Self) -> Result<CommandResult, EngineError>,
    {
        self.editor.remove_zero_width_fillers()?;
        self.checkpoint()?;
        let result = edit(self);
        if !matches!(result, Err(EngineError::EmptyQuery)) {
            self.note_change();
        }
        result
    }

    fn checkpoint(&mut self) -> Result<(), EngineError> {
        let replace = self.undo.state() == UndoState::Clean;
        let editor = &mut self.editor;
        if self.undo.record(replace, || editor.snapshot())? {
            debug!(index = self.undo.index(), replace, "checkpoint");
        }
        Ok(())
    }

    fn note_change(&mut self) {
        self.undo.mark_changed();
        self.queue_input();
    }

    fn queue_input(&mut self) {
        if !self.pending.contains(&EditorEvent::Input) {
            self.pending.push(EditorEvent::Input);
        }
    }

    fn queue_path_change(&mut self) {
        let path = self.editor.path();
        if path != self.last_path {
            self.last_path = path.clone();
            self.pending.push(EditorEvent::PathChanged { path });
        }
    }

    fn queue_undo_state_change(&mut self) {
        let state = (self.undo.can_undo(), self.undo.can_redo());
        if state != self.last_undo {
            self.last_undo = state;
            self.pending.push(EditorEvent::UndoStateChanged {
                can_undo: state.0,
                can_redo: state.1,
            });
        }
    }

    fn flush_events(&mut self) {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            for callback in &mut self.callbacks {
                callback(event);
            }
        }
    }
}
