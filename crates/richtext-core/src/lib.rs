#![warn(missing_docs)]
//! Richtext Core - Headless Rich-Text Editing Engine
//!
//! # Overview
//!
//! `richtext-core` is the structural half of a WYSIWYG editor: it owns an HTML-shaped node
//! tree and keeps it valid while a host edits it. It does no rendering, input handling or
//! sanitizing; the host renders the tree, maps user input onto [`Range`]s and feeds markup in
//! through a [`Sanitizer`].
//!
//! # Core Features
//!
//! - **Arena Tree**: generational [`NodeId`] handles, memoized block/inline classification
//! - **Tree Surgery**: split up to a stop ancestor, merge alike inlines, blocks and containers
//! - **Cursor Fillers**: empty blocks and inlines always keep a caret position
//! - **Range Engine**: extract, delete and insert fragments across block boundaries
//! - **Snapshot Undo**: markup snapshots with an embedded selection bookmark
//! - **Notifications**: path, undo state and input events for subscribers
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface & Undo History           │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  EditorCore (selection, block edits)        │  ← Editing Surface
//! ├─────────────────────────────────────────────┤
//! │  Range Engine + Bookmarks                   │  ← Selection-Aware Edits
//! ├─────────────────────────────────────────────┤
//! │  Tree Surgery (split / merge / fillers)     │  ← Structural Edits
//! ├─────────────────────────────────────────────┤
//! │  Classification + Tree Walker               │  ← Node Queries
//! ├─────────────────────────────────────────────┤
//! │  Node Arena (Document)                      │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Using Command Interface
//!
//! ```rust
//! use richtext_core::{Command, CommandExecutor, EditCommand, EditorConfig, SelectionCommand};
//!
//! let mut executor = CommandExecutor::new(EditorConfig::default());
//!
//! executor.execute(Command::Edit(EditCommand::SetHtml {
//!     html: "<div>Hello</div>".to_string(),
//! })).unwrap();
//! executor.execute(Command::Selection(SelectionCommand::MoveToDocumentEnd)).unwrap();
//! executor.execute(Command::Edit(EditCommand::InsertHtml {
//!     html: "<div>, world</div>".to_string(),
//! })).unwrap();
//!
//! assert_eq!(executor.editor().html(), "<div>Hello, world</div>");
//! ```
//!
//! ## Using Tree Surgery Directly
//!
//! ```rust
//! use richtext_core::{Document, EditContext, EditorConfig, SilentReporter, parse_fragment, serialize_children};
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("div");
//! let frag = parse_fragment(&mut doc, "<div>abcd</div>").unwrap();
//! doc.append_child(root, frag).unwrap();
//!
//! let block = doc.first_child(root).unwrap();
//! let text = doc.first_child(block).unwrap();
//! let config = EditorConfig::default();
//! let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
//! ctx.split(text, 2, root).unwrap();
//!
//! assert_eq!(serialize_children(&doc, root), "<div>ab</div><div>cd</div>");
//! ```
//!
//! # Module Description
//!
//! - [`node`] - Node arena and primitive mutations
//! - [`classify`] - Inline / block / container / leaf classification
//! - [`walker`] - Filtered tree walker
//! - [`range`] - Boundary points and ranges
//! - [`surgery`] - Split, merge and cursor fillers
//! - [`range_ops`] - Block-aware range operations
//! - [`bookmark`] - Selection bookmarks
//! - [`markup`] - Snapshot markup reader and writer
//! - [`undo`] - Snapshot undo history
//! - [`editor`] - Editor state and high-level edits
//! - [`commands`] - Unified command interface
//!
//! # Logging
//!
//! The crate logs through `tracing` and installs no subscriber.

pub mod bookmark;
pub mod classify;
pub mod commands;
pub mod config;
mod context;
pub mod editor;
pub mod error;
pub mod markup;
pub mod node;
pub mod range;
pub mod range_ops;
pub mod surgery;
pub mod undo;
pub mod walker;

pub use bookmark::{END_SELECTION_ID, START_SELECTION_ID};
pub use classify::NodeCategory;
pub use commands::{
    BlockCommand, Command, CommandExecutor, CommandResult, EditCommand, EditorEvent,
    EventCallback, SelectionCommand,
};
pub use config::{BlockFiller, EditorConfig, FillerConfig, InlineFiller, UndoConfig};
pub use context::EditContext;
pub use editor::EditorCore;
pub use error::{EngineError, ErrorKind, ErrorReporter, SilentReporter, TracingReporter};
pub use markup::{Sanitizer, TrustedMarkup, parse_fragment, serialize, serialize_children};
pub use node::{Attributes, Document, ElementData, NodeData, NodeId};
pub use range::{BoundaryPair, BoundaryPoint, Range};
pub use richtext_core_schema::TagSchema;
pub use surgery::ZWS;
pub use undo::{UndoManager, UndoRedoState, UndoState};
pub use walker::{Show, TreeWalker};
