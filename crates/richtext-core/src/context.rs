//! Editing context shared by tree surgery and range operations.

use crate::config::EditorConfig;
use crate::error::{EngineError, ErrorReporter};
use crate::node::{Document, NodeId};

/// Mutable view of one editable tree.
///
/// Tree surgery ([`split`](EditContext::split), [`fix_cursor`](EditContext::fix_cursor), ...)
/// and range operations ([`extract_contents_of_range`](EditContext::extract_contents_of_range),
/// ...) are methods on this type. `root` is the editing host: operations never climb above it.
pub struct EditContext<'a> {
    /// Arena holding the tree.
    pub doc: &'a mut Document,
    /// Editing host.
    pub root: NodeId,
    /// Default block and filler settings.
    pub config: &'a EditorConfig,
    /// Sink for recoverable errors.
    pub reporter: &'a dyn ErrorReporter,
}

impl<'a> EditContext<'a> {
    /// Bundle the pieces of an editing context.
    pub fn new(
        doc: &'a mut Document,
        root: NodeId,
        config: &'a EditorConfig,
        reporter: &'a dyn ErrorReporter,
    ) -> Self {
        Self {
            doc,
            root,
            config,
            reporter,
        }
    }

    /// New, empty default block without filler.
    pub(crate) fn create_block_element(&mut self) -> NodeId {
        let attributes = self.config.block_attributes();
        self.doc
            .create_element_with(&self.config.block_tag, attributes)
    }

    /// New default block, made focusable.
    pub fn create_default_block(&mut self) -> Result<NodeId, EngineError> {
        let block = self.create_block_element();
        self.fix_cursor(block)
    }

    /// Report a recoverable error and keep going.
    pub(crate) fn report(&self, err: &EngineError, context: &str) {
        self.reporter.report(err.kind(), &format!("{context}: {err}"));
    }
}
