//! Editor core state.
//!
//! [`EditorCore`] owns one document arena, its editing root and the current selection. Its
//! methods are the high-level edits a host issues (insert markup, insert an element, delete
//! the selection, restructure blocks); each one keeps the tree valid and leaves the selection
//! where the cursor belongs afterwards. Undo history and notifications live one level up in
//! [`CommandExecutor`](crate::CommandExecutor).

use crate::config::EditorConfig;
use crate::context::EditContext;
use crate::error::{EngineError, ErrorKind, ErrorReporter, TracingReporter};
use crate::markup::{parse_fragment, serialize_children};
use crate::node::{Document, NodeId};
use crate::range::Range;
use crate::surgery::ZWS;
use tracing::{debug, warn};

/// Headless rich-text editor state.
///
/// # Example
///
/// ```rust
/// use richtext_core::{EditorConfig, EditorCore};
///
/// let mut editor = EditorCore::new(EditorConfig::default());
/// editor.set_html("<div>Hello</div>").unwrap();
/// editor.move_cursor_to_end().unwrap();
/// editor.increase_quote_level().unwrap();
/// assert!(editor.html().starts_with("<blockquote><div>Hello</div></blockquote>"));
/// ```
pub struct EditorCore {
    doc: Document,
    root: NodeId,
    config: EditorConfig,
    selection: Range,
    reporter: Box<dyn ErrorReporter>,
}

impl std::fmt::Debug for EditorCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorCore")
            .field("root", &self.root)
            .field("selection", &self.selection)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EditorCore {
    /// Create an editor holding a single empty default block. Errors are logged via `tracing`.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_reporter(config, Box::new(TracingReporter))
    }

    /// Create an editor with a custom error reporter.
    pub fn with_reporter(config: EditorConfig, reporter: Box<dyn ErrorReporter>) -> Self {
        let mut doc = Document::with_schema(config.schema.clone());
        let root = doc.create_element("div");
        let mut editor = Self {
            doc,
            root,
            config,
            selection: Range::collapsed_at(root, 0),
            reporter,
        };
        if let Err(err) = editor.edit(|ctx, _| {
            let root = ctx.root;
            ctx.fix_cursor(root).map(drop)
        }) {
            editor.report(&err, "new");
        }
        editor.selection = editor.default_range();
        editor
    }

    /// Get the document arena
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Get the document arena mutably, e.g. to apply typed text. Call
    /// [`CommandExecutor::mark_changed`](crate::CommandExecutor::mark_changed) afterwards.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Editing root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current selection
    pub fn selection(&self) -> Range {
        self.selection
    }

    /// Replace the selection. A range outside the document falls back to the start of the
    /// first block.
    pub fn set_selection(&mut self, range: Range) {
        self.selection = range;
        self.valid_selection();
    }

    pub(crate) fn report(&self, err: &EngineError, context: &str) {
        self.reporter.report(err.kind(), &format!("{context}: {err}"));
    }

    fn default_range(&self) -> Range {
        let first = self.doc.first_child(self.root).unwrap_or(self.root);
        Range::collapsed_at(first, 0)
    }

    fn valid_selection(&mut self) -> Range {
        if !self.selection.is_within(&self.doc, self.root) {
            warn!(selection = ?self.selection, "selection is outside the document, resetting");
            self.reporter
                .report(ErrorKind::RangeNotInDocument, "selection reset to document start");
            self.selection = self.default_range();
        }
        self.selection
    }

    /// Run `f` against an editing context and the (validated) selection.
    fn edit<R, F>(&mut self, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut EditContext<'_>, &mut Range) -> Result<R, EngineError>,
    {
        self.valid_selection();
        let mut ctx = EditContext::new(
            &mut self.doc,
            self.root,
            &self.config,
            self.reporter.as_ref(),
        );
        f(&mut ctx, &mut self.selection)
    }

    // ---- content ----------------------------------------------------------------------------

    /// Content markup without zero-width fillers.
    pub fn html(&self) -> String {
        serialize_children(&self.doc, self.root).replace(ZWS, "")
    }

    /// Content markup with the selection embedded as a bookmark. The live tree is left
    /// unchanged.
    pub fn snapshot(&mut self) -> Result<String, EngineError> {
        self.edit(|ctx, range| {
            ctx.save_range_to_bookmark(range)?;
            let html = serialize_children(ctx.doc, ctx.root);
            if let Some(restored) = ctx.restore_range_from_bookmark()? {
                *range = restored;
            }
            Ok(html)
        })
    }

    /// Replace the content with a snapshot taken by [`snapshot`](Self::snapshot) and select
    /// its bookmark.
    pub fn restore_snapshot(&mut self, html: &str) -> Result<(), EngineError> {
        let frag = parse_fragment(&mut self.doc, html)?;
        self.edit(|ctx, range| {
            let root = ctx.root;
            let old = ctx.doc.take_children(root)?;
            ctx.doc.discard(old);
            ctx.doc.append_child(root, frag)?;
            ctx.doc.discard(frag);

            let mut node = root;
            loop {
                ctx.fix_cursor(node)?;
                match ctx.doc.next_block(node, root) {
                    Some(block) => node = block,
                    None => break,
                }
            }

            let first = ctx.doc.first_child(root).unwrap_or(root);
            *range = ctx
                .restore_range_from_bookmark()?
                .unwrap_or_else(|| Range::collapsed_at(first, 0));
            Ok(())
        })?;
        debug!(bytes = html.len(), "snapshot restored");
        Ok(())
    }

    /// Replace the whole content with `frag`, which must already be sanitized.
    ///
    /// Redundant line breaks are removed, stray inline content is wrapped in default blocks
    /// and empty blocks get filler. A bookmark inside the fragment becomes the selection;
    /// otherwise the cursor goes to the start of the first block.
    pub fn set_content(&mut self, frag: NodeId) -> Result<(), EngineError> {
        self.edit(|ctx, range| {
            ctx.cleanup_line_breaks(frag, false)?;
            ctx.fix_container(frag)?;
            let mut node = frag;
            while let Some(block) = ctx.doc.next_block(node, frag) {
                ctx.fix_cursor(block)?;
                node = block;
            }

            let root = ctx.root;
            let old = ctx.doc.take_children(root)?;
            ctx.doc.discard(old);
            ctx.doc.append_child(root, frag)?;
            ctx.doc.discard(frag);
            ctx.fix_cursor(root)?;

            let first = ctx.doc.first_child(root).unwrap_or(root);
            *range = ctx
                .restore_range_from_bookmark()?
                .unwrap_or_else(|| Range::collapsed_at(first, 0));
            Ok(())
        })
    }

    /// Replace the whole content with trusted markup.
    pub fn set_html(&mut self, html: &str) -> Result<(), EngineError> {
        let frag = parse_fragment(&mut self.doc, html)?;
        self.set_content(frag)
    }

    /// Free every node that is neither in the document nor below one of `keep`.
    pub fn collect_garbage(&mut self, keep: &[NodeId]) {
        let mut live = Vec::with_capacity(keep.len() + 1);
        live.push(self.root);
        live.extend_from_slice(keep);
        self.doc.sweep(&live);
    }

    /// Element path of the selection, or `(selection)` when it spans several containers.
    pub fn path(&self) -> String {
        let start = self.selection.start().container;
        if start == self.selection.end().container {
            self.doc.path(start, self.root)
        } else {
            "(selection)".to_string()
        }
    }

    /// Strip zero-width fillers added since the last call.
    pub fn remove_zero_width_fillers(&mut self) -> Result<(), EngineError> {
        if !self.doc.has_zero_width_filler() {
            return Ok(());
        }
        self.edit(|ctx, _| {
            let root = ctx.root;
            ctx.remove_zero_width_fillers(root, None)
        })?;
        self.doc.clear_zero_width_filler_flag();
        Ok(())
    }

    /// Make sure the document ends with a default block the cursor can reach.
    pub fn ensure_bottom_line(&mut self) -> Result<(), EngineError> {
        self.edit(|ctx, _| {
            let root = ctx.root;
            let last = ctx.doc.last_element_child(root);
            let is_default_block = last.is_some_and(|l| {
                ctx.doc.has_tag(l, &ctx.config.block_tag) && ctx.doc.is_block(l)
            });
            if !is_default_block {
                let block = ctx.create_default_block()?;
                ctx.doc.append_child(root, block)?;
            }
            Ok(())
        })
    }

    // ---- selection --------------------------------------------------------------------------

    fn move_cursor_to(&mut self, to_start: bool) -> Result<(), EngineError> {
        self.edit(|ctx, range| {
            let root = ctx.root;
            let offset = if to_start { 0 } else { ctx.doc.length(root) };
            *range = Range::collapsed_at(root, offset);
            ctx.move_range_boundaries_down_tree(range)?;
            range.collapse(true);
            Ok(())
        })
    }

    /// Collapse the selection at the start of the document.
    pub fn move_cursor_to_start(&mut self) -> Result<(), EngineError> {
        self.move_cursor_to(true)
    }

    /// Collapse the selection at the end of the document.
    pub fn move_cursor_to_end(&mut self) -> Result<(), EngineError> {
        self.move_cursor_to(false)
    }

    /// Grow the selection to whole blocks.
    pub fn expand_selection_to_blocks(&mut self) -> Result<(), EngineError> {
        self.edit(|ctx, range| ctx.expand_range_to_block_boundaries(range))
    }

    // ---- edits ------------------------------------------------------------------------------

    /// Insert a detached element at the start of the selection.
    ///
    /// Inline elements go in at the cursor, which moves after them. Anything else is placed
    /// between blocks: the document is split up to the root after the cursor block (a default
    /// block is appended when the element ends up last) and the cursor moves to the block
    /// after the element.
    pub fn insert_element(&mut self, element: NodeId) -> Result<(), EngineError> {
        self.edit(|ctx, range| {
            range.collapse(true);
            if ctx.doc.is_inline(element) {
                ctx.insert_node_in_range(range, element)?;
                range.set_start_after(ctx.doc, element)?;
                range.collapse(true);
                return Ok(());
            }

            let root = ctx.root;
            let mut split_node = ctx.get_start_block_of_range(range).unwrap_or(root);
            while split_node != root && ctx.doc.next_sibling(split_node).is_none() {
                match ctx.doc.parent(split_node) {
                    Some(parent) => split_node = parent,
                    None => break,
                }
            }
            let mut node_after_split = None;
            if split_node != root
                && let Some(parent) = ctx.doc.parent(split_node)
            {
                let offset = ctx.doc.index_of(split_node).unwrap_or(0) + 1;
                node_after_split = ctx.split(parent, offset, root)?;
            }
            let after = match node_after_split {
                Some(after) => {
                    ctx.doc.insert_before(root, element, Some(after))?;
                    after
                }
                None => {
                    ctx.doc.append_child(root, element)?;
                    let block = ctx.create_default_block()?;
                    ctx.doc.append_child(root, block)?;
                    block
                }
            };
            *range = Range::collapsed_at(after, 0);
            ctx.move_range_boundaries_down_tree(range)
        })
    }

    /// Insert a sanitized fragment at the selection, replacing selected content. The cursor
    /// ends up after the inserted content.
    pub fn insert_fragment(&mut self, frag: NodeId) -> Result<(), EngineError> {
        if self.doc.length(frag) == 0 {
            self.doc.discard(frag);
            return Err(EngineError::EmptyQuery);
        }
        self.edit(|ctx, range| {
            ctx.cleanup_line_breaks(frag, false)?;
            let mut node = frag;
            while let Some(block) = ctx.doc.next_block(node, frag) {
                ctx.fix_cursor(block)?;
                node = block;
            }
            ctx.insert_tree_fragment_into_range(range, frag)?;
            range.collapse(false);
            Ok(())
        })?;
        self.ensure_bottom_line()
    }

    /// Insert trusted markup at the selection.
    pub fn insert_html(&mut self, html: &str) -> Result<(), EngineError> {
        let frag = parse_fragment(&mut self.doc, html)?;
        self.insert_fragment(frag)
    }

    /// Insert plain text, one default block per line. Runs of spaces keep their width.
    pub fn insert_plain_text(&mut self, text: &str) -> Result<(), EngineError> {
        let frag = self.doc.create_fragment();
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let block = self.edit(|ctx, _| Ok(ctx.create_block_element()))?;
            if line.is_empty() {
                let br = self.doc.create_element("br");
                self.doc.append_child(block, br)?;
            } else {
                let mut data = String::with_capacity(line.len());
                let mut chars = line.chars().peekable();
                while let Some(c) = chars.next() {
                    // A space followed by another space would collapse when rendered.
                    if c == ' ' && chars.peek() == Some(&' ') {
                        data.push('\u{a0}');
                    } else {
                        data.push(c);
                    }
                }
                let node = self.doc.create_text(data);
                self.doc.append_child(block, node)?;
            }
            self.doc.append_child(frag, block)?;
        }
        self.insert_fragment(frag)
    }

    /// Delete the selected content and return it as a fragment.
    pub fn delete_selection(&mut self) -> Result<NodeId, EngineError> {
        self.edit(|ctx, range| ctx.delete_contents_of_range(range))
    }

    /// Move the selected content into a fragment without merging the blocks around it.
    pub fn extract_selection(&mut self) -> Result<NodeId, EngineError> {
        self.edit(|ctx, range| ctx.extract_contents_of_range(range, None))
    }

    /// Pull the blocks touched by the selection out of the document, let `modify` rebuild
    /// them, and put the result back in their place.
    ///
    /// `modify` receives a fragment holding the whole blocks and returns the node (or
    /// fragment) to insert. Containers are merged with their neighbours at both edges and
    /// the selection is preserved through a bookmark.
    pub fn modify_blocks<F>(&mut self, modify: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut EditContext<'_>, NodeId) -> Result<NodeId, EngineError>,
    {
        self.edit(|ctx, range| {
            let root = ctx.root;
            ctx.save_range_to_bookmark(range)?;

            ctx.expand_range_to_block_boundaries(range)?;
            ctx.move_range_boundaries_up_tree(range, Some(root), Some(root))?;
            let frag = ctx.extract_contents_of_range(range, Some(root))?;

            let replacement = modify(ctx, frag)?;
            ctx.insert_node_in_range(range, replacement)?;
            if ctx.doc.is_fragment(replacement) {
                ctx.doc.discard(replacement);
            }
            if replacement != frag && ctx.doc.is_alive(frag) && ctx.doc.length(frag) == 0 {
                ctx.doc.discard(frag);
            }

            let end = range.end();
            if let Some(after) = ctx.doc.child(end.container, end.offset) {
                ctx.merge_containers(after)?;
            }
            let start = range.start();
            if let Some(first) = ctx.doc.child(start.container, start.offset) {
                ctx.merge_containers(first)?;
            }

            if let Some(restored) = ctx.restore_range_from_bookmark()? {
                *range = restored;
            }
            Ok(())
        })
    }

    /// Wrap the selected blocks in a blockquote.
    pub fn increase_quote_level(&mut self) -> Result<(), EngineError> {
        self.modify_blocks(|ctx, frag| {
            let quote = ctx.doc.create_element("blockquote");
            ctx.doc.append_child(quote, frag)?;
            ctx.doc.discard(frag);
            Ok(quote)
        })
    }

    /// Remove the outermost blockquote around the selected blocks.
    pub fn decrease_quote_level(&mut self) -> Result<(), EngineError> {
        self.modify_blocks(|ctx, frag| {
            let outermost: Vec<NodeId> = ctx
                .doc
                .descendants(frag)
                .into_iter()
                .filter(|&n| ctx.doc.has_tag(n, "blockquote"))
                .filter(|&n| {
                    ctx.doc
                        .parent(n)
                        .is_some_and(|p| ctx.doc.nearest(p, frag, "blockquote", &[]).is_none())
                })
                .collect();
            for quote in outermost {
                let contents = ctx.doc.take_children(quote)?;
                ctx.doc.replace_child(quote, contents)?;
                ctx.doc.discard(contents);
                ctx.doc.discard(quote);
            }
            Ok(frag)
        })
    }
}
