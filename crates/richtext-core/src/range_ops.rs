//! Block-aware range operations.
//!
//! Every mutating operation leaves its [`Range`] at a valid, minimal position describing where
//! the cursor conceptually ends up after the edit.

use crate::context::EditContext;
use crate::error::EngineError;
use crate::node::{Document, NodeId};
use crate::range::{BoundaryPoint, Range};
use crate::surgery::has_non_whitespace;
use crate::walker::{Show, TreeWalker};

/// Walker over visible content: non-whitespace text and images.
fn content_walker(root: NodeId) -> TreeWalker<'static> {
    TreeWalker::new(root, Show::TEXT | Show::ELEMENT, |d: &Document, n| {
        match d.text(n) {
            Some(text) => has_non_whitespace(text),
            None => d.has_tag(n, "img"),
        }
    })
}

impl Document {
    /// Deepest last node before the point `(node, offset)`, or `node` itself at offset 0.
    pub fn node_before(&self, node: NodeId, offset: usize) -> NodeId {
        let mut node = node;
        let mut offset = offset;
        while offset > 0 && self.is_element(node) {
            match self.child(node, offset - 1) {
                Some(child) => {
                    node = child;
                    offset = self.children(node).len();
                }
                None => break,
            }
        }
        node
    }

    /// Node right after the point `(node, offset)`: the child at `offset`, or the next node
    /// outside `node` when the offset is at its end. Text containers return themselves.
    pub fn node_after(&self, node: NodeId, offset: usize) -> Option<NodeId> {
        if !self.is_element(node) {
            return Some(node);
        }
        if let Some(child) = self.child(node, offset) {
            return Some(child);
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(next) = self.next_sibling(n) {
                return Some(next);
            }
            current = self.parent(n);
        }
        None
    }

    /// Whether `node` lies inside `range`, fully or (with `partial`) overlapping it.
    pub fn is_node_contained_in_range(&self, range: &Range, node: NodeId, partial: bool) -> bool {
        let Some(parent) = self.parent(node) else {
            return false;
        };
        let index = self.index_of(node).unwrap_or(0);
        let node_start = BoundaryPoint::new(parent, index);
        let node_end = BoundaryPoint::new(parent, index + 1);
        let cmp = |a, b| self.compare_points(a, b);

        if partial {
            cmp(range.start(), node_end).is_some_and(|o| o.is_lt())
                && cmp(range.end(), node_start).is_some_and(|o| o.is_gt())
        } else {
            cmp(range.start(), node_start).is_some_and(|o| o.is_le())
                && cmp(range.end(), node_end).is_some_and(|o| o.is_ge())
        }
    }
}

impl EditContext<'_> {
    /// Insert `node` (or the children of a fragment) at the start of `range`, splitting a text
    /// node when needed. The range grows to cover the inserted nodes.
    pub fn insert_node_in_range(&mut self, range: &mut Range, node: NodeId) -> Result<(), EngineError> {
        let BoundaryPoint {
            container: mut start_container,
            offset: mut start_offset,
        } = range.start();
        let BoundaryPoint {
            container: mut end_container,
            offset: mut end_offset,
        } = range.end();
        let collapsed = range.collapsed();

        if self.doc.is_text(start_container) {
            let parent = self.doc.parent(start_container).ok_or_else(|| {
                EngineError::Contract("range starts in a detached text node".to_string())
            })?;
            if start_offset == self.doc.length(start_container) {
                start_offset = self.doc.index_of(start_container).unwrap_or(0) + 1;
                if collapsed {
                    end_container = parent;
                    end_offset = start_offset;
                }
            } else {
                if start_offset > 0 {
                    let after = self.doc.split_text(start_container, start_offset)?;
                    if end_container == start_container {
                        end_offset -= start_offset;
                        end_container = after;
                    } else if end_container == parent {
                        end_offset += 1;
                    }
                    start_container = after;
                }
                start_offset = self.doc.index_of(start_container).unwrap_or(0);
            }
            start_container = parent;
        }

        let child_count = self.doc.length(start_container);
        let reference = self.doc.child(start_container, start_offset);
        self.doc.insert_before(start_container, node, reference)?;

        if start_container == end_container {
            end_offset += self.doc.length(start_container) - child_count;
        }

        range.set_start(self.doc, start_container, start_offset)?;
        range.set_end(self.doc, end_container, end_offset)
    }

    /// Move the contents of `range` into a new fragment.
    ///
    /// Both boundaries are split up to `common` (by default the common ancestor, promoted from
    /// text to its parent). Text nodes meeting at the seam are joined and the range collapses
    /// there.
    pub fn extract_contents_of_range(
        &mut self,
        range: &mut Range,
        common: Option<NodeId>,
    ) -> Result<NodeId, EngineError> {
        let start = range.start();
        let end = range.end();
        let mut common = match common {
            Some(node) => node,
            None => range
                .common_ancestor(self.doc)
                .ok_or(EngineError::RangeNotInDocument)?,
        };
        if self.doc.is_text(common) {
            common = self
                .doc
                .parent(common)
                .ok_or(EngineError::RangeNotInDocument)?;
        }

        let end_node = self.split(end.container, end.offset, common)?;
        let frag = self.doc.create_fragment();
        let mut start_node = self.split(start.container, start.offset, common)?;

        while start_node != end_node {
            let Some(node) = start_node else { break };
            start_node = self.doc.next_sibling(node);
            self.doc.append_child(frag, node)?;
        }

        let mut seam_container = common;
        let mut seam_offset = match end_node {
            Some(node) => self.doc.index_of(node).unwrap_or(0),
            None => self.doc.length(common),
        };

        // Join text nodes meeting at the seam.
        let after = self.doc.child(common, seam_offset);
        let before = after.and_then(|a| self.doc.previous_sibling(a));
        if let (Some(before), Some(after)) = (before, after)
            && self.doc.is_text(before)
            && let Some(text) = self.doc.text(after).map(str::to_owned)
        {
            seam_container = before;
            seam_offset = self.doc.length(before);
            self.doc.append_text(before, &text)?;
            self.doc.discard(after);
        }

        range.set_start(self.doc, seam_container, seam_offset)?;
        range.collapse(true);

        self.fix_cursor(common)?;
        Ok(frag)
    }

    /// Delete the contents of `range`, merging the end block into the start block when the
    /// range spanned several blocks. Returns the removed content.
    pub fn delete_contents_of_range(&mut self, range: &mut Range) -> Result<NodeId, EngineError> {
        let start_block = self.get_start_block_of_range(range);
        let end_block = self.get_end_block_of_range(range);
        let needs_merge = start_block != end_block;

        self.move_range_boundaries_down_tree(range)?;
        self.move_range_boundaries_up_tree(range, start_block, end_block)?;

        let frag = self.extract_contents_of_range(range, None)?;

        self.move_range_boundaries_down_tree(range)?;

        if needs_merge {
            // The end block was split; look it up again.
            let end_block = self.get_end_block_of_range(range);
            if let (Some(start), Some(end)) = (start_block, end_block)
                && start != end
            {
                self.merge_with_block(start, end, range)?;
            }
        }

        if let Some(start) = start_block
            && self.doc.is_alive(start)
        {
            self.fix_cursor(start)?;
        }

        let first = self.doc.first_child(self.root);
        if first.is_none_or(|c| self.doc.has_tag(c, "br")) {
            self.fix_cursor(self.root)?;
            if let Some(block) = self.doc.first_child(self.root) {
                range.select_node_contents(self.doc, block)?;
            }
        } else {
            range.collapse(true);
        }
        Ok(frag)
    }

    /// Insert `frag` at `range`, replacing any selected content.
    ///
    /// The first block of the fragment merges into the block at the cursor (an empty cursor
    /// block is replaced instead, and table or preformatted content never merges). The rest
    /// of the fragment goes in as siblings after splitting up to the nearest blockquote or the
    /// root, containers are merged at both seams, and the inline content that followed the
    /// cursor is re-attached to the last inserted block.
    pub fn insert_tree_fragment_into_range(
        &mut self,
        range: &mut Range,
        frag: NodeId,
    ) -> Result<(), EngineError> {
        // Normalize: no top-level inline content, focusable blocks.
        self.fix_container(frag)?;
        let mut node = frag;
        while let Some(block) = self.doc.next_block(node, frag) {
            self.fix_cursor(block)?;
            node = block;
        }

        if !range.collapsed() {
            let deleted = self.delete_contents_of_range(range)?;
            self.doc.discard(deleted);
        }

        self.move_range_boundaries_down_tree(range)?;
        range.collapse(false);

        let stop_point = self
            .doc
            .nearest(range.end().container, self.root, "blockquote", &[])
            .unwrap_or(self.root);

        let mut block = self.get_start_block_of_range(range);
        let first_block_in_frag = self.doc.next_block(frag, frag);
        let replace_block = block.is_some_and(|b| self.doc.is_empty_block(b));
        let mut contents_after_split = None;

        if let (Some(cursor_block), Some(first_block)) = (block, first_block_in_frag)
            && !replace_block
            && self.doc.nearest(first_block, frag, "pre", &[]).is_none()
            && self.doc.nearest(first_block, frag, "table", &[]).is_none()
        {
            self.move_range_boundaries_up_tree(range, Some(cursor_block), Some(cursor_block))?;
            range.collapse(true);
            let mut container = range.end().container;
            let mut offset = range.end().offset;
            // A trailing break must not be carried over as content.
            self.cleanup_line_breaks(cursor_block, false)?;
            offset = offset.min(self.doc.length(container));

            if self.doc.is_inline(container) {
                let split_stop = self
                    .doc
                    .previous_block(container, self.root)
                    .ok_or_else(|| {
                        EngineError::StructuralInvariant("inline content outside a block".to_string())
                    })?;
                match self.split(container, offset, split_stop)? {
                    Some(after) => {
                        container = self
                            .doc
                            .parent(after)
                            .ok_or(EngineError::RangeNotInDocument)?;
                        offset = self.doc.index_of(after).unwrap_or(0);
                    }
                    None => {
                        container = split_stop;
                        offset = self.doc.length(split_stop);
                    }
                }
            }

            if offset != self.doc.length(container) {
                let saved = self.doc.create_fragment();
                while let Some(child) = self.doc.child(container, offset) {
                    self.doc.append_child(saved, child)?;
                }
                contents_after_split = Some(saved);
            }

            self.merge_with_block(container, first_block, range)?;

            let parent = self
                .doc
                .parent(container)
                .ok_or(EngineError::RangeNotInDocument)?;
            let offset = self.doc.index_of(container).unwrap_or(0) + 1;
            range.set_end(self.doc, parent, offset)?;
        }

        if self.doc.length(frag) > 0 {
            if replace_block && let Some(empty) = block {
                range.set_end_before(self.doc, empty)?;
                range.collapse(false);
                self.doc.discard(empty);
            }
            self.move_range_boundaries_up_tree(range, Some(stop_point), Some(stop_point))?;

            let end = range.end();
            let node_after_split = self.split(end.container, end.offset, stop_point)?;
            let node_before_split = match node_after_split {
                Some(after) => self.doc.previous_sibling(after),
                None => self.doc.last_child(stop_point),
            };
            self.doc.insert_before(stop_point, frag, node_after_split)?;
            match node_after_split {
                Some(after) => range.set_end_before(self.doc, after)?,
                None => {
                    let length = self.doc.length(stop_point);
                    range.set_end(self.doc, stop_point, length)?;
                }
            }
            block = self.get_end_block_of_range(range);

            // Resolve to a point that survives the container merges below.
            self.move_range_boundaries_down_tree(range)?;
            let end = range.end();

            if let Some(after) = node_after_split
                && self.doc.is_container(after)
            {
                self.merge_containers(after)?;
            }
            let after = node_before_split.and_then(|b| self.doc.next_sibling(b));
            if let Some(after) = after
                && self.doc.is_container(after)
            {
                self.merge_containers(after)?;
            }
            range.set_end(self.doc, end.container, end.offset)?;
        }

        if let Some(saved) = contents_after_split {
            match block.filter(|&b| self.doc.is_alive(b)) {
                Some(last_block) => {
                    let mut temp = *range;
                    self.merge_with_block(last_block, saved, &mut temp)?;
                    range.set_end(self.doc, temp.end().container, temp.end().offset)?;
                }
                None => {
                    let err = EngineError::StructuralInvariant(
                        "no block to receive the content after the cursor".to_string(),
                    );
                    self.report(&err, "insert_tree_fragment_into_range");
                    self.doc.discard(saved);
                }
            }
        }
        self.doc.discard(frag);
        self.move_range_boundaries_down_tree(range)
    }

    /// Push both boundaries down toward text positions without entering leaves.
    ///
    /// The end may skip one trailing line break. On a collapsed range the two computed points
    /// are assigned crosswise: the start gets the end-side position and the end gets the
    /// start-side one.
    pub fn move_range_boundaries_down_tree(&mut self, range: &mut Range) -> Result<(), EngineError> {
        let BoundaryPoint {
            container: mut start_container,
            offset: mut start_offset,
        } = range.start();
        let BoundaryPoint {
            container: mut end_container,
            offset: mut end_offset,
        } = range.end();
        let mut may_skip_br = true;

        while !self.doc.is_text(start_container) {
            match self.doc.child(start_container, start_offset) {
                Some(child) if !self.doc.is_leaf(child) => {
                    start_container = child;
                    start_offset = 0;
                }
                _ => break,
            }
        }

        if end_offset > 0 {
            while !self.doc.is_text(end_container) {
                let child = end_offset
                    .checked_sub(1)
                    .and_then(|i| self.doc.child(end_container, i));
                match child {
                    Some(child) if !self.doc.is_leaf(child) => {
                        end_container = child;
                        end_offset = self.doc.length(child);
                    }
                    Some(child) if may_skip_br && self.doc.has_tag(child, "br") => {
                        end_offset -= 1;
                        may_skip_br = false;
                    }
                    _ => break,
                }
            }
        } else {
            while !self.doc.is_text(end_container) {
                match self.doc.first_child(end_container) {
                    Some(child) if !self.doc.is_leaf(child) => end_container = child,
                    _ => break,
                }
            }
        }

        if range.collapsed() {
            range.set_start(self.doc, end_container, end_offset)?;
            range.set_end(self.doc, start_container, start_offset)
        } else {
            range.set_start(self.doc, start_container, start_offset)?;
            range.set_end(self.doc, end_container, end_offset)
        }
    }

    /// Pull the start up while it sits at offset 0 and the end up while it sits at the end of
    /// its container, stopping at `start_max` / `end_max` (default: the common ancestor) or the
    /// root. The end may step over one line break.
    pub fn move_range_boundaries_up_tree(
        &mut self,
        range: &mut Range,
        start_max: Option<NodeId>,
        end_max: Option<NodeId>,
    ) -> Result<(), EngineError> {
        let BoundaryPoint {
            container: mut start_container,
            offset: mut start_offset,
        } = range.start();
        let BoundaryPoint {
            container: mut end_container,
            offset: mut end_offset,
        } = range.end();
        let mut may_skip_br = true;

        let start_max = match start_max {
            Some(node) => node,
            None => range
                .common_ancestor(self.doc)
                .ok_or(EngineError::RangeNotInDocument)?,
        };
        let end_max = end_max.unwrap_or(start_max);

        while start_offset == 0 && start_container != start_max && start_container != self.root {
            let Some(parent) = self.doc.parent(start_container) else {
                break;
            };
            start_offset = self.doc.index_of(start_container).unwrap_or(0);
            start_container = parent;
        }

        loop {
            if may_skip_br
                && !self.doc.is_text(end_container)
                && self
                    .doc
                    .child(end_container, end_offset)
                    .is_some_and(|c| self.doc.has_tag(c, "br"))
            {
                end_offset += 1;
                may_skip_br = false;
            }
            if end_container == end_max
                || end_container == self.root
                || end_offset != self.doc.length(end_container)
            {
                break;
            }
            let Some(parent) = self.doc.parent(end_container) else {
                break;
            };
            end_offset = self.doc.index_of(end_container).unwrap_or(0) + 1;
            end_container = parent;
        }

        range.set_start(self.doc, start_container, start_offset)?;
        range.set_end(self.doc, end_container, end_offset)
    }

    /// First block at least partially inside `range`.
    pub fn get_start_block_of_range(&self, range: &Range) -> Option<NodeId> {
        let container = range.start().container;
        let block = if self.doc.is_inline(container) {
            self.doc.previous_block(container, self.root)
        } else if container != self.root && self.doc.is_block(container) {
            Some(container)
        } else {
            let before = self.doc.node_before(container, range.start().offset);
            self.doc.next_block(before, self.root)
        };
        block.filter(|&b| self.doc.is_node_contained_in_range(range, b, true))
    }

    /// Last block at least partially inside `range`.
    pub fn get_end_block_of_range(&self, range: &Range) -> Option<NodeId> {
        let container = range.end().container;
        let block = if self.doc.is_inline(container) {
            self.doc.previous_block(container, self.root)
        } else if container != self.root && self.doc.is_block(container) {
            Some(container)
        } else {
            let after = self
                .doc
                .node_after(container, range.end().offset)
                .filter(|&n| self.doc.contains(self.root, n));
            let node = match after {
                Some(node) => node,
                None => {
                    let mut node = self.root;
                    while let Some(last) = self.doc.last_child(node) {
                        node = last;
                    }
                    node
                }
            };
            self.doc.previous_block(node, self.root)
        };
        block.filter(|&b| self.doc.is_node_contained_in_range(range, b, true))
    }

    /// Whether no visible content precedes the start of `range` inside its block.
    pub fn range_does_start_at_block_boundary(&self, range: &Range) -> bool {
        let BoundaryPoint { container, offset } = range.start();
        let node_after_cursor = if self.doc.is_text(container) {
            if offset > 0 {
                return false;
            }
            container
        } else {
            match self
                .doc
                .node_after(container, offset)
                .filter(|&n| self.doc.contains(self.root, n))
            {
                Some(node) => node,
                None => {
                    // Cursor at the very end of the document.
                    let before = self.doc.node_before(container, offset);
                    if self.doc.is_text(before) && self.doc.length(before) > 0 {
                        return false;
                    }
                    before
                }
            }
        };
        let block = self.get_start_block_of_range(range).unwrap_or(self.root);
        let mut walker = content_walker(block);
        walker.set_current(node_after_cursor);
        walker.previous_node(self.doc).is_none()
    }

    /// Whether no visible content follows the end of `range` inside its block.
    pub fn range_does_end_at_block_boundary(&self, range: &Range) -> bool {
        let BoundaryPoint { container, offset } = range.end();
        let current = if self.doc.is_text(container) {
            let length = self.doc.length(container);
            if length > 0 && offset < length {
                return false;
            }
            container
        } else {
            self.doc.node_before(container, offset)
        };
        let block = self.get_end_block_of_range(range).unwrap_or(self.root);
        let mut walker = content_walker(block);
        walker.set_current(current);
        walker.next_node(self.doc).is_none()
    }

    /// Grow `range` to cover whole blocks at both ends.
    pub fn expand_range_to_block_boundaries(&mut self, range: &mut Range) -> Result<(), EngineError> {
        if let (Some(start), Some(end)) = (
            self.get_start_block_of_range(range),
            self.get_end_block_of_range(range),
        ) {
            range.set_start_before(self.doc, start)?;
            range.set_end_after(self.doc, end)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::error::SilentReporter;
    use crate::markup::{parse_fragment, serialize_children};
    use pretty_assertions::assert_eq;

    fn setup(html: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let frag = parse_fragment(&mut doc, html).unwrap();
        doc.append_child(root, frag).unwrap();
        (doc, root)
    }

    fn texts(doc: &Document, root: NodeId) -> Vec<NodeId> {
        doc.descendants(root)
            .into_iter()
            .filter(|&n| doc.is_text(n))
            .collect()
    }

    fn range(doc: &Document, start: (NodeId, usize), end: (NodeId, usize)) -> Range {
        let mut range = Range::collapsed_at(start.0, start.1);
        range.set_end(doc, end.0, end.1).unwrap();
        range
    }

    #[test]
    fn test_node_before_and_after() {
        let (doc, root) = setup("<div>ab</div><div>cd</div>");
        let t = texts(&doc, root);
        let second = doc.child(root, 1).unwrap();
        assert_eq!(doc.node_before(root, 1), t[0]);
        assert_eq!(doc.node_before(root, 0), root);
        assert_eq!(doc.node_after(root, 1), Some(second));
        assert_eq!(doc.node_after(second, 1), None);
        assert_eq!(doc.node_after(t[1], 1), Some(t[1]));
    }

    #[test]
    fn test_contained_in_range() {
        let (doc, root) = setup("<div>ab</div><div>cd</div><div>ef</div>");
        let t = texts(&doc, root);
        let blocks = doc.children(root).to_vec();
        let r = range(&doc, (t[0], 1), (t[1], 1));
        assert!(doc.is_node_contained_in_range(&r, blocks[0], true));
        assert!(doc.is_node_contained_in_range(&r, blocks[1], true));
        assert!(!doc.is_node_contained_in_range(&r, blocks[2], true));
        assert!(!doc.is_node_contained_in_range(&r, blocks[0], false));

        let whole = range(&doc, (root, 0), (root, 2));
        assert!(doc.is_node_contained_in_range(&whole, blocks[1], false));
        assert!(!doc.is_node_contained_in_range(&whole, root, true));
    }

    #[test]
    fn test_insert_node_splits_text() {
        let (mut doc, root) = setup("<div>abcd</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root)[0];
        let block = doc.first_child(root).unwrap();
        let img = doc.create_element("img");
        let mut r = Range::collapsed_at(t, 2);
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.insert_node_in_range(&mut r, img).unwrap();
        assert_eq!(serialize_children(&doc, root), "<div>ab<img>cd</div>");
        // The range covers the inserted image.
        let tail = doc.child(block, 2).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(block, 1));
        assert_eq!(r.end(), BoundaryPoint::new(tail, 0));
    }

    #[test]
    fn test_insert_node_at_container_offset() {
        let (mut doc, root) = setup("<div>ab</div><div>cd</div>");
        let config = EditorConfig::default();
        let hr = doc.create_element("hr");
        let mut r = Range::collapsed_at(root, 1);
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.insert_node_in_range(&mut r, hr).unwrap();
        assert_eq!(
            serialize_children(&doc, root),
            "<div>ab</div><hr><div>cd</div>"
        );
        assert_eq!(r.start(), BoundaryPoint::new(root, 1));
        assert_eq!(r.end(), BoundaryPoint::new(root, 2));
    }

    #[test]
    fn test_extract_within_block() {
        let (mut doc, root) = setup("<div>abcdef</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root)[0];
        let mut r = range(&doc, (t, 1), (t, 4));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        let frag = ctx.extract_contents_of_range(&mut r, None).unwrap();
        assert_eq!(serialize_children(&doc, frag), "bcd");
        assert_eq!(serialize_children(&doc, root), "<div>aef</div>");
        assert!(r.collapsed());
        assert_eq!(r.start(), BoundaryPoint::new(t, 1));
    }

    #[test]
    fn test_delete_across_blocks_merges() {
        let (mut doc, root) = setup("<div>foo</div><div>bar</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let mut r = range(&doc, (t[0], 3), (t[1], 0));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.delete_contents_of_range(&mut r).unwrap();
        assert_eq!(serialize_children(&doc, root), "<div>foobar</div>");
        assert!(r.collapsed());
        assert_eq!(r.start(), BoundaryPoint::new(t[0], 3));
    }

    #[test]
    fn test_delete_everything_leaves_default_block() {
        let (mut doc, root) = setup("<div>abc</div>");
        let config = EditorConfig::default();
        let mut r = range(&doc, (root, 0), (root, 1));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        let removed = ctx.delete_contents_of_range(&mut r).unwrap();
        assert_eq!(serialize_children(&doc, removed), "abc");
        assert_eq!(serialize_children(&doc, root), "<div><br></div>");
        let block = doc.first_child(root).unwrap();
        assert!(r.collapsed());
        assert_eq!(r.start(), BoundaryPoint::new(block, 0));
    }

    #[test]
    fn test_collapsed_range_moves_down_crosswise() {
        let (mut doc, root) = setup("<div>ab</div><div>cd</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let mut r = Range::collapsed_at(root, 1);
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.move_range_boundaries_down_tree(&mut r).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(t[0], 2));
        assert_eq!(r.end(), BoundaryPoint::new(t[1], 0));
    }

    #[test]
    fn test_move_down_skips_one_trailing_break() {
        let (mut doc, root) = setup("<div>ab<br><br></div>");
        let config = EditorConfig::default();
        let block = doc.first_child(root).unwrap();
        let t = texts(&doc, root)[0];
        let mut r = range(&doc, (block, 0), (block, 3));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.move_range_boundaries_down_tree(&mut r).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(t, 0));
        // Only one trailing break is skipped.
        assert_eq!(r.end(), BoundaryPoint::new(block, 2));
    }

    #[test]
    fn test_move_up_stops_at_max() {
        let (mut doc, root) = setup("<div><b>ab</b></div><div>cd</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let first = doc.child(root, 0).unwrap();
        let mut r = range(&doc, (t[0], 0), (t[0], 2));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.move_range_boundaries_up_tree(&mut r, Some(first), Some(first))
            .unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(first, 0));
        assert_eq!(r.end(), BoundaryPoint::new(first, 1));

        ctx.move_range_boundaries_up_tree(&mut r, Some(root), Some(root))
            .unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(root, 0));
        assert_eq!(r.end(), BoundaryPoint::new(root, 1));
    }

    #[test]
    fn test_start_and_end_blocks() {
        let (mut doc, root) = setup("<div>ab</div><div>cd</div><div>ef</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let blocks = doc.children(root).to_vec();
        let r = range(&doc, (t[0], 1), (t[2], 1));
        let ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        assert_eq!(ctx.get_start_block_of_range(&r), Some(blocks[0]));
        assert_eq!(ctx.get_end_block_of_range(&r), Some(blocks[2]));

        let between = Range::collapsed_at(root, 1);
        assert_eq!(ctx.get_start_block_of_range(&between), None);
    }

    #[test]
    fn test_block_boundaries() {
        let (mut doc, root) = setup("<div> ab</div><div>cd</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        assert!(ctx.range_does_start_at_block_boundary(&Range::collapsed_at(t[0], 0)));
        assert!(!ctx.range_does_start_at_block_boundary(&Range::collapsed_at(t[0], 2)));
        assert!(ctx.range_does_end_at_block_boundary(&Range::collapsed_at(t[0], 3)));
        assert!(!ctx.range_does_end_at_block_boundary(&Range::collapsed_at(t[1], 1)));
        assert!(ctx.range_does_start_at_block_boundary(&Range::collapsed_at(t[1], 0)));
    }

    #[test]
    fn test_expand_to_blocks() {
        let (mut doc, root) = setup("<div>ab</div><div>cd</div><div>ef</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root);
        let mut r = range(&doc, (t[0], 1), (t[1], 1));
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.expand_range_to_block_boundaries(&mut r).unwrap();
        assert_eq!(r.start(), BoundaryPoint::new(root, 0));
        assert_eq!(r.end(), BoundaryPoint::new(root, 2));
    }

    #[test]
    fn test_insert_fragment_mid_block() {
        let (mut doc, root) = setup("<div>abef</div>");
        let config = EditorConfig::default();
        let t = texts(&doc, root)[0];
        let frag = parse_fragment(&mut doc, "<div>cd</div>").unwrap();
        let mut r = Range::collapsed_at(t, 2);
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.insert_tree_fragment_into_range(&mut r, frag).unwrap();
        assert_eq!(serialize_children(&doc, root), "<div>abcdef</div>");
        // The range surrounds the inserted text.
        assert_eq!(r.start(), BoundaryPoint::new(t, 2));
        assert_eq!(r.end(), BoundaryPoint::new(t, 4));
    }

    #[test]
    fn test_insert_fragment_replaces_empty_block() {
        let (mut doc, root) = setup("<div>a</div><div><br></div>");
        let config = EditorConfig::default();
        let empty = doc.child(root, 1).unwrap();
        let frag = parse_fragment(&mut doc, "<div>x</div><div>y</div>").unwrap();
        let mut r = Range::collapsed_at(empty, 0);
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.insert_tree_fragment_into_range(&mut r, frag).unwrap();
        assert_eq!(
            serialize_children(&doc, root),
            "<div>a</div><div>x</div><div>y</div>"
        );
        assert!(!doc.is_alive(empty));
    }
}
