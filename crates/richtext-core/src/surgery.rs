//! Tree surgery.
//!
//! Structural edits that keep a tree valid:
//!
//! - [`split`](EditContext::split) a node upward to a stop ancestor,
//! - merge alike siblings ([`merge_inlines`](EditContext::merge_inlines),
//!   [`merge_containers`](EditContext::merge_containers),
//!   [`merge_with_block`](EditContext::merge_with_block)),
//! - wrap stray inline runs in default blocks ([`fix_container`](EditContext::fix_container)),
//! - insert filler so empty elements stay focusable ([`fix_cursor`](EditContext::fix_cursor)).
//!
//! Surgery detaches nodes it removes from the tree; nodes that can no longer be referenced
//! are freed right away.

use crate::config::{BlockFiller, InlineFiller};
use crate::context::EditContext;
use crate::error::EngineError;
use crate::node::{Document, NodeData, NodeId};
use crate::range::{BoundaryPair, Range};
use crate::walker::{Show, TreeWalker};

/// Zero-width space used as inline filler.
pub const ZWS: char = '\u{200B}';

/// `true` if `text` holds anything other than ASCII spaces, tabs and line feeds.
pub(crate) fn has_non_whitespace(text: &str) -> bool {
    text.chars().any(|c| !matches!(c, ' ' | '\t' | '\r' | '\n'))
}

fn style_property<'s>(style: &'s str, name: &str) -> Option<&'s str> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

// class name, style property, path label
const PATH_STYLE_CLASSES: &[(&str, &str, &str)] = &[
    ("background-color", "background-color", "backgroundColor"),
    ("color", "color", "color"),
    ("font-family", "font-family", "fontFamily"),
    ("font-size", "font-size", "fontSize"),
];

impl Document {
    /// Next block after `node` in document order, bounded by `root` (never `root` itself).
    pub fn next_block(&self, node: NodeId, root: NodeId) -> Option<NodeId> {
        let mut walker = TreeWalker::new(root, Show::ELEMENT, |d, n| d.is_block(n));
        walker.set_current(node);
        walker.next_node(self).filter(|&b| b != root)
    }

    /// Nearest block before `node` in document order (usually its enclosing block), bounded
    /// by `root` (never `root` itself).
    pub fn previous_block(&self, node: NodeId, root: NodeId) -> Option<NodeId> {
        let mut walker = TreeWalker::new(root, Show::ELEMENT, |d, n| d.is_block(n));
        walker.set_current(node);
        walker.previous_node(self).filter(|&b| b != root)
    }

    /// Closest inclusive ancestor of `node` below `root` with the given tag and attributes.
    pub fn nearest(
        &self,
        node: NodeId,
        root: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == root {
                break;
            }
            if self.has_tag(n, tag)
                && attributes
                    .iter()
                    .all(|(name, value)| self.attribute(n, name) == Some(value))
            {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// Whether two siblings may be merged: same kind, same tag, same class and inline style,
    /// never anchors and never leaves.
    pub fn are_alike(&self, a: NodeId, b: NodeId) -> bool {
        if self.is_leaf(a) {
            return false;
        }
        match (self.data(a), self.data(b)) {
            (Some(NodeData::Element(x)), Some(NodeData::Element(y))) => {
                x.tag == y.tag
                    && x.tag != "a"
                    && x.attributes.get("class").unwrap_or("")
                        == y.attributes.get("class").unwrap_or("")
                    && x.attributes.get("style").unwrap_or("")
                        == y.attributes.get("style").unwrap_or("")
            }
            (Some(NodeData::Text(_)), Some(NodeData::Text(_)))
            | (Some(NodeData::Comment(_)), Some(NodeData::Comment(_)))
            | (Some(NodeData::Fragment), Some(NodeData::Fragment)) => true,
            _ => false,
        }
    }

    /// A block is empty when it holds no text and no image.
    pub fn is_empty_block(&self, block: NodeId) -> bool {
        self.text_content(block).is_empty()
            && !self
                .descendants(block)
                .into_iter()
                .any(|n| self.has_tag(n, "img"))
    }

    /// Element path from below `root` down to `node`, e.g. `DIV>B>SPAN.color[color=red]`.
    pub fn path(&self, node: NodeId, root: NodeId) -> String {
        if node == root || !self.is_alive(node) {
            return String::new();
        }
        let mut path = self
            .parent(node)
            .map(|p| self.path(p, root))
            .unwrap_or_default();
        let Some(el) = self.element(node) else {
            return path;
        };

        if !path.is_empty() {
            path.push('>');
        }
        path.push_str(&el.tag.to_ascii_uppercase());
        if let Some(id) = el.attributes.get("id").filter(|id| !id.is_empty()) {
            path.push('#');
            path.push_str(id);
        }
        let mut classes: Vec<&str> = el
            .attributes
            .get("class")
            .unwrap_or("")
            .split_whitespace()
            .collect();
        classes.sort_unstable();
        if !classes.is_empty() {
            path.push('.');
            path.push_str(&classes.join("."));
        }
        if let Some(dir) = el.attributes.get("dir").filter(|d| !d.is_empty()) {
            path.push_str(&format!("[dir={dir}]"));
        }
        let style = el.attributes.get("style").unwrap_or("");
        for &(class, property, label) in PATH_STYLE_CLASSES {
            if classes.contains(&class) {
                let value = style_property(style, property).unwrap_or("");
                let value = if label == "fontSize" {
                    value.to_string()
                } else {
                    value.replace(' ', "")
                };
                path.push_str(&format!("[{label}={value}]"));
            }
        }
        path
    }
}

impl EditContext<'_> {
    fn needs_line_break(&self, block: NodeId) -> bool {
        !self.doc.descendants(block).into_iter().any(|n| {
            self.doc.is_leaf(n) || self.doc.text(n).is_some_and(|t| !t.is_empty())
        })
    }

    /// Make `node` focusable by adding filler content when it is empty.
    ///
    /// When `node` is the root and holds nothing (or only a line break), a default block
    /// replaces its content first. Returns `node`.
    pub fn fix_cursor(&mut self, node: NodeId) -> Result<NodeId, EngineError> {
        let original = node;
        let mut node = node;
        let mut fixer = None;

        if node == self.root {
            let child = self.doc.first_child(node);
            if child.is_none_or(|c| self.doc.has_tag(c, "br")) {
                let block = self.create_default_block()?;
                match child {
                    Some(br) => {
                        self.doc.replace_child(br, block)?;
                        self.doc.discard(br);
                    }
                    None => self.doc.append_child(node, block)?,
                }
                node = block;
            }
        }

        if !(self.doc.is_element(node) || self.doc.is_fragment(node)) || self.doc.is_leaf(node) {
            return Ok(original);
        }

        if self.doc.is_inline(node) {
            let zero_width = self.config.filler.inline == InlineFiller::ZeroWidthSpace;
            let mut child = self.doc.first_child(node);
            while let Some(c) = child
                && zero_width
                && self.doc.text(c) == Some("")
            {
                self.doc.discard(c);
                child = self.doc.first_child(node);
            }
            if child.is_none() {
                fixer = Some(if zero_width {
                    self.doc.note_zero_width_filler();
                    self.doc.create_text(ZWS.to_string())
                } else {
                    self.doc.create_text("")
                });
            }
        } else {
            match self.config.filler.block {
                BlockFiller::EmptyText => {
                    while !self.doc.is_text(node) && !self.doc.is_leaf(node) {
                        match self.doc.first_child(node) {
                            Some(child) => node = child,
                            None => {
                                fixer = Some(self.doc.create_text(""));
                                break;
                            }
                        }
                    }
                    if let Some(text) = self.doc.text(node) {
                        if !text.is_empty() && text.chars().all(|c| c == ' ') {
                            self.doc.set_text(node, "")?;
                        }
                    } else if self.doc.is_leaf(node)
                        && let Some(parent) = self.doc.parent(node)
                    {
                        let empty = self.doc.create_text("");
                        self.doc.insert_before(parent, empty, Some(node))?;
                    }
                }
                BlockFiller::LineBreak => {
                    if self.needs_line_break(node) {
                        fixer = Some(self.doc.create_element("br"));
                        while let Some(child) = self.doc.last_element_child(node)
                            && !self.doc.is_inline(child)
                        {
                            node = child;
                        }
                    }
                }
            }
        }

        if let Some(fixer) = fixer
            && let Err(err) = self.doc.append_child(node, fixer)
        {
            self.report(&err, "fix_cursor");
            self.doc.discard(fixer);
        }
        Ok(original)
    }

    /// Wrap every run of inline children of `container` (and every bare line break) in a
    /// default block, recursing into container children.
    pub fn fix_container(&mut self, container: NodeId) -> Result<(), EngineError> {
        let mut wrapper: Option<NodeId> = None;
        let mut i = 0;
        while let Some(child) = self.doc.child(container, i) {
            let is_br = self.doc.has_tag(child, "br");
            if !is_br && self.doc.is_inline(child) {
                let w = match wrapper {
                    Some(w) => w,
                    None => *wrapper.insert(self.create_block_element()),
                };
                self.doc.append_child(w, child)?;
                continue;
            }
            if is_br || wrapper.is_some() {
                let w = match wrapper.take() {
                    Some(w) => w,
                    None => self.create_block_element(),
                };
                self.fix_cursor(w)?;
                if is_br {
                    self.doc.replace_child(child, w)?;
                    self.doc.discard(child);
                    i += 1;
                    continue;
                }
                self.doc.insert_before(container, w, Some(child))?;
                i += 1;
            }
            if self.doc.is_container(child) {
                self.fix_container(child)?;
            }
            i += 1;
        }
        if let Some(w) = wrapper {
            self.fix_cursor(w)?;
            self.doc.append_child(container, w)?;
        }
        Ok(())
    }

    /// Split `node` at `offset` and keep splitting its ancestors up to `stop`.
    ///
    /// Text is split at a character offset; elements are cloned without children and every
    /// child from `offset` on moves into the clone, which is inserted after the original. Both
    /// halves are made focusable. Returns the child of `stop` that begins the second half, or
    /// `None` when the split point is at the end of `stop`. When `node == stop` nothing is
    /// split and the child at `offset` is returned.
    pub fn split(
        &mut self,
        node: NodeId,
        offset: usize,
        stop: NodeId,
    ) -> Result<Option<NodeId>, EngineError> {
        if !self.doc.is_alive(node) {
            return Err(EngineError::StaleNode(node));
        }
        if !self.doc.contains(stop, node) {
            return Err(EngineError::StopNodeNotAncestor);
        }
        let length = self.doc.length(node);
        if offset > length {
            return Err(EngineError::InvalidOffset { offset, length });
        }

        match self.doc.data(node) {
            Some(NodeData::Text(_)) => {
                if node == stop {
                    return Err(EngineError::Contract(
                        "a text node cannot be its own split stop".to_string(),
                    ));
                }
                let parent = self
                    .doc
                    .parent(node)
                    .ok_or(EngineError::StopNodeNotAncestor)?;
                let after = self.doc.split_text(node, offset)?;
                self.split_before(parent, Some(after), stop)
            }
            Some(NodeData::Element(_)) if self.doc.is_leaf(node) && node != stop => {
                let parent = self
                    .doc
                    .parent(node)
                    .ok_or(EngineError::StopNodeNotAncestor)?;
                self.split_before(parent, Some(node), stop)
            }
            Some(NodeData::Element(_) | NodeData::Fragment) => {
                let at = self.doc.child(node, offset);
                self.split_before(node, at, stop)
            }
            _ => Err(EngineError::Contract(format!(
                "cannot split {}",
                self.doc.describe(node)
            ))),
        }
    }

    fn split_before(
        &mut self,
        node: NodeId,
        at: Option<NodeId>,
        stop: NodeId,
    ) -> Result<Option<NodeId>, EngineError> {
        if node == stop {
            return Ok(at);
        }
        let parent = self
            .doc
            .parent(node)
            .ok_or(EngineError::StopNodeNotAncestor)?;
        let clone = self.doc.clone_shallow(node)?;

        let mut next = at;
        while let Some(child) = next {
            next = self.doc.next_sibling(child);
            self.doc.append_child(clone, child)?;
        }

        // Keep list numbering inside quotes: the continuation resumes at the split item.
        if self.doc.has_tag(node, "ol")
            && self.doc.nearest(node, self.root, "blockquote", &[]).is_some()
        {
            let start = self
                .doc
                .attribute(node, "start")
                .and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|&s| s != 0)
                .unwrap_or(1);
            let kept = i64::try_from(self.doc.length(node)).unwrap_or(i64::MAX);
            let resumed = start.saturating_add(kept - 1);
            self.doc
                .set_attribute(clone, "start", resumed.to_string())?;
        }

        self.fix_cursor(node)?;
        self.fix_cursor(clone)?;

        let next = self.doc.next_sibling(node);
        self.doc.insert_before(parent, clone, next)?;

        self.split_before(parent, Some(clone), stop)
    }

    /// Merge alike inline siblings below `node` (or below the parent of a text node), keeping
    /// `range` on the same content.
    pub fn merge_inlines(&mut self, node: NodeId, range: &mut Range) -> Result<(), EngineError> {
        let node = if self.doc.is_text(node) {
            match self.doc.parent(node) {
                Some(parent) => parent,
                None => return Ok(()),
            }
        } else {
            node
        };
        if self.doc.is_element(node) {
            let mut pair = BoundaryPair::from(*range);
            self.merge_inlines_in(node, &mut pair)?;
            range.apply(self.doc, pair)?;
        }
        Ok(())
    }

    fn merge_inlines_in(&mut self, node: NodeId, pair: &mut BoundaryPair) -> Result<(), EngineError> {
        let mut frags: Vec<NodeId> = Vec::new();
        let mut l = self.doc.length(node);
        while l > 0 {
            l -= 1;
            let Some(child) = self.doc.child(node, l) else {
                continue;
            };
            let prev = l.checked_sub(1).and_then(|i| self.doc.child(node, i));

            if let Some(prev) = prev
                && self.doc.is_inline(child)
                && self.doc.are_alike(child, prev)
                && !self.doc.is_leaf(child)
            {
                let prev_len = self.doc.length(prev);
                for point in [&mut pair.start, &mut pair.end] {
                    if point.container == child {
                        point.container = prev;
                        point.offset += prev_len;
                    }
                    if point.container == node {
                        if point.offset > l {
                            point.offset -= 1;
                        } else if point.offset == l {
                            point.container = prev;
                            point.offset = prev_len;
                        }
                    }
                }
                self.doc.detach(child);
                if let Some(text) = self.doc.text(child).map(str::to_owned) {
                    self.doc.append_text(prev, &text)?;
                } else {
                    frags.push(self.doc.take_children(child)?);
                }
                self.doc.discard(child);
            } else if self.doc.is_element(child) {
                while let Some(frag) = frags.pop() {
                    self.doc.append_child(child, frag)?;
                    self.doc.discard(frag);
                }
                self.merge_inlines_in(child, pair)?;
            }
        }
        Ok(())
    }

    /// Append the content of `next` to `block`.
    ///
    /// `next` is detached together with any single-child wrappers around it, a trailing line
    /// break filler of `block` is dropped, and `range` ends up collapsed at the seam.
    pub fn merge_with_block(
        &mut self,
        block: NodeId,
        next: NodeId,
        range: &mut Range,
    ) -> Result<(), EngineError> {
        let mut container = next;
        while let Some(parent) = self.doc.parent(container)
            && parent != self.root
            && self.doc.is_element(parent)
            && self.doc.length(parent) == 1
        {
            container = parent;
        }
        if self.doc.contains(container, block) {
            return Err(EngineError::Contract(
                "cannot merge a block into its own descendant".to_string(),
            ));
        }
        self.doc.detach(container);

        let mut offset = self.doc.length(block);
        if let Some(last) = self.doc.last_child(block)
            && self.doc.has_tag(last, "br")
        {
            self.doc.discard(last);
            offset -= 1;
        }

        let contents = self.doc.take_children(next)?;
        self.doc.append_child(block, contents)?;
        self.doc.discard(contents);
        self.doc.discard(container);

        range.set_start(self.doc, block, offset)?;
        range.collapse(true);
        self.merge_inlines(block, range)
    }

    /// Merge container `node` into an alike previous sibling.
    ///
    /// List items only merge when they hold a nested list; the absorbed content of a plain
    /// item is wrapped in a default block.
    pub fn merge_containers(&mut self, node: NodeId) -> Result<(), EngineError> {
        let prev = self.doc.previous_sibling(node);
        let is_list_item = self.doc.has_tag(node, "li");
        let first = self.doc.first_child(node);

        if is_list_item
            && !first.is_some_and(|f| self.doc.has_tag(f, "ol") || self.doc.has_tag(f, "ul"))
        {
            return Ok(());
        }

        if let Some(prev) = prev
            && self.doc.are_alike(prev, node)
        {
            if !self.doc.is_container(prev) {
                if !is_list_item {
                    return Ok(());
                }
                let block = self.create_block_element();
                let contents = self.doc.take_children(prev)?;
                self.doc.append_child(block, contents)?;
                self.doc.discard(contents);
                self.doc.append_child(prev, block)?;
            }
            self.doc.detach(node);
            let needs_fix = !self.doc.is_container(node);
            let contents = self.doc.take_children(node)?;
            self.doc.append_child(prev, contents)?;
            self.doc.discard(contents);
            self.doc.discard(node);
            if needs_fix {
                self.fix_container(prev)?;
            }
            if let Some(first) = first {
                self.merge_containers(first)?;
            }
        } else if is_list_item {
            let block = self.create_block_element();
            self.doc.insert_before(node, block, first)?;
            self.fix_cursor(block)?;
        }
        Ok(())
    }

    /// Remove line breaks below `node` that do not break a line; blocks holding line breaks
    /// that do are rebuilt with [`fix_container`](Self::fix_container).
    ///
    /// With `keep_for_blank_line`, a line break alone in its block counts as breaking a line.
    pub fn cleanup_line_breaks(
        &mut self,
        node: NodeId,
        keep_for_blank_line: bool,
    ) -> Result<(), EngineError> {
        let brs: Vec<NodeId> = self
            .doc
            .descendants(node)
            .into_iter()
            .filter(|&n| self.doc.has_tag(n, "br"))
            .collect();
        // Decide first: converting one break changes the context of its neighbours.
        let breaks: Vec<bool> = brs
            .iter()
            .map(|&br| self.is_line_break(br, keep_for_blank_line))
            .collect();

        for (&br, &breaks_line) in brs.iter().zip(&breaks).rev() {
            let Some(parent) = self.doc.parent(br) else {
                continue;
            };
            if !breaks_line {
                self.doc.discard(br);
            } else if !self.doc.is_inline(parent) {
                self.fix_container(parent)?;
            }
        }
        Ok(())
    }

    fn is_line_break(&self, br: NodeId, blank_line_counts: bool) -> bool {
        let Some(mut block) = self.doc.parent(br) else {
            return false;
        };
        while self.doc.is_inline(block) {
            match self.doc.parent(block) {
                Some(parent) => block = parent,
                None => break,
            }
        }
        let mut walker = TreeWalker::new(block, Show::ELEMENT | Show::TEXT, |d, n| {
            match d.text(n) {
                Some(text) => has_non_whitespace(text),
                None => d.has_tag(n, "br"),
            }
        });
        walker.set_current(br);
        walker.next_node(self.doc).is_some()
            || (blank_line_counts && walker.previous_node(self.doc).is_none())
    }

    /// Strip zero-width fillers below `root`, dropping text nodes (and emptied inline
    /// ancestors) that held nothing else. Text directly inside `keep` is left alone.
    pub fn remove_zero_width_fillers(
        &mut self,
        root: NodeId,
        keep: Option<NodeId>,
    ) -> Result<(), EngineError> {
        let mut walker = TreeWalker::all(root, Show::TEXT);
        while let Some(mut node) = walker.next_node(self.doc) {
            while let Some(index) = self
                .doc
                .text(node)
                .and_then(|t| t.chars().position(|c| c == ZWS))
            {
                if keep.is_some_and(|k| self.doc.parent(node) == Some(k)) {
                    break;
                }
                if self.doc.length(node) == 1 {
                    while node != root {
                        let Some(parent) = self.doc.parent(node) else {
                            break;
                        };
                        self.doc.discard(node);
                        node = parent;
                        walker.set_current(parent);
                        if !(self.doc.is_inline(node) && self.doc.length(node) == 0) {
                            break;
                        }
                    }
                    break;
                }
                self.doc.delete_text_char(node, index)?;
            }
        }
        Ok(())
    }
}
