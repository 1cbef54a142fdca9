//! Node arena.
//!
//! Every node of a document lives in a [`Document`] and is referenced by a [`NodeId`], a
//! generational handle. The arena owns all nodes; a child list stores child handles and every
//! attached node records its parent handle. Handles of freed nodes are never reused with the
//! same generation, so a stale handle is detected instead of silently aliasing a new node.
//!
//! # Example
//!
//! ```rust
//! use richtext_core::Document;
//!
//! let mut doc = Document::new();
//! let div = doc.create_element("div");
//! let text = doc.create_text("hello");
//! doc.append_child(div, text).unwrap();
//!
//! assert_eq!(doc.parent(text), Some(div));
//! assert_eq!(doc.text_content(div), "hello");
//! ```

use crate::classify::NodeCategory;
use crate::error::EngineError;
use richtext_core_schema::TagSchema;
use std::cell::Cell;

/// Stable handle of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the arena (for diagnostics).
    pub fn index(self) -> usize {
        self.index as usize
    }
}

/// Ordered attribute map of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its original position when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|(k, _)| k == name)?;
        Some(self.0.remove(pos).1)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

/// Element payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in insertion order.
    pub attributes: Attributes,
}

/// The payload that distinguishes node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// A run of text.
    Text(String),
    /// An element with a tag and attributes.
    Element(ElementData),
    /// A detached container of nodes. Inserting a fragment inserts its children.
    Fragment,
    /// A comment; classified as [`NodeCategory::Unknown`] and skipped by traversals.
    Comment(String),
}

#[derive(Debug)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<NodeEntry>,
}

/// Arena owning every node of a rich-text document.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Memoized categories, indexed by slot.
    pub(crate) categories: Vec<Cell<Option<NodeCategory>>>,
    schema: TagSchema,
    zero_width_filler_added: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty arena using the HTML tag schema.
    pub fn new() -> Self {
        Self::with_schema(TagSchema::html())
    }

    /// Create an empty arena using a custom tag schema.
    pub fn with_schema(schema: TagSchema) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            categories: Vec::new(),
            schema,
            zero_width_filler_added: false,
        }
    }

    /// Tag schema used for classification.
    pub fn schema(&self) -> &TagSchema {
        &self.schema
    }

    /// Number of live nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    // ---- allocation -------------------------------------------------------------------------

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let entry = NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            self.categories[index as usize].set(None);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            self.categories.push(Cell::new(None));
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(data.into()))
    }

    /// Create a detached element without attributes.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_element_with(tag, Attributes::new())
    }

    /// Create a detached element with attributes.
    pub fn create_element_with(&mut self, tag: &str, attributes: Attributes) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes,
        }))
    }

    /// Create an empty fragment.
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(data.into()))
    }

    /// Detach `id` and free its whole subtree. Handles into the subtree become stale.
    pub fn discard(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(entry) = self.slot_mut(node).and_then(|s| s.entry.take()) {
                stack.extend(entry.children);
                let slot = &mut self.slots[node.index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                self.categories[node.index as usize].set(None);
                self.free.push(node.index);
            }
        }
    }

    /// Free every node that is not reachable from one of `live` roots.
    pub fn sweep(&mut self, live: &[NodeId]) {
        let mut reachable = vec![false; self.slots.len()];
        let mut stack: Vec<NodeId> = live.iter().copied().filter(|&n| self.is_alive(n)).collect();
        while let Some(node) = stack.pop() {
            reachable[node.index as usize] = true;
            stack.extend(self.children(node).iter().copied());
        }
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.is_some() && !reachable[index] {
                slot.entry = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.categories[index].set(None);
                self.free.push(index as u32);
            }
        }
    }

    // ---- access -----------------------------------------------------------------------------

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    fn entry(&self, id: NodeId) -> Option<&NodeEntry> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.entry.as_ref())
    }

    fn entry_mut(&mut self, id: NodeId) -> Option<&mut NodeEntry> {
        self.slot_mut(id).and_then(|s| s.entry.as_mut())
    }

    fn live_entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, EngineError> {
        self.entry_mut(id).ok_or(EngineError::StaleNode(id))
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.entry(id).is_some()
    }

    /// Node payload.
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.entry(id).map(|e| &e.data)
    }

    /// Returns `true` for text nodes.
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    /// Returns `true` for element nodes.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element(_)))
    }

    /// Returns `true` for fragments.
    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Fragment))
    }

    /// Element payload, if `id` is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    /// Lowercase tag name, if `id` is an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// Returns `true` if `id` is an element with the given tag (case-insensitive).
    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Attribute value of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attributes.get(name))
    }

    /// Set an attribute on an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), EngineError> {
        match &mut self.live_entry_mut(id)?.data {
            NodeData::Element(el) => {
                el.attributes.set(name, value);
                Ok(())
            }
            _ => Err(EngineError::StructuralInvariant(format!(
                "cannot set attribute `{name}` on a non-element node"
            ))),
        }
    }

    /// Remove an attribute from an element.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        match &mut self.entry_mut(id)?.data {
            NodeData::Element(el) => el.attributes.remove(name),
            _ => None,
        }
    }

    /// Text of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Replace the data of a text node.
    pub fn set_text(&mut self, id: NodeId, data: impl Into<String>) -> Result<(), EngineError> {
        match &mut self.live_entry_mut(id)?.data {
            NodeData::Text(s) => {
                *s = data.into();
                Ok(())
            }
            _ => Err(EngineError::StructuralInvariant(
                "cannot set text data on a non-text node".to_string(),
            )),
        }
    }

    /// Append to the data of a text node.
    pub fn append_text(&mut self, id: NodeId, data: &str) -> Result<(), EngineError> {
        match &mut self.live_entry_mut(id)?.data {
            NodeData::Text(s) => {
                s.push_str(data);
                Ok(())
            }
            _ => Err(EngineError::StructuralInvariant(
                "cannot append text data to a non-text node".to_string(),
            )),
        }
    }

    /// Remove the character at `char_index` from a text node.
    pub fn delete_text_char(&mut self, id: NodeId, char_index: usize) -> Result<(), EngineError> {
        let length = self.length(id);
        match &mut self.live_entry_mut(id)?.data {
            NodeData::Text(s) => {
                let (byte, ch) = s
                    .char_indices()
                    .nth(char_index)
                    .ok_or(EngineError::InvalidOffset {
                        offset: char_index,
                        length,
                    })?;
                s.replace_range(byte..byte + ch.len_utf8(), "");
                Ok(())
            }
            _ => Err(EngineError::StructuralInvariant(
                "cannot delete text from a non-text node".to_string(),
            )),
        }
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).and_then(|e| e.parent)
    }

    /// Children of a node (empty for stale handles and character data).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Child at `index`.
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// First child.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last child.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Last child that is an element.
    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .rev()
            .copied()
            .find(|&c| self.is_element(c))
    }

    /// Position of `id` in its parent's child list.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Next sibling.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child(parent, index + 1)
    }

    /// Previous sibling.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    /// Child count for elements and fragments, character count for text and comments.
    pub fn length(&self, id: NodeId) -> usize {
        match self.entry(id) {
            Some(NodeEntry {
                data: NodeData::Text(s) | NodeData::Comment(s),
                ..
            }) => s.chars().count(),
            Some(entry) => entry.children.len(),
            None => 0,
        }
    }

    /// Returns `true` if `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Topmost ancestor of `id` (itself when detached).
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(parent) = self.parent(node) {
            node = parent;
        }
        node
    }

    /// Child indices leading from the topmost ancestor down to `id`.
    pub(crate) fn index_path(&self, id: NodeId) -> (NodeId, Vec<usize>) {
        let mut path = Vec::new();
        let mut node = id;
        while let Some(parent) = self.parent(node) {
            path.push(self.index_of(node).unwrap_or(0));
            node = parent;
        }
        path.reverse();
        (node, path)
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(s)) => out.push_str(s),
            Some(NodeData::Element(_) | NodeData::Fragment) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    /// Pre-order list of the descendants of `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    // ---- mutation ---------------------------------------------------------------------------

    fn accepts_children(&self, id: NodeId) -> bool {
        match self.data(id) {
            Some(NodeData::Fragment) => true,
            Some(NodeData::Element(el)) => !self.schema.is_leaf_tag(&el.tag),
            _ => false,
        }
    }

    /// Append `child` to `parent`. Appending a fragment moves the fragment's children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), EngineError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or at the end when `None`).
    ///
    /// `child` is detached from its previous parent first. Inserting a fragment moves its
    /// children in order and leaves the fragment empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), EngineError> {
        if !self.is_alive(parent) {
            return Err(EngineError::StaleNode(parent));
        }
        if !self.is_alive(child) {
            return Err(EngineError::StaleNode(child));
        }
        if !self.accepts_children(parent) {
            return Err(EngineError::StructuralInvariant(format!(
                "{} cannot hold children",
                self.describe(parent)
            )));
        }
        if let Some(r) = reference
            && self.parent(r) != Some(parent)
        {
            return Err(EngineError::StructuralInvariant(format!(
                "reference node is not a child of {}",
                self.describe(parent)
            )));
        }

        if self.is_fragment(child) {
            let moved: Vec<NodeId> = self.children(child).to_vec();
            for node in moved {
                self.insert_before(parent, node, reference)?;
            }
            return Ok(());
        }

        if self.contains(child, parent) {
            return Err(EngineError::StructuralInvariant(format!(
                "cannot insert {} into its own subtree",
                self.describe(child)
            )));
        }

        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };

        self.detach(child);
        let index = match reference {
            Some(r) => self.index_of(r).unwrap_or(self.children(parent).len()),
            None => self.children(parent).len(),
        };
        self.live_entry_mut(parent)?.children.insert(index, child);
        self.live_entry_mut(child)?.parent = Some(parent);
        self.invalidate_category(parent);
        Ok(())
    }

    /// Remove `id` from its parent. Returns `id` for chaining.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        if let Some(parent) = self.parent(id) {
            if let Some(entry) = self.entry_mut(parent) {
                entry.children.retain(|&c| c != id);
            }
            if let Some(entry) = self.entry_mut(id) {
                entry.parent = None;
            }
            self.invalidate_category(parent);
        }
        id
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<(), EngineError> {
        let parent = self.parent(old).ok_or_else(|| {
            EngineError::StructuralInvariant("cannot replace a detached node".to_string())
        })?;
        self.insert_before(parent, new, Some(old))?;
        self.detach(old);
        Ok(())
    }

    /// Move every child of `id` into a new fragment and return the fragment.
    pub fn take_children(&mut self, id: NodeId) -> Result<NodeId, EngineError> {
        let frag = self.create_fragment();
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.append_child(frag, child)?;
        }
        Ok(frag)
    }

    /// Split a text node at a character offset.
    ///
    /// The original node keeps the characters before `offset`; a new text node holding the
    /// rest is inserted right after it (when attached) and returned.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, EngineError> {
        let length = self.length(id);
        let tail = match &mut self.live_entry_mut(id)?.data {
            NodeData::Text(s) => {
                if offset > length {
                    return Err(EngineError::InvalidOffset { offset, length });
                }
                let byte = s.char_indices().nth(offset).map_or(s.len(), |(b, _)| b);
                s.split_off(byte)
            }
            _ => {
                return Err(EngineError::StructuralInvariant(
                    "split_text called on a non-text node".to_string(),
                ));
            }
        };
        let after = self.create_text(tail);
        if let Some(parent) = self.parent(id) {
            let next = self.next_sibling(id);
            self.insert_before(parent, after, next)?;
        }
        Ok(after)
    }

    /// Copy a node without its children.
    pub fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId, EngineError> {
        let data = self.data(id).cloned().ok_or(EngineError::StaleNode(id))?;
        Ok(self.alloc(data))
    }

    /// Deep copy of a node and its subtree (detached).
    pub fn clone_deep(&mut self, id: NodeId) -> Result<NodeId, EngineError> {
        let copy = self.clone_shallow(id)?;
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            let child_copy = self.clone_deep(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    // ---- filler bookkeeping -----------------------------------------------------------------

    /// Record that a zero-width filler was inserted somewhere.
    pub(crate) fn note_zero_width_filler(&mut self) {
        self.zero_width_filler_added = true;
    }

    /// Whether a zero-width filler may be present in the tree.
    pub fn has_zero_width_filler(&self) -> bool {
        self.zero_width_filler_added
    }

    pub(crate) fn clear_zero_width_filler_flag(&mut self) {
        self.zero_width_filler_added = false;
    }

    /// Short human-readable description used in error messages.
    pub(crate) fn describe(&self, id: NodeId) -> String {
        match self.data(id) {
            Some(NodeData::Text(_)) => "#text".to_string(),
            Some(NodeData::Element(el)) => format!("<{}>", el.tag),
            Some(NodeData::Fragment) => "#fragment".to_string(),
            Some(NodeData::Comment(_)) => "#comment".to_string(),
            None => format!("stale node #{}", id.index),
        }
    }
}
