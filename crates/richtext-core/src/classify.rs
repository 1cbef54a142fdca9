//! Node classification.
//!
//! Every node falls into one of four [`NodeCategory`] values. Text is always inline. An
//! element (or fragment) whose children are not all inline is a *container*, which also
//! tolerates malformed markup such as a block inside a `<span>`. Otherwise an element is
//! inline when its tag is an inline tag of the [`TagSchema`](richtext_core_schema::TagSchema)
//! and block when it is not.
//!
//! Categories are memoized per arena slot. Any change to a child list clears the cached
//! value of the mutated node and all of its ancestors.

use crate::node::{Document, NodeData, NodeId};

/// Structural category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Comments and stale handles. Excluded from traversals.
    Unknown,
    /// Text and inline elements whose children are all inline.
    Inline,
    /// Non-inline elements whose children are all inline.
    Block,
    /// Elements with at least one non-inline child.
    Container,
}

impl Document {
    /// Category of `id`, computed on first use and memoized.
    pub fn category(&self, id: NodeId) -> NodeCategory {
        match self.data(id) {
            None | Some(NodeData::Comment(_)) => return NodeCategory::Unknown,
            Some(NodeData::Text(_)) => return NodeCategory::Inline,
            Some(NodeData::Element(_) | NodeData::Fragment) => {}
        }
        if let Some(cached) = self.categories[id.index()].get() {
            return cached;
        }

        let category = if !self.children(id).iter().all(|&c| self.is_inline(c)) {
            NodeCategory::Container
        } else if self
            .tag(id)
            .is_some_and(|tag| self.schema().is_inline_tag(tag))
        {
            NodeCategory::Inline
        } else {
            NodeCategory::Block
        };
        self.categories[id.index()].set(Some(category));
        category
    }

    /// Returns `true` if `id` is inline.
    pub fn is_inline(&self, id: NodeId) -> bool {
        self.category(id) == NodeCategory::Inline
    }

    /// Returns `true` if `id` is a block.
    pub fn is_block(&self, id: NodeId) -> bool {
        self.category(id) == NodeCategory::Block
    }

    /// Returns `true` if `id` is a container.
    pub fn is_container(&self, id: NodeId) -> bool {
        self.category(id) == NodeCategory::Container
    }

    /// Returns `true` for elements whose tag never holds children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.tag(id).is_some_and(|tag| self.schema().is_leaf_tag(tag))
    }

    /// Forget the cached category of `id` and every ancestor.
    pub(crate) fn invalidate_category(&self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(cell) = self.categories.get(node.index()) {
                cell.set(None);
            }
            current = self.parent(node);
        }
    }

    /// Drop every memoized category.
    pub fn clear_category_cache(&self) {
        for cell in &self.categories {
            cell.set(None);
        }
    }
}
