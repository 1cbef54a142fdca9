//! Filtered tree walker.
//!
//! A [`TreeWalker`] yields nodes of one subtree in document order (forward), reverse document
//! order (backward) or reverse post-order. It holds no borrow of the [`Document`]: every step
//! takes the arena explicitly, so the tree may be mutated between steps as long as the current
//! node stays attached under the root.

use crate::node::{Document, NodeData, NodeId};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Node kinds a walker may return.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Show: u8 {
        /// Elements.
        const ELEMENT = 1;
        /// Text nodes.
        const TEXT = 1 << 1;
        /// Comments.
        const COMMENT = 1 << 2;
        /// Fragments.
        const FRAGMENT = 1 << 3;
    }
}

impl Show {
    fn accepts(self, data: &NodeData) -> bool {
        let kind = match data {
            NodeData::Element(_) => Show::ELEMENT,
            NodeData::Text(_) => Show::TEXT,
            NodeData::Comment(_) => Show::COMMENT,
            NodeData::Fragment => Show::FRAGMENT,
        };
        self.contains(kind)
    }
}

type Predicate<'p> = Box<dyn Fn(&Document, NodeId) -> bool + 'p>;

/// Restartable cursor over a subtree.
pub struct TreeWalker<'p> {
    root: NodeId,
    show: Show,
    predicate: Predicate<'p>,
    current: NodeId,
}

impl fmt::Debug for TreeWalker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeWalker")
            .field("root", &self.root)
            .field("show", &self.show)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl<'p> TreeWalker<'p> {
    /// Create a walker bounded by `root`, positioned on `root`.
    pub fn new<F>(root: NodeId, show: Show, predicate: F) -> Self
    where
        F: Fn(&Document, NodeId) -> bool + 'p,
    {
        Self {
            root,
            show,
            predicate: Box::new(predicate),
            current: root,
        }
    }

    /// Walker accepting every node of the given kinds.
    pub fn all(root: NodeId, show: Show) -> Self {
        Self::new(root, show, |_, _| true)
    }

    /// Boundary of the traversal.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node the walker is positioned on.
    pub fn current(&self) -> NodeId {
        self.current
    }

    /// Reposition the walker. `node` should lie inside the root's subtree.
    pub fn set_current(&mut self, node: NodeId) {
        self.current = node;
    }

    /// Change the traversal boundary.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.data(node).is_some_and(|d| self.show.accepts(d)) && (self.predicate)(doc, node)
    }

    /// Next matching node in document order, or `None` past the end of the root.
    pub fn next_node(&mut self, doc: &Document) -> Option<NodeId> {
        let mut current = self.current;
        loop {
            let mut node = doc.first_child(current);
            let mut cursor = Some(current);
            while node.is_none() {
                let Some(c) = cursor else { break };
                if c == self.root {
                    break;
                }
                node = doc.next_sibling(c);
                if node.is_none() {
                    cursor = doc.parent(c);
                }
            }
            let node = node?;
            if self.matches(doc, node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }

    /// Previous matching node in document order, or `None` before the root.
    ///
    /// The root itself is reachable when it matches, since it precedes its descendants.
    pub fn previous_node(&mut self, doc: &Document) -> Option<NodeId> {
        let mut current = self.current;
        loop {
            if current == self.root {
                return None;
            }
            let node = match doc.previous_sibling(current) {
                Some(mut node) => {
                    while let Some(last) = doc.last_child(node) {
                        node = last;
                    }
                    node
                }
                None => doc.parent(current)?,
            };
            if self.matches(doc, node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }

    /// Previous matching node in post-order, or `None` past the start of the root.
    pub fn previous_post_order(&mut self, doc: &Document) -> Option<NodeId> {
        let mut current = self.current;
        loop {
            let mut node = doc.last_child(current);
            let mut cursor = Some(current);
            while node.is_none() {
                let Some(c) = cursor else { break };
                if c == self.root {
                    break;
                }
                node = doc.previous_sibling(c);
                if node.is_none() {
                    cursor = doc.parent(c);
                }
            }
            let node = node?;
            if self.matches(doc, node) {
                self.current = node;
                return Some(node);
            }
            current = node;
        }
    }

    /// Iterate forward over the remaining matches without mutating the tree.
    pub fn iter<'w, 'd>(&'w mut self, doc: &'d Document) -> Iter<'w, 'd, 'p> {
        Iter { walker: self, doc }
    }
}

/// Forward iterator adapter returned by [`TreeWalker::iter`].
#[derive(Debug)]
pub struct Iter<'w, 'd, 'p> {
    walker: &'w mut TreeWalker<'p>,
    doc: &'d Document,
}

impl Iterator for Iter<'_, '_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.walker.next_node(self.doc)
    }
}
