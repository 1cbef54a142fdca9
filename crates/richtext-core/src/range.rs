//! Boundary points and ranges.
//!
//! A [`BoundaryPoint`] is a `(container, offset)` pair: a character index inside a text node,
//! or a child index inside an element or fragment. A [`Range`] is an ordered pair of points.
//!
//! Setting one end of a range past the other collapses the range onto the new point, and so
//! does setting a point that lives in a different tree. Range algorithms rely on this rule
//! when they move one end at a time.

use crate::error::EngineError;
use crate::node::{Document, NodeId};
use std::cmp::Ordering;

/// A position between two children of a container, or between two characters of a text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    /// Node the offset is relative to.
    pub container: NodeId,
    /// Character index (text) or child index (element, fragment).
    pub offset: usize,
}

impl BoundaryPoint {
    /// Create a boundary point.
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }
}

/// A selection over a document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

/// Plain copy of a range's points, threaded through merges by `&mut` and applied once at the
/// end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPair {
    /// Start point.
    pub start: BoundaryPoint,
    /// End point.
    pub end: BoundaryPoint,
}

impl From<Range> for BoundaryPair {
    fn from(range: Range) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

impl Document {
    /// Order of two boundary points, or `None` when they are in different trees.
    pub fn compare_points(&self, a: BoundaryPoint, b: BoundaryPoint) -> Option<Ordering> {
        let (root_a, mut path_a) = self.index_path(a.container);
        let (root_b, mut path_b) = self.index_path(b.container);
        if root_a != root_b {
            return None;
        }
        path_a.push(a.offset);
        path_b.push(b.offset);
        Some(path_a.cmp(&path_b))
    }

    /// Document order of two nodes, or `None` when they are in different trees.
    ///
    /// An ancestor sorts before its descendants.
    pub fn compare_nodes(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        let (root_a, path_a) = self.index_path(a);
        let (root_b, path_b) = self.index_path(b);
        (root_a == root_b).then(|| path_a.cmp(&path_b))
    }

    fn check_point(&self, point: BoundaryPoint) -> Result<(), EngineError> {
        if !self.is_alive(point.container) {
            return Err(EngineError::StaleNode(point.container));
        }
        let length = self.length(point.container);
        if point.offset > length {
            return Err(EngineError::InvalidOffset {
                offset: point.offset,
                length,
            });
        }
        Ok(())
    }
}

impl Range {
    /// Range from `start` to `end`. The caller guarantees `start <= end`.
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Collapsed range at `(container, offset)`.
    pub fn collapsed_at(container: NodeId, offset: usize) -> Self {
        let point = BoundaryPoint::new(container, offset);
        Self {
            start: point,
            end: point,
        }
    }

    /// Start point.
    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    /// End point.
    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    /// Returns `true` if start and end are the same point.
    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Move the start. Collapses onto the new point if it lies after the end or in another
    /// tree.
    pub fn set_start(
        &mut self,
        doc: &Document,
        container: NodeId,
        offset: usize,
    ) -> Result<(), EngineError> {
        let point = BoundaryPoint::new(container, offset);
        doc.check_point(point)?;
        match doc.compare_points(point, self.end) {
            Some(Ordering::Less | Ordering::Equal) => {}
            _ => self.end = point,
        }
        self.start = point;
        Ok(())
    }

    /// Move the end. Collapses onto the new point if it lies before the start or in another
    /// tree.
    pub fn set_end(
        &mut self,
        doc: &Document,
        container: NodeId,
        offset: usize,
    ) -> Result<(), EngineError> {
        let point = BoundaryPoint::new(container, offset);
        doc.check_point(point)?;
        match doc.compare_points(point, self.start) {
            Some(Ordering::Greater | Ordering::Equal) => {}
            _ => self.start = point,
        }
        self.end = point;
        Ok(())
    }

    /// Collapse onto the start (`true`) or the end (`false`).
    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    fn position_of(doc: &Document, node: NodeId) -> Result<(NodeId, usize), EngineError> {
        let parent = doc.parent(node).ok_or_else(|| {
            EngineError::Contract(format!("{} has no parent", doc.describe(node)))
        })?;
        Ok((parent, doc.index_of(node).unwrap_or(0)))
    }

    /// Move the start right before `node`.
    pub fn set_start_before(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        let (parent, index) = Self::position_of(doc, node)?;
        self.set_start(doc, parent, index)
    }

    /// Move the start right after `node`.
    pub fn set_start_after(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        let (parent, index) = Self::position_of(doc, node)?;
        self.set_start(doc, parent, index + 1)
    }

    /// Move the end right before `node`.
    pub fn set_end_before(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        let (parent, index) = Self::position_of(doc, node)?;
        self.set_end(doc, parent, index)
    }

    /// Move the end right after `node`.
    pub fn set_end_after(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        let (parent, index) = Self::position_of(doc, node)?;
        self.set_end(doc, parent, index + 1)
    }

    /// Select `node` itself, from before it to after it.
    pub fn select_node(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        let (parent, index) = Self::position_of(doc, node)?;
        self.start = BoundaryPoint::new(parent, index);
        self.end = BoundaryPoint::new(parent, index + 1);
        Ok(())
    }

    /// Select the contents of `node`.
    pub fn select_node_contents(&mut self, doc: &Document, node: NodeId) -> Result<(), EngineError> {
        if !doc.is_alive(node) {
            return Err(EngineError::StaleNode(node));
        }
        self.start = BoundaryPoint::new(node, 0);
        self.end = BoundaryPoint::new(node, doc.length(node));
        Ok(())
    }

    /// Apply a boundary pair produced by a merge.
    pub fn apply(&mut self, doc: &Document, pair: BoundaryPair) -> Result<(), EngineError> {
        self.set_start(doc, pair.start.container, pair.start.offset)?;
        self.set_end(doc, pair.end.container, pair.end.offset)
    }

    /// Deepest node containing both containers, or `None` when they are in different trees.
    pub fn common_ancestor(&self, doc: &Document) -> Option<NodeId> {
        let mut node = Some(self.start.container);
        while let Some(n) = node {
            if doc.contains(n, self.end.container) {
                return Some(n);
            }
            node = doc.parent(n);
        }
        None
    }

    /// Returns `true` if both points are live, in bounds and inside `root`.
    pub fn is_within(&self, doc: &Document, root: NodeId) -> bool {
        [self.start, self.end].iter().all(|&p| {
            doc.check_point(p).is_ok() && doc.contains(root, p.container)
        })
    }
}
