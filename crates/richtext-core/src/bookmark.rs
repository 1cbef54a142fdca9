//! Selection bookmarks.
//!
//! A bookmark stores a range inside the tree itself as two hidden `input` markers, so the
//! selection survives serialization into an undo snapshot and back.

use crate::context::EditContext;
use crate::error::EngineError;
use crate::node::{Attributes, NodeId};
use crate::range::Range;
use crate::walker::{Show, TreeWalker};
use std::cmp::Ordering;
use tracing::warn;

/// Id of the marker placed at the start of a saved range.
pub const START_SELECTION_ID: &str = "rte-selection-start";
/// Id of the marker placed at the end of a saved range.
pub const END_SELECTION_ID: &str = "rte-selection-end";

impl EditContext<'_> {
    fn create_marker(&mut self, id: &str) -> NodeId {
        let attributes: Attributes = [("id", id), ("type", "hidden")].into_iter().collect();
        self.doc.create_element_with("input", attributes)
    }

    fn find_marker(&self, id: &str) -> Option<NodeId> {
        let mut walker = TreeWalker::new(self.root, Show::ELEMENT, |d, n| {
            d.has_tag(n, "input") && d.attribute(n, "id") == Some(id)
        });
        walker.next_node(self.doc)
    }

    /// Insert the two bookmark markers at the ends of `range`, leaving `range` between them.
    pub fn save_range_to_bookmark(&mut self, range: &mut Range) -> Result<(), EngineError> {
        let mut start = self.create_marker(START_SELECTION_ID);
        let mut end = self.create_marker(END_SELECTION_ID);

        self.insert_node_in_range(range, start)?;
        range.collapse(false);
        self.insert_node_in_range(range, end)?;

        // In a collapsed range the start marker can land after the end marker.
        if self.doc.compare_nodes(end, start) == Some(Ordering::Less) {
            self.doc.set_attribute(start, "id", END_SELECTION_ID)?;
            self.doc.set_attribute(end, "id", START_SELECTION_ID)?;
            std::mem::swap(&mut start, &mut end);
        }

        range.set_start_after(self.doc, start)?;
        range.set_end_before(self.doc, end)
    }

    /// Remove the bookmark markers and return the range they delimited.
    ///
    /// Text nodes split by the markers are joined again. A collapsed range left between
    /// element children moves into an adjacent text node. Returns `None` when the tree holds
    /// no complete bookmark; a lone marker is removed.
    pub fn restore_range_from_bookmark(&mut self) -> Result<Option<Range>, EngineError> {
        let (start, end) = match (
            self.find_marker(START_SELECTION_ID),
            self.find_marker(END_SELECTION_ID),
        ) {
            (Some(start), Some(end)) => (start, end),
            (None, None) => return Ok(None),
            (lone_start, lone_end) => {
                warn!("removing incomplete selection bookmark");
                for marker in lone_start.into_iter().chain(lone_end) {
                    self.doc.discard(marker);
                }
                return Ok(None);
            }
        };

        let missing_parent =
            || EngineError::StructuralInvariant("bookmark marker is detached".to_string());
        let start_container = self.doc.parent(start).ok_or_else(missing_parent)?;
        let end_container = self.doc.parent(end).ok_or_else(missing_parent)?;
        let start_offset = self.doc.index_of(start).unwrap_or(0);
        let mut end_offset = self.doc.index_of(end).unwrap_or(0);
        if start_container == end_container {
            end_offset = end_offset.saturating_sub(1);
        }

        self.doc.discard(start);
        self.doc.discard(end);

        let mut range = Range::collapsed_at(start_container, start_offset);
        range.set_end(self.doc, end_container, end_offset)?;

        // Join the text nodes the markers split.
        self.merge_inlines(start_container, &mut range)?;
        if start_container != end_container && self.doc.is_alive(end_container) {
            self.merge_inlines(end_container, &mut range)?;
        }

        if range.collapsed() {
            let point = range.start();
            if self.doc.is_element(point.container) {
                let after = self
                    .doc
                    .child(point.container, point.offset)
                    .filter(|&n| self.doc.is_text(n));
                let before = point
                    .offset
                    .checked_sub(1)
                    .and_then(|i| self.doc.child(point.container, i))
                    .filter(|&n| self.doc.is_text(n));
                if let Some(text) = after {
                    range = Range::collapsed_at(text, 0);
                } else if let Some(text) = before {
                    range = Range::collapsed_at(text, self.doc.length(text));
                }
            }
        }
        Ok(Some(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::error::SilentReporter;
    use crate::markup::{parse_fragment, serialize_children};
    use crate::node::Document;
    use crate::range::BoundaryPoint;
    use pretty_assertions::assert_eq;

    fn setup(html: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let frag = parse_fragment(&mut doc, html).unwrap();
        doc.append_child(root, frag).unwrap();
        (doc, root)
    }

    #[test]
    fn test_save_places_markers_around_selection() {
        let (mut doc, root) = setup("<div>abcd</div>");
        let config = EditorConfig::default();
        let block = doc.first_child(root).unwrap();
        let t = doc.first_child(block).unwrap();
        let mut range = Range::collapsed_at(t, 1);
        range.set_end(&doc, t, 3).unwrap();

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.save_range_to_bookmark(&mut range).unwrap();
        assert_eq!(
            serialize_children(&doc, root),
            "<div>a<input id=\"rte-selection-start\" type=\"hidden\">bc\
             <input id=\"rte-selection-end\" type=\"hidden\">d</div>"
        );
        assert_eq!(range.start(), BoundaryPoint::new(block, 2));
        assert_eq!(range.end(), BoundaryPoint::new(block, 3));
    }

    #[test]
    fn test_restore_joins_split_text() {
        let (mut doc, root) = setup("<div>abcd</div>");
        let config = EditorConfig::default();
        let t = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        let mut range = Range::collapsed_at(t, 1);
        range.set_end(&doc, t, 3).unwrap();

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.save_range_to_bookmark(&mut range).unwrap();
        let restored = ctx.restore_range_from_bookmark().unwrap().unwrap();
        assert_eq!(serialize_children(&doc, root), "<div>abcd</div>");
        assert_eq!(restored.start(), BoundaryPoint::new(t, 1));
        assert_eq!(restored.end(), BoundaryPoint::new(t, 3));
    }

    #[test]
    fn test_collapsed_round_trip() {
        let (mut doc, root) = setup("<div>abcd</div>");
        let config = EditorConfig::default();
        let t = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        let mut range = Range::collapsed_at(t, 2);

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.save_range_to_bookmark(&mut range).unwrap();
        assert!(range.collapsed());
        let restored = ctx.restore_range_from_bookmark().unwrap().unwrap();
        assert_eq!(restored, Range::collapsed_at(t, 2));
    }

    #[test]
    fn test_collapsed_range_moves_into_next_text() {
        let (mut doc, root) = setup("<div><b>x</b>ab</div>");
        let config = EditorConfig::default();
        let block = doc.first_child(root).unwrap();
        let text = doc.child(block, 1).unwrap();
        let mut range = Range::collapsed_at(block, 1);

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        ctx.save_range_to_bookmark(&mut range).unwrap();
        let restored = ctx.restore_range_from_bookmark().unwrap().unwrap();
        assert_eq!(restored, Range::collapsed_at(text, 0));
    }

    #[test]
    fn test_restore_without_markers() {
        let (mut doc, root) = setup("<div>ab</div>");
        let config = EditorConfig::default();
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        assert_eq!(ctx.restore_range_from_bookmark().unwrap(), None);
    }

    #[test]
    fn test_lone_marker_is_removed() {
        let (mut doc, root) =
            setup("<div>a<input id=\"rte-selection-start\" type=\"hidden\">b</div>");
        let config = EditorConfig::default();
        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        assert_eq!(ctx.restore_range_from_bookmark().unwrap(), None);
        assert_eq!(serialize_children(&doc, root), "<div>ab</div>");
    }
}
