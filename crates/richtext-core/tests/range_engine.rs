//! Range operations across blocks, and boundary movement properties.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use richtext_core::{
    BoundaryPoint, Document, EditContext, EditorConfig, NodeId, Range, Show, SilentReporter,
    TreeWalker, parse_fragment, serialize_children,
};

fn document(html: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("div");
    let frag = parse_fragment(&mut doc, html).unwrap();
    doc.append_child(root, frag).unwrap();
    doc.discard(frag);
    (doc, root)
}

fn text_nodes(doc: &Document, root: NodeId) -> Vec<NodeId> {
    TreeWalker::all(root, Show::TEXT).iter(doc).collect()
}

/// Point at character `index` of the flattened text. `at_end` picks the position after the
/// previous character instead of before the next one.
fn point_at(doc: &Document, texts: &[NodeId], index: usize, at_end: bool) -> BoundaryPoint {
    let mut base = 0;
    for &text in texts {
        let len = doc.length(text);
        let inside = if at_end {
            index > base && index <= base + len
        } else {
            index >= base && index < base + len
        };
        if inside {
            return BoundaryPoint::new(text, index - base);
        }
        base += len;
    }
    panic!("index {index} is outside the text");
}

#[test]
fn test_delete_across_blocks_joins_them() {
    let (mut doc, root) = document("<div>foo</div><div>bar</div>");
    let config = EditorConfig::default();
    let foo = doc.first_child(doc.child(root, 0).unwrap()).unwrap();
    let bar = doc.first_child(doc.child(root, 1).unwrap()).unwrap();
    let mut range = Range::collapsed_at(foo, 3);
    range.set_end(&doc, bar, 0).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.delete_contents_of_range(&mut range).unwrap();

    assert_eq!(serialize_children(&doc, root), "<div>foobar</div>");
    assert!(range.collapsed());
    assert_eq!(range.start(), BoundaryPoint::new(foo, 3));
}

#[test]
fn test_delete_inside_text() {
    let (mut doc, root) = document("<div>abcdef</div><div>gh</div>");
    let config = EditorConfig::default();
    let text = doc.first_child(doc.first_child(root).unwrap()).unwrap();
    let mut range = Range::collapsed_at(text, 1);
    range.set_end(&doc, text, 5).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let removed = ctx.delete_contents_of_range(&mut range).unwrap();

    assert_eq!(serialize_children(&doc, root), "<div>af</div><div>gh</div>");
    assert_eq!(doc.text_content(removed), "bcde");
    assert_eq!(range, Range::collapsed_at(text, 1));
}

#[test]
fn test_collapsed_range_resolves_crosswise() {
    let (mut doc, root) = document("<div>ab</div>");
    let config = EditorConfig::default();
    let text = doc.first_child(doc.first_child(root).unwrap()).unwrap();
    let mut range = Range::collapsed_at(root, 1);

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.move_range_boundaries_down_tree(&mut range).unwrap();

    assert_eq!(range.start(), BoundaryPoint::new(text, 2));
    assert_eq!(range.end(), BoundaryPoint::new(root, 1));
}

#[test]
fn test_extract_then_insert_restores_block() {
    let (mut doc, root) = document("<div>ab<b>cd</b>ef</div>");
    let config = EditorConfig::default();
    let texts = text_nodes(&doc, root);
    let mut range = Range::new(
        point_at(&doc, &texts, 1, false),
        point_at(&doc, &texts, 5, true),
    );

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let frag = ctx.extract_contents_of_range(&mut range, None).unwrap();
    assert_eq!(serialize_children(ctx.doc, root), "<div>af</div>");
    assert_eq!(serialize_children(ctx.doc, frag), "b<b>cd</b>e");

    ctx.insert_tree_fragment_into_range(&mut range, frag).unwrap();
    assert_eq!(serialize_children(&doc, root), "<div>ab<b>cd</b>ef</div>");
}

#[test]
fn test_boundary_movement_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(42);
    let html = "<div>ab<b>cd<i>ef</i></b>gh</div><blockquote><div>ij</div><div><s>kl</s>m</div></blockquote>";

    for _ in 0..100 {
        let (mut doc, root) = document(html);
        let config = EditorConfig::default();
        let texts = text_nodes(&doc, root);
        let total = doc.text_content(root).chars().count();
        let a = rng.gen_range(0..total);
        let b = rng.gen_range(a + 1..=total);
        let start = point_at(&doc, &texts, a, false);
        let end = point_at(&doc, &texts, b, true);

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);

        let mut up = Range::new(start, end);
        ctx.move_range_boundaries_up_tree(&mut up, Some(root), Some(root))
            .unwrap();
        let mut again = up;
        ctx.move_range_boundaries_up_tree(&mut again, Some(root), Some(root))
            .unwrap();
        assert_eq!(again, up, "up tree, chars {a}..{b}");

        let mut down = up;
        ctx.move_range_boundaries_down_tree(&mut down).unwrap();
        let mut again = down;
        ctx.move_range_boundaries_down_tree(&mut again).unwrap();
        assert_eq!(again, down, "down tree, chars {a}..{b}");
        assert_eq!(down, Range::new(start, end), "chars {a}..{b}");
    }
}

#[test]
fn test_expand_to_blocks_covers_whole_blocks() {
    let (mut doc, root) = document("<div>ab</div><div>cd</div><div>ef</div>");
    let config = EditorConfig::default();
    let texts = text_nodes(&doc, root);
    let mut range = Range::new(
        point_at(&doc, &texts, 1, false),
        point_at(&doc, &texts, 3, true),
    );

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.expand_range_to_block_boundaries(&mut range).unwrap();

    assert_eq!(range.start(), BoundaryPoint::new(root, 0));
    assert_eq!(range.end(), BoundaryPoint::new(root, 2));
}

#[test]
fn test_extract_then_insert_across_blocks_splits_the_start_block() {
    let (mut doc, root) = document("<div>ab</div><div>cd</div>");
    let config = EditorConfig::default();
    let texts = text_nodes(&doc, root);
    let mut range = Range::new(
        point_at(&doc, &texts, 1, false),
        point_at(&doc, &texts, 3, true),
    );

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let frag = ctx.extract_contents_of_range(&mut range, None).unwrap();
    ctx.insert_tree_fragment_into_range(&mut range, frag).unwrap();

    // The seam merge only runs one way, so the round trip keeps the text but not the blocks.
    assert_eq!(
        serialize_children(&doc, root),
        "<div>a</div><div>b</div><div>cd</div>"
    );
    assert_eq!(doc.text_content(root), "abcd");
}

#[test]
fn test_merge_containers_undoes_a_split() {
    let html = "<blockquote><div>a</div><div>b</div></blockquote>";
    let (mut doc, root) = document(html);
    let config = EditorConfig::default();
    let quote = doc.first_child(root).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let second = ctx.split(quote, 1, root).unwrap().unwrap();
    assert_eq!(
        serialize_children(ctx.doc, root),
        "<blockquote><div>a</div></blockquote><blockquote><div>b</div></blockquote>"
    );
    ctx.merge_containers(second).unwrap();

    assert_eq!(serialize_children(&doc, root), html);
}
