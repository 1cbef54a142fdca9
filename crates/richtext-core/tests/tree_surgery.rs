//! Structural edits on parsed documents.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use richtext_core::{
    Document, EditContext, EditorConfig, NodeId, Range, SilentReporter, parse_fragment,
    serialize_children,
};

fn document(html: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("div");
    let frag = parse_fragment(&mut doc, html).unwrap();
    doc.append_child(root, frag).unwrap();
    doc.discard(frag);
    (doc, root)
}

#[test]
fn test_split_text_up_to_root() {
    let (mut doc, root) = document("<div>abcd</div>");
    let config = EditorConfig::default();
    let text = doc.first_child(doc.first_child(root).unwrap()).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let second = ctx.split(text, 2, root).unwrap().unwrap();

    assert_eq!(serialize_children(&doc, root), "<div>ab</div><div>cd</div>");
    assert_eq!(doc.child(root, 1), Some(second));
}

#[test]
fn test_alike_spans_merge() {
    let (mut doc, root) = document(
        "<div><span class=\"color\" style=\"color:red\">a</span>\
         <span class=\"color\" style=\"color:red\">b</span></div>",
    );
    let config = EditorConfig::default();
    let block = doc.first_child(root).unwrap();
    let mut range = Range::collapsed_at(block, 0);

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.merge_inlines(block, &mut range).unwrap();

    assert_eq!(
        serialize_children(&doc, root),
        "<div><span class=\"color\" style=\"color:red\">ab</span></div>"
    );
    let span = doc.first_child(block).unwrap();
    assert_eq!(doc.length(span), 1);
}

#[test]
fn test_merge_undoes_inline_split() {
    let (mut doc, root) = document("<div><b>abcd</b></div>");
    let config = EditorConfig::default();
    let block = doc.first_child(root).unwrap();
    let text = doc.first_child(doc.first_child(block).unwrap()).unwrap();
    let mut range = Range::collapsed_at(block, 0);

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.split(text, 2, block).unwrap();
    assert_eq!(
        serialize_children(ctx.doc, root),
        "<div><b>ab</b><b>cd</b></div>"
    );
    ctx.merge_inlines(block, &mut range).unwrap();

    assert_eq!(serialize_children(&doc, root), "<div><b>abcd</b></div>");
}

#[test]
fn test_different_inlines_stay_apart() {
    let (mut doc, root) = document("<div><b>a</b><i>b</i><b class=\"x\">c</b></div>");
    let config = EditorConfig::default();
    let block = doc.first_child(root).unwrap();
    let mut range = Range::collapsed_at(block, 0);

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.merge_inlines(block, &mut range).unwrap();

    assert_eq!(
        serialize_children(&doc, root),
        "<div><b>a</b><i>b</i><b class=\"x\">c</b></div>"
    );
}

#[test]
fn test_split_result_is_child_of_stop() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..50 {
        let (mut doc, root) = document("<div><b><i>abcdef</i></b>gh</div><div>ij</div>");
        let config = EditorConfig::default();
        let block = doc.first_child(root).unwrap();
        let bold = doc.first_child(block).unwrap();
        let italic = doc.first_child(bold).unwrap();
        let text = doc.first_child(italic).unwrap();
        let offset = rng.gen_range(0..=6);
        let stop = [italic, bold, block, root][rng.gen_range(0..4)];

        let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
        let result = ctx.split(text, offset, stop).unwrap();

        if let Some(node) = result {
            assert_eq!(doc.parent(node), Some(stop), "offset {offset}");
        }
        assert_eq!(doc.text_content(root), "abcdefghij");
    }
}

#[test]
fn test_split_rejects_foreign_stop() {
    let (mut doc, root) = document("<div>ab</div><div>cd</div>");
    let config = EditorConfig::default();
    let first = doc.first_child(root).unwrap();
    let second = doc.child(root, 1).unwrap();
    let text = doc.first_child(first).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    let err = ctx.split(text, 1, second).unwrap_err();

    assert_eq!(err, richtext_core::EngineError::StopNodeNotAncestor);
    assert_eq!(
        serialize_children(&doc, root),
        "<div>ab</div><div>cd</div>"
    );
}

#[test]
fn test_empty_block_gets_line_break() {
    let (mut doc, root) = document("<div></div><div><b></b></div>");
    let config = EditorConfig::default();
    let first = doc.first_child(root).unwrap();
    let second = doc.child(root, 1).unwrap();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.fix_cursor(first).unwrap();
    ctx.fix_cursor(second).unwrap();

    assert_eq!(
        serialize_children(&doc, root),
        "<div><br></div><div><b></b><br></div>"
    );
}

#[test]
fn test_stray_inline_content_is_wrapped() {
    let (mut doc, root) = document("ab<b>c</b><div>d</div>e");
    let config = EditorConfig::default();

    let mut ctx = EditContext::new(&mut doc, root, &config, &SilentReporter);
    ctx.fix_container(root).unwrap();

    assert_eq!(
        serialize_children(&doc, root),
        "<div>ab<b>c</b></div><div>d</div><div>e</div>"
    );
}
