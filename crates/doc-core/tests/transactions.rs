use vellum_doc_core::{
    Document, Editor, Node, NodeRegistry, Op, Point, Selection, Transaction,
};

fn block_text(doc: &Document, row: usize) -> String {
    let Node::Element(el) = &doc.children[row] else {
        panic!("expected element block");
    };
    el.inline_text()
}

#[test]
fn insert_text_shifts_selection_and_undo_redo_restore_both() {
    let doc = Document {
        children: vec![Node::paragraph("ab")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 1));
    let mut editor = Editor::new(doc, selection, NodeRegistry::richtext());

    editor
        .apply(Transaction::new(vec![Op::InsertText {
            path: vec![0, 0],
            offset: 1,
            text: "XY".to_string(),
        }]))
        .unwrap();

    assert_eq!(block_text(editor.doc(), 0), "aXYb");
    assert_eq!(editor.selection().focus.offset, 3);
    assert!(editor.can_undo());

    assert!(editor.undo());
    assert_eq!(block_text(editor.doc(), 0), "ab");
    assert_eq!(editor.selection().focus.offset, 1);
    assert!(editor.can_redo());

    assert!(editor.redo());
    assert_eq!(block_text(editor.doc(), 0), "aXYb");
    assert_eq!(editor.selection().focus.offset, 3);
}

#[test]
fn remove_node_before_selection_shifts_paths() {
    let doc = Document {
        children: vec![Node::paragraph("a"), Node::paragraph("b")],
    };
    let selection = Selection::collapsed(Point::new(vec![1, 0], 1));
    let mut editor = Editor::new(doc, selection, NodeRegistry::richtext());

    editor
        .apply(Transaction::new(vec![Op::RemoveNode { path: vec![0] }]))
        .unwrap();

    assert_eq!(editor.doc().children.len(), 1);
    assert_eq!(editor.selection().focus.path, vec![0, 0]);
    assert_eq!(editor.selection().focus.offset, 1);
}

#[test]
fn out_of_bounds_op_is_rejected_and_document_unchanged() {
    let doc = Document {
        children: vec![Node::paragraph("a")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let mut editor = Editor::new(doc, selection, NodeRegistry::richtext());

    let result = editor.apply(Transaction::new(vec![Op::RemoveNode { path: vec![3] }]));
    assert!(result.is_err());
    assert_eq!(editor.doc().children.len(), 1);
    assert_eq!(block_text(editor.doc(), 0), "a");
}

#[test]
fn explicit_selection_after_is_clamped_to_existing_text() {
    let doc = Document {
        children: vec![Node::paragraph("short")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let mut editor = Editor::new(doc, selection, NodeRegistry::richtext());

    editor
        .apply(
            Transaction::new(vec![Op::InsertText {
                path: vec![0, 0],
                offset: 0,
                text: "x".to_string(),
            }])
            .selection_after(Selection::collapsed(Point::new(vec![9, 9], 42))),
        )
        .unwrap();

    assert_eq!(editor.selection().focus.path, vec![0, 0]);
    assert_eq!(editor.selection().focus.offset, 6);
}

#[test]
fn block_replacement_preserves_text_and_selection() {
    let doc = Document {
        children: vec![Node::paragraph("quoted")],
    };
    let selection = Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![0, 0], 6),
    };
    let mut editor = Editor::new(doc, selection.clone(), NodeRegistry::richtext());

    editor
        .apply(
            Transaction::new(vec![
                Op::RemoveNode { path: vec![0] },
                Op::InsertNode {
                    path: vec![0],
                    node: Node::block("quote", "quoted"),
                },
            ])
            .selection_after(selection),
        )
        .unwrap();

    let Node::Element(el) = &editor.doc().children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.kind, "quote");
    assert_eq!(el.inline_text(), "quoted");
    assert_eq!(editor.selection().focus.offset, 6);
}
