use std::rc::Rc;

use vellum_doc_core::{
    Document, Editor, EditorRuntime, MarkKind, Node, NodeRegistry, Point, Selection,
    selection_has_mark,
};
use vellum_toolbar::{BlockType, CommandDispatcher, FeatureGates, block_type_at};

fn runtime_with(children: Vec<Node>, selection: Selection) -> EditorRuntime {
    let doc = Document { children };
    EditorRuntime::new(Editor::new(doc, selection, NodeRegistry::richtext()))
}

fn dispatcher_for(runtime: &EditorRuntime) -> CommandDispatcher {
    CommandDispatcher::new(Rc::new(runtime.clone()))
}

fn block_kinds(runtime: &EditorRuntime) -> Vec<String> {
    use vellum_doc_core::DocumentRuntime as _;
    runtime
        .document()
        .children
        .iter()
        .map(|node| match node {
            Node::Element(el) => el.kind.clone(),
            Node::Text(_) => "text".to_string(),
        })
        .collect()
}

fn block_texts(runtime: &EditorRuntime) -> Vec<String> {
    use vellum_doc_core::DocumentRuntime as _;
    runtime
        .document()
        .children
        .iter()
        .map(|node| match node {
            Node::Element(el) => el.inline_text(),
            Node::Text(_) => String::new(),
        })
        .collect()
}

fn two_paragraph_selection() -> Selection {
    Selection {
        anchor: Point::new(vec![0, 0], 0),
        focus: Point::new(vec![1, 0], 4),
    }
}

#[test]
fn quote_replaces_selected_paragraphs_preserving_text_and_order() {
    use vellum_doc_core::DocumentRuntime as _;

    let runtime = runtime_with(
        vec![Node::paragraph("alpha"), Node::paragraph("beta")],
        two_paragraph_selection(),
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::Quote);

    assert_eq!(block_kinds(&runtime), vec!["quote", "quote"]);
    assert_eq!(block_texts(&runtime), vec!["alpha", "beta"]);

    let doc = runtime.document();
    let selection = runtime.current_selection().unwrap();
    assert_eq!(
        block_type_at(&doc, &selection, BlockType::Paragraph),
        BlockType::Quote
    );
}

#[test]
fn quote_action_cycles_through_aside_back_to_paragraph() {
    let runtime = runtime_with(
        vec![Node::paragraph("alpha"), Node::paragraph("beta")],
        two_paragraph_selection(),
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::Quote);
    assert_eq!(block_kinds(&runtime), vec!["quote", "quote"]);

    dispatcher.set_block_type(BlockType::Quote);
    assert_eq!(block_kinds(&runtime), vec!["aside", "aside"]);

    dispatcher.set_block_type(BlockType::Quote);
    assert_eq!(block_kinds(&runtime), vec!["paragraph", "paragraph"]);
    assert_eq!(block_texts(&runtime), vec!["alpha", "beta"]);
}

#[test]
fn repeated_heading_request_reverts_to_paragraph() {
    use vellum_doc_core::DocumentRuntime as _;

    let runtime = runtime_with(
        vec![Node::paragraph("title")],
        Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 5),
        },
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::Heading(2));
    let doc = runtime.document();
    let Node::Element(el) = &doc.children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.kind, "heading");
    assert_eq!(el.heading_level(), Some(2));

    dispatcher.set_block_type(BlockType::Heading(2));
    let doc = runtime.document();
    let Node::Element(el) = &doc.children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.kind, "paragraph");
    assert!(el.attrs.get("level").is_none());
    assert_eq!(el.inline_text(), "title");
}

#[test]
fn switching_heading_levels_keeps_heading_kind() {
    use vellum_doc_core::DocumentRuntime as _;

    let runtime = runtime_with(
        vec![Node::paragraph("title")],
        Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 5),
        },
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::Heading(2));
    dispatcher.set_block_type(BlockType::Heading(3));

    let doc = runtime.document();
    let Node::Element(el) = &doc.children[0] else {
        panic!("expected element block");
    };
    assert_eq!(el.heading_level(), Some(3));
}

#[test]
fn bold_round_trip_restores_original_state() {
    use vellum_doc_core::DocumentRuntime as _;

    let runtime = runtime_with(
        vec![Node::paragraph("abcde")],
        Selection {
            anchor: Point::new(vec![0, 0], 1),
            focus: Point::new(vec![0, 0], 3),
        },
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.toggle_inline_format(MarkKind::Bold);
    {
        let doc = runtime.document();
        let selection = runtime.current_selection().unwrap();
        assert!(selection_has_mark(&doc, &selection, MarkKind::Bold));
        assert!(!selection_has_mark(&doc, &selection, MarkKind::Italic));
    }

    dispatcher.toggle_inline_format(MarkKind::Bold);
    let doc = runtime.document();
    let selection = runtime.current_selection().unwrap();
    assert!(!selection_has_mark(&doc, &selection, MarkKind::Bold));
    assert!(!selection_has_mark(&doc, &selection, MarkKind::Italic));
    assert_eq!(block_texts(&runtime), vec!["abcde"]);
}

#[test]
fn actions_without_selection_are_dropped_silently() {
    let runtime = runtime_with(
        vec![Node::paragraph("alpha")],
        Selection::collapsed(Point::new(vec![0, 0], 0)),
    );
    let dispatcher = dispatcher_for(&runtime);

    runtime.set_selection(None);
    dispatcher.set_block_type(BlockType::Quote);
    dispatcher.toggle_inline_format(MarkKind::Bold);

    assert_eq!(block_kinds(&runtime), vec!["paragraph"]);
    assert_eq!(block_texts(&runtime), vec!["alpha"]);
}

#[test]
fn list_request_wraps_blocks_into_one_list() {
    use vellum_doc_core::DocumentRuntime as _;

    let runtime = runtime_with(
        vec![Node::paragraph("alpha"), Node::paragraph("beta")],
        two_paragraph_selection(),
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::BulletedList);

    let doc = runtime.document();
    assert_eq!(doc.children.len(), 1);
    let Node::Element(list) = &doc.children[0] else {
        panic!("expected list element");
    };
    assert_eq!(list.kind, "list");
    assert_eq!(list.list_kind(), Some("bulleted"));
    let item_texts: Vec<String> = list
        .children
        .iter()
        .map(|n| match n {
            Node::Element(el) => el.inline_text(),
            Node::Text(_) => String::new(),
        })
        .collect();
    assert_eq!(item_texts, vec!["alpha", "beta"]);

    let selection = runtime.current_selection().unwrap();
    assert_eq!(
        block_type_at(&doc, &selection, BlockType::Paragraph),
        BlockType::BulletedList
    );

    // Set-only: requesting the same list kind again changes nothing.
    dispatcher.set_block_type(BlockType::BulletedList);
    assert_eq!(runtime.document(), doc);
}

#[test]
fn code_block_request_is_set_only() {
    let runtime = runtime_with(
        vec![Node::paragraph("let x = 1;")],
        Selection {
            anchor: Point::new(vec![0, 0], 0),
            focus: Point::new(vec![0, 0], 10),
        },
    );
    let dispatcher = dispatcher_for(&runtime);

    dispatcher.set_block_type(BlockType::CodeBlock);
    assert_eq!(block_kinds(&runtime), vec!["code_block"]);

    dispatcher.set_block_type(BlockType::CodeBlock);
    assert_eq!(block_kinds(&runtime), vec!["code_block"]);
}

#[test]
fn feature_gates_follow_runtime_capabilities() {
    let full = EditorRuntime::with_richtext();
    assert_eq!(
        FeatureGates::query(&full),
        FeatureGates {
            headings: true,
            quotes: true,
        }
    );

    let plain = EditorRuntime::new(Editor::new(
        Document {
            children: vec![Node::paragraph("")],
        },
        Selection::collapsed(Point::new(vec![0, 0], 0)),
        NodeRegistry::core(),
    ));
    assert_eq!(
        FeatureGates::query(&plain),
        FeatureGates {
            headings: false,
            quotes: false,
        }
    );
}
