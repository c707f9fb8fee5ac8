use serde::{Deserialize, Serialize};
use vellum_doc_core::{
    Document, MarkKind, Node, Selection, node_at_path, selected_text, selection_has_mark,
};

use crate::geometry::Position;
use crate::platform::NativeSelection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading(u8),
    Quote,
    Aside,
    BulletedList,
    NumberedList,
    CheckList,
    CodeBlock,
}

impl BlockType {
    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Paragraph => "Normal",
            BlockType::Heading(1) => "Heading 1",
            BlockType::Heading(2) => "Heading 2",
            BlockType::Heading(3) => "Heading 3",
            BlockType::Heading(4) => "Heading 4",
            BlockType::Heading(5) => "Heading 5",
            BlockType::Heading(_) => "Heading 6",
            BlockType::Quote => "Quote",
            BlockType::Aside => "Aside",
            BlockType::BulletedList => "Bulleted List",
            BlockType::NumberedList => "Numbered List",
            BlockType::CheckList => "Check List",
            BlockType::CodeBlock => "Code Block",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            BlockType::BulletedList | BlockType::NumberedList | BlockType::CheckList
        )
    }

    pub(crate) fn from_list_kind(list_kind: &str) -> Self {
        match list_kind {
            "numbered" => BlockType::NumberedList,
            "check" => BlockType::CheckList,
            _ => BlockType::BulletedList,
        }
    }

    pub(crate) fn list_kind(&self) -> Option<&'static str> {
        match self {
            BlockType::BulletedList => Some("bulleted"),
            BlockType::NumberedList => Some("numbered"),
            BlockType::CheckList => Some("check"),
            _ => None,
        }
    }
}

/// Semantic formatting state of the current selection. Derived, never mutated
/// in place; callers compare against the previous record to suppress
/// redundant visual updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingState {
    pub block_type: BlockType,
    pub bold: bool,
    pub italic: bool,
    pub has_text_selection: bool,
}

impl Default for FormattingState {
    fn default() -> Self {
        Self {
            block_type: BlockType::Paragraph,
            bold: false,
            italic: false,
            has_text_selection: false,
        }
    }
}

/// Visual placement state owned by the position controller.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolbarVisualState {
    pub visible: bool,
    pub position: Position,
    pub sticky: bool,
}

/// Block type of the anchor's block, honoring the list precedence rule: a
/// `list_item` reports the nearest enclosing list's kind, not its own default.
pub fn block_type_at(doc: &Document, selection: &Selection, previous: BlockType) -> BlockType {
    let anchor = &selection.anchor;
    let Some((_, block_path)) = anchor.path.split_last() else {
        return previous;
    };
    if block_path.is_empty() {
        return previous;
    }
    let Some(Node::Element(el)) = node_at_path(doc, block_path) else {
        return previous;
    };

    if el.kind == "list_item" {
        let mut path = block_path.to_vec();
        while path.len() > 1 {
            path.pop();
            if let Some(Node::Element(ancestor)) = node_at_path(doc, &path) {
                if let Some(list_kind) = ancestor.list_kind() {
                    return BlockType::from_list_kind(list_kind);
                }
            }
        }
        return BlockType::BulletedList;
    }

    if let Some(level) = el.heading_level() {
        return BlockType::Heading(level as u8);
    }

    match el.kind.as_str() {
        "paragraph" => BlockType::Paragraph,
        "quote" => BlockType::Quote,
        "aside" => BlockType::Aside,
        "code_block" => BlockType::CodeBlock,
        // Unrecognized block kinds do not erase prior known state.
        _ => previous,
    }
}

/// Pure derivation of [`FormattingState`] from the current document and
/// selection snapshots. `anchor_in_root` is the platform's containment check
/// of the native anchor against the editable root.
pub fn derive_formatting_state(
    doc: &Document,
    selection: Option<&Selection>,
    native: Option<&NativeSelection>,
    anchor_in_root: bool,
    previous: &FormattingState,
) -> FormattingState {
    let Some(selection) = selection else {
        return FormattingState {
            has_text_selection: false,
            ..previous.clone()
        };
    };

    let mut next = previous.clone();
    next.bold = selection_has_mark(doc, selection, MarkKind::Bold);
    next.italic = selection_has_mark(doc, selection, MarkKind::Italic);
    next.block_type = block_type_at(doc, selection, previous.block_type);

    let anchor_is_text = matches!(
        node_at_path(doc, &selection.anchor.path),
        Some(Node::Text(_))
    );
    let native_expanded = native.is_some_and(|n| !n.collapsed);
    next.has_text_selection = native_expanded
        && anchor_in_root
        && anchor_is_text
        && !selected_text(doc, selection).is_empty();

    next
}
