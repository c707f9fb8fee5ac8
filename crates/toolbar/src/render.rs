use serde::Serialize;

use crate::dispatch::FeatureGates;
use crate::geometry::Position;
use crate::state::{BlockType, FormattingState, ToolbarVisualState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolbarAction {
    ToggleBold,
    ToggleItalic,
    SetBlock(BlockType),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarButton {
    pub id: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub active: bool,
    pub action: ToolbarAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum ToolbarItem {
    Button(ToolbarButton),
    Separator,
}

/// Host-agnostic description of the toolbar: what to show, where, and which
/// action each button binds to. Any UI layer can map this onto widgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolbarRender {
    pub visible: bool,
    pub position: Position,
    pub items: Vec<ToolbarItem>,
}

pub fn render_toolbar(
    visual: &ToolbarVisualState,
    state: &FormattingState,
    gates: &FeatureGates,
) -> ToolbarRender {
    let mut items = vec![
        ToolbarItem::Button(ToolbarButton {
            id: "bold",
            icon: "bold",
            label: "Format text as bold",
            active: state.bold,
            action: ToolbarAction::ToggleBold,
        }),
        ToolbarItem::Button(ToolbarButton {
            id: "italic",
            icon: "italic",
            label: "Format text as italics",
            active: state.italic,
            action: ToolbarAction::ToggleItalic,
        }),
    ];

    if gates.headings {
        items.push(ToolbarItem::Button(ToolbarButton {
            id: "h2",
            icon: "heading-one",
            label: "Toggle heading 1",
            active: state.block_type == BlockType::Heading(2),
            action: ToolbarAction::SetBlock(BlockType::Heading(2)),
        }));
        items.push(ToolbarItem::Button(ToolbarButton {
            id: "h3",
            icon: "heading-two",
            label: "Toggle heading 2",
            active: state.block_type == BlockType::Heading(3),
            action: ToolbarAction::SetBlock(BlockType::Heading(3)),
        }));
    }

    if gates.quotes {
        items.push(ToolbarItem::Separator);
        items.push(ToolbarItem::Button(ToolbarButton {
            id: "quote",
            icon: if state.block_type == BlockType::Aside {
                "quote-one"
            } else {
                "quote-two"
            },
            label: "Toggle blockquote",
            active: matches!(state.block_type, BlockType::Quote | BlockType::Aside),
            action: ToolbarAction::SetBlock(BlockType::Quote),
        }));
    }

    ToolbarRender {
        visible: visual.visible,
        position: visual.position,
        items,
    }
}
