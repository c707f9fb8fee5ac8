use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ops::Path;

pub type Attrs = BTreeMap<String, serde_json::Value>;
pub type ElementKind = String;

/// The externally-owned content tree. Block elements (`paragraph`, `heading`,
/// `quote`, `aside`, `code_block`, `list_item`) hold inline text children;
/// `list` elements hold `list_item` children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Document {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
}

impl Node {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::block("paragraph", text)
    }

    pub fn block(kind: impl Into<ElementKind>, text: impl Into<String>) -> Self {
        Node::Element(ElementNode {
            kind: kind.into(),
            attrs: Attrs::default(),
            children: vec![Node::text(text)],
        })
    }

    pub fn heading(level: u64, text: impl Into<String>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(
            "level".to_string(),
            serde_json::Value::Number(serde_json::Number::from(level.clamp(1, 6))),
        );
        Node::Element(ElementNode {
            kind: "heading".to_string(),
            attrs,
            children: vec![Node::text(text)],
        })
    }

    pub fn list(list_kind: &str, items: Vec<Node>) -> Self {
        let mut attrs = Attrs::default();
        attrs.insert(
            "list_kind".to_string(),
            serde_json::Value::String(list_kind.to_string()),
        );
        Node::Element(ElementNode {
            kind: "list".to_string(),
            attrs,
            children: items,
        })
    }

    pub fn list_item(text: impl Into<String>) -> Self {
        Node::block("list_item", text)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(TextNode {
            text: text.into(),
            marks: Marks::default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub kind: ElementKind,
    #[serde(default)]
    pub attrs: Attrs,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl ElementNode {
    pub fn heading_level(&self) -> Option<u64> {
        if self.kind != "heading" {
            return None;
        }
        Some(
            self.attrs
                .get("level")
                .and_then(|v| v.as_u64())
                .unwrap_or(1)
                .clamp(1, 6),
        )
    }

    pub fn list_kind(&self) -> Option<&str> {
        if self.kind != "list" {
            return None;
        }
        Some(
            self.attrs
                .get("list_kind")
                .and_then(|v| v.as_str())
                .unwrap_or("bulleted"),
        )
    }

    /// Concatenated text of the element's inline children.
    pub fn inline_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// A text block holds inline content directly; containers hold nested
    /// elements instead.
    pub fn is_text_block(&self) -> bool {
        !self
            .children
            .iter()
            .any(|n| matches!(n, Node::Element(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// Model selection: a pair of points into text nodes. A caret is a collapsed
/// range; there is no separate caret kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

pub fn node_at_path<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a Node> {
    if path.is_empty() {
        return None;
    }

    let mut node = doc.children.get(path[0])?;
    for &ix in path.iter().skip(1) {
        node = match node {
            Node::Element(el) => el.children.get(ix)?,
            Node::Text(_) => return None,
        };
    }
    Some(node)
}

pub fn children_at_path<'a>(doc: &'a Document, parent_path: &[usize]) -> Option<&'a [Node]> {
    if parent_path.is_empty() {
        return Some(&doc.children);
    }
    match node_at_path(doc, parent_path)? {
        Node::Element(el) => Some(&el.children),
        Node::Text(_) => None,
    }
}
