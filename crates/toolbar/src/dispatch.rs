use std::rc::Rc;

use thiserror::Error;
use tracing::debug;
use vellum_doc_core::{
    Document, DocumentRuntime, ElementNode, MarkKind, Node, Op, Point, Selection, Transaction,
    node_at_path, ordered_selection_points, text_blocks_in_order, toggle_mark_transaction,
};

use crate::state::BlockType;
use crate::transitions::resolve_block_transition;

/// Which structural actions the hosting runtime can represent. Queried once
/// at mount, not per keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureGates {
    pub headings: bool,
    pub quotes: bool,
}

impl FeatureGates {
    pub fn query(runtime: &dyn DocumentRuntime) -> Self {
        Self {
            headings: runtime.supports_node_kind("heading"),
            // The quote action can produce either kind of its cycle, so both
            // must be representable before it is exposed at all.
            quotes: runtime.supports_node_kind("quote") && runtime.supports_node_kind("aside"),
        }
    }
}

#[derive(Debug, Error)]
enum DispatchDrop {
    #[error("no active selection")]
    NoSelection,
    #[error("selection no longer resolves to text content")]
    StaleSelection,
    #[error("selected blocks span multiple containers")]
    SplitContainers,
}

/// Translates toolbar actions into mutation requests against the document
/// runtime. Every failure here is a recoverable race, never surfaced to the
/// user: the request is dropped and logged at debug level.
pub struct CommandDispatcher {
    runtime: Rc<dyn DocumentRuntime>,
}

impl CommandDispatcher {
    pub fn new(runtime: Rc<dyn DocumentRuntime>) -> Self {
        Self { runtime }
    }

    pub fn toggle_inline_format(&self, kind: MarkKind) {
        if let Err(err) = self.try_toggle_inline_format(kind) {
            debug!(error = %err, "inline format toggle dropped");
        }
    }

    fn try_toggle_inline_format(&self, kind: MarkKind) -> Result<(), DispatchDrop> {
        let selection = self
            .runtime
            .current_selection()
            .ok_or(DispatchDrop::NoSelection)?;
        let doc = self.runtime.document();
        let tx = toggle_mark_transaction(&doc, &selection, kind)
            .map_err(|_| DispatchDrop::StaleSelection)?;
        self.runtime.dispatch_mutation(tx);
        Ok(())
    }

    pub fn set_block_type(&self, requested: BlockType) {
        if let Err(err) = self.try_set_block_type(requested) {
            debug!(error = %err, ?requested, "block type change dropped");
        }
    }

    fn try_set_block_type(&self, requested: BlockType) -> Result<(), DispatchDrop> {
        let selection = self
            .runtime
            .current_selection()
            .ok_or(DispatchDrop::NoSelection)?;
        let doc = self.runtime.document();

        for point in [&selection.anchor, &selection.focus] {
            if !matches!(node_at_path(&doc, &point.path), Some(Node::Text(_))) {
                return Err(DispatchDrop::StaleSelection);
            }
        }

        let current = block_type_at_dispatch(&doc, &selection);
        let resulting = resolve_block_transition(current, requested);
        if resulting == current {
            return Ok(());
        }

        let tx = if let Some(list_kind) = resulting.list_kind() {
            build_list_wrap(&doc, &selection, list_kind)?
        } else {
            build_block_replacement(&doc, &selection, resulting)?
        };
        self.runtime.dispatch_mutation(tx);
        Ok(())
    }
}

fn block_type_at_dispatch(doc: &Document, selection: &Selection) -> BlockType {
    // The dispatcher has no prior derivation to fall back on; an unknown
    // block kind dispatches as if neutral.
    crate::state::block_type_at(doc, selection, BlockType::Paragraph)
}

fn replacement_block(el: &ElementNode, resulting: BlockType) -> Node {
    let mut attrs = el.attrs.clone();
    attrs.remove("level");

    let kind = match resulting {
        BlockType::Paragraph => "paragraph",
        BlockType::Heading(level) => {
            attrs.insert(
                "level".to_string(),
                serde_json::Value::Number(serde_json::Number::from(u64::from(level).clamp(1, 6))),
            );
            "heading"
        }
        BlockType::Quote => "quote",
        BlockType::Aside => "aside",
        BlockType::CodeBlock => "code_block",
        BlockType::BulletedList | BlockType::NumberedList | BlockType::CheckList => "list_item",
    };

    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs,
        children: el.children.clone(),
    })
}

fn transition_source(resulting: BlockType) -> &'static str {
    match resulting {
        BlockType::Paragraph => "command:block.set_paragraph",
        BlockType::Heading(_) => "command:block.set_heading",
        BlockType::Quote => "command:block.set_quote",
        BlockType::Aside => "command:block.set_aside",
        BlockType::CodeBlock => "command:block.set_code_block",
        BlockType::BulletedList | BlockType::NumberedList | BlockType::CheckList => {
            "command:block.wrap_list"
        }
    }
}

/// Replaces each selected top-level text block with a block of the resulting
/// kind, preserving inline content and relative order.
fn build_block_replacement(
    doc: &Document,
    selection: &Selection,
    resulting: BlockType,
) -> Result<Transaction, DispatchDrop> {
    let (start, end) = ordered_selection_points(selection);
    let start_block = start
        .path
        .split_last()
        .map(|(_, p)| p.to_vec())
        .ok_or(DispatchDrop::StaleSelection)?;
    let end_block = end
        .path
        .split_last()
        .map(|(_, p)| p.to_vec())
        .ok_or(DispatchDrop::StaleSelection)?;

    let blocks = text_blocks_in_order(doc);
    let start_ix = blocks
        .iter()
        .position(|b| b.path == start_block)
        .ok_or(DispatchDrop::StaleSelection)?;
    let end_ix = blocks
        .iter()
        .position(|b| b.path == end_block)
        .ok_or(DispatchDrop::StaleSelection)?;
    let (start_ix, end_ix) = if start_ix <= end_ix {
        (start_ix, end_ix)
    } else {
        (end_ix, start_ix)
    };

    let mut ops: Vec<Op> = Vec::new();
    for block in blocks.iter().take(end_ix + 1).skip(start_ix) {
        ops.push(Op::RemoveNode {
            path: block.path.clone(),
        });
        ops.push(Op::InsertNode {
            path: block.path.clone(),
            node: replacement_block(block.el, resulting),
        });
    }

    Ok(Transaction::new(ops)
        .selection_after(selection.clone())
        .source(transition_source(resulting)))
}

/// Wraps the selected sibling blocks into one new list, each block becoming a
/// `list_item` with its inline content intact.
fn build_list_wrap(
    doc: &Document,
    selection: &Selection,
    list_kind: &str,
) -> Result<Transaction, DispatchDrop> {
    let (start, end) = ordered_selection_points(selection);
    let start_block = start
        .path
        .split_last()
        .map(|(_, p)| p.to_vec())
        .ok_or(DispatchDrop::StaleSelection)?;
    let end_block = end
        .path
        .split_last()
        .map(|(_, p)| p.to_vec())
        .ok_or(DispatchDrop::StaleSelection)?;

    let (start_ix, start_parent) = start_block
        .split_last()
        .ok_or(DispatchDrop::StaleSelection)?;
    let (end_ix, end_parent) = end_block.split_last().ok_or(DispatchDrop::StaleSelection)?;
    if start_parent != end_parent {
        return Err(DispatchDrop::SplitContainers);
    }
    let parent = start_parent.to_vec();
    let (start_ix, end_ix) = if start_ix <= end_ix {
        (*start_ix, *end_ix)
    } else {
        (*end_ix, *start_ix)
    };

    let Some(siblings) = vellum_doc_core::children_at_path(doc, &parent) else {
        return Err(DispatchDrop::StaleSelection);
    };
    if end_ix >= siblings.len() {
        return Err(DispatchDrop::StaleSelection);
    }

    let items: Vec<Node> = siblings
        .iter()
        .take(end_ix + 1)
        .skip(start_ix)
        .map(|node| match node {
            Node::Element(el) => {
                let mut attrs = el.attrs.clone();
                attrs.remove("level");
                Node::Element(ElementNode {
                    kind: "list_item".to_string(),
                    attrs,
                    children: el.children.clone(),
                })
            }
            Node::Text(_) => node.clone(),
        })
        .collect();

    let mut ops: Vec<Op> = Vec::new();
    for ix in (start_ix..=end_ix).rev() {
        let mut path = parent.clone();
        path.push(ix);
        ops.push(Op::RemoveNode { path });
    }
    let mut insert_path = parent.clone();
    insert_path.push(start_ix);
    ops.push(Op::InsertNode {
        path: insert_path,
        node: Node::list(list_kind, items),
    });

    let remap_point = |point: &Point| -> Point {
        if !point.path.starts_with(&parent) || point.path.len() < parent.len() + 2 {
            return point.clone();
        }
        let block_ix = point.path[parent.len()];
        if block_ix < start_ix || block_ix > end_ix {
            return point.clone();
        }
        let mut new_path = parent.clone();
        new_path.push(start_ix);
        new_path.push(block_ix - start_ix);
        new_path.extend_from_slice(&point.path[parent.len() + 1..]);
        Point {
            path: new_path,
            offset: point.offset,
        }
    };

    let selection_after = Selection {
        anchor: remap_point(&selection.anchor),
        focus: remap_point(&selection.focus),
    };

    Ok(Transaction::new(ops)
        .selection_after(selection_after)
        .source("command:block.wrap_list"))
}
