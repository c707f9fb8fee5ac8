use crate::editor::clamp_to_char_boundary;
use crate::node::{Document, ElementNode, Marks, Node, Point, Selection, TextNode};
use crate::ops::{Op, Path, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Bold,
    Italic,
}

impl MarkKind {
    pub fn is_set(&self, marks: &Marks) -> bool {
        match self {
            MarkKind::Bold => marks.bold,
            MarkKind::Italic => marks.italic,
        }
    }

    pub fn assign(&self, marks: &mut Marks, on: bool) {
        match self {
            MarkKind::Bold => marks.bold = on,
            MarkKind::Italic => marks.italic = on,
        }
    }

    fn source(&self) -> &'static str {
        match self {
            MarkKind::Bold => "command:marks.toggle_bold",
            MarkKind::Italic => "command:marks.toggle_italic",
        }
    }
}

#[derive(Debug)]
pub struct TextBlock<'a> {
    pub path: Path,
    pub el: &'a ElementNode,
}

/// All text blocks in document order, descending through containers such as
/// lists and skipping nothing else.
pub fn text_blocks_in_order(doc: &Document) -> Vec<TextBlock<'_>> {
    fn walk<'a>(nodes: &'a [Node], path: &mut Vec<usize>, out: &mut Vec<TextBlock<'a>>) {
        for (ix, node) in nodes.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };

            path.push(ix);
            if el.is_text_block() {
                out.push(TextBlock {
                    path: path.clone(),
                    el,
                });
            } else {
                walk(&el.children, path, out);
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Vec::new(), &mut out);
    out
}

pub fn ordered_selection_points(sel: &Selection) -> (Point, Point) {
    let mut start = sel.anchor.clone();
    let mut end = sel.focus.clone();

    if start.path == end.path {
        if end.offset < start.offset {
            std::mem::swap(&mut start, &mut end);
        }
        return (start, end);
    }
    if end.path < start.path {
        std::mem::swap(&mut start, &mut end);
    }
    (start, end)
}

fn total_inline_text_len(children: &[Node]) -> usize {
    children
        .iter()
        .map(|n| match n {
            Node::Text(t) => t.text.len(),
            Node::Element(_) => 0,
        })
        .sum()
}

fn point_global_offset(children: &[Node], child_ix: usize, offset: usize) -> usize {
    let mut global = 0usize;
    for (ix, node) in children.iter().enumerate() {
        let Node::Text(t) = node else { continue };
        if ix < child_ix {
            global += t.text.len();
            continue;
        }
        if ix == child_ix {
            global += clamp_to_char_boundary(&t.text, offset);
        }
        break;
    }
    global
}

fn point_for_global_offset(block_path: &[usize], children: &[Node], global_offset: usize) -> Point {
    let mut remaining = global_offset;
    for (child_ix, node) in children.iter().enumerate() {
        let Node::Text(t) = node else { continue };
        if remaining < t.text.len() {
            let mut path = block_path.to_vec();
            path.push(child_ix);
            return Point::new(path, clamp_to_char_boundary(&t.text, remaining));
        }
        if remaining == t.text.len() {
            // Prefer the start of a following text node over the end of this
            // one so the point stays attached to the styled run.
            if matches!(children.get(child_ix + 1), Some(Node::Text(_))) {
                let mut path = block_path.to_vec();
                path.push(child_ix + 1);
                return Point::new(path, 0);
            }
            let mut path = block_path.to_vec();
            path.push(child_ix);
            return Point::new(path, t.text.len());
        }
        remaining -= t.text.len();
    }

    for (child_ix, node) in children.iter().enumerate().rev() {
        if let Node::Text(t) = node {
            let mut path = block_path.to_vec();
            path.push(child_ix);
            return Point::new(path, t.text.len());
        }
    }

    let mut path = block_path.to_vec();
    path.push(0);
    Point::new(path, 0)
}

fn is_point_in_block(point: &Point, block_path: &[usize]) -> bool {
    point.path.len() == block_path.len() + 1 && point.path.starts_with(block_path)
}

struct SelectedBlocks<'a> {
    blocks: Vec<TextBlock<'a>>,
    start_index: usize,
    end_index: usize,
    start: Point,
    end: Point,
}

fn selected_blocks<'a>(doc: &'a Document, sel: &Selection) -> Result<SelectedBlocks<'a>, String> {
    let (start, end) = ordered_selection_points(sel);
    let Some(start_block_path) = start.path.split_last().map(|(_, p)| p.to_vec()) else {
        return Err("Selection start is not in a text block".into());
    };
    let Some(end_block_path) = end.path.split_last().map(|(_, p)| p.to_vec()) else {
        return Err("Selection end is not in a text block".into());
    };

    let blocks = text_blocks_in_order(doc);
    let start_index = blocks
        .iter()
        .position(|b| b.path == start_block_path)
        .ok_or_else(|| "Selection start is not in a text block".to_string())?;
    let end_index = blocks
        .iter()
        .position(|b| b.path == end_block_path)
        .ok_or_else(|| "Selection end is not in a text block".to_string())?;

    let (start_index, end_index) = if start_index <= end_index {
        (start_index, end_index)
    } else {
        (end_index, start_index)
    };

    Ok(SelectedBlocks {
        blocks,
        start_index,
        end_index,
        start,
        end,
    })
}

/// Marks of the text node under the focus point, for caret reads.
pub fn active_marks(doc: &Document, sel: &Selection) -> Marks {
    match crate::node::node_at_path(doc, &sel.focus.path) {
        Some(Node::Text(text)) => text.marks,
        _ => Marks::default(),
    }
}

/// Whether the given mark is active for the selection: every selected text
/// node carries it, or for a caret, the focus node does.
pub fn selection_has_mark(doc: &Document, sel: &Selection, kind: MarkKind) -> bool {
    if sel.is_collapsed() {
        return kind.is_set(&active_marks(doc, sel));
    }

    let Ok(sb) = selected_blocks(doc, sel) else {
        return false;
    };
    let start_inline_ix = sb.start.path.last().copied().unwrap_or(0);
    let end_inline_ix = sb.end.path.last().copied().unwrap_or(0);

    for (block_index, block) in sb
        .blocks
        .iter()
        .enumerate()
        .take(sb.end_index + 1)
        .skip(sb.start_index)
    {
        let children = block.el.children.as_slice();
        let total_len = total_inline_text_len(children);
        if total_len == 0 {
            continue;
        }

        let start_global = if block_index == sb.start_index {
            point_global_offset(children, start_inline_ix, sb.start.offset)
        } else {
            0
        };
        let end_global = if block_index == sb.end_index {
            point_global_offset(children, end_inline_ix, sb.end.offset)
        } else {
            total_len
        };
        if start_global >= end_global {
            continue;
        }

        let mut cursor = 0usize;
        for node in children {
            let Node::Text(t) = node else { continue };
            let node_start = cursor;
            let node_end = cursor + t.text.len();
            cursor = node_end;

            if end_global <= node_start || start_global >= node_end {
                continue;
            }
            if !kind.is_set(&t.marks) {
                return false;
            }
        }
    }

    true
}

/// The model text content covered by the selection.
pub fn selected_text(doc: &Document, sel: &Selection) -> String {
    let Ok(sb) = selected_blocks(doc, sel) else {
        return String::new();
    };
    let start_inline_ix = sb.start.path.last().copied().unwrap_or(0);
    let end_inline_ix = sb.end.path.last().copied().unwrap_or(0);

    let mut out = String::new();
    for (block_index, block) in sb
        .blocks
        .iter()
        .enumerate()
        .take(sb.end_index + 1)
        .skip(sb.start_index)
    {
        let children = block.el.children.as_slice();
        let total_len = total_inline_text_len(children);

        let start_global = if block_index == sb.start_index {
            point_global_offset(children, start_inline_ix, sb.start.offset)
        } else {
            0
        };
        let end_global = if block_index == sb.end_index {
            point_global_offset(children, end_inline_ix, sb.end.offset)
        } else {
            total_len
        };
        if start_global >= end_global {
            continue;
        }

        let mut cursor = 0usize;
        for node in children {
            let Node::Text(t) = node else { continue };
            let node_start = cursor;
            let node_end = cursor + t.text.len();
            cursor = node_end;

            if end_global <= node_start || start_global >= node_end {
                continue;
            }
            let from = clamp_to_char_boundary(&t.text, start_global.saturating_sub(node_start));
            let to =
                clamp_to_char_boundary(&t.text, (end_global - node_start).min(t.text.len()));
            out.push_str(t.text.get(from..to).unwrap_or(""));
        }
    }
    out
}

fn apply_marks_in_block(
    children: &[Node],
    start_global: usize,
    end_global: usize,
    apply: &dyn Fn(Marks) -> Marks,
) -> Vec<Node> {
    if start_global >= end_global {
        return children.to_vec();
    }

    let mut out: Vec<Node> = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        let Node::Text(t) = node else {
            out.push(node.clone());
            continue;
        };

        let node_start = cursor;
        let node_end = cursor + t.text.len();
        cursor = node_end;

        if end_global <= node_start || start_global >= node_end {
            out.push(node.clone());
            continue;
        }

        let sel_start = clamp_to_char_boundary(&t.text, start_global.saturating_sub(node_start));
        let sel_end =
            clamp_to_char_boundary(&t.text, (end_global.saturating_sub(node_start)).min(t.text.len()));

        if sel_start == 0 && sel_end == t.text.len() {
            let mut next = t.clone();
            next.marks = apply(next.marks);
            out.push(Node::Text(next));
            continue;
        }

        let prefix = t.text.get(..sel_start).unwrap_or("").to_string();
        let middle = t.text.get(sel_start..sel_end).unwrap_or("").to_string();
        let suffix = t.text.get(sel_end..).unwrap_or("").to_string();

        if !prefix.is_empty() {
            out.push(Node::Text(TextNode {
                text: prefix,
                marks: t.marks,
            }));
        }
        if !middle.is_empty() {
            out.push(Node::Text(TextNode {
                text: middle,
                marks: apply(t.marks),
            }));
        }
        if !suffix.is_empty() {
            out.push(Node::Text(TextNode {
                text: suffix,
                marks: t.marks,
            }));
        }
    }

    if out.is_empty() {
        out.push(Node::Text(TextNode {
            text: String::new(),
            marks: Marks::default(),
        }));
    }

    out
}

/// Builds the transaction for an inline-format toggle: if every selected text
/// node already carries the mark it is cleared, otherwise it is set, splitting
/// boundary text nodes as needed. A caret toggles the focus node in place.
pub fn toggle_mark_transaction(
    doc: &Document,
    sel: &Selection,
    kind: MarkKind,
) -> Result<Transaction, String> {
    if sel.is_collapsed() {
        let Some(Node::Text(t)) = crate::node::node_at_path(doc, &sel.focus.path) else {
            return Err("Selection is not in a text node".into());
        };
        let mut marks = t.marks;
        let target = !kind.is_set(&marks);
        kind.assign(&mut marks, target);
        return Ok(Transaction::new(vec![Op::SetTextMarks {
            path: sel.focus.path.clone(),
            marks,
        }])
        .selection_after(sel.clone())
        .source(kind.source()));
    }

    let target = !selection_has_mark(doc, sel, kind);
    let apply = move |mut marks: Marks| {
        kind.assign(&mut marks, target);
        marks
    };

    let sb = selected_blocks(doc, sel)?;
    let start_inline_ix = sb.start.path.last().copied().unwrap_or(0);
    let end_inline_ix = sb.end.path.last().copied().unwrap_or(0);

    let mut ops: Vec<Op> = Vec::new();
    let mut new_anchor = sel.anchor.clone();
    let mut new_focus = sel.focus.clone();

    for (block_index, block) in sb
        .blocks
        .iter()
        .enumerate()
        .take(sb.end_index + 1)
        .skip(sb.start_index)
    {
        let children = block.el.children.as_slice();
        let total_len = total_inline_text_len(children);
        if total_len == 0 {
            continue;
        }

        let start_global = if block_index == sb.start_index {
            point_global_offset(children, start_inline_ix, sb.start.offset)
        } else {
            0
        };
        let end_global = if block_index == sb.end_index {
            point_global_offset(children, end_inline_ix, sb.end.offset)
        } else {
            total_len
        };
        if start_global >= end_global {
            continue;
        }

        let new_children = apply_marks_in_block(children, start_global, end_global, &apply);

        for child_ix in (0..children.len()).rev() {
            let mut remove_path = block.path.clone();
            remove_path.push(child_ix);
            ops.push(Op::RemoveNode { path: remove_path });
        }
        for (child_ix, node) in new_children.iter().cloned().enumerate() {
            let mut insert_path = block.path.clone();
            insert_path.push(child_ix);
            ops.push(Op::InsertNode {
                path: insert_path,
                node,
            });
        }

        if is_point_in_block(&new_anchor, &block.path) {
            let global = point_global_offset(
                children,
                new_anchor.path.last().copied().unwrap_or(0),
                new_anchor.offset,
            );
            new_anchor = point_for_global_offset(&block.path, &new_children, global);
        }
        if is_point_in_block(&new_focus, &block.path) {
            let global = point_global_offset(
                children,
                new_focus.path.last().copied().unwrap_or(0),
                new_focus.offset,
            );
            new_focus = point_for_global_offset(&block.path, &new_children, global);
        }
    }

    Ok(Transaction::new(ops)
        .selection_after(Selection {
            anchor: new_anchor,
            focus: new_focus,
        })
        .source(kind.source()))
}
