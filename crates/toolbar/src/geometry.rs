use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Viewport coordinates of the floating element's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolbarConfig {
    /// Vertical gap between the selection rectangle and the toolbar.
    pub gap: f64,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self { gap: 10.0 }
    }
}

/// Bounding rectangle of a selection range given its per-line client rects.
pub fn bounding_rect(rects: &[Rect]) -> Option<Rect> {
    let mut iter = rects.iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |acc, rect| acc.union(rect)))
}

/// Places the toolbar centered above the selection, clamped to the anchor
/// container's horizontal bounds, falling below the selection when there is
/// not enough room above it inside the anchor.
pub fn floating_position(
    selection: Rect,
    toolbar: Size,
    anchor: Rect,
    config: &ToolbarConfig,
) -> Position {
    let mut top = selection.top - toolbar.height - config.gap;
    if top < anchor.top {
        top = selection.bottom() + config.gap;
    }

    let min_left = anchor.left;
    let max_left = (anchor.right() - toolbar.width).max(min_left);
    let left = (selection.center_x() - toolbar.width / 2.0).clamp(min_left, max_left);

    Position { top, left }
}
