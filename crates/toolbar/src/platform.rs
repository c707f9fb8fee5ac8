use std::rc::Rc;

use vellum_doc_core::{ElementId, Subscription};

use crate::geometry::Rect;

/// Ambient UI events the toolbar reacts to. Selection-change here is the
/// platform's own signal; the runtime additionally emits its selection-change
/// command, and the two may arrive in either order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformEvent {
    SelectionChange,
    PointerUp,
    ShiftKeyUp,
    Resize,
}

/// The platform-side view of the user's selection: where it is anchored in
/// the element tree and the client rectangles it paints.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSelection {
    pub anchor_element: ElementId,
    pub collapsed: bool,
    pub client_rects: Vec<Rect>,
}

/// Injected source for global events and measurements, so the lifecycle
/// manager's symmetric-cleanup contract is testable without a UI runtime.
pub trait PlatformEventSource {
    fn subscribe(&self, event: PlatformEvent, callback: Rc<dyn Fn()>) -> Subscription;
    fn subscribe_scroll(&self, container: ElementId, callback: Rc<dyn Fn()>) -> Subscription;
    fn scrollable_ancestor(&self, element: ElementId) -> Option<ElementId>;
    fn native_selection(&self) -> Option<NativeSelection>;
    fn element_rect(&self, element: ElementId) -> Option<Rect>;
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;
}
