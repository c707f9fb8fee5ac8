#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use vellum_doc_core::{EditorRuntime, ElementId, Subscription};
use vellum_toolbar::{
    FloatingToolbar, NativeSelection, PlatformEvent, PlatformEventSource, Rect, ToolbarConfig,
};

pub const ROOT: ElementId = ElementId(1);
pub const ANCHOR: ElementId = ElementId(2);
pub const TOOLBAR_EL: ElementId = ElementId(3);
pub const SCROLLER: ElementId = ElementId(4);
pub const ANCHOR_NODE: ElementId = ElementId(10);

#[derive(Default)]
struct MockPlatformState {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(u64, PlatformEvent, Rc<dyn Fn()>)>>,
    scroll_listeners: RefCell<Vec<(u64, ElementId, Rc<dyn Fn()>)>>,
    native: RefCell<Option<NativeSelection>>,
    rects: RefCell<HashMap<ElementId, Rect>>,
    containment: RefCell<HashSet<(ElementId, ElementId)>>,
    scrollable: RefCell<HashMap<ElementId, ElementId>>,
}

/// In-memory platform double: events are delivered by explicit `emit` calls
/// and all measurements are settable from the test body.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Rc<MockPlatformState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_native_selection(&self, native: Option<NativeSelection>) {
        *self.state.native.borrow_mut() = native;
    }

    pub fn set_element_rect(&self, element: ElementId, rect: Rect) {
        self.state.rects.borrow_mut().insert(element, rect);
    }

    pub fn set_contains(&self, ancestor: ElementId, node: ElementId) {
        self.state.containment.borrow_mut().insert((ancestor, node));
    }

    pub fn set_scrollable_ancestor(&self, element: ElementId, scroller: ElementId) {
        self.state.scrollable.borrow_mut().insert(element, scroller);
    }

    pub fn emit(&self, event: PlatformEvent) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .state
            .listeners
            .borrow()
            .iter()
            .filter(|(_, listener_event, _)| *listener_event == event)
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn emit_scroll(&self, container: ElementId) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .state
            .scroll_listeners
            .borrow()
            .iter()
            .filter(|(_, listener_container, _)| *listener_container == container)
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.state.listeners.borrow().len() + self.state.scroll_listeners.borrow().len()
    }
}

impl PlatformEventSource for MockPlatform {
    fn subscribe(&self, event: PlatformEvent, callback: Rc<dyn Fn()>) -> Subscription {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        self.state.listeners.borrow_mut().push((id, event, callback));

        let state = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .listeners
                    .borrow_mut()
                    .retain(|(listener_id, _, _)| *listener_id != id);
            }
        })
    }

    fn subscribe_scroll(&self, container: ElementId, callback: Rc<dyn Fn()>) -> Subscription {
        let id = self.state.next_id.get();
        self.state.next_id.set(id + 1);
        self.state
            .scroll_listeners
            .borrow_mut()
            .push((id, container, callback));

        let state = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .scroll_listeners
                    .borrow_mut()
                    .retain(|(listener_id, _, _)| *listener_id != id);
            }
        })
    }

    fn scrollable_ancestor(&self, element: ElementId) -> Option<ElementId> {
        self.state.scrollable.borrow().get(&element).copied()
    }

    fn native_selection(&self) -> Option<NativeSelection> {
        self.state.native.borrow().clone()
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.state.rects.borrow().get(&element).copied()
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        self.state.containment.borrow().contains(&(ancestor, node))
    }
}

pub fn expanded_native(rect: Rect) -> NativeSelection {
    NativeSelection {
        anchor_element: ANCHOR_NODE,
        collapsed: false,
        client_rects: vec![rect],
    }
}

/// Wires root/anchor/toolbar measurements and mounts the toolbar against the
/// given runtime and platform.
pub fn mount_toolbar(runtime: &EditorRuntime, platform: &MockPlatform) -> FloatingToolbar {
    runtime.set_root_element(Some(ROOT));
    platform.set_contains(ROOT, ANCHOR_NODE);
    platform.set_element_rect(ANCHOR, Rect::new(0.0, 0.0, 800.0, 600.0));
    platform.set_element_rect(TOOLBAR_EL, Rect::new(0.0, 0.0, 200.0, 36.0));

    FloatingToolbar::mount(
        Rc::new(runtime.clone()),
        Rc::new(platform.clone()),
        ANCHOR,
        TOOLBAR_EL,
        ToolbarConfig::default(),
    )
}
