use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;
use vellum_doc_core::{
    CommandPriority, DocumentRuntime, ElementId, MarkKind, SELECTION_CHANGE_COMMAND, Subscription,
};

use crate::dispatch::{CommandDispatcher, FeatureGates};
use crate::geometry::{Size, ToolbarConfig, bounding_rect, floating_position};
use crate::platform::{NativeSelection, PlatformEvent, PlatformEventSource};
use crate::render::{ToolbarAction, ToolbarRender, render_toolbar};
use crate::state::{FormattingState, ToolbarVisualState, derive_formatting_state};

/// The floating toolbar instance. Mounting registers every external listener
/// exactly once; dropping the instance releases them all together. Hiding the
/// toolbar never unmounts it.
pub struct FloatingToolbar {
    shared: Rc<ToolbarShared>,
    _subscriptions: Vec<Subscription>,
}

struct ToolbarShared {
    runtime: Rc<dyn DocumentRuntime>,
    platform: Rc<dyn PlatformEventSource>,
    anchor_element: ElementId,
    toolbar_element: ElementId,
    config: ToolbarConfig,
    gates: FeatureGates,
    dispatcher: CommandDispatcher,
    state: RefCell<FormattingState>,
    visual: RefCell<ToolbarVisualState>,
    on_change: RefCell<Option<Rc<dyn Fn()>>>,
}

impl FloatingToolbar {
    pub fn mount(
        runtime: Rc<dyn DocumentRuntime>,
        platform: Rc<dyn PlatformEventSource>,
        anchor_element: ElementId,
        toolbar_element: ElementId,
        config: ToolbarConfig,
    ) -> Self {
        let gates = FeatureGates::query(runtime.as_ref());
        let dispatcher = CommandDispatcher::new(runtime.clone());
        let shared = Rc::new(ToolbarShared {
            runtime: runtime.clone(),
            platform: platform.clone(),
            anchor_element,
            toolbar_element,
            config,
            gates,
            dispatcher,
            state: RefCell::new(FormattingState::default()),
            visual: RefCell::new(ToolbarVisualState::default()),
            on_change: RefCell::new(None),
        });

        // Callbacks hold a weak reference: an event delivered after the
        // toolbar is gone must find nothing to touch.
        let mut subscriptions = Vec::new();

        let weak = Rc::downgrade(&shared);
        subscriptions.push(runtime.subscribe_updates(Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.refresh(true);
            }
        })));

        let weak = Rc::downgrade(&shared);
        subscriptions.push(runtime.subscribe_command(
            SELECTION_CHANGE_COMMAND,
            CommandPriority::Low,
            Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.refresh(true);
                }
                false
            }),
        ));

        let weak = Rc::downgrade(&shared);
        subscriptions.push(platform.subscribe(
            PlatformEvent::SelectionChange,
            Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.refresh(false);
                }
            }),
        ));

        for event in [PlatformEvent::PointerUp, PlatformEvent::ShiftKeyUp] {
            let weak = Rc::downgrade(&shared);
            subscriptions.push(platform.subscribe(
                event,
                Rc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.refresh(true);
                    }
                }),
            ));
        }

        let weak = Rc::downgrade(&shared);
        subscriptions.push(platform.subscribe(
            PlatformEvent::Resize,
            Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.reposition_only();
                }
            }),
        ));

        if let Some(scroller) = platform.scrollable_ancestor(anchor_element) {
            let weak = Rc::downgrade(&shared);
            subscriptions.push(platform.subscribe_scroll(
                scroller,
                Rc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.reposition_only();
                    }
                }),
            ));
        }

        shared.refresh(true);

        Self {
            shared,
            _subscriptions: subscriptions,
        }
    }

    pub fn formatting_state(&self) -> FormattingState {
        self.shared.state.borrow().clone()
    }

    pub fn visual_state(&self) -> ToolbarVisualState {
        self.shared.visual.borrow().clone()
    }

    pub fn feature_gates(&self) -> FeatureGates {
        self.shared.gates
    }

    pub fn render(&self) -> ToolbarRender {
        render_toolbar(
            &self.shared.visual.borrow(),
            &self.shared.state.borrow(),
            &self.shared.gates,
        )
    }

    /// Invoked by the host when state or placement actually changed, never on
    /// redundant re-derivations.
    pub fn set_on_change(&self, callback: impl Fn() + 'static) {
        *self.shared.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// A toolbar interaction freezes the position until the next fresh
    /// selection, then dispatches the bound action.
    pub fn on_action(&self, action: ToolbarAction) {
        self.shared.visual.borrow_mut().sticky = true;
        match action {
            ToolbarAction::ToggleBold => self.shared.dispatcher.toggle_inline_format(MarkKind::Bold),
            ToolbarAction::ToggleItalic => {
                self.shared.dispatcher.toggle_inline_format(MarkKind::Italic)
            }
            ToolbarAction::SetBlock(requested) => self.shared.dispatcher.set_block_type(requested),
        }
    }
}

impl ToolbarShared {
    fn refresh(&self, reposition: bool) {
        if self.runtime.is_composing() {
            return;
        }

        let doc = self.runtime.document();
        let selection = self.runtime.current_selection();
        let native = self.platform.native_selection();
        let root = self.runtime.root_element();
        let anchor_in_root = match (&native, root) {
            (Some(native), Some(root)) => self.platform.contains(root, native.anchor_element),
            _ => false,
        };

        let previous = self.state.borrow().clone();
        let next = derive_formatting_state(
            &doc,
            selection.as_ref(),
            native.as_ref(),
            anchor_in_root,
            &previous,
        );

        let mut changed = false;
        if next != previous {
            let fresh_selection = next.has_text_selection && !previous.has_text_selection;
            let visible = next.has_text_selection;
            *self.state.borrow_mut() = next;

            let mut visual = self.visual.borrow_mut();
            if fresh_selection {
                visual.sticky = false;
            }
            visual.visible = visible;
            drop(visual);
            changed = true;
        }

        if reposition && self.state.borrow().has_text_selection {
            changed |= self.reposition(native.as_ref());
        }

        if changed {
            self.notify();
        }
    }

    fn reposition_only(&self) {
        if !self.state.borrow().has_text_selection {
            return;
        }
        let native = self.platform.native_selection();
        if self.reposition(native.as_ref()) {
            self.notify();
        }
    }

    /// Recomputes and applies the toolbar position. No-op while sticky, and
    /// skipped entirely when any measurement is unavailable.
    fn reposition(&self, native: Option<&NativeSelection>) -> bool {
        if self.visual.borrow().sticky {
            return false;
        }
        let Some(native) = native else {
            return false;
        };
        let Some(selection_rect) = bounding_rect(&native.client_rects) else {
            return false;
        };
        let Some(toolbar_rect) = self.platform.element_rect(self.toolbar_element) else {
            return false;
        };
        let toolbar_size = Size {
            width: toolbar_rect.width,
            height: toolbar_rect.height,
        };
        if toolbar_size.is_empty() {
            // Not laid out yet; retry on the next qualifying event rather
            // than positioning at the origin.
            debug!("skipping reposition of unmeasured toolbar");
            return false;
        }
        let Some(anchor_rect) = self.platform.element_rect(self.anchor_element) else {
            return false;
        };

        let position = floating_position(selection_rect, toolbar_size, anchor_rect, &self.config);
        let mut visual = self.visual.borrow_mut();
        if visual.position == position {
            return false;
        }
        visual.position = position;
        true
    }

    fn notify(&self) {
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}
