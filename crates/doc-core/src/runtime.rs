use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::{ApplyError, Editor};
use crate::node::{Document, Selection};
use crate::ops::Transaction;

/// Opaque reference to a host view element (the editable root, scroll
/// containers, the floating toolbar surface). Only the platform layer can
/// resolve one to real geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Command emitted whenever the runtime's model selection is replaced.
pub const SELECTION_CHANGE_COMMAND: &str = "selection.change";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CommandPriority {
    Low,
    Normal,
    High,
}

/// RAII guard for a listener registration. Dropping it removes the listener;
/// `detach` leaves the listener installed for the life of the event source.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub type UpdateCallback = Rc<dyn Fn()>;
/// Command callbacks return true to claim the command and stop propagation.
pub type CommandCallback = Rc<dyn Fn() -> bool>;

/// The surface the toolbar core consumes from its hosting document runtime.
/// Snapshot reads always reflect the state at call time; mutation dispatch is
/// fire-and-forget and may silently drop stale requests.
pub trait DocumentRuntime {
    fn document(&self) -> Document;
    fn current_selection(&self) -> Option<Selection>;
    fn root_element(&self) -> Option<ElementId>;
    fn is_composing(&self) -> bool;
    fn supports_node_kind(&self, kind: &str) -> bool;
    fn dispatch_mutation(&self, tx: Transaction);
    fn subscribe_updates(&self, callback: UpdateCallback) -> Subscription;
    fn subscribe_command(
        &self,
        command: &'static str,
        priority: CommandPriority,
        callback: CommandCallback,
    ) -> Subscription;
}

struct CommandListener {
    id: u64,
    command: &'static str,
    priority: CommandPriority,
    callback: CommandCallback,
}

struct RuntimeInner {
    editor: RefCell<Editor>,
    has_selection: Cell<bool>,
    root: Cell<Option<ElementId>>,
    next_listener_id: Cell<u64>,
    update_listeners: RefCell<Vec<(u64, UpdateCallback)>>,
    command_listeners: RefCell<Vec<CommandListener>>,
}

impl RuntimeInner {
    fn next_id(&self) -> u64 {
        let id = self.next_listener_id.get();
        self.next_listener_id.set(id + 1);
        id
    }
}

/// Reference implementation of [`DocumentRuntime`] over an [`Editor`].
/// Single-threaded by design: listener lists are cloned before invocation so
/// callbacks may re-enter the runtime for snapshot reads.
#[derive(Clone)]
pub struct EditorRuntime {
    inner: Rc<RuntimeInner>,
}

impl EditorRuntime {
    pub fn new(editor: Editor) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                editor: RefCell::new(editor),
                has_selection: Cell::new(true),
                root: Cell::new(None),
                next_listener_id: Cell::new(0),
                update_listeners: RefCell::new(Vec::new()),
                command_listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn with_richtext() -> Self {
        Self::new(Editor::with_richtext())
    }

    pub fn apply(&self, tx: Transaction) -> Result<(), ApplyError> {
        self.inner.editor.borrow_mut().apply(tx)?;
        self.emit_updates();
        Ok(())
    }

    pub fn undo(&self) -> bool {
        let changed = self.inner.editor.borrow_mut().undo();
        if changed {
            self.emit_updates();
        }
        changed
    }

    pub fn redo(&self) -> bool {
        let changed = self.inner.editor.borrow_mut().redo();
        if changed {
            self.emit_updates();
        }
        changed
    }

    /// Installs or clears the model selection. Either way the selection-change
    /// command is dispatched, matching how host editors report both caret
    /// moves and focus loss.
    pub fn set_selection(&self, selection: Option<Selection>) {
        match selection {
            Some(selection) => {
                self.inner.editor.borrow_mut().set_selection(selection);
                self.inner.has_selection.set(true);
            }
            None => {
                self.inner.has_selection.set(false);
            }
        }
        self.dispatch_command(SELECTION_CHANGE_COMMAND);
    }

    pub fn set_root_element(&self, root: Option<ElementId>) {
        self.inner.root.set(root);
    }

    pub fn set_composing(&self, composing: bool) {
        self.inner.editor.borrow_mut().set_composing(composing);
    }

    /// Runs command listeners in descending priority order (registration
    /// order within a priority) until one claims the command.
    pub fn dispatch_command(&self, command: &str) -> bool {
        let mut listeners: Vec<(CommandPriority, u64, CommandCallback)> = self
            .inner
            .command_listeners
            .borrow()
            .iter()
            .filter(|l| l.command == command)
            .map(|l| (l.priority, l.id, l.callback.clone()))
            .collect();
        listeners.sort_by_key(|(priority, id, _)| (Reverse(*priority), *id));

        for (_, _, callback) in listeners {
            if callback() {
                return true;
            }
        }
        false
    }

    pub fn update_listener_count(&self) -> usize {
        self.inner.update_listeners.borrow().len()
    }

    pub fn command_listener_count(&self) -> usize {
        self.inner.command_listeners.borrow().len()
    }

    fn emit_updates(&self) {
        let listeners: Vec<UpdateCallback> = self
            .inner
            .update_listeners
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in listeners {
            callback();
        }
    }
}

impl DocumentRuntime for EditorRuntime {
    fn document(&self) -> Document {
        self.inner.editor.borrow().doc().clone()
    }

    fn current_selection(&self) -> Option<Selection> {
        if !self.inner.has_selection.get() {
            return None;
        }
        Some(self.inner.editor.borrow().selection().clone())
    }

    fn root_element(&self) -> Option<ElementId> {
        self.inner.root.get()
    }

    fn is_composing(&self) -> bool {
        self.inner.editor.borrow().is_composing()
    }

    fn supports_node_kind(&self, kind: &str) -> bool {
        self.inner.editor.borrow().registry().is_known_kind(kind)
    }

    fn dispatch_mutation(&self, tx: Transaction) {
        // Stale requests are a normal race in a live session, not a defect:
        // preview against a copy and drop the whole transaction on failure.
        let previewed = {
            let editor = self.inner.editor.borrow();
            match editor.preview(&tx) {
                Ok((doc, _)) => match editor.registry().validate_document(&doc) {
                    Ok(()) => true,
                    Err(reason) => {
                        debug!(source = ?tx.meta.source, %reason, "dropping invalid mutation request");
                        false
                    }
                },
                Err(err) => {
                    debug!(source = ?tx.meta.source, error = %err, "dropping stale mutation request");
                    false
                }
            }
        };
        if !previewed {
            return;
        }

        if self.inner.editor.borrow_mut().apply(tx).is_ok() {
            self.emit_updates();
        }
    }

    fn subscribe_updates(&self, callback: UpdateCallback) -> Subscription {
        let id = self.inner.next_id();
        self.inner.update_listeners.borrow_mut().push((id, callback));

        let weak: Weak<RuntimeInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .update_listeners
                    .borrow_mut()
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    fn subscribe_command(
        &self,
        command: &'static str,
        priority: CommandPriority,
        callback: CommandCallback,
    ) -> Subscription {
        let id = self.inner.next_id();
        self.inner.command_listeners.borrow_mut().push(CommandListener {
            id,
            command,
            priority,
            callback,
        });

        let weak: Weak<RuntimeInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .command_listeners
                    .borrow_mut()
                    .retain(|listener| listener.id != id);
            }
        })
    }
}
