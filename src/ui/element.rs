//! The platform dialog primitive

use crate::error::{BridgeError, BridgeResult};
use std::{fmt, sync::Arc};

/// Identity of an attached close listener, used to detach it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Payload delivered to close listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    pub target_id: String,
    pub return_value: String,
}

pub type CloseListener = Arc<dyn Fn(&CloseEvent) + Send + Sync>;

/// Any addressable element with dialog semantics
pub trait DialogElement: Send {
    fn id(&self) -> &str;

    fn is_open(&self) -> bool;

    fn is_modal(&self) -> bool;

    /// Open without blocking interaction with the rest of the document
    fn show(&mut self) -> BridgeResult<()>;

    /// Open exclusively
    fn show_modal(&mut self) -> BridgeResult<()>;

    /// Close, optionally replacing the return value, and fire the close event
    fn close(&mut self, return_value: Option<String>);

    fn return_value(&self) -> &str;

    fn set_return_value(&mut self, value: String);

    fn add_close_listener(&mut self, id: ListenerId, listener: CloseListener);

    /// Returns whether a listener with that id was attached
    fn remove_close_listener(&mut self, id: ListenerId) -> bool;
}

/// In-process dialog element
pub struct HtmlDialogElement {
    id: String,
    open: bool,
    modal: bool,
    return_value: String,
    listeners: Vec<(ListenerId, CloseListener)>,
}

impl fmt::Debug for HtmlDialogElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlDialogElement")
            .field("id", &self.id)
            .field("open", &self.open)
            .field("modal", &self.modal)
            .field("return_value", &self.return_value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HtmlDialogElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            open: false,
            modal: false,
            return_value: String::new(),
            listeners: Vec::new(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl DialogElement for HtmlDialogElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn is_modal(&self) -> bool {
        self.modal
    }

    fn show(&mut self) -> BridgeResult<()> {
        if self.open {
            if self.modal {
                return Err(BridgeError::InvalidState(format!(
                    "dialog \"{}\" is already open as a modal dialog",
                    self.id
                )));
            }
            return Ok(());
        }
        self.open = true;
        self.modal = false;
        Ok(())
    }

    fn show_modal(&mut self) -> BridgeResult<()> {
        if self.open {
            if self.modal {
                return Ok(());
            }
            return Err(BridgeError::InvalidState(format!(
                "dialog \"{}\" is already open as a non-modal dialog",
                self.id
            )));
        }
        self.open = true;
        self.modal = true;
        Ok(())
    }

    fn close(&mut self, return_value: Option<String>) {
        if !self.open {
            return;
        }
        if let Some(value) = return_value {
            self.return_value = value;
        }
        self.open = false;
        self.modal = false;

        let event = CloseEvent {
            target_id: self.id.clone(),
            return_value: self.return_value.clone(),
        };
        // Snapshot so a listener cannot observe a half-updated list
        let listeners: Vec<CloseListener> = self.listeners.iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(&event);
        }
    }

    fn return_value(&self) -> &str {
        &self.return_value
    }

    fn set_return_value(&mut self, value: String) {
        self.return_value = value;
    }

    fn add_close_listener(&mut self, id: ListenerId, listener: CloseListener) {
        if self.listeners.iter().any(|(existing, _)| *existing == id) {
            return;
        }
        self.listeners.push((id, listener));
    }

    fn remove_close_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}
