//! Live element store of the UI runtime

use super::element::{DialogElement, HtmlDialogElement, ListenerId};
use std::collections::HashMap;
use tracing::trace;

/// Elements currently present in the rendered document, keyed by id.
///
/// Nothing outside this type may hold on to an element between calls: the
/// renderer is free to replace or remove any of them at any time.
#[derive(Default)]
pub struct Document {
    elements: HashMap<String, Box<dyn DialogElement>>,
    last_listener: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render a fresh dialog element with `id`, replacing any element with the same id
    pub fn append_dialog(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.insert(Box::new(HtmlDialogElement::new(id)));
    }

    /// Insert an element; returns the element it replaced, if any
    pub fn insert(&mut self, element: Box<dyn DialogElement>) -> Option<Box<dyn DialogElement>> {
        let id = element.id().to_string();
        trace!("Rendering element #{}", id);
        self.elements.insert(id, element)
    }

    pub fn remove(&mut self, id: &str) -> Option<Box<dyn DialogElement>> {
        trace!("Removing element #{}", id);
        self.elements.remove(id)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<&dyn DialogElement> {
        self.elements.get(id).map(|e| e.as_ref())
    }

    pub fn get_element_by_id_mut(&mut self, id: &str) -> Option<&mut (dyn DialogElement + 'static)> {
        self.elements.get_mut(id).map(|e| e.as_mut())
    }

    /// Fresh listener id, never handed out before by this document
    pub fn allocate_listener_id(&mut self) -> ListenerId {
        self.last_listener += 1;
        ListenerId(self.last_listener)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
