//! UI-side dialog bridge module
//!
//! Stateless with respect to elements: every function looks its dialog up in
//! the live [`Document`] again. The only state kept here is the registry of
//! close-callback wrappers, so they can be detached later. The UI host keeps a
//! single instance per specifier, so this registry is shared by every import.

use super::{
    document::Document,
    element::{CloseEvent, CloseListener, DialogElement, ListenerId},
};
use crate::{
    config::CallbackScope,
    error::{BridgeError, BridgeResult},
    interop::{functions, ForeignSender, ForeignTarget},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone)]
struct RegisteredListener {
    listener: ListenerId,
    dialog_id: String,
    target: ForeignTarget,
}

/// The module instance the UI host hands out on import
pub struct BridgeModule {
    scope: CallbackScope,
    foreign: ForeignSender,
    registry: Vec<RegisteredListener>,
}

impl BridgeModule {
    pub fn new(foreign: ForeignSender, scope: CallbackScope) -> Self {
        Self {
            scope,
            foreign,
            registry: Vec::new(),
        }
    }

    /// Look `id` up in the live document, failing loudly when it is missing
    pub fn resolve<'d>(
        document: &'d mut Document,
        id: &str,
    ) -> BridgeResult<&'d mut (dyn DialogElement + 'static)> {
        document
            .get_element_by_id_mut(id)
            .ok_or_else(|| BridgeError::ElementNotFound { id: id.to_string() })
    }

    pub fn show(&self, document: &mut Document, id: &str) -> BridgeResult<()> {
        Self::resolve(document, id)?.show()
    }

    pub fn show_modal(&self, document: &mut Document, id: &str) -> BridgeResult<()> {
        Self::resolve(document, id)?.show_modal()
    }

    pub fn close(&self, document: &mut Document, id: &str) -> BridgeResult<()> {
        Self::resolve(document, id)?.close(None);
        Ok(())
    }

    pub fn close_with_return_value(
        &self,
        document: &mut Document,
        id: &str,
        return_value: String,
    ) -> BridgeResult<()> {
        Self::resolve(document, id)?.close(Some(return_value));
        Ok(())
    }

    pub fn is_open(&self, document: &mut Document, id: &str) -> BridgeResult<bool> {
        Ok(Self::resolve(document, id)?.is_open())
    }

    pub fn set_return_value(&self, document: &mut Document, id: &str, value: String) -> BridgeResult<()> {
        Self::resolve(document, id)?.set_return_value(value);
        Ok(())
    }

    pub fn get_return_value(&self, document: &mut Document, id: &str) -> BridgeResult<String> {
        Ok(Self::resolve(document, id)?.return_value().to_string())
    }

    /// Attach a close listener that calls `target` on the controlling side
    pub fn add_close_callback(
        &mut self,
        document: &mut Document,
        id: &str,
        target: ForeignTarget,
    ) -> BridgeResult<ListenerId> {
        let listener_id = document.allocate_listener_id();
        let element = Self::resolve(document, id)?;

        let foreign = self.foreign.clone();
        let wrapper_target = target.clone();
        let wrapper: CloseListener = Arc::new(move |event: &CloseEvent| {
            let args = vec![json!(event.target_id), json!(event.return_value)];
            if let Err(e) = foreign.invoke(wrapper_target.clone(), args) {
                warn!("Dropping close callback {}: {}", wrapper_target, e);
            }
        });

        element.add_close_listener(listener_id, wrapper);
        debug!("Close callback {} attached to #{} as {:?}", target, id, listener_id);

        self.registry.push(RegisteredListener {
            listener: listener_id,
            dialog_id: id.to_string(),
            target,
        });
        Ok(listener_id)
    }

    /// Detach registered wrappers from the element `id` resolves to.
    ///
    /// The registry itself is left alone, so calling this again is a no-op.
    /// Returns how many listeners were actually detached.
    pub fn remove_all_close_callbacks(&self, document: &mut Document, id: &str) -> BridgeResult<usize> {
        let element = Self::resolve(document, id)?;

        let mut detached = 0;
        for entry in &self.registry {
            if self.scope == CallbackScope::PerDialog && entry.dialog_id != id {
                continue;
            }
            if element.remove_close_listener(entry.listener) {
                trace!("Detached {} ({:?}) from #{}", entry.target, entry.listener, id);
                detached += 1;
            }
        }

        debug!("Detached {} close callback(s) from #{}", detached, id);
        Ok(detached)
    }

    /// Number of wrappers ever registered and not yet released
    pub fn registered_callbacks(&self) -> usize {
        self.registry.len()
    }

    /// Detach every registered wrapper from elements that still exist and
    /// forget them
    pub fn release(&mut self, document: &mut Document) -> usize {
        let mut detached = 0;
        for entry in self.registry.drain(..) {
            if let Some(element) = document.get_element_by_id_mut(&entry.dialog_id) {
                if element.remove_close_listener(entry.listener) {
                    trace!("Released {} from #{}", entry.target, entry.dialog_id);
                    detached += 1;
                }
            }
        }
        detached
    }

    /// Dispatch a call by exported function name
    pub fn call(&mut self, document: &mut Document, function: &str, args: Vec<Value>) -> BridgeResult<Value> {
        match function {
            functions::SHOW => {
                self.show(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(Value::Null)
            }
            functions::SHOW_MODAL => {
                self.show_modal(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(Value::Null)
            }
            functions::CLOSE => {
                self.close(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(Value::Null)
            }
            functions::CLOSE_WITH_RETURN_VALUE => {
                let value = arg_str(&args, 1, "returnValue")?.to_string();
                self.close_with_return_value(document, arg_str(&args, 0, "dialogId")?, value)?;
                Ok(Value::Null)
            }
            functions::IS_OPEN => {
                let open = self.is_open(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(Value::Bool(open))
            }
            functions::SET_RETURN_VALUE => {
                let value = arg_str(&args, 1, "returnValue")?.to_string();
                self.set_return_value(document, arg_str(&args, 0, "dialogId")?, value)?;
                Ok(Value::Null)
            }
            functions::GET_RETURN_VALUE => {
                let value = self.get_return_value(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(Value::String(value))
            }
            functions::ADD_CLOSE_CALLBACK => {
                let target = ForeignTarget::new(
                    arg_str(&args, 1, "moduleName")?,
                    arg_str(&args, 2, "methodName")?,
                );
                let listener = self.add_close_callback(document, arg_str(&args, 0, "dialogId")?, target)?;
                Ok(json!(listener.0))
            }
            functions::REMOVE_ALL_CLOSE_CALLBACKS => {
                let detached = self.remove_all_close_callbacks(document, arg_str(&args, 0, "dialogId")?)?;
                Ok(json!(detached))
            }
            other => Err(BridgeError::UnknownFunction(other.to_string())),
        }
    }
}

fn arg_str<'a>(args: &'a [Value], index: usize, name: &str) -> BridgeResult<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::InvalidArguments(format!("expected string `{}` at position {}", name, index)))
}
