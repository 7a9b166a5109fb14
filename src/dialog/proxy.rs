//! Typed, asynchronous facade for one dialog element

use super::module::SharedModuleHandle;
use crate::{
    config::BridgeConfig,
    error::{BridgeError, BridgeResult},
    interop::{functions, InteropRuntime},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Diagnostic written to the UI console when a proxy is used before it has an id
pub const UNSET_ID_MESSAGE: &str =
    "Cannot interact with HTMLDialogElement. Ensure the id of the HTML element has been set using the set_id method.";

/// When a proxy's dialog id is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdBinding {
    /// Supplied at construction and never changed
    Fixed,
    /// Bound (and rebound) after construction through [`DialogProxy::set_id`]
    Settable,
}

/// Controlling-side proxy for one dialog element.
///
/// Every operation first checks that an id is bound. Without one, it writes
/// [`UNSET_ID_MESSAGE`] to the UI console and returns its safe default
/// without touching the bridge module. With one, it awaits the shared module
/// and forwards the call; failures from the UI side, such as an id with no
/// matching element, propagate to the caller.
#[derive(Debug)]
pub struct DialogProxy {
    id: Option<String>,
    binding: IdBinding,
    module: Arc<SharedModuleHandle>,
    owns_module: bool,
    calling_module: Option<String>,
}

impl DialogProxy {
    pub(crate) fn new(
        id: Option<String>,
        module: Arc<SharedModuleHandle>,
        calling_module: Option<String>,
    ) -> Self {
        let binding = if id.is_some() {
            IdBinding::Fixed
        } else {
            IdBinding::Settable
        };

        Self {
            id,
            binding,
            module,
            owns_module: false,
            calling_module,
        }
    }

    /// A proxy with its own module connection, released by [`dispose`](Self::dispose)
    pub fn standalone(runtime: Arc<dyn InteropRuntime>, config: &BridgeConfig, id: Option<&str>) -> Self {
        let module = Arc::new(SharedModuleHandle::new(runtime, config.module_specifier.clone()));
        let mut proxy = Self::new(id.map(str::to_string), module, config.calling_module_name.clone());
        proxy.owns_module = true;
        proxy
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn binding(&self) -> IdBinding {
        self.binding
    }

    /// Bind or rebind the dialog id. Only allowed on proxies created without one.
    pub fn set_id(&mut self, id: impl Into<String>) -> BridgeResult<()> {
        if self.binding == IdBinding::Fixed {
            return Err(BridgeError::IdentifierFixed);
        }
        let id = id.into();
        debug!("Binding dialog proxy to #{}", id);
        self.id = Some(id);
        Ok(())
    }

    pub async fn show(&self) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module.invoke_void(functions::SHOW, vec![json!(id)]).await
    }

    pub async fn show_modal(&self) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module.invoke_void(functions::SHOW_MODAL, vec![json!(id)]).await
    }

    /// Close the dialog, leaving its return value unchanged
    pub async fn close(&self) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module.invoke_void(functions::CLOSE, vec![json!(id)]).await
    }

    /// Close the dialog and set its return value
    pub async fn close_with_return_value(&self, return_value: &str) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module
            .invoke_void(functions::CLOSE_WITH_RETURN_VALUE, vec![json!(id), json!(return_value)])
            .await
    }

    /// `false` when no id is bound
    pub async fn is_open(&self) -> BridgeResult<bool> {
        let Some(id) = self.bound_id().await else {
            return Ok(false);
        };
        let module = self.module.get().await?;
        module.invoke(functions::IS_OPEN, vec![json!(id)]).await
    }

    pub async fn set_return_value(&self, return_value: &str) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module
            .invoke_void(functions::SET_RETURN_VALUE, vec![json!(id), json!(return_value)])
            .await
    }

    /// Empty string when no id is bound
    pub async fn get_return_value(&self) -> BridgeResult<String> {
        let Some(id) = self.bound_id().await else {
            return Ok(String::new());
        };
        let module = self.module.get().await?;
        module.invoke(functions::GET_RETURN_VALUE, vec![json!(id)]).await
    }

    /// Call `module_name.method_name` on this side whenever the dialog closes.
    ///
    /// Registrations accumulate; each one fires once per close event.
    pub async fn on_close(&self, module_name: &str, method_name: &str) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        self.add_close_callback(id, module_name, method_name).await
    }

    /// [`on_close`](Self::on_close) against the configured calling module
    pub async fn on_close_method(&self, method_name: &str) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let Some(calling_module) = self.calling_module.as_deref() else {
            return Err(BridgeError::Config(
                "calling_module_name is required to register a close callback by method name".to_string(),
            ));
        };
        self.add_close_callback(id, calling_module, method_name).await
    }

    /// Detach close callbacks from the dialog element
    pub async fn remove_close_callbacks(&self) -> BridgeResult<()> {
        let Some(id) = self.bound_id().await else {
            return Ok(());
        };
        let module = self.module.get().await?;
        module
            .invoke_void(functions::REMOVE_ALL_CLOSE_CALLBACKS, vec![json!(id)])
            .await
    }

    /// Release the module connection if this proxy owns it and it was loaded.
    /// Proxies handed out by a factory leave that to the factory.
    pub async fn dispose(&self) -> BridgeResult<()> {
        if !self.owns_module {
            return Ok(());
        }
        self.module.release().await.map(|_| ())
    }

    async fn add_close_callback(&self, id: &str, module_name: &str, method_name: &str) -> BridgeResult<()> {
        let module = self.module.get().await?;
        module
            .invoke_void(
                functions::ADD_CLOSE_CALLBACK,
                vec![json!(id), json!(module_name), json!(method_name)],
            )
            .await
    }

    async fn bound_id(&self) -> Option<&str> {
        if let Some(id) = self.id.as_deref() {
            return Some(id);
        }

        error!("{}", UNSET_ID_MESSAGE);
        if let Err(e) = self.module.runtime().console_error(UNSET_ID_MESSAGE).await {
            warn!("Could not report unset dialog id to the UI console: {}", e);
        }
        None
    }
}
