//! Controlling-side view of the UI runtime
//!
//! Everything the controlling side knows about the UI goes through
//! [`InteropRuntime`]: modules are imported by specifier, functions are called
//! by name with JSON arguments, and results come back as JSON.

pub mod callable;

pub use callable::{
    CallableRegistry, FnCallable, ForeignCallable, ForeignDispatcher, ForeignInvocation,
    ForeignSender, ForeignTarget,
};

use crate::error::BridgeResult;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, sync::Arc};
use tracing::debug;

/// Handle the UI runtime assigns to an imported module instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Asynchronous message channel into the UI runtime.
///
/// Every call suspends until the UI side has answered. Implementations must
/// not retry; a lost UI side is reported as
/// [`BridgeError::TransportClosed`](crate::error::BridgeError::TransportClosed).
#[async_trait]
pub trait InteropRuntime: Send + Sync {
    /// Import a module by specifier and return a handle to the new instance
    async fn import(&self, specifier: &str) -> BridgeResult<ModuleId>;

    /// Call a named function on an imported module
    async fn invoke(&self, module: ModuleId, function: &str, args: Vec<Value>) -> BridgeResult<Value>;

    /// Dispose of a module instance and whatever it holds on the UI side
    async fn release(&self, module: ModuleId) -> BridgeResult<()>;

    /// Write a diagnostic to the UI's error console
    async fn console_error(&self, message: &str) -> BridgeResult<()>;
}

/// A loaded UI-side module, bound to the runtime that loaded it
#[derive(Clone)]
pub struct ModuleRef {
    id: ModuleId,
    runtime: Arc<dyn InteropRuntime>,
}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRef").field("id", &self.id).finish()
    }
}

impl ModuleRef {
    /// Import `specifier` through `runtime`
    pub async fn import(runtime: Arc<dyn InteropRuntime>, specifier: &str) -> BridgeResult<Self> {
        let id = runtime.import(specifier).await?;
        debug!("Imported {} as {}", specifier, id);
        Ok(Self { id, runtime })
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Call `function` and decode its result
    pub async fn invoke<T: DeserializeOwned>(&self, function: &str, args: Vec<Value>) -> BridgeResult<T> {
        let value = self.runtime.invoke(self.id, function, args).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Call `function` and discard its result
    pub async fn invoke_void(&self, function: &str, args: Vec<Value>) -> BridgeResult<()> {
        self.runtime.invoke(self.id, function, args).await.map(|_| ())
    }

    pub async fn release(&self) -> BridgeResult<()> {
        self.runtime.release(self.id).await
    }
}

/// Function names exported by the dialog bridge module
pub mod functions {
    pub const SHOW: &str = "dialogBridge.show";
    pub const SHOW_MODAL: &str = "dialogBridge.showModal";
    pub const CLOSE: &str = "dialogBridge.close";
    pub const CLOSE_WITH_RETURN_VALUE: &str = "dialogBridge.closeWithReturnValue";
    pub const IS_OPEN: &str = "dialogBridge.isOpen";
    pub const SET_RETURN_VALUE: &str = "dialogBridge.setReturnValue";
    pub const GET_RETURN_VALUE: &str = "dialogBridge.getReturnValue";
    pub const ADD_CLOSE_CALLBACK: &str = "dialogBridge.addCloseCallback";
    pub const REMOVE_ALL_CLOSE_CALLBACKS: &str = "dialogBridge.removeAllCloseCallbacks";
}
