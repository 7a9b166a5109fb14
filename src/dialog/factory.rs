//! Single point of module acquisition and proxy construction

use super::{module::SharedModuleHandle, proxy::DialogProxy};
use crate::{config::BridgeConfig, error::BridgeResult, interop::InteropRuntime};
use std::sync::Arc;
use tracing::{debug, info};

/// Hands out [`DialogProxy`] instances that all share one lazily loaded
/// bridge module.
///
/// Nothing is loaded when the factory or its proxies are created; the first
/// operation on any proxy triggers the load.
#[derive(Debug)]
pub struct DialogFactory {
    module: Arc<SharedModuleHandle>,
    calling_module: Option<String>,
}

impl DialogFactory {
    pub fn new(runtime: Arc<dyn InteropRuntime>, config: &BridgeConfig) -> Self {
        Self {
            module: Arc::new(SharedModuleHandle::new(runtime, config.module_specifier.clone())),
            calling_module: config.calling_module_name.clone(),
        }
    }

    /// Create a proxy, bound to `id` when one is given.
    ///
    /// A proxy created without an id can be bound later with
    /// [`DialogProxy::set_id`]; one created with an id keeps it.
    pub fn create_dialog(&self, id: Option<&str>) -> DialogProxy {
        debug!("Creating dialog proxy for {:?}", id);
        DialogProxy::new(
            id.map(str::to_string),
            Arc::clone(&self.module),
            self.calling_module.clone(),
        )
    }

    pub fn calling_module_name(&self) -> Option<&str> {
        self.calling_module.as_deref()
    }

    pub fn is_module_loaded(&self) -> bool {
        self.module.is_load_started()
    }

    /// Release the shared module if it was ever loaded. Safe to call repeatedly.
    pub async fn dispose(&self) -> BridgeResult<()> {
        if self.module.release().await? {
            info!("Dialog factory disposed its module");
        }
        Ok(())
    }
}
