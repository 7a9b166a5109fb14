//! Lazily loaded, memoized connection to the bridge module

use crate::{
    error::{BridgeError, BridgeResult},
    interop::{InteropRuntime, ModuleRef},
};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};
use tracing::{debug, info};

type LoadFuture = Shared<BoxFuture<'static, BridgeResult<ModuleRef>>>;

/// Start-once deferred import shared by every proxy of one owner.
///
/// The first [`get`](Self::get) creates the load future under a
/// single-initialization guard; every later caller clones and awaits that same
/// future, whether it is still in flight or already resolved. A failed load is
/// memoized like a successful one.
pub struct SharedModuleHandle {
    runtime: Arc<dyn InteropRuntime>,
    specifier: String,
    load: OnceLock<LoadFuture>,
    released: AtomicBool,
}

impl fmt::Debug for SharedModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedModuleHandle")
            .field("specifier", &self.specifier)
            .field("load_started", &self.is_load_started())
            .field("released", &self.released.load(Ordering::SeqCst))
            .finish()
    }
}

impl SharedModuleHandle {
    pub fn new(runtime: Arc<dyn InteropRuntime>, specifier: impl Into<String>) -> Self {
        Self {
            runtime,
            specifier: specifier.into(),
            load: OnceLock::new(),
            released: AtomicBool::new(false),
        }
    }

    pub fn runtime(&self) -> &Arc<dyn InteropRuntime> {
        &self.runtime
    }

    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// Whether the underlying load has ever been started
    pub fn is_load_started(&self) -> bool {
        self.load.get().is_some()
    }

    /// Await the module, starting the load on first use
    pub async fn get(&self) -> BridgeResult<ModuleRef> {
        if self.released.load(Ordering::SeqCst) {
            return Err(BridgeError::Disposed);
        }

        let load = self
            .load
            .get_or_init(|| {
                debug!("Starting load of {}", self.specifier);
                let runtime = Arc::clone(&self.runtime);
                let specifier = self.specifier.clone();
                async move { ModuleRef::import(runtime, &specifier).await }
                    .boxed()
                    .shared()
            })
            .clone();

        load.await
    }

    /// Release the module if its load ever ran.
    ///
    /// Returns `Ok(true)` only for the call that actually released it. When
    /// the load never started this does nothing and the handle stays usable.
    pub async fn release(&self) -> BridgeResult<bool> {
        let Some(load) = self.load.get() else {
            debug!("{} was never loaded; nothing to release", self.specifier);
            return Ok(false);
        };

        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }

        match load.clone().await {
            Ok(module) => {
                module.release().await?;
                info!("Released {} ({})", self.specifier, module.id());
                Ok(true)
            }
            Err(e) => {
                debug!("{} failed to load, nothing to release: {}", self.specifier, e);
                Ok(false)
            }
        }
    }
}
