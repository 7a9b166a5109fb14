//! UI runtime event loop
//!
//! [`UiHost`] owns the document and every imported module and serves one
//! request at a time on its own task. [`UiHandle`] is the controlling side's
//! end of the channel and implements [`InteropRuntime`].
//!
//! Importing a specifier twice hands out two [`ModuleId`]s backed by the same
//! [`BridgeModule`]. The bridge, and every close listener it registered, is
//! dropped once the last of those ids is released.

use super::{bridge::BridgeModule, document::Document};
use crate::{
    config::{BridgeConfig, CallbackScope},
    error::{BridgeError, BridgeResult},
    interop::{ForeignSender, InteropRuntime, ModuleId},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{collections::HashMap, fmt, time::Duration};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tracing::{debug, error, info, trace};

type Reply<T> = oneshot::Sender<BridgeResult<T>>;
type RenderJob = Box<dyn FnOnce(&mut Document) + Send>;

/// Messages understood by the UI host
enum UiRequest {
    Import {
        specifier: String,
        reply: Reply<ModuleId>,
    },
    Invoke {
        module: ModuleId,
        function: String,
        args: Vec<Value>,
        reply: Reply<Value>,
    },
    Release {
        module: ModuleId,
        reply: Reply<()>,
    },
    ConsoleError {
        message: String,
        reply: Reply<()>,
    },
    ConsoleMessages {
        reply: Reply<Vec<String>>,
    },
    Render(RenderJob),
    Shutdown,
}

/// The UI side of the bridge
pub struct UiHost {
    document: Document,
    bridges: HashMap<String, BridgeModule>,
    modules: HashMap<ModuleId, String>,
    specifiers: Vec<String>,
    callback_scope: CallbackScope,
    foreign: ForeignSender,
    console: Vec<String>,
    next_module: u64,
}

impl UiHost {
    /// Start serving `document` on a new task.
    ///
    /// `foreign` carries close callbacks back to the controlling side.
    pub fn spawn(document: Document, foreign: ForeignSender, config: &BridgeConfig) -> UiHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let host = Self {
            document,
            bridges: HashMap::new(),
            modules: HashMap::new(),
            specifiers: vec![config.module_specifier.clone()],
            callback_scope: config.callback_scope,
            foreign,
            console: Vec::new(),
            next_module: 1,
        };
        tokio::spawn(host.run(rx));

        UiHandle {
            tx,
            call_timeout: config.call_timeout_ms.map(Duration::from_millis),
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<UiRequest>) {
        info!("UI host started");
        while let Some(request) = rx.recv().await {
            if !self.handle(request) {
                break;
            }
        }
        info!("UI host stopped");
    }

    /// Serve one request; returns false when the host should stop
    fn handle(&mut self, request: UiRequest) -> bool {
        match request {
            UiRequest::Import { specifier, reply } => {
                let _ = reply.send(self.import(&specifier));
            }
            UiRequest::Invoke { module, function, args, reply } => {
                let result = self.invoke(module, &function, args);
                if let Err(e) = &result {
                    debug!("{} on {} failed: {}", function, module, e);
                }
                let _ = reply.send(result);
            }
            UiRequest::Release { module, reply } => {
                self.release(module);
                let _ = reply.send(Ok(()));
            }
            UiRequest::ConsoleError { message, reply } => {
                error!(target: "dialog_bridge::console", "{}", message);
                self.console.push(message);
                let _ = reply.send(Ok(()));
            }
            UiRequest::ConsoleMessages { reply } => {
                let _ = reply.send(Ok(self.console.clone()));
            }
            UiRequest::Render(job) => job(&mut self.document),
            UiRequest::Shutdown => return false,
        }
        true
    }

    fn import(&mut self, specifier: &str) -> BridgeResult<ModuleId> {
        if !self.specifiers.iter().any(|s| s == specifier) {
            return Err(BridgeError::ModuleLoad(format!("Cannot find module '{}'", specifier)));
        }

        let id = ModuleId(self.next_module);
        self.next_module += 1;

        if self.bridges.contains_key(specifier) {
            debug!("Reusing loaded {} as {}", specifier, id);
        } else {
            self.bridges.insert(
                specifier.to_string(),
                BridgeModule::new(self.foreign.clone(), self.callback_scope),
            );
            info!("Loaded {} as {}", specifier, id);
        }
        self.modules.insert(id, specifier.to_string());
        Ok(id)
    }

    fn invoke(&mut self, module: ModuleId, function: &str, args: Vec<Value>) -> BridgeResult<Value> {
        trace!("{} {}({:?})", module, function, args);
        let specifier = self.modules.get(&module).ok_or(BridgeError::Disposed)?;
        let bridge = self.bridges.get_mut(specifier).ok_or(BridgeError::Disposed)?;
        bridge.call(&mut self.document, function, args)
    }

    fn release(&mut self, module: ModuleId) {
        let Some(specifier) = self.modules.remove(&module) else {
            return;
        };
        if self.modules.values().any(|s| *s == specifier) {
            debug!("Released {}; {} is still in use", module, specifier);
            return;
        }
        if let Some(mut bridge) = self.bridges.remove(&specifier) {
            let detached = bridge.release(&mut self.document);
            info!("Released {} ({} close listener(s) detached)", module, detached);
        }
    }
}

/// Controlling-side handle to a running [`UiHost`]
#[derive(Clone)]
pub struct UiHandle {
    tx: mpsc::UnboundedSender<UiRequest>,
    call_timeout: Option<Duration>,
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandle")
            .field("closed", &self.tx.is_closed())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

impl UiHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> UiRequest) -> BridgeResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| BridgeError::TransportClosed)?;

        let reply = match self.call_timeout {
            Some(limit) => timeout(limit, reply_rx)
                .await
                .map_err(|_| BridgeError::Timeout(limit.as_millis() as u64))?,
            None => reply_rx.await,
        };
        reply.map_err(|_| BridgeError::TransportClosed)?
    }

    /// Run `f` against the live document on the UI task.
    ///
    /// This is the renderer's entry point for adding, replacing, and removing
    /// elements.
    pub async fn render<F, R>(&self, f: F) -> BridgeResult<R>
    where
        F: FnOnce(&mut Document) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: RenderJob = Box::new(move |document| {
            let _ = result_tx.send(f(document));
        });
        self.tx
            .send(UiRequest::Render(job))
            .map_err(|_| BridgeError::TransportClosed)?;
        result_rx.await.map_err(|_| BridgeError::TransportClosed)
    }

    /// Everything written to the UI error console so far
    pub async fn console_messages(&self) -> BridgeResult<Vec<String>> {
        self.request(|reply| UiRequest::ConsoleMessages { reply }).await
    }

    /// Stop the UI host. Later calls fail with `TransportClosed`.
    pub fn shutdown(&self) {
        let _ = self.tx.send(UiRequest::Shutdown);
    }
}

#[async_trait]
impl InteropRuntime for UiHandle {
    async fn import(&self, specifier: &str) -> BridgeResult<ModuleId> {
        let specifier = specifier.to_string();
        self.request(|reply| UiRequest::Import { specifier, reply }).await
    }

    async fn invoke(&self, module: ModuleId, function: &str, args: Vec<Value>) -> BridgeResult<Value> {
        let function = function.to_string();
        self.request(|reply| UiRequest::Invoke { module, function, args, reply }).await
    }

    async fn release(&self, module: ModuleId) -> BridgeResult<()> {
        self.request(|reply| UiRequest::Release { module, reply }).await
    }

    async fn console_error(&self, message: &str) -> BridgeResult<()> {
        let message = message.to_string();
        self.request(|reply| UiRequest::ConsoleError { message, reply }).await
    }
}
