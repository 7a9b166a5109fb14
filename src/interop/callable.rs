//! Controlling-side callables the UI runtime can invoke by name
//!
//! The UI side only ever holds a [`ForeignTarget`] (module name, method name).
//! When a close listener fires it sends a [`ForeignInvocation`] back over a
//! [`ForeignSender`]; the [`ForeignDispatcher`] task resolves the target in the
//! [`CallableRegistry`] and runs it.

use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot, RwLock},
    task::JoinHandle,
};
use tracing::{debug, trace, warn};

/// (module name, method name) pair naming a controlling-side callable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignTarget {
    pub module: String,
    pub method: String,
}

impl ForeignTarget {
    pub fn new(module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for ForeignTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

/// A method the UI runtime may call without knowing its concrete type
#[async_trait]
pub trait ForeignCallable: Send + Sync {
    async fn invoke(&self, args: Vec<Value>) -> BridgeResult<Value>;
}

/// Adapts a plain closure into a [`ForeignCallable`]
pub struct FnCallable<F>(F);

impl<F> FnCallable<F>
where
    F: Fn(Vec<Value>) -> BridgeResult<Value> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ForeignCallable for FnCallable<F>
where
    F: Fn(Vec<Value>) -> BridgeResult<Value> + Send + Sync + 'static,
{
    async fn invoke(&self, args: Vec<Value>) -> BridgeResult<Value> {
        (self.0)(args)
    }
}

/// Lookup table of callables, filled in by the controlling side at startup
#[derive(Clone, Default)]
pub struct CallableRegistry {
    entries: Arc<RwLock<HashMap<ForeignTarget, Arc<dyn ForeignCallable>>>>,
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callable` under `target`, replacing any previous entry
    pub async fn register(&self, target: ForeignTarget, callable: Arc<dyn ForeignCallable>) {
        debug!("Registered callable {}", target);
        self.entries.write().await.insert(target, callable);
    }

    pub async fn unregister(&self, target: &ForeignTarget) -> bool {
        self.entries.write().await.remove(target).is_some()
    }

    pub async fn get(&self, target: &ForeignTarget) -> Option<Arc<dyn ForeignCallable>> {
        self.entries.read().await.get(target).cloned()
    }

    /// Resolve and run `target`
    pub async fn invoke(&self, target: &ForeignTarget, args: Vec<Value>) -> BridgeResult<Value> {
        let callable = self.get(target).await.ok_or_else(|| BridgeError::UnknownCallable {
            module: target.module.clone(),
            method: target.method.clone(),
        })?;
        callable.invoke(args).await
    }
}

/// A single UI-originated call into the controlling runtime
#[derive(Debug, Clone)]
pub struct ForeignInvocation {
    pub target: ForeignTarget,
    pub args: Vec<Value>,
}

enum DispatchMessage {
    Invoke(ForeignInvocation),
    Flush(oneshot::Sender<()>),
}

/// UI-side end of the foreign invocation channel
#[derive(Clone)]
pub struct ForeignSender {
    tx: mpsc::UnboundedSender<DispatchMessage>,
}

impl fmt::Debug for ForeignSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl ForeignSender {
    /// Queue a call to `target`. Does not wait for it to run.
    pub fn invoke(&self, target: ForeignTarget, args: Vec<Value>) -> BridgeResult<()> {
        self.tx
            .send(DispatchMessage::Invoke(ForeignInvocation { target, args }))
            .map_err(|_| BridgeError::TransportClosed)
    }
}

/// Controlling-side task that runs foreign invocations one at a time
pub struct ForeignDispatcher {
    tx: mpsc::UnboundedSender<DispatchMessage>,
    task: JoinHandle<()>,
}

impl ForeignDispatcher {
    /// Start dispatching against `registry`
    pub fn spawn(registry: CallableRegistry) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    DispatchMessage::Invoke(invocation) => {
                        Self::dispatch(&registry, invocation).await;
                    }
                    DispatchMessage::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("Foreign dispatcher shutting down");
        });

        Self { tx, task }
    }

    pub fn sender(&self) -> ForeignSender {
        ForeignSender { tx: self.tx.clone() }
    }

    /// Resolves once every invocation queued before this call has run
    pub async fn flush(&self) -> BridgeResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(DispatchMessage::Flush(done_tx))
            .map_err(|_| BridgeError::TransportClosed)?;
        done_rx.await.map_err(|_| BridgeError::TransportClosed)
    }

    pub fn shutdown(self) {
        self.task.abort();
    }

    async fn dispatch(registry: &CallableRegistry, invocation: ForeignInvocation) {
        trace!("Dispatching foreign call {}", invocation.target);
        if let Err(e) = registry.invoke(&invocation.target, invocation.args).await {
            warn!("Foreign call {} failed: {}", invocation.target, e);
        }
    }
}
