//! Dialog bridge
//!
//! A controlling-side facade over a dialog element that lives in a separate UI
//! runtime. [`DialogFactory`] creates [`DialogProxy`] handles which forward
//! each operation as an asynchronous message; the UI side
//! ([`ui::UiHost`] running [`ui::BridgeModule`]) resolves the dialog by id
//! and performs the platform action.

pub mod config;
pub mod dialog;
pub mod error;
pub mod interop;
pub mod ui;

pub use config::{BridgeConfig, CallbackScope};
pub use dialog::{DialogFactory, DialogProxy, IdBinding};
pub use error::{BridgeError, BridgeResult};
pub use interop::{CallableRegistry, ForeignCallable, ForeignDispatcher, ForeignTarget, InteropRuntime};
