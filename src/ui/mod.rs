//! UI side of the bridge
//!
//! Everything in here runs on the UI host's task. The controlling side never
//! touches these types directly; it talks to them through
//! [`InteropRuntime`](crate::interop::InteropRuntime).

pub mod bridge;
pub mod document;
pub mod element;
pub mod host;

pub use bridge::BridgeModule;
pub use document::Document;
pub use element::{CloseEvent, CloseListener, DialogElement, HtmlDialogElement, ListenerId};
pub use host::{UiHandle, UiHost};
