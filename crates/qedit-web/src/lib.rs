//! qedit Browser Bindings
//!
//! Binds click-to-edit widgets to page elements: a DOM renderer for the
//! edit controls and a `QEdit` class exported to JavaScript.

pub mod markup;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use dom::{ControlSink, DomRenderer};
#[cfg(target_arch = "wasm32")]
pub use web::{start, QEdit};
