#![allow(clippy::module_name_repetitions)]

//! Browser backend for Singultus.
//!
//! [`WebDom`] implements [`singultus::Dom`] on top of `web-sys`, so the
//! renderer can drive a real page. [`WebMount`] binds a renderer to one
//! container element and is also exported to JavaScript, where hyperscript
//! arrives as JSON and dispatched actions are delivered as plain objects.

mod app;
mod dom;
mod error;

pub use app::{DEFAULT_ROOT_ID, MountBuilder, WebMount};
pub use dom::{WebDom, WebNode};
pub use error::WebError;
