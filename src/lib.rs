#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

pub mod attributes;
pub mod error;
pub mod events;
pub mod legacy;
pub mod logging;
pub mod patch;
pub mod render;

#[doc(inline)]
pub use attributes::{AttributeReconciler, PropKind, classify};
#[doc(inline)]
pub use error::{PatchError, RenderError};
#[doc(inline)]
pub use events::{
    DefaultEventDispatcher, EventConfig, EventDispatcher, EventSystem, Subscription, enrich,
};
#[doc(inline)]
pub use patch::{NodeMap, Patcher, index_nodes};
#[doc(inline)]
pub use render::{RenderOutcome, Renderer, RendererBuilder};
#[doc(inline)]
pub use singultus_core::*;
