//! Host-independent building blocks of the Singultus virtual DOM.
//!
//! This crate turns hyperscript ([`Element`]) into normalized virtual trees
//! ([`VNode`]) and diffs successive trees into [`Patch`] lists. Applying those
//! patches needs a live document, described by the [`Dom`] trait and
//! implemented by the backend crates.

mod action;
pub mod diff;
pub mod dom;
pub mod element;
pub mod patch;
pub mod tag;
pub mod value;
pub mod vnode;

#[doc(inline)]
pub use action::{DEFAULT_ENRICHMENT_NAMESPACE, Enrichment, EventAction};
#[doc(inline)]
pub use diff::{diff, diff_children, props_changed};
#[doc(inline)]
pub use dom::{Dom, DomError, DomEvent, NodeKind, SVG_NAMESPACE};
#[doc(inline)]
pub use element::{Element, KEY_PROP, Node, ON_RENDER_PROP, RESERVED_PREFIX, h};
#[doc(inline)]
pub use patch::{Patch, PatchOp};
#[doc(inline)]
pub use tag::{Selector, parse_tag};
#[doc(inline)]
pub use value::{Callback, Handler, Handlers, Props, StyleMap, Value};
#[doc(inline)]
pub use vnode::{FRAGMENT_TAG, Key, VElement, VNode, VText, build, build_with, is_svg_tag};
