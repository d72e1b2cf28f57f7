//! Headless document backend for Singultus.
//!
//! [`MemoryDom`] keeps a whole document in an arena and implements
//! [`singultus_core::Dom`], so the engine can render, diff and dispatch events
//! without a browser. Besides the trait surface it offers serialization
//! ([`MemoryDom::outer_html`]), queries, synthetic events
//! ([`MemoryDom::click`], [`MemoryDom::input`]), a mutation counter and
//! one-shot failure injection for exercising error paths.
//!
//! ```
//! use singultus_core::Dom;
//! use singultus_memory::MemoryDom;
//!
//! let dom = MemoryDom::new();
//! let container = dom.create_container().unwrap();
//! let text = dom.create_text_node("hello").unwrap();
//! dom.append_child(&container, &text).unwrap();
//! assert_eq!(dom.outer_html(container), "<div>hello</div>");
//! ```

mod document;
mod node;

pub use document::MemoryDom;
pub use node::NodeId;
