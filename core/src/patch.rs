//! Patch instructions produced by the diff engine.

use std::rc::Rc;

use crate::{
    value::Props,
    vnode::{Key, VNode},
};

/// One mutation at a single tree position.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Mount a node where there was none.
    Create(Rc<VNode>),
    /// Detach the node.
    Remove,
    /// Swap the node for a structurally incompatible one.
    Replace(Rc<VNode>),
    /// Change the content of a text node.
    UpdateText {
        /// Previous text.
        old: String,
        /// New text.
        new: String,
    },
    /// Change the props of an element. Both full maps are carried; the
    /// attribute reconciler works out what to clear and what to set.
    UpdateProps {
        /// Previous props.
        old: Props,
        /// New props.
        new: Props,
    },
    /// Edit the child list.
    Reorder(Vec<PatchOp>),
}

/// One edit of a child list.
///
/// `old_index` refers to the child list before any edit, `new_index` to the
/// list after all edits.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    /// Mount a new child at `new_index`.
    Insert {
        /// Target position.
        new_index: usize,
        /// Node to mount.
        node: Rc<VNode>,
        /// Key of the new child, if keyed.
        key: Option<Key>,
    },
    /// Relocate the child at `old_index` to `new_index` and bring its content
    /// up to date with `node`. Also emitted with equal indices when only the
    /// content changed.
    Move {
        /// Source position.
        old_index: usize,
        /// Target position.
        new_index: usize,
        /// Up-to-date content for the child.
        node: Rc<VNode>,
        /// Key of the child, if keyed.
        key: Option<Key>,
    },
    /// Detach the child at `old_index`.
    Remove {
        /// Source position.
        old_index: usize,
    },
}

impl PatchOp {
    /// Returns `true` for a move that keeps its position and only updates content.
    #[must_use]
    pub const fn is_in_place(&self) -> bool {
        matches!(self, Self::Move { old_index, new_index, .. } if *old_index == *new_index)
    }
}
