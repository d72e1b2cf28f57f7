//! Tree diffing.
//!
//! [`diff`] compares two virtual trees and returns the patches needed to turn
//! the first into the second. The list is empty exactly when nothing
//! observable changed, which lets the renderer skip the DOM entirely.
//!
//! Child lists are reconciled in a single left-to-right pass: keyed children
//! match by key, un-keyed children pair up positionally with the next unused
//! un-keyed old child. This does not minimise the number of moves.

use std::{collections::HashMap, rc::Rc};

use crate::{
    patch::{Patch, PatchOp},
    value::Props,
    vnode::{Key, VNode},
};

/// Computes the patches turning `old` into `new`.
#[must_use]
pub fn diff(old: Option<&Rc<VNode>>, new: Option<&Rc<VNode>>) -> Vec<Patch> {
    let mut patches = Vec::new();

    match (old, new) {
        (None, None) => {}
        (None, Some(new)) => patches.push(Patch::Create(new.clone())),
        (Some(_), None) => patches.push(Patch::Remove),
        (Some(old), Some(new)) => diff_nodes(old, new, &mut patches),
    }

    patches
}

fn diff_nodes(old: &Rc<VNode>, new: &Rc<VNode>, patches: &mut Vec<Patch>) {
    if Rc::ptr_eq(old, new) {
        return;
    }

    match (old.as_ref(), new.as_ref()) {
        (VNode::Text(old), VNode::Text(new)) => {
            if old.text != new.text {
                patches.push(Patch::UpdateText {
                    old: old.text.clone(),
                    new: new.text.clone(),
                });
            }
        }
        (VNode::Element(old_el), VNode::Element(new_el)) if old_el.tag == new_el.tag => {
            if props_changed(&old_el.props, &new_el.props) {
                patches.push(Patch::UpdateProps {
                    old: old_el.props.clone(),
                    new: new_el.props.clone(),
                });
            }

            let ops = diff_children(&old_el.children, &new_el.children);
            if !ops.is_empty() {
                patches.push(Patch::Reorder(ops));
            }
        }
        _ => patches.push(Patch::Replace(new.clone())),
    }
}

/// Returns `true` if the prop sets differ in size or in any value.
///
/// `style` maps compare structurally; everything else uses [`Value`](crate::Value)
/// equality, which treats callbacks by identity.
#[must_use]
pub fn props_changed(old: &Props, new: &Props) -> bool {
    if old.len() != new.len() {
        return true;
    }

    new.iter().any(|(key, value)| old.get(key) != Some(value))
}

struct Indexed<'a> {
    node: &'a Rc<VNode>,
    index: usize,
}

fn index_by_key(children: &[Rc<VNode>]) -> HashMap<&Key, Indexed<'_>> {
    children
        .iter()
        .enumerate()
        .filter_map(|(index, node)| node.key().map(|key| (key, Indexed { node, index })))
        .collect()
}

/// Reconciles two child lists into child operations.
#[must_use]
pub fn diff_children(old_children: &[Rc<VNode>], new_children: &[Rc<VNode>]) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    let old_keyed = index_by_key(old_children);
    let mut consumed = vec![false; old_children.len()];
    let mut cursor = 0;

    for (new_index, new_child) in new_children.iter().enumerate() {
        if let Some(key) = new_child.key() {
            match old_keyed.get(key) {
                Some(entry) => {
                    if entry.index != new_index {
                        ops.push(PatchOp::Move {
                            old_index: entry.index,
                            new_index,
                            node: new_child.clone(),
                            key: Some(key.clone()),
                        });
                    }
                    consumed[entry.index] = true;

                    if !diff(Some(entry.node), Some(new_child)).is_empty() {
                        ops.push(PatchOp::Move {
                            old_index: entry.index,
                            new_index,
                            node: new_child.clone(),
                            key: Some(key.clone()),
                        });
                    }
                }
                None => ops.push(PatchOp::Insert {
                    new_index,
                    node: new_child.clone(),
                    key: Some(key.clone()),
                }),
            }
            continue;
        }

        while cursor < old_children.len()
            && (consumed[cursor] || old_children[cursor].key().is_some())
        {
            cursor += 1;
        }

        if cursor < old_children.len() {
            if !diff(Some(&old_children[cursor]), Some(new_child)).is_empty() {
                ops.push(PatchOp::Move {
                    old_index: cursor,
                    new_index,
                    node: new_child.clone(),
                    key: None,
                });
            }
            consumed[cursor] = true;
            cursor += 1;
        } else {
            ops.push(PatchOp::Insert {
                new_index,
                node: new_child.clone(),
                key: None,
            });
        }
    }

    ops.extend(
        consumed
            .iter()
            .enumerate()
            .filter(|(_, consumed)| !**consumed)
            .map(|(old_index, _)| PatchOp::Remove { old_index }),
    );

    ops
}
