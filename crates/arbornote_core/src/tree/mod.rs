//! Pure tree assembly over flat item sets.
//!
//! # Responsibility
//! - Reshape the flat `items` listing into the nested structure the UI
//!   renders.
//!
//! # Invariants
//! - Assembly is pure; no store access, fully testable in isolation.
//! - Sibling order matches the repository projection exactly:
//!   `(sort_order, created_at, id)` ascending.
//! - Only container types carry a `children` field; leaves omit it even when
//!   serialized, because consumers branch on its presence.

use crate::model::item::{Item, ItemId, ItemType};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Nested node shape consumed by the tree view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// `Some` (possibly empty) for containers, `None` for leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

/// Builds the nested tree from a flat slice of active items.
///
/// Items are grouped by `parent_id` with `None` as the root bucket; children
/// of parents absent from the slice are not surfaced. Equal `sort_order`
/// values (tolerated, rare) tie-break by `created_at` then `id` so repeated
/// calls on the same input produce identical output.
pub fn build_tree(items: &[Item]) -> Vec<TreeNode> {
    let mut by_parent: HashMap<Option<ItemId>, Vec<&Item>> = HashMap::new();
    for item in items {
        by_parent.entry(item.parent_id).or_default().push(item);
    }
    for group in by_parent.values_mut() {
        group.sort_by(|a, b| sibling_order(a, b));
    }

    build_level(&by_parent, None)
}

fn build_level(
    by_parent: &HashMap<Option<ItemId>, Vec<&Item>>,
    parent_id: Option<ItemId>,
) -> Vec<TreeNode> {
    let Some(group) = by_parent.get(&parent_id) else {
        return Vec::new();
    };

    group
        .iter()
        .map(|item| TreeNode {
            id: item.id,
            name: item.title.clone(),
            kind: item.kind,
            children: item
                .kind
                .is_container()
                .then(|| build_level(by_parent, Some(item.id))),
        })
        .collect()
}

fn sibling_order(a: &Item, b: &Item) -> Ordering {
    a.sort_order
        .cmp(&b.sort_order)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
