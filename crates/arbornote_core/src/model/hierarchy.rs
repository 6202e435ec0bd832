//! Nesting policy for the item tree.
//!
//! # Responsibility
//! - Decide which item types may nest under which parent types.
//!
//! # Invariants
//! - This is the only nesting authority in the crate; create and move paths
//!   must both consult it and never inline their own rules.

use crate::model::item::ItemType;

/// Returns whether an item of type `child` may be placed under a parent of
/// type `parent`. `None` stands for the root level.
///
/// Policy table: every type may live at the root; books nest under books;
/// sections nest under books; notes nest under books or sections. Notes are
/// always leaves.
pub fn can_be_child_of(child: ItemType, parent: Option<ItemType>) -> bool {
    match (child, parent) {
        (_, None) => true,
        (ItemType::Book, Some(ItemType::Book)) => true,
        (ItemType::Section, Some(ItemType::Book)) => true,
        (ItemType::Note, Some(ItemType::Book)) | (ItemType::Note, Some(ItemType::Section)) => true,
        _ => false,
    }
}
