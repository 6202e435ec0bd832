//! Item tree use-case service.
//!
//! # Responsibility
//! - Assemble the nested tree view from the flat repository listing.
//! - Expose move and reorder as distinct use-case operations.
//!
//! # Invariants
//! - Reorder never changes an item's parent; a parent mismatch between the
//!   caller's view and the store is rejected, not silently repaired.
//! - Hierarchy policy and cycle checks run inside repository transactions,
//!   not here; this layer only adds use-case shape on top.

use crate::model::item::ItemId;
use crate::repo::item_repo::{ItemRepository, RepoError};
use crate::tree::{build_tree, TreeNode};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from tree service operations.
#[derive(Debug)]
pub enum TreeServiceError {
    /// Target item does not exist or is soft-deleted.
    ItemNotFound(ItemId),
    /// Reorder was issued against a parent the item does not belong to.
    ParentMismatch {
        item_id: ItemId,
        claimed_parent_id: Option<ItemId>,
        actual_parent_id: Option<ItemId>,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for TreeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::ParentMismatch {
                item_id,
                claimed_parent_id,
                actual_parent_id,
            } => write!(
                f,
                "reorder parent mismatch for {item_id}: claimed {claimed_parent_id:?}, actual {actual_parent_id:?}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TreeServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ItemNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Tree service facade over an item repository.
pub struct TreeService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> TreeService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the full nested tree of active items.
    pub fn get_tree_data(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        let items = self.repo.list_all()?;
        Ok(build_tree(&items))
    }

    /// Moves one item under a new parent at an optional sibling index.
    ///
    /// Passing `None` for the index appends to the destination sibling list.
    pub fn move_tree_item(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        insert_index: Option<usize>,
    ) -> Result<(), TreeServiceError> {
        self.repo
            .move_item(id, new_parent_id, insert_index)
            .map_err(Into::into)
    }

    /// Repositions one item among its current siblings.
    ///
    /// `parent_id` is the parent the caller believes the item is under; a
    /// stale view fails with `ParentMismatch` instead of reparenting.
    pub fn reorder_tree_item(
        &self,
        id: ItemId,
        parent_id: Option<ItemId>,
        insert_index: usize,
    ) -> Result<(), TreeServiceError> {
        let item = self
            .repo
            .get_item(id, false)?
            .ok_or(TreeServiceError::ItemNotFound(id))?;
        if item.parent_id != parent_id {
            return Err(TreeServiceError::ParentMismatch {
                item_id: id,
                claimed_parent_id: parent_id,
                actual_parent_id: item.parent_id,
            });
        }

        self.repo
            .move_item(id, item.parent_id, Some(insert_index))
            .map_err(Into::into)
    }
}
