//! Hierarchical note storage core.
//! This crate is the single source of truth for tree and ordering invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod order;
pub mod repo;
pub mod search;
pub mod service;
pub mod store;
pub mod tree;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{
    ContentType, Item, ItemDraft, ItemId, ItemPatch, ItemType, ItemValidationError,
};
pub use order::{key_between, OrderKeyError};
pub use repo::item_repo::{ItemRepository, RepoError, RepoResult, SqliteItemRepository};
pub use search::fts::{search_items, SearchError, SearchHit, SearchQuery, SearchResult};
pub use service::tree_service::{TreeService, TreeServiceError};
pub use store::{NoteStore, StorageInfo, StoreError, StoreResult};
pub use tree::{build_tree, TreeNode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
