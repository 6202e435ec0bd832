//! Storage facade owning one SQLite connection.
//!
//! # Responsibility
//! - Own the connection lifecycle and expose the full storage API surface
//!   behind one handle.
//! - Map layer-specific errors into one caller-facing error type.
//!
//! # Invariants
//! - Every call borrows the connection through a freshly readiness-checked
//!   repository; the facade adds no caching on top of SQLite.

use crate::db::{self, DbError};
use crate::model::item::{Item, ItemDraft, ItemId, ItemPatch};
use crate::repo::item_repo::{ItemRepository, RepoError, SqliteItemRepository};
use crate::search::fts::{self, SearchError, SearchHit, SearchQuery};
use crate::service::tree_service::{TreeService, TreeServiceError};
use crate::tree::TreeNode;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Result type for facade APIs.
pub type StoreResult<T> = Result<T, StoreError>;

/// Unified error surface for [`NoteStore`] callers.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Repo(RepoError),
    Service(TreeServiceError),
    Search(SearchError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Search(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TreeServiceError> for StoreError {
    fn from(value: TreeServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<SearchError> for StoreError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage backend metadata and item counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub backend: &'static str,
    pub note_count: u64,
    pub section_count: u64,
    pub book_count: u64,
    pub deleted_count: u64,
    pub schema_version: u32,
}

/// Single-connection storage handle.
pub struct NoteStore {
    conn: Connection,
    backend: &'static str,
}

impl NoteStore {
    /// Opens (or creates) a store at the given file path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = db::open_db(path)?;
        Ok(Self {
            conn,
            backend: "sqlite",
        })
    }

    /// Opens an in-memory store, mainly for tests and previews.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = db::open_db_in_memory()?;
        Ok(Self {
            conn,
            backend: "sqlite-memory",
        })
    }

    /// Creates one item at the tail of its sibling list.
    pub fn create_item(&self, draft: &ItemDraft) -> StoreResult<Item> {
        Ok(self.repo()?.create_item(draft)?)
    }

    /// Loads one active item by id.
    pub fn get_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        Ok(self.repo()?.get_item(id, false)?)
    }

    /// Applies a partial field patch to one active item.
    pub fn update_item(&self, id: ItemId, patch: &ItemPatch) -> StoreResult<Item> {
        Ok(self.repo()?.update_item(id, patch)?)
    }

    /// Soft-deletes one item together with all active descendants.
    pub fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        Ok(self.repo()?.delete_item(id)?)
    }

    /// Lists all active items in global sibling order.
    pub fn get_all_items(&self) -> StoreResult<Vec<Item>> {
        Ok(self.repo()?.list_all()?)
    }

    /// Lists active children under one parent in sibling order.
    pub fn get_children(&self, parent_id: Option<ItemId>) -> StoreResult<Vec<Item>> {
        Ok(self.repo()?.list_children(parent_id)?)
    }

    /// Returns the full nested tree of active items.
    pub fn get_tree_data(&self) -> StoreResult<Vec<TreeNode>> {
        Ok(self.tree_service()?.get_tree_data()?)
    }

    /// Moves one item under a new parent at an optional sibling index.
    pub fn move_tree_item(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        insert_index: Option<usize>,
    ) -> StoreResult<()> {
        Ok(self
            .tree_service()?
            .move_tree_item(id, new_parent_id, insert_index)?)
    }

    /// Repositions one item among its current siblings.
    pub fn reorder_tree_item(
        &self,
        id: ItemId,
        parent_id: Option<ItemId>,
        insert_index: usize,
    ) -> StoreResult<()> {
        Ok(self
            .tree_service()?
            .reorder_tree_item(id, parent_id, insert_index)?)
    }

    /// Searches active items via the full-text index.
    pub fn search_items(&self, query: &SearchQuery) -> StoreResult<Vec<SearchHit>> {
        Ok(fts::search_items(&self.conn, query)?)
    }

    /// Returns backend metadata and per-type item counts.
    pub fn get_storage_info(&self) -> StoreResult<StorageInfo> {
        let mut info = StorageInfo {
            backend: self.backend,
            note_count: 0,
            section_count: 0,
            book_count: 0,
            deleted_count: 0,
            schema_version: 0,
        };

        let mut stmt = self.conn.prepare(
            "SELECT type, COUNT(*) FROM items WHERE deleted_at IS NULL GROUP BY type",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let kind: String = row.get(0)?;
            let count: u64 = row.get(1)?;
            match kind.as_str() {
                "note" => info.note_count = count,
                "section" => info.section_count = count,
                "book" => info.book_count = count,
                _ => {}
            }
        }

        info.deleted_count = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE deleted_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        info.schema_version =
            self.conn
                .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        info!(
            "event=storage_info module=store status=ok backend={} notes={} sections={} books={} deleted={}",
            info.backend, info.note_count, info.section_count, info.book_count, info.deleted_count
        );

        Ok(info)
    }

    fn repo(&self) -> StoreResult<SqliteItemRepository<'_>> {
        Ok(SqliteItemRepository::try_new(&self.conn)?)
    }

    fn tree_service(&self) -> StoreResult<TreeService<SqliteItemRepository<'_>>> {
        Ok(TreeService::new(self.repo()?))
    }
}
