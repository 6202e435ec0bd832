//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and structural mutations over the `items` table.
//! - Keep SQL details and sibling-ordering behavior inside this boundary.
//!
//! # Invariants
//! - Only active (`deleted_at IS NULL`) rows are visible by default.
//! - Sibling order is deterministic: `sort_order ASC, created_at ASC, id ASC`.
//! - Sibling lists for mutations come from the same `tree_items` projection
//!   the tree assembler consumes, so computed keys land where the tree shows
//!   them.
//! - Nesting legality is decided by `can_be_child_of` on create and on move.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::content::derive_content;
use crate::model::hierarchy::can_be_child_of;
use crate::model::item::{
    ContentType, Item, ItemDraft, ItemId, ItemPatch, ItemType, ItemValidationError,
};
use crate::order::{key_between, OrderKeyError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior};
use serde_json::Map;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    type,
    title,
    content,
    content_type,
    content_raw,
    content_plaintext,
    word_count,
    char_count,
    parent_id,
    sort_order,
    metadata,
    created_at,
    updated_at,
    deleted_at
FROM items";

/// Sibling ordering shared by every listing and mutation query.
const SIBLING_ORDER_SQL: &str = "ORDER BY sort_order ASC, created_at ASC, id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from item persistence and tree mutation operations.
#[derive(Debug)]
pub enum RepoError {
    /// Draft or patch failed local validation.
    Validation(ItemValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target item does not exist or is soft-deleted.
    NotFound(ItemId),
    /// Referenced parent does not exist or is soft-deleted.
    ParentNotFound(ItemId),
    /// Nesting policy rejects the child/parent type pair.
    IllegalNesting {
        child: ItemType,
        parent: Option<ItemType>,
    },
    /// Move would make the item its own ancestor.
    CycleDetected { item: ItemId, parent: ItemId },
    /// The store rejected the write at the constraint level.
    ConstraintViolation(String),
    /// Order-key generation failed on persisted keys.
    OrderKey(OrderKeyError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table or view is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from an expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent item not found: {id}"),
            Self::IllegalNesting { child, parent } => match parent {
                Some(parent) => write!(f, "type `{child}` cannot nest under `{parent}`"),
                None => write!(f, "type `{child}` cannot be placed at the root"),
            },
            Self::CycleDetected { item, parent } => write!(
                f,
                "move would create cycle: item {item} under parent {parent}"
            ),
            Self::ConstraintViolation(message) => {
                write!(f, "store rejected write: {message}")
            }
            Self::OrderKey(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "item repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "item repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::OrderKey(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<OrderKeyError> for RepoError {
    fn from(value: OrderKeyError) -> Self {
        Self::OrderKey(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(inner, message)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Repository interface for item CRUD and tree mutations.
pub trait ItemRepository {
    /// Creates one item at the tail of its sibling list.
    fn create_item(&self, draft: &ItemDraft) -> RepoResult<Item>;
    /// Loads one item by id.
    fn get_item(&self, id: ItemId, include_deleted: bool) -> RepoResult<Option<Item>>;
    /// Applies a partial field patch to one active item.
    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item>;
    /// Soft-deletes one item together with all active descendants.
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    /// Lists all active items in global sibling order.
    fn list_all(&self) -> RepoResult<Vec<Item>>;
    /// Lists active children under one parent in sibling order.
    fn list_children(&self, parent_id: Option<ItemId>) -> RepoResult<Vec<Item>>;
    /// Reparents and/or repositions one item among its destination siblings.
    fn move_item(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        insert_index: Option<usize>,
    ) -> RepoResult<()>;
}

/// SQLite-backed item repository.
#[derive(Debug)]
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, draft: &ItemDraft) -> RepoResult<Item> {
        draft.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let parent_kind = match draft.parent_id {
            Some(parent_id) => {
                let parent = load_item_filtered(&tx, parent_id, false)?
                    .ok_or(RepoError::ParentNotFound(parent_id))?;
                Some(parent.kind)
            }
            None => None,
        };
        if !can_be_child_of(draft.kind, parent_kind) {
            return Err(RepoError::IllegalNesting {
                child: draft.kind,
                parent: parent_kind,
            });
        }

        let siblings = list_sibling_order(&tx, draft.parent_id)?;
        let last_key = siblings.last().map(|sibling| sibling.sort_order.as_str());
        let sort_order = key_between(last_key, None)?;

        let id = Uuid::new_v4();
        let derived = match (&draft.content, draft.kind) {
            (Some(content), ItemType::Note) => Some(derive_content(
                content,
                draft.content_type.unwrap_or(ContentType::Markdown),
            )),
            _ => None,
        };

        tx.execute(
            "INSERT INTO items (
                id,
                type,
                title,
                content,
                content_type,
                content_raw,
                content_plaintext,
                word_count,
                char_count,
                parent_id,
                sort_order,
                metadata
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                id.to_string(),
                draft.kind.as_str(),
                draft.title.trim(),
                draft.content.as_deref(),
                draft.content_type.map(ContentType::as_str),
                draft.content_raw.as_deref(),
                derived.as_ref().map(|fields| fields.plaintext.as_str()),
                derived.as_ref().map(|fields| fields.word_count),
                derived.as_ref().map(|fields| fields.char_count),
                draft.parent_id.map(|value| value.to_string()),
                sort_order,
                metadata_to_db(&draft.metadata)?,
            ],
        )?;

        let item = load_required_item(&tx, id)?;
        tx.commit()?;
        Ok(item)
    }

    fn get_item(&self, id: ItemId, include_deleted: bool) -> RepoResult<Option<Item>> {
        load_item_filtered(self.conn, id, include_deleted)
    }

    fn update_item(&self, id: ItemId, patch: &ItemPatch) -> RepoResult<Item> {
        patch.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = load_item_filtered(&tx, id, false)?.ok_or(RepoError::NotFound(id))?;

        if (patch.content.is_some() || patch.content_raw.is_some())
            && existing.kind != ItemType::Note
        {
            return Err(RepoError::Validation(ItemValidationError::ContentOnNonNote(
                existing.kind,
            )));
        }

        let mut sql = String::from("UPDATE items SET updated_at = (strftime('%s', 'now') * 1000)");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(title) = &patch.title {
            sql.push_str(", title = ?");
            bind_values.push(Value::Text(title.trim().to_string()));
        }

        if let Some(content) = &patch.content {
            let effective_type = patch
                .content_type
                .or(existing.content_type)
                .unwrap_or(ContentType::Markdown);
            let derived = derive_content(content, effective_type);
            sql.push_str(
                ", content = ?, content_plaintext = ?, word_count = ?, char_count = ?",
            );
            bind_values.push(Value::Text(content.clone()));
            bind_values.push(Value::Text(derived.plaintext));
            bind_values.push(Value::Integer(derived.word_count));
            bind_values.push(Value::Integer(derived.char_count));
        }

        if let Some(content_type) = patch.content_type {
            sql.push_str(", content_type = ?");
            bind_values.push(Value::Text(content_type.as_str().to_string()));
        }

        if let Some(content_raw) = &patch.content_raw {
            sql.push_str(", content_raw = ?");
            bind_values.push(Value::Text(content_raw.clone()));
        }

        if let Some(metadata) = &patch.metadata {
            sql.push_str(", metadata = ?");
            bind_values.push(Value::Text(metadata_to_db(metadata)?));
        }

        sql.push_str(" WHERE id = ? AND deleted_at IS NULL");
        bind_values.push(Value::Text(id.to_string()));

        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let item = load_required_item(&tx, id)?;
        tx.commit()?;
        Ok(item)
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        // One statement stamps the whole subtree with a uniform tombstone;
        // `'now'` is fixed per statement, so every row gets the same value.
        let changed = tx.execute(
            "WITH RECURSIVE subtree(id) AS (
                SELECT id
                FROM items
                WHERE id = ?1
                  AND deleted_at IS NULL
                UNION ALL
                SELECT child.id
                FROM items child
                INNER JOIN subtree parent ON child.parent_id = parent.id
                WHERE child.deleted_at IS NULL
            )
            UPDATE items
            SET deleted_at = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
            WHERE id IN (SELECT id FROM subtree)
              AND deleted_at IS NULL;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(())
    }

    fn list_all(&self) -> RepoResult<Vec<Item>> {
        let sql = format!("{ITEM_SELECT_SQL} WHERE deleted_at IS NULL {SIBLING_ORDER_SQL};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn list_children(&self, parent_id: Option<ItemId>) -> RepoResult<Vec<Item>> {
        let sql = match parent_id {
            Some(_) => format!(
                "{ITEM_SELECT_SQL} WHERE parent_id = ?1 AND deleted_at IS NULL {SIBLING_ORDER_SQL};"
            ),
            None => format!(
                "{ITEM_SELECT_SQL} WHERE parent_id IS NULL AND deleted_at IS NULL {SIBLING_ORDER_SQL};"
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = match parent_id {
            Some(parent_id) => stmt.query([parent_id.to_string()])?,
            None => stmt.query([])?,
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn move_item(
        &self,
        id: ItemId,
        new_parent_id: Option<ItemId>,
        insert_index: Option<usize>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let item = load_item_filtered(&tx, id, false)?.ok_or(RepoError::NotFound(id))?;

        let parent_kind = match new_parent_id {
            Some(parent_id) => {
                let parent = load_item_filtered(&tx, parent_id, false)?
                    .ok_or(RepoError::ParentNotFound(parent_id))?;
                Some(parent.kind)
            }
            None => None,
        };
        if !can_be_child_of(item.kind, parent_kind) {
            return Err(RepoError::IllegalNesting {
                child: item.kind,
                parent: parent_kind,
            });
        }
        if let Some(parent_id) = new_parent_id {
            ensure_no_cycle(&tx, id, parent_id)?;
        }

        // Destination siblings in assembler order, minus the moved item for
        // the same-parent reorder case.
        let mut siblings = list_sibling_order(&tx, new_parent_id)?;
        siblings.retain(|sibling| sibling.id != id);

        let index = insert_index.unwrap_or(siblings.len()).min(siblings.len());
        let lower = index
            .checked_sub(1)
            .and_then(|slot| siblings.get(slot))
            .map(|sibling| sibling.sort_order.as_str());
        let upper = siblings
            .get(index)
            .map(|sibling| sibling.sort_order.as_str());
        let sort_order = key_between(lower, upper)?;

        let changed = tx.execute(
            "UPDATE items
             SET parent_id = ?2,
                 sort_order = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![
                id.to_string(),
                new_parent_id.map(|value| value.to_string()),
                sort_order,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(())
    }
}

struct SiblingOrder {
    id: ItemId,
    sort_order: String,
}

/// Reads sibling order from the `tree_items` view, the projection the tree
/// assembler consumes. Keeping one source avoids drift between what the tree
/// shows and what key computation assumes.
fn list_sibling_order(
    conn: &Connection,
    parent_id: Option<ItemId>,
) -> RepoResult<Vec<SiblingOrder>> {
    let sql = match parent_id {
        Some(_) => format!(
            "SELECT id, sort_order FROM tree_items WHERE parent_id = ?1 {SIBLING_ORDER_SQL};"
        ),
        None => format!(
            "SELECT id, sort_order FROM tree_items WHERE parent_id IS NULL {SIBLING_ORDER_SQL};"
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = match parent_id {
        Some(parent_id) => stmt.query([parent_id.to_string()])?,
        None => stmt.query([])?,
    };

    let mut siblings = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get(0)?;
        siblings.push(SiblingOrder {
            id: parse_uuid(&id_text, "tree_items.id")?,
            sort_order: row.get(1)?,
        });
    }
    Ok(siblings)
}

/// Walks from the candidate parent toward the root; the moved item must not
/// appear on that path.
fn ensure_no_cycle(
    conn: &Connection,
    item_id: ItemId,
    candidate_parent: ItemId,
) -> RepoResult<()> {
    let mut visited = HashSet::new();
    let mut cursor = Some(candidate_parent);
    while let Some(current) = cursor {
        if current == item_id || !visited.insert(current) {
            return Err(RepoError::CycleDetected {
                item: item_id,
                parent: candidate_parent,
            });
        }

        let parent_text: Option<Option<String>> = conn
            .query_row(
                "SELECT parent_id
                 FROM items
                 WHERE id = ?1
                   AND deleted_at IS NULL;",
                [current.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let parent_text = parent_text.ok_or(RepoError::ParentNotFound(current))?;
        cursor = parent_text
            .map(|value| parse_uuid(&value, "items.parent_id"))
            .transpose()?;
    }
    Ok(())
}

fn load_item_filtered(
    conn: &Connection,
    id: ItemId,
    include_deleted: bool,
) -> RepoResult<Option<Item>> {
    let sql = format!("{ITEM_SELECT_SQL} WHERE id = ?1 AND (?2 = 1 OR deleted_at IS NULL);");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id.to_string(), include_deleted as i64])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn load_required_item(conn: &Connection, id: ItemId) -> RepoResult<Item> {
    load_item_filtered(conn, id, false)?.ok_or(RepoError::NotFound(id))
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "items.id")?;

    let type_text: String = row.get("type")?;
    let kind = ItemType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item type `{type_text}` in items.type"))
    })?;

    let content_type = row
        .get::<_, Option<String>>("content_type")?
        .map(|value| {
            ContentType::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid content type `{value}` in items.content_type"
                ))
            })
        })
        .transpose()?;

    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "items.parent_id"))
        .transpose()?;

    let metadata_text: String = row.get("metadata")?;
    let metadata = metadata_from_db(&metadata_text)?;

    Ok(Item {
        id,
        kind,
        title: row.get("title")?,
        content: row.get("content")?,
        content_type,
        content_raw: row.get("content_raw")?,
        content_plaintext: row.get("content_plaintext")?,
        word_count: row.get("word_count")?,
        char_count: row.get("char_count")?,
        parent_id,
        sort_order: row.get("sort_order")?,
        metadata,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn metadata_to_db(metadata: &Map<String, serde_json::Value>) -> RepoResult<String> {
    serde_json::to_string(metadata)
        .map_err(|err| RepoError::InvalidData(format!("metadata cannot serialize: {err}")))
}

fn metadata_from_db(value: &str) -> RepoResult<Map<String, serde_json::Value>> {
    serde_json::from_str(value).map_err(|err| {
        RepoError::InvalidData(format!("invalid metadata JSON in items.metadata: {err}"))
    })
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<ItemId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !relation_exists(conn, "items")? {
        return Err(RepoError::MissingRequiredTable("items"));
    }
    if !relation_exists(conn, "tree_items")? {
        return Err(RepoError::MissingRequiredTable("tree_items"));
    }

    for column in [
        "id",
        "type",
        "title",
        "content",
        "content_type",
        "content_raw",
        "content_plaintext",
        "word_count",
        "char_count",
        "parent_id",
        "sort_order",
        "metadata",
        "created_at",
        "updated_at",
        "deleted_at",
    ] {
        if !table_has_column(conn, "items", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "items",
                column,
            });
        }
    }

    Ok(())
}

fn relation_exists(conn: &Connection, name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
