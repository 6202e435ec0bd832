//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical record behind notes, sections, and books.
//! - Provide creation/patch input shapes with local validation.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `deleted_at` is the source of truth for tombstone state.
//! - Content fields are meaningful only for `ItemType::Note`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every item in the tree.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = Uuid;

/// Closed category set for the polymorphic `items` entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Leaf content item carrying a body.
    Note,
    /// Grouping level inside a book.
    Section,
    /// Top-level grouping, may also nest under another book.
    Book,
}

impl ItemType {
    /// Returns whether items of this type may hold children.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Book | Self::Section)
    }

    /// Canonical storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Section => "section",
            Self::Book => "book",
        }
    }

    /// Parses the storage spelling back into the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "note" => Some(Self::Note),
            "section" => Some(Self::Section),
            "book" => Some(Self::Book),
            _ => None,
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared format of a note body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Html,
    Markdown,
    Plain,
    Custom,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "html" => Some(Self::Html),
            "markdown" => Some(Self::Markdown),
            "plain" => Some(Self::Plain),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Canonical stored record for one tree item.
///
/// One storage shape supports all three projections; note-only fields stay
/// `None` for container items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable global id.
    pub id: ItemId,
    /// Serialized as `type` to match the storage schema naming.
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// User-facing label, non-blank.
    pub title: String,
    /// Note body in its declared format.
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
    /// Unprocessed source body, kept verbatim for editors that need it.
    pub content_raw: Option<String>,
    /// Derived from `content` on every content write.
    pub content_plaintext: Option<String>,
    pub word_count: Option<i64>,
    pub char_count: Option<i64>,
    /// `None` means root-level.
    pub parent_id: Option<ItemId>,
    /// Fractional order key; lexicographic order among siblings.
    pub sort_order: String,
    /// Free-form UI/type-specific fields, not schema-validated.
    pub metadata: Map<String, Value>,
    /// Epoch ms, set by the repository.
    pub created_at: i64,
    /// Epoch ms, refreshed by the repository on every write.
    pub updated_at: i64,
    /// Epoch ms tombstone; `Some` marks the item soft-deleted.
    pub deleted_at: Option<i64>,
}

impl Item {
    /// Returns whether this item should be considered visible.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Validation failures local to item input shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Title is blank after trim.
    BlankTitle,
    /// Content supplied for a type that cannot carry a body.
    ContentOnNonNote(ItemType),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "item title must not be blank"),
            Self::ContentOnNonNote(kind) => {
                write!(f, "content is only valid for notes, got type `{kind}`")
            }
        }
    }
}

impl Error for ItemValidationError {}

/// Input shape for `create_item`.
///
/// The repository assigns `id`, `sort_order`, timestamps, and the derived
/// content fields; callers only describe intent.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub kind: ItemType,
    pub title: String,
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
    pub content_raw: Option<String>,
    pub parent_id: Option<ItemId>,
    pub metadata: Map<String, Value>,
}

impl ItemDraft {
    pub fn new(kind: ItemType, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            content: None,
            content_type: None,
            content_raw: None,
            parent_id: None,
            metadata: Map::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: ItemId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>, content_type: ContentType) -> Self {
        self.content = Some(content.into());
        self.content_type = Some(content_type);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Checks draft-local invariants before any store interaction.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.title.trim().is_empty() {
            return Err(ItemValidationError::BlankTitle);
        }
        if self.kind != ItemType::Note && (self.content.is_some() || self.content_raw.is_some()) {
            return Err(ItemValidationError::ContentOnNonNote(self.kind));
        }
        Ok(())
    }
}

/// Partial field patch for `update_item`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_type: Option<ContentType>,
    pub content_raw: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl ItemPatch {
    /// Returns whether the patch carries no field changes at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.content_type.is_none()
            && self.content_raw.is_none()
            && self.metadata.is_none()
    }

    /// Checks patch-local invariants; type-dependent checks happen in the
    /// repository where the stored item is known.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ItemValidationError::BlankTitle);
            }
        }
        Ok(())
    }
}
