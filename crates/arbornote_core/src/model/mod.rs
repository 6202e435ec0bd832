//! Domain model for the polymorphic item tree.
//!
//! # Responsibility
//! - Define the canonical `Item` record shared by note/section/book views.
//! - Keep nesting policy and content derivation as pure, store-free logic.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Deletion is represented by a `deleted_at` tombstone, not row removal.

pub mod content;
pub mod hierarchy;
pub mod item;
