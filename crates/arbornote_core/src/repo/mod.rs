//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the item tree.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce draft/patch validation before SQL runs.
//! - Every read-compute-write sequence runs inside one transaction.
//! - Repository APIs return semantic errors (`NotFound`, `IllegalNesting`)
//!   in addition to DB transport errors.

pub mod item_repo;
