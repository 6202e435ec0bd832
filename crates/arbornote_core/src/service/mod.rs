//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep facade layers decoupled from storage details.

pub mod tree_service;
