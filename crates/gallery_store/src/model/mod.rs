//! Gallery experience domain model.
//!
//! # Responsibility
//! - Define the single persisted record shape used by the store.
//! - Keep write-path validation next to the data it guards.
//!
//! # Invariants
//! - Every record is identified by a caller-supplied, non-empty `id`.
//! - Deletion is represented by soft-delete flags, not physical removal.

pub mod gallery_experience;
