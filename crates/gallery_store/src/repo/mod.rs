//! Repository layer for gallery experiences.
//!
//! # Responsibility
//! - Define the data access contract consumed by service layers.
//! - Isolate SQLite query details behind that contract.
//!
//! # Invariants
//! - Write paths enforce `GalleryExperience::validate()` before SQL runs.
//! - Every statement is parameterized; identifiers never reach SQL text.
//! - Repository APIs return semantic errors (`NotFound`,
//!   `AffectedRowMismatch`) in addition to driver errors.

pub mod gallery_experience_repo;
