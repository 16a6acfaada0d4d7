//! Persistence access for gallery experience records.
//! Service layers talk to `GalleryExperienceRepository`; SQL stays in here.

pub mod config;
pub mod context;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod timestamp;

pub use config::StoreConfig;
pub use context::{CancelHandle, OperationContext};
pub use events::{LogEventSink, NoopEventSink, RepoEvent, RepoEventSink, RepoOperation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::gallery_experience::{ExperienceId, GalleryExperience, ValidationError};
pub use repo::gallery_experience_repo::{
    GalleryExperienceRepository, RepoError, RepoResult, SqliteGalleryExperienceRepository,
};

/// Returns the store crate version.
pub fn store_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
