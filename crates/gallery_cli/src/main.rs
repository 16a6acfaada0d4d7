//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `gallery_store` linkage and a full write/read cycle against an
//!   in-memory database.
//! - Keep output deterministic for quick local sanity checks.

use gallery_store::db::open_db_in_memory;
use gallery_store::{
    GalleryExperience, GalleryExperienceRepository, NoopEventSink, OperationContext,
    SqliteGalleryExperienceRepository,
};
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("gallery_store version={}", gallery_store::store_version());
    match smoke() {
        Ok(visible) => {
            println!("gallery_store smoke=ok visible={visible}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("gallery_store smoke=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke() -> Result<u64, Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let repo = SqliteGalleryExperienceRepository::try_new(&conn)?
        .with_event_sink(Arc::new(NoopEventSink));
    let ctx = OperationContext::background();

    let probe = GalleryExperience::new("smoke-probe", "gallery_cli", "Smoke Probe").at(0.0, 0.0);
    repo.insert(&ctx, &probe)?;
    let loaded = repo.get_by_id(&ctx, &probe.id)?;
    if loaded.experience_name != probe.experience_name {
        return Err("round trip returned a different record".into());
    }
    Ok(repo.count(&ctx)?)
}
