use gallery_store::db::open_db_in_memory;
use gallery_store::{
    GalleryExperience, GalleryExperienceRepository, OperationContext, RepoError,
    SqliteGalleryExperienceRepository, ValidationError,
};
use rusqlite::Connection;

fn sunset_point() -> GalleryExperience {
    let mut experience = GalleryExperience::new("e1", "curator", "Sunset Point").at(12.5, 45.1);
    experience.experience_desc = "West-facing lookout".to_string();
    experience.experience_picture = "https://cdn.example.com/sunset.jpg".to_string();
    experience
}

fn visible_ids(repo: &SqliteGalleryExperienceRepository<'_>, limit: u32, offset: u32) -> Vec<String> {
    repo.list(&OperationContext::background(), limit, offset)
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect()
}

#[test]
fn insert_then_get_returns_fresh_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    let experience = sunset_point();
    repo.insert(&ctx, &experience).unwrap();

    let loaded = repo.get_by_id(&ctx, "e1").unwrap();
    assert_eq!(loaded.id, "e1");
    assert_eq!(loaded.created_by, "curator");
    assert!(loaded.created_date.is_some());
    assert_eq!(loaded.experience_name, "Sunset Point");
    assert_eq!(loaded.experience_desc, "West-facing lookout");
    assert_eq!(loaded.experience_picture, "https://cdn.example.com/sunset.jpg");
    assert_eq!(loaded.longitude, 12.5);
    assert_eq!(loaded.latitude, 45.1);
    assert!(!loaded.is_deleted);
    assert!(loaded.is_active);
    assert_eq!(loaded.modified_by, None);
    assert_eq!(loaded.modified_date, None);
    assert_eq!(loaded.deleted_by, None);
    assert_eq!(loaded.deleted_date, None);
}

#[test]
fn insert_ignores_caller_lifecycle_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    let mut experience = sunset_point();
    experience.modified_by = Some("someone".to_string());
    experience.deleted_by = Some("someone".to_string());
    experience.is_deleted = true;
    experience.is_active = false;
    repo.insert(&ctx, &experience).unwrap();

    let loaded = repo.get_by_id(&ctx, "e1").unwrap();
    assert!(loaded.is_visible());
    assert_eq!(loaded.modified_by, None);
    assert_eq!(loaded.deleted_by, None);
}

#[test]
fn get_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();

    let err = repo
        .get_by_id(&OperationContext::background(), "missing")
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "missing"));
}

#[test]
fn get_rejects_empty_id_instead_of_matching_any_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();

    assert!(matches!(repo.get_by_id(&ctx, ""), Err(RepoError::EmptyId)));
    assert!(matches!(repo.get_by_id(&ctx, "   "), Err(RepoError::EmptyId)));
}

#[test]
fn get_treats_id_as_data_not_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();

    let err = repo.get_by_id(&ctx, "x' OR '1'='1").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn duplicate_insert_surfaces_query_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    repo.insert(&ctx, &sunset_point()).unwrap();
    let err = repo.insert(&ctx, &sunset_point()).unwrap_err();
    assert!(matches!(err, RepoError::Query(_)));
}

#[test]
fn insert_and_update_enforce_validation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    let blank = GalleryExperience::new("", "curator", "Nameless");
    let err = repo.insert(&ctx, &blank).unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyId)));

    repo.insert(&ctx, &sunset_point()).unwrap();
    let mut off_map = sunset_point();
    off_map.latitude = 123.0;
    let err = repo.update(&ctx, &off_map).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::CoordinateOutOfRange { field: "latitude", .. })
    ));
    assert_eq!(repo.count(&ctx).unwrap(), 1);
}

#[test]
fn update_changes_content_and_modification_audit_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();
    let before = repo.get_by_id(&ctx, "e1").unwrap();

    let mut changed = before.clone();
    changed.created_by = "impostor".to_string();
    changed.experience_name = "Sunset Point Renamed".to_string();
    changed.experience_desc = "Now with benches".to_string();
    changed.experience_picture = "sunset-v2.jpg".to_string();
    changed.longitude = -8.25;
    changed.latitude = 40.0;
    changed.modified_by = Some("editor".to_string());
    repo.update(&ctx, &changed).unwrap();

    let after = repo.get_by_id(&ctx, "e1").unwrap();
    assert_eq!(after.experience_name, "Sunset Point Renamed");
    assert_eq!(after.experience_desc, "Now with benches");
    assert_eq!(after.experience_picture, "sunset-v2.jpg");
    assert_eq!(after.longitude, -8.25);
    assert_eq!(after.latitude, 40.0);
    assert_eq!(after.modified_by.as_deref(), Some("editor"));
    assert!(after.modified_date.is_some());

    assert_eq!(after.id, before.id);
    assert_eq!(after.created_by, "curator");
    assert_eq!(after.created_date, before.created_date);
    assert_eq!(after.is_deleted, before.is_deleted);
    assert_eq!(after.is_active, before.is_active);
    assert_eq!(after.deleted_by, None);
}

#[test]
fn update_missing_id_reports_affected_row_mismatch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();

    let mut missing = sunset_point();
    missing.modified_by = Some("editor".to_string());
    let err = repo
        .update(&OperationContext::background(), &missing)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::AffectedRowMismatch { ref id, affected: 0 } if id == "e1"
    ));
}

#[test]
fn update_requires_modifying_actor_and_keeps_previous_audit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();

    let mut edit = sunset_point();
    edit.modified_by = Some("editor".to_string());
    repo.update(&ctx, &edit).unwrap();
    let audited = repo.get_by_id(&ctx, "e1").unwrap();

    for actor in [None, Some(String::new()), Some("   ".to_string())] {
        let mut anonymous = audited.clone();
        anonymous.experience_name = "Anonymous edit".to_string();
        anonymous.modified_by = actor;
        let err = repo.update(&ctx, &anonymous).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::MissingActor {
                field: "modified_by"
            })
        ));
    }

    let after = repo.get_by_id(&ctx, "e1").unwrap();
    assert_eq!(after.experience_name, "Sunset Point");
    assert_eq!(after.modified_by.as_deref(), Some("editor"));
    assert_eq!(after.modified_date, audited.modified_date);
}

#[test]
fn delete_requires_deleting_actor() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();

    for actor in ["", "  "] {
        let err = repo.delete(&ctx, "e1", actor).unwrap_err();
        assert!(matches!(
            err,
            RepoError::Validation(ValidationError::MissingActor {
                field: "deleted_by"
            })
        ));
    }

    let untouched = repo.get_by_id(&ctx, "e1").unwrap();
    assert!(untouched.is_visible());
    assert_eq!(untouched.deleted_by, None);
    assert_eq!(untouched.deleted_date, None);
    assert_eq!(repo.count(&ctx).unwrap(), 1);
}

#[test]
fn update_keeps_soft_delete_flags() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();
    repo.delete(&ctx, "e1", "admin").unwrap();

    let mut edited = sunset_point();
    edited.experience_name = "Edited after delete".to_string();
    edited.modified_by = Some("editor".to_string());
    repo.update(&ctx, &edited).unwrap();

    let loaded = repo.get_by_id(&ctx, "e1").unwrap();
    assert_eq!(loaded.experience_name, "Edited after delete");
    assert!(loaded.is_soft_deleted());
    assert_eq!(loaded.deleted_by.as_deref(), Some("admin"));
}

#[test]
fn delete_soft_deletes_and_hides_from_list_and_count() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    repo.insert(&ctx, &sunset_point()).unwrap();
    repo.insert(&ctx, &GalleryExperience::new("e2", "curator", "Harbor Walk"))
        .unwrap();
    assert_eq!(repo.count(&ctx).unwrap(), 2);

    repo.delete(&ctx, "e1", "admin").unwrap();

    assert_eq!(repo.count(&ctx).unwrap(), 1);
    assert_eq!(visible_ids(&repo, 10, 0), vec!["e2".to_string()]);

    let deleted = repo.get_by_id(&ctx, "e1").unwrap();
    assert!(deleted.is_deleted);
    assert!(!deleted.is_active);
    assert_eq!(deleted.deleted_by.as_deref(), Some("admin"));
    assert!(deleted.deleted_date.is_some());
    assert_eq!(deleted.experience_name, "Sunset Point");
}

#[test]
fn delete_missing_id_is_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    repo.delete(&ctx, "ghost", "admin").unwrap();
    assert_eq!(repo.count(&ctx).unwrap(), 0);
    assert!(matches!(repo.delete(&ctx, "", "admin"), Err(RepoError::EmptyId)));
}

#[test]
fn list_respects_limit_and_hides_inactive_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    for id in ["a", "b", "c", "d"] {
        repo.insert(&ctx, &GalleryExperience::new(id, "curator", id))
            .unwrap();
    }
    conn.execute("UPDATE gallery_experiences SET is_active = 0 WHERE id = 'c';", [])
        .unwrap();

    let page = repo.list(&ctx, 2, 0).unwrap();
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(GalleryExperience::is_visible));

    let all = repo.list(&ctx, 10, 0).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|item| item.id != "c"));
    assert_eq!(repo.count(&ctx).unwrap(), 3);

    assert!(repo.list(&ctx, 0, 0).unwrap().is_empty());
    assert!(repo.list(&ctx, 10, 50).unwrap().is_empty());
}

#[test]
fn list_pagination_orders_by_creation_then_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    for id in ["c", "a", "b", "old"] {
        repo.insert(&ctx, &GalleryExperience::new(id, "curator", id))
            .unwrap();
    }
    conn.execute(
        "UPDATE gallery_experiences SET created_date = '2024-01-01T00:00:00.000Z';",
        [],
    )
    .unwrap();
    conn.execute(
        "UPDATE gallery_experiences SET created_date = '2023-06-01T00:00:00.000Z' WHERE id = 'old';",
        [],
    )
    .unwrap();

    assert_eq!(visible_ids(&repo, 2, 0), vec!["old", "a"]);
    assert_eq!(visible_ids(&repo, 2, 2), vec!["b", "c"]);
    assert_eq!(visible_ids(&repo, 2, 1), visible_ids(&repo, 2, 1));
}

#[test]
fn stored_audit_dates_are_fixed_width_utc() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();
    repo.insert(&ctx, &sunset_point()).unwrap();
    let mut edit = sunset_point();
    edit.modified_by = Some("editor".to_string());
    repo.update(&ctx, &edit).unwrap();
    repo.delete(&ctx, "e1", "admin").unwrap();

    let (created, modified, deleted): (String, String, String) = conn
        .query_row(
            "SELECT created_date, modified_date, deleted_date FROM gallery_experiences WHERE id = 'e1';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    for stored in [created, modified, deleted] {
        assert_eq!(stored.len(), "2024-01-01T00:00:00.000Z".len(), "{stored}");
        assert!(stored.ends_with('Z'), "{stored}");
        assert_eq!(&stored[19..20], ".", "{stored}");
    }
}

#[test]
fn count_is_independent_of_pagination() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    assert_eq!(repo.count(&ctx).unwrap(), 0);
    for index in 0..7 {
        let id = format!("exp-{index}");
        repo.insert(&ctx, &GalleryExperience::new(id, "curator", "Stop"))
            .unwrap();
    }
    repo.delete(&ctx, "exp-3", "admin").unwrap();

    assert_eq!(repo.list(&ctx, 2, 0).unwrap().len(), 2);
    assert_eq!(repo.count(&ctx).unwrap(), 6);
}

#[test]
fn sunset_point_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    repo.insert(&ctx, &sunset_point()).unwrap();
    let created = repo.get_by_id(&ctx, "e1").unwrap();
    assert!(created.is_active);

    let mut renamed = created.clone();
    renamed.experience_name = "Sunset Point Renamed".to_string();
    renamed.modified_by = Some("editor".to_string());
    repo.update(&ctx, &renamed).unwrap();
    let updated = repo.get_by_id(&ctx, "e1").unwrap();
    assert_eq!(updated.experience_name, "Sunset Point Renamed");
    assert!(updated.modified_date.is_some());

    repo.delete(&ctx, "e1", "admin").unwrap();
    assert!(visible_ids(&repo, 10, 0).is_empty());
    let retained = repo.get_by_id(&ctx, "e1").unwrap();
    assert!(retained.is_deleted);
    assert_eq!(retained.experience_name, "Sunset Point Renamed");
}

#[test]
fn undecodable_rows_surface_scan_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteGalleryExperienceRepository::try_new(&conn).unwrap();
    let ctx = OperationContext::background();

    insert_raw(&conn, "bad-type", "'2024-01-01T00:00:00.000Z'", "0", "'east'");
    insert_raw(&conn, "bad-flag", "'2024-01-01T00:00:00.000Z'", "7", "1.0");
    insert_raw(&conn, "bad-date", "'last tuesday'", "0", "1.0");

    assert!(matches!(repo.get_by_id(&ctx, "bad-type"), Err(RepoError::Scan(_))));
    assert!(matches!(
        repo.get_by_id(&ctx, "bad-flag"),
        Err(RepoError::InvalidData(message)) if message.contains("is_deleted")
    ));
    assert!(matches!(
        repo.get_by_id(&ctx, "bad-date"),
        Err(RepoError::InvalidData(message)) if message.contains("created_date")
    ));
    assert!(repo.list(&ctx, 10, 0).is_err());
}

#[test]
fn repository_rejects_connection_without_table() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteGalleryExperienceRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("gallery_experiences"))
    ));
}

#[test]
fn repository_rejects_table_missing_a_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE gallery_experiences (
            id TEXT PRIMARY KEY NOT NULL,
            created_by TEXT NOT NULL,
            created_date TEXT NOT NULL,
            modified_by TEXT,
            modified_date TEXT,
            deleted_by TEXT,
            deleted_date TEXT,
            is_deleted INTEGER NOT NULL,
            is_active INTEGER NOT NULL,
            experience_name TEXT NOT NULL,
            experience_desc TEXT NOT NULL,
            experience_picture TEXT NOT NULL,
            longitude REAL NOT NULL
        );",
    )
    .unwrap();

    let result = SqliteGalleryExperienceRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "gallery_experiences",
            column: "latitude"
        })
    ));
}

fn insert_raw(conn: &Connection, id: &str, created_date: &str, is_deleted: &str, longitude: &str) {
    conn.execute_batch(&format!(
        "INSERT INTO gallery_experiences (
            id, created_by, created_date, is_deleted, is_active,
            experience_name, experience_desc, experience_picture, longitude, latitude
        ) VALUES ('{id}', 'seed', {created_date}, {is_deleted}, 1, 'n', 'd', 'p', {longitude}, 0.0);"
    ))
    .unwrap();
}
