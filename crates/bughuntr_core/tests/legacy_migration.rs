use bughuntr_core::{
    run_startup_migration, MigrationError, MigrationOutcome, MigrationService,
    MigrationSkipReason, NoteDraft, ProjectDraft, Store, TemplateDraft,
};
use std::fs;
use std::path::{Path, PathBuf};

const LEGACY_DOCUMENT: &str = r#"{
    "windowBounds": {"width": 1280, "height": 800},
    "projects": [
        {"id": "p-acme", "name": "Acme", "url": "https://acme.test", "scope": "*.acme.test",
         "createdAt": "2023-05-01T10:00:00.000Z", "updatedAt": "2023-05-02T10:00:00.000Z"}
    ],
    "notes": [
        {"id": "n-recon", "title": "Recon", "content": "subdomains", "projectId": "p-acme",
         "tags": ["web", "recon", "web"],
         "createdAt": "2023-05-01T11:00:00.000Z", "updatedAt": "2023-05-03T09:30:00.000Z"},
        {"id": "n-orphan", "title": "", "content": null, "projectId": "p-deleted",
         "tags": [" misc "]}
    ]
}"#;

fn write_legacy(dir: &Path, raw: &str) -> PathBuf {
    let path = dir.join("config.json");
    fs::write(&path, raw).unwrap();
    path
}

fn backups_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("config.json.backup-"))
                .unwrap_or(false)
        })
        .collect()
}

#[test]
fn legacy_document_is_imported_with_backup() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), LEGACY_DOCUMENT);
    let store = Store::open(dir.path().join("bughuntr.db")).unwrap();

    let (summary, backup_path) = match MigrationService::new(&store, &legacy_path).run() {
        Ok(MigrationOutcome::Migrated {
            summary,
            backup_path,
        }) => (summary, backup_path),
        other => panic!("expected a migration, got {other:?}"),
    };
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.notes, 2);
    assert_eq!(summary.tags, 3);
    assert_eq!(summary.templates, 0);
    assert_eq!(summary.detached_notes, 1);

    let backup_path = backup_path.unwrap();
    assert_eq!(fs::read_to_string(&backup_path).unwrap(), LEGACY_DOCUMENT);
    assert_eq!(fs::read_to_string(&legacy_path).unwrap(), LEGACY_DOCUMENT);

    let recon = store.get_note("n-recon").unwrap().unwrap();
    assert_eq!(recon.project_id.as_deref(), Some("p-acme"));
    assert_eq!(recon.tags, vec!["recon".to_string(), "web".to_string()]);
    assert_eq!(recon.created_at, 1_682_938_800_000);

    let orphan = store.get_note("n-orphan").unwrap().unwrap();
    assert_eq!(orphan.project_id, None);
    assert_eq!(orphan.title, "Untitled Note");
    assert_eq!(orphan.tags, vec!["misc".to_string()]);

    let project = store.get_project("p-acme").unwrap().unwrap();
    assert_eq!(project.scope.as_deref(), Some("*.acme.test"));
}

#[test]
fn second_run_is_skipped_and_dataset_is_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), LEGACY_DOCUMENT);
    let store = Store::open(dir.path().join("bughuntr.db")).unwrap();
    let service = MigrationService::new(&store, &legacy_path);

    service.run().unwrap();
    let notes_after_first = store.list_notes().unwrap();
    let projects_after_first = store.list_projects().unwrap();
    let tags_after_first = store.list_distinct_tag_names().unwrap();

    let second = service.run().unwrap();
    assert_eq!(
        second,
        MigrationOutcome::Skipped(MigrationSkipReason::AlreadyMigrated {
            notes: 2,
            projects: 1,
            templates: 0
        })
    );
    assert_eq!(store.list_notes().unwrap(), notes_after_first);
    assert_eq!(store.list_projects().unwrap(), projects_after_first);
    assert_eq!(store.list_distinct_tag_names().unwrap(), tags_after_first);
    assert_eq!(backups_in(dir.path()).len(), 1);
}

#[test]
fn existing_data_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), LEGACY_DOCUMENT);
    let store = Store::open(dir.path().join("bughuntr.db")).unwrap();
    store.save_note(NoteDraft::new("fresh", "")).unwrap();

    let outcome = MigrationService::new(&store, &legacy_path).run().unwrap();
    assert!(matches!(
        outcome,
        MigrationOutcome::Skipped(MigrationSkipReason::AlreadyMigrated { notes: 1, .. })
    ));
    assert!(store.get_note("n-recon").unwrap().is_none());
}

#[test]
fn store_with_only_projects_counts_as_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), LEGACY_DOCUMENT);
    let store = Store::open(dir.path().join("bughuntr.db")).unwrap();
    store.save_project(ProjectDraft::new("Created later")).unwrap();

    let outcome = MigrationService::new(&store, &legacy_path).run().unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Skipped(MigrationSkipReason::AlreadyMigrated {
            notes: 0,
            projects: 1,
            templates: 0
        })
    );
}

#[test]
fn legacy_file_without_notes_or_projects_never_replaces_data() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(
        dir.path(),
        r#"{"windowBounds": {"width": 1280, "height": 800}, "theme": "dark"}"#,
    );
    let store = Store::open(dir.path().join("bughuntr.db")).unwrap();
    let service = MigrationService::new(&store, &legacy_path);

    assert_eq!(
        service.run().unwrap(),
        MigrationOutcome::Skipped(MigrationSkipReason::EmptyLegacyData)
    );
    assert!(backups_in(dir.path()).is_empty());

    let template = store
        .save_template(TemplateDraft {
            name: "XSS".to_string(),
            ..TemplateDraft::default()
        })
        .unwrap();
    store
        .save_note(NoteDraft::new("draft", "").with_tags(["web"]))
        .unwrap();
    store.delete_note(&store.list_notes().unwrap()[0].id).unwrap();

    let restart = service.run().unwrap();
    assert_eq!(
        restart,
        MigrationOutcome::Skipped(MigrationSkipReason::AlreadyMigrated {
            notes: 0,
            projects: 0,
            templates: 1
        })
    );
    assert_eq!(store.list_templates().unwrap(), vec![template]);
    assert_eq!(store.list_distinct_tag_names().unwrap(), vec!["web".to_string()]);
    assert!(backups_in(dir.path()).is_empty());
}

#[test]
fn empty_legacy_arrays_are_skipped_on_every_start() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), r#"{"projects": [], "notes": null}"#);
    let store = Store::open_in_memory().unwrap();

    for _ in 0..2 {
        let report = run_startup_migration(&store, &legacy_path);
        assert!(matches!(
            report.outcome,
            Ok(MigrationOutcome::Skipped(MigrationSkipReason::EmptyLegacyData))
        ));
    }
    assert!(backups_in(dir.path()).is_empty());
    assert_eq!(store.stats().unwrap().tags, 0);
}

#[test]
fn missing_legacy_file_is_a_fresh_install() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_in_memory().unwrap();

    let outcome = MigrationService::new(&store, dir.path().join("config.json"))
        .run()
        .unwrap();
    assert_eq!(
        outcome,
        MigrationOutcome::Skipped(MigrationSkipReason::NoLegacyData)
    );
    assert!(backups_in(dir.path()).is_empty());
}

#[test]
fn unparseable_legacy_file_leaves_store_and_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let broken = r#"{"projects": [{"name": "Acme""#;
    let legacy_path = write_legacy(dir.path(), broken);
    let store = Store::open_in_memory().unwrap();

    let err = MigrationService::new(&store, &legacy_path).run().unwrap_err();
    assert!(matches!(err, MigrationError::Parse { .. }));

    assert_eq!(store.stats().unwrap().projects, 0);
    assert_eq!(store.stats().unwrap().notes, 0);
    assert_eq!(fs::read_to_string(&legacy_path).unwrap(), broken);
    assert!(backups_in(dir.path()).is_empty());
}

#[test]
fn blank_project_name_in_legacy_data_rolls_nothing_in() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(
        dir.path(),
        r#"{"projects": [{"id": "p1", "name": "  "}], "notes": [{"id": "n1"}]}"#,
    );
    let store = Store::open_in_memory().unwrap();

    let err = MigrationService::new(&store, &legacy_path).run().unwrap_err();
    assert!(matches!(err, MigrationError::Storage(_)));
    assert_eq!(store.stats().unwrap().notes, 0);
}

#[test]
fn startup_migration_reports_failures_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), "not json at all");
    let store = Store::open_in_memory().unwrap();

    let report = run_startup_migration(&store, &legacy_path);
    assert!(matches!(report.outcome, Err(MigrationError::Parse { .. })));
    assert_eq!(report.dev_notice.is_some(), cfg!(debug_assertions));

    store.save_note(NoteDraft::new("still works", "")).unwrap();
}

#[test]
fn startup_migration_success_has_no_notice() {
    let dir = tempfile::tempdir().unwrap();
    let legacy_path = write_legacy(dir.path(), LEGACY_DOCUMENT);
    let store = Store::open_in_memory().unwrap();

    let report = run_startup_migration(&store, &legacy_path);
    assert!(matches!(
        report.outcome,
        Ok(MigrationOutcome::Migrated { .. })
    ));
    assert!(report.dev_notice.is_none());
}
