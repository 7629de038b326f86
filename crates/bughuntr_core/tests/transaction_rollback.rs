use bughuntr_core::db::schema::TABLES;
use bughuntr_core::{
    DataSet, ImportExportGateway, ImportedNote, ImportedProject, NoteDraft, ProjectDraft,
    StorageError, Store, TemplateDraft,
};
use rusqlite::Connection;

fn file_store() -> (tempfile::TempDir, Store, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("bughuntr.db");
    let store = Store::open(&db_path).unwrap();
    store.initialize().unwrap();
    let raw = Connection::open(&db_path).unwrap();
    (dir, store, raw)
}

fn abort_inserts_into(raw: &Connection, table: &str) {
    raw.execute_batch(&format!(
        "CREATE TRIGGER inject_failure BEFORE INSERT ON {table}
         BEGIN
             SELECT RAISE(ABORT, 'injected failure');
         END;"
    ))
    .unwrap();
}

fn clear_injection(raw: &Connection) {
    raw.execute_batch("DROP TRIGGER IF EXISTS inject_failure;")
        .unwrap();
}

/// Every row of every engine table, rendered for equality checks.
fn dump_tables(raw: &Connection) -> Vec<String> {
    let mut dump = Vec::new();
    for table in TABLES {
        let mut stmt = raw
            .prepare(&format!("SELECT * FROM {table} ORDER BY 1, 2;"))
            .unwrap();
        let column_count = stmt.column_count();
        let mut rows = stmt.query([]).unwrap();
        while let Some(row) = rows.next().unwrap() {
            let values: Vec<String> = (0..column_count)
                .map(|index| format!("{:?}", row.get_ref(index).unwrap()))
                .collect();
            dump.push(format!("{table}|{}", values.join("|")));
        }
    }
    dump
}

fn seed(store: &Store) {
    let project = store.save_project(ProjectDraft::new("Acme")).unwrap();
    let mut recon = NoteDraft::new("Recon", "subdomains").with_tags(["web", "recon"]);
    recon.project_id = Some(project.id);
    store.save_note(recon).unwrap();
    store
        .save_note(NoteDraft::new("Loose", "").with_tags(["misc"]))
        .unwrap();
    store
        .save_template(TemplateDraft {
            name: "Report".to_string(),
            ..TemplateDraft::default()
        })
        .unwrap();
}

#[test]
fn failed_tag_link_keeps_previous_note_and_tag_set() {
    let (_dir, store, raw) = file_store();
    let note = store
        .save_note(NoteDraft::new("Recon", "v1").with_tags(["web", "recon"]))
        .unwrap();
    let before = dump_tables(&raw);

    abort_inserts_into(&raw, "note_tags");
    let err = store
        .save_note(NoteDraft {
            id: Some(note.id.clone()),
            ..NoteDraft::new("Recon v2", "v2").with_tags(["idor"])
        })
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)));
    assert_eq!(err.code(), "constraint");

    let current = store.get_note(&note.id).unwrap().unwrap();
    assert_eq!(current.title, "Recon");
    assert_eq!(current.content, "v1");
    assert_eq!(current.tags, vec!["recon".to_string(), "web".to_string()]);
    assert!(!store
        .list_distinct_tag_names()
        .unwrap()
        .contains(&"idor".to_string()));
    assert_eq!(dump_tables(&raw), before);

    clear_injection(&raw);
    let saved = store
        .save_note(NoteDraft {
            id: Some(note.id),
            ..NoteDraft::new("Recon v2", "v2").with_tags(["idor"])
        })
        .unwrap();
    assert_eq!(saved.tags, vec!["idor".to_string()]);
}

#[test]
fn failed_bulk_replace_leaves_every_table_identical() {
    let (_dir, store, raw) = file_store();
    seed(&store);
    let before = dump_tables(&raw);
    assert!(!before.is_empty());

    let payload = DataSet {
        projects: vec![ImportedProject {
            id: Some("p-new".to_string()),
            name: "Globex".to_string(),
            ..ImportedProject::default()
        }],
        notes: vec![ImportedNote {
            id: Some("n-new".to_string()),
            project_id: Some("p-new".to_string()),
            tags: vec!["api".to_string()],
            ..ImportedNote::default()
        }],
        templates: Vec::new(),
    };

    abort_inserts_into(&raw, "notes");
    let err = ImportExportGateway::new(&store)
        .bulk_replace(&payload)
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)));
    assert_eq!(dump_tables(&raw), before);

    clear_injection(&raw);
    let summary = ImportExportGateway::new(&store)
        .bulk_replace(&payload)
        .unwrap();
    assert_eq!(summary.projects, 1);
    assert_eq!(summary.notes, 1);
    let notes = store.list_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].project_id.as_deref(), Some("p-new"));
    assert!(store.list_templates().unwrap().is_empty());
}

#[test]
fn duplicate_ids_in_payload_roll_back_the_replace() {
    let (_dir, store, raw) = file_store();
    seed(&store);
    let before = dump_tables(&raw);

    let duplicate = ImportedNote {
        id: Some("same".to_string()),
        ..ImportedNote::default()
    };
    let payload = DataSet {
        notes: vec![duplicate.clone(), duplicate],
        ..DataSet::default()
    };

    let err = ImportExportGateway::new(&store)
        .bulk_replace(&payload)
        .unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)));
    assert_eq!(dump_tables(&raw), before);
}

#[test]
fn store_stays_usable_after_a_rollback() {
    let (_dir, store, raw) = file_store();
    abort_inserts_into(&raw, "projects");
    assert!(store.save_project(ProjectDraft::new("Acme")).is_err());

    clear_injection(&raw);
    let project = store.save_project(ProjectDraft::new("Acme")).unwrap();
    assert_eq!(store.list_projects().unwrap(), vec![project]);
}
