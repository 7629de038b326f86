use bughuntr_core::{
    DataSet, ImportExportGateway, ImportedNote, ImportedProject, ImportedTemplate, NoteDraft,
    ProjectDraft, Store, TemplateDraft, UNTITLED_NOTE_TITLE,
};

fn populated_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    let acme = store.save_project(ProjectDraft::new("Acme")).unwrap();
    store
        .save_project(ProjectDraft {
            url: Some("https://globex.test".to_string()),
            scope: Some("*.globex.test".to_string()),
            ..ProjectDraft::new("Globex")
        })
        .unwrap();

    let mut recon = NoteDraft::new("Recon", "## Subdomains\n- api").with_tags(["web", "recon"]);
    recon.project_id = Some(acme.id);
    store.save_note(recon).unwrap();
    store
        .save_note(NoteDraft::new("Scratch", "").with_tags(["misc"]))
        .unwrap();
    store
        .save_template(TemplateDraft {
            name: "Bug report".to_string(),
            category: Some("reporting".to_string()),
            content: "## Steps".to_string(),
            ..TemplateDraft::default()
        })
        .unwrap();
    store
}

#[test]
fn exported_dataset_reimports_to_the_same_rows() {
    let source = populated_store();
    let exported = ImportExportGateway::new(&source).export_dataset().unwrap();
    assert_eq!(exported.projects.len(), 2);
    assert_eq!(exported.notes.len(), 2);
    assert_eq!(exported.templates.len(), 1);

    let target = Store::open_in_memory().unwrap();
    let summary = ImportExportGateway::new(&target)
        .bulk_replace(&exported)
        .unwrap();
    assert_eq!(summary.projects, 2);
    assert_eq!(summary.notes, 2);
    assert_eq!(summary.tags, 3);
    assert_eq!(summary.note_tags, 3);
    assert_eq!(summary.templates, 1);
    assert_eq!(summary.detached_notes, 0);

    assert_eq!(target.list_projects().unwrap(), source.list_projects().unwrap());
    assert_eq!(target.list_notes().unwrap(), source.list_notes().unwrap());
    assert_eq!(target.list_templates().unwrap(), source.list_templates().unwrap());
}

#[test]
fn exported_json_round_trips_through_the_document_format() {
    let source = populated_store();
    let exported = ImportExportGateway::new(&source).export_dataset().unwrap();
    let json = serde_json::to_string_pretty(&exported).unwrap();
    assert!(json.contains("\"projectId\""));
    assert!(json.contains("\"createdAt\""));

    let parsed: DataSet = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, exported);

    let target = Store::open_in_memory().unwrap();
    ImportExportGateway::new(&target).bulk_replace(&parsed).unwrap();
    assert_eq!(target.list_notes().unwrap(), source.list_notes().unwrap());
}

#[test]
fn bulk_replace_discards_everything_not_in_the_payload() {
    let store = populated_store();
    let payload = DataSet {
        projects: vec![ImportedProject {
            id: Some("p1".to_string()),
            name: " Initech ".to_string(),
            created_at: Some(1_000),
            updated_at: Some(2_000),
            ..ImportedProject::default()
        }],
        notes: vec![ImportedNote {
            id: Some("n1".to_string()),
            title: Some("   ".to_string()),
            project_id: Some("p1".to_string()),
            tags: vec!["ssrf".to_string(), " ssrf ".to_string()],
            ..ImportedNote::default()
        }],
        templates: vec![ImportedTemplate {
            name: "Checklist".to_string(),
            ..ImportedTemplate::default()
        }],
    };

    ImportExportGateway::new(&store).bulk_replace(&payload).unwrap();

    let projects = store.list_projects().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].name, "Initech");
    assert_eq!(projects[0].created_at, 1_000);
    assert_eq!(projects[0].updated_at, 2_000);

    let note = store.get_note("n1").unwrap().unwrap();
    assert_eq!(note.title, UNTITLED_NOTE_TITLE);
    assert_eq!(note.content, "");
    assert_eq!(note.tags, vec!["ssrf".to_string()]);

    assert_eq!(store.list_distinct_tag_names().unwrap(), vec!["ssrf".to_string()]);
    let templates = store.list_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "Checklist");
}

#[test]
fn empty_payload_clears_the_store() {
    let store = populated_store();
    let summary = ImportExportGateway::new(&store)
        .bulk_replace(&DataSet::default())
        .unwrap();
    assert_eq!(summary.notes, 0);

    let stats = store.stats().unwrap();
    assert_eq!(stats.projects, 0);
    assert_eq!(stats.notes, 0);
    assert_eq!(stats.tags, 0);
    assert_eq!(stats.note_tags, 0);
    assert_eq!(stats.templates, 0);
}
