//! Request/response API for the UI layer.
//!
//! # Responsibility
//! - Map UI operations (`listNotes`, `saveProject`, `importData`, ...) onto the
//!   shared `Store` handle.
//! - Translate every outcome into a `{ok, data?, error?}` envelope.
//!
//! # Invariants
//! - `dispatch` never panics and never reports partial success.
//! - Error kinds are stable labels: `connection|constraint|validation|storage`
//!   for storage failures, `request` for undecodable requests.

use bughuntr_core::{
    run_startup_migration, AppPaths, DataSet, ImportExportGateway, NoteDraft, ProjectDraft,
    StartupMigrationReport, StorageError, Store, TemplateDraft,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// One UI operation, encoded as `{"op": "<name>", "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "camelCase")]
pub enum Request {
    ListProjects,
    ListNotes,
    SaveProject(ProjectDraft),
    SaveNote(NoteDraft),
    DeleteProject { id: String },
    DeleteNote { id: String },
    /// Saves every note in one transaction.
    SaveAllNotes(Vec<NoteDraft>),
    ListDistinctTagNames,
    ListTemplates,
    SaveTemplate(TemplateDraft),
    DeleteTemplate { id: String },
    /// Replaces the whole dataset.
    ImportData(DataSet),
    ExportData,
}

impl Request {
    /// Operation name used in logs.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::ListProjects => "listProjects",
            Self::ListNotes => "listNotes",
            Self::SaveProject(_) => "saveProject",
            Self::SaveNote(_) => "saveNote",
            Self::DeleteProject { .. } => "deleteProject",
            Self::DeleteNote { .. } => "deleteNote",
            Self::SaveAllNotes(_) => "saveAllNotes",
            Self::ListDistinctTagNames => "listDistinctTagNames",
            Self::ListTemplates => "listTemplates",
            Self::SaveTemplate(_) => "saveTemplate",
            Self::DeleteTemplate { .. } => "deleteTemplate",
            Self::ImportData(_) => "importData",
            Self::ExportData => "exportData",
        }
    }
}

/// Failure category reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Connection,
    Constraint,
    Validation,
    Storage,
    Request,
}

impl From<&StorageError> for ErrorKind {
    fn from(value: &StorageError) -> Self {
        match value {
            StorageError::Connection(_) => Self::Connection,
            StorageError::Constraint(_) => Self::Constraint,
            StorageError::Validation(_) => Self::Validation,
            StorageError::Sqlite(_) | StorageError::InvalidData(_) | StorageError::LockPoisoned => {
                Self::Storage
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Response envelope for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Response {
    fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(ApiError {
                kind,
                message: message.into(),
            }),
        }
    }
}

/// Executes one request against the store.
pub fn dispatch(store: &Store, request: Request) -> Response {
    let started_at = Instant::now();
    let op = request.op_name();

    let response = match execute(store, request) {
        Ok(data) => Response::success(data),
        Err(DispatchError::Storage(err)) => {
            warn!(
                "event=api_dispatch module=api status=error op={} error_code={} duration_ms={}",
                op,
                err.code(),
                started_at.elapsed().as_millis()
            );
            Response::failure(ErrorKind::from(&err), err.to_string())
        }
        Err(DispatchError::Encode(err)) => {
            warn!(
                "event=api_dispatch module=api status=error op={} error_code=encode duration_ms={}",
                op,
                started_at.elapsed().as_millis()
            );
            Response::failure(ErrorKind::Storage, format!("cannot encode {op} result: {err}"))
        }
    };

    if response.ok {
        debug!(
            "event=api_dispatch module=api status=ok op={} duration_ms={}",
            op,
            started_at.elapsed().as_millis()
        );
    }
    response
}

/// Decodes a JSON request, dispatches it and encodes the response.
pub fn dispatch_json(store: &Store, raw_request: &str) -> String {
    let response = match serde_json::from_str::<Request>(raw_request) {
        Ok(request) => dispatch(store, request),
        Err(err) => Response::failure(ErrorKind::Request, format!("invalid request: {err}")),
    };
    serde_json::to_string(&response).unwrap_or_else(|err| {
        format!(
            r#"{{"ok":false,"error":{{"kind":"storage","message":"cannot encode response: {}"}}}}"#,
            err.to_string().replace('"', "'")
        )
    })
}

enum DispatchError {
    Storage(StorageError),
    Encode(serde_json::Error),
}

impl From<StorageError> for DispatchError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

fn execute(store: &Store, request: Request) -> Result<Value, DispatchError> {
    let data = match request {
        Request::ListProjects => serde_json::to_value(store.list_projects()?)?,
        Request::ListNotes => serde_json::to_value(store.list_notes()?)?,
        Request::SaveProject(draft) => serde_json::to_value(store.save_project(draft)?)?,
        Request::SaveNote(draft) => serde_json::to_value(store.save_note(draft)?)?,
        Request::DeleteProject { id } => json!({ "deleted": store.delete_project(&id)? }),
        Request::DeleteNote { id } => json!({ "deleted": store.delete_note(&id)? }),
        Request::SaveAllNotes(drafts) => serde_json::to_value(store.save_notes(drafts)?)?,
        Request::ListDistinctTagNames => serde_json::to_value(store.list_distinct_tag_names()?)?,
        Request::ListTemplates => serde_json::to_value(store.list_templates()?)?,
        Request::SaveTemplate(draft) => serde_json::to_value(store.save_template(draft)?)?,
        Request::DeleteTemplate { id } => json!({ "deleted": store.delete_template(&id)? }),
        Request::ImportData(data) => {
            serde_json::to_value(ImportExportGateway::new(store).bulk_replace(&data)?)?
        }
        Request::ExportData => {
            serde_json::to_value(ImportExportGateway::new(store).export_dataset()?)?
        }
    };
    Ok(data)
}

/// Process-wide handles created once at startup.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<Store>,
    paths: AppPaths,
}

impl AppContext {
    /// Opens the store under `paths`, installs the schema and runs the
    /// startup migration.
    ///
    /// Migration failures do not fail startup; they are returned in the
    /// report so the UI can show `dev_notice`.
    pub fn start(paths: AppPaths) -> Result<(Self, StartupMigrationReport), StorageError> {
        let store = Store::open(&paths.db_path)?;
        store.initialize()?;
        let report = run_startup_migration(&store, &paths.legacy_path);
        info!(
            "event=app_context_start module=api status=ok migration_ok={}",
            report.outcome.is_ok()
        );
        Ok((
            Self {
                store: Arc::new(store),
                paths,
            },
            report,
        ))
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn dispatch(&self, request: Request) -> Response {
        dispatch(&self.store, request)
    }
}
