//! UI-facing entry points over the BugHuntr storage core.

pub mod api;

pub use api::{dispatch, dispatch_json, ApiError, AppContext, ErrorKind, Request, Response};
