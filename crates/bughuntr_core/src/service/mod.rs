//! Storage use-case services.
//!
//! # Responsibility
//! - `storage_engine`: the shared `Store` handle with CRUD and transactional
//!   writes.
//! - `transfer_service`: whole-dataset replace and export.
//! - `migration_service`: one-shot legacy document import at startup.
//!
//! # Invariants
//! - Every write goes through `Store`, which serializes access to the single
//!   connection.

pub mod error;
pub mod migration_service;
pub mod storage_engine;
pub mod transfer_service;
