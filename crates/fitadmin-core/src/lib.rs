//! fitadmin-core - Core library for the fitness content console
//!
//! This crate contains the content models, the remote store adapter, the
//! collection cache and the create/edit workflow shared by every fitadmin
//! front end.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod editor;
pub mod error;
pub mod listing;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod repository;
pub mod routes;
pub mod samples;
pub mod util;
pub mod validation;
pub mod wire;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use models::{ContentEntity, ContentKind, ExerciseBlock, Meal, StepId};
pub use repository::{ContentRepository, ContentStore, SyncOutcome};
