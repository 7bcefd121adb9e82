use std::io;

use fitadmin_core::api::ApiError;
use fitadmin_core::auth::AuthError;
use fitadmin_core::editor::EditorError;
use fitadmin_core::ContentKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] fitadmin_core::Error),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Profile '{0}' is not signed in. Run `fitadmin auth login` first.")]
    NotSignedIn(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: ContentKind, id: String },
    #[error("Content document is empty")]
    EmptyDocument,
    #[error("Invalid step image '{0}', expected <position>=<path>")]
    InvalidStepImage(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("{0}")]
    Incomplete(String),
}
