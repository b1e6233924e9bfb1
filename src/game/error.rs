//! Runtime Errors
//!
//! Only the session boundary can fail. User-authored script content never
//! produces an error: bad codes, parameters and targets degrade to no-ops.

use std::path::PathBuf;

use thiserror::Error;

use crate::world::ObjectId;

/// Errors returned by [`crate::game::PlayRuntime::start`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Invalid play settings: {0}")]
    InvalidSettings(String),

    #[error("Script source references object {0:?}, which is not in the scene")]
    MissingObject(ObjectId),
}

/// Errors from loading a project file.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Failed to read project {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed project file: {0}")]
    Json(#[from] serde_json::Error),
}
