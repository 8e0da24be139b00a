pub mod relocate;
pub mod router;

pub use relocate::*;
pub use router::*;

use std::path::PathBuf;

use thiserror::Error;

use crate::models::ErrorKind;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("A file named {0} already exists at the destination")]
    TargetExists(PathBuf),

    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("File name '{0}' cannot be used as a destination name")]
    InvalidFileName(String),

    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Copied file failed verification: {0}")]
    CopyVerification(String),
}

impl RoutingError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::RelocationFailure
    }

    pub(crate) fn io(operation: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { operation, source }
    }
}
