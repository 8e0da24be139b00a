pub mod snapshot;
pub mod prompt;
pub mod oracle;
pub mod openai;
pub mod ollama;
pub mod sanitize;
pub mod parser;
pub mod resolve;

pub use snapshot::*;
pub use prompt::*;
pub use oracle::*;
pub use openai::*;
pub use ollama::*;
pub use sanitize::*;
pub use parser::*;
pub use resolve::*;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::{DestinationId, ErrorKind};

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Destination registry unavailable: {0}")]
    Registry(#[from] DatabaseError),

    #[error("Oracle did not answer within {secs}s")]
    OracleTimeout { secs: u64 },

    #[error("Oracle is not reachable at {0}")]
    OracleConnection(String),

    #[error("Oracle returned error (status {status}): {body}")]
    OracleStatus { status: u16, body: String },

    #[error("Unreadable oracle response envelope: {0}")]
    ResponseEnvelope(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed oracle answer: {0}")]
    MalformedResponse(String),

    #[error("Oracle named destination {0}, which is not in the snapshot")]
    UnknownDestination(DestinationId),
}

impl ClassificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(_) => ErrorKind::RegistryUnavailable,
            Self::OracleTimeout { .. } => ErrorKind::OracleTimeout,
            Self::OracleConnection(_)
            | Self::OracleStatus { .. }
            | Self::ResponseEnvelope(_)
            | Self::HttpClient(_) => ErrorKind::OracleUnavailable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::UnknownDestination(_) => ErrorKind::UnknownDestination,
        }
    }
}
