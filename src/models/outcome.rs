use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::destination::DestinationId;

/// Machine-distinguishable failure reason reported for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionFailure,
    RegistryUnavailable,
    OracleTimeout,
    OracleUnavailable,
    MalformedResponse,
    UnknownDestination,
    Cancelled,
    RelocationFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::ExtractionFailure => "extraction_failure",
            Self::RegistryUnavailable => "registry_unavailable",
            Self::OracleTimeout => "oracle_timeout",
            Self::OracleUnavailable => "oracle_unavailable",
            Self::MalformedResponse => "malformed_response",
            Self::UnknownDestination => "unknown_destination",
            Self::Cancelled => "cancelled",
            Self::RelocationFailure => "relocation_failure",
        }
    }

    /// Faults raised by the classifier itself, as opposed to the
    /// surrounding infrastructure (registry, filesystem).
    pub fn is_classification_fault(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat
                | Self::ExtractionFailure
                | Self::OracleTimeout
                | Self::OracleUnavailable
                | Self::MalformedResponse
                | Self::UnknownDestination
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of `classify_and_route`. Every failure is converted into
/// `Failed`; nothing crosses the boundary as a panic or raw error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum RouteOutcome {
    Routed {
        destination_id: DestinationId,
        path: PathBuf,
    },
    RoutedFallback {
        path: PathBuf,
    },
    Failed {
        reason: ErrorKind,
        detail: String,
    },
}

impl RouteOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Routed { .. } => "routed",
            Self::RoutedFallback { .. } => "routed-fallback",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn failure_reason(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
