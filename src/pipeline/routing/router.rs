use std::path::{Path, PathBuf};

use super::relocate::relocate;
use super::RoutingError;
use crate::models::{DestinationId, FileTask, RouteOutcome, Verdict};
use crate::pipeline::classification::RequirementSnapshot;

/// Where a resolved decision sends the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Destination { id: DestinationId, dir: PathBuf },
    Fallback,
}

impl RouteTarget {
    /// `None` when a matched identifier is absent from the snapshot.
    pub fn for_verdict(verdict: &Verdict, snapshot: &RequirementSnapshot) -> Option<Self> {
        match verdict {
            Verdict::Unmatched => Some(Self::Fallback),
            Verdict::Matched(id) => snapshot.find(*id).map(|d| Self::Destination {
                id: d.id,
                dir: d.folder_path.clone(),
            }),
        }
    }
}

/// Moves classified files into their destination, or the fallback
/// directory when nothing matched.
#[derive(Debug, Clone)]
pub struct Router {
    fallback_dir: PathBuf,
}

impl Router {
    pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            fallback_dir: fallback_dir.into(),
        }
    }

    pub fn fallback_dir(&self) -> &Path {
        &self.fallback_dir
    }

    /// Relocate the task's file. The file keeps its declared name.
    pub fn route(&self, task: &FileTask, target: &RouteTarget) -> Result<RouteOutcome, RoutingError> {
        let dir = match target {
            RouteTarget::Destination { dir, .. } => dir.as_path(),
            RouteTarget::Fallback => self.fallback_dir.as_path(),
        };

        let moved = relocate(&task.source_path, dir, &task.file_name)?;

        tracing::info!(
            task_id = %task.task_id,
            from = %task.source_path.display(),
            to = %moved.path.display(),
            strategy = moved.strategy.as_str(),
            "File relocated"
        );

        Ok(match target {
            RouteTarget::Destination { id, .. } => RouteOutcome::Routed {
                destination_id: *id,
                path: moved.path,
            },
            RouteTarget::Fallback => RouteOutcome::RoutedFallback { path: moved.path },
        })
    }
}
