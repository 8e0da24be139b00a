use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::destination::DestinationId;

/// One incoming file. Owned by the caller; the pipeline only moves the
/// filesystem object it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTask {
    pub task_id: Uuid,
    /// Declared file name including extension. Used verbatim as the
    /// destination file name and as the literal name the oracle checks.
    pub file_name: String,
    pub source_path: PathBuf,
}

impl FileTask {
    pub fn new(file_name: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            file_name: file_name.into(),
            source_path: source_path.into(),
        }
    }

    /// Lowercased text after the last `.` of the declared name.
    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Normalized text projection of one file, tagged with its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub extension: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "destination_id", rename_all = "snake_case")]
pub enum Verdict {
    Matched(DestinationId),
    Unmatched,
}

/// Validated outcome of one classification round. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationDecision {
    pub verdict: Verdict,
    /// Oracle answer as received, before sanitation.
    pub raw_response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        let task = FileTask::new("Report.PDF", "/tmp/x");
        assert_eq!(task.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn extension_uses_last_dot() {
        let task = FileTask::new("archive.tar.csv", "/tmp/x");
        assert_eq!(task.extension().as_deref(), Some("csv"));
    }

    #[test]
    fn no_extension() {
        assert_eq!(FileTask::new("README", "/tmp/x").extension(), None);
        assert_eq!(FileTask::new("trailing.", "/tmp/x").extension(), None);
    }

    #[test]
    fn dotfile_extension_is_its_name() {
        assert_eq!(
            FileTask::new(".txt", "/tmp/x").extension().as_deref(),
            Some("txt")
        );
    }

    #[test]
    fn new_tasks_get_distinct_ids() {
        let a = FileTask::new("a.txt", "/tmp/a");
        let b = FileTask::new("a.txt", "/tmp/a");
        assert_ne!(a.task_id, b.task_id);
    }
}
