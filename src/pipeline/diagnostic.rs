//! Per-task diagnostic dump.
//!
//! Off unless `MUNCH_DUMP_DIR` is set. Each task gets its own directory
//! holding one numbered file per stage:
//!
//! ```text
//! {dump_dir}/{task_id}/
//!   00-task.json
//!   01-extracted.txt
//!   02-prompt.txt
//!   03-oracle-response.txt
//!   04-decision.json
//!   05-outcome.json
//! ```
//!
//! Write failures are logged at warn and never reach the task.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DiagnosticDump {
    base: PathBuf,
}

impl DiagnosticDump {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Open the dump directory for one task. `None` if it cannot be created.
    pub fn for_task(&self, task_id: &Uuid) -> Option<TaskDump> {
        let dir = self.base.join(task_id.to_string());
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(TaskDump { dir }),
            Err(e) => {
                tracing::warn!(
                    task_id = %task_id,
                    path = %dir.display(),
                    error = %e,
                    "Diagnostic dump disabled for task"
                );
                None
            }
        }
    }
}

/// Writer bound to one task's dump directory.
#[derive(Debug)]
pub struct TaskDump {
    dir: PathBuf,
}

impl TaskDump {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Pretty-printed JSON artifact.
    pub fn json<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        match serde_json::to_vec_pretty(value) {
            Ok(bytes) => self.write(name, &bytes),
            Err(e) => tracing::warn!(file = name, error = %e, "Diagnostic dump: cannot serialize"),
        }
    }

    /// Text artifact: extracted content, prompt, raw oracle answer.
    pub fn text(&self, name: &str, text: &str) {
        self.write(name, text.as_bytes());
    }

    fn write(&self, name: &str, bytes: &[u8]) {
        let path = self.dir.join(name);
        match std::fs::write(&path, bytes) {
            Ok(()) => tracing::debug!(path = %path.display(), size = bytes.len(), "Diagnostic dump written"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Diagnostic dump: write failed"),
        }
    }
}
