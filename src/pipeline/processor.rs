//! Classification pipeline orchestrator.
//!
//! Drives one FileTask through extract → snapshot → prompt → oracle →
//! parse → resolve → relocate. Engines are injected behind traits so the
//! pipeline is testable with a stub oracle and an in-memory registry.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::models::{ClassificationDecision, ErrorKind, FileTask, RouteOutcome, Verdict};
use crate::pipeline::classification::{
    build_classification_prompt, build_oracle, parse_oracle_response, resolve_decision, ClassificationError,
    ClassificationOracle, DestinationRegistry, CLASSIFICATION_SYSTEM_PROMPT,
};
use crate::pipeline::diagnostic::{DiagnosticDump, TaskDump};
use crate::pipeline::extraction::docx::DocumentConverter;
use crate::pipeline::extraction::{log_extraction_failure, ContentExtractor, ExtractionError};
use crate::pipeline::routing::{RouteTarget, Router, RoutingError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Any fault that stops a task short of relocation.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Relocation failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("Task cancelled before relocation")]
    Cancelled,
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction(e) => e.kind(),
            Self::Classification(e) => e.kind(),
            Self::Routing(e) => e.kind(),
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A validated decision and where it sends the file, before any move.
#[derive(Debug, Clone)]
pub struct ClassifiedTask {
    pub decision: ClassificationDecision,
    pub target: RouteTarget,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct ClassificationPipeline {
    extractor: ContentExtractor,
    registry: Arc<dyn DestinationRegistry>,
    oracle: Box<dyn ClassificationOracle>,
    router: Router,
    dump: Option<DiagnosticDump>,
}

impl ClassificationPipeline {
    pub fn new(
        extractor: ContentExtractor,
        registry: Arc<dyn DestinationRegistry>,
        oracle: Box<dyn ClassificationOracle>,
        router: Router,
    ) -> Self {
        Self {
            extractor,
            registry,
            oracle,
            router,
            dump: None,
        }
    }

    /// Assemble the production pipeline from startup configuration.
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<dyn DestinationRegistry>,
    ) -> Result<Self, ClassificationError> {
        let converter = config
            .docx_converter
            .as_deref()
            .and_then(DocumentConverter::parse)
            .map(|c| c.with_timeout(Duration::from_secs(config.docx_converter_timeout_secs)));
        if let Some(c) = &converter {
            tracing::info!(
                program = c.program(),
                timeout_secs = c.timeout().as_secs(),
                "Word documents paginated via converter"
            );
        }

        let pipeline = Self::new(
            ContentExtractor::new().with_converter(converter),
            registry,
            build_oracle(&config.oracle)?,
            Router::new(&config.fallback_dir),
        );
        Ok(pipeline.with_dump(config.dump_dir.clone().map(DiagnosticDump::new)))
    }

    pub fn with_dump(mut self, dump: Option<DiagnosticDump>) -> Self {
        self.dump = dump;
        self
    }

    pub fn oracle_model(&self) -> &str {
        self.oracle.model()
    }

    pub fn fallback_dir(&self) -> &Path {
        self.router.fallback_dir()
    }

    /// Decide where a file belongs without touching it.
    pub fn classify(&self, task: &FileTask) -> Result<ClassifiedTask, ProcessingError> {
        let dump = self.dump.as_ref().and_then(|d| d.for_task(&task.task_id));
        self.classify_inner(task, dump.as_ref())
    }

    /// Classify the file and move it. Never fails: every fault becomes
    /// `RouteOutcome::Failed` with the source left where it was.
    pub fn classify_and_route(&self, task: &FileTask) -> RouteOutcome {
        self.classify_and_route_with_cancel(task, &AtomicBool::new(false))
    }

    /// As `classify_and_route`, but aborts before relocation once
    /// `cancel` is set. A cancelled task has no filesystem effect.
    pub fn classify_and_route_with_cancel(&self, task: &FileTask, cancel: &AtomicBool) -> RouteOutcome {
        let dump = self.dump.as_ref().and_then(|d| d.for_task(&task.task_id));

        let result = self
            .classify_inner(task, dump.as_ref())
            .and_then(|classified| {
                if cancel.load(Ordering::SeqCst) {
                    return Err(ProcessingError::Cancelled);
                }
                Ok(self.router.route(task, &classified.target)?)
            });

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let kind = e.kind();
                if kind == ErrorKind::RelocationFailure {
                    tracing::error!(task_id = %task.task_id, kind = %kind, error = %e, "Task failed");
                } else {
                    tracing::warn!(task_id = %task.task_id, kind = %kind, error = %e, "Task failed");
                }
                RouteOutcome::Failed {
                    reason: kind,
                    detail: e.to_string(),
                }
            }
        };

        if let Some(dump) = &dump {
            dump.json("05-outcome.json", &outcome);
        }
        outcome
    }

    fn classify_inner(
        &self,
        task: &FileTask,
        dump: Option<&TaskDump>,
    ) -> Result<ClassifiedTask, ProcessingError> {
        if let Some(dump) = dump {
            dump.json("00-task.json", task);
        }

        let content = self.extractor.extract(task).map_err(|e| {
            log_extraction_failure(task.task_id, &e);
            e
        })?;
        if let Some(dump) = dump {
            dump.text("01-extracted.txt", &content.text);
        }

        let snapshot = self.registry.snapshot()?;
        tracing::info!(
            task_id = %task.task_id,
            destinations = snapshot.len(),
            offered = snapshot.offered_count(),
            "Registry snapshot taken"
        );

        let decision = if snapshot.offered_count() == 0 {
            tracing::info!(
                task_id = %task.task_id,
                "No destination carries requirements; skipping oracle"
            );
            ClassificationDecision {
                verdict: Verdict::Unmatched,
                raw_response: String::new(),
            }
        } else {
            let prompt = build_classification_prompt(&content, &task.file_name, &snapshot);
            tracing::debug!(task_id = %task.task_id, prompt_chars = prompt.len(), "Prompt built");
            if let Some(dump) = dump {
                dump.text("02-prompt.txt", &prompt);
            }

            let started = Instant::now();
            let raw = self.oracle.complete(CLASSIFICATION_SYSTEM_PROMPT, &prompt)?;
            tracing::info!(
                task_id = %task.task_id,
                model = self.oracle.model(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Oracle answered"
            );
            if let Some(dump) = dump {
                dump.text("03-oracle-response.txt", &raw);
            }

            let parsed = parse_oracle_response(&raw)?;
            resolve_decision(parsed, &snapshot, raw)?
        };

        if let Some(dump) = dump {
            dump.json("04-decision.json", &decision);
        }

        let target = RouteTarget::for_verdict(&decision.verdict, &snapshot).ok_or_else(|| {
            match decision.verdict {
                Verdict::Matched(id) => ClassificationError::UnknownDestination(id),
                Verdict::Unmatched => ClassificationError::MalformedResponse(
                    "unmatched verdict without fallback".into(),
                ),
            }
        })?;

        tracing::info!(task_id = %task.task_id, verdict = ?decision.verdict, "Decision resolved");

        Ok(ClassifiedTask { decision, target })
    }
}
