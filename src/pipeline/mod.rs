pub mod extraction;
pub mod classification; // Snapshot, prompt, oracle, parse, resolve
pub mod routing;
pub mod processor;
pub mod diagnostic; // Per-task dump, enabled by MUNCH_DUMP_DIR

pub use processor::{ClassificationPipeline, ClassifiedTask, ProcessingError};
