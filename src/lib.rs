//! Netflow Prep - предобработка датасетов сетевого трафика (CICIDS2017, NSL-KDD)

pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod preprocessing;
pub mod schema;
pub mod storage;
pub mod types;

pub use error::{PrepError, Result};
pub use types::*;
pub use preprocessing::*;

// Re-export для удобства
pub use config::PipelineConfig;
pub use metadata::{LabelSnapshot, MetadataAggregator, MetadataDocument, SourceStats};
pub use pipeline::{run, PreprocessingRun, RunReport, SourceOutcome, SourceStatus};
pub use schema::{DatasetDescriptor, SourceSpec};
pub use storage::OutputStore;
