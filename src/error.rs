//! Ошибки предобработки

use std::path::PathBuf;

use thiserror::Error;

use crate::types::DatasetFamily;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("source not found: {0}")]
    MissingSource(String),

    #[error("no label column found in {0}")]
    MissingLabelColumn(String),

    #[error("malformed source {source_name}: {reason}")]
    MalformedSource { source_name: String, reason: String },

    #[error("failed to write {}: {cause}", .path.display())]
    OutputWriteFailure { path: PathBuf, cause: String },

    #[error("encoder already fitted for {0}")]
    EncoderAlreadyFitted(String),

    #[error("scaler already fitted for {0}")]
    ScalerAlreadyFitted(String),

    #[error("label column '{0}' cannot be scaled")]
    LabelInScaler(String),

    #[error("label column '{0}' is already encoded")]
    LabelAlreadyEncoded(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("column '{0}' is not numeric")]
    NonNumericColumn(String),

    #[error("unknown category '{value}' for {key}")]
    UnknownCategory { key: String, value: String },

    #[error("code {code} is out of range for {key}")]
    UnknownCode { key: String, code: usize },

    #[error("column '{column}' has {actual} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("{family}/{key} is already recorded")]
    DuplicateRecord { family: DatasetFamily, key: String },

    #[error("empty dataset: {0}")]
    EmptyTable(String),

    #[error("scaler not fitted")]
    NotFitted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PrepError {
    pub fn malformed(source_name: impl Into<String>, reason: impl ToString) -> Self {
        PrepError::MalformedSource {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Ошибки, при которых источник пропускается без провала прогона
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            PrepError::MissingSource(_) | PrepError::MissingLabelColumn(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
