//! Метаданные прогона: размеры датасетов и распределения меток

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::error::{PrepError, Result};
use crate::types::{ColumnData, DatasetFamily, Table};

/// Статистика одного источника
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub n_samples: usize,
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorical_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_features: Option<Vec<String>>,
    pub label_distribution: BTreeMap<String, usize>,
}

/// Документ метаданных: семейство -> вариант/файл -> статистика
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub cicids: BTreeMap<String, SourceStats>,
    #[serde(default)]
    pub nsl_kdd: BTreeMap<String, SourceStats>,
}

impl MetadataDocument {
    pub fn family(&self, family: DatasetFamily) -> &BTreeMap<String, SourceStats> {
        match family {
            DatasetFamily::Cicids => &self.cicids,
            DatasetFamily::NslKdd => &self.nsl_kdd,
        }
    }

    fn family_mut(&mut self, family: DatasetFamily) -> &mut BTreeMap<String, SourceStats> {
        match family {
            DatasetFamily::Cicids => &mut self.cicids,
            DatasetFamily::NslKdd => &mut self.nsl_kdd,
        }
    }

    pub fn get(&self, family: DatasetFamily, key: &str) -> Option<&SourceStats> {
        self.family(family).get(key)
    }

    /// JSON с отступом в 4 пробела и отсортированными ключами
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(buf).map_err(|e| PrepError::malformed("metadata", e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Снимок меток до кодирования. Создается только из текстовой колонки,
/// поэтому гистограмма всегда содержит исходные категории, а не коды.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSnapshot {
    column: String,
    counts: BTreeMap<String, usize>,
    n_rows: usize,
}

impl LabelSnapshot {
    pub fn capture(table: &Table, label_column: &str) -> Result<Self> {
        let column = table
            .column(label_column)
            .ok_or_else(|| PrepError::MissingLabelColumn(table.source().to_string()))?;

        let values = match &column.data {
            ColumnData::Text(values) => values,
            _ => return Err(PrepError::LabelAlreadyEncoded(label_column.to_string())),
        };

        let mut counts = BTreeMap::new();
        for value in values {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }

        Ok(Self {
            column: label_column.to_string(),
            counts,
            n_rows: table.n_rows(),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }
}

/// Накопитель метаданных прогона
#[derive(Debug, Default)]
pub struct MetadataAggregator {
    document: MetadataDocument,
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Записывает статистику источника. Ключ записывается один раз за прогон;
    /// снимок меток должен относиться к той же таблице (совпадает число строк).
    pub fn record(
        &mut self,
        family: DatasetFamily,
        key: &str,
        table: &Table,
        labels: LabelSnapshot,
        categorical: Option<&[String]>,
        numeric: Option<&[String]>,
    ) -> Result<()> {
        if self.document.family(family).contains_key(key) {
            return Err(PrepError::DuplicateRecord {
                family,
                key: key.to_string(),
            });
        }

        if labels.n_rows != table.n_rows() {
            return Err(PrepError::ShapeMismatch {
                column: labels.column,
                expected: table.n_rows(),
                actual: labels.n_rows,
            });
        }

        let stats = SourceStats {
            n_samples: table.n_rows(),
            n_features: table.n_columns().saturating_sub(1),
            categorical_features: categorical.map(|c| c.to_vec()),
            numeric_features: numeric.map(|c| c.to_vec()),
            label_distribution: labels.counts,
        };

        tracing::debug!(
            "Recorded {}/{}: {} samples, {} features",
            family,
            key,
            stats.n_samples,
            stats.n_features
        );
        self.document.family_mut(family).insert(key.to_string(), stats);
        Ok(())
    }

    pub fn document(&self) -> &MetadataDocument {
        &self.document
    }

    pub fn into_document(self) -> MetadataDocument {
        self.document
    }
}
