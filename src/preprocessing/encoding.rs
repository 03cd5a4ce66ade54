//! Кодирование категорий в целые коды

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};
use crate::types::{ColumnData, DatasetFamily, Table};

/// Ключ энкодера: семейство, вариант (или имя файла) и колонка
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncoderKey {
    pub family: DatasetFamily,
    pub variant: String,
    pub column: String,
}

impl EncoderKey {
    pub fn new(family: DatasetFamily, variant: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            family,
            variant: variant.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for EncoderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.family, self.variant, self.column)
    }
}

/// Label encoder: отсортированные уникальные значения получают коды 0..k-1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit(values: &[String]) -> Self {
        let mut classes = values.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn transform(&self, values: &[String]) -> Result<Vec<usize>> {
        values
            .iter()
            .map(|v| {
                self.classes
                    .binary_search(v)
                    .map_err(|_| PrepError::UnknownCategory {
                        key: self.describe(),
                        value: v.clone(),
                    })
            })
            .collect()
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&code| {
                self.classes
                    .get(code)
                    .cloned()
                    .ok_or_else(|| PrepError::UnknownCode {
                        key: self.describe(),
                        code,
                    })
            })
            .collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    fn describe(&self) -> String {
        format!("encoder with {} classes", self.classes.len())
    }
}

/// Реестр энкодеров одного прогона. Каждый ключ обучается ровно один раз.
#[derive(Debug, Default)]
pub struct EncoderRegistry {
    encoders: BTreeMap<EncoderKey, LabelEncoder>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit_and_apply(&mut self, key: EncoderKey, values: &[String]) -> Result<Vec<usize>> {
        if self.encoders.contains_key(&key) {
            return Err(PrepError::EncoderAlreadyFitted(key.to_string()));
        }

        let encoder = LabelEncoder::fit(values);
        let codes = encoder.transform(values)?;
        tracing::debug!("Fitted encoder {} with {} classes", key, encoder.n_classes());
        self.encoders.insert(key, encoder);

        Ok(codes)
    }

    /// Кодирует колонку таблицы на месте; значения предварительно приводятся к тексту
    pub fn encode_column(&mut self, key: EncoderKey, table: &mut Table, column: &str) -> Result<()> {
        let values = match table.column(column) {
            Some(c) => match &c.data {
                ColumnData::Encoded(_) => return Err(PrepError::LabelAlreadyEncoded(column.to_string())),
                data => data.to_text(),
            },
            None => return Err(PrepError::UnknownColumn(column.to_string())),
        };

        let codes = self.fit_and_apply(key, &values)?;
        table.replace_data(column, ColumnData::Encoded(codes))
    }

    pub fn get(&self, key: &EncoderKey) -> Option<&LabelEncoder> {
        self.encoders.get(key)
    }

    pub fn decode(&self, key: &EncoderKey, codes: &[usize]) -> Result<Vec<String>> {
        self.encoders
            .get(key)
            .ok_or_else(|| PrepError::UnknownColumn(key.to_string()))?
            .inverse_transform(codes)
    }

    pub fn keys(&self) -> impl Iterator<Item = &EncoderKey> {
        self.encoders.keys()
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnKind};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lexicographic_codes() {
        let mut registry = EncoderRegistry::new();
        let key = EncoderKey::new(DatasetFamily::NslKdd, "train_full", "protocol_type");

        let codes = registry
            .fit_and_apply(key.clone(), &strings(&["tcp", "udp", "tcp"]))
            .unwrap();

        assert_eq!(codes, vec![0, 1, 0]);
        assert_eq!(registry.get(&key).unwrap().classes(), &["tcp", "udp"]);
    }

    #[test]
    fn round_trip_and_dense_codes() {
        let values = strings(&["SF", "REJ", "S0", "SF", "RSTO", "REJ"]);
        let encoder = LabelEncoder::fit(&values);
        let codes = encoder.transform(&values).unwrap();

        let mut distinct = codes.clone();
        distinct.sort();
        distinct.dedup();
        assert_eq!(distinct, (0..encoder.n_classes()).collect::<Vec<_>>());
        assert_eq!(encoder.inverse_transform(&codes).unwrap(), values);
    }

    #[test]
    fn refit_is_rejected() {
        let mut registry = EncoderRegistry::new();
        let key = EncoderKey::new(DatasetFamily::Cicids, "monday.csv", "Label");

        registry.fit_and_apply(key.clone(), &strings(&["BENIGN"])).unwrap();
        let err = registry.fit_and_apply(key, &strings(&["DDoS"])).unwrap_err();

        assert!(matches!(err, PrepError::EncoderAlreadyFitted(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn numeric_looking_values_are_encoded_as_text() {
        let mut table = Table::new(
            "x",
            vec![Column::new("flag", ColumnKind::Categorical, ColumnData::Numeric(vec![10.0, 2.0]))],
        )
        .unwrap();
        let mut registry = EncoderRegistry::new();
        let key = EncoderKey::new(DatasetFamily::NslKdd, "test_21", "flag");

        registry.encode_column(key.clone(), &mut table, "flag").unwrap();

        // "10" < "2" в лексикографическом порядке
        assert_eq!(table.column("flag").unwrap().data, ColumnData::Encoded(vec![0, 1]));
        assert_eq!(registry.decode(&key, &[1, 0]).unwrap(), strings(&["2", "10"]));
    }

    #[test]
    fn unknown_code_is_an_error() {
        let encoder = LabelEncoder::fit(&strings(&["a"]));
        assert!(encoder.inverse_transform(&[3]).is_err());
        assert!(encoder.transform(&strings(&["b"])).is_err());
    }
}
