//! Типы данных для предобработки

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Семейство датасетов
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFamily {
    /// CICIDS2017: несколько CSV с плавающей схемой
    Cicids,
    /// NSL-KDD: фиксированная схема из 42 колонок
    NslKdd,
}

impl DatasetFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFamily::Cicids => "cicids",
            DatasetFamily::NslKdd => "nsl_kdd",
        }
    }
}

impl fmt::Display for DatasetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Семантический тип колонки
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Label,
}

/// Значения колонки. Пропуск: NaN для чисел, пустая строка для текста.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
    Encoded(Vec<usize>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Encoded(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_nan(),
            ColumnData::Text(v) => v[row].is_empty(),
            ColumnData::Encoded(_) => false,
        }
    }

    /// Текстовое представление ячейки (для CSV и кодирования)
    pub fn cell_text(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(v) => v[row].to_string(),
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::Encoded(v) => v[row].to_string(),
        }
    }

    /// Все значения, приведённые к тексту
    pub fn to_text(&self) -> Vec<String> {
        match self {
            ColumnData::Text(v) => v.clone(),
            other => (0..other.len()).map(|i| other.cell_text(i)).collect(),
        }
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut idx = 0;
            values.retain(|_| {
                let k = keep[idx];
                idx += 1;
                k
            });
        }

        match self {
            ColumnData::Numeric(v) => retain(v, keep),
            ColumnData::Text(v) => retain(v, keep),
            ColumnData::Encoded(v) => retain(v, keep),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
        }
    }
}

/// Таблица одного исходного файла: колонки одинаковой длины
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    source: String,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    pub fn new(source: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let source = source.into();
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.data.len() != n_rows) {
            return Err(PrepError::MalformedSource {
                source_name: source,
                reason: format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.data.len(),
                    n_rows
                ),
            });
        }

        Ok(Self {
            source,
            columns,
            n_rows,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Удаляет колонку, возвращает true если она была
    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name != name);
        self.columns.len() != before
    }

    /// Замена данных колонки с проверкой длины
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> Result<()> {
        let n_rows = self.n_rows;
        let column = self
            .column_mut(name)
            .ok_or_else(|| PrepError::UnknownColumn(name.to_string()))?;

        if data.len() != n_rows {
            return Err(PrepError::ShapeMismatch {
                column: name.to_string(),
                expected: n_rows,
                actual: data.len(),
            });
        }

        column.data = data;
        Ok(())
    }

    /// Оставляет строки, для которых keep[i] == true.
    /// Маска другой длины отклоняется, таблица не меняется.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<()> {
        if keep.len() != self.n_rows {
            return Err(PrepError::ShapeMismatch {
                column: "<row mask>".to_string(),
                expected: self.n_rows,
                actual: keep.len(),
            });
        }

        for column in &mut self.columns {
            column.data.retain_rows(keep);
        }
        self.n_rows = keep.iter().filter(|k| **k).count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            "sample.csv",
            vec![
                Column::new("a", ColumnKind::Numeric, ColumnData::Numeric(vec![1.0, f64::NAN, 3.0])),
                Column::new(
                    "Label",
                    ColumnKind::Label,
                    ColumnData::Text(vec!["BENIGN".into(), "DDoS".into(), "".into()]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let result = Table::new(
            "bad",
            vec![
                Column::new("a", ColumnKind::Numeric, ColumnData::Numeric(vec![1.0])),
                Column::new("b", ColumnKind::Numeric, ColumnData::Numeric(vec![1.0, 2.0])),
            ],
        );
        assert!(matches!(result, Err(PrepError::MalformedSource { .. })));
    }

    #[test]
    fn retain_rows_filters_every_column() {
        let mut table = sample();
        table.retain_rows(&[true, false, true]).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("a").unwrap().data, ColumnData::Numeric(vec![1.0, 3.0]));
        assert_eq!(
            table.column("Label").unwrap().data,
            ColumnData::Text(vec!["BENIGN".into(), "".into()])
        );
    }

    #[test]
    fn row_mask_of_wrong_length_leaves_table_intact() {
        let mut table = sample();
        let before = table.clone();

        for mask in [&[true, false][..], &[true, true, false, true][..]] {
            let err = table.retain_rows(mask).unwrap_err();
            assert!(matches!(
                err,
                PrepError::ShapeMismatch { expected: 3, actual, .. } if actual == mask.len()
            ));
            assert_eq!(table, before);
        }
    }

    #[test]
    fn missing_markers() {
        let table = sample();
        assert!(table.column("a").unwrap().data.is_missing(1));
        assert!(!table.column("a").unwrap().data.is_missing(0));
        assert!(table.column("Label").unwrap().data.is_missing(2));
    }

    #[test]
    fn numeric_cells_render_as_text() {
        let data = ColumnData::Numeric(vec![6.0, 0.5]);
        assert_eq!(data.to_text(), vec!["6".to_string(), "0.5".to_string()]);
    }
}
