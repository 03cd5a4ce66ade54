//! Нормализация данных

#![allow(non_snake_case)]

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2, Axis};

use crate::error::{PrepError, Result};
use crate::schema::{CICIDS_LABEL_SPELLINGS, NSL_KDD_LABEL};
use crate::types::{ColumnData, ColumnKind, DatasetFamily, Table};

/// Порог нулевой дисперсии
const DEGENERATE_STD: f64 = 1e-10;

pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
    degenerate: Vec<bool>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            degenerate: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, X: &Array2<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(PrepError::EmptyTable("no rows to fit scaler on".to_string()));
        }

        // Среднее и стандартное отклонение (ddof = 0) по каждому признаку
        let mean = X
            .mean_axis(Axis(0))
            .ok_or_else(|| PrepError::EmptyTable("failed to compute mean".to_string()))?;
        let mut std = X.std_axis(Axis(0), 0.0);

        // Колонки без дисперсии после преобразования заполняются нулями
        self.degenerate = std.iter().map(|s| *s < DEGENERATE_STD).collect();
        for (val, degenerate) in std.iter_mut().zip(&self.degenerate) {
            if *degenerate {
                *val = 1.0;
            }
        }

        self.mean = Some(mean);
        self.std = Some(std);
        self.is_fitted = true;
        Ok(())
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }

        let mean = self.mean.as_ref().ok_or(PrepError::NotFitted)?;
        let std = self.std.as_ref().ok_or(PrepError::NotFitted)?;

        if X.ncols() != mean.len() {
            return Err(PrepError::ShapeMismatch {
                column: "<scaler input>".to_string(),
                expected: mean.len(),
                actual: X.ncols(),
            });
        }

        // Нормализация: (X - mean) / std
        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = if self.degenerate[i] {
                    0.0
                } else {
                    (*val - mean[i]) / std[i]
                };
            }
        }

        Ok(normalized)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }

    /// Обратное преобразование одного значения признака
    pub fn inverse(&self, feature: usize, value: f64) -> Result<f64> {
        let mean = self.mean.as_ref().ok_or(PrepError::NotFitted)?;
        let std = self.std.as_ref().ok_or(PrepError::NotFitted)?;
        if feature >= mean.len() {
            return Err(PrepError::UnknownColumn(format!("feature #{}", feature)));
        }
        Ok(value * std[feature] + mean[feature])
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }

    pub fn std(&self) -> Option<&Array1<f64>> {
        self.std.as_ref()
    }

    pub fn degenerate(&self) -> &[bool] {
        &self.degenerate
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

/// Ключ скейлера: семейство и вариант (или имя файла)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScalerKey {
    pub family: DatasetFamily,
    pub variant: String,
}

impl ScalerKey {
    pub fn new(family: DatasetFamily, variant: impl Into<String>) -> Self {
        Self {
            family,
            variant: variant.into(),
        }
    }
}

impl fmt::Display for ScalerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.family, self.variant)
    }
}

/// Обученный скейлер вместе со списком колонок, на которых он обучен
pub struct FittedScaler {
    pub columns: Vec<String>,
    pub scaler: StandardScaler,
}

/// Реестр скейлеров одного прогона: один на (семейство, вариант)
#[derive(Default)]
pub struct ScalerRegistry {
    scalers: BTreeMap<ScalerKey, FittedScaler>,
}

impl ScalerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Обучает скейлер на указанных колонках и заменяет их стандартизованными значениями
    pub fn fit_and_apply(
        &mut self,
        key: ScalerKey,
        table: &mut Table,
        numeric_columns: &[String],
    ) -> Result<()> {
        if self.scalers.contains_key(&key) {
            return Err(PrepError::ScalerAlreadyFitted(key.to_string()));
        }

        let X = numeric_matrix(table, numeric_columns)?;
        let mut scaler = StandardScaler::new();

        if !numeric_columns.is_empty() {
            let scaled = scaler.fit_transform(&X)?;
            for (j, name) in numeric_columns.iter().enumerate() {
                table.replace_data(name, ColumnData::Numeric(scaled.column(j).to_vec()))?;
            }

            let degenerate = scaler.degenerate().iter().filter(|d| **d).count();
            if degenerate > 0 {
                tracing::debug!("{}: {} zero-variance columns filled with 0", key, degenerate);
            }
        }

        self.scalers.insert(
            key,
            FittedScaler {
                columns: numeric_columns.to_vec(),
                scaler,
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &ScalerKey) -> Option<&FittedScaler> {
        self.scalers.get(key)
    }

    pub fn len(&self) -> usize {
        self.scalers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scalers.is_empty()
    }
}

fn is_label_name(name: &str) -> bool {
    name == NSL_KDD_LABEL || CICIDS_LABEL_SPELLINGS.contains(&name)
}

/// Матрица n_rows x k из числовых колонок; метка в списке недопустима
fn numeric_matrix(table: &Table, columns: &[String]) -> Result<Array2<f64>> {
    let mut X = Array2::zeros((table.n_rows(), columns.len()));

    for (j, name) in columns.iter().enumerate() {
        let column = table
            .column(name)
            .ok_or_else(|| PrepError::UnknownColumn(name.clone()))?;

        if column.kind == ColumnKind::Label || is_label_name(name) {
            return Err(PrepError::LabelInScaler(name.clone()));
        }

        match &column.data {
            ColumnData::Numeric(values) => {
                for (i, v) in values.iter().enumerate() {
                    X[[i, j]] = *v;
                }
            }
            ColumnData::Encoded(codes) => {
                for (i, c) in codes.iter().enumerate() {
                    X[[i, j]] = *c as f64;
                }
            }
            ColumnData::Text(_) => return Err(PrepError::NonNumericColumn(name.clone())),
        }
    }

    Ok(X)
}
