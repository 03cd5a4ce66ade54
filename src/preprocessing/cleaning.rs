//! Очистка таблиц CICIDS: имена колонок, бесконечности, пропуски

use crate::error::{PrepError, Result};
use crate::schema::{normalize_column_name, DIFFICULTY_COLUMN};
use crate::types::{ColumnData, ColumnKind, Table};

/// Итог очистки одной таблицы
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub infinite_replaced: usize,
    pub rows_dropped: usize,
}

pub struct Cleaner;

impl Cleaner {
    /// Полная очистка таблицы с плавающей схемой
    pub fn clean_flow_table(table: &mut Table) -> Result<CleanReport> {
        Self::normalize_column_names(table);
        let infinite_replaced = Self::replace_infinite(table);
        let rows_dropped = Self::drop_missing_rows(table)?;

        Ok(CleanReport {
            infinite_replaced,
            rows_dropped,
        })
    }

    pub fn normalize_column_names(table: &mut Table) {
        for column in table.columns_mut() {
            column.name = normalize_column_name(&column.name);
        }
    }

    /// +inf/-inf заменяются на NaN (маркер пропуска)
    pub fn replace_infinite(table: &mut Table) -> usize {
        let mut replaced = 0;
        for column in table.columns_mut() {
            if let ColumnData::Numeric(values) = &mut column.data {
                for value in values.iter_mut().filter(|v| v.is_infinite()) {
                    *value = f64::NAN;
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Удаляет строки, где пропущено хотя бы одно значение
    pub fn drop_missing_rows(table: &mut Table) -> Result<usize> {
        let keep: Vec<bool> = (0..table.n_rows())
            .map(|row| !table.columns().iter().any(|c| c.data.is_missing(row)))
            .collect();

        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            table.retain_rows(&keep)?;
        }
        Ok(dropped)
    }

    pub fn drop_difficulty(table: &mut Table) -> bool {
        table.drop_column(DIFFICULTY_COLUMN)
    }

    /// Находит колонку метки по одному из написаний, помечает её как Label
    /// и приводит значения к тексту.
    pub fn resolve_label(table: &mut Table, spellings: &[&str]) -> Result<String> {
        let name = spellings
            .iter()
            .find(|s| table.column(s).is_some())
            .map(|s| s.to_string())
            .ok_or_else(|| PrepError::MissingLabelColumn(table.source().to_string()))?;

        if let Some(column) = table.column_mut(&name) {
            column.kind = ColumnKind::Label;
            if !matches!(column.data, ColumnData::Text(_)) {
                column.data = ColumnData::Text(column.data.to_text());
            }
        }

        Ok(name)
    }
}
