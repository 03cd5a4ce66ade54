//! Сохранение обработанных таблиц и метаданных

use std::fs;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::error::{PrepError, Result};
use crate::metadata::MetadataDocument;
use crate::types::{DatasetFamily, Table};

/// Префикс имени обработанного файла
pub const PROCESSED_PREFIX: &str = "processed_";

pub const METADATA_FILE: &str = "metadata.json";

/// Каталог вывода: <root>/<family>/processed_<name>, <root>/metadata.json
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Создает корневой каталог; ошибка здесь прерывает прогон
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| write_failure(&self.root, e))
    }

    pub fn table_path(&self, family: DatasetFamily, name: &str) -> PathBuf {
        self.root
            .join(family.as_str())
            .join(format!("{}{}", PROCESSED_PREFIX, name))
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn save_table(&self, table: &Table, family: DatasetFamily, name: &str) -> Result<PathBuf> {
        let path = self.table_path(family, name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_failure(parent, e))?;
        }

        write_csv(table, &path).map_err(|e| write_failure(&path, e))?;
        tracing::info!("Saved processed data to {}", path.display());
        Ok(path)
    }

    /// Атомарная запись: временный файл и rename
    pub fn save_metadata(&self, document: &MetadataDocument) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| write_failure(&self.root, e))?;

        let path = self.metadata_path();
        let tmp = self.root.join(format!("{}.tmp", METADATA_FILE));
        let json = document.to_pretty_json()?;

        fs::write(&tmp, json).map_err(|e| write_failure(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| write_failure(&path, e))?;

        tracing::info!("Saved metadata to {}", path.display());
        Ok(path)
    }
}

fn write_failure(path: &Path, cause: impl ToString) -> PrepError {
    PrepError::OutputWriteFailure {
        path: path.to_path_buf(),
        cause: cause.to_string(),
    }
}

fn write_csv(table: &Table, path: &Path) -> std::result::Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(table.columns().iter().map(|c| c.name.as_str()))?;

    for row in 0..table.n_rows() {
        writer.write_record(table.columns().iter().map(|c| c.data.cell_text(row)))?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnData, ColumnKind};
    use tempfile::TempDir;

    fn small_table() -> Table {
        Table::new(
            "KDDTest-21.txt",
            vec![
                Column::new("duration", ColumnKind::Numeric, ColumnData::Numeric(vec![-1.0, 0.5])),
                Column::new("flag", ColumnKind::Categorical, ColumnData::Encoded(vec![1, 0])),
                Column::new(
                    "label",
                    ColumnKind::Label,
                    ColumnData::Text(vec!["normal".into(), "neptune".into()]),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn writes_prefixed_table_under_family_dir() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::new(dir.path().join("processed_data"));

        let path = store
            .save_table(&small_table(), DatasetFamily::NslKdd, "test_21.csv")
            .unwrap();

        assert_eq!(path, dir.path().join("processed_data/nsl_kdd/processed_test_21.csv"));
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "duration,flag,label\n-1,1,normal\n0.5,0,neptune\n");
    }

    #[test]
    fn metadata_is_written_without_leftover_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::new(dir.path());

        let path = store.save_metadata(&MetadataDocument::default()).unwrap();

        assert!(path.ends_with("metadata.json"));
        assert!(!dir.path().join("metadata.json.tmp").exists());
        assert_eq!(MetadataDocument::load(&path).unwrap(), MetadataDocument::default());
    }

    #[test]
    fn unwritable_location_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let store = OutputStore::new(&blocker);

        let err = store
            .save_table(&small_table(), DatasetFamily::Cicids, "monday.csv")
            .unwrap_err();
        assert!(matches!(err, PrepError::OutputWriteFailure { .. }));
    }
}
