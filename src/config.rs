//! Пути прогона

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::DatasetFamily;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_raw_root")]
    pub raw_root: PathBuf,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_cicids_dir")]
    pub cicids_dir: String,
    #[serde(default = "default_nsl_kdd_dir")]
    pub nsl_kdd_dir: String,
}

fn default_raw_root() -> PathBuf { PathBuf::from("../../data/raw_data") }
fn default_output_root() -> PathBuf { PathBuf::from("../../data/processed_data") }
fn default_cicids_dir() -> String { "CICIDS2017_improved".to_string() }
fn default_nsl_kdd_dir() -> String { "NSL-KDD-Dataset-master".to_string() }

impl PipelineConfig {
    /// JSON файл; отсутствующие поля берутся по умолчанию
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn cicids_root(&self) -> PathBuf {
        self.raw_root.join(&self.cicids_dir)
    }

    pub fn nsl_kdd_root(&self) -> PathBuf {
        self.raw_root.join(&self.nsl_kdd_dir)
    }

    pub fn family_root(&self, family: DatasetFamily) -> PathBuf {
        match family {
            DatasetFamily::Cicids => self.cicids_root(),
            DatasetFamily::NslKdd => self.nsl_kdd_root(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_root: default_raw_root(),
            output_root: default_output_root(),
            cicids_dir: default_cicids_dir(),
            nsl_kdd_dir: default_nsl_kdd_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"raw_root": "/data/raw"}"#).unwrap();

        assert_eq!(config.cicids_root(), PathBuf::from("/data/raw/CICIDS2017_improved"));
        assert_eq!(config.nsl_kdd_root(), PathBuf::from("/data/raw/NSL-KDD-Dataset-master"));
        assert_eq!(config.output_root, default_output_root());
        assert_eq!(config.family_root(DatasetFamily::NslKdd), config.nsl_kdd_root());
    }
}
