//! Прогон предобработки: загрузка, очистка, кодирование, масштабирование, сохранение

use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PrepError, Result};
use crate::metadata::{LabelSnapshot, MetadataAggregator, MetadataDocument};
use crate::preprocessing::{Cleaner, EncoderKey, EncoderRegistry, ScalerKey, ScalerRegistry};
use crate::schema::{DatasetDescriptor, FixedSchema, NslKddVariant, SourceSpec};
use crate::storage::{load_fixed_schema, load_flow_csv, resolve_case_insensitive, OutputStore, SourceFormat};
use crate::types::{ColumnKind, DatasetFamily, Table};

/// Обработанный источник, готовый к сохранению
#[derive(Debug)]
pub struct ProcessedSource {
    pub family: DatasetFamily,
    pub key: String,
    pub output_name: String,
    pub format: SourceFormat,
    pub table: Table,
}

/// Результат обработки одного источника
#[derive(Debug)]
pub enum SourceOutcome {
    Processed(ProcessedSource),
    Skipped { name: String, reason: PrepError },
    Failed { name: String, cause: PrepError },
}

impl SourceOutcome {
    fn from_result(name: &str, result: Result<ProcessedSource>) -> Self {
        match result {
            Ok(source) => SourceOutcome::Processed(source),
            Err(reason) if reason.is_skip() => SourceOutcome::Skipped {
                name: name.to_string(),
                reason,
            },
            Err(cause) => SourceOutcome::Failed {
                name: name.to_string(),
                cause,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Processed { rows: usize, output: PathBuf },
    Skipped(String),
    Failed(String),
    WriteFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub family: DatasetFamily,
    pub name: String,
    pub status: SourceStatus,
}

/// Итог прогона
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub metadata_path: Option<PathBuf>,
    pub write_failures: usize,
}

impl RunReport {
    pub fn processed(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SourceStatus::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&SourceStatus) -> bool) -> usize {
        self.sources.iter().filter(|s| pred(&s.status)).count()
    }

    pub fn has_errors(&self) -> bool {
        self.failed() > 0 || self.write_failures > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }
}

/// Состояние одного прогона: реестры энкодеров/скейлеров и метаданные
pub struct PreprocessingRun {
    store: OutputStore,
    encoders: EncoderRegistry,
    scalers: ScalerRegistry,
    metadata: MetadataAggregator,
    report: RunReport,
}

impl PreprocessingRun {
    pub fn new(store: OutputStore) -> Self {
        Self {
            store,
            encoders: EncoderRegistry::new(),
            scalers: ScalerRegistry::new(),
            metadata: MetadataAggregator::new(),
            report: RunReport::default(),
        }
    }

    /// Все источники семейства из каталога; каждый сохраняется сразу после обработки
    pub fn process_family(&mut self, descriptor: &DatasetDescriptor, dir: &Path) {
        for source in &descriptor.sources {
            let outcome = self.source_outcome(descriptor, dir, source);
            self.persist(descriptor.family, &source.key, outcome);
        }
    }

    pub fn source_outcome(
        &mut self,
        descriptor: &DatasetDescriptor,
        dir: &Path,
        source: &SourceSpec,
    ) -> SourceOutcome {
        let result = match &descriptor.schema {
            Some(schema) => self.prepare_fixed(descriptor, dir, source, schema),
            None => self.prepare_flow(descriptor, dir, source),
        };
        SourceOutcome::from_result(&source.key, result)
    }

    pub fn cicids_source(&mut self, dir: &Path, file_name: &str) -> SourceOutcome {
        let descriptor = DatasetDescriptor::cicids();
        let source = descriptor
            .source(file_name)
            .cloned()
            .unwrap_or_else(|| SourceSpec::flow_csv(file_name));
        self.source_outcome(&descriptor, dir, &source)
    }

    pub fn nsl_kdd_source(&mut self, dir: &Path, variant: NslKddVariant) -> SourceOutcome {
        self.source_outcome(&DatasetDescriptor::nsl_kdd(), dir, &SourceSpec::from(variant))
    }

    /// CSV с плавающей схемой: типы колонок выводятся из данных
    fn prepare_flow(
        &mut self,
        descriptor: &DatasetDescriptor,
        dir: &Path,
        source: &SourceSpec,
    ) -> Result<ProcessedSource> {
        let family = descriptor.family;
        let file_name = source.file_name.as_str();
        let path = resolve_case_insensitive(dir, file_name)?
            .ok_or_else(|| PrepError::MissingSource(file_name.to_string()))?;

        tracing::info!("Processing {}", file_name);
        let mut table = load_flow_csv(&path, file_name, descriptor.label_spellings)?;

        let cleaned = Cleaner::clean_flow_table(&mut table)?;
        tracing::debug!(
            "{}: {} infinite values replaced, {} rows dropped",
            file_name,
            cleaned.infinite_replaced,
            cleaned.rows_dropped
        );

        let label = Cleaner::resolve_label(&mut table, descriptor.label_spellings)?;

        // гистограмма меток снимается до кодирования
        let labels = LabelSnapshot::capture(&table, &label)?;
        self.encoders
            .encode_column(EncoderKey::new(family, &source.key, &label), &mut table, &label)?;

        let numeric: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.clone())
            .collect();
        self.scalers
            .fit_and_apply(ScalerKey::new(family, &source.key), &mut table, &numeric)?;

        self.metadata.record(family, &source.key, &table, labels, None, None)?;

        Ok(ProcessedSource {
            family,
            key: source.key.clone(),
            output_name: source.output_name.clone(),
            format: SourceFormat::Csv,
            table,
        })
    }

    /// Источник с фиксированной схемой: категории кодируются, остальное масштабируется
    fn prepare_fixed(
        &mut self,
        descriptor: &DatasetDescriptor,
        dir: &Path,
        source: &SourceSpec,
        schema: &FixedSchema,
    ) -> Result<ProcessedSource> {
        let family = descriptor.family;
        let key = source.key.as_str();

        let (mut table, format) = load_fixed_schema(dir, source, schema)?
            .ok_or_else(|| PrepError::MissingSource(source.file_name.clone()))?;

        Cleaner::drop_difficulty(&mut table);
        let label = Cleaner::resolve_label(&mut table, descriptor.label_spellings)?;

        let categorical: Vec<String> = schema
            .categorical_columns()
            .into_iter()
            .filter(|c| table.column(c).is_some())
            .collect();
        let numeric = schema.numeric_columns(&table.column_names());

        let labels = LabelSnapshot::capture(&table, &label)?;
        for column in &categorical {
            self.encoders
                .encode_column(EncoderKey::new(family, key, column), &mut table, column)?;
        }
        self.scalers
            .fit_and_apply(ScalerKey::new(family, key), &mut table, &numeric)?;

        self.metadata
            .record(family, key, &table, labels, Some(categorical.as_slice()), Some(numeric.as_slice()))?;

        Ok(ProcessedSource {
            family,
            key: key.to_string(),
            output_name: source.output_name.clone(),
            format,
            table,
        })
    }

    /// Сохраняет обработанную таблицу и фиксирует итог источника в отчете
    fn persist(&mut self, family: DatasetFamily, name: &str, outcome: SourceOutcome) {
        let status = match outcome {
            SourceOutcome::Processed(source) => {
                tracing::debug!("{} read as {:?}", source.key, source.format);
                match self.store.save_table(&source.table, source.family, &source.output_name) {
                    Ok(path) => SourceStatus::Processed {
                        rows: source.table.n_rows(),
                        output: path,
                    },
                    Err(e) => {
                        tracing::error!("Failed to save {}: {}", name, e);
                        self.report.write_failures += 1;
                        SourceStatus::WriteFailed(e.to_string())
                    }
                }
            }
            SourceOutcome::Skipped { name, reason } => {
                match reason {
                    PrepError::MissingSource(_) => tracing::warn!("Skipping {}: {}", name, reason),
                    _ => tracing::error!("Skipping {}: {}", name, reason),
                }
                SourceStatus::Skipped(reason.to_string())
            }
            SourceOutcome::Failed { name, cause } => {
                tracing::error!("Error processing {}: {}", name, cause);
                SourceStatus::Failed(cause.to_string())
            }
        };

        self.report.sources.push(SourceReport {
            family,
            name: name.to_string(),
            status,
        });
    }

    pub fn encoders(&self) -> &EncoderRegistry {
        &self.encoders
    }

    pub fn scalers(&self) -> &ScalerRegistry {
        &self.scalers
    }

    pub fn metadata(&self) -> &MetadataDocument {
        self.metadata.document()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Записывает метаданные и возвращает итог прогона
    pub fn finish(mut self) -> RunReport {
        match self.store.save_metadata(self.metadata.document()) {
            Ok(path) => self.report.metadata_path = Some(path),
            Err(e) => {
                tracing::error!("Failed to save metadata: {}", e);
                self.report.write_failures += 1;
            }
        }
        self.report
    }
}

/// Полный прогон по конфигурации. Ошибка возвращается только если
/// каталог вывода нельзя создать.
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    let store = OutputStore::new(&config.output_root);
    store.prepare()?;

    let mut run = PreprocessingRun::new(store);

    for family in [DatasetFamily::Cicids, DatasetFamily::NslKdd] {
        let root = config.family_root(family);
        if root.is_dir() {
            run.process_family(&DatasetDescriptor::for_family(family), &root);
        } else {
            tracing::warn!("{} directory not found: {}", family, root.display());
        }
    }

    Ok(run.finish())
}
