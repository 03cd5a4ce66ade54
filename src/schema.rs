//! Схемы датасетов: списки колонок и разбиение на категориальные/числовые

use crate::types::{ColumnKind, DatasetFamily};

/// Ожидаемые файлы CICIDS2017 (имя сравнивается без учета регистра)
pub const CICIDS_FILES: [&str; 5] = [
    "monday.csv",
    "tuesday.csv",
    "wednesday.csv",
    "thursday.csv",
    "friday.csv",
];

/// Допустимые написания колонки с меткой, в порядке приоритета
pub const CICIDS_LABEL_SPELLINGS: [&str; 2] = ["Label", "label"];

pub const NSL_KDD_LABEL: &str = "label";

/// Колонка сложности NSL-KDD, в обработку не попадает
pub const DIFFICULTY_COLUMN: &str = "difficulty";

pub const NSL_KDD_CATEGORICAL: [&str; 3] = ["protocol_type", "service", "flag"];

pub const NSL_KDD_COLUMNS: [&str; 43] = [
    "duration",
    "protocol_type",
    "service",
    "flag",
    "src_bytes",
    "dst_bytes",
    "land",
    "wrong_fragment",
    "urgent",
    "hot",
    "num_failed_logins",
    "logged_in",
    "num_compromised",
    "root_shell",
    "su_attempted",
    "num_root",
    "num_file_creations",
    "num_shells",
    "num_access_files",
    "num_outbound_cmds",
    "is_host_login",
    "is_guest_login",
    "count",
    "srv_count",
    "serror_rate",
    "srv_serror_rate",
    "rerror_rate",
    "srv_rerror_rate",
    "same_srv_rate",
    "diff_srv_rate",
    "srv_diff_host_rate",
    "dst_host_count",
    "dst_host_srv_count",
    "dst_host_same_srv_rate",
    "dst_host_diff_srv_rate",
    "dst_host_same_src_port_rate",
    "dst_host_srv_diff_host_rate",
    "dst_host_serror_rate",
    "dst_host_srv_serror_rate",
    "dst_host_rerror_rate",
    "dst_host_srv_rerror_rate",
    "label",
    "difficulty",
];

/// Варианты NSL-KDD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NslKddVariant {
    TrainFull,
    TestFull,
    Train20,
    Test21,
}

impl NslKddVariant {
    pub const ALL: [NslKddVariant; 4] = [
        NslKddVariant::TrainFull,
        NslKddVariant::TestFull,
        NslKddVariant::Train20,
        NslKddVariant::Test21,
    ];

    /// Имя текстового файла без заголовка
    pub fn file_name(&self) -> &'static str {
        match self {
            NslKddVariant::TrainFull => "KDDTrain+.txt",
            NslKddVariant::TestFull => "KDDTest+.txt",
            NslKddVariant::Train20 => "KDDTrain+_20Percent.txt",
            NslKddVariant::Test21 => "KDDTest-21.txt",
        }
    }

    /// Имя ARFF файла (пробуется первым)
    pub fn arff_name(&self) -> String {
        self.file_name().replace(".txt", ".arff")
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            NslKddVariant::TrainFull => "train_full",
            NslKddVariant::TestFull => "test_full",
            NslKddVariant::Train20 => "train_20",
            NslKddVariant::Test21 => "test_21",
        }
    }
}

/// Фиксированная схема: упорядоченный список колонок и их типы
#[derive(Debug, Clone, Copy)]
pub struct FixedSchema {
    pub columns: &'static [&'static str],
    pub categorical: &'static [&'static str],
    pub label: &'static str,
    pub ignored: &'static [&'static str],
}

impl FixedSchema {
    pub fn kind_of(&self, column: &str) -> ColumnKind {
        if column == self.label {
            ColumnKind::Label
        } else if self.categorical.contains(&column) {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        }
    }

    /// Категориальные колонки в порядке схемы
    pub fn categorical_columns(&self) -> Vec<String> {
        self.categorical.iter().map(|c| c.to_string()).collect()
    }

    /// Числовые колонки среди присутствующих: всё, кроме категорий, метки и игнорируемых
    pub fn numeric_columns(&self, present: &[String]) -> Vec<String> {
        present
            .iter()
            .filter(|c| self.kind_of(c) == ColumnKind::Numeric)
            .filter(|c| !self.ignored.contains(&c.as_str()))
            .cloned()
            .collect()
    }
}

pub const NSL_KDD_SCHEMA: FixedSchema = FixedSchema {
    columns: &NSL_KDD_COLUMNS,
    categorical: &NSL_KDD_CATEGORICAL,
    label: NSL_KDD_LABEL,
    ignored: &[DIFFICULTY_COLUMN],
};

/// Ожидаемый источник: имя файла, ключ в метаданных и имя результата
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub file_name: String,
    /// ARFF с теми же данными; если есть, читается вместо file_name
    pub arff_name: Option<String>,
    pub key: String,
    pub output_name: String,
}

impl SourceSpec {
    /// Источник CSV: ключ и имя результата совпадают с именем файла
    pub fn flow_csv(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            arff_name: None,
            key: file_name.to_string(),
            output_name: file_name.to_string(),
        }
    }
}

impl From<NslKddVariant> for SourceSpec {
    fn from(variant: NslKddVariant) -> Self {
        Self {
            file_name: variant.file_name().to_string(),
            arff_name: Some(variant.arff_name()),
            key: variant.short_name().to_string(),
            output_name: format!("{}.csv", variant.short_name()),
        }
    }
}

/// Описание семейства датасетов. Без схемы типы колонок выводятся
/// из данных, со схемой берутся из неё.
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub family: DatasetFamily,
    pub sources: Vec<SourceSpec>,
    pub label_spellings: &'static [&'static str],
    pub schema: Option<FixedSchema>,
}

impl DatasetDescriptor {
    pub fn cicids() -> Self {
        Self {
            family: DatasetFamily::Cicids,
            sources: CICIDS_FILES.iter().map(|f| SourceSpec::flow_csv(f)).collect(),
            label_spellings: &CICIDS_LABEL_SPELLINGS,
            schema: None,
        }
    }

    pub fn nsl_kdd() -> Self {
        Self {
            family: DatasetFamily::NslKdd,
            sources: NslKddVariant::ALL.iter().map(|v| SourceSpec::from(*v)).collect(),
            label_spellings: &[NSL_KDD_LABEL],
            schema: Some(NSL_KDD_SCHEMA),
        }
    }

    pub fn for_family(family: DatasetFamily) -> Self {
        match family {
            DatasetFamily::Cicids => Self::cicids(),
            DatasetFamily::NslKdd => Self::nsl_kdd(),
        }
    }

    pub fn source(&self, key: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.key == key)
    }
}

/// Нормализация имени колонки: обрезка пробелов по краям, внутренние пробелы в '_'
pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_padded_names() {
        assert_eq!(normalize_column_name(" Flow Bytes/s "), "Flow_Bytes/s");
        assert_eq!(normalize_column_name(" Label"), "Label");
        assert_eq!(normalize_column_name("Destination Port"), "Destination_Port");
    }

    #[test]
    fn nsl_kdd_partition() {
        let present: Vec<String> = NSL_KDD_COLUMNS[..42].iter().map(|c| c.to_string()).collect();
        let numeric = NSL_KDD_SCHEMA.numeric_columns(&present);

        assert_eq!(numeric.len(), 38);
        assert!(!numeric.contains(&"label".to_string()));
        assert!(!numeric.contains(&"service".to_string()));
        assert_eq!(NSL_KDD_SCHEMA.kind_of("label"), ColumnKind::Label);
        assert_eq!(NSL_KDD_SCHEMA.kind_of("flag"), ColumnKind::Categorical);
        assert_eq!(NSL_KDD_SCHEMA.kind_of("duration"), ColumnKind::Numeric);
    }

    #[test]
    fn difficulty_is_never_numeric() {
        let present: Vec<String> = NSL_KDD_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert!(!NSL_KDD_SCHEMA
            .numeric_columns(&present)
            .contains(&DIFFICULTY_COLUMN.to_string()));
    }

    #[test]
    fn variant_file_names() {
        assert_eq!(NslKddVariant::Train20.arff_name(), "KDDTrain+_20Percent.arff");
        assert_eq!(NslKddVariant::Test21.short_name(), "test_21");
    }

    #[test]
    fn descriptors_carry_sources_and_schema() {
        let nsl = DatasetDescriptor::for_family(DatasetFamily::NslKdd);
        assert_eq!(nsl.sources.len(), 4);
        assert!(nsl.schema.is_some());
        assert_eq!(nsl.label_spellings, &["label"]);

        let train20 = nsl.source("train_20").unwrap();
        assert_eq!(train20.file_name, "KDDTrain+_20Percent.txt");
        assert_eq!(train20.arff_name.as_deref(), Some("KDDTrain+_20Percent.arff"));
        assert_eq!(train20.output_name, "train_20.csv");

        let cicids = DatasetDescriptor::for_family(DatasetFamily::Cicids);
        assert!(cicids.schema.is_none());
        assert_eq!(cicids.sources[0].key, "monday.csv");
        assert_eq!(cicids.sources[0].output_name, "monday.csv");
        assert_eq!(cicids.label_spellings, &["Label", "label"]);
    }
}
