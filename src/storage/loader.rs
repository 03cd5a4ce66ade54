//! Загрузка исходных файлов в таблицы

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, ReaderBuilder, Trim};

use crate::error::{PrepError, Result};
use crate::schema::{normalize_column_name, FixedSchema, SourceSpec};
use crate::storage::arff::read_arff;
use crate::types::{Column, ColumnData, ColumnKind, Table};

/// Формат, из которого прочитан источник
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Arff,
    HeaderlessText,
}

/// Поиск файла в каталоге без учета регистра имени
pub fn resolve_case_insensitive(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let exact = dir.join(file_name);
    if exact.is_file() {
        return Ok(Some(exact));
    }

    if !dir.is_dir() {
        return Ok(None);
    }

    let wanted = file_name.to_lowercase();
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_lowercase() == wanted)
                .unwrap_or(false)
        })
        .collect();

    // несколько совпадений: берем первое по имени, чтобы результат был стабильным
    matches.sort();
    Ok(matches.into_iter().next())
}

/// CSV с заголовком (CICIDS). Тип колонки выводится по данным: числовая,
/// если разбирается больше половины непустых значений; остальные ячейки
/// такой колонки становятся пропусками. Колонки из `text_columns`
/// (сравнение по нормализованному имени) всегда текстовые.
/// Обрезаются только заголовки, байты не в UTF-8 заменяются на U+FFFD.
pub fn load_flow_csv(path: &Path, source_name: &str, text_columns: &[&str]) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(|e| PrepError::malformed(source_name, e))?;

    let headers = dedupe_headers(
        reader
            .byte_headers()
            .map_err(|e| PrepError::malformed(source_name, e))?,
    );

    let mut records: Vec<ByteRecord> = Vec::new();
    for record in reader.byte_records() {
        records.push(record.map_err(|e| PrepError::malformed(source_name, e))?);
    }

    tracing::debug!(
        "Read {} rows x {} columns from {}",
        records.len(),
        headers.len(),
        path.display()
    );

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Cow<'_, str>> = records
                .iter()
                .map(|r| String::from_utf8_lossy(r.get(idx).unwrap_or(b"")))
                .collect();
            let force_text = text_columns.contains(&normalize_column_name(&name).as_str());
            infer_column(name, &cells, force_text)
        })
        .collect();

    Table::new(source_name, columns)
}

/// Повторяющиеся имена колонок получают суффикс .1, .2 ...
fn dedupe_headers(headers: &ByteRecord) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .map(|h| {
            let h = String::from_utf8_lossy(h);
            let count = seen.entry(h.to_string()).or_insert(0);
            let name = if *count == 0 {
                h.to_string()
            } else {
                format!("{}.{}", h, count)
            };
            *count += 1;
            name
        })
        .collect()
}

fn is_missing_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell.eq_ignore_ascii_case("nan")
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

fn infer_column(name: String, cells: &[Cow<'_, str>], force_text: bool) -> Column {
    let present = cells.iter().filter(|c| !is_missing_cell(c)).count();
    let parsed = cells
        .iter()
        .filter(|c| !is_missing_cell(c))
        .filter(|c| parse_cell(c).is_some())
        .count();

    if !force_text && (present == 0 || parsed * 2 > present) {
        let unparsed = present - parsed;
        if unparsed > 0 {
            tracing::debug!("{}: {} non-numeric cells treated as missing", name, unparsed);
        }
        let values = cells
            .iter()
            .map(|c| if is_missing_cell(c) { f64::NAN } else { parse_cell(c).unwrap_or(f64::NAN) })
            .collect();
        Column::new(name, ColumnKind::Numeric, ColumnData::Numeric(values))
    } else {
        let values = cells
            .iter()
            .map(|c| if is_missing_cell(c) { String::new() } else { c.to_string() })
            .collect();
        Column::new(name, ColumnKind::Categorical, ColumnData::Text(values))
    }
}

/// Текстовый файл без заголовка; имена колонок берутся из схемы
pub fn load_headerless_text(path: &Path, schema: &FixedSchema, source_name: &str) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PrepError::malformed(source_name, e))?;

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| PrepError::malformed(source_name, e))?;
        rows.push(
            record
                .iter()
                .map(|s| String::from_utf8_lossy(s).into_owned())
                .collect(),
        );
    }

    fixed_schema_table(rows, schema, source_name)
}

/// ARFF; имена атрибутов заменяются каноническими по позиции
pub fn load_arff(path: &Path, schema: &FixedSchema, source_name: &str) -> Result<Table> {
    let document = read_arff(path).map_err(|e| match e {
        PrepError::Io(io) => PrepError::malformed(source_name, io),
        other => other,
    })?;

    tracing::debug!(
        "ARFF relation '{}' with {} attributes",
        document.relation,
        document.attributes.len()
    );

    if document.rows.is_empty() {
        return fixed_schema_table_with_width(Vec::new(), document.attributes.len(), schema, source_name);
    }
    fixed_schema_table(document.rows, schema, source_name)
}

/// Источник с фиксированной схемой: сначала ARFF, затем текстовый файл.
/// None, если нет ни того, ни другого.
pub fn load_fixed_schema(
    dir: &Path,
    source: &SourceSpec,
    schema: &FixedSchema,
) -> Result<Option<(Table, SourceFormat)>> {
    if let Some(arff_name) = &source.arff_name {
        let arff_path = dir.join(arff_name);
        if arff_path.is_file() {
            tracing::info!("Processing ARFF file: {}", arff_name);
            let table = load_arff(&arff_path, schema, &source.file_name)?;
            return Ok(Some((table, SourceFormat::Arff)));
        }
    }

    let txt_path = dir.join(&source.file_name);
    if txt_path.is_file() {
        tracing::info!("Processing TXT file: {}", source.file_name);
        let table = load_headerless_text(&txt_path, schema, &source.file_name)?;
        Ok(Some((table, SourceFormat::HeaderlessText)))
    } else {
        tracing::debug!("Neither ARFF nor TXT file found for {}", source.file_name);
        Ok(None)
    }
}

fn fixed_schema_table(rows: Vec<Vec<String>>, schema: &FixedSchema, source_name: &str) -> Result<Table> {
    let width = rows.first().map(|r| r.len()).unwrap_or(0);
    fixed_schema_table_with_width(rows, width, schema, source_name)
}

/// Допустимая ширина: схема целиком или без последней (игнорируемой) колонки
fn fixed_schema_table_with_width(
    rows: Vec<Vec<String>>,
    width: usize,
    schema: &FixedSchema,
    source_name: &str,
) -> Result<Table> {
    let full = schema.columns.len();
    if width != full && width + schema.ignored.len() != full {
        return Err(PrepError::malformed(
            source_name,
            format!("expected {} or {} fields, found {}", full - schema.ignored.len(), full, width),
        ));
    }

    let mut columns = Vec::with_capacity(width);
    for (idx, name) in schema.columns[..width].iter().enumerate() {
        let kind = schema.kind_of(name);
        let data = match kind {
            ColumnKind::Numeric => {
                let mut values = Vec::with_capacity(rows.len());
                for (row_idx, row) in rows.iter().enumerate() {
                    values.push(parse_fixed_numeric(row, idx, row_idx, name, source_name)?);
                }
                ColumnData::Numeric(values)
            }
            ColumnKind::Categorical | ColumnKind::Label => {
                ColumnData::Text(rows.iter().map(|r| r.get(idx).cloned().unwrap_or_default()).collect())
            }
        };
        columns.push(Column::new(*name, kind, data));
    }

    Table::new(source_name, columns)
}

fn parse_fixed_numeric(
    row: &[String],
    idx: usize,
    row_idx: usize,
    column: &str,
    source_name: &str,
) -> Result<f64> {
    let cell = row.get(idx).ok_or_else(|| {
        PrepError::malformed(source_name, format!("row {}: {} fields", row_idx + 1, row.len()))
    })?;

    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PrepError::malformed(
            source_name,
            format!("row {}: '{}' in column {} is not a finite number", row_idx + 1, cell, column),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NslKddVariant, CICIDS_LABEL_SPELLINGS, NSL_KDD_SCHEMA};
    use std::fs;
    use tempfile::TempDir;

    fn nsl_row(protocol: &str, label: &str, difficulty: Option<u32>) -> String {
        let mut fields = vec!["0".to_string(), protocol.to_string(), "http".into(), "SF".into()];
        fields.extend((0..37).map(|i| i.to_string()));
        fields.push(label.to_string());
        if let Some(d) = difficulty {
            fields.push(d.to_string());
        }
        fields.join(",")
    }

    #[test]
    fn finds_files_regardless_of_case() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Monday.CSV"), "a\n1\n").unwrap();

        let found = resolve_case_insensitive(dir.path(), "monday.csv").unwrap();
        assert_eq!(found, Some(dir.path().join("Monday.CSV")));
        assert_eq!(resolve_case_insensitive(dir.path(), "friday.csv").unwrap(), None);
    }

    #[test]
    fn infers_numeric_and_text_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monday.csv");
        fs::write(
            &path,
            " Flow Bytes/s, Fwd Packets, Fwd Packets, Label\ninf,1,2,BENIGN\n3.5,,4,DDoS\n",
        )
        .unwrap();

        let table = load_flow_csv(&path, "monday.csv", &CICIDS_LABEL_SPELLINGS).unwrap();

        assert_eq!(
            table.column_names(),
            vec!["Flow Bytes/s", "Fwd Packets", "Fwd Packets.1", "Label"]
        );
        let bytes = table.column("Flow Bytes/s").unwrap();
        assert_eq!(bytes.kind, ColumnKind::Numeric);
        match &bytes.data {
            ColumnData::Numeric(v) => assert!(v[0].is_infinite() && v[1] == 3.5),
            other => panic!("unexpected {:?}", other),
        }
        assert!(table.column("Fwd Packets").unwrap().data.is_missing(1));
        assert_eq!(table.column("Label").unwrap().kind, ColumnKind::Categorical);
    }

    #[test]
    fn unparsable_cells_in_numeric_column_become_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tuesday.csv");
        fs::write(&path, "Fwd Packets,Label\n1,BENIGN\nabc,BENIGN\n3,FTP-Patator\n").unwrap();

        let table = load_flow_csv(&path, "tuesday.csv", &CICIDS_LABEL_SPELLINGS).unwrap();

        let packets = table.column("Fwd Packets").unwrap();
        assert_eq!(packets.kind, ColumnKind::Numeric);
        match &packets.data {
            ColumnData::Numeric(v) => {
                assert_eq!(v[0], 1.0);
                assert!(v[1].is_nan());
                assert_eq!(v[2], 3.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mostly_text_column_stays_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("friday.csv");
        fs::write(&path, "Source IP,Label\n10.0.0.1,BENIGN\n80,BENIGN\n10.0.0.2,PortScan\n").unwrap();

        let table = load_flow_csv(&path, "friday.csv", &CICIDS_LABEL_SPELLINGS).unwrap();

        assert_eq!(
            table.column("Source IP").unwrap().data,
            ColumnData::Text(vec!["10.0.0.1".into(), "80".into(), "10.0.0.2".into()])
        );
    }

    #[test]
    fn label_cells_are_kept_as_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thursday.csv");
        fs::write(&path, " Flow Duration, Label\n 10 ,0\n20, DoS Hulk\n30,1\n").unwrap();

        let table = load_flow_csv(&path, "thursday.csv", &CICIDS_LABEL_SPELLINGS).unwrap();

        assert_eq!(table.column_names(), vec!["Flow Duration", "Label"]);
        assert_eq!(
            table.column("Flow Duration").unwrap().data,
            ColumnData::Numeric(vec![10.0, 20.0, 30.0])
        );
        let label = table.column("Label").unwrap();
        assert_eq!(label.kind, ColumnKind::Categorical);
        assert_eq!(
            label.data,
            ColumnData::Text(vec!["0".into(), " DoS Hulk".into(), "1".into()])
        );
    }

    #[test]
    fn invalid_utf8_is_replaced_instead_of_failing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("thursday.csv");
        fs::write(&path, b"Flow Duration,Label\n5,Web Attack \x96 XSS\n6,BENIGN\n".as_slice()).unwrap();

        let table = load_flow_csv(&path, "thursday.csv", &CICIDS_LABEL_SPELLINGS).unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("Label").unwrap().data,
            ColumnData::Text(vec!["Web Attack \u{FFFD} XSS".into(), "BENIGN".into()])
        );
    }

    #[test]
    fn ragged_csv_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monday.csv");
        fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        let err = load_flow_csv(&path, "monday.csv", &CICIDS_LABEL_SPELLINGS).unwrap_err();
        assert!(matches!(err, PrepError::MalformedSource { .. }));
    }

    #[test]
    fn headerless_text_uses_schema_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("KDDTest-21.txt");
        let body = format!("{}\n{}\n", nsl_row("tcp", "normal", Some(21)), nsl_row("udp", "neptune", Some(18)));
        fs::write(&path, body).unwrap();

        let table = load_headerless_text(&path, &NSL_KDD_SCHEMA, "KDDTest-21.txt").unwrap();

        assert_eq!(table.n_columns(), 43);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("label").unwrap().kind, ColumnKind::Label);
        assert_eq!(
            table.column("protocol_type").unwrap().data,
            ColumnData::Text(vec!["tcp".into(), "udp".into()])
        );
    }

    #[test]
    fn fixed_schema_rejects_non_numeric_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("KDDTest+.txt");
        fs::write(&path, nsl_row("tcp", "normal", Some(21)).replacen("0,", "?,", 1)).unwrap();

        let err = load_headerless_text(&path, &NSL_KDD_SCHEMA, "KDDTest+.txt").unwrap_err();
        assert!(matches!(err, PrepError::MalformedSource { .. }));
    }

    #[test]
    fn prefers_arff_over_text() {
        let dir = TempDir::new().unwrap();
        let mut arff = String::from("@relation KDDTrain\n");
        for i in 0..42 {
            arff.push_str(&format!("@attribute 'attr{}' real\n", i));
        }
        arff.push_str("@data\n");
        arff.push_str(&nsl_row("icmp", "anomaly", None));
        arff.push('\n');
        fs::write(dir.path().join("KDDTrain+.arff"), arff).unwrap();
        fs::write(dir.path().join("KDDTrain+.txt"), nsl_row("tcp", "normal", Some(20))).unwrap();

        let (table, format) = load_fixed_schema(dir.path(), &SourceSpec::from(NslKddVariant::TrainFull), &NSL_KDD_SCHEMA)
            .unwrap()
            .unwrap();

        assert_eq!(format, SourceFormat::Arff);
        assert_eq!(table.n_columns(), 42);
        assert_eq!(
            table.column("label").unwrap().data,
            ColumnData::Text(vec!["anomaly".into()])
        );
    }

    #[test]
    fn missing_variant_yields_none() {
        let dir = TempDir::new().unwrap();
        let loaded = load_fixed_schema(dir.path(), &SourceSpec::from(NslKddVariant::Test21), &NSL_KDD_SCHEMA).unwrap();
        assert!(loaded.is_none());
    }
}
