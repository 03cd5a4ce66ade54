//! Разбор ARFF (Weka): заголовок с @attribute и секция @data

use std::fs;
use std::path::Path;

use crate::error::{PrepError, Result};

/// Содержимое ARFF файла
#[derive(Debug, Clone, PartialEq)]
pub struct ArffDocument {
    pub relation: String,
    pub attributes: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_arff(path: &Path) -> Result<ArffDocument> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    let text = fs::read_to_string(path)?;
    parse_arff(&text, &name)
}

pub fn parse_arff(text: &str, source_name: &str) -> Result<ArffDocument> {
    let mut relation = String::new();
    let mut attributes = Vec::new();
    let mut rows = Vec::new();
    let mut in_data = false;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if !in_data {
            if !line.starts_with('@') {
                return Err(PrepError::malformed(
                    source_name,
                    format!("line {}: unexpected content before @data", line_no + 1),
                ));
            }

            let (directive, rest) = split_directive(line);
            match directive.to_ascii_lowercase().as_str() {
                "@relation" => relation = unquote(rest.trim()).to_string(),
                "@attribute" => {
                    let name = attribute_name(rest).ok_or_else(|| {
                        PrepError::malformed(
                            source_name,
                            format!("line {}: attribute without a name", line_no + 1),
                        )
                    })?;
                    attributes.push(name);
                }
                "@data" => in_data = true,
                other => {
                    return Err(PrepError::malformed(
                        source_name,
                        format!("line {}: unknown directive {}", line_no + 1, other),
                    ))
                }
            }
            continue;
        }

        if line.starts_with('{') {
            return Err(PrepError::malformed(
                source_name,
                format!("line {}: sparse rows are not supported", line_no + 1),
            ));
        }

        let fields = split_fields(line);
        if fields.len() != attributes.len() {
            return Err(PrepError::malformed(
                source_name,
                format!(
                    "line {}: {} fields, {} attributes declared",
                    line_no + 1,
                    fields.len(),
                    attributes.len()
                ),
            ));
        }
        rows.push(fields);
    }

    if !in_data {
        return Err(PrepError::malformed(source_name, "no @data section"));
    }

    Ok(ArffDocument {
        relation,
        attributes,
        rows,
    })
}

fn split_directive(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], &line[idx..]),
        None => (line, ""),
    }
}

/// Имя атрибута: первый токен, возможно в кавычках
fn attribute_name(rest: &str) -> Option<String> {
    let rest = rest.trim_start();
    let first = rest.chars().next()?;
    if first == '\'' || first == '"' {
        let end = rest[1..].find(first)?;
        Some(rest[1..1 + end].to_string())
    } else {
        rest.split_whitespace().next().map(|s| s.to_string())
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Разбиение строки данных по запятым с учетом одинарных и двойных кавычек
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                } else {
                    current.push(q);
                }
            }
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if (c == '\'' || c == '"') && current.trim().is_empty() => {
                current.clear();
                quote = Some(c);
            }
            None if c == ',' => fields.push(std::mem::take(&mut current).trim().to_string()),
            None => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}
