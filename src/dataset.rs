//! Dataset loading: encoding fallback, CSV parsing, and column-name
//! normalization.
//!
//! The file's bytes are read once and decoded with each configured scheme
//! in turn; the first decode that also parses as a uniform CSV wins.
//! Header labels are normalized (trimmed, spaces and parentheses removed)
//! so the rest of the pipeline can reference canonical names.

use std::fmt;
use std::fs;
use std::path::Path;

use encoding_rs::{GBK, UTF_16BE, UTF_16LE, UTF_8};
use serde::Serialize;
use tracing::info;

use crate::error::LoadError;

/// Decodings attempted, in preference order.
pub const ENCODINGS: [&str; 4] = ["utf-8", "gbk", "utf-16", "utf-8-sig"];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A single parsed value. Numeric cells are recognized at load time so
/// feature extraction never re-parses text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(t) => f.write_str(t),
        }
    }
}

/// The historical crop/environment table. Loaded once, read-only for the
/// rest of the process lifetime.
#[derive(Debug, Clone)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;

        for encoding in ENCODINGS {
            let Some(text) = decode(&bytes, encoding) else {
                continue;
            };
            if let Ok(dataset) = parse_csv(&text) {
                info!(encoding, rows = dataset.len(), "dataset loaded");
                return Ok(dataset);
            }
        }

        Err(LoadError::Undecodable {
            path: path.display().to_string(),
            tried: ENCODINGS.to_vec(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of data records (excluding the header).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in the column with the given normalized name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }
}

fn bom(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&UTF8_BOM) {
        Some("utf-8-sig")
    } else if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        Some("utf-16")
    } else {
        None
    }
}

/// Decodes `bytes` as `encoding`, or `None` if the scheme cannot claim the
/// file. A file carrying a BOM may only be claimed by the matching scheme.
fn decode(bytes: &[u8], encoding: &str) -> Option<String> {
    let marker = bom(bytes);
    let text = match encoding {
        "utf-8" => {
            if marker.is_some() {
                return None;
            }
            UTF_8.decode_without_bom_handling_and_without_replacement(bytes)?
        }
        "gbk" => {
            if marker.is_some() {
                return None;
            }
            GBK.decode_without_bom_handling_and_without_replacement(bytes)?
        }
        "utf-16" => match marker {
            Some("utf-16") => {
                let (scheme, body) = if bytes.starts_with(&[0xFF, 0xFE]) {
                    (UTF_16LE, &bytes[2..])
                } else {
                    (UTF_16BE, &bytes[2..])
                };
                scheme.decode_without_bom_handling_and_without_replacement(body)?
            }
            Some(_) => return None,
            // BOM-less UTF-16 is assumed little-endian.
            None => UTF_16LE.decode_without_bom_handling_and_without_replacement(bytes)?,
        },
        "utf-8-sig" => {
            let body = bytes.strip_prefix(&UTF8_BOM)?;
            UTF_8.decode_without_bom_handling_and_without_replacement(body)?
        }
        _ => return None,
    };

    // NUL characters mean the wrong scheme decoded this file, e.g. UTF-16
    // text read as UTF-8.
    if text.contains('\0') {
        return None;
    }
    Some(text.into_owned())
}

fn parse_csv(text: &str) -> Result<Dataset, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let columns: Vec<String> = reader.headers()?.iter().map(normalize_label).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Dataset { columns, rows })
}

/// Trim a header label and drop embedded spaces and parentheses.
fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')'))
        .collect()
}

fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[test]
    fn normalizes_header_labels() {
        assert_eq!(normalize_label("  温度 ℃ "), "温度℃");
        assert_eq!(normalize_label("rain (mm)"), "rainmm");
        assert_eq!(normalize_label("ph"), "ph");
    }

    #[test]
    fn loads_plain_utf8() {
        let file = write_temp("crop, 月份 ,temp (c)\nRice,5,25\n".as_bytes());
        let ds = Dataset::load(file.path()).unwrap();
        assert_eq!(ds.columns(), ["crop", "月份", "tempc"]);
        assert_eq!(ds.value(0, "crop"), Some(&Cell::Text("Rice".into())));
        assert_eq!(ds.value(0, "tempc"), Some(&Cell::Number(25.0)));
        assert_eq!(ds.value(0, "temp (c)"), None);
    }

    #[test]
    fn loads_gbk() {
        let (bytes, _, had_errors) = GBK.encode("作物,温度℃\n水稻,25\n");
        assert!(!had_errors);
        let file = write_temp(&bytes);
        let ds = Dataset::load(file.path()).unwrap();
        assert_eq!(ds.columns(), ["作物", "温度℃"]);
        assert_eq!(ds.value(0, "作物"), Some(&Cell::Text("水稻".into())));
    }

    #[test]
    fn loads_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "作物,month\n小麦,6\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let file = write_temp(&bytes);
        let ds = Dataset::load(file.path()).unwrap();
        assert_eq!(ds.columns(), ["作物", "month"]);
        assert_eq!(ds.value(0, "month"), Some(&Cell::Number(6.0)));
    }

    #[test]
    fn loads_utf8_with_signature() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("crop,ph\nRice,6.5\n".as_bytes());
        let file = write_temp(&bytes);
        let ds = Dataset::load(file.path()).unwrap();
        assert_eq!(ds.columns(), ["crop", "ph"]);
        assert_eq!(ds.value(0, "ph"), Some(&Cell::Number(6.5)));
    }

    #[test]
    fn unlisted_encoding_reports_tried_encodings() {
        // Invalid as UTF-8 (0x81 lead), invalid as GBK (0x3F trail), odd
        // length for UTF-16, no BOM for utf-8-sig.
        let file = write_temp(&[0x81, 0x3F, 0xFF]);
        let err = Dataset::load(file.path()).unwrap_err();
        let msg = err.to_string();
        for name in ENCODINGS {
            assert!(msg.contains(name), "{msg} does not name {name}");
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Dataset::load("no/such/crop_data.csv").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn ragged_rows_fail_the_parse() {
        let file = write_temp("a,b\n1\n".as_bytes());
        let err = Dataset::load(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Undecodable { .. }));
    }
}
