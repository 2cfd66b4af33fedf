//! Source decoding and report serialization.
//!
//! All byte-level I/O for the pipeline flows through this module:
//!
//! - **Decoding**: uploads arrive as raw bytes with no reliable encoding label.
//!   [`read_source()`] tries UTF-16/tab, then UTF-8 with BOM/comma, then
//!   UTF-8/comma, keeping the first attempt that decodes cleanly and parses
//!   into a consistent table.
//! - **Output**: [`write_csv()`] emits UTF-8, comma-separated text with a
//!   header row; missing cells become empty fields.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use log::{debug, info};

use crate::{error::PipelineError, table::Table};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextEncoding {
    Utf16,
    Utf8Sig,
    Utf8,
}

#[derive(Debug, Clone, Copy)]
struct DecodeAttempt {
    encoding: TextEncoding,
    delimiter: u8,
}

impl DecodeAttempt {
    fn label(&self) -> String {
        let encoding = match self.encoding {
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Utf8 => "utf-8",
        };
        format!("{encoding}/{}", printable_delimiter(self.delimiter))
    }
}

const DECODE_ATTEMPTS: [DecodeAttempt; 3] = [
    DecodeAttempt {
        encoding: TextEncoding::Utf16,
        delimiter: DEFAULT_TSV_DELIMITER,
    },
    DecodeAttempt {
        encoding: TextEncoding::Utf8Sig,
        delimiter: DEFAULT_CSV_DELIMITER,
    },
    DecodeAttempt {
        encoding: TextEncoding::Utf8,
        delimiter: DEFAULT_CSV_DELIMITER,
    },
];

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

/// Parses an uploaded export, trying each supported encoding and separator in turn.
pub fn read_source(bytes: &[u8], source_name: &str) -> Result<Table, PipelineError> {
    let mut failures = Vec::new();
    for attempt in DECODE_ATTEMPTS {
        match try_attempt(bytes, attempt) {
            Ok(table) => {
                info!(
                    "Read '{source_name}' as {}: {} column(s), {} row(s)",
                    attempt.label(),
                    table.headers().len(),
                    table.row_count()
                );
                return Ok(table);
            }
            Err(reason) => {
                debug!("'{source_name}' is not {}: {reason}", attempt.label());
                failures.push(format!("{}: {reason}", attempt.label()));
            }
        }
    }
    Err(PipelineError::Parse {
        source_name: source_name.to_string(),
        attempts: failures,
    })
}

/// Reads a file from disk and hands its bytes to [`read_source()`].
pub fn read_source_path(path: &Path) -> Result<Table> {
    let bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(read_source(&bytes, &name)?)
}

fn try_attempt(bytes: &[u8], attempt: DecodeAttempt) -> Result<Table, String> {
    let text = decode_text(bytes, attempt.encoding)?;
    parse_delimited(&text, attempt.delimiter)
}

fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String, String> {
    match encoding {
        TextEncoding::Utf16 => {
            let (encoding, bom_len) = match Encoding::for_bom(bytes) {
                Some((enc, len)) if enc == UTF_16LE || enc == UTF_16BE => (enc, len),
                Some(_) => return Err("byte-order mark is not UTF-16".to_string()),
                None if looks_like_utf16(bytes) => (UTF_16LE, 0),
                None => return Err("no UTF-16 byte-order mark".to_string()),
            };
            decode_strict(&bytes[bom_len..], encoding)
        }
        TextEncoding::Utf8Sig => {
            let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            decode_strict(body, UTF_8)
        }
        TextEncoding::Utf8 => decode_strict(bytes, UTF_8),
    }
}

fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    let nuls = bytes.iter().filter(|b| **b == 0).count();
    nuls * 4 >= bytes.len()
}

fn decode_strict(bytes: &[u8], encoding: &'static Encoding) -> Result<String, String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| format!("malformed {} input", encoding.name()))
}

fn parse_delimited(text: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = open_csv_reader(text.as_bytes(), delimiter);
    let headers = reader
        .headers()
        .map_err(|err| err.to_string())?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err("no header row".to_string());
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| err.to_string())?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    Ok(Table::from_strings(headers, rows))
}

fn open_csv_reader(text: &[u8], delimiter: u8) -> csv::Reader<&[u8]> {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(text)
}

/// Serializes a table as UTF-8 CSV with a header row.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, csv::Error> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    let mut writer = builder.from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.display_rows() {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
