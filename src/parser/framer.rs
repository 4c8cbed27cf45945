// file: src/parser/framer.rs
// description: csv framing between raw object bytes and ordered header plus data rows
// reference: https://docs.rs/csv

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{CsvDocument, DataRow, Dialect, LineTerminator};
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy)]
pub struct CsvFramer {
    has_header: bool,
    allow_ragged: bool,
}

impl Default for CsvFramer {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl CsvFramer {
    pub fn new(has_header: bool, allow_ragged: bool) -> Self {
        Self {
            has_header,
            allow_ragged,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.has_header, config.allow_ragged_rows)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<CsvDocument> {
        let (bom, body) = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => (true, rest),
            None => (false, bytes),
        };

        let text = std::str::from_utf8(body).map_err(|e| {
            PipelineError::MalformedCsv(format!(
                "input is not valid UTF-8 (byte {})",
                e.valid_up_to()
            ))
        })?;

        let dialect = Dialect {
            terminator: detect_terminator(text),
            trailing_terminator: text.ends_with('\n'),
            bom,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut header: Option<DataRow> = None;
        let mut rows: Vec<DataRow> = Vec::new();
        let mut width: Option<usize> = None;

        for result in reader.records() {
            let record = result.map_err(|e| PipelineError::MalformedCsv(e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let row = to_row(&record);

            match width {
                None => width = Some(row.len()),
                Some(expected) if row.len() != expected && !self.allow_ragged => {
                    return Err(PipelineError::MalformedCsv(format!(
                        "line {} has {} fields, expected {}",
                        line,
                        row.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }

            if self.has_header && header.is_none() && rows.is_empty() {
                header = Some(row);
            } else {
                rows.push(row);
            }
        }

        debug!(
            "Framed csv: header={} rows={} width={:?}",
            header.is_some(),
            rows.len(),
            width
        );

        Ok(CsvDocument {
            header,
            rows,
            dialect,
        })
    }

    pub fn serialize(&self, document: &CsvDocument) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        if document.dialect.bom {
            out.extend_from_slice(UTF8_BOM);
        }

        let terminator = document.dialect.terminator;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(match terminator {
                LineTerminator::Lf => Terminator::Any(b'\n'),
                LineTerminator::CrLf => Terminator::CRLF,
            })
            .from_writer(out);

        for row in document.header.iter().chain(document.rows.iter()) {
            writer
                .write_record(row.cells())
                .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        }

        let mut out = writer
            .into_inner()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        if !document.dialect.trailing_terminator {
            let suffix: &[u8] = match terminator {
                LineTerminator::Lf => b"\n",
                LineTerminator::CrLf => b"\r\n",
            };
            if out.ends_with(suffix) {
                out.truncate(out.len() - suffix.len());
            }
        }

        Ok(out)
    }

    /// Header-less parse used for redaction responses; field counts are left to the caller.
    pub fn parse_records(text: &str) -> std::result::Result<Vec<DataRow>, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        reader
            .records()
            .map(|record| record.map(|r| to_row(&r)))
            .collect()
    }

    /// Header-less, LF terminated serialization used for redaction requests.
    pub fn serialize_rows(rows: &[DataRow]) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        for row in rows {
            writer
                .write_record(row.cells())
                .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;

        String::from_utf8(bytes).map_err(|e| PipelineError::Serialization(e.to_string()))
    }
}

fn to_row(record: &StringRecord) -> DataRow {
    DataRow::new(record.iter().map(str::to_string).collect())
}

fn detect_terminator(text: &str) -> LineTerminator {
    match text.find('\n') {
        Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => LineTerminator::CrLf,
        _ => LineTerminator::Lf,
    }
}
