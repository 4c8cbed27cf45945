// file: src/models/document.rs
// description: in-memory csv document model with its framing dialect
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// One data row. Rows are replaced by their redacted counterpart, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRow(Vec<String>);

impl DataRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_cells(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for DataRow {
    fn from(cells: Vec<String>) -> Self {
        Self(cells)
    }
}

impl From<Vec<&str>> for DataRow {
    fn from(cells: Vec<&str>) -> Self {
        Self(cells.into_iter().map(str::to_string).collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineTerminator {
    #[default]
    Lf,
    CrLf,
}

/// Framing details captured at parse time so serialization reproduces the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    pub terminator: LineTerminator,
    pub trailing_terminator: bool,
    pub bom: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            terminator: LineTerminator::Lf,
            trailing_terminator: true,
            bom: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    pub header: Option<DataRow>,
    pub rows: Vec<DataRow>,
    pub dialect: Dialect,
}

impl CsvDocument {
    pub fn new(header: Option<DataRow>, rows: Vec<DataRow>) -> Self {
        Self {
            header,
            rows,
            dialect: Dialect::default(),
        }
    }

    /// Field count every row is expected to have: the header's, else the first row's.
    pub fn width(&self) -> Option<usize> {
        self.header
            .as_ref()
            .or_else(|| self.rows.first())
            .map(DataRow::len)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.rows.is_empty()
    }

    /// Same header and dialect, new body.
    pub fn with_rows(&self, rows: Vec<DataRow>) -> Self {
        Self {
            header: self.header.clone(),
            rows,
            dialect: self.dialect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_prefers_header() {
        let doc = CsvDocument::new(
            Some(DataRow::from(vec!["name", "email", "phone"])),
            vec![DataRow::from(vec!["a", "b"])],
        );
        assert_eq!(doc.width(), Some(3));
    }

    #[test]
    fn test_width_without_header() {
        let doc = CsvDocument::new(None, vec![DataRow::from(vec!["a", "b"])]);
        assert_eq!(doc.width(), Some(2));
        assert_eq!(CsvDocument::new(None, vec![]).width(), None);
    }

    #[test]
    fn test_with_rows_keeps_header_and_dialect() {
        let mut doc = CsvDocument::new(
            Some(DataRow::from(vec!["name"])),
            vec![DataRow::from(vec!["alice"])],
        );
        doc.dialect.terminator = LineTerminator::CrLf;

        let redacted = doc.with_rows(vec![DataRow::from(vec!["[REDACTED]"])]);
        assert_eq!(redacted.header, doc.header);
        assert_eq!(redacted.dialect.terminator, LineTerminator::CrLf);
        assert_eq!(redacted.rows[0].cells(), ["[REDACTED]"]);
    }
}
