//! Delimited-text ingestion.
//!
//! Turns already-read text into a [`RawTable`]. The first non-empty line is the
//! header; every following non-empty line must have exactly as many cells.
//! Ingestion stops at the first malformed row, since a partially ingested
//! table would silently misalign samples.

use super::{RawRow, RawTable, RawValue};
use crate::error::PipelineError;
use ::csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

/// Configurable CSV reader.
#[derive(Clone, Debug)]
pub struct CsvIngestor {
    delimiter: u8,
}

impl Default for CsvIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvIngestor {
    /// Comma-delimited ingestor.
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse text held in memory.
    pub fn parse_str(&self, text: &str) -> Result<RawTable, PipelineError> {
        self.parse_reader(text.as_bytes())
    }

    /// Parse from any reader.
    ///
    /// # Errors
    /// - [`PipelineError::Parse`] if there is no header line, the header has a
    ///   duplicate column name, or a row's cell count differs from the header's.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<RawTable, PipelineError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for result in rdr.records() {
            let record = result?;
            if is_blank(&record) {
                continue;
            }
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or_default();

            match &header {
                None => header = Some(read_header(&record, line)?),
                Some(columns) => {
                    if record.len() != columns.len() {
                        return Err(PipelineError::Parse {
                            line,
                            message: format!(
                                "expected {} fields, got {}",
                                columns.len(),
                                record.len()
                            ),
                        });
                    }
                    rows.push(RawRow::new(record.iter().map(RawValue::parse).collect()));
                }
            }
        }

        let columns = header.ok_or_else(|| PipelineError::Parse {
            line: 1,
            message: "missing header line".to_string(),
        })?;

        debug!(columns = columns.len(), rows = rows.len(), "ingested csv");
        RawTable::new(columns, rows)
    }
}

/// A line with nothing on it but whitespace. Rows of empty cells such as
/// `,,` are data and go through the width check like any other row.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).map_or(true, str::is_empty)
}

fn read_header(record: &StringRecord, line: usize) -> Result<Vec<String>, PipelineError> {
    let columns: Vec<String> = record.iter().map(str::to_string).collect();
    let mut seen = HashSet::new();
    for name in &columns {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::Parse {
                line,
                message: format!("duplicate column name '{}'", name),
            });
        }
    }
    Ok(columns)
}

/// Parse comma-delimited text with the default ingestor.
pub fn parse_csv(text: &str) -> Result<RawTable, PipelineError> {
    CsvIngestor::new().parse_str(text)
}

/// Parse comma-delimited text from a reader with the default ingestor.
pub fn parse_csv_reader<R: Read>(reader: R) -> Result<RawTable, PipelineError> {
    CsvIngestor::new().parse_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let table = parse_csv("a,b,c\n1,2,x\n3.5,4,y\n").unwrap();
        assert_eq!(table.columns(), &["a", "b", "c"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[1].get(0), Some(&RawValue::Number(3.5)));
        assert_eq!(table.rows()[0].get(2), Some(&RawValue::Text("x".into())));
    }

    #[test]
    fn test_parse_every_row_has_header_width() {
        let mut text = String::from("a,b,c,d\n");
        for i in 0..25 {
            text.push_str(&format!("{},{},{},cat{}\n", i, i * 2, i % 3, i % 4));
        }
        let table = parse_csv(&text).unwrap();
        assert_eq!(table.n_rows(), 25);
        assert!(table.rows().iter().all(|r| r.len() == 4));
    }

    #[test]
    fn test_parse_skips_empty_lines() {
        let table = parse_csv("\n\na,b\n1,2\n\n   \n3,4\n\n").unwrap();
        assert_eq!(table.columns(), &["a", "b"]);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_parse_keeps_row_of_empty_cells() {
        let table = parse_csv("a,b,c\n1,2,x\n,,\n3,4,y\n").unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.rows()[1].len(), 3);
        assert_eq!(table.rows()[2].get(0), Some(&RawValue::Number(3.0)));
    }

    #[test]
    fn test_parse_rejects_short_row_of_empty_cells() {
        let err = parse_csv("a,b,c\n1,2,x\n,\n3,4,y\n").unwrap_err();
        match err {
            PipelineError::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 3 fields, got 2"));
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_trims_cells() {
        let table = parse_csv(" a , b \n  1 ,  hello world \n").unwrap();
        assert_eq!(table.columns(), &["a", "b"]);
        assert_eq!(table.rows()[0].get(0), Some(&RawValue::Number(1.0)));
        assert_eq!(
            table.rows()[0].get(1),
            Some(&RawValue::Text("hello world".into()))
        );
    }

    #[test]
    fn test_parse_quoted_fields() {
        let table = parse_csv("name,n\n\"Smith, J\",3\n").unwrap();
        assert_eq!(
            table.rows()[0].get(0),
            Some(&RawValue::Text("Smith, J".into()))
        );
    }

    #[test]
    fn test_parse_missing_header() {
        assert!(matches!(
            parse_csv(""),
            Err(PipelineError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_csv("\n  \n"),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_aborts_on_ragged_row() {
        let result = parse_csv("a,b\n1,2\n3\n5,6\n");
        match result {
            Err(PipelineError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 2"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_duplicate_header() {
        let result = parse_csv("a,a\n1,2\n");
        assert!(matches!(result, Err(PipelineError::Parse { .. })));
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse_csv("a,b\n").unwrap();
        assert_eq!(table.n_rows(), 0);
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let table = CsvIngestor::new()
            .with_delimiter(b';')
            .parse_str("a;b\n1;2\n")
            .unwrap();
        assert_eq!(table.rows()[0].get(1), Some(&RawValue::Number(2.0)));
    }

    #[test]
    fn test_parse_reader() {
        let text = "x,y\n1,2\n";
        let table = parse_csv_reader(std::io::Cursor::new(text)).unwrap();
        assert_eq!(table.n_rows(), 1);
    }
}
