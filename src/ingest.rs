// 📥 Reference Table Ingestion - CSV → header-normalized string table
//
// Every reference file goes through the same door: leading junk rows are
// skipped, the header row is normalized (see ids::normalize_header), and each
// cell is kept as a string. Typed parsing happens in tables/*, per table.

use crate::error::{PipelineError, PipelineResult};
use crate::ids::normalize_header;
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

// ============================================================================
// RAW TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Name used in error messages and logs
    pub name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One row of a RawTable; missing trailing cells read as ""
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    pub fn get(&self, idx: usize) -> &'a str {
        self.cells.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn get_opt(&self, idx: Option<usize>) -> Option<&'a str> {
        idx.map(|i| self.get(i)).filter(|v| !v.trim().is_empty())
    }
}

impl RawTable {
    /// Load a CSV file, skipping `skip_rows` records before the header row
    pub fn from_path<P: AsRef<Path>>(name: &str, path: P, skip_rows: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open {} table: {:?}", name, path))?;
        Self::from_reader(name, file, skip_rows)
            .with_context(|| format!("Failed to read {} table: {:?}", name, path))
    }

    /// Parse CSV from any reader (files, in-memory fixtures)
    pub fn from_reader<R: Read>(name: &str, reader: R, skip_rows: usize) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = rdr.byte_records();

        for _ in 0..skip_rows {
            if records.next().transpose().context("Failed to read CSV record")?.is_none() {
                break;
            }
        }

        let headers: Vec<String> = match records.next().transpose().context("Failed to read CSV header")? {
            Some(record) => record
                .iter()
                .map(|field| normalize_header(decode_field(field).trim_start_matches('\u{feff}')))
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for result in records {
            let record = result.context("Failed to read CSV record")?;
            let cells: Vec<String> = record.iter().map(decode_field).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            rows.push(cells);
        }

        Ok(RawTable {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Build a table from literal rows (headers are normalized like a file's)
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        RawTable {
            name: name.to_string(),
            headers: headers.iter().map(|h| normalize_header(h)).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(|cells| RawRow { cells })
    }

    /// Index of a required column (name is normalized before lookup)
    pub fn column(&self, name: &str) -> PipelineResult<usize> {
        self.optional_column(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: normalize_header(name),
            })
    }

    /// Index of the first of several accepted spellings of a column
    pub fn column_any(&self, names: &[&str]) -> PipelineResult<usize> {
        names
            .iter()
            .find_map(|n| self.optional_column(n))
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: normalize_header(names.first().copied().unwrap_or_default()),
            })
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.headers.iter().position(|h| *h == wanted)
    }

    /// Replace the header row positionally (for sheets whose own headers
    /// span several rows and are unusable)
    pub fn rename_positional(&mut self, names: &[&str]) {
        for (idx, name) in names.iter().enumerate() {
            let normalized = normalize_header(name);
            match self.headers.get_mut(idx) {
                Some(header) => *header = normalized,
                None => self.headers.push(normalized),
            }
        }
    }
}

/// Decode one CSV field: UTF-8 if valid, else Latin-1 byte-for-char
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_leading_rows_and_normalizes_headers() {
        let data = "county,tract,place,afact\n\
                    County code,Tract,Place code,tract-to-place allocation factor\n\
                    09001,0101.00,08070,1\n";

        let table = RawTable::from_reader("allocation", data.as_bytes(), 1).unwrap();

        assert_eq!(
            table.headers(),
            &["COUNTY_CODE", "TRACT", "PLACE_CODE", "TRACT_TO_PLACE_ALLOCATION_FACTOR"]
        );
        assert_eq!(table.len(), 1);
        let idx = table.column("tract-to-place allocation factor").unwrap();
        assert_eq!(table.rows().next().unwrap().get(idx), "1");
    }

    #[test]
    fn test_latin1_fallback() {
        let mut data = b"Place name\n".to_vec();
        data.extend_from_slice(b"Espa\xf1ola\n");

        let table = RawTable::from_reader("places", data.as_slice(), 0).unwrap();
        assert_eq!(table.rows().next().unwrap().get(0), "Española");
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = RawTable::from_rows("regions", &["State"], &[&["CT"]]);
        let err = table.column("Region").unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingColumn {
                table: "regions".to_string(),
                column: "REGION".to_string(),
            }
        );
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let data = "A,B,C\n1,2\n,,\n4,5,6\n";
        let table = RawTable::from_reader("t", data.as_bytes(), 0).unwrap();

        assert_eq!(table.len(), 2);
        let first = table.rows().next().unwrap();
        assert_eq!(first.get(2), "");
        assert_eq!(first.get_opt(Some(2)), None);
        assert_eq!(first.get_opt(Some(1)), Some("2"));
    }

    #[test]
    fn test_rename_positional() {
        let mut table = RawTable::from_rows("central", &["Unnamed: 0", "x"], &[&["1", "2", "3"]]);
        table.rename_positional(&["CBSA_CODE", "PLACE", "METRO_AREA"]);
        assert_eq!(table.headers(), &["CBSA_CODE", "PLACE", "METRO_AREA"]);
        assert_eq!(table.column("METRO_AREA").unwrap(), 2);
    }
}
