// 💾 Output - the finished crosswalk table, CSV/JSON writers, column profile

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

// ============================================================================
// CROSSWALK ROW
// ============================================================================

/// One output row. Column names follow the published file layout; nullable
/// columns are written as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrosswalkRow {
    #[serde(rename = "TRACT22")]
    pub tract22: String,
    #[serde(rename = "TRACT20")]
    pub tract20: String,
    #[serde(rename = "STCNTY22")]
    pub stcnty22: Option<String>,
    #[serde(rename = "PLACE")]
    pub place: String,
    #[serde(rename = "PLACE_CODE")]
    pub place_code: String,
    #[serde(rename = "PLACE_NAME")]
    pub place_name: Option<String>,
    #[serde(rename = "COUNTY_NAME")]
    pub county_name: Option<String>,
    #[serde(rename = "TRACT_TO_PLACE_ALLOCATION_FACTOR")]
    pub allocation_factor: Option<f64>,
    #[serde(rename = "MAJORITY_TYPE")]
    pub majority_type: Option<String>,

    #[serde(rename = "CBSA_CODE")]
    pub cbsa_code: Option<String>,
    #[serde(rename = "METROPOLITAN_DIVISION_CODE")]
    pub metro_division_code: Option<String>,
    #[serde(rename = "CSA_CODE")]
    pub csa_code: Option<String>,
    #[serde(rename = "CBSA_TITLE")]
    pub cbsa_title: Option<String>,
    #[serde(rename = "METROPOLITAN_MICROPOLITAN_STATISTICAL_AREA")]
    pub metro_micro: Option<String>,
    #[serde(rename = "METROPOLITAN_DIVISION_TITLE")]
    pub metro_division_title: Option<String>,
    #[serde(rename = "CSA_TITLE")]
    pub csa_title: Option<String>,
    #[serde(rename = "COUNTY_COUNTY_EQUIVALENT")]
    pub cbsa_county_name: Option<String>,
    #[serde(rename = "CENTRAL_OUTLYING_COUNTY")]
    pub central_outlying_county: Option<String>,

    #[serde(rename = "PRINCIPAL_CITY")]
    pub principal_city: u8,
    #[serde(rename = "CENTRAL_CITY")]
    pub central_city: u8,

    #[serde(rename = "TRACT_POP_20")]
    pub tract_pop_20: Option<u64>,
    #[serde(rename = "SQMI")]
    pub sqmi: Option<f64>,
    #[serde(rename = "POP_SQMI")]
    pub pop_sqmi: Option<f64>,
    #[serde(rename = "CBSA_DISTANCE")]
    pub cbsa_distance: Option<f64>,
    #[serde(rename = "CBSA_PERCENTILE")]
    pub cbsa_percentile: Option<f64>,

    #[serde(rename = "STATE_ABBR")]
    pub state_abbr: Option<String>,
    #[serde(rename = "REGION")]
    pub region: Option<String>,
    #[serde(rename = "DIVISION")]
    pub division: Option<String>,
}

// ============================================================================
// CROSSWALK
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crosswalk {
    rows: Vec<CrosswalkRow>,
}

impl Crosswalk {
    pub fn new(rows: Vec<CrosswalkRow>) -> Self {
        Crosswalk { rows }
    }

    pub fn rows(&self) -> &[CrosswalkRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, tract22: &str) -> Option<&CrosswalkRow> {
        self.rows
            .binary_search_by(|r| r.tract22.as_str().cmp(tract22))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Serialize to CSV bytes (header included even when empty)
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        if self.rows.is_empty() {
            wtr.write_record(column_names())?;
        }
        for row in &self.rows {
            wtr.serialize(row).context("Failed to serialize crosswalk row")?;
        }
        wtr.into_inner().context("Failed to flush CSV writer")
    }

    /// Write the CSV and return the bytes written
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let bytes = self.to_csv_bytes()?;
        fs::write(path.as_ref(), &bytes)
            .with_context(|| format!("Failed to write crosswalk: {:?}", path.as_ref()))?;
        Ok(bytes)
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())
            .with_context(|| format!("Failed to open crosswalk: {:?}", path.as_ref()))?;
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<CrosswalkRow>, _>>()
            .context("Failed to deserialize crosswalk row")?;
        Ok(Crosswalk { rows })
    }
}

/// Output column names, in file order
pub fn column_names() -> Vec<&'static str> {
    vec![
        "TRACT22",
        "TRACT20",
        "STCNTY22",
        "PLACE",
        "PLACE_CODE",
        "PLACE_NAME",
        "COUNTY_NAME",
        "TRACT_TO_PLACE_ALLOCATION_FACTOR",
        "MAJORITY_TYPE",
        "CBSA_CODE",
        "METROPOLITAN_DIVISION_CODE",
        "CSA_CODE",
        "CBSA_TITLE",
        "METROPOLITAN_MICROPOLITAN_STATISTICAL_AREA",
        "METROPOLITAN_DIVISION_TITLE",
        "CSA_TITLE",
        "COUNTY_COUNTY_EQUIVALENT",
        "CENTRAL_OUTLYING_COUNTY",
        "PRINCIPAL_CITY",
        "CENTRAL_CITY",
        "TRACT_POP_20",
        "SQMI",
        "POP_SQMI",
        "CBSA_DISTANCE",
        "CBSA_PERCENTILE",
        "STATE_ABBR",
        "REGION",
        "DIVISION",
    ]
}

/// SHA-256 of the written bytes, hex encoded
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), json)
        .with_context(|| format!("Failed to write JSON: {:?}", path.as_ref()))
}

// ============================================================================
// COLUMN PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub index: usize,
    pub name: String,
    pub nulls: usize,
    pub first_value: Option<String>,
}

impl ColumnProfile {
    pub fn line(&self, name_width: usize) -> String {
        format!(
            "{:02} | {:<width$} | {:<7} | {}",
            self.index,
            self.name,
            self.nulls,
            self.first_value.as_deref().unwrap_or(""),
            width = name_width
        )
    }
}

/// Null count and first value of every output column
pub fn profile(crosswalk: &Crosswalk) -> Result<Vec<ColumnProfile>> {
    let bytes = crosswalk.to_csv_bytes()?;
    let mut rdr = csv::Reader::from_reader(bytes.as_slice());
    let headers = rdr.headers()?.clone();

    let mut profiles: Vec<ColumnProfile> = headers
        .iter()
        .enumerate()
        .map(|(index, name)| ColumnProfile {
            index,
            name: name.to_string(),
            nulls: 0,
            first_value: None,
        })
        .collect();

    for (row_idx, record) in rdr.records().enumerate() {
        let record = record?;
        for (col, value) in record.iter().enumerate() {
            if let Some(p) = profiles.get_mut(col) {
                if value.is_empty() {
                    p.nulls += 1;
                }
                if row_idx == 0 && !value.is_empty() {
                    p.first_value = Some(value.to_string());
                }
            }
        }
    }

    Ok(profiles)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tract22: &str) -> CrosswalkRow {
        CrosswalkRow {
            tract22: tract22.to_string(),
            tract20: tract22.to_string(),
            stcnty22: Some(tract22[..5].to_string()),
            place: "3651000".to_string(),
            place_code: "51000".to_string(),
            place_name: None,
            county_name: None,
            allocation_factor: Some(1.0),
            majority_type: Some("COMPLETE".to_string()),
            cbsa_code: None,
            metro_division_code: None,
            csa_code: None,
            cbsa_title: None,
            metro_micro: None,
            metro_division_title: None,
            csa_title: None,
            cbsa_county_name: None,
            central_outlying_county: None,
            principal_city: 1,
            central_city: 0,
            tract_pop_20: Some(1775),
            sqmi: None,
            pop_sqmi: None,
            cbsa_distance: None,
            cbsa_percentile: None,
            state_abbr: Some("NY".to_string()),
            region: None,
            division: None,
        }
    }

    #[test]
    fn test_csv_header_matches_column_names() {
        let crosswalk = Crosswalk::new(vec![row("36061000100")]);
        let bytes = crosswalk.to_csv_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();

        assert_eq!(header, column_names().join(","));
    }

    #[test]
    fn test_empty_crosswalk_still_has_header() {
        let bytes = Crosswalk::default().to_csv_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("TRACT22,TRACT20"));
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Tract_Where_File.csv");
        let crosswalk = Crosswalk::new(vec![row("01001020100"), row("36061000100")]);

        crosswalk.write_csv(&path).unwrap();
        let read = Crosswalk::read_csv(&path).unwrap();

        assert_eq!(read, crosswalk);
        assert_eq!(read.get("36061000100").unwrap().tract_pop_20, Some(1775));
        assert!(read.get("99999999999").is_none());
    }

    #[test]
    fn test_content_hash_is_stable() {
        let bytes = Crosswalk::new(vec![row("36061000100")]).to_csv_bytes().unwrap();
        assert_eq!(content_hash(&bytes), content_hash(&bytes));
        assert_eq!(content_hash(&bytes).len(), 64);
    }

    #[test]
    fn test_profile_counts_nulls() {
        let mut second = row("36061000200");
        second.tract_pop_20 = None;
        let crosswalk = Crosswalk::new(vec![row("36061000100"), second]);

        let profiles = profile(&crosswalk).unwrap();

        let pop = profiles.iter().find(|p| p.name == "TRACT_POP_20").unwrap();
        assert_eq!(pop.nulls, 1);
        assert_eq!(pop.first_value.as_deref(), Some("1775"));
        let region = profiles.iter().find(|p| p.name == "REGION").unwrap();
        assert_eq!(region.nulls, 2);
        assert_eq!(region.first_value, None);
    }
}
