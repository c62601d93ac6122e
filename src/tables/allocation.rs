// 🧩 Tract → Place allocation rows (GEOCORR)
//
// One row per (tract, place) overlap. A tract split across places has
// several rows; the resolver keeps one.

use super::non_empty;
use crate::error::PipelineResult;
use crate::ids::{
    format_tract, normalize_code, parse_number, prefix, PLACE_WIDTH, STATE_COUNTY_WIDTH, STATE_WIDTH,
};
use crate::ingest::RawTable;

pub const COL_STATE: &str = "STATE_CODE";
pub const COL_COUNTY: &str = "COUNTY_CODE";
pub const COL_TRACT: &str = "TRACT";
pub const COL_PLACE: &str = "PLACE_CODE";
pub const COL_FACTOR: &str = "TRACT_TO_PLACE_ALLOCATION_FACTOR";
pub const COL_PLACE_NAME: &str = "PLACE_NAME";
pub const COL_COUNTY_NAME: &str = "COUNTY_NAME";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceAllocationRow {
    /// 2-digit state code ("" if absent or malformed)
    pub state_code: String,
    /// 5-digit state+county code
    pub county_code: String,
    /// 6-digit tract suffix
    pub tract: String,
    /// 5-digit place code, or NOT_A_PLACE
    pub place_code: String,
    /// Share of the tract's population in this place; None if non-numeric
    pub allocation_factor: Option<f64>,
    pub place_name: Option<String>,
    pub county_name: Option<String>,
}

impl PlaceAllocationRow {
    /// Build a row from raw cells, normalizing every code
    pub fn from_cells(county: &str, tract: &str, place: &str, factor: &str) -> Self {
        let county_code = normalize_code(county, STATE_COUNTY_WIDTH);
        PlaceAllocationRow {
            state_code: prefix(&county_code, STATE_WIDTH).to_string(),
            county_code,
            tract: format_tract(tract),
            place_code: normalize_code(place, PLACE_WIDTH),
            allocation_factor: parse_number(factor),
            place_name: None,
            county_name: None,
        }
    }

    /// 11-digit tract id (2020 numbering)
    pub fn tract_id_2020(&self) -> String {
        format!("{}{}", self.county_code, self.tract)
    }

    /// 7-digit state+place id
    pub fn place_id(&self) -> String {
        format!("{}{}", prefix(&self.county_code, STATE_WIDTH), self.place_code)
    }

    /// True when either half of the tract id failed to normalize
    pub fn has_malformed_id(&self) -> bool {
        self.county_code.is_empty() || self.tract.is_empty()
    }

    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let county = table.column(COL_COUNTY)?;
        let tract = table.column(COL_TRACT)?;
        let place = table.column(COL_PLACE)?;
        let factor = table.column(COL_FACTOR)?;
        let state = table.optional_column(COL_STATE);
        let place_name = table.optional_column(COL_PLACE_NAME);
        let county_name = table.optional_column(COL_COUNTY_NAME);

        Ok(table
            .rows()
            .map(|row| {
                let mut parsed =
                    Self::from_cells(row.get(county), row.get(tract), row.get(place), row.get(factor));
                if let Some(raw_state) = row.get_opt(state) {
                    let state_code = normalize_code(raw_state, STATE_WIDTH);
                    if !state_code.is_empty() {
                        parsed.state_code = state_code;
                    }
                }
                parsed.place_name = non_empty(row.get_opt(place_name));
                parsed.county_name = non_empty(row.get_opt(county_name));
                parsed
            })
            .collect())
    }
}
