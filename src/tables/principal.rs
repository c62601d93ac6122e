// ⭐ Principal city rows (OMB list 2)
// https://www2.census.gov/programs-surveys/metro-micro/geographies/reference-files/2023/delineation-files/list2_2023.xlsx

use super::non_empty;
use crate::error::PipelineResult;
use crate::ids::{normalize_code, CBSA_WIDTH, PLACE_WIDTH, STATE_WIDTH};
use crate::ingest::RawTable;

pub const COL_CBSA_CODE: &str = "CBSA_CODE";
pub const COL_STATE: &str = "FIPS_STATE_CODE";
pub const COL_PLACE: &str = "FIPS_PLACE_CODE";
pub const COL_CITY_NAME: &str = "PRINCIPAL_CITY_NAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalCityRow {
    pub cbsa_code: String,
    /// 7-digit state+place
    pub place_id: String,
    pub city_name: Option<String>,
}

impl PrincipalCityRow {
    pub fn new(cbsa_code: &str, state: &str, place: &str) -> Self {
        PrincipalCityRow {
            cbsa_code: normalize_code(cbsa_code, CBSA_WIDTH),
            place_id: format!(
                "{}{}",
                normalize_code(state, STATE_WIDTH),
                normalize_code(place, PLACE_WIDTH)
            ),
            city_name: None,
        }
    }

    /// Rows whose state or place code does not normalize are dropped
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let cbsa_code = table.column(COL_CBSA_CODE)?;
        let state = table.column(COL_STATE)?;
        let place = table.column(COL_PLACE)?;
        let city_name = table.optional_column(COL_CITY_NAME);

        Ok(table
            .rows()
            .filter(|row| {
                !normalize_code(row.get(state), STATE_WIDTH).is_empty()
                    && !normalize_code(row.get(place), PLACE_WIDTH).is_empty()
            })
            .map(|row| {
                let mut parsed = Self::new(row.get(cbsa_code), row.get(state), row.get(place));
                parsed.city_name = non_empty(row.get_opt(city_name));
                parsed
            })
            .collect())
    }
}
