// 🏙️ CBSA delineation rows (OMB list 1) - one row per county
// https://www2.census.gov/programs-surveys/metro-micro/geographies/reference-files/2023/delineation-files/list1_2023.xlsx

use super::{code_opt, non_empty};
use crate::error::PipelineResult;
use crate::ids::{normalize_code, CBSA_WIDTH, COUNTY_WIDTH, STATE_WIDTH};
use crate::ingest::RawTable;
use crate::record::CbsaAttributes;

pub const COL_CBSA_CODE: &str = "CBSA_CODE";
pub const COL_METRO_DIVISION_CODE: &str = "METROPOLITAN_DIVISION_CODE";
pub const COL_CSA_CODE: &str = "CSA_CODE";
pub const COL_CBSA_TITLE: &str = "CBSA_TITLE";
pub const COL_METRO_MICRO: &str = "METROPOLITAN_MICROPOLITAN_STATISTICAL_AREA";
pub const COL_METRO_DIVISION_TITLE: &str = "METROPOLITAN_DIVISION_TITLE";
pub const COL_CSA_TITLE: &str = "CSA_TITLE";
pub const COL_COUNTY_NAME: &str = "COUNTY_COUNTY_EQUIVALENT";
pub const COL_STATE: &str = "FIPS_STATE_CODE";
pub const COL_COUNTY: &str = "FIPS_COUNTY_CODE";
pub const COL_CENTRAL_OUTLYING: &str = "CENTRAL_OUTLYING_COUNTY";

#[derive(Debug, Clone, PartialEq)]
pub struct CbsaDelineationRow {
    /// 5-digit state+county key ("STCNTY22")
    pub state_county: String,
    pub attributes: CbsaAttributes,
}

impl CbsaDelineationRow {
    /// Footnote rows (no usable state/county/CBSA code) are dropped
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let cbsa_code = table.column(COL_CBSA_CODE)?;
        let state = table.column(COL_STATE)?;
        let county = table.column(COL_COUNTY)?;
        let division_code = table.optional_column(COL_METRO_DIVISION_CODE);
        let csa_code = table.optional_column(COL_CSA_CODE);
        let cbsa_title = table.optional_column(COL_CBSA_TITLE);
        let metro_micro = table.optional_column(COL_METRO_MICRO);
        let division_title = table.optional_column(COL_METRO_DIVISION_TITLE);
        let csa_title = table.optional_column(COL_CSA_TITLE);
        let county_name = table.optional_column(COL_COUNTY_NAME);
        let central_outlying = table.optional_column(COL_CENTRAL_OUTLYING);

        let mut rows = Vec::new();
        for row in table.rows() {
            let state_code = normalize_code(row.get(state), STATE_WIDTH);
            let county_code = normalize_code(row.get(county), COUNTY_WIDTH);
            let code = normalize_code(row.get(cbsa_code), CBSA_WIDTH);
            if state_code.is_empty() || county_code.is_empty() || code.is_empty() {
                continue;
            }

            rows.push(CbsaDelineationRow {
                state_county: format!("{}{}", state_code, county_code),
                attributes: CbsaAttributes {
                    cbsa_code: code,
                    metro_division_code: row
                        .get_opt(division_code)
                        .and_then(|v| code_opt(v, CBSA_WIDTH)),
                    csa_code: row.get_opt(csa_code).and_then(|v| code_opt(v, CBSA_WIDTH)),
                    cbsa_title: non_empty(row.get_opt(cbsa_title)),
                    metro_micro: non_empty(row.get_opt(metro_micro)),
                    metro_division_title: non_empty(row.get_opt(division_title)),
                    csa_title: non_empty(row.get_opt(csa_title)),
                    county_name: non_empty(row.get_opt(county_name)),
                    central_outlying: non_empty(row.get_opt(central_outlying)),
                },
            });
        }

        Ok(rows)
    }
}
