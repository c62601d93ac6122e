// 📐 Tract land area, 2020 population and distance to the CBSA center
//
// Distance is measured from the tract to the central city's city hall.

use crate::error::PipelineResult;
use crate::ids::{normalize_dotted_code, parse_number, TRACT_ID_WIDTH};
use crate::ingest::RawTable;
use crate::record::AreaAttributes;

pub const COL_FIPS: &str = "FIPS";
pub const COL_POPULATION: &str = "POPULATION";
pub const COL_SQMI: &str = "SQMI";
pub const COL_POP_SQMI: &str = "POP_SQMI";
pub const COL_DISTANCE: &str = "CBSA_DISTANCE";
pub const COL_PERCENTILE: &str = "CBSA_PERCENTILE";

#[derive(Debug, Clone, PartialEq)]
pub struct AreaDistanceRow {
    /// 11-digit tract id
    pub tract_id: String,
    pub attributes: AreaAttributes,
}

impl AreaDistanceRow {
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let fips = table.column(COL_FIPS)?;
        let population = table.column(COL_POPULATION)?;
        let sqmi = table.column(COL_SQMI)?;
        let pop_sqmi = table.column(COL_POP_SQMI)?;
        let distance = table.column(COL_DISTANCE)?;
        let percentile = table.column(COL_PERCENTILE)?;

        Ok(table
            .rows()
            .filter_map(|row| {
                let tract_id = normalize_dotted_code(row.get(fips), TRACT_ID_WIDTH);
                if tract_id.is_empty() {
                    return None;
                }
                Some(AreaDistanceRow {
                    tract_id,
                    attributes: AreaAttributes {
                        population_2020: parse_number(row.get(population))
                            .filter(|v| *v >= 0.0)
                            .map(|v| v.round() as u64),
                        area_sq_mi: parse_number(row.get(sqmi)),
                        pop_density: parse_number(row.get(pop_sqmi)),
                        distance_to_cbsa_center: parse_number(row.get(distance)),
                        distance_percentile: parse_number(row.get(percentile)),
                    },
                })
            })
            .collect())
    }
}
