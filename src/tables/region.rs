// 🧭 Census Bureau regions and divisions, keyed by state abbreviation

use super::non_empty;
use crate::error::PipelineResult;
use crate::ingest::RawTable;
use crate::record::RegionAttributes;
use crate::states::STATES;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    pub state_abbr: String,
    pub attributes: RegionAttributes,
}

impl RegionRow {
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let abbr = table.column_any(&["STATE_ABBREVIATION", "STATE_ABBR.", "STATE_CODE"])?;
        let region = table.column("REGION")?;
        let division = table.column("DIVISION")?;

        Ok(table
            .rows()
            .filter_map(|row| {
                let state_abbr = row.get(abbr).trim().to_uppercase();
                if state_abbr.is_empty() {
                    return None;
                }
                Some(RegionRow {
                    state_abbr,
                    attributes: RegionAttributes {
                        region: non_empty(Some(row.get(region))),
                        division: non_empty(Some(row.get(division))),
                    },
                })
            })
            .collect())
    }

    /// The fixed Census Bureau assignment, used when no region file is given
    pub fn census_default() -> Vec<Self> {
        STATES
            .iter()
            .filter(|s| s.region.is_some())
            .map(|s| RegionRow {
                state_abbr: s.abbr.to_string(),
                attributes: RegionAttributes {
                    region: s.region.map(str::to_string),
                    division: s.division.map(str::to_string),
                },
            })
            .collect()
    }
}
