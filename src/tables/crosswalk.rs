// 🔀 Tract id crosswalk - 2020 numbering → 2022 numbering
// https://github.com/CT-Data-Collaborative/2022-tract-crosswalk

use crate::error::PipelineResult;
use crate::ids::{normalize_code, TRACT_ID_WIDTH};
use crate::ingest::RawTable;

pub const COL_OLD: &str = "TRACT_FIPS_2020";
pub const COL_NEW: &str = "TRACT_FIPS_2022";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TractCrosswalkRow {
    pub tract_2020: String,
    pub tract_2022: String,
}

impl TractCrosswalkRow {
    pub fn new(old: &str, new: &str) -> Self {
        TractCrosswalkRow {
            tract_2020: normalize_code(old, TRACT_ID_WIDTH),
            tract_2022: normalize_code(new, TRACT_ID_WIDTH),
        }
    }

    /// Rows where either id fails to normalize are dropped
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let old = table.column(COL_OLD)?;
        let new = table.column(COL_NEW)?;

        Ok(table
            .rows()
            .map(|row| Self::new(row.get(old), row.get(new)))
            .filter(|row| !row.tract_2020.is_empty() && !row.tract_2022.is_empty())
            .collect())
    }
}
