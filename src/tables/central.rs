// 📍 Central city rows - principal cities with a city hall coordinate
//
// The source sheet ("Principal Cities" in the 2010 Census special report
// c2010sr-01) has a multi-row header, so columns are named by position.
// https://www.census.gov/library/publications/2012/dec/c2010sr-01.html

use super::non_empty;
use crate::error::PipelineResult;
use crate::ids::{normalize_code, normalize_dotted_code, parse_number, CBSA_WIDTH, STATE_PLACE_WIDTH};
use crate::ingest::RawTable;

/// Positional column names of the sheet
pub const COLUMNS: [&str; 7] = ["CBSA_CODE", "PLACE", "METRO_AREA", "POP_10", "POP_00", "LAT", "LON"];

#[derive(Debug, Clone, PartialEq)]
pub struct CentralCityRow {
    pub cbsa_code: String,
    /// 7-digit state+place
    pub place_id: String,
    pub metro_area: Option<String>,
    pub latitude: f64,
    pub longitude: Option<f64>,
}

impl CentralCityRow {
    /// Name the columns positionally, then keep rows with a usable place id
    /// and a numeric latitude
    pub fn from_raw(table: &RawTable) -> PipelineResult<Vec<Self>> {
        let mut table = table.clone();
        table.rename_positional(&COLUMNS);

        let cbsa_code = table.column("CBSA_CODE")?;
        let place = table.column("PLACE")?;
        let metro_area = table.column("METRO_AREA")?;
        let lat = table.column("LAT")?;
        let lon = table.column("LON")?;

        Ok(table
            .rows()
            .filter_map(|row| {
                let latitude = parse_number(row.get(lat))?;
                let place_id = normalize_dotted_code(row.get(place), STATE_PLACE_WIDTH);
                if place_id.is_empty() {
                    return None;
                }
                Some(CentralCityRow {
                    cbsa_code: normalize_code(row.get(cbsa_code), CBSA_WIDTH),
                    place_id,
                    metro_area: non_empty(Some(row.get(metro_area))),
                    latitude,
                    longitude: parse_number(row.get(lon)),
                })
            })
            .collect())
    }
}
