// 📦 Output Assembler - sort, prune, guarantee one row per canonical tract

use crate::error::{PipelineError, PipelineResult};
use crate::output::{Crosswalk, CrosswalkRow};
use crate::record::{Stage, TractRecord, TractTable};
use crate::states;
use tracing::info;

impl From<TractRecord> for CrosswalkRow {
    fn from(record: TractRecord) -> Self {
        let state_abbr = states::abbreviation(record.state_fips()).map(str::to_string);
        let state_county = Some(record.state_county().to_string()).filter(|s| !s.is_empty());
        let cbsa = record.cbsa.unwrap_or_default();
        let area = record.area.unwrap_or_default();
        let region = record.region.unwrap_or_default();

        CrosswalkRow {
            tract22: record.tract_id_canonical,
            tract20: record.tract_id_2020,
            stcnty22: state_county,
            place: record.place_id,
            place_code: record.place_code,
            place_name: record.place_name,
            county_name: record.county_name,
            allocation_factor: record.allocation_factor,
            majority_type: record.allocation_class.map(|c| c.as_str().to_string()),
            cbsa_code: Some(cbsa.cbsa_code).filter(|c| !c.is_empty()),
            metro_division_code: cbsa.metro_division_code,
            csa_code: cbsa.csa_code,
            cbsa_title: cbsa.cbsa_title,
            metro_micro: cbsa.metro_micro,
            metro_division_title: cbsa.metro_division_title,
            csa_title: cbsa.csa_title,
            cbsa_county_name: cbsa.county_name,
            central_outlying_county: cbsa.central_outlying,
            principal_city: u8::from(record.is_principal_city),
            central_city: u8::from(record.is_central_city),
            tract_pop_20: area.population_2020,
            sqmi: area.area_sq_mi,
            pop_sqmi: area.pop_density,
            cbsa_distance: area.distance_to_cbsa_center,
            cbsa_percentile: area.distance_percentile,
            state_abbr,
            region: region.region,
            division: region.division,
        }
    }
}

/// Sort by canonical id, drop provenance columns, reject duplicate keys
pub fn assemble(table: TractTable) -> PipelineResult<Crosswalk> {
    let mut records = table.into_records();
    records.sort_by(|a, b| {
        a.tract_id_canonical
            .cmp(&b.tract_id_canonical)
            .then_with(|| a.tract_id_2020.cmp(&b.tract_id_2020))
    });

    if let Some(w) = records
        .windows(2)
        .find(|w| w[0].tract_id_canonical == w[1].tract_id_canonical)
    {
        return Err(PipelineError::DuplicateTractKey {
            stage: Stage::Assemble.to_string(),
            key: w[0].tract_id_canonical.clone(),
        });
    }

    let rows: Vec<CrosswalkRow> = records.into_iter().map(CrosswalkRow::from).collect();
    info!(rows = rows.len(), "assembled crosswalk");
    Ok(Crosswalk::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AllocationClass, CbsaAttributes};

    fn record(tract_2020: &str, canonical: &str) -> TractRecord {
        TractRecord {
            tract_id_2020: tract_2020.to_string(),
            tract_id_canonical: canonical.to_string(),
            state_code: canonical[..2].to_string(),
            county_code: canonical[..5].to_string(),
            tract: canonical[5..].to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sorted_by_canonical_id() {
        let table = TractTable::new(vec![
            record("36061000100", "36061000100"),
            record("09001010101", "09120010101"),
            record("01001020100", "01001020100"),
        ]);

        let crosswalk = assemble(table).unwrap();

        let keys: Vec<_> = crosswalk.rows().iter().map(|r| r.tract22.as_str()).collect();
        assert_eq!(keys, vec!["01001020100", "09120010101", "36061000100"]);
        assert_eq!(crosswalk.rows()[1].tract20, "09001010101");
        assert_eq!(crosswalk.rows()[1].stcnty22.as_deref(), Some("09120"));
    }

    #[test]
    fn test_duplicate_canonical_ids_are_rejected() {
        let table = TractTable::new(vec![
            record("09001010101", "09120010101"),
            record("09001010102", "09120010101"),
        ]);

        let err = assemble(table).unwrap_err();

        assert_eq!(
            err,
            PipelineError::DuplicateTractKey {
                stage: "assemble".to_string(),
                key: "09120010101".to_string(),
            }
        );
    }

    #[test]
    fn test_row_conversion() {
        let mut rec = record("36061000100", "36061000100");
        rec.place_id = "3651000".to_string();
        rec.place_code = "51000".to_string();
        rec.allocation_factor = Some(1.0);
        rec.allocation_class = Some(AllocationClass::Complete);
        rec.is_principal_city = true;
        rec.cbsa = Some(CbsaAttributes {
            cbsa_code: "35620".to_string(),
            ..Default::default()
        });

        let row = CrosswalkRow::from(rec);

        assert_eq!(row.majority_type.as_deref(), Some("COMPLETE"));
        assert_eq!(row.principal_city, 1);
        assert_eq!(row.central_city, 0);
        assert_eq!(row.cbsa_code.as_deref(), Some("35620"));
        assert_eq!(row.state_abbr.as_deref(), Some("NY"));
        assert_eq!(row.region, None);
        assert_eq!(row.tract_pop_20, None);
    }
}
