// 🏛️ Principal / Central City Classifier
//
// principal city: the tract's place is in the OMB principal-city list
// central city:   the tract's place is THE city-hall city of its CBSA
//                 (e.g. Washington, DC but not Arlington, VA)
//
// Central is a refinement of principal. The two reference tables draw place
// boundaries from different vintages, so a handful of tracts match the
// central-city table without matching the principal-city list. Those rows
// are forced back to not-central by the correction rule below.

use crate::error::{PipelineError, PipelineResult};
use crate::record::{Stage, TractRecord, TractTable};
use crate::tables::{CentralCityRow, PrincipalCityRow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Flipped rows the source vintage is known to produce (2023 delineation
/// against the 2010 city-hall table)
pub const DEFAULT_ANOMALY_LIMIT: usize = 35;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyReport {
    pub principal_city_tracts: usize,
    pub central_city_tracts: usize,
    /// Rows the central-city correction flipped to false
    pub central_city_corrections: usize,
}

/// Mark tracts whose place is a principal city
pub fn classify_principal(table: &mut TractTable, principal_cities: &[PrincipalCityRow]) -> usize {
    let places: HashSet<&str> = principal_cities.iter().map(|r| r.place_id.as_str()).collect();

    let mut count = 0;
    for record in table.records_mut() {
        record.is_principal_city = places.contains(record.place_id.as_str());
        if record.is_principal_city {
            count += 1;
        }
    }

    table.mark_stage(Stage::PrincipalCity);
    info!(tracts = count, "principal city tracts");
    count
}

/// Central-city correction: a central city must also be a principal city.
/// Returns true when the record was flipped.
pub fn correct_central_city(record: &mut TractRecord) -> bool {
    if record.is_central_city && !record.is_principal_city {
        record.is_central_city = false;
        return true;
    }
    false
}

/// Mark tracts whose place is the central city of a CBSA. Requires
/// classify_principal to have run. Fails when the correction flips more
/// rows than `anomaly_limit`.
pub fn classify_central(
    table: &mut TractTable,
    central_cities: &[CentralCityRow],
    anomaly_limit: Option<usize>,
) -> PipelineResult<(usize, usize)> {
    if !table.has_stage(Stage::PrincipalCity) {
        return Err(PipelineError::StageOrder {
            stage: Stage::CentralCity.to_string(),
            requires: Stage::PrincipalCity.to_string(),
        });
    }

    let places: HashSet<&str> = central_cities.iter().map(|r| r.place_id.as_str()).collect();

    let mut central = 0;
    let mut corrected = 0;
    for record in table.records_mut() {
        record.is_central_city = places.contains(record.place_id.as_str());
        if correct_central_city(record) {
            corrected += 1;
        }
        if record.is_central_city {
            central += 1;
        }
    }

    if corrected > 0 {
        warn!(
            tracts = corrected,
            "central-city matches outside the principal-city list forced to false"
        );
    }
    if let Some(limit) = anomaly_limit {
        if corrected > limit {
            return Err(PipelineError::AnomalyLimitExceeded {
                found: corrected,
                limit,
            });
        }
    }

    table.mark_stage(Stage::CentralCity);
    info!(tracts = central, "central city tracts");
    Ok((central, corrected))
}

/// Run both steps and collect their counts
pub fn classify(
    table: &mut TractTable,
    principal_cities: &[PrincipalCityRow],
    central_cities: &[CentralCityRow],
    anomaly_limit: Option<usize>,
) -> PipelineResult<ClassifyReport> {
    let principal_city_tracts = classify_principal(table, principal_cities);
    let (central_city_tracts, central_city_corrections) =
        classify_central(table, central_cities, anomaly_limit)?;

    Ok(ClassifyReport {
        principal_city_tracts,
        central_city_tracts,
        central_city_corrections,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(place_id: &str) -> TractRecord {
        TractRecord {
            place_id: place_id.to_string(),
            ..Default::default()
        }
    }

    fn principal(place_id: &str) -> PrincipalCityRow {
        PrincipalCityRow {
            cbsa_code: "47900".to_string(),
            place_id: place_id.to_string(),
            city_name: None,
        }
    }

    fn central(place_id: &str) -> CentralCityRow {
        CentralCityRow {
            cbsa_code: "47900".to_string(),
            place_id: place_id.to_string(),
            metro_area: None,
            latitude: 38.895,
            longitude: Some(-77.031),
        }
    }

    #[test]
    fn test_principal_and_central() {
        // Washington DC, Arlington VA, unincorporated
        let mut table = TractTable::new(vec![record("1150000"), record("5103000"), record("5199999")]);

        let report = classify(
            &mut table,
            &[principal("1150000"), principal("5103000")],
            &[central("1150000")],
            None,
        )
        .unwrap();

        let rows = table.records();
        assert!(rows[0].is_principal_city && rows[0].is_central_city);
        assert!(rows[1].is_principal_city && !rows[1].is_central_city);
        assert!(!rows[2].is_principal_city && !rows[2].is_central_city);
        assert_eq!(report.principal_city_tracts, 2);
        assert_eq!(report.central_city_tracts, 1);
        assert_eq!(report.central_city_corrections, 0);
    }

    #[test]
    fn test_central_without_principal_is_corrected() {
        let mut table = TractTable::new(vec![record("3451000")]);

        let report = classify(&mut table, &[], &[central("3451000")], None).unwrap();

        assert!(!table.records()[0].is_central_city);
        assert_eq!(report.central_city_corrections, 1);
        assert_eq!(report.central_city_tracts, 0);
    }

    #[test]
    fn test_correction_rule() {
        let mut rec = record("3451000");
        rec.is_central_city = true;
        assert!(correct_central_city(&mut rec));
        assert!(!rec.is_central_city);

        let mut rec = record("3651000");
        rec.is_central_city = true;
        rec.is_principal_city = true;
        assert!(!correct_central_city(&mut rec));
        assert!(rec.is_central_city);
    }

    #[test]
    fn test_anomaly_limit_exceeded() {
        let mut table = TractTable::new(vec![record("3451000"), record("3451000"), record("3451000")]);

        let err = classify(&mut table, &[], &[central("3451000")], Some(2)).unwrap_err();

        assert_eq!(err, PipelineError::AnomalyLimitExceeded { found: 3, limit: 2 });
    }

    #[test]
    fn test_central_requires_principal_stage() {
        let mut table = TractTable::new(vec![record("1150000")]);
        let err = classify_central(&mut table, &[central("1150000")], None).unwrap_err();
        assert!(matches!(err, PipelineError::StageOrder { .. }));
    }

    proptest! {
        #[test]
        fn prop_central_implies_principal(
            places in prop::collection::vec(0u32..20, 0..40),
            principal_set in prop::collection::vec(0u32..20, 0..10),
            central_set in prop::collection::vec(0u32..20, 0..10),
        ) {
            let mut table = TractTable::new(
                places.iter().map(|p| record(&format!("{:07}", p))).collect(),
            );
            let principals: Vec<_> = principal_set.iter().map(|p| principal(&format!("{:07}", p))).collect();
            let centrals: Vec<_> = central_set.iter().map(|p| central(&format!("{:07}", p))).collect();

            classify(&mut table, &principals, &centrals, None).unwrap();

            for rec in table.records() {
                prop_assert!(!rec.is_central_city || rec.is_principal_city);
            }
        }
    }
}
