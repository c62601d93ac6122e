// 🔗 Geography Join Engine - one left-join primitive, one small spec per table
//
// Every join:
// - indexes the reference table on its key (conflicting duplicates are fatal)
// - attaches attributes to matching records, leaves the rest as None
// - never changes the number of records: records_mut() hands out a slice,
//   and index_unique guarantees at most one reference row per key
// - is skipped when its attribute group is already attached (re-runnable)

use crate::error::{PipelineError, PipelineResult};
use crate::record::{Stage, TractRecord, TractTable};
use crate::states;
use crate::tables::{AreaDistanceRow, CbsaDelineationRow, RegionRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// ============================================================================
// JOIN SPEC
// ============================================================================

/// What a single left-join needs to know about its reference table
pub trait JoinSpec {
    type Row: PartialEq;

    fn stage(&self) -> Stage;

    /// Key of a tract record, or None if it cannot match anything
    fn record_key(&self, record: &TractRecord) -> Option<String>;

    /// Key of a reference row
    fn reference_key(&self, row: &Self::Row) -> String;

    /// Copy the reference row's attributes onto the record
    fn attach(&self, record: &mut TractRecord, row: &Self::Row);
}

/// CBSA delineation, keyed on state+county of the canonical id
pub struct CbsaJoin;

impl JoinSpec for CbsaJoin {
    type Row = CbsaDelineationRow;

    fn stage(&self) -> Stage {
        Stage::Cbsa
    }

    fn record_key(&self, record: &TractRecord) -> Option<String> {
        Some(record.state_county().to_string())
    }

    fn reference_key(&self, row: &CbsaDelineationRow) -> String {
        row.state_county.clone()
    }

    fn attach(&self, record: &mut TractRecord, row: &CbsaDelineationRow) {
        record.cbsa = Some(row.attributes.clone());
    }
}

/// Area / population / distance, keyed on the full canonical id
pub struct AreaDistanceJoin;

impl JoinSpec for AreaDistanceJoin {
    type Row = AreaDistanceRow;

    fn stage(&self) -> Stage {
        Stage::AreaDistance
    }

    fn record_key(&self, record: &TractRecord) -> Option<String> {
        Some(record.tract_id_canonical.clone())
    }

    fn reference_key(&self, row: &AreaDistanceRow) -> String {
        row.tract_id.clone()
    }

    fn attach(&self, record: &mut TractRecord, row: &AreaDistanceRow) {
        record.area = Some(row.attributes.clone());
    }
}

/// Region / division, keyed on the state abbreviation of the canonical id
pub struct RegionJoin;

impl JoinSpec for RegionJoin {
    type Row = RegionRow;

    fn stage(&self) -> Stage {
        Stage::Region
    }

    fn record_key(&self, record: &TractRecord) -> Option<String> {
        states::abbreviation(record.state_fips()).map(str::to_string)
    }

    fn reference_key(&self, row: &RegionRow) -> String {
        row.state_abbr.clone()
    }

    fn attach(&self, record: &mut TractRecord, row: &RegionRow) {
        record.region = Some(row.attributes.clone());
    }
}

// ============================================================================
// JOIN REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinReport {
    pub stage: Stage,
    pub reference_rows: usize,
    pub rows_before: usize,
    pub rows_after: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// True when the attribute group was already attached
    pub skipped: bool,
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Index reference rows on their key.
///
/// Empty keys are ignored. Identical duplicate rows collapse to one; two
/// different rows under the same key would fan out a left-join, so they are
/// a CardinalityViolation.
pub fn index_unique<'a, R, F>(stage: Stage, rows: &'a [R], key: F) -> PipelineResult<HashMap<String, &'a R>>
where
    R: PartialEq,
    F: Fn(&R) -> String,
{
    let mut groups: HashMap<String, Vec<&'a R>> = HashMap::new();
    for row in rows {
        let k = key(row);
        if k.is_empty() {
            continue;
        }
        groups.entry(k).or_default().push(row);
    }

    let mut index = HashMap::with_capacity(groups.len());
    let mut collapsed = 0;
    for (k, group) in groups {
        let first = group[0];
        if group.iter().any(|row| *row != first) {
            return Err(PipelineError::CardinalityViolation {
                stage: stage.to_string(),
                key: k,
                rows: group.len(),
            });
        }
        collapsed += group.len() - 1;
        index.insert(k, first);
    }

    if collapsed > 0 {
        debug!(stage = %stage, collapsed, "collapsed identical reference rows");
    }

    Ok(index)
}

/// Left-join `reference` onto `table` as described by `spec`
pub fn left_join<S: JoinSpec>(spec: &S, table: &mut TractTable, reference: &[S::Row]) -> PipelineResult<JoinReport> {
    let stage = spec.stage();
    let rows_before = table.len();

    if table.has_stage(stage) {
        info!(stage = %stage, "attributes already attached, skipping join");
        return Ok(JoinReport {
            stage,
            reference_rows: reference.len(),
            rows_before,
            rows_after: rows_before,
            matched: 0,
            unmatched: 0,
            skipped: true,
        });
    }

    let index = index_unique(stage, reference, |row| spec.reference_key(row))?;

    let mut matched = 0;
    for record in table.records_mut() {
        let hit = spec
            .record_key(record)
            .and_then(|key| index.get(&key).copied());
        if let Some(row) = hit {
            spec.attach(record, row);
            matched += 1;
        }
    }

    let rows_after = table.len();
    table.mark_stage(stage);

    let report = JoinReport {
        stage,
        reference_rows: reference.len(),
        rows_before,
        rows_after,
        matched,
        unmatched: rows_after - matched,
        skipped: false,
    };
    info!(
        stage = %stage,
        matched = report.matched,
        unmatched = report.unmatched,
        "left join complete"
    );
    Ok(report)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AreaAttributes, CbsaAttributes, RegionAttributes};
    use proptest::prelude::*;

    fn record(tract_id: &str) -> TractRecord {
        TractRecord {
            tract_id_2020: tract_id.to_string(),
            tract_id_canonical: tract_id.to_string(),
            ..Default::default()
        }
    }

    fn cbsa_row(state_county: &str, cbsa_code: &str) -> CbsaDelineationRow {
        CbsaDelineationRow {
            state_county: state_county.to_string(),
            attributes: CbsaAttributes {
                cbsa_code: cbsa_code.to_string(),
                ..Default::default()
            },
        }
    }

    fn area_row(tract_id: &str, population: u64) -> AreaDistanceRow {
        AreaDistanceRow {
            tract_id: tract_id.to_string(),
            attributes: AreaAttributes {
                population_2020: Some(population),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_cbsa_join_left_semantics() {
        let mut table = TractTable::new(vec![record("36061000100"), record("46013950100")]);
        let reference = vec![cbsa_row("36061", "35620")];

        let report = left_join(&CbsaJoin, &mut table, &reference).unwrap();

        assert_eq!(report.rows_before, 2);
        assert_eq!(report.rows_after, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(table.records()[0].cbsa.as_ref().unwrap().cbsa_code, "35620");
        assert!(table.records()[1].cbsa.is_none());
    }

    #[test]
    fn test_conflicting_reference_rows_are_fatal() {
        let mut table = TractTable::new(vec![record("36061000100")]);
        let reference = vec![cbsa_row("36061", "35620"), cbsa_row("36061", "99999")];

        let err = left_join(&CbsaJoin, &mut table, &reference).unwrap_err();

        assert_eq!(
            err,
            PipelineError::CardinalityViolation {
                stage: "cbsa_join".to_string(),
                key: "36061".to_string(),
                rows: 2,
            }
        );
        assert!(!table.has_stage(Stage::Cbsa));
    }

    #[test]
    fn test_identical_reference_rows_collapse() {
        let mut table = TractTable::new(vec![record("36061000100")]);
        let reference = vec![cbsa_row("36061", "35620"), cbsa_row("36061", "35620")];

        let report = left_join(&CbsaJoin, &mut table, &reference).unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_area_join_is_idempotent() {
        let mut table = TractTable::new(vec![record("01001020100")]);

        let first = left_join(&AreaDistanceJoin, &mut table, &[area_row("01001020100", 1775)]).unwrap();
        let second = left_join(&AreaDistanceJoin, &mut table, &[area_row("01001020100", 9999)]).unwrap();

        assert!(!first.skipped);
        assert!(second.skipped);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.records()[0].area.as_ref().unwrap().population_2020,
            Some(1775)
        );
    }

    #[test]
    fn test_area_join_uses_canonical_id() {
        let mut rec = record("09001010101");
        rec.tract_id_canonical = "09120010101".to_string();
        let mut table = TractTable::new(vec![rec]);

        let report = left_join(
            &AreaDistanceJoin,
            &mut table,
            &[area_row("09001010101", 1), area_row("09120010101", 2)],
        )
        .unwrap();

        assert_eq!(report.matched, 1);
        assert_eq!(table.records()[0].area.as_ref().unwrap().population_2020, Some(2));
    }

    #[test]
    fn test_region_join_by_state_abbreviation() {
        let mut table = TractTable::new(vec![record("09001010101"), record("72001956300")]);
        let reference = vec![RegionRow {
            state_abbr: "CT".to_string(),
            attributes: RegionAttributes {
                region: Some("Northeast".to_string()),
                division: Some("New England".to_string()),
            },
        }];

        let report = left_join(&RegionJoin, &mut table, &reference).unwrap();

        assert_eq!(report.matched, 1);
        let region = table.records()[0].region.as_ref().unwrap();
        assert_eq!(region.division.as_deref(), Some("New England"));
        assert!(table.records()[1].region.is_none());
    }

    proptest! {
        #[test]
        fn prop_join_never_changes_row_count(
            tracts in prop::collection::vec(0u32..50, 0..30),
            counties in prop::collection::hash_set(0u32..10, 0..10),
        ) {
            let records: Vec<_> = tracts
                .iter()
                .map(|t| record(&format!("01{:03}{:06}", t % 10, t)))
                .collect();
            let reference: Vec<_> = counties
                .iter()
                .map(|c| cbsa_row(&format!("01{:03}", c), "10000"))
                .collect();
            let mut table = TractTable::new(records);
            let before = table.len();

            let report = left_join(&CbsaJoin, &mut table, &reference).unwrap();

            prop_assert_eq!(table.len(), before);
            prop_assert_eq!(report.matched + report.unmatched, before);
        }
    }
}
