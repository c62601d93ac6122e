// 🎯 Tract-Place Resolver - one place allocation per tract
//
// A tract overlapping several places has one allocation row per place.
// Keep the row with the largest allocation factor. This is how a tract that
// is mostly unincorporated ends up as "not a place" even though a real place
// claims a smaller share of it.
//
// Ordering before dedup:
//   1. allocation factor, descending (non-numeric factors last)
//   2. place id, ascending (fixed tie-break for equal factors)
//   3. input order (stable sort)

use crate::error::{PipelineError, PipelineResult};
use crate::ids::NOT_A_PLACE;
use crate::record::{AllocationClass, Stage, TractRecord, TractTable};
use crate::tables::PlaceAllocationRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveReport {
    pub input_rows: usize,
    pub tracts: usize,
    /// Tracts with more than one candidate place
    pub split_tracts: usize,
    pub not_a_place_tracts: usize,
    /// Rows whose county or tract code did not normalize
    pub malformed_ids: usize,
    /// Kept rows with a non-numeric allocation factor (no classification)
    pub unclassified: usize,
}

/// Descending factor, None last, then ascending place id
fn allocation_order(a: &PlaceAllocationRow, b: &PlaceAllocationRow) -> Ordering {
    let by_factor = match (a.allocation_factor, b.allocation_factor) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_factor.then_with(|| a.place_id().cmp(&b.place_id()))
}

/// Turn the kept allocation row into a fresh TractRecord
fn to_record(row: PlaceAllocationRow) -> TractRecord {
    let tract_id_2020 = row.tract_id_2020();
    let place_id = row.place_id();
    TractRecord {
        tract_id_canonical: tract_id_2020.clone(),
        tract_id_2020,
        state_code: row.state_code,
        county_code: row.county_code,
        tract: row.tract,
        place_code: row.place_code,
        place_id,
        place_name: row.place_name,
        county_name: row.county_name,
        allocation_class: AllocationClass::from_factor(row.allocation_factor),
        allocation_factor: row.allocation_factor,
        ..Default::default()
    }
}

/// Resolve raw allocation rows into exactly one TractRecord per 2020 tract id
pub fn resolve(mut rows: Vec<PlaceAllocationRow>) -> PipelineResult<(TractTable, ResolveReport)> {
    let mut report = ResolveReport {
        input_rows: rows.len(),
        malformed_ids: rows.iter().filter(|r| r.has_malformed_id()).count(),
        ..Default::default()
    };

    let mut candidates: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        *candidates.entry(row.tract_id_2020()).or_insert(0) += 1;
    }
    report.split_tracts = candidates.values().filter(|n| **n > 1).count();

    rows.sort_by(allocation_order);

    let mut seen = HashSet::new();
    let mut records: Vec<TractRecord> = rows
        .into_iter()
        .filter(|row| seen.insert(row.tract_id_2020()))
        .map(to_record)
        .collect();
    records.sort_by(|a, b| a.tract_id_2020.cmp(&b.tract_id_2020));

    verify_unique(&records)?;

    report.tracts = records.len();
    report.not_a_place_tracts = records.iter().filter(|r| r.place_code == NOT_A_PLACE).count();
    report.unclassified = records.iter().filter(|r| r.allocation_class.is_none()).count();

    if report.malformed_ids > 0 {
        warn!(rows = report.malformed_ids, "allocation rows with malformed county/tract codes");
    }
    debug!(split = report.split_tracts, "tracts with competing place allocations");
    info!(
        input_rows = report.input_rows,
        tracts = report.tracts,
        not_a_place = report.not_a_place_tracts,
        "resolved place allocations"
    );

    let mut table = TractTable::new(records);
    table.mark_stage(Stage::Resolve);
    Ok((table, report))
}

/// Records must be sorted by tract_id_2020
fn verify_unique(records: &[TractRecord]) -> PipelineResult<()> {
    match records.windows(2).find(|w| w[0].tract_id_2020 == w[1].tract_id_2020) {
        Some(w) => Err(PipelineError::DuplicateTractKey {
            stage: Stage::Resolve.to_string(),
            key: w[0].tract_id_2020.clone(),
        }),
        None => Ok(()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
