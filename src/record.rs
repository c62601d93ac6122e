// 🧱 Tract Record - one row per canonical tract
//
// Created by the resolver, widened by every later stage (attributes filled
// in, never rows removed), finalized by the assembler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// ALLOCATION CLASS
// ============================================================================

/// How strongly a tract belongs to its resolved place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationClass {
    /// factor == 1.0
    Complete,
    /// factor > 0.66
    Supermajority,
    /// factor > 0.5
    Majority,
    /// everything else
    Plurality,
}

impl AllocationClass {
    /// Classify an allocation factor. None (non-numeric input) stays None.
    pub fn from_factor(factor: Option<f64>) -> Option<Self> {
        let value = factor?;
        if value.is_nan() {
            return None;
        }
        Some(if value == 1.0 {
            AllocationClass::Complete
        } else if value > 0.66 {
            AllocationClass::Supermajority
        } else if value > 0.5 {
            AllocationClass::Majority
        } else {
            AllocationClass::Plurality
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationClass::Complete => "COMPLETE",
            AllocationClass::Supermajority => "SUPERMAJORITY",
            AllocationClass::Majority => "MAJORITY",
            AllocationClass::Plurality => "PLURALITY",
        }
    }
}

impl fmt::Display for AllocationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ATTRIBUTE GROUPS (filled in by the join stages)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CbsaAttributes {
    pub cbsa_code: String,
    pub metro_division_code: Option<String>,
    pub csa_code: Option<String>,
    pub cbsa_title: Option<String>,
    /// "Metropolitan Statistical Area" / "Micropolitan Statistical Area"
    pub metro_micro: Option<String>,
    pub metro_division_title: Option<String>,
    pub csa_title: Option<String>,
    pub county_name: Option<String>,
    /// "Central" / "Outlying"
    pub central_outlying: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaAttributes {
    pub population_2020: Option<u64>,
    pub area_sq_mi: Option<f64>,
    pub pop_density: Option<f64>,
    pub distance_to_cbsa_center: Option<f64>,
    pub distance_percentile: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionAttributes {
    pub region: Option<String>,
    pub division: Option<String>,
}

// ============================================================================
// TRACT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TractRecord {
    /// 11-digit state+county+tract, 2020 numbering
    pub tract_id_2020: String,
    /// Join and sort key from the CBSA join onward ("TRACT22")
    pub tract_id_canonical: String,

    // Provenance, dropped by the assembler
    pub state_code: String,
    pub county_code: String,
    pub tract: String,

    /// 5-digit place code or NOT_A_PLACE
    pub place_code: String,
    /// 7-digit state+place
    pub place_id: String,
    pub place_name: Option<String>,
    pub county_name: Option<String>,

    pub allocation_factor: Option<f64>,
    pub allocation_class: Option<AllocationClass>,

    pub cbsa: Option<CbsaAttributes>,
    pub is_principal_city: bool,
    pub is_central_city: bool,
    pub area: Option<AreaAttributes>,
    pub region: Option<RegionAttributes>,
}

impl TractRecord {
    /// 2-digit state prefix of the canonical id
    pub fn state_fips(&self) -> &str {
        crate::ids::prefix(&self.tract_id_canonical, crate::ids::STATE_WIDTH)
    }

    /// 5-digit state+county prefix of the canonical id
    pub fn state_county(&self) -> &str {
        crate::ids::prefix(&self.tract_id_canonical, crate::ids::STATE_COUNTY_WIDTH)
    }
}

// ============================================================================
// STAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Resolve,
    Translate,
    Cbsa,
    PrincipalCity,
    CentralCity,
    AreaDistance,
    Region,
    Assemble,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Resolve => "resolve",
            Stage::Translate => "translate",
            Stage::Cbsa => "cbsa_join",
            Stage::PrincipalCity => "principal_city",
            Stage::CentralCity => "central_city",
            Stage::AreaDistance => "area_distance_join",
            Stage::Region => "region_join",
            Stage::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TRACT TABLE
// ============================================================================

/// The single table threaded through the pipeline. Each stage takes it by
/// `&mut`, and records which attribute groups it has attached.
#[derive(Debug, Clone, Default)]
pub struct TractTable {
    records: Vec<TractRecord>,
    applied: BTreeSet<Stage>,
}

impl TractTable {
    pub fn new(records: Vec<TractRecord>) -> Self {
        TractTable {
            records,
            applied: BTreeSet::new(),
        }
    }

    pub fn records(&self) -> &[TractRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TractRecord] {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<TractRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.applied.contains(&stage)
    }

    pub fn mark_stage(&mut self, stage: Stage) {
        self.applied.insert(stage);
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.applied.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_class_boundaries() {
        assert_eq!(AllocationClass::from_factor(Some(1.0)), Some(AllocationClass::Complete));
        assert_eq!(AllocationClass::from_factor(Some(0.67)), Some(AllocationClass::Supermajority));
        assert_eq!(AllocationClass::from_factor(Some(0.66)), Some(AllocationClass::Majority));
        assert_eq!(AllocationClass::from_factor(Some(0.55)), Some(AllocationClass::Majority));
        assert_eq!(AllocationClass::from_factor(Some(0.5)), Some(AllocationClass::Plurality));
        assert_eq!(AllocationClass::from_factor(Some(0.0)), Some(AllocationClass::Plurality));
        assert_eq!(AllocationClass::from_factor(None), None);
        assert_eq!(AllocationClass::from_factor(Some(f64::NAN)), None);
    }

    #[test]
    fn test_record_prefixes() {
        let record = TractRecord {
            tract_id_canonical: "09110010100".to_string(),
            ..Default::default()
        };
        assert_eq!(record.state_fips(), "09");
        assert_eq!(record.state_county(), "09110");
    }

    #[test]
    fn test_stage_markers() {
        let mut table = TractTable::new(vec![TractRecord::default()]);
        assert!(!table.has_stage(Stage::AreaDistance));
        table.mark_stage(Stage::AreaDistance);
        assert!(table.has_stage(Stage::AreaDistance));
        assert_eq!(table.stages().collect::<Vec<_>>(), vec![Stage::AreaDistance]);
    }
}
