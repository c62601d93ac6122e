// 🔀 Identifier Epoch Translator - 2020 tract ids → current numbering
//
// Connecticut replaced its 8 counties with 9 planning regions in 2022, which
// renumbered every tract in the state. Tracts with the translator's state
// prefix are looked up in the crosswalk; everything else passes through.
// Unmapped ids in the state fall back to their 2020 value.

use crate::error::PipelineResult;
use crate::join::index_unique;
use crate::record::{Stage, TractTable};
use crate::tables::TractCrosswalkRow;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, info};

/// State whose tracts were renumbered mid-decade (Connecticut)
pub const DEFAULT_STATE_PREFIX: &str = "09";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateReport {
    /// Tracts with the translator's state prefix
    pub in_scope: usize,
    pub remapped: usize,
    /// In-scope tracts missing from the crosswalk (kept as-is)
    pub unmapped: usize,
}

#[derive(Debug, Clone)]
pub struct EpochTranslator {
    state_prefix: String,
    mapping: HashMap<String, String>,
}

impl EpochTranslator {
    /// Build from crosswalk rows. Rows outside `state_prefix` are never
    /// looked up and are ignored. An in-scope old id mapped to two different
    /// new ids is a CardinalityViolation.
    pub fn new(state_prefix: &str, rows: &[TractCrosswalkRow]) -> PipelineResult<Self> {
        let in_scope: Vec<TractCrosswalkRow> = rows
            .iter()
            .filter(|row| row.tract_2020.starts_with(state_prefix))
            .cloned()
            .collect();
        if in_scope.len() < rows.len() {
            debug!(
                state_prefix,
                ignored = rows.len() - in_scope.len(),
                "crosswalk rows outside the translated state"
            );
        }

        let mapping = index_unique(Stage::Translate, &in_scope, |row| row.tract_2020.clone())?
            .into_iter()
            .map(|(old, row)| (old, row.tract_2022.clone()))
            .collect();

        Ok(EpochTranslator {
            state_prefix: state_prefix.to_string(),
            mapping,
        })
    }

    pub fn state_prefix(&self) -> &str {
        &self.state_prefix
    }

    pub fn in_scope(&self, tract_id: &str) -> bool {
        tract_id.starts_with(&self.state_prefix)
    }

    /// Translate one id. Total: never fails, never drops.
    pub fn translate<'a>(&'a self, tract_id: &'a str) -> Cow<'a, str> {
        if !self.in_scope(tract_id) {
            return Cow::Borrowed(tract_id);
        }
        match self.mapping.get(tract_id) {
            Some(new_id) => Cow::Borrowed(new_id.as_str()),
            None => Cow::Borrowed(tract_id),
        }
    }

    /// Set tract_id_canonical on every record from its tract_id_2020
    pub fn apply(&self, table: &mut TractTable) -> TranslateReport {
        let mut report = TranslateReport::default();

        for record in table.records_mut() {
            let in_scope = self.in_scope(&record.tract_id_2020);
            let canonical = self.translate(&record.tract_id_2020).into_owned();

            if in_scope {
                report.in_scope += 1;
                if canonical != record.tract_id_2020 {
                    report.remapped += 1;
                } else {
                    report.unmapped += 1;
                }
            }
            record.tract_id_canonical = canonical;
        }

        table.mark_stage(Stage::Translate);

        if report.unmapped > 0 {
            debug!(
                state_prefix = %self.state_prefix,
                unmapped = report.unmapped,
                "tracts not in crosswalk kept their 2020 id"
            );
        }
        info!(
            in_scope = report.in_scope,
            remapped = report.remapped,
            "translated tract ids"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::record::TractRecord;
    use proptest::prelude::*;

    fn translator() -> EpochTranslator {
        EpochTranslator::new(
            DEFAULT_STATE_PREFIX,
            &[
                TractCrosswalkRow::new("09001010101", "09120010101"),
                TractCrosswalkRow::new("36061000100", "36999999999"),
            ],
        )
        .unwrap()
    }

    fn record(tract_id: &str) -> TractRecord {
        TractRecord {
            tract_id_2020: tract_id.to_string(),
            tract_id_canonical: tract_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mapped_tract_is_remapped() {
        assert_eq!(translator().translate("09001010101"), "09120010101");
    }

    #[test]
    fn test_unmapped_tract_in_state_passes_through() {
        assert_eq!(translator().translate("09001999999"), "09001999999");
    }

    #[test]
    fn test_other_states_ignore_crosswalk() {
        // Present in the crosswalk, but not in the translator's state
        assert_eq!(translator().translate("36061000100"), "36061000100");
    }

    #[test]
    fn test_apply_reports_and_keeps_rows() {
        let mut table = TractTable::new(vec![
            record("09001010101"),
            record("09001999999"),
            record("36061000100"),
        ]);

        let report = translator().apply(&mut table);

        assert_eq!(table.len(), 3);
        assert_eq!(report.in_scope, 2);
        assert_eq!(report.remapped, 1);
        assert_eq!(report.unmapped, 1);
        assert_eq!(table.records()[0].tract_id_canonical, "09120010101");
        assert_eq!(table.records()[0].tract_id_2020, "09001010101");
        assert!(table.has_stage(Stage::Translate));
    }

    #[test]
    fn test_conflicting_crosswalk_rows_are_rejected() {
        let err = EpochTranslator::new(
            DEFAULT_STATE_PREFIX,
            &[
                TractCrosswalkRow::new("09001010101", "09120010101"),
                TractCrosswalkRow::new("09001010101", "09120010102"),
            ],
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::CardinalityViolation { .. }));
    }

    #[test]
    fn test_conflicts_outside_state_are_ignored() {
        let t = EpochTranslator::new(
            DEFAULT_STATE_PREFIX,
            &[
                TractCrosswalkRow::new("09001010101", "09120010101"),
                TractCrosswalkRow::new("36061000100", "36061000101"),
                TractCrosswalkRow::new("36061000100", "36061000102"),
            ],
        )
        .unwrap();

        assert_eq!(t.translate("09001010101"), "09120010101");
        assert_eq!(t.translate("36061000100"), "36061000100");
    }

    proptest! {
        #[test]
        fn prop_identity_outside_state(state in 0u32..100, rest in 0u64..1_000_000_000) {
            prop_assume!(state != 9);
            let tract_id = format!("{:02}{:09}", state, rest);
            let t = translator();
            let out = t.translate(&tract_id);
            prop_assert_eq!(out.as_ref(), tract_id.as_str());
        }

        #[test]
        fn prop_translation_is_total(rest in 0u64..1_000_000_000) {
            let tract_id = format!("09{:09}", rest);
            let t = translator();
            let out = t.translate(&tract_id);
            if tract_id == "09001010101" {
                prop_assert_eq!(out.as_ref(), "09120010101");
            } else {
                prop_assert_eq!(out.as_ref(), tract_id.as_str());
            }
        }
    }
}
