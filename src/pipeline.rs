// 🚂 Pipeline - Resolver → Translator → CBSA join → Classifier →
//              Area join → Region join → Assembler
//
// Strictly sequential. Each stage owns the TractTable for its duration and
// hands it to the next. Inputs are in-memory tables, so tests can run the
// whole pipeline against fixtures.

use crate::assembler::assemble;
use crate::classifier::{classify, ClassifyReport, DEFAULT_ANOMALY_LIMIT};
use crate::config::{HeaderRows, ResolvedSources};
use crate::error::PipelineResult;
use crate::ingest::RawTable;
use crate::join::{left_join, AreaDistanceJoin, CbsaJoin, JoinReport, RegionJoin};
use crate::output::Crosswalk;
use crate::resolver::{resolve, ResolveReport};
use crate::tables::{
    AreaDistanceRow, CbsaDelineationRow, CentralCityRow, PlaceAllocationRow, PrincipalCityRow, RegionRow,
    TractCrosswalkRow,
};
use crate::translator::{EpochTranslator, TranslateReport, DEFAULT_STATE_PREFIX};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// INPUTS / SETTINGS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub allocation: Vec<PlaceAllocationRow>,
    pub tract_crosswalk: Vec<TractCrosswalkRow>,
    pub cbsa: Vec<CbsaDelineationRow>,
    pub principal_cities: Vec<PrincipalCityRow>,
    pub central_cities: Vec<CentralCityRow>,
    pub area_distance: Vec<AreaDistanceRow>,
    pub regions: Vec<RegionRow>,
}

impl PipelineInputs {
    /// Read and parse every reference table
    pub fn load(sources: &ResolvedSources, header_rows: &HeaderRows) -> Result<Self> {
        let allocation = RawTable::from_path("allocation", &sources.allocation, header_rows.allocation)?;
        let tract_crosswalk =
            RawTable::from_path("tract_crosswalk", &sources.tract_crosswalk, header_rows.tract_crosswalk)?;
        let cbsa = RawTable::from_path("cbsa", &sources.cbsa, header_rows.cbsa)?;
        let principal_cities =
            RawTable::from_path("principal_cities", &sources.principal_cities, header_rows.principal_cities)?;
        let central_cities =
            RawTable::from_path("central_cities", &sources.central_cities, header_rows.central_cities)?;
        let area_distance =
            RawTable::from_path("area_distance", &sources.area_distance, header_rows.area_distance)?;

        let regions = match &sources.regions {
            Some(path) => RegionRow::from_raw(&RawTable::from_path("regions", path, header_rows.regions)?)?,
            None => {
                info!("no region table configured, using built-in Census regions");
                RegionRow::census_default()
            }
        };

        let inputs = PipelineInputs {
            allocation: PlaceAllocationRow::from_raw(&allocation)?,
            tract_crosswalk: TractCrosswalkRow::from_raw(&tract_crosswalk)?,
            cbsa: CbsaDelineationRow::from_raw(&cbsa)?,
            principal_cities: PrincipalCityRow::from_raw(&principal_cities)?,
            central_cities: CentralCityRow::from_raw(&central_cities)?,
            area_distance: AreaDistanceRow::from_raw(&area_distance)?,
            regions,
        };

        info!(
            allocation = inputs.allocation.len(),
            tract_crosswalk = inputs.tract_crosswalk.len(),
            cbsa = inputs.cbsa.len(),
            principal_cities = inputs.principal_cities.len(),
            central_cities = inputs.central_cities.len(),
            area_distance = inputs.area_distance.len(),
            regions = inputs.regions.len(),
            "loaded reference tables"
        );

        Ok(inputs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// State whose tract ids go through the crosswalk
    pub crosswalk_state_prefix: String,
    /// Fail when the central-city correction flips more rows than this
    pub central_city_anomaly_limit: Option<usize>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            crosswalk_state_prefix: DEFAULT_STATE_PREFIX.to_string(),
            central_city_anomaly_limit: Some(DEFAULT_ANOMALY_LIMIT),
        }
    }
}

// ============================================================================
// REPORT / OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub resolve: ResolveReport,
    pub translate: TranslateReport,
    pub cbsa_join: JoinReport,
    pub classify: ClassifyReport,
    pub area_distance_join: JoinReport,
    pub region_join: JoinReport,
    pub output_rows: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub crosswalk: Crosswalk,
    pub report: PipelineReport,
}

// ============================================================================
// RUN
// ============================================================================

pub fn run(inputs: PipelineInputs, settings: &PipelineSettings) -> PipelineResult<PipelineOutput> {
    let PipelineInputs {
        allocation,
        tract_crosswalk,
        cbsa,
        principal_cities,
        central_cities,
        area_distance,
        regions,
    } = inputs;

    let (mut table, resolve_report) = resolve(allocation)?;

    let translator = EpochTranslator::new(&settings.crosswalk_state_prefix, &tract_crosswalk)?;
    let translate_report = translator.apply(&mut table);

    let cbsa_join = left_join(&CbsaJoin, &mut table, &cbsa)?;
    let classify_report = classify(
        &mut table,
        &principal_cities,
        &central_cities,
        settings.central_city_anomaly_limit,
    )?;
    let area_distance_join = left_join(&AreaDistanceJoin, &mut table, &area_distance)?;
    let region_join = left_join(&RegionJoin, &mut table, &regions)?;

    let crosswalk = assemble(table)?;

    let report = PipelineReport {
        resolve: resolve_report,
        translate: translate_report,
        cbsa_join,
        classify: classify_report,
        area_distance_join,
        region_join,
        output_rows: crosswalk.len(),
    };
    info!(rows = report.output_rows, "pipeline complete");

    Ok(PipelineOutput { crosswalk, report })
}

// ============================================================================
// TESTS
// ============================================================================
