// ⚙️ Configuration - where the reference tables live and how to read them
//
// Loaded from TOML, then overridden by CLI flags / environment variables in
// main.rs. The pipeline itself only ever sees PipelineSettings and in-memory
// tables.

use crate::classifier::DEFAULT_ANOMALY_LIMIT;
use crate::pipeline::PipelineSettings;
use crate::translator::DEFAULT_STATE_PREFIX;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// SOURCES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    /// GEOCORR tract → place allocation file
    pub allocation: Option<PathBuf>,
    /// 2020 → 2022 tract id crosswalk
    pub tract_crosswalk: Option<PathBuf>,
    /// OMB list 1 (CBSA delineation)
    pub cbsa: Option<PathBuf>,
    /// OMB list 2 (principal cities)
    pub principal_cities: Option<PathBuf>,
    /// Principal cities with city hall coordinates
    pub central_cities: Option<PathBuf>,
    /// Tract area / population / distance
    pub area_distance: Option<PathBuf>,
    /// State → region/division; built-in table when absent
    pub regions: Option<PathBuf>,
}

/// SourcePaths with every required table present
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSources {
    pub allocation: PathBuf,
    pub tract_crosswalk: PathBuf,
    pub cbsa: PathBuf,
    pub principal_cities: PathBuf,
    pub central_cities: PathBuf,
    pub area_distance: PathBuf,
    pub regions: Option<PathBuf>,
}

impl SourcePaths {
    pub fn resolve(&self) -> Result<ResolvedSources> {
        let mut missing = Vec::new();
        let mut take = |name: &str, path: &Option<PathBuf>| -> PathBuf {
            match path {
                Some(p) => p.clone(),
                None => {
                    missing.push(name.to_string());
                    PathBuf::new()
                }
            }
        };

        let resolved = ResolvedSources {
            allocation: take("allocation", &self.allocation),
            tract_crosswalk: take("tract_crosswalk", &self.tract_crosswalk),
            cbsa: take("cbsa", &self.cbsa),
            principal_cities: take("principal_cities", &self.principal_cities),
            central_cities: take("central_cities", &self.central_cities),
            area_distance: take("area_distance", &self.area_distance),
            regions: self.regions.clone(),
        };

        if !missing.is_empty() {
            bail!("Missing source paths: {}", missing.join(", "));
        }
        Ok(resolved)
    }
}

// ============================================================================
// HEADER ROWS
// ============================================================================

/// Rows to skip before the header row of each file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderRows {
    /// GEOCORR ships a machine header above the labelled one
    pub allocation: usize,
    /// OMB lists carry two title rows
    pub cbsa: usize,
    pub principal_cities: usize,
    pub central_cities: usize,
    pub tract_crosswalk: usize,
    pub area_distance: usize,
    pub regions: usize,
}

impl Default for HeaderRows {
    fn default() -> Self {
        HeaderRows {
            allocation: 1,
            cbsa: 2,
            principal_cities: 2,
            central_cities: 0,
            tract_crosswalk: 0,
            area_distance: 0,
            regions: 0,
        }
    }
}

// ============================================================================
// TRANSLATOR / OUTPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub state_prefix: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            state_prefix: DEFAULT_STATE_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub csv: PathBuf,
    pub sqlite: Option<PathBuf>,
    /// Write `<csv>.manifest.json` next to the CSV
    pub manifest: bool,
    /// Log a per-column profile of the output
    pub describe: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            csv: PathBuf::from("Tract_Where_File.csv"),
            sqlite: None,
            manifest: true,
            describe: false,
        }
    }
}

impl OutputConfig {
    pub fn manifest_path(&self) -> PathBuf {
        let mut name = self.csv.as_os_str().to_owned();
        name.push(".manifest.json");
        PathBuf::from(name)
    }
}

// ============================================================================
// PIPELINE CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcePaths,
    pub header_rows: HeaderRows,
    pub translator: TranslatorConfig,
    /// Fail when the central-city correction flips more rows than the limit
    pub check_central_city_anomalies: bool,
    pub central_city_anomaly_limit: usize,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            sources: SourcePaths::default(),
            header_rows: HeaderRows::default(),
            translator: TranslatorConfig::default(),
            check_central_city_anomalies: true,
            central_city_anomaly_limit: DEFAULT_ANOMALY_LIMIT,
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            crosswalk_state_prefix: self.translator.state_prefix.clone(),
            central_city_anomaly_limit: self
                .check_central_city_anomalies
                .then_some(self.central_city_anomaly_limit),
        }
    }
}
