// Tract Crosswalk - CLI
// Reference tables → Tract_Where_File.csv (+ manifest, optional SQLite snapshot)

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tract_crosswalk::config::PipelineConfig;
use tract_crosswalk::output::{content_hash, profile, write_json};
use tract_crosswalk::{insert_snapshot, pipeline, setup_database, verify_count, PipelineInputs, PipelineReport, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "tract-crosswalk", version, about = "Build the tract-to-geography crosswalk file")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GEOCORR tract → place allocation file
    #[arg(long, env = "GEOCORR")]
    allocation: Option<PathBuf>,

    /// 2020 → 2022 tract id crosswalk
    #[arg(long, env = "TRACT_CROSSWALK")]
    tract_crosswalk: Option<PathBuf>,

    /// CBSA delineation (OMB list 1)
    #[arg(long, env = "CBSA_DELINEATION")]
    cbsa: Option<PathBuf>,

    /// Principal cities (OMB list 2)
    #[arg(long, env = "PRINCIPAL_CITIES")]
    principal_cities: Option<PathBuf>,

    /// Central cities with city hall coordinates
    #[arg(long, env = "CHAPTER1")]
    central_cities: Option<PathBuf>,

    /// Tract area / population / distance
    #[arg(long, env = "ACRES_DISTANCE")]
    area_distance: Option<PathBuf>,

    /// State → region / division
    #[arg(long, env = "REGIONS")]
    regions: Option<PathBuf>,

    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also store the run in this SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Maximum central-city corrections before the run fails
    #[arg(long)]
    anomaly_limit: Option<usize>,

    /// Do not fail on central-city corrections
    #[arg(long, conflicts_with = "anomaly_limit")]
    no_anomaly_check: bool,

    /// Log a per-column profile of the output
    #[arg(long)]
    describe: bool,
}

impl Cli {
    /// Flags and environment variables win over the config file
    fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        let sources = &mut config.sources;
        let overrides = [
            (&mut sources.allocation, self.allocation),
            (&mut sources.tract_crosswalk, self.tract_crosswalk),
            (&mut sources.cbsa, self.cbsa),
            (&mut sources.principal_cities, self.principal_cities),
            (&mut sources.central_cities, self.central_cities),
            (&mut sources.area_distance, self.area_distance),
            (&mut sources.regions, self.regions),
        ];
        for (slot, value) in overrides {
            if value.is_some() {
                *slot = value;
            }
        }

        if let Some(csv) = self.output {
            config.output.csv = csv;
        }
        if self.sqlite.is_some() {
            config.output.sqlite = self.sqlite;
        }
        if let Some(limit) = self.anomaly_limit {
            config.check_central_city_anomalies = true;
            config.central_city_anomaly_limit = limit;
        }
        if self.no_anomaly_check {
            config.check_central_city_anomalies = false;
        }
        config.output.describe |= self.describe;
        config
    }
}

/// Written next to the CSV
#[derive(Serialize)]
struct Manifest<'a> {
    snapshot: &'a Snapshot,
    report: &'a PipelineReport,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let config = cli.apply(config);

    println!("🗺️  Tract Crosswalk v{}", tract_crosswalk::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load reference tables
    println!("\n📂 Loading reference tables...");
    let sources = config.sources.resolve()?;
    let inputs = PipelineInputs::load(&sources, &config.header_rows)?;

    // 2. Run the pipeline
    println!("\n🚂 Running pipeline...");
    let output = pipeline::run(inputs, &config.settings()).context("Pipeline failed")?;
    println!("✓ {} tracts", output.crosswalk.len());

    // 3. Write CSV + manifest
    println!("\n💾 Writing {:?}...", config.output.csv);
    let bytes = output.crosswalk.write_csv(&config.output.csv)?;
    let snapshot = Snapshot::new(output.crosswalk.len(), &content_hash(&bytes));
    info!(run_id = %snapshot.run_id, hash = %snapshot.content_hash, "wrote crosswalk");

    if config.output.manifest {
        let path = config.output.manifest_path();
        write_json(
            &path,
            &Manifest {
                snapshot: &snapshot,
                report: &output.report,
            },
        )?;
        println!("✓ Manifest {:?}", path);
    }

    // 4. Optional SQLite snapshot
    if let Some(db_path) = &config.output.sqlite {
        println!("\n🗄️  Storing snapshot in {:?}...", db_path);
        let mut conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        setup_database(&conn)?;
        insert_snapshot(&mut conn, &snapshot, &output.crosswalk)?;
        let count = verify_count(&conn, &snapshot.run_id)?;
        println!("✓ Database contains {} rows for run {}", count, snapshot.run_id);
    }

    // 5. Optional column profile
    if config.output.describe {
        let profiles = profile(&output.crosswalk)?;
        let width = profiles.iter().map(|p| p.name.len()).max().unwrap_or(0);
        for p in &profiles {
            info!("{}", p.line(width));
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Done: {} rows, sha256 {}", snapshot.row_count, snapshot.content_hash);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "tract-crosswalk",
            "--allocation",
            "geocorr.csv",
            "--output",
            "out.csv",
            "--no-anomaly-check",
            "--describe",
        ]);

        let config = cli.apply(PipelineConfig::default());

        assert_eq!(config.sources.allocation, Some(PathBuf::from("geocorr.csv")));
        assert_eq!(config.output.csv, PathBuf::from("out.csv"));
        assert!(config.output.describe);
        assert_eq!(config.settings().central_city_anomaly_limit, None);
    }

    #[test]
    fn test_anomaly_limit_flag() {
        let cli = Cli::parse_from(["tract-crosswalk", "--anomaly-limit", "5"]);
        let config = cli.apply(PipelineConfig::default());
        assert_eq!(config.settings().central_city_anomaly_limit, Some(5));
    }
}
