// Tract Crosswalk - Core Library
// Builds the one-row-per-tract geography file; exposes every stage for the CLI and tests

pub mod error;          // Typed pipeline failures
pub mod ids;            // FIPS code normalization
pub mod states;         // State FIPS / abbreviation / Census region
pub mod ingest;         // Raw reference files → RawTable
pub mod tables;         // Typed reference rows
pub mod record;         // TractRecord / TractTable / Stage
pub mod resolver;       // Stage 1: one place per tract
pub mod translator;     // Stage 2: 2020 → 2022 tract ids
pub mod join;           // Stages 3, 5, 6: left-joins
pub mod classifier;     // Stage 4: principal / central city
pub mod assembler;      // Stage 7: final table
pub mod output;         // CSV / JSON / profile
pub mod db;             // SQLite snapshots
pub mod config;         // TOML configuration
pub mod pipeline;       // End-to-end run

// Re-export commonly used types
pub use error::{PipelineError, PipelineResult};
pub use record::{AllocationClass, Stage, TractRecord, TractTable};
pub use tables::{
    AreaDistanceRow, CbsaDelineationRow, CentralCityRow, PlaceAllocationRow,
    PrincipalCityRow, RegionRow, TractCrosswalkRow,
};
pub use resolver::{resolve, ResolveReport};
pub use translator::{EpochTranslator, TranslateReport};
pub use join::{left_join, AreaDistanceJoin, CbsaJoin, JoinReport, JoinSpec, RegionJoin};
pub use classifier::{classify, ClassifyReport};
pub use assembler::assemble;
pub use output::{Crosswalk, CrosswalkRow};
pub use db::{setup_database, insert_snapshot, get_snapshots, verify_count, Snapshot};
pub use config::PipelineConfig;
pub use pipeline::{run, PipelineInputs, PipelineOutput, PipelineReport, PipelineSettings};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
