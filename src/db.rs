use crate::output::Crosswalk;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One pipeline run: which snapshot of the crosswalk was produced and when
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
    /// SHA-256 of the CSV bytes
    pub content_hash: String,
    pub tool_version: String,
}

impl Snapshot {
    pub fn new(row_count: usize, content_hash: &str) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            row_count,
            content_hash: content_hash.to_string(),
            tool_version: crate::VERSION.to_string(),
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Snapshots (one row per pipeline run)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            created_at TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            content_hash TEXT NOT NULL,
            tool_version TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Crosswalk rows, keyed by (run_id, tract22)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tract_crosswalk (
            run_id TEXT NOT NULL REFERENCES snapshots(run_id),
            tract22 TEXT NOT NULL,
            tract20 TEXT NOT NULL,
            stcnty22 TEXT,
            place TEXT NOT NULL,
            place_code TEXT NOT NULL,
            place_name TEXT,
            county_name TEXT,
            allocation_factor REAL,
            majority_type TEXT,
            cbsa_code TEXT,
            metro_division_code TEXT,
            csa_code TEXT,
            cbsa_title TEXT,
            metro_micro TEXT,
            metro_division_title TEXT,
            csa_title TEXT,
            cbsa_county_name TEXT,
            central_outlying_county TEXT,
            principal_city INTEGER NOT NULL,
            central_city INTEGER NOT NULL,
            tract_pop_20 INTEGER,
            sqmi REAL,
            pop_sqmi REAL,
            cbsa_distance REAL,
            cbsa_percentile REAL,
            state_abbr TEXT,
            region TEXT,
            division TEXT,
            PRIMARY KEY (run_id, tract22)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_crosswalk_cbsa ON tract_crosswalk(run_id, cbsa_code)",
        [],
    )?;

    Ok(())
}

/// Store one snapshot and all its rows in a single transaction
pub fn insert_snapshot(conn: &mut Connection, snapshot: &Snapshot, crosswalk: &Crosswalk) -> Result<usize> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO snapshots (run_id, created_at, row_count, content_hash, tool_version)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            snapshot.run_id,
            snapshot.created_at.to_rfc3339(),
            snapshot.row_count as i64,
            snapshot.content_hash,
            snapshot.tool_version,
        ],
    )
    .context("Failed to insert snapshot")?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO tract_crosswalk (
                run_id, tract22, tract20, stcnty22, place, place_code, place_name, county_name,
                allocation_factor, majority_type,
                cbsa_code, metro_division_code, csa_code, cbsa_title, metro_micro,
                metro_division_title, csa_title, cbsa_county_name, central_outlying_county,
                principal_city, central_city,
                tract_pop_20, sqmi, pop_sqmi, cbsa_distance, cbsa_percentile,
                state_abbr, region, division
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
        )?;

        for row in crosswalk.rows() {
            stmt.execute(params![
                snapshot.run_id,
                row.tract22,
                row.tract20,
                row.stcnty22,
                row.place,
                row.place_code,
                row.place_name,
                row.county_name,
                row.allocation_factor,
                row.majority_type,
                row.cbsa_code,
                row.metro_division_code,
                row.csa_code,
                row.cbsa_title,
                row.metro_micro,
                row.metro_division_title,
                row.csa_title,
                row.cbsa_county_name,
                row.central_outlying_county,
                row.principal_city,
                row.central_city,
                row.tract_pop_20.map(|p| p as i64),
                row.sqmi,
                row.pop_sqmi,
                row.cbsa_distance,
                row.cbsa_percentile,
                row.state_abbr,
                row.region,
                row.division,
            ])
            .with_context(|| format!("Failed to insert tract {}", row.tract22))?;
            inserted += 1;
        }
    }

    tx.commit()?;
    info!(run_id = %snapshot.run_id, rows = inserted, "stored crosswalk snapshot");

    Ok(inserted)
}

/// All snapshots, newest first
pub fn get_snapshots(conn: &Connection) -> Result<Vec<Snapshot>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, created_at, row_count, content_hash, tool_version
         FROM snapshots ORDER BY id DESC",
    )?;

    let snapshots = stmt
        .query_map([], |row| {
            let created_at: String = row.get(1)?;
            let row_count: i64 = row.get(2)?;
            Ok((row.get::<_, String>(0)?, created_at, row_count, row.get::<_, String>(3)?, row.get::<_, String>(4)?))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(run_id, created_at, row_count, content_hash, tool_version)| -> Result<Snapshot> {
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .with_context(|| format!("Bad snapshot timestamp: {}", created_at))?
                .with_timezone(&Utc);
            Ok(Snapshot {
                run_id,
                created_at,
                row_count: row_count as usize,
                content_hash,
                tool_version,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(snapshots)
}

/// Number of crosswalk rows stored for one run
pub fn verify_count(conn: &Connection, run_id: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tract_crosswalk WHERE run_id = ?1",
        params![run_id],
        |row| row.get(0),
    )?;
    Ok(count)
}
