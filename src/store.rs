use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;

use crate::match_store::{Match, MatchKey, Outcome, SideStats};
use crate::table::{FeatureRow, FeatureTable, SCHEMA_FILL, SchemaDrift, schema_drift, union_columns};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub already_stored: usize,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            season INTEGER NOT NULL,
            date TEXT NOT NULL,
            kickoff TEXT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            result TEXT NOT NULL,
            home_shots INTEGER NULL,
            away_shots INTEGER NULL,
            home_shots_on_target INTEGER NULL,
            away_shots_on_target INTEGER NULL,
            home_yellow_cards INTEGER NULL,
            away_yellow_cards INTEGER NULL,
            home_red_cards INTEGER NULL,
            away_red_cards INTEGER NULL,
            inserted_at TEXT NOT NULL,
            PRIMARY KEY (season, date, home_team, away_team)
        );
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);

        CREATE TABLE IF NOT EXISTS feature_columns (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS feature_rows (
            season INTEGER NOT NULL,
            date TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            result TEXT NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            values_json TEXT NOT NULL,
            PRIMARY KEY (season, date, home_team, away_team)
        );

        CREATE TABLE IF NOT EXISTS derive_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            mode TEXT NOT NULL,
            matches INTEGER NOT NULL,
            rows_written INTEGER NOT NULL,
            report_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Inserts matches whose identity is not stored yet. Content conflicts are
/// caught by `MatchStore::union` before anything reaches this point.
pub fn save_matches(conn: &mut Connection, matches: &[Match]) -> Result<SaveSummary> {
    let tx = conn.transaction().context("begin match transaction")?;
    let mut summary = SaveSummary::default();
    let inserted_at = Utc::now().to_rfc3339();
    for m in matches {
        if insert_match(&tx, m, &inserted_at)? {
            summary.inserted += 1;
        } else {
            summary.already_stored += 1;
        }
    }
    tx.commit().context("commit match transaction")?;
    info!(
        "saved {} new matches ({} already stored)",
        summary.inserted, summary.already_stored
    );
    Ok(summary)
}

fn insert_match(tx: &Transaction<'_>, m: &Match, inserted_at: &str) -> Result<bool> {
    let changed = tx
        .execute(
            r#"
            INSERT INTO matches (
                season, date, kickoff, home_team, away_team,
                home_goals, away_goals, result,
                home_shots, away_shots, home_shots_on_target, away_shots_on_target,
                home_yellow_cards, away_yellow_cards, home_red_cards, away_red_cards,
                inserted_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16,
                ?17
            )
            ON CONFLICT(season, date, home_team, away_team) DO NOTHING
            "#,
            params![
                m.season,
                m.date.format(DATE_FMT).to_string(),
                m.kickoff.map(|t| t.format(TIME_FMT).to_string()),
                m.home_team,
                m.away_team,
                m.home.goals,
                m.away.goals,
                m.result.code().to_string(),
                m.home.shots,
                m.away.shots,
                m.home.shots_on_target,
                m.away.shots_on_target,
                m.home.yellow_cards,
                m.away.yellow_cards,
                m.home.red_cards,
                m.away.red_cards,
                inserted_at,
            ],
        )
        .with_context(|| format!("insert match {}", m.key()))?;
    Ok(changed > 0)
}

struct MatchRow {
    season: i32,
    date: String,
    kickoff: Option<String>,
    home_team: String,
    away_team: String,
    home_goals: u32,
    away_goals: u32,
    result: String,
    optional: [Option<u32>; 8],
}

pub fn load_matches(conn: &Connection) -> Result<Vec<Match>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                season, date, kickoff, home_team, away_team,
                home_goals, away_goals, result,
                home_shots, away_shots, home_shots_on_target, away_shots_on_target,
                home_yellow_cards, away_yellow_cards, home_red_cards, away_red_cards
            FROM matches
            ORDER BY date ASC, kickoff IS NULL, kickoff ASC, rowid ASC
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MatchRow {
                season: row.get(0)?,
                date: row.get(1)?,
                kickoff: row.get(2)?,
                home_team: row.get(3)?,
                away_team: row.get(4)?,
                home_goals: row.get(5)?,
                away_goals: row.get(6)?,
                result: row.get(7)?,
                optional: [
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                    row.get(13)?,
                    row.get(14)?,
                    row.get(15)?,
                ],
            })
        })
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        let row = row.context("decode match row")?;
        out.push(match_from_row(row)?);
    }
    Ok(out)
}

fn match_from_row(row: MatchRow) -> Result<Match> {
    let date = parse_stored_date(&row.date)?;
    let kickoff = row
        .kickoff
        .as_deref()
        .map(|raw| {
            NaiveTime::parse_from_str(raw, TIME_FMT)
                .with_context(|| format!("stored kickoff `{raw}`"))
        })
        .transpose()?;
    let result = Outcome::from_code(&row.result)
        .ok_or_else(|| anyhow!("stored result code `{}`", row.result))?;
    let [hs, as_, hst, ast, hy, ay, hr, ar] = row.optional;
    Ok(Match {
        season: row.season,
        date,
        kickoff,
        home_team: row.home_team,
        away_team: row.away_team,
        home: SideStats {
            goals: row.home_goals,
            shots: hs,
            shots_on_target: hst,
            yellow_cards: hy,
            red_cards: hr,
        },
        away: SideStats {
            goals: row.away_goals,
            shots: as_,
            shots_on_target: ast,
            yellow_cards: ay,
            red_cards: ar,
        },
        result,
    })
}

/// Drops every stored feature row and writes `table` in its place.
pub fn replace_feature_table(conn: &mut Connection, table: &FeatureTable) -> Result<usize> {
    let tx = conn.transaction().context("begin feature transaction")?;
    tx.execute("DELETE FROM feature_rows", [])
        .context("clear feature rows")?;
    write_columns(&tx, table.columns())?;
    for row in table.rows() {
        insert_feature_row(&tx, row)?;
    }
    tx.commit().context("commit feature transaction")?;
    Ok(table.len())
}

/// Appends rows to the published table. A row whose key is already stored is
/// an error; published rows are never rewritten. New columns are appended to
/// the stored column list and older rows read back as `SCHEMA_FILL` there.
pub fn append_feature_rows(conn: &mut Connection, incoming: &FeatureTable) -> Result<SchemaDrift> {
    let stored = load_columns(conn)?;
    let (columns, drift) = if stored.is_empty() {
        (incoming.columns().to_vec(), SchemaDrift::default())
    } else {
        (
            union_columns(&stored, incoming.columns()),
            schema_drift(&stored, incoming.columns()),
        )
    };
    if !drift.is_empty() {
        warn!(
            "stored feature schema extended by {:?}; new rows fill {:?}",
            drift.filled_in_existing, drift.filled_in_incoming
        );
    }
    let laid_out = incoming.with_columns(&columns);

    let tx = conn.transaction().context("begin feature append")?;
    for row in laid_out.rows() {
        if feature_row_exists(&tx, &row.key)? {
            bail!("feature row {} is already published", row.key);
        }
        insert_feature_row(&tx, row)?;
    }
    if columns != stored {
        write_columns(&tx, &columns)?;
    }
    tx.commit().context("commit feature append")?;
    Ok(drift)
}

pub fn load_feature_table(conn: &Connection) -> Result<FeatureTable> {
    let columns = load_columns(conn)?;
    let mut table = FeatureTable::new(columns);
    let width = table.columns().len();

    let mut stmt = conn
        .prepare(
            r#"
            SELECT season, date, home_team, away_team, result, home_goals, away_goals, values_json
            FROM feature_rows
            ORDER BY rowid ASC
            "#,
        )
        .context("prepare load features query")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, String>(7)?,
            ))
        })
        .context("query load features")?;

    for row in rows {
        let (season, date, home_team, away_team, result, home_goals, away_goals, json) =
            row.context("decode feature row")?;
        let key = MatchKey {
            season,
            date: parse_stored_date(&date)?,
            home_team,
            away_team,
        };
        let mut values: Vec<f64> = serde_json::from_str(&json)
            .with_context(|| format!("decode feature values for {key}"))?;
        if values.len() > width {
            bail!(
                "feature row {key} has {} values but only {width} columns are stored",
                values.len()
            );
        }
        // Rows written before a schema extension are shorter.
        values.resize(width, SCHEMA_FILL);
        let result = Outcome::from_code(&result)
            .ok_or_else(|| anyhow!("stored result code `{result}` for {key}"))?;
        table.push(FeatureRow {
            key,
            result,
            home_goals,
            away_goals,
            values,
        })?;
    }
    Ok(table)
}

/// Audit entry for one derivation or update run.
pub fn record_derive_run<R: Serialize>(
    conn: &Connection,
    mode: &str,
    started_at: &str,
    matches: usize,
    rows_written: usize,
    report: &R,
) -> Result<i64> {
    let report_json = serde_json::to_string(report).context("encode derive run report")?;
    conn.execute(
        "INSERT INTO derive_runs(started_at, finished_at, mode, matches, rows_written, report_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            started_at,
            Utc::now().to_rfc3339(),
            mode,
            matches as i64,
            rows_written as i64,
            report_json
        ],
    )
    .context("insert derive run")?;
    Ok(conn.last_insert_rowid())
}

pub fn latest_derive_run(conn: &Connection) -> Result<Option<(i64, String, i64)>> {
    conn.query_row(
        "SELECT run_id, mode, rows_written FROM derive_runs ORDER BY run_id DESC LIMIT 1",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )
    .optional()
    .context("query latest derive run")
}

fn load_columns(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM feature_columns ORDER BY position ASC")
        .context("prepare feature columns query")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query feature columns")?;
    let mut out = Vec::new();
    for name in names {
        out.push(name.context("decode feature column")?);
    }
    Ok(out)
}

fn write_columns(tx: &Transaction<'_>, columns: &[String]) -> Result<()> {
    tx.execute("DELETE FROM feature_columns", [])
        .context("clear feature columns")?;
    let mut seen = HashSet::new();
    for (position, name) in columns.iter().enumerate() {
        if !seen.insert(name) {
            bail!("duplicate feature column `{name}`");
        }
        tx.execute(
            "INSERT INTO feature_columns(position, name) VALUES (?1, ?2)",
            params![position as i64, name],
        )
        .with_context(|| format!("insert feature column {name}"))?;
    }
    Ok(())
}

fn feature_row_exists(tx: &Transaction<'_>, key: &MatchKey) -> Result<bool> {
    let found = tx
        .query_row(
            "SELECT 1 FROM feature_rows WHERE season = ?1 AND date = ?2 AND home_team = ?3 AND away_team = ?4",
            params![
                key.season,
                key.date.format(DATE_FMT).to_string(),
                key.home_team,
                key.away_team
            ],
            |_| Ok(()),
        )
        .optional()
        .context("query feature row")?;
    Ok(found.is_some())
}

fn insert_feature_row(tx: &Transaction<'_>, row: &FeatureRow) -> Result<()> {
    let values_json =
        serde_json::to_string(&row.values).with_context(|| format!("encode {}", row.key))?;
    tx.execute(
        r#"
        INSERT INTO feature_rows (
            season, date, home_team, away_team, result, home_goals, away_goals, values_json
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            row.key.season,
            row.key.date.format(DATE_FMT).to_string(),
            row.key.home_team,
            row.key.away_team,
            row.result.code().to_string(),
            row.home_goals,
            row.away_goals,
            values_json,
        ],
    )
    .with_context(|| format!("insert feature row {}", row.key))?;
    Ok(())
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).with_context(|| format!("stored date `{raw}`"))
}
