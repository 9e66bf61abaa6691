use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use pl_features::config::{PipelineConfig, default_db_path};
use pl_features::csv_io::{read_football_data_csv, read_market_values_csv, write_feature_csv};
use pl_features::incremental::update_features;
use pl_features::match_store::{MatchStore, TeamAliases};
use pl_features::pipeline::PipelineContext;
use pl_features::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let csv_path = flag_value(&args, "--csv")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("pass the new season file with --csv=PATH"))?;
    let season = match flag_value(&args, "--season") {
        Some(raw) => Some(
            raw.parse::<i32>()
                .with_context(|| format!("invalid --season `{raw}`"))?,
        ),
        None => None,
    };
    let db_path = flag_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(default_db_path)
        .context("unable to resolve sqlite path")?;
    let started_at = Utc::now().to_rfc3339();

    let aliases = TeamAliases::default();
    let mut ctx = PipelineContext::new(PipelineConfig::from_env())?;
    if let Some(path) = flag_value(&args, "--market") {
        ctx = ctx.with_market_values(read_market_values_csv(&PathBuf::from(path), &aliases)?);
    }

    let raw = read_football_data_csv(&csv_path, season)?;
    let (batch, ingest) = MatchStore::ingest(&raw, &aliases)?;

    let mut conn = store::open_db(&db_path)?;
    let history = MatchStore::from_matches(store::load_matches(&conn)?)?;
    let published = store::load_feature_table(&conn)?;

    let update = update_features(&ctx, &published, &history, batch.matches().to_vec())?;

    let saved = store::save_matches(&mut conn, update.matches.matches())?;
    let drift = store::append_feature_rows(&mut conn, &update.new_rows)?;
    let run_id = store::record_derive_run(
        &conn,
        "incremental",
        &started_at,
        update.matches.len(),
        update.new_rows.len(),
        &update.report,
    )?;

    if let Some(path) = flag_value(&args, "--csv-out") {
        write_feature_csv(&PathBuf::from(&path), &update.new_rows)?;
        println!("CSV: {path}");
    }

    println!("Incremental update complete (run {run_id})");
    println!("DB: {}", db_path.display());
    println!(
        "Batch: {} accepted, {} rejected",
        ingest.accepted,
        ingest.rejected.len()
    );
    println!("Matches stored: {} new", saved.inserted);
    println!(
        "Feature rows: {} new, {} already published",
        update.report.new_rows, update.report.already_published
    );
    if !update.report.backfilled.is_empty() {
        println!(
            "Back-filled before latest published row: {}",
            update.report.backfilled.len()
        );
        for key in update.report.backfilled.iter().take(8) {
            println!(" - {key}");
        }
    }
    if !drift.is_empty() {
        println!(
            "Schema drift: +{:?} / filled {:?}",
            drift.filled_in_existing, drift.filled_in_incoming
        );
    }

    Ok(())
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
