use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use pl_features::config::{PipelineConfig, default_db_path};
use pl_features::csv_io::{read_market_values_csv, write_feature_csv};
use pl_features::export::export_feature_table;
use pl_features::match_store::{MatchStore, TeamAliases};
use pl_features::pipeline::{PipelineContext, derive_features};
use pl_features::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = flag_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(default_db_path)
        .context("unable to resolve sqlite path")?;
    let started_at = Utc::now().to_rfc3339();

    let config = PipelineConfig::from_env();
    let mut ctx = PipelineContext::new(config)?;
    if let Some(path) = flag_value(&args, "--market") {
        let market = read_market_values_csv(&PathBuf::from(path), &TeamAliases::default())?;
        ctx = ctx.with_market_values(market);
    }

    let mut conn = store::open_db(&db_path)?;
    let matches = MatchStore::from_matches(store::load_matches(&conn)?)?;
    if matches.is_empty() {
        return Err(anyhow!(
            "no matches stored in {}; run match_ingest first",
            db_path.display()
        ));
    }

    let derivation = derive_features(&ctx, &matches)?;
    let written = store::replace_feature_table(&mut conn, &derivation.table)?;
    let run_id = store::record_derive_run(
        &conn,
        "full",
        &started_at,
        matches.len(),
        written,
        &derivation.report,
    )?;

    if let Some(path) = flag_value(&args, "--csv-out") {
        write_feature_csv(&PathBuf::from(&path), &derivation.table)?;
        println!("CSV: {path}");
    }
    if let Some(path) = flag_value(&args, "--xlsx-out") {
        let report = export_feature_table(&PathBuf::from(&path), &derivation.table)?;
        println!("XLSX: {path} ({} rows x {} columns)", report.rows, report.columns);
    }

    let assembly = &derivation.report.assembly;
    println!("Feature build complete (run {run_id})");
    println!("DB: {}", db_path.display());
    println!(
        "Config: window={} h2h_lookback={} h2h={:?} threads={} baseline={:?}",
        config.rolling_window,
        config.h2h_lookback,
        config.h2h_strategy,
        config.parallelism,
        config.promoted_baseline
    );
    println!("Seasons: {:?}", matches.seasons());
    println!(
        "Rows: {} x {} features",
        derivation.table.len(),
        derivation.table.columns().len()
    );
    if !assembly.baseline_prev_season.is_empty() {
        println!(
            "Baseline prev-season points: {} (season, team) pairs",
            assembly.baseline_prev_season.len()
        );
    }
    if !assembly.missing_market_values.is_empty() {
        println!(
            "Missing market values: {}",
            assembly.missing_market_values.len()
        );
        for (season, team) in assembly.missing_market_values.iter().take(8) {
            println!(" - {season} {team}");
        }
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
