use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use pl_features::config::default_db_path;
use pl_features::csv_io::read_football_data_csv;
use pl_features::match_store::{MatchStore, TeamAliases};
use pl_features::store;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let files = flag_values(&args, "--csv");
    if files.is_empty() {
        return Err(anyhow!("pass at least one season file with --csv=PATH"));
    }
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

    let mut raw = Vec::new();
    for file in &files {
        raw.extend(read_football_data_csv(&PathBuf::from(file), season)?);
    }
    let (incoming, report) = MatchStore::ingest(&raw, &TeamAliases::default())?;

    let mut conn = store::open_db(&db_path)?;
    let history = MatchStore::from_matches(store::load_matches(&conn)?)?;
    let (merged, added) = history.union(incoming.matches().to_vec())?;
    let to_save = added
        .iter()
        .filter_map(|key| merged.get(key).cloned())
        .collect::<Vec<_>>();
    let saved = store::save_matches(&mut conn, &to_save)?;

    println!("Match ingest complete");
    println!("DB: {}", db_path.display());
    println!("Files: {}", files.len());
    println!(
        "Rows: {} accepted, {} rejected, {} duplicates collapsed",
        report.accepted,
        report.rejected.len(),
        report.collapsed_duplicates
    );
    println!(
        "Matches: {} new, {} already stored, {} total",
        saved.inserted,
        incoming.len() - added.len(),
        merged.len()
    );
    println!(
        "Optional stats: shots {:?}, shots on target {:?}, cards {:?}",
        report.capabilities.shots, report.capabilities.shots_on_target, report.capabilities.cards
    );
    if !report.rejected.is_empty() {
        println!("Rejected rows: {}", report.rejected.len());
        for item in report.rejected.iter().take(8) {
            println!(" - row {} ({}): {}", item.row, item.label, item.reason);
        }
    }

    Ok(())
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    flag_values(args, name).into_iter().next()
}

fn flag_values(args: &[String], name: &str) -> Vec<String> {
    let prefix = format!("{name}=");
    let mut out = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            out.push(next.trim().to_string());
        }
    }
    out
}
