use std::collections::HashSet;

use log::{info, warn};
use serde::Serialize;

use crate::error::PipelineError;
use crate::features::feature_columns;
use crate::match_store::{FixtureKey, Match, MatchKey, MatchStore};
use crate::pipeline::{DerivationReport, PipelineContext, derive_features};
use crate::table::{FeatureTable, SchemaDrift, schema_drift, union_columns};

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
    pub batch_size: usize,
    pub already_published: usize,
    pub new_rows: usize,
    // New matches dated on or before the latest published row. Their
    // presence would change published features; those rows stay as they are.
    pub backfilled: Vec<MatchKey>,
    pub schema_drift: SchemaDrift,
    pub derivation: Option<DerivationReport>,
}

#[derive(Debug, Clone)]
pub struct IncrementalUpdate {
    // Only rows for batch matches that were not already published, laid out
    // on the union of the existing and freshly derived columns.
    pub new_rows: FeatureTable,
    pub matches: MatchStore,
    pub report: UpdateReport,
}

/// Re-derives over `history ∪ batch` and keeps only the rows for batch
/// matches absent from `published` (keyed by date, home, away). Published
/// rows are never recomputed.
pub fn update_features(
    ctx: &PipelineContext,
    published: &FeatureTable,
    history: &MatchStore,
    batch: Vec<Match>,
) -> Result<IncrementalUpdate, PipelineError> {
    let published_keys = published.fixture_keys();
    let batch_keys: HashSet<FixtureKey> = batch.iter().map(Match::fixture_key).collect();
    let pending: HashSet<FixtureKey> = batch_keys
        .difference(&published_keys)
        .cloned()
        .collect();

    let mut report = UpdateReport {
        batch_size: batch.len(),
        already_published: batch_keys.len() - pending.len(),
        ..UpdateReport::default()
    };

    // Conflicts are checked even when nothing new would be emitted.
    let (matches, _) = history.union(batch)?;

    if pending.is_empty() {
        info!("no unpublished matches in batch of {}", report.batch_size);
        let columns = if published.columns().is_empty() {
            feature_columns()
        } else {
            published.columns().to_vec()
        };
        return Ok(IncrementalUpdate {
            new_rows: FeatureTable::new(columns),
            matches,
            report,
        });
    }

    let derivation = derive_features(ctx, &matches)?;
    let mut fresh = derivation.table;
    fresh.retain(|row| pending.contains(&row.key.fixture()));

    let new_rows = if published.columns().is_empty() {
        fresh
    } else {
        report.schema_drift = schema_drift(published.columns(), fresh.columns());
        if !report.schema_drift.is_empty() {
            warn!(
                "schema drift against published table: filling {:?} in new rows, {:?} in published rows",
                report.schema_drift.filled_in_incoming, report.schema_drift.filled_in_existing
            );
        }
        fresh.with_columns(&union_columns(published.columns(), fresh.columns()))
    };

    if let Some(latest) = published.rows().iter().map(|r| r.key.date).max() {
        report.backfilled = new_rows
            .rows()
            .iter()
            .filter(|r| r.key.date <= latest)
            .map(|r| r.key.clone())
            .collect();
        if !report.backfilled.is_empty() {
            warn!(
                "{} new match(es) dated on or before the latest published row ({latest}); published features were not recomputed",
                report.backfilled.len()
            );
        }
    }

    report.new_rows = new_rows.len();
    report.derivation = Some(derivation.report);
    info!(
        "incremental update: {} new rows, {} already published",
        report.new_rows, report.already_published
    );

    Ok(IncrementalUpdate {
        new_rows,
        matches,
        report,
    })
}
