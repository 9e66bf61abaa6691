use log::info;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::features::{AssemblyInputs, AssemblyReport, FeatureAssembler, MarketValues};
use crate::h2h;
use crate::match_store::{MatchStore, StatCapabilities};
use crate::rolling::rolling;
use crate::season::{BaselineProvider, SeasonCarryForward, SeasonLedger, baseline_provider};
use crate::table::FeatureTable;
use crate::team_history::expand;

/// Everything a derivation run needs, passed explicitly to every stage.
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub market: MarketValues,
    pub baseline: Box<dyn BaselineProvider>,
    pool: Option<rayon::ThreadPool>,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            market: MarketValues::default(),
            baseline: baseline_provider(config.promoted_baseline),
            pool: build_pool(config.parallelism),
        })
    }

    pub fn with_market_values(mut self, market: MarketValues) -> Self {
        self.market = market;
        self
    }

    pub fn with_baseline(mut self, provider: Box<dyn BaselineProvider>) -> Self {
        self.baseline = provider;
        self
    }

    fn install<T: Send>(&self, action: impl FnOnce() -> T + Send) -> T {
        if let Some(pool) = self.pool.as_ref() {
            pool.install(action)
        } else {
            action()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DerivationReport {
    pub matches: usize,
    pub team_records: usize,
    pub capabilities: StatCapabilities,
    pub assembly: AssemblyReport,
}

#[derive(Debug, Clone)]
pub struct Derivation {
    pub table: FeatureTable,
    pub report: DerivationReport,
}

/// Full batch derivation: one feature row per match in store order.
/// Deterministic for a given store and context, whatever the thread count.
pub fn derive_features(
    ctx: &PipelineContext,
    store: &MatchStore,
) -> Result<Derivation, PipelineError> {
    let cfg = &ctx.config;
    let matches = store.matches();

    let records = expand(matches);
    let team_records = records.len();
    let carry = SeasonCarryForward::from_records(&records);
    let ledger = SeasonLedger::from_records(&records);

    let (rolled, h2h) = ctx.install(|| {
        rayon::join(
            || rolling(records, cfg.rolling_window),
            || h2h::resolve(matches, cfg.h2h_lookback, cfg.h2h_strategy),
        )
    });

    let inputs = AssemblyInputs {
        matches,
        rolling: &rolled,
        carry: &carry,
        ledger: &ledger,
        h2h: &h2h,
        market: &ctx.market,
        baseline: &*ctx.baseline,
        form_window: cfg.rolling_window,
        ratio_epsilon: cfg.ratio_epsilon,
    };
    let (table, assembly) = FeatureAssembler::new(&inputs)?.assemble()?;

    info!(
        "derived {} feature rows from {} matches ({} team records)",
        table.len(),
        matches.len(),
        team_records
    );

    Ok(Derivation {
        table,
        report: DerivationReport {
            matches: matches.len(),
            team_records,
            capabilities: store.capabilities(),
            assembly,
        },
    })
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}
