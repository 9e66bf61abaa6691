use std::env;
use std::path::PathBuf;

use crate::error::PipelineError;

pub const DEFAULT_ROLLING_WINDOW: usize = 5;
pub const DEFAULT_H2H_LOOKBACK: usize = 5;
pub const DEFAULT_RATIO_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum H2hStrategy {
    // Team-pair index; O(log n) per match after an O(n) build.
    Indexed,
    // Full history scan per match.
    Scan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotedBaseline {
    Zero,
    BottomAverage(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub rolling_window: usize,
    pub h2h_lookback: usize,
    pub ratio_epsilon: f64,
    pub h2h_strategy: H2hStrategy,
    pub parallelism: usize,
    pub promoted_baseline: PromotedBaseline,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_ROLLING_WINDOW,
            h2h_lookback: DEFAULT_H2H_LOOKBACK,
            ratio_epsilon: DEFAULT_RATIO_EPSILON,
            h2h_strategy: H2hStrategy::Indexed,
            parallelism: default_parallelism(),
            promoted_baseline: PromotedBaseline::Zero,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            rolling_window: env_usize("FEATURES_ROLLING_WINDOW").unwrap_or(d.rolling_window),
            h2h_lookback: env_usize("FEATURES_H2H_LOOKBACK").unwrap_or(d.h2h_lookback),
            ratio_epsilon: d.ratio_epsilon,
            h2h_strategy: opt_env("FEATURES_H2H_STRATEGY")
                .and_then(|raw| parse_h2h_strategy(&raw))
                .unwrap_or(d.h2h_strategy),
            parallelism: env_usize("FEATURES_PARALLELISM")
                .unwrap_or(d.parallelism)
                .clamp(1, 32),
            promoted_baseline: opt_env("FEATURES_PROMOTED_BASELINE")
                .and_then(|raw| parse_promoted_baseline(&raw))
                .unwrap_or(d.promoted_baseline),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.rolling_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "rolling window must be at least 1".to_string(),
            ));
        }
        if self.h2h_lookback == 0 {
            return Err(PipelineError::InvalidConfig(
                "head-to-head lookback must be at least 1".to_string(),
            ));
        }
        if !(self.ratio_epsilon.is_finite() && self.ratio_epsilon > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "ratio epsilon must be a positive finite number, got {}",
                self.ratio_epsilon
            )));
        }
        if let PromotedBaseline::BottomAverage(0) = self.promoted_baseline {
            return Err(PipelineError::InvalidConfig(
                "bottom-average baseline needs at least one team".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Some(path) = opt_env("FEATURES_DB_PATH") {
        return Some(PathBuf::from(path));
    }
    // Prefer XDG cache.
    if let Some(base) = opt_env("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join("pl_features").join("matches.sqlite"));
    }
    let home = opt_env("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join("pl_features")
            .join("matches.sqlite"),
    )
}

pub fn parse_h2h_strategy(raw: &str) -> Option<H2hStrategy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "indexed" | "index" => Some(H2hStrategy::Indexed),
        "scan" | "naive" => Some(H2hStrategy::Scan),
        _ => None,
    }
}

/// Accepts `zero` or `bottom:N`.
pub fn parse_promoted_baseline(raw: &str) -> Option<PromotedBaseline> {
    let raw = raw.trim().to_ascii_lowercase();
    if raw == "zero" || raw == "0" {
        return Some(PromotedBaseline::Zero);
    }
    let n = raw.strip_prefix("bottom:")?.trim().parse::<usize>().ok()?;
    (n > 0).then_some(PromotedBaseline::BottomAverage(n))
}

fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .clamp(1, 32)
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn env_usize(key: &str) -> Option<usize> {
    opt_env(key).and_then(|val| val.trim().parse::<usize>().ok())
}
