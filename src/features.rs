use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;

use crate::error::PipelineError;
use crate::h2h::{HeadToHead, HeadToHeadTable};
use crate::match_store::Match;
use crate::rolling::{RollingRecord, Stat};
use crate::season::{BaselineProvider, PriorPoints, SeasonCarryForward, SeasonForm, SeasonLedger};
use crate::table::{FeatureRow, FeatureTable};

const SIDE_COLUMNS: [&str; 6] = [
    "goal_diff_rolling_mean",
    "goal_diff_rolling_sum",
    "prev_season_points",
    "points_sum",
    "points_form_sum",
    "points_form_mean",
];

const MATCH_COLUMNS: [&str; 22] = [
    "h2h_points_home",
    "h2h_points_away",
    "h2h_goals_home",
    "h2h_goals_away",
    "h2h_meetings",
    "home_value",
    "away_value",
    "home_value_missing",
    "away_value_missing",
    "value_gap",
    "points_gap",
    "points_gap_rolling",
    "goal_diff_gap",
    "shots_gap",
    "shots_ot_gap",
    "cards_gap",
    "goals_for_gap",
    "conceded_gap",
    "shots_ratio",
    "shots_ot_ratio",
    "goals_for_ratio",
    "conceded_ratio",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

/// Column contract with the downstream classifier, in row order.
pub fn feature_columns() -> Vec<String> {
    let mut cols = Vec::with_capacity(2 * (Stat::ALL.len() * 2 + SIDE_COLUMNS.len()) + MATCH_COLUMNS.len());
    for side in Side::BOTH {
        let p = side.prefix();
        for stat in Stat::ALL {
            cols.push(format!("{p}_{}_rolling_mean", stat.column_stem()));
            cols.push(format!("{p}_{}_rolling_sum", stat.column_stem()));
        }
        for suffix in SIDE_COLUMNS {
            cols.push(format!("{p}_{suffix}"));
        }
    }
    cols.extend(MATCH_COLUMNS.iter().map(|c| c.to_string()));
    cols
}

pub fn gap(x: f64, y: f64) -> f64 {
    (x - y).abs()
}

/// `x / (y + epsilon)`. Total: a non-finite quotient (only possible when
/// `y == -epsilon` or inputs are already non-finite) becomes 0.
pub fn ratio(x: f64, y: f64, epsilon: f64) -> f64 {
    let r = x / (y + epsilon);
    if r.is_finite() { r } else { 0.0 }
}

/// (season, team) -> squad market value.
#[derive(Debug, Clone, Default)]
pub struct MarketValues {
    values: HashMap<(i32, String), f64>,
}

impl MarketValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, season: i32, team: impl Into<String>, value: f64) {
        self.values.insert((season, team.into()), value);
    }

    pub fn get(&self, season: i32, team: &str) -> Option<f64> {
        self.values.get(&(season, team.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub rows: usize,
    // (season, team) pairs that had no market value and were filled with 0.
    pub missing_market_values: Vec<(i32, String)>,
    // (season, team) pairs whose prev_season_points came from the baseline.
    pub baseline_prev_season: Vec<(i32, String)>,
}

pub struct AssemblyInputs<'a> {
    pub matches: &'a [Match],
    pub rolling: &'a [RollingRecord],
    pub carry: &'a SeasonCarryForward,
    pub ledger: &'a SeasonLedger,
    pub h2h: &'a HeadToHeadTable,
    pub market: &'a MarketValues,
    pub baseline: &'a dyn BaselineProvider,
    pub form_window: usize,
    pub ratio_epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TeamDateKey {
    season: i32,
    date: NaiveDate,
    team: String,
}

struct SideView<'a> {
    rolling: &'a RollingRecord,
    prev: PriorPoints,
    points_sum: u32,
    form: SeasonForm,
}

impl SideView<'_> {
    fn goal_diff_mean(&self) -> f64 {
        self.rolling.mean(Stat::GoalsFor) - self.rolling.mean(Stat::GoalsAgainst)
    }

    fn goal_diff_sum(&self) -> f64 {
        self.rolling.sum(Stat::GoalsFor) - self.rolling.sum(Stat::GoalsAgainst)
    }

    fn push_values(&self, out: &mut Vec<f64>) {
        for stat in Stat::ALL {
            out.push(self.rolling.mean(stat));
            out.push(self.rolling.sum(stat));
        }
        out.push(self.goal_diff_mean());
        out.push(self.goal_diff_sum());
        out.push(self.prev.value());
        out.push(f64::from(self.points_sum));
        out.push(self.form.sum);
        out.push(self.form.mean);
    }
}

/// Joins per-team history back onto matches by (season, date, team), adds
/// head-to-head, market values and the derived gap/ratio columns.
pub struct FeatureAssembler<'a> {
    inputs: &'a AssemblyInputs<'a>,
    by_team_date: HashMap<TeamDateKey, &'a RollingRecord>,
}

impl<'a> FeatureAssembler<'a> {
    pub fn new(inputs: &'a AssemblyInputs<'a>) -> Result<Self, PipelineError> {
        let mut by_team_date = HashMap::with_capacity(inputs.rolling.len());
        for r in inputs.rolling {
            let key = TeamDateKey {
                season: r.record.season,
                date: r.record.date,
                team: r.record.team.clone(),
            };
            // A team playing twice on one day sees the same history both times.
            match by_team_date.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(r);
                }
                Entry::Occupied(first) if first.get().same_window(r) => {
                    debug!(
                        "{} plays more than once on {}; sharing one history row",
                        r.record.team, r.record.date
                    );
                }
                Entry::Occupied(_) => {
                    return Err(PipelineError::AmbiguousTeamDate {
                        season: r.record.season,
                        date: r.record.date,
                        team: r.record.team.clone(),
                    });
                }
            }
        }
        Ok(Self {
            inputs,
            by_team_date,
        })
    }

    pub fn assemble(&self) -> Result<(FeatureTable, AssemblyReport), PipelineError> {
        let mut table = FeatureTable::new(feature_columns());
        let mut missing_values = BTreeSet::new();
        let mut baselined = BTreeSet::new();

        for m in self.inputs.matches {
            let home = self.side_view(m, Side::Home)?;
            let away = self.side_view(m, Side::Away)?;
            if home.prev.is_baseline() {
                baselined.insert((m.season, m.home_team.clone()));
            }
            if away.prev.is_baseline() {
                baselined.insert((m.season, m.away_team.clone()));
            }

            let home_value = self.inputs.market.get(m.season, &m.home_team);
            let away_value = self.inputs.market.get(m.season, &m.away_team);
            if home_value.is_none() {
                missing_values.insert((m.season, m.home_team.clone()));
            }
            if away_value.is_none() {
                missing_values.insert((m.season, m.away_team.clone()));
            }

            let h2h = self
                .inputs
                .h2h
                .get(&m.key())
                .copied()
                .unwrap_or_else(|| {
                    debug!("no head-to-head entry for {}; using empty history", m.key());
                    HeadToHead::default()
                });

            let mut values = Vec::with_capacity(table.columns().len());
            home.push_values(&mut values);
            away.push_values(&mut values);
            self.push_match_values(&mut values, &home, &away, &h2h, home_value, away_value);

            table.push(FeatureRow {
                key: m.key(),
                result: m.result,
                home_goals: m.home.goals,
                away_goals: m.away.goals,
                values,
            })?;
        }

        if !missing_values.is_empty() {
            warn!(
                "{} (season, team) market values missing; filled with 0 and flagged",
                missing_values.len()
            );
        }

        let report = AssemblyReport {
            rows: table.len(),
            missing_market_values: missing_values.into_iter().collect(),
            baseline_prev_season: baselined.into_iter().collect(),
        };
        Ok((table, report))
    }

    fn side_view(&self, m: &Match, side: Side) -> Result<SideView<'a>, PipelineError> {
        let team = match side {
            Side::Home => &m.home_team,
            Side::Away => &m.away_team,
        };
        let key = TeamDateKey {
            season: m.season,
            date: m.date,
            team: team.clone(),
        };
        let rolling = self
            .by_team_date
            .get(&key)
            .copied()
            .ok_or_else(|| PipelineError::MissingHistoryRow {
                key: m.key(),
                side: side.prefix(),
            })?;
        Ok(SideView {
            rolling,
            prev: self
                .inputs
                .carry
                .prev_season_points(m.season, team, self.inputs.baseline),
            points_sum: self.inputs.ledger.points_before(m.season, team, m.date),
            form: self
                .inputs
                .ledger
                .form_before(m.season, team, m.date, self.inputs.form_window),
        })
    }

    fn push_match_values(
        &self,
        out: &mut Vec<f64>,
        home: &SideView<'_>,
        away: &SideView<'_>,
        h2h: &HeadToHead,
        home_value: Option<f64>,
        away_value: Option<f64>,
    ) {
        let eps = self.inputs.ratio_epsilon;
        let hr = home.rolling;
        let ar = away.rolling;
        let hv = home_value.unwrap_or(0.0);
        let av = away_value.unwrap_or(0.0);

        out.push(f64::from(h2h.points_home));
        out.push(f64::from(h2h.points_away));
        out.push(f64::from(h2h.goals_home));
        out.push(f64::from(h2h.goals_away));
        out.push(h2h.meetings as f64);

        out.push(hv);
        out.push(av);
        out.push(flag(home_value.is_none()));
        out.push(flag(away_value.is_none()));

        out.push(gap(hv, av));
        out.push(gap(f64::from(home.points_sum), f64::from(away.points_sum)));
        out.push(gap(hr.mean(Stat::Points), ar.mean(Stat::Points)));
        out.push(gap(home.goal_diff_sum(), away.goal_diff_sum()));
        out.push(gap(hr.mean(Stat::Shots), ar.mean(Stat::Shots)));
        out.push(gap(hr.mean(Stat::ShotsOnTarget), ar.mean(Stat::ShotsOnTarget)));
        out.push(gap(hr.mean(Stat::Cards), ar.mean(Stat::Cards)));
        out.push(gap(hr.mean(Stat::GoalsFor), ar.mean(Stat::GoalsFor)));
        out.push(gap(hr.mean(Stat::GoalsAgainst), ar.mean(Stat::GoalsAgainst)));

        out.push(ratio(hr.mean(Stat::Shots), ar.mean(Stat::Shots), eps));
        out.push(ratio(hr.mean(Stat::ShotsOnTarget), ar.mean(Stat::ShotsOnTarget), eps));
        out.push(ratio(hr.mean(Stat::GoalsFor), ar.mean(Stat::GoalsFor), eps));
        out.push(ratio(hr.mean(Stat::GoalsAgainst), ar.mean(Stat::GoalsAgainst), eps));
    }
}

fn flag(set: bool) -> f64 {
    if set { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_contract_is_unique_and_prefixed() {
        let cols = feature_columns();
        assert_eq!(cols.len(), 58);
        let unique: BTreeSet<&String> = cols.iter().collect();
        assert_eq!(unique.len(), cols.len());
        assert_eq!(cols[0], "home_goals_for_rolling_mean");
        assert_eq!(cols[1], "home_goals_for_rolling_sum");
        assert!(cols.contains(&"away_points_rolling_mean".to_string()));
        assert!(cols.contains(&"away_prev_season_points".to_string()));
        assert_eq!(cols.last().map(String::as_str), Some("conceded_ratio"));
    }

    #[test]
    fn gap_and_ratio_are_total() {
        assert_eq!(gap(1.5, 4.0), 2.5);
        assert_eq!(gap(4.0, 1.5), 2.5);
        for x in [0.0, 1.0, -3.0, 1e300, f64::MAX] {
            assert!(ratio(x, 0.0, 1e-6).is_finite());
        }
        assert_eq!(ratio(2.0, 0.0, 1e-6), 2.0 / 1e-6);
        assert_eq!(ratio(1.0, -1e-6, 1e-6), 0.0);
        assert!((ratio(3.0, 1.5, 1e-6) - 2.0).abs() < 1e-5);
    }
}
