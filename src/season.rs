use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::config::PromotedBaseline;
use crate::team_history::TeamMatchRecord;

/// Supplies `prev_season_points` for a team that has no record in the
/// previous season (promoted, or first season in the data).
pub trait BaselineProvider: Send + Sync {
    fn baseline(&self, season: i32, team: &str, carry: &SeasonCarryForward) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBaseline;

impl BaselineProvider for ZeroBaseline {
    fn baseline(&self, _season: i32, _team: &str, _carry: &SeasonCarryForward) -> f64 {
        0.0
    }
}

/// Mean final total of the `n` weakest teams of the previous season.
#[derive(Debug, Clone, Copy)]
pub struct BottomAverageBaseline {
    pub n: usize,
}

impl BaselineProvider for BottomAverageBaseline {
    fn baseline(&self, season: i32, _team: &str, carry: &SeasonCarryForward) -> f64 {
        let mut totals: Vec<u32> = carry
            .totals_for_season(season - 1)
            .map(|(_, points)| points)
            .collect();
        if totals.is_empty() || self.n == 0 {
            return 0.0;
        }
        totals.sort_unstable();
        let bottom = &totals[..self.n.min(totals.len())];
        bottom.iter().map(|p| f64::from(*p)).sum::<f64>() / bottom.len() as f64
    }
}

pub fn baseline_provider(choice: PromotedBaseline) -> Box<dyn BaselineProvider> {
    match choice {
        PromotedBaseline::Zero => Box::new(ZeroBaseline),
        PromotedBaseline::BottomAverage(n) => Box::new(BottomAverageBaseline { n }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorPoints {
    Observed(u32),
    Baseline(f64),
}

impl PriorPoints {
    pub fn value(self) -> f64 {
        match self {
            PriorPoints::Observed(points) => f64::from(points),
            PriorPoints::Baseline(value) => value,
        }
    }

    pub fn is_baseline(self) -> bool {
        matches!(self, PriorPoints::Baseline(_))
    }
}

/// End-of-season totals, carried into the following season as a baseline.
#[derive(Debug, Clone, Default)]
pub struct SeasonCarryForward {
    totals: BTreeMap<(i32, String), u32>,
}

impl SeasonCarryForward {
    pub fn from_records(records: &[TeamMatchRecord]) -> Self {
        let mut totals: BTreeMap<(i32, String), u32> = BTreeMap::new();
        for r in records {
            *totals.entry((r.season, r.team.clone())).or_insert(0) += r.points;
        }
        Self { totals }
    }

    pub fn season_total(&self, season: i32, team: &str) -> Option<u32> {
        self.totals.get(&(season, team.to_string())).copied()
    }

    pub fn totals_for_season(&self, season: i32) -> impl Iterator<Item = (&str, u32)> {
        self.totals
            .range((season, String::new())..(season + 1, String::new()))
            .map(|((_, team), points)| (team.as_str(), *points))
    }

    /// (season, team) -> points the team earned in `season - 1`.
    pub fn prior_season_points(&self) -> BTreeMap<(i32, String), u32> {
        self.totals
            .iter()
            .map(|((season, team), points)| ((season + 1, team.clone()), *points))
            .collect()
    }

    pub fn prev_season_points(
        &self,
        season: i32,
        team: &str,
        provider: &dyn BaselineProvider,
    ) -> PriorPoints {
        match self.season_total(season - 1, team) {
            Some(points) => PriorPoints::Observed(points),
            None => PriorPoints::Baseline(provider.baseline(season, team, self)),
        }
    }
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    date: NaiveDate,
    points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeasonForm {
    pub sum: f64,
    pub mean: f64,
}

/// Per (season, team) chronological points with prefix sums, answering
/// "points earned strictly before date d" in O(log n).
#[derive(Debug, Clone, Default)]
pub struct SeasonLedger {
    entries: HashMap<(i32, String), (Vec<LedgerEntry>, Vec<u32>)>,
}

impl SeasonLedger {
    pub fn from_records(records: &[TeamMatchRecord]) -> Self {
        let mut grouped: HashMap<(i32, String), Vec<&TeamMatchRecord>> = HashMap::new();
        for r in records {
            grouped.entry((r.season, r.team.clone())).or_default().push(r);
        }

        let entries = grouped
            .into_iter()
            .map(|(key, mut rows)| {
                rows.sort_by_key(|r| (r.date, r.seq));
                let mut prefix = Vec::with_capacity(rows.len() + 1);
                prefix.push(0u32);
                let mut running = 0u32;
                let ledger: Vec<LedgerEntry> = rows
                    .iter()
                    .map(|r| {
                        running += r.points;
                        prefix.push(running);
                        LedgerEntry {
                            date: r.date,
                            points: r.points,
                        }
                    })
                    .collect();
                (key, (ledger, prefix))
            })
            .collect();
        Self { entries }
    }

    pub fn points_before(&self, season: i32, team: &str, as_of: NaiveDate) -> u32 {
        let Some((ledger, prefix)) = self.entries.get(&(season, team.to_string())) else {
            return 0;
        };
        prefix[cutoff(ledger, as_of)]
    }

    /// Last `window` results of the same season, strictly before `as_of`.
    pub fn form_before(&self, season: i32, team: &str, as_of: NaiveDate, window: usize) -> SeasonForm {
        let Some((ledger, _)) = self.entries.get(&(season, team.to_string())) else {
            return SeasonForm::default();
        };
        let prior = &ledger[..cutoff(ledger, as_of)];
        let recent = &prior[prior.len().saturating_sub(window)..];
        if recent.is_empty() {
            return SeasonForm::default();
        }
        let sum = recent.iter().map(|e| f64::from(e.points)).sum::<f64>();
        SeasonForm {
            sum,
            mean: sum / recent.len() as f64,
        }
    }
}

fn cutoff(ledger: &[LedgerEntry], as_of: NaiveDate) -> usize {
    ledger.partition_point(|e| e.date < as_of)
}

/// Reference form of the season-to-date total: a straight filter over all
/// records. `SeasonLedger::points_before` answers the same question.
pub fn current_season_points_to_date(
    records: &[TeamMatchRecord],
    as_of: NaiveDate,
    season: i32,
    team: &str,
) -> u32 {
    records
        .iter()
        .filter(|r| r.season == season && r.team == team && r.date < as_of)
        .map(|r| r.points)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_store::Match;
    use crate::team_history::expand;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_seasons() -> Vec<TeamMatchRecord> {
        expand(&[
            Match::new(2019, day(2019, 8, 10), "A", "B", 2, 0),
            Match::new(2019, day(2019, 8, 17), "C", "A", 1, 1),
            Match::new(2019, day(2019, 8, 24), "B", "C", 3, 1),
            Match::new(2020, day(2020, 9, 12), "A", "D", 0, 0),
            Match::new(2020, day(2020, 9, 19), "D", "B", 2, 1),
        ])
    }

    #[test]
    fn prior_season_totals_carry_forward_exactly() {
        let carry = SeasonCarryForward::from_records(&two_seasons());
        let prior = carry.prior_season_points();
        assert_eq!(prior.get(&(2020, "A".to_string())), Some(&4));
        assert_eq!(prior.get(&(2020, "B".to_string())), Some(&3));
        assert_eq!(prior.get(&(2020, "C".to_string())), Some(&1));
        assert_eq!(
            carry.prev_season_points(2020, "A", &ZeroBaseline),
            PriorPoints::Observed(4)
        );
    }

    #[test]
    fn promoted_team_gets_the_injected_baseline() {
        let carry = SeasonCarryForward::from_records(&two_seasons());
        assert_eq!(
            carry.prev_season_points(2020, "D", &ZeroBaseline),
            PriorPoints::Baseline(0.0)
        );
        // 2019 totals: A=4, B=3, C=1 -> bottom two average 2.0.
        let prior = carry.prev_season_points(2020, "D", &BottomAverageBaseline { n: 2 });
        assert_eq!(prior, PriorPoints::Baseline(2.0));
        assert!(prior.is_baseline());
        // No previous season at all.
        assert_eq!(
            carry
                .prev_season_points(2019, "A", &BottomAverageBaseline { n: 3 })
                .value(),
            0.0
        );
    }

    #[test]
    fn season_to_date_is_strictly_before_and_resets() {
        let records = two_seasons();
        let ledger = SeasonLedger::from_records(&records);
        assert_eq!(ledger.points_before(2019, "A", day(2019, 8, 10)), 0);
        assert_eq!(ledger.points_before(2019, "A", day(2019, 8, 17)), 3);
        assert_eq!(ledger.points_before(2019, "A", day(2019, 9, 1)), 4);
        assert_eq!(ledger.points_before(2020, "A", day(2020, 9, 12)), 0);
        assert_eq!(ledger.points_before(2020, "Z", day(2020, 9, 12)), 0);

        for r in &records {
            assert_eq!(
                ledger.points_before(r.season, &r.team, r.date),
                current_season_points_to_date(&records, r.date, r.season, &r.team)
            );
        }
    }

    #[test]
    fn season_form_uses_last_results_of_the_season() {
        let ledger = SeasonLedger::from_records(&two_seasons());
        let form = ledger.form_before(2019, "A", day(2019, 9, 1), 1);
        assert_eq!(form, SeasonForm { sum: 1.0, mean: 1.0 });
        let form = ledger.form_before(2019, "A", day(2019, 9, 1), 5);
        assert_eq!(form, SeasonForm { sum: 4.0, mean: 2.0 });
        assert_eq!(
            ledger.form_before(2020, "A", day(2020, 9, 12), 5),
            SeasonForm::default()
        );
    }
}
