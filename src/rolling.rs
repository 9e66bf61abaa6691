use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::team_history::TeamMatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    GoalsFor,
    GoalsAgainst,
    Shots,
    ShotsOnTarget,
    Cards,
    Points,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::GoalsFor,
        Stat::GoalsAgainst,
        Stat::Shots,
        Stat::ShotsOnTarget,
        Stat::Cards,
        Stat::Points,
    ];

    pub fn column_stem(self) -> &'static str {
        match self {
            Stat::GoalsFor => "goals_for",
            Stat::GoalsAgainst => "goals_against",
            Stat::Shots => "shots",
            Stat::ShotsOnTarget => "shots_on_target",
            Stat::Cards => "cards",
            Stat::Points => "points",
        }
    }

    /// `None` means the stat was not reported for that match.
    pub fn value(self, record: &TeamMatchRecord) -> Option<u32> {
        match self {
            Stat::GoalsFor => Some(record.goals_for),
            Stat::GoalsAgainst => Some(record.goals_against),
            Stat::Shots => record.shots,
            Stat::ShotsOnTarget => record.shots_on_target,
            Stat::Cards => Some(record.cards),
            Stat::Points => Some(record.points),
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStat {
    pub mean: f64,
    pub sum: f64,
    // Reported values that fell inside the window.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingRecord {
    pub record: TeamMatchRecord,
    // Number of the team's records dated strictly before this one.
    pub history_len: usize,
    stats: [WindowStat; 6],
}

impl RollingRecord {
    pub fn stat(&self, stat: Stat) -> WindowStat {
        self.stats[stat.slot()]
    }

    pub fn mean(&self, stat: Stat) -> f64 {
        self.stat(stat).mean
    }

    pub fn sum(&self, stat: Stat) -> f64 {
        self.stat(stat).sum
    }

    /// True when both records were rolled over the same history.
    pub fn same_window(&self, other: &RollingRecord) -> bool {
        self.history_len == other.history_len && self.stats == other.stats
    }
}

/// Lagged rolling mean/sum per team. Each record's window holds up to
/// `window` of the same team's records dated strictly earlier; the record
/// itself and same-day records never contribute. An empty window yields 0.
///
/// Teams are independent and are rolled in parallel on the current rayon
/// pool. Output is ordered by team name, then chronologically.
pub fn rolling(records: Vec<TeamMatchRecord>, window: usize) -> Vec<RollingRecord> {
    let mut by_team: BTreeMap<String, Vec<TeamMatchRecord>> = BTreeMap::new();
    for r in records {
        by_team.entry(r.team.clone()).or_default().push(r);
    }

    let groups: Vec<Vec<TeamMatchRecord>> = by_team.into_values().collect();
    groups
        .into_par_iter()
        .map(|mut team_records| {
            team_records.sort_by_key(|r| (r.date, r.seq));
            roll_team(&team_records, window)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

fn roll_team(records: &[TeamMatchRecord], window: usize) -> Vec<RollingRecord> {
    let mut out = Vec::with_capacity(records.len());
    // First index of the current calendar date; everything before it is history.
    let mut day_start = 0usize;
    for (i, record) in records.iter().enumerate() {
        if i > 0 && records[i - 1].date != record.date {
            day_start = i;
        }
        let prior = &records[..day_start];
        let lagged = &prior[prior.len().saturating_sub(window)..];
        out.push(RollingRecord {
            record: record.clone(),
            history_len: prior.len(),
            stats: Stat::ALL.map(|stat| window_stat(lagged, stat)),
        });
    }
    out
}

// Recomputed from the window every time (no running add/subtract), so the
// value depends only on the window contents and never on how much earlier
// history happened to be loaded.
fn window_stat(window: &[TeamMatchRecord], stat: Stat) -> WindowStat {
    let mut sum = 0.0_f64;
    let mut count = 0usize;
    for record in window {
        if let Some(v) = stat.value(record) {
            sum += f64::from(v);
            count += 1;
        }
    }
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };
    WindowStat { mean, sum, count }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn rec(team: &str, day: u32, seq: usize, goals_for: u32, shots: Option<u32>) -> TeamMatchRecord {
        TeamMatchRecord {
            season: 2019,
            date: NaiveDate::from_ymd_opt(2019, 8, day).unwrap(),
            seq,
            team: team.to_string(),
            opponent: "X".to_string(),
            is_home: true,
            goals_for,
            goals_against: 0,
            shots,
            shots_on_target: None,
            cards: 0,
            points: 3,
        }
    }

    #[test]
    fn first_record_has_zeroed_window() {
        let out = rolling(vec![rec("A", 1, 0, 4, Some(9))], 5);
        assert_eq!(out.len(), 1);
        for stat in Stat::ALL {
            assert_eq!(out[0].mean(stat), 0.0);
            assert_eq!(out[0].sum(stat), 0.0);
        }
        assert_eq!(out[0].history_len, 0);
    }

    #[test]
    fn window_is_lagged_and_adaptive() {
        let records: Vec<_> = (0..8)
            .map(|i| rec("A", i + 1, i as usize, i, Some(10)))
            .collect();
        let out = rolling(records, 5);

        // Third match sees goals 0 and 1 only.
        assert_eq!(out[2].sum(Stat::GoalsFor), 1.0);
        assert_eq!(out[2].mean(Stat::GoalsFor), 0.5);
        // Eighth match sees matches 3..=7 (goals 2..=6).
        assert_eq!(out[7].sum(Stat::GoalsFor), 20.0);
        assert_eq!(out[7].mean(Stat::GoalsFor), 4.0);
        assert_eq!(out[7].stat(Stat::GoalsFor).count, 5);
        assert_eq!(out[7].history_len, 7);
    }

    #[test]
    fn missing_values_are_skipped_not_zeroed() {
        let records = vec![
            rec("A", 1, 0, 0, Some(10)),
            rec("A", 2, 1, 0, None),
            rec("A", 3, 2, 0, Some(20)),
            rec("A", 4, 3, 0, None),
        ];
        let out = rolling(records, 5);
        let shots = out[3].stat(Stat::Shots);
        assert_eq!(shots.count, 2);
        assert_eq!(shots.sum, 30.0);
        assert_eq!(shots.mean, 15.0);

        // Only missing values in the window still yields the numeric default.
        let out = rolling(vec![rec("B", 1, 0, 0, None), rec("B", 2, 1, 0, None)], 5);
        assert_eq!(out[1].mean(Stat::Shots), 0.0);
    }

    #[test]
    fn same_day_records_never_see_each_other() {
        let records = vec![
            rec("A", 1, 0, 2, None),
            rec("A", 2, 1, 5, None),
            rec("A", 2, 2, 7, None),
        ];
        let out = rolling(records, 5);
        assert_eq!(out[1].sum(Stat::GoalsFor), 2.0);
        assert_eq!(out[2].sum(Stat::GoalsFor), 2.0);
        assert!(out[1].same_window(&out[2]));
        assert!(!out[0].same_window(&out[1]));
    }

    #[test]
    fn teams_are_independent_and_grouped() {
        let records = vec![
            rec("B", 1, 0, 1, None),
            rec("A", 1, 0, 3, None),
            rec("A", 2, 1, 0, None),
            rec("B", 2, 1, 0, None),
        ];
        let out = rolling(records, 5);
        let teams: Vec<&str> = out.iter().map(|r| r.record.team.as_str()).collect();
        assert_eq!(teams, vec!["A", "A", "B", "B"]);
        assert_eq!(out[1].sum(Stat::GoalsFor), 3.0);
        assert_eq!(out[3].sum(Stat::GoalsFor), 1.0);
    }
}
