use std::collections::HashMap;

use rayon::prelude::*;

use crate::config::H2hStrategy;
use crate::match_store::{Match, MatchKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeadToHead {
    pub points_home: u32,
    pub points_away: u32,
    pub goals_home: u32,
    pub goals_away: u32,
    pub meetings: usize,
}

impl HeadToHead {
    // `home`/`away` are the sides of the match being described, not of the
    // past meeting; each side is credited by its own role in that meeting.
    fn credit(&mut self, home: &str, away: &str, past: &Match) {
        self.points_home += past.points_for(home);
        self.points_away += past.points_for(away);
        self.goals_home = self.goals_home.saturating_add(past.goals_for(home));
        self.goals_away = self.goals_away.saturating_add(past.goals_for(away));
        self.meetings += 1;
    }
}

pub type HeadToHeadTable = HashMap<MatchKey, HeadToHead>;

/// Head-to-head over at most `lookback` most recent meetings (either venue)
/// dated strictly before each match. `matches` must be chronological, as
/// `MatchStore::matches` is.
pub fn resolve(matches: &[Match], lookback: usize, strategy: H2hStrategy) -> HeadToHeadTable {
    match strategy {
        H2hStrategy::Indexed => {
            let index = PairIndex::build(matches);
            matches
                .par_iter()
                .enumerate()
                .map(|(idx, m)| (m.key(), index.resolve_one(matches, idx, lookback)))
                .collect()
        }
        H2hStrategy::Scan => matches
            .par_iter()
            .map(|m| (m.key(), scan_one(matches, m, lookback)))
            .collect(),
    }
}

// O(n) per match. Kept as the reference implementation.
fn scan_one(matches: &[Match], current: &Match, lookback: usize) -> HeadToHead {
    let home = current.home_team.as_str();
    let away = current.away_team.as_str();
    let mut past: Vec<(usize, &Match)> = matches
        .iter()
        .enumerate()
        .filter(|(_, p)| p.date < current.date && p.involves(home) && p.involves(away))
        .collect();
    // Most recent first; store position breaks same-date ties.
    past.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));

    let mut out = HeadToHead::default();
    for (_, p) in past.into_iter().take(lookback) {
        out.credit(home, away, p);
    }
    out
}

/// Unordered team pair -> store positions of their meetings, ascending.
pub struct PairIndex {
    meetings: HashMap<(String, String), Vec<usize>>,
}

impl PairIndex {
    pub fn build(matches: &[Match]) -> Self {
        let mut meetings: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for (idx, m) in matches.iter().enumerate() {
            meetings
                .entry(pair_key(&m.home_team, &m.away_team))
                .or_default()
                .push(idx);
        }
        Self { meetings }
    }

    pub fn meetings(&self, a: &str, b: &str) -> &[usize] {
        self.meetings
            .get(&pair_key(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn resolve_one(&self, matches: &[Match], idx: usize, lookback: usize) -> HeadToHead {
        let current = &matches[idx];
        let home = current.home_team.as_str();
        let away = current.away_team.as_str();
        let positions = self.meetings(home, away);
        let earlier = positions.partition_point(|&p| matches[p].date < current.date);

        let mut out = HeadToHead::default();
        for &p in positions[..earlier].iter().rev().take(lookback) {
            out.credit(home, away, &matches[p]);
        }
        out
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
