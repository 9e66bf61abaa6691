use chrono::NaiveDate;

use crate::match_store::Match;

/// One match seen from one team's side. Always derived, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMatchRecord {
    pub season: i32,
    pub date: NaiveDate,
    // Position of the source match in the chronological store; orders
    // records that share a date.
    pub seq: usize,
    pub team: String,
    pub opponent: String,
    pub is_home: bool,
    pub goals_for: u32,
    pub goals_against: u32,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub cards: u32,
    pub points: u32,
}

pub fn expand(matches: &[Match]) -> Vec<TeamMatchRecord> {
    let mut out = Vec::with_capacity(matches.len() * 2);
    for (seq, m) in matches.iter().enumerate() {
        out.push(TeamMatchRecord {
            season: m.season,
            date: m.date,
            seq,
            team: m.home_team.clone(),
            opponent: m.away_team.clone(),
            is_home: true,
            goals_for: m.home.goals,
            goals_against: m.away.goals,
            shots: m.home.shots,
            shots_on_target: m.home.shots_on_target,
            cards: m.home.cards(),
            points: m.result.home_points(),
        });
        out.push(TeamMatchRecord {
            season: m.season,
            date: m.date,
            seq,
            team: m.away_team.clone(),
            opponent: m.home_team.clone(),
            is_home: false,
            goals_for: m.away.goals,
            goals_against: m.home.goals,
            shots: m.away.shots,
            shots_on_target: m.away.shots_on_target,
            cards: m.away.cards(),
            points: m.result.away_points(),
        });
    }
    out
}
