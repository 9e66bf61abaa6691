use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{MalformedReason, PipelineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    pub fn from_goals(home_goals: u32, away_goals: u32) -> Self {
        if home_goals > away_goals {
            Outcome::Home
        } else if home_goals < away_goals {
            Outcome::Away
        } else {
            Outcome::Draw
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "H" => Some(Outcome::Home),
            "D" => Some(Outcome::Draw),
            "A" => Some(Outcome::Away),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Outcome::Home => 'H',
            Outcome::Draw => 'D',
            Outcome::Away => 'A',
        }
    }

    pub fn home_points(self) -> u32 {
        match self {
            Outcome::Home => 3,
            Outcome::Draw => 1,
            Outcome::Away => 0,
        }
    }

    pub fn away_points(self) -> u32 {
        match self {
            Outcome::Home => 0,
            Outcome::Draw => 1,
            Outcome::Away => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideStats {
    pub goals: u32,
    pub shots: Option<u32>,
    pub shots_on_target: Option<u32>,
    pub yellow_cards: Option<u32>,
    pub red_cards: Option<u32>,
}

impl SideStats {
    pub fn with_goals(goals: u32) -> Self {
        Self {
            goals,
            ..Self::default()
        }
    }

    // A red counts double; an unreported colour counts as none.
    pub fn cards(&self) -> u32 {
        let reds = self.red_cards.unwrap_or(0).saturating_mul(2);
        self.yellow_cards.unwrap_or(0).saturating_add(reds)
    }

    fn has_cards(&self) -> bool {
        self.yellow_cards.is_some() || self.red_cards.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub season: i32,
    pub date: NaiveDate,
    pub kickoff: Option<NaiveTime>,
    pub home_team: String,
    pub away_team: String,
    pub home: SideStats,
    pub away: SideStats,
    pub result: Outcome,
}

impl Match {
    pub fn new(
        season: i32,
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u32,
        away_goals: u32,
    ) -> Self {
        Self {
            season,
            date,
            kickoff: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home: SideStats::with_goals(home_goals),
            away: SideStats::with_goals(away_goals),
            result: Outcome::from_goals(home_goals, away_goals),
        }
    }

    pub fn key(&self) -> MatchKey {
        MatchKey {
            season: self.season,
            date: self.date,
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
        }
    }

    pub fn fixture_key(&self) -> FixtureKey {
        FixtureKey {
            date: self.date,
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }

    pub fn points_for(&self, team: &str) -> u32 {
        if self.home_team == team {
            self.result.home_points()
        } else if self.away_team == team {
            self.result.away_points()
        } else {
            0
        }
    }

    pub fn goals_for(&self, team: &str) -> u32 {
        if self.home_team == team {
            self.home.goals
        } else if self.away_team == team {
            self.away.goals
        } else {
            0
        }
    }

    // An unknown kickoff sorts after every timed match that day.
    fn chrono_key(&self) -> (NaiveDate, bool, Option<NaiveTime>) {
        (self.date, self.kickoff.is_none(), self.kickoff)
    }
}

/// Identity of a match inside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub season: i32,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
}

impl MatchKey {
    pub fn fixture(&self) -> FixtureKey {
        FixtureKey {
            date: self.date,
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} vs {}",
            self.season, self.date, self.home_team, self.away_team
        )
    }
}

/// Identity used to detect already-published rows during incremental updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureKey {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
}

/// An unvalidated row as handed over by a loader. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMatch {
    pub season: Option<i32>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: Option<String>,
    pub away_goals: Option<String>,
    pub result: Option<String>,
    pub home_shots: Option<String>,
    pub away_shots: Option<String>,
    pub home_shots_on_target: Option<String>,
    pub away_shots_on_target: Option<String>,
    pub home_yellow_cards: Option<String>,
    pub away_yellow_cards: Option<String>,
    pub home_red_cards: Option<String>,
    pub away_red_cards: Option<String>,
}

impl RawMatch {
    pub fn label(&self) -> String {
        format!(
            "{} {} vs {}",
            self.date.as_deref().unwrap_or("?"),
            self.home_team.as_deref().unwrap_or("?"),
            self.away_team.as_deref().unwrap_or("?")
        )
    }

    pub fn validate(&self, aliases: &TeamAliases) -> Result<Match, MalformedReason> {
        let season = self.season.ok_or(MalformedReason::MissingField("season"))?;
        let date_raw = required_text(&self.date, "date")?;
        let date = parse_match_date(date_raw)
            .ok_or_else(|| MalformedReason::InvalidDate(date_raw.to_string()))?;
        let kickoff = match non_empty(&self.time) {
            Some(raw) => Some(
                parse_kickoff(raw).ok_or_else(|| MalformedReason::InvalidTime(raw.to_string()))?,
            ),
            None => None,
        };
        let home_team = aliases.canonical(required_text(&self.home_team, "home_team")?);
        let away_team = aliases.canonical(required_text(&self.away_team, "away_team")?);
        if home_team == away_team {
            return Err(MalformedReason::SameTeam(home_team));
        }

        let home_goals = parse_count("home_goals", &self.home_goals)?
            .ok_or(MalformedReason::MissingField("home_goals"))?;
        let away_goals = parse_count("away_goals", &self.away_goals)?
            .ok_or(MalformedReason::MissingField("away_goals"))?;

        let from_score = Outcome::from_goals(home_goals, away_goals);
        let result = match non_empty(&self.result) {
            Some(code) => {
                let parsed = Outcome::from_code(code)
                    .ok_or_else(|| MalformedReason::InvalidResult(code.to_string()))?;
                if parsed != from_score {
                    return Err(MalformedReason::ResultMismatch {
                        code: parsed.code(),
                        home_goals,
                        away_goals,
                    });
                }
                parsed
            }
            None => from_score,
        };

        Ok(Match {
            season,
            date,
            kickoff,
            home_team,
            away_team,
            home: SideStats {
                goals: home_goals,
                shots: parse_count("home_shots", &self.home_shots)?,
                shots_on_target: parse_count("home_shots_on_target", &self.home_shots_on_target)?,
                yellow_cards: parse_count("home_yellow_cards", &self.home_yellow_cards)?,
                red_cards: parse_count("home_red_cards", &self.home_red_cards)?,
            },
            away: SideStats {
                goals: away_goals,
                shots: parse_count("away_shots", &self.away_shots)?,
                shots_on_target: parse_count("away_shots_on_target", &self.away_shots_on_target)?,
                yellow_cards: parse_count("away_yellow_cards", &self.away_yellow_cards)?,
                red_cards: parse_count("away_red_cards", &self.away_red_cards)?,
            },
            result,
        })
    }
}

/// Maps spellings that drift between season files onto one canonical name.
#[derive(Debug, Clone)]
pub struct TeamAliases {
    map: HashMap<String, String>,
}

impl TeamAliases {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.map.insert(alias.into(), canonical.into());
    }

    pub fn canonical(&self, name: &str) -> String {
        let trimmed = name.trim();
        self.map
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}

impl Default for TeamAliases {
    fn default() -> Self {
        let mut aliases = Self::empty();
        aliases.insert("Nottm Forest", "Nott'm Forest");
        aliases.insert("Fullham", "Fulham");
        aliases
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Coverage {
    Full,
    Partial,
    Absent,
}

impl Coverage {
    fn from_counts(present: usize, total: usize) -> Self {
        if total > 0 && present == total {
            Coverage::Full
        } else if present == 0 {
            Coverage::Absent
        } else {
            Coverage::Partial
        }
    }
}

/// Which optional per-side stats the store actually carries. Computed once
/// when the store is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatCapabilities {
    pub shots: Coverage,
    pub shots_on_target: Coverage,
    pub cards: Coverage,
    pub missing_shots: usize,
    pub missing_shots_on_target: usize,
    pub missing_cards: usize,
}

impl StatCapabilities {
    pub fn from_matches(matches: &[Match]) -> Self {
        // Counted per side, so a store of n matches has 2n slots per stat.
        let total = matches.len() * 2;
        let mut shots = 0usize;
        let mut on_target = 0usize;
        let mut cards = 0usize;
        for m in matches {
            for side in [&m.home, &m.away] {
                shots += usize::from(side.shots.is_some());
                on_target += usize::from(side.shots_on_target.is_some());
                cards += usize::from(side.has_cards());
            }
        }
        Self {
            shots: Coverage::from_counts(shots, total),
            shots_on_target: Coverage::from_counts(on_target, total),
            cards: Coverage::from_counts(cards, total),
            missing_shots: total - shots,
            missing_shots_on_target: total - on_target,
            missing_cards: total - cards,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub row: usize,
    pub label: String,
    pub reason: MalformedReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub collapsed_duplicates: usize,
    pub rejected: Vec<RejectedRecord>,
    pub capabilities: StatCapabilities,
}

/// Chronologically ordered, identity-unique set of matches.
#[derive(Debug, Clone, Default)]
pub struct MatchStore {
    matches: Vec<Match>,
}

impl MatchStore {
    pub fn from_matches(matches: impl IntoIterator<Item = Match>) -> Result<Self, PipelineError> {
        let mut out = Vec::new();
        let mut index = HashMap::new();
        for m in matches {
            merge_match(&mut out, &mut index, 0, m)?;
        }
        Ok(Self::sorted(out))
    }

    /// Validates raw rows one by one. Malformed rows are reported and skipped;
    /// conflicting duplicates abort the whole batch.
    pub fn ingest(
        rows: &[RawMatch],
        aliases: &TeamAliases,
    ) -> Result<(Self, IngestReport), PipelineError> {
        let mut valid = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();
        for (row, raw) in rows.iter().enumerate() {
            match raw.validate(aliases) {
                Ok(m) => valid.push(m),
                Err(reason) => {
                    warn!("rejecting row {row} ({}): {reason}", raw.label());
                    rejected.push(RejectedRecord {
                        row,
                        label: raw.label(),
                        reason,
                    });
                }
            }
        }

        let validated = valid.len();
        let store = Self::from_matches(valid)?;
        let capabilities = StatCapabilities::from_matches(&store.matches);
        let report = IngestReport {
            accepted: store.len(),
            collapsed_duplicates: validated - store.len(),
            rejected,
            capabilities,
        };
        info!(
            "ingested {} matches ({} rejected, {} duplicate rows collapsed)",
            report.accepted,
            report.rejected.len(),
            report.collapsed_duplicates
        );
        Ok((store, report))
    }

    /// Union with an incoming batch. Returns the new store and the keys that
    /// were not already present.
    pub fn union(
        &self,
        incoming: impl IntoIterator<Item = Match>,
    ) -> Result<(Self, Vec<MatchKey>), PipelineError> {
        let mut out = self.matches.clone();
        let mut index: HashMap<MatchKey, usize> = out
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.key(), idx))
            .collect();
        let stored = out.len();
        let mut added = Vec::new();
        for m in incoming {
            let key = m.key();
            if merge_match(&mut out, &mut index, stored, m)? {
                added.push(key);
            }
        }
        Ok((Self::sorted(out), added))
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, key: &MatchKey) -> Option<&Match> {
        self.matches.iter().find(|m| m.key() == *key)
    }

    pub fn seasons(&self) -> BTreeSet<i32> {
        self.matches.iter().map(|m| m.season).collect()
    }

    pub fn capabilities(&self) -> StatCapabilities {
        StatCapabilities::from_matches(&self.matches)
    }

    fn sorted(mut matches: Vec<Match>) -> Self {
        // Stable: same date and kickoff (or none) keeps input order.
        matches.sort_by_key(|m| m.chrono_key());
        Self { matches }
    }
}

// Returns true when the match was added, false when an identical copy was
// already present. `stored` marks where previously persisted history ends.
fn merge_match(
    out: &mut Vec<Match>,
    index: &mut HashMap<MatchKey, usize>,
    stored: usize,
    m: Match,
) -> Result<bool, PipelineError> {
    let key = m.key();
    if let Some(&idx) = index.get(&key) {
        let existing = &out[idx];
        if *existing == m {
            debug!("collapsing identical duplicate {key}");
            return Ok(false);
        }
        let existing = Box::new(existing.clone());
        let incoming = Box::new(m);
        return Err(if idx < stored {
            PipelineError::IntegrityViolation {
                key,
                existing,
                incoming,
            }
        } else {
            PipelineError::DuplicateIdentity {
                key,
                first: existing,
                second: incoming,
            }
        });
    }
    index.insert(key, out.len());
    out.push(m);
    Ok(true)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required_text<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, MalformedReason> {
    non_empty(value).ok_or(MalformedReason::MissingField(field))
}

/// Upper bound for any per-side goal, shot or card count.
pub const MAX_COUNT: u32 = 1_000;

fn parse_count(field: &'static str, value: &Option<String>) -> Result<Option<u32>, MalformedReason> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    let invalid = || MalformedReason::InvalidNumber {
        field,
        value: raw.to_string(),
    };
    let n = match raw.parse::<u32>() {
        Ok(n) => n,
        // Some exports write counts as floats ("2.0").
        Err(_) => match raw.parse::<f64>() {
            Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(MAX_COUNT) => f as u32,
            _ => return Err(invalid()),
        },
    };
    if n > MAX_COUNT {
        return Err(invalid());
    }
    Ok(Some(n))
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('/') {
        let year_digits = raw.rsplit('/').next().map(str::len).unwrap_or(0);
        let fmt = if year_digits == 2 { "%d/%m/%y" } else { "%d/%m/%Y" };
        return NaiveDate::parse_from_str(raw, fmt).ok();
    }
    // ISO, optionally followed by a time component.
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_kickoff(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raw(date: &str, home: &str, away: &str, hg: &str, ag: &str) -> RawMatch {
        RawMatch {
            season: Some(2019),
            date: Some(date.to_string()),
            home_team: Some(home.to_string()),
            away_team: Some(away.to_string()),
            home_goals: Some(hg.to_string()),
            away_goals: Some(ag.to_string()),
            ..RawMatch::default()
        }
    }

    #[test]
    fn parses_football_data_dates() {
        assert_eq!(parse_match_date("10/08/2019"), Some(day(2019, 8, 10)));
        assert_eq!(parse_match_date("10/08/19"), Some(day(2019, 8, 10)));
        assert_eq!(parse_match_date("2019-08-10"), Some(day(2019, 8, 10)));
        assert_eq!(parse_match_date("2019-08-10 00:00:00"), Some(day(2019, 8, 10)));
        assert_eq!(parse_match_date("yesterday"), None);
    }

    #[test]
    fn malformed_rows_are_reported_not_fatal() {
        let rows = vec![
            raw("10/08/2019", "A", "B", "2", "0"),
            raw("", "A", "C", "1", "1"),
            raw("17/08/2019", "B", "A", "x", "1"),
            raw("24/08/2019", "C", "C", "0", "0"),
        ];
        let (store, report) = MatchStore::ingest(&rows, &TeamAliases::default()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(report.rejected.len(), 3);
        assert_eq!(report.rejected[0].reason, MalformedReason::MissingField("date"));
        assert!(matches!(
            report.rejected[1].reason,
            MalformedReason::InvalidNumber { field: "home_goals", .. }
        ));
        assert_eq!(report.rejected[2].reason, MalformedReason::SameTeam("C".into()));
    }

    #[test]
    fn result_code_must_agree_with_score() {
        let mut row = raw("10/08/2019", "A", "B", "2", "0");
        row.result = Some("A".to_string());
        assert_eq!(
            row.validate(&TeamAliases::default()),
            Err(MalformedReason::ResultMismatch {
                code: 'A',
                home_goals: 2,
                away_goals: 0
            })
        );
        row.result = Some("h".to_string());
        assert_eq!(
            row.validate(&TeamAliases::default()).unwrap().result,
            Outcome::Home
        );
    }

    #[test]
    fn optional_stats_stay_missing_and_cards_weight_reds() {
        let mut row = raw("10/08/2019", "Nottm Forest", "B", "0", "0");
        row.home_yellow_cards = Some("2".into());
        row.home_red_cards = Some("1".into());
        let m = row.validate(&TeamAliases::default()).unwrap();
        assert_eq!(m.home_team, "Nott'm Forest");
        assert_eq!(m.home.shots, None);
        assert_eq!(m.home.cards(), 4);
        assert_eq!(m.away.cards(), 0);
    }

    #[test]
    fn identical_duplicates_collapse_conflicting_ones_fail() {
        let a = Match::new(2019, day(2019, 8, 10), "A", "B", 2, 0);
        let store = MatchStore::from_matches(vec![a.clone(), a.clone()]).unwrap();
        assert_eq!(store.len(), 1);

        let conflicting = Match::new(2019, day(2019, 8, 10), "A", "B", 1, 0);
        let err = MatchStore::from_matches(vec![a, conflicting]).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateIdentity { .. }));
    }

    #[test]
    fn union_surfaces_integrity_violations_with_both_records() {
        let a = Match::new(2019, day(2019, 8, 10), "A", "B", 2, 0);
        let store = MatchStore::from_matches(vec![a.clone()]).unwrap();
        let mut changed = a.clone();
        changed.home.shots = Some(11);
        match store.union(vec![changed.clone()]) {
            Err(PipelineError::IntegrityViolation {
                existing, incoming, ..
            }) => {
                assert_eq!(*existing, a);
                assert_eq!(*incoming, changed);
            }
            other => panic!("expected integrity violation, got {other:?}"),
        }

        let later = Match::new(2019, day(2019, 8, 17), "B", "A", 1, 1);
        let (merged, added) = store.union(vec![a, later.clone()]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(added, vec![later.key()]);
    }

    #[test]
    fn store_is_chronological_and_stable() {
        let late = Match::new(2019, day(2019, 8, 17), "B", "A", 1, 1);
        let first = Match::new(2019, day(2019, 8, 10), "C", "D", 0, 0);
        let second = Match::new(2019, day(2019, 8, 10), "A", "B", 2, 0);
        let store = MatchStore::from_matches(vec![late, first, second]).unwrap();
        let order: Vec<&str> = store.iter().map(|m| m.home_team.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn untimed_matches_follow_timed_ones_on_the_same_day() {
        let untimed = Match::new(2019, day(2019, 8, 10), "E", "F", 0, 0);
        let mut evening = Match::new(2019, day(2019, 8, 10), "A", "B", 1, 0);
        evening.kickoff = NaiveTime::from_hms_opt(17, 30, 0);
        let mut lunch = Match::new(2019, day(2019, 8, 10), "C", "D", 2, 2);
        lunch.kickoff = NaiveTime::from_hms_opt(12, 30, 0);
        let earlier = Match::new(2019, day(2019, 8, 9), "G", "H", 0, 1);
        let store = MatchStore::from_matches(vec![untimed, evening, lunch, earlier]).unwrap();
        let order: Vec<&str> = store.iter().map(|m| m.home_team.as_str()).collect();
        assert_eq!(order, vec!["G", "C", "A", "E"]);
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let mut reds = raw("10/08/2019", "A", "B", "1", "0");
        reds.home_red_cards = Some("4294967295".into());
        let mut goals = raw("17/08/2019", "B", "A", "5000", "0");
        goals.result = Some("H".into());
        let mut shots = raw("24/08/2019", "A", "C", "0", "0");
        shots.away_shots = Some("1e9".into());
        let ok = raw("31/08/2019", "C", "B", "1000", "0");

        let (store, report) =
            MatchStore::ingest(&[reds, goals, shots, ok], &TeamAliases::default()).unwrap();
        assert_eq!(report.accepted, 1);
        assert_eq!(store.matches()[0].home.goals, MAX_COUNT);
        let fields: Vec<&str> = report
            .rejected
            .iter()
            .map(|r| match r.reason {
                MalformedReason::InvalidNumber { field, .. } => field,
                ref other => panic!("unexpected rejection {other:?}"),
            })
            .collect();
        assert_eq!(fields, vec!["home_red_cards", "home_goals", "away_shots"]);
    }

    #[test]
    fn card_weighting_never_overflows() {
        let side = SideStats {
            yellow_cards: Some(u32::MAX),
            red_cards: Some(u32::MAX),
            ..SideStats::default()
        };
        assert_eq!(side.cards(), u32::MAX);
    }

    #[test]
    fn capabilities_describe_optional_stats_once() {
        let mut a = Match::new(2019, day(2019, 8, 10), "A", "B", 2, 0);
        a.home.shots = Some(10);
        a.away.shots = Some(4);
        let b = Match::new(2019, day(2019, 8, 17), "B", "A", 1, 1);
        let caps = StatCapabilities::from_matches(&[a, b]);
        assert_eq!(caps.shots, Coverage::Partial);
        assert_eq!(caps.shots_on_target, Coverage::Absent);
        assert_eq!(caps.missing_shots, 2);
    }
}
