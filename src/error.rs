use chrono::NaiveDate;
use thiserror::Error;

use crate::match_store::{Match, MatchKey};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("duplicate match identity {key}: two rows in one batch disagree")]
    DuplicateIdentity {
        key: MatchKey,
        first: Box<Match>,
        second: Box<Match>,
    },

    #[error("integrity violation for {key}: incoming match conflicts with stored history")]
    IntegrityViolation {
        key: MatchKey,
        existing: Box<Match>,
        incoming: Box<Match>,
    },

    #[error("{team} has diverging histories on {date} in season {season}; (season, date, team) is ambiguous")]
    AmbiguousTeamDate {
        season: i32,
        date: NaiveDate,
        team: String,
    },

    #[error("no {side} history row for {key}")]
    MissingHistoryRow { key: MatchKey, side: &'static str },

    #[error("row {key} has {got} values but the table has {expected} columns")]
    RowWidth {
        key: MatchKey,
        expected: usize,
        got: usize,
    },

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),
}

/// Why a single raw row was rejected at ingestion. Reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum MalformedReason {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unparseable date `{0}`")]
    InvalidDate(String),

    #[error("unparseable kickoff time `{0}`")]
    InvalidTime(String),

    #[error("field `{field}` is not a non-negative integer: `{value}`")]
    InvalidNumber { field: &'static str, value: String },

    #[error("unknown result code `{0}`")]
    InvalidResult(String),

    #[error("result `{code}` disagrees with score {home_goals}-{away_goals}")]
    ResultMismatch {
        code: char,
        home_goals: u32,
        away_goals: u32,
    },

    #[error("home and away team are both `{0}`")]
    SameTeam(String),
}
