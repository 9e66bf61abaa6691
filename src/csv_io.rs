use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::Datelike;
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use log::{debug, warn};

use crate::features::MarketValues;
use crate::match_store::{RawMatch, TeamAliases, parse_match_date};
use crate::table::FeatureTable;

/// Key and label columns written ahead of the feature columns.
pub const KEY_HEADERS: [&str; 7] = [
    "season",
    "date",
    "home_team",
    "away_team",
    "result",
    "home_goals",
    "away_goals",
];

struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), idx))
            .collect();
        Self { positions }
    }

    fn first_of(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.positions.get(*n).copied())
    }

    fn text(&self, record: &StringRecord, names: &[&str]) -> Option<String> {
        let idx = self.first_of(names)?;
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Season label by start year: July onwards belongs to the season that
/// starts that year.
pub fn infer_season(date: chrono::NaiveDate) -> i32 {
    if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    }
}

pub fn read_football_data_csv(path: &Path, season: Option<i32>) -> Result<Vec<RawMatch>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open season file {}", path.display()))?;
    parse_football_data(file, season).with_context(|| format!("parse {}", path.display()))
}

/// Reads a football-data.co.uk style season file. Rows are returned raw;
/// validation happens in `MatchStore::ingest`. Without an explicit season
/// each row's season is inferred from its date.
pub fn parse_football_data<R: Read>(reader: R, season: Option<i32>) -> Result<Vec<RawMatch>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = HeaderIndex::new(rdr.headers().context("read csv header")?);
    if headers.first_of(&["HomeTeam", "Home"]).is_none() {
        return Err(anyhow!("no HomeTeam column in season file"));
    }

    let mut out = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("read csv record {}", line + 2))?;
        // football-data files pad the tail with empty rows.
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let date = headers.text(&record, &["Date"]);
        let row_season = season.or_else(|| {
            headers
                .text(&record, &["Season"])
                .and_then(|s| s.parse::<i32>().ok())
                .or_else(|| date.as_deref().and_then(parse_match_date).map(infer_season))
        });
        out.push(RawMatch {
            season: row_season,
            date,
            time: headers.text(&record, &["Time"]),
            home_team: headers.text(&record, &["HomeTeam", "Home"]),
            away_team: headers.text(&record, &["AwayTeam", "Away"]),
            home_goals: headers.text(&record, &["FTHG", "HG"]),
            away_goals: headers.text(&record, &["FTAG", "AG"]),
            result: headers.text(&record, &["FTR", "Res"]),
            home_shots: headers.text(&record, &["HS"]),
            away_shots: headers.text(&record, &["AS"]),
            home_shots_on_target: headers.text(&record, &["HST"]),
            away_shots_on_target: headers.text(&record, &["AST"]),
            home_yellow_cards: headers.text(&record, &["HY"]),
            away_yellow_cards: headers.text(&record, &["AY"]),
            home_red_cards: headers.text(&record, &["HR"]),
            away_red_cards: headers.text(&record, &["AR"]),
        });
    }
    debug!("read {} raw match rows", out.len());
    Ok(out)
}

pub fn read_market_values_csv(path: &Path, aliases: &TeamAliases) -> Result<MarketValues> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open market values {}", path.display()))?;
    parse_market_values(file, aliases).with_context(|| format!("parse {}", path.display()))
}

/// `Year` (or `Season`), `Team`, `Market Value`. Unparseable rows are
/// skipped with a warning.
pub fn parse_market_values<R: Read>(reader: R, aliases: &TeamAliases) -> Result<MarketValues> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = HeaderIndex::new(rdr.headers().context("read csv header")?);
    let mut values = MarketValues::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("read csv record {}", line + 2))?;
        let season = headers
            .text(&record, &["Year", "Season"])
            .and_then(|s| s.parse::<i32>().ok());
        let team = headers.text(&record, &["Team"]);
        let value = headers
            .text(&record, &["Market Value", "MarketValue", "market_value"])
            .and_then(|s| parse_money(&s));
        match (season, team, value) {
            (Some(season), Some(team), Some(value)) => {
                values.insert(season, aliases.canonical(&team), value);
            }
            _ => warn!("skipping market value row {}", line + 2),
        }
    }
    Ok(values)
}

fn parse_money(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '€' | '£' | '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn write_feature_csv(path: &Path, table: &FeatureTable) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create feature csv {}", path.display()))?;
    write_features(file, table).with_context(|| format!("write {}", path.display()))
}

pub fn write_features<W: Write>(writer: W, table: &FeatureTable) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let mut header: Vec<&str> = KEY_HEADERS.to_vec();
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header).context("write csv header")?;

    for row in table.rows() {
        let mut record = vec![
            row.key.season.to_string(),
            row.key.date.format("%Y-%m-%d").to_string(),
            row.key.home_team.clone(),
            row.key.away_team.clone(),
            row.result.code().to_string(),
            row.home_goals.to_string(),
            row.away_goals.to_string(),
        ];
        record.extend(row.values.iter().map(f64::to_string));
        wtr.write_record(&record)
            .with_context(|| format!("write csv row {}", row.key))?;
    }
    wtr.flush().context("flush feature csv")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn reads_football_data_columns_and_skips_padding() {
        let data = "\u{feff}Div,Date,Time,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HS,AS\n\
                    E0,09/08/2019,20:00,Liverpool,Norwich,4,1,H,15,12\n\
                    E0,10/08/19,,Nottm Forest,Fulham,1,1,D,,\n\
                    ,,,,,,,,,\n";
        let rows = parse_football_data(data.as_bytes(), None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].season, Some(2019));
        assert_eq!(rows[0].time.as_deref(), Some("20:00"));
        assert_eq!(rows[0].home_shots.as_deref(), Some("15"));
        assert_eq!(rows[1].time, None);
        assert_eq!(rows[1].home_shots, None);
        assert_eq!(rows[1].home_shots_on_target, None);
    }

    #[test]
    fn explicit_season_wins_over_inference() {
        let data = "Date,HomeTeam,AwayTeam,FTHG,FTAG\n02/01/2020,A,B,0,0\n";
        let rows = parse_football_data(data.as_bytes(), Some(2019)).unwrap();
        assert_eq!(rows[0].season, Some(2019));
        let inferred = parse_football_data(data.as_bytes(), None).unwrap();
        assert_eq!(inferred[0].season, Some(2019));
        assert_eq!(infer_season(NaiveDate::from_ymd_opt(2020, 8, 1).unwrap()), 2020);
    }

    #[test]
    fn market_values_accept_currency_formatting() {
        let data = "Year,Team,Market Value\n2019,Nottm Forest,\"€1,050.5\"\n2019,Leeds,n/a\n";
        let values = parse_market_values(data.as_bytes(), &TeamAliases::default()).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(2019, "Nott'm Forest"), Some(1050.5));
    }
}
