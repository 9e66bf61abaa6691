#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pl_features::match_store::{Match, SideStats};
use pl_features::{Outcome, PipelineConfig, PipelineContext};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn context() -> PipelineContext {
    PipelineContext::new(PipelineConfig {
        parallelism: 2,
        ..PipelineConfig::default()
    })
    .unwrap()
}

/// Double round robin per season, one round per week starting 1 August.
/// From the second season on, the last team is replaced by a promoted side.
pub fn synthetic_league(seed: u64, teams: usize, seasons: &[i32]) -> Vec<Match> {
    assert!(teams >= 2 && teams % 2 == 0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for (s_idx, &season) in seasons.iter().enumerate() {
        let mut names: Vec<String> = (0..teams).map(|i| format!("Team {i:02}")).collect();
        if s_idx > 0 {
            names[teams - 1] = format!("Promoted {season}");
        }
        let start = day(season, 8, 1);
        for (round, pairs) in double_round_robin(teams).into_iter().enumerate() {
            let date = start.checked_add_days(Days::new(7 * round as u64)).unwrap();
            for (h, a) in pairs {
                out.push(random_match(&mut rng, season, date, &names[h], &names[a]));
            }
        }
    }
    out
}

fn random_match(rng: &mut StdRng, season: i32, date: NaiveDate, home: &str, away: &str) -> Match {
    let home_stats = random_side(rng);
    let away_stats = random_side(rng);
    Match {
        season,
        date,
        kickoff: None,
        home_team: home.to_string(),
        away_team: away.to_string(),
        result: Outcome::from_goals(home_stats.goals, away_stats.goals),
        home: home_stats,
        away: away_stats,
    }
}

fn random_side(rng: &mut StdRng) -> SideStats {
    let shots = rng.gen_bool(0.85).then(|| rng.gen_range(4u32..20));
    SideStats {
        goals: rng.gen_range(0..4),
        shots,
        shots_on_target: shots.map(|s| rng.gen_range(0..=s.min(8))),
        yellow_cards: rng.gen_bool(0.9).then(|| rng.gen_range(0..4)),
        red_cards: rng.gen_bool(0.9).then(|| rng.gen_range(0..2)),
    }
}

// Circle method: every team plays exactly once per round.
fn double_round_robin(n: usize) -> Vec<Vec<(usize, usize)>> {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut first_half = Vec::new();
    for round in 0..n - 1 {
        let pairs = (0..n / 2)
            .map(|k| {
                let (a, b) = (idx[k], idx[n - 1 - k]);
                if round % 2 == 0 { (a, b) } else { (b, a) }
            })
            .collect::<Vec<_>>();
        first_half.push(pairs);
        let last = idx.pop().unwrap();
        idx.insert(1, last);
    }
    let second_half = first_half
        .iter()
        .map(|pairs| pairs.iter().map(|&(a, b)| (b, a)).collect())
        .collect::<Vec<_>>();
    first_half.into_iter().chain(second_half).collect()
}
