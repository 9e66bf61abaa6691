use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pl_features::config::{H2hStrategy, PipelineConfig};
use pl_features::h2h;
use pl_features::match_store::{Match, MatchStore, SideStats};
use pl_features::rolling::rolling;
use pl_features::team_history::expand;
use pl_features::{Outcome, PipelineContext, derive_features};

const TEAMS: usize = 20;
const SEASONS: [i32; 6] = [2014, 2015, 2016, 2017, 2018, 2019];

// 20-team double round robin per season, one round per week.
fn synthetic_store(seed: u64) -> MatchStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let names: Vec<String> = (0..TEAMS).map(|i| format!("Club {i:02}")).collect();
    let mut matches = Vec::new();
    for season in SEASONS {
        let Some(start) = NaiveDate::from_ymd_opt(season, 8, 1) else {
            continue;
        };
        let mut order: Vec<usize> = (0..TEAMS).collect();
        for round in 0..2 * (TEAMS - 1) {
            let Some(date) = start.checked_add_days(Days::new(7 * round as u64)) else {
                continue;
            };
            for k in 0..TEAMS / 2 {
                let (a, b) = (order[k], order[TEAMS - 1 - k]);
                let (h, a) = if round < TEAMS - 1 { (a, b) } else { (b, a) };
                let hg = rng.gen_range(0..5);
                let ag = rng.gen_range(0..5);
                matches.push(Match {
                    season,
                    date,
                    kickoff: None,
                    home_team: names[h].clone(),
                    away_team: names[a].clone(),
                    home: SideStats {
                        goals: hg,
                        shots: Some(rng.gen_range(3..25)),
                        shots_on_target: Some(rng.gen_range(0..10)),
                        yellow_cards: Some(rng.gen_range(0..5)),
                        red_cards: Some(rng.gen_range(0..2)),
                    },
                    away: SideStats {
                        goals: ag,
                        shots: Some(rng.gen_range(3..25)),
                        shots_on_target: Some(rng.gen_range(0..10)),
                        yellow_cards: Some(rng.gen_range(0..5)),
                        red_cards: Some(rng.gen_range(0..2)),
                    },
                    result: Outcome::from_goals(hg, ag),
                });
            }
            if round != TEAMS - 2 {
                order[1..].rotate_right(1);
            } else {
                order = (0..TEAMS).collect();
            }
        }
    }
    match MatchStore::from_matches(matches) {
        Ok(store) => store,
        Err(err) => panic!("synthetic league is inconsistent: {err}"),
    }
}

fn bench_h2h_scan(c: &mut Criterion) {
    let store = synthetic_store(1);
    c.bench_function("h2h_scan", |b| {
        b.iter(|| {
            let table = h2h::resolve(black_box(store.matches()), 5, H2hStrategy::Scan);
            black_box(table.len());
        })
    });
}

fn bench_h2h_indexed(c: &mut Criterion) {
    let store = synthetic_store(1);
    c.bench_function("h2h_indexed", |b| {
        b.iter(|| {
            let table = h2h::resolve(black_box(store.matches()), 5, H2hStrategy::Indexed);
            black_box(table.len());
        })
    });
}

fn bench_rolling(c: &mut Criterion) {
    let store = synthetic_store(2);
    c.bench_function("rolling_window_5", |b| {
        b.iter(|| {
            let rolled = rolling(expand(black_box(store.matches())), 5);
            black_box(rolled.len());
        })
    });
}

fn bench_full_derivation(c: &mut Criterion) {
    let store = synthetic_store(3);
    let ctx = match PipelineContext::new(PipelineConfig::default()) {
        Ok(ctx) => ctx,
        Err(err) => panic!("default config rejected: {err}"),
    };
    c.bench_function("derive_features_6_seasons", |b| {
        b.iter(|| {
            let derivation = derive_features(&ctx, black_box(&store)).unwrap();
            black_box(derivation.table.len());
        })
    });
}

criterion_group!(
    perf,
    bench_h2h_scan,
    bench_h2h_indexed,
    bench_rolling,
    bench_full_derivation
);
criterion_main!(perf);
