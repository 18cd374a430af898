use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use datafutebol::cache::DatasetKey;
use datafutebol::config::EngineConfig;
use datafutebol::dataset::Dataset;
use datafutebol::demo::{self, DemoSeason};
use datafutebol::ingest;
use datafutebol::match_stats;
use datafutebol::percentile::PlayerKey;
use datafutebol::rankings::{self, AggregationMode, Grouping, RankingFilter, RankingTable, RankingView, Stat};

fn season() -> DemoSeason {
    DemoSeason {
        rounds: 4,
        ..DemoSeason::default()
    }
}

fn bench_csv_parse(c: &mut Criterion) {
    let bytes = demo::to_csv(&season().events()).unwrap();
    c.bench_function("csv_parse", |b| {
        b.iter(|| {
            let parsed = ingest::parse_csv(black_box(&bytes)).unwrap();
            black_box(parsed.events.len());
        })
    });
}

fn bench_dataset_build(c: &mut Criterion) {
    let config = EngineConfig::default();
    let events = season().events();
    let key = DatasetKey::derive(b"bench", &config);
    c.bench_function("dataset_build", |b| {
        b.iter(|| {
            let dataset = Dataset::from_events(key, black_box(events.clone()), &config);
            black_box(dataset.match_count());
        })
    });
}

fn bench_match_stats(c: &mut Criterion) {
    let config = EngineConfig::default();
    let dataset = season().dataset(&config);
    c.bench_function("match_stats", |b| {
        b.iter(|| {
            let stats = match_stats::compute_match_stats(black_box(dataset.events()), &config);
            black_box(match_stats::season_averages(&stats, config.unbounded_ppda).len());
        })
    });
}

fn bench_aggregate_players(c: &mut Criterion) {
    let config = EngineConfig::default();
    let dataset = season().dataset(&config);
    c.bench_function("aggregate_players", |b| {
        b.iter(|| {
            let rows = rankings::aggregate(black_box(dataset.events()), Grouping::Player, &config);
            black_box(rows.len());
        })
    });
}

fn bench_ranking_views(c: &mut Criterion) {
    let config = EngineConfig::default();
    let dataset = season().dataset(&config);
    let rows = dataset.aggregated(Grouping::Player);
    let filter = RankingFilter::default();
    c.bench_function("ranking_views", |b| {
        b.iter(|| {
            for view in RankingView::ALL {
                let table =
                    RankingTable::for_view(black_box(rows), view, AggregationMode::PerGame, &filter);
                black_box(table.rows.len());
            }
        })
    });
}

fn bench_percentile_compare(c: &mut Criterion) {
    let config = EngineConfig::default();
    let dataset = season().dataset(&config);
    let rows = dataset.aggregated(Grouping::Player);
    let players: Vec<PlayerKey> = rows
        .iter()
        .take(4)
        .filter_map(|r| Some(PlayerKey::new(r.player.clone()?, r.team.clone())))
        .collect();
    let stats = [
        Stat::TotalPasses,
        Stat::PassAccuracy,
        Stat::KeyPasses,
        Stat::Goals,
        Stat::TacklesWon,
        Stat::Interceptions,
    ];
    c.bench_function("percentile_compare", |b| {
        b.iter(|| {
            let entries = dataset.compare(black_box(&players), &stats).unwrap();
            black_box(entries.len());
        })
    });
}

criterion_group!(
    perf,
    bench_csv_parse,
    bench_dataset_build,
    bench_match_stats,
    bench_aggregate_players,
    bench_ranking_views,
    bench_percentile_compare
);
criterion_main!(perf);
