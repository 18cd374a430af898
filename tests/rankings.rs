use std::path::PathBuf;

use datafutebol::config::EngineConfig;
use datafutebol::dataset::Dataset;
use datafutebol::demo::DemoSeason;
use datafutebol::rankings::{
    AggregatedRow, AggregationMode, Grouping, RankingFilter, RankingView, Stat,
};
use datafutebol::value::{Value, round_to};

fn fixture() -> Dataset {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("bra_sample.csv");
    Dataset::open(&path, &EngineConfig::default()).expect("fixture should load")
}

fn demo() -> Dataset {
    DemoSeason {
        rounds: 3,
        events_per_team: 150,
        ..DemoSeason::default()
    }
    .dataset(&EngineConfig::default())
}

fn player<'a>(rows: &'a [AggregatedRow], name: &str) -> &'a AggregatedRow {
    rows.iter()
        .find(|r| r.player.as_deref() == Some(name))
        .expect("player should be aggregated")
}

#[test]
fn fixture_player_totals() {
    let dataset = fixture();
    let rows = dataset.aggregated(Grouping::Player);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.player.as_deref() != Some("Ghost")));

    let arrascaeta = player(rows, "Arrascaeta");
    let total = |row: &AggregatedRow, stat| row.value(stat, AggregationMode::Total);
    assert_eq!(arrascaeta.games, 1);
    assert_eq!(total(arrascaeta, Stat::PassesAccurate), Value::Defined(2.0));
    assert_eq!(total(arrascaeta, Stat::PassesInaccurate), Value::Defined(1.0));
    assert_eq!(total(arrascaeta, Stat::TotalPasses), Value::Defined(3.0));
    assert_eq!(total(arrascaeta, Stat::PassAccuracy), Value::Defined(66.7));
    assert_eq!(total(arrascaeta, Stat::KeyPasses), Value::Defined(1.0));
    assert_eq!(total(arrascaeta, Stat::ProgressivePasses), Value::Defined(1.0));
    assert_eq!(total(arrascaeta, Stat::FinalThirdPasses), Value::Defined(2.0));
    assert_eq!(total(arrascaeta, Stat::Interceptions), Value::Defined(1.0));

    let pedro = player(rows, "Pedro");
    assert_eq!(pedro.games, 2);
    assert_eq!(pedro.team, "Flamengo");
    assert_eq!(total(pedro, Stat::Goals), Value::Defined(1.0));
    assert_eq!(total(pedro, Stat::Shots), Value::Defined(2.0));
    assert_eq!(total(pedro, Stat::ShotsOnTarget), Value::Defined(2.0));
    assert_eq!(total(pedro, Stat::ShotConversion), Value::Defined(50.0));
    assert_eq!(total(pedro, Stat::ShotAccuracy), Value::Defined(100.0));
    assert_eq!(total(pedro, Stat::TacklesWon), Value::Defined(2.0));
    assert_eq!(total(pedro, Stat::Fouls), Value::Defined(1.0));
    assert_eq!(total(pedro, Stat::DribbleSuccess), Value::Undefined);
    let xt = total(pedro, Stat::XThreat).as_f64().expect("xThreat is a sum");
    assert!((xt - 0.4).abs() < 1e-9);

    let flaco = player(rows, "Flaco");
    assert_eq!(total(flaco, Stat::ShotConversion), Value::Defined(0.0));
    assert_eq!(total(flaco, Stat::TacklesLost), Value::Defined(1.0));
    assert_eq!(total(flaco, Stat::TackleSuccess), Value::Defined(0.0));
}

#[test]
fn fixture_per_game_values() {
    let dataset = fixture();
    let pedro = player(dataset.aggregated(Grouping::Player), "Pedro");
    let per_game = |stat| pedro.value(stat, AggregationMode::PerGame);
    assert_eq!(per_game(Stat::TotalPasses), Value::Defined(0.5));
    assert_eq!(per_game(Stat::TacklesWon), Value::Defined(1.0));
    assert_eq!(per_game(Stat::Goals), Value::Defined(0.5));
    assert_eq!(per_game(Stat::ShotConversion), Value::Defined(50.0));
}

#[test]
fn team_grouping_merges_players() {
    let dataset = fixture();
    let teams = dataset.aggregated(Grouping::Team);
    assert_eq!(
        teams.iter().map(|r| r.name()).collect::<Vec<_>>(),
        vec!["Bahia", "Flamengo", "Palmeiras"]
    );
    let fla = &teams[1];
    assert_eq!(fla.player, None);
    assert_eq!(fla.games, 2);
    assert_eq!(fla.total(Stat::PassesAccurate), Some(3.0));
    assert_eq!(fla.total(Stat::PassesInaccurate), Some(1.0));
    assert_eq!(fla.total(Stat::PassAccuracy), None);
}

#[test]
fn total_passes_and_accuracy_are_consistent() {
    let dataset = demo();
    for grouping in [Grouping::Player, Grouping::Team] {
        for row in dataset.aggregated(grouping) {
            let accurate = row.total(Stat::PassesAccurate).unwrap_or_default();
            let inaccurate = row.total(Stat::PassesInaccurate).unwrap_or_default();
            let total = row.value(Stat::TotalPasses, AggregationMode::Total);
            assert_eq!(total, Value::Defined(accurate + inaccurate));
            let accuracy = row.value(Stat::PassAccuracy, AggregationMode::Total);
            assert_eq!(accuracy.is_defined(), accurate + inaccurate > 0.0);
        }
    }
}

#[test]
fn per_game_scales_counts_and_keeps_rates() {
    let dataset = demo();
    for row in dataset.aggregated(Grouping::Player) {
        let games = f64::from(row.games);
        for stat in Stat::ALL {
            let total = row.value(stat, AggregationMode::Total);
            let per_game = row.value(stat, AggregationMode::PerGame);
            if stat.is_rate() {
                assert_eq!(total, per_game, "{stat:?} should not be rescaled");
            } else {
                let expected = round_to(total.as_f64().unwrap_or_default() / games, 2);
                assert_eq!(per_game, Value::Defined(expected), "{stat:?}");
            }
        }
    }
}

#[test]
fn per_game_total_passes_rounds_once() {
    let mut row = AggregatedRow::new(Some("Gerson".to_string()), "Flamengo".to_string(), 3);
    row.set_total(Stat::PassesAccurate, 1.0);
    row.set_total(Stat::PassesInaccurate, 1.0);
    assert_eq!(row.value(Stat::PassesAccurate, AggregationMode::PerGame), Value::Defined(0.33));
    assert_eq!(row.value(Stat::TotalPasses, AggregationMode::PerGame), Value::Defined(0.67));
    assert_eq!(row.value(Stat::TotalPasses, AggregationMode::Total), Value::Defined(2.0));
}

#[test]
fn views_sort_by_first_column() {
    let dataset = fixture();
    let table = dataset.rankings(
        RankingView::Passing,
        Grouping::Player,
        AggregationMode::Total,
        &RankingFilter::default(),
    );
    assert_eq!(table.columns, RankingView::Passing.columns());
    assert_eq!(
        table.rows.iter().map(|r| r.name()).collect::<Vec<_>>(),
        vec!["Arrascaeta", "Veiga", "Everaldo", "Flaco", "Pedro"]
    );
    assert_eq!(table.value(0, Stat::TotalPasses), Some(Value::Defined(3.0)));
}

#[test]
fn undefined_rates_sort_last() {
    let dataset = fixture();
    let mut table = dataset.rankings(
        RankingView::Attacking,
        Grouping::Player,
        AggregationMode::Total,
        &RankingFilter::default(),
    );
    table.sort_by(Stat::ShotConversion);
    let names: Vec<&str> = table.rows.iter().map(|r| r.name()).collect();
    assert_eq!(names[..2], ["Pedro", "Flaco"]);
    let idx = table.column_index(Stat::ShotConversion).expect("column present");
    assert!(table.rows[2..].iter().all(|r| r.values[idx] == Value::Undefined));
}

#[test]
fn filters_apply_after_aggregation() {
    let dataset = fixture();
    let filter = RankingFilter {
        team: Some("Flamengo".to_string()),
        min_games: 2,
    };
    let table = dataset.rankings(
        RankingView::Defending,
        Grouping::Player,
        AggregationMode::PerGame,
        &filter,
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].name(), "Pedro");
    assert_eq!(table.rows[0].games, 2);
    assert_eq!(table.value(0, Stat::TacklesWon), Some(Value::Defined(1.0)));

    let none = dataset.rankings(
        RankingView::Defending,
        Grouping::Player,
        AggregationMode::Total,
        &RankingFilter {
            team: Some("Grêmio".to_string()),
            min_games: 0,
        },
    );
    assert!(none.rows.is_empty());
}

#[test]
fn leaderboard_has_one_column() {
    let dataset = fixture();
    let board = dataset.leaderboard(
        Stat::PassesAccurate,
        Grouping::Team,
        AggregationMode::Total,
        &RankingFilter::default(),
    );
    assert_eq!(board.columns, vec![Stat::PassesAccurate]);
    assert_eq!(board.rows[0].name(), "Flamengo");
    assert_eq!(board.rows[0].values, vec![Value::Defined(3.0)]);
}

#[test]
fn stat_names_parse() {
    for stat in Stat::ALL {
        assert_eq!(stat.key().parse::<Stat>(), Ok(stat));
        assert_eq!(stat.label().parse::<Stat>(), Ok(stat));
    }
    assert!("not_a_stat".parse::<Stat>().is_err());
}
