use std::path::PathBuf;

use datafutebol::cache::DatasetKey;
use datafutebol::config::{EngineConfig, UnboundedPpdaPolicy};
use datafutebol::dataset::Dataset;
use datafutebol::demo::DemoSeason;
use datafutebol::event::{Event, EventType, Outcome};
use datafutebol::match_stats::{TeamMatchStats, compute_match_stats, season_averages};
use datafutebol::value::Value;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture(config: &EngineConfig) -> Dataset {
    Dataset::open(&fixture_path("bra_sample.csv"), config).expect("fixture should load")
}

fn find<'a>(rows: &'a [TeamMatchStats], match_id: u64, team: &str) -> &'a TeamMatchStats {
    rows.iter()
        .find(|r| r.match_id == match_id && r.team == team)
        .expect("team should have a record for the match")
}

fn ev(team: &str, kind: EventType, x: f64, outcome: Option<Outcome>) -> Event {
    let mut e = Event::new(7, kind);
    e.team_name = Some(team.to_string());
    e.x = Some(x);
    e.y = Some(50.0);
    e.outcome = outcome;
    e
}

#[test]
fn fixture_match_records() {
    let dataset = fixture(&EngineConfig::default());
    let rows = dataset.match_stats();
    assert_eq!(rows.len(), 4);
    assert_eq!(
        rows.iter()
            .map(|r| (r.match_id, r.team.as_str()))
            .collect::<Vec<_>>(),
        vec![
            (101, "Flamengo"),
            (101, "Palmeiras"),
            (102, "Flamengo"),
            (102, "Bahia"),
        ]
    );

    let fla = find(rows, 101, "Flamengo");
    assert_eq!(fla.opponent, "Palmeiras");
    assert_eq!(fla.defensive_actions, 2);
    assert_eq!(fla.passes_allowed, 2);
    assert_eq!(fla.ppda, Value::Defined(1.0));
    assert_eq!(fla.attacking_passes, 2);
    assert_eq!(fla.opponent_attacking_passes, 1);
    assert_eq!(fla.field_tilt, 66.67);

    let pal = find(rows, 101, "Palmeiras");
    assert_eq!(pal.defensive_actions, 0);
    assert_eq!(pal.ppda, Value::Unbounded);
    assert_eq!(pal.field_tilt, 33.33);
}

#[test]
fn match_without_attacking_passes_has_zero_tilt() {
    let dataset = fixture(&EngineConfig::default());
    let rows = dataset.match_stats();
    let fla = find(rows, 102, "Flamengo");
    let bah = find(rows, 102, "Bahia");
    assert_eq!(fla.field_tilt, 0.0);
    assert_eq!(bah.field_tilt, 0.0);
    assert_eq!(fla.ppda, Value::Defined(1.0));
    assert_eq!(bah.ppda, Value::Defined(1.0));
}

#[test]
fn single_team_match_is_skipped() {
    let config = EngineConfig::load(&fixture_path("no_fouls.json")).expect("config should load");
    let dataset = fixture(&config);
    // Match 103 now has a named team, but only one.
    assert!(dataset.match_stats().iter().all(|r| r.match_id != 103));
}

#[test]
fn excluding_fouls_changes_ppda() {
    let dataset = fixture(&EngineConfig::without_fouls());
    let fla = find(dataset.match_stats(), 101, "Flamengo");
    assert_eq!(fla.defensive_actions, 1);
    assert_eq!(fla.ppda, Value::Defined(2.0));

    let from_file =
        EngineConfig::load(&fixture_path("no_fouls.json")).expect("config should load");
    let dataset = fixture(&from_file);
    let fla = find(dataset.match_stats(), 101, "Flamengo");
    assert_eq!(fla.ppda, Value::Defined(2.0));
}

#[test]
fn season_means_follow_policy() {
    let dataset = fixture(&EngineConfig::default());
    let season = dataset.season_stats();
    assert_eq!(
        season.iter().map(|s| s.team.as_str()).collect::<Vec<_>>(),
        vec!["Bahia", "Flamengo", "Palmeiras"]
    );

    let fla = &season[1];
    assert_eq!(fla.matches, 2);
    assert_eq!(fla.ppda, Value::Defined(1.0));
    assert!((fla.field_tilt - 33.335).abs() < 1e-9);
    assert_eq!(fla.ppda_unbounded_matches, 0);

    let pal = &season[2];
    assert_eq!(pal.ppda, Value::Unbounded);
    assert_eq!(pal.ppda_unbounded_matches, 1);

    let propagated = season_averages(dataset.match_stats(), UnboundedPpdaPolicy::Propagate);
    assert_eq!(propagated[2].ppda, Value::Unbounded);
    assert_eq!(propagated[0].ppda, Value::Defined(1.0));
}

#[test]
fn unbounded_matches_are_left_out_of_the_mean() {
    let row = |match_id, ppda| TeamMatchStats {
        match_id,
        team: "A".to_string(),
        opponent: "B".to_string(),
        defensive_actions: 0,
        passes_allowed: 0,
        attacking_passes: 0,
        opponent_attacking_passes: 0,
        ppda,
        field_tilt: 50.0,
    };
    let rows = vec![
        row(1, Value::Defined(8.0)),
        row(2, Value::Unbounded),
        row(3, Value::Defined(12.0)),
    ];
    let excluded = season_averages(&rows, UnboundedPpdaPolicy::Exclude);
    assert_eq!(excluded[0].ppda, Value::Defined(10.0));
    assert_eq!(excluded[0].matches, 3);
    assert_eq!(excluded[0].ppda_unbounded_matches, 1);

    let propagated = season_averages(&rows, UnboundedPpdaPolicy::Propagate);
    assert_eq!(propagated[0].ppda, Value::Unbounded);
}

#[test]
fn pressing_side_without_defensive_actions_is_unbounded() {
    let mut events = Vec::new();
    for _ in 0..10 {
        events.push(ev("A", EventType::Tackle, 75.0, Some(Outcome::Successful)));
    }
    for _ in 0..5 {
        events.push(ev("B", EventType::Pass, 20.0, Some(Outcome::Successful)));
    }
    // Deep in their own half: no pressing action for B.
    events.push(ev("B", EventType::Interception, 15.0, Some(Outcome::Successful)));

    let rows = compute_match_stats(&events, &EngineConfig::default());
    assert_eq!(rows.len(), 2);
    let a = find(&rows, 7, "A");
    let b = find(&rows, 7, "B");
    assert_eq!(a.ppda, Value::Defined(0.5));
    assert_eq!(b.defensive_actions, 0);
    assert_eq!(b.ppda, Value::Unbounded);
    assert_eq!(a.field_tilt, 0.0);
    assert_eq!(b.field_tilt, 0.0);
}

#[test]
fn field_tilt_shares_sum_to_one_hundred() {
    let config = EngineConfig::default();
    let season = DemoSeason {
        rounds: 2,
        events_per_team: 120,
        ..DemoSeason::default()
    };
    let dataset = season.dataset(&config);
    let rows = dataset.match_stats();
    assert_eq!(rows.len(), 2 * 10 * 2);
    for pair in rows.chunks(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert_eq!(a.match_id, b.match_id);
        assert_eq!(a.attacking_passes, b.opponent_attacking_passes);
        if a.attacking_passes + b.attacking_passes == 0 {
            assert_eq!(a.field_tilt + b.field_tilt, 0.0);
        } else {
            assert!((a.field_tilt + b.field_tilt - 100.0).abs() <= 0.011);
        }
    }
}

#[test]
fn more_than_two_teams_is_skipped() {
    let events = vec![
        ev("A", EventType::Pass, 70.0, Some(Outcome::Successful)),
        ev("B", EventType::Pass, 70.0, Some(Outcome::Successful)),
        ev("C", EventType::Pass, 70.0, Some(Outcome::Successful)),
    ];
    assert!(compute_match_stats(&events, &EngineConfig::default()).is_empty());
}

#[test]
fn empty_dataset_has_no_records() {
    let config = EngineConfig::default();
    let dataset = Dataset::from_events(DatasetKey::derive(b"", &config), Vec::new(), &config);
    assert!(dataset.match_stats().is_empty());
    assert!(dataset.season_stats().is_empty());
}
