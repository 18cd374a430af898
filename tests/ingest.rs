use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use parquet::data_type::{BoolType, ByteArray, ByteArrayType, DoubleType, Int64Type};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use datafutebol::config::EngineConfig;
use datafutebol::dataset::{CoordinateScale, Dataset, DatasetError, normalize_coordinates};
use datafutebol::demo::{self, DemoSeason};
use datafutebol::event::{EventType, Flag, Outcome};
use datafutebol::ingest::{parse_csv, parse_parquet};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn read_fixture(name: &str) -> Vec<u8> {
    fs::read(fixture_path(name)).expect("fixture file should be readable")
}

#[test]
fn parses_fixture_rows() {
    let parsed = parse_csv(&read_fixture("bra_sample.csv")).expect("fixture should parse");
    assert_eq!(parsed.events.len(), 19);
    assert_eq!(parsed.skipped_rows, 1);

    let first = &parsed.events[0];
    assert_eq!(first.match_id, 101);
    assert_eq!(first.team_id, Some(1239));
    assert_eq!(first.player_name.as_deref(), Some("Arrascaeta"));
    assert_eq!(first.event_type, EventType::Pass);
    assert_eq!(first.outcome, Some(Outcome::Successful));
    assert!(first.has(Flag::PassAccurate));
    assert!(first.has(Flag::KeyPass));
    assert!(first.has(Flag::ProgressiveAction));
    assert!(!first.has(Flag::PassInaccurate));
    // Names are resolved later, during normalization.
    assert_eq!(first.team_name, None);
}

#[test]
fn blank_cells_become_none() {
    let parsed = parse_csv(&read_fixture("bra_sample.csv")).expect("fixture should parse");
    let shot = &parsed.events[3];
    assert_eq!(shot.event_type, EventType::SavedShot);
    assert_eq!(shot.outcome, None);
    assert_eq!(shot.end_x, None);
    assert_eq!(shot.end_y, None);
    assert!((shot.x_threat - 0.1).abs() < 1e-12);

    let tackle = &parsed.events[5];
    assert_eq!(tackle.x_threat, 0.0);
    assert!(tackle.has(Flag::TackleWon));
}

#[test]
fn dataset_open_normalizes_fixture() {
    let dataset = Dataset::open(&fixture_path("bra_sample.csv"), &EngineConfig::default())
        .expect("fixture should load");
    assert_eq!(dataset.scale(), CoordinateScale::Unit);
    assert_eq!(dataset.skipped_rows(), 1);
    assert_eq!(dataset.events().len(), 19);
    assert_eq!(dataset.match_count(), 3);
    assert_eq!(dataset.teams(), vec!["Bahia", "Flamengo", "Palmeiras"]);

    let first = &dataset.events()[0];
    assert_eq!(first.x, Some(70.0));
    assert_eq!(first.y, Some(40.0));
    assert_eq!(first.end_x, Some(85.0));
    assert_eq!(first.end_y, Some(45.0));
    assert_eq!(first.team_name.as_deref(), Some("Flamengo"));

    let ghost = dataset
        .events()
        .iter()
        .find(|e| e.player_name.as_deref() == Some("Ghost"))
        .expect("ghost row is kept");
    assert_eq!(ghost.team_id, Some(9999));
    assert_eq!(ghost.team_name, None);
}

#[test]
fn normalizing_twice_is_a_no_op() {
    let dataset = Dataset::open(&fixture_path("bra_sample.csv"), &EngineConfig::default())
        .expect("fixture should load");
    let mut events = dataset.events().to_vec();
    assert_eq!(normalize_coordinates(&mut events), CoordinateScale::Percent);
    assert_eq!(events.as_slice(), dataset.events());
}

#[test]
fn extra_teams_from_config_resolve() {
    let config = EngineConfig::load(&fixture_path("no_fouls.json")).expect("config should load");
    let dataset =
        Dataset::open(&fixture_path("bra_sample.csv"), &config).expect("fixture should load");
    assert!(dataset.teams().contains(&"Clube Fantasma"));
}

#[test]
fn missing_required_column_is_reported() {
    let err = parse_csv(b"teamId,type,x\n1239,Pass,0.5\n").unwrap_err();
    assert!(matches!(err, DatasetError::MissingColumn("matchId")));
}

#[test]
fn missing_file_is_not_found() {
    let err = Dataset::open(&fixture_path("nope.csv"), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, DatasetError::NotFound { .. }));
}

#[test]
fn demo_csv_parses_back() {
    let season = DemoSeason {
        rounds: 1,
        events_per_team: 40,
        ..DemoSeason::default()
    };
    let events = season.events();
    let bytes = demo::to_csv(&events).expect("demo events serialize");
    let parsed = parse_csv(&bytes).expect("demo csv parses");
    assert_eq!(parsed.skipped_rows, 0);
    assert_eq!(parsed.events.len(), events.len());
    for (a, b) in parsed.events.iter().zip(&events) {
        assert_eq!(a.match_id, b.match_id);
        assert_eq!(a.team_id, b.team_id);
        assert_eq!(a.event_type, b.event_type);
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.outcome, b.outcome);
    }
}

const PARQUET_SCHEMA: &str = "
    message events {
        REQUIRED INT64 matchId;
        OPTIONAL INT64 teamId;
        OPTIONAL BINARY type (UTF8);
        OPTIONAL DOUBLE x;
        OPTIONAL BOOLEAN isGoal;
    }
";

/// Three events for match 101; the second has no team and the third no goal flag.
fn write_parquet() -> Vec<u8> {
    let schema = Arc::new(parse_message_type(PARQUET_SCHEMA).expect("schema should parse"));
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    let mut writer =
        SerializedFileWriter::new(&mut buffer, schema, props).expect("writer should open");
    let mut row_group = writer.next_row_group().expect("row group should open");

    let mut column = row_group.next_column().unwrap().expect("matchId column");
    column
        .typed::<Int64Type>()
        .write_batch(&[101, 101, 101], None, None)
        .unwrap();
    column.close().unwrap();

    let mut column = row_group.next_column().unwrap().expect("teamId column");
    column
        .typed::<Int64Type>()
        .write_batch(&[1239, 1240], Some(&[1, 0, 1]), None)
        .unwrap();
    column.close().unwrap();

    let mut column = row_group.next_column().unwrap().expect("type column");
    let types = [ByteArray::from("Pass"), ByteArray::from("Goal"), ByteArray::from("Pass")];
    column
        .typed::<ByteArrayType>()
        .write_batch(&types, Some(&[1, 1, 1]), None)
        .unwrap();
    column.close().unwrap();

    let mut column = row_group.next_column().unwrap().expect("x column");
    column
        .typed::<DoubleType>()
        .write_batch(&[45.5, 88.0, 30.25], Some(&[1, 1, 1]), None)
        .unwrap();
    column.close().unwrap();

    let mut column = row_group.next_column().unwrap().expect("isGoal column");
    column
        .typed::<BoolType>()
        .write_batch(&[false, true], Some(&[1, 1, 0]), None)
        .unwrap();
    column.close().unwrap();

    row_group.close().unwrap();
    writer.close().unwrap();
    buffer
}

#[test]
fn parses_parquet_with_nulls() {
    let parsed = parse_parquet(Bytes::from(write_parquet())).expect("parquet should parse");
    assert_eq!(parsed.skipped_rows, 0);
    assert_eq!(parsed.events.len(), 3);

    let pass = &parsed.events[0];
    assert_eq!(pass.match_id, 101);
    assert_eq!(pass.team_id, Some(1239));
    assert_eq!(pass.event_type, EventType::Pass);
    assert_eq!(pass.x, Some(45.5));
    assert!(!pass.has(Flag::IsGoal));

    let goal = &parsed.events[1];
    assert_eq!(goal.team_id, None);
    assert_eq!(goal.event_type, EventType::Goal);
    assert_eq!(goal.x, Some(88.0));
    assert!(goal.has(Flag::IsGoal));

    let unflagged = &parsed.events[2];
    assert_eq!(unflagged.team_id, Some(1240));
    assert_eq!(unflagged.x, Some(30.25));
    assert!(!unflagged.has(Flag::IsGoal));
}

#[test]
fn dataset_open_reads_parquet_by_extension() {
    let mut path = std::env::temp_dir();
    path.push(format!("datafutebol-{}-events.parquet", std::process::id()));
    fs::write(&path, write_parquet()).expect("temp file should be writable");

    let dataset = Dataset::open(&path, &EngineConfig::default()).expect("parquet should load");
    let _ = fs::remove_file(&path);

    assert_eq!(dataset.events().len(), 3);
    assert_eq!(dataset.events()[1].team_name, None);
    assert_eq!(dataset.events()[0].x, Some(45.5));
}
