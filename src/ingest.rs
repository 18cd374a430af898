use std::path::Path;

use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use tracing::warn;

use crate::dataset::DatasetError;
use crate::event::{Event, EventType, Flag, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_parquet = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));
        if is_parquet {
            SourceFormat::Parquet
        } else {
            SourceFormat::Csv
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedEvents {
    pub events: Vec<Event>,
    /// Rows without a usable match id or event type.
    pub skipped_rows: usize,
}

pub fn parse_events(bytes: Vec<u8>, format: SourceFormat) -> Result<ParsedEvents, DatasetError> {
    match format {
        SourceFormat::Csv => parse_csv(&bytes),
        SourceFormat::Parquet => parse_parquet(Bytes::from(bytes)),
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<ParsedEvents, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);
    let columns: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(Column::from_header)
        .collect();
    check_required(&columns)?;

    let mut out = ParsedEvents::default();
    for record in reader.records() {
        let record = record?;
        let mut builder = EventBuilder::default();
        for (idx, raw) in record.iter().enumerate() {
            let Some(Some(column)) = columns.get(idx) else {
                continue;
            };
            builder.set(*column, Cell::Text(raw));
        }
        push_built(&mut out, builder);
    }
    log_skipped(&out);
    Ok(out)
}

pub fn parse_parquet(bytes: Bytes) -> Result<ParsedEvents, DatasetError> {
    let reader = SerializedFileReader::new(bytes)?;
    let columns: Vec<Option<Column>> = reader
        .metadata()
        .file_metadata()
        .schema()
        .get_fields()
        .iter()
        .map(|field| Column::from_header(field.name()))
        .collect();
    check_required(&columns)?;

    let mut out = ParsedEvents::default();
    for row in reader.get_row_iter(None)? {
        let row = row?;
        let mut builder = EventBuilder::default();
        for (idx, (_, field)) in row.get_column_iter().enumerate() {
            let Some(Some(column)) = columns.get(idx) else {
                continue;
            };
            builder.set(*column, field_cell(field));
        }
        push_built(&mut out, builder);
    }
    log_skipped(&out);
    Ok(out)
}

fn push_built(out: &mut ParsedEvents, builder: EventBuilder) {
    match builder.finish() {
        Some(event) => out.events.push(event),
        None => out.skipped_rows += 1,
    }
}

fn log_skipped(out: &ParsedEvents) {
    if out.skipped_rows > 0 {
        warn!(
            skipped = out.skipped_rows,
            kept = out.events.len(),
            "rows without match id or event type were dropped"
        );
    }
}

fn check_required(columns: &[Option<Column>]) -> Result<(), DatasetError> {
    for required in Column::REQUIRED {
        if !columns.iter().any(|c| *c == Some(required)) {
            return Err(DatasetError::MissingColumn(required.header()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    MatchId,
    TeamId,
    PlayerName,
    Type,
    OutcomeType,
    X,
    Y,
    EndX,
    EndY,
    XThreat,
    Flag(Flag),
}

impl Column {
    const REQUIRED: [Column; 3] = [Column::MatchId, Column::Type, Column::X];

    fn from_header(name: &str) -> Option<Column> {
        let column = match name.trim() {
            "matchId" => Column::MatchId,
            "teamId" => Column::TeamId,
            "playerName" => Column::PlayerName,
            "type" => Column::Type,
            "outcomeType" => Column::OutcomeType,
            "x" => Column::X,
            "y" => Column::Y,
            "endX" => Column::EndX,
            "endY" => Column::EndY,
            "xThreat" => Column::XThreat,
            other => Column::Flag(Flag::from_column(other)?),
        };
        Some(column)
    }

    fn header(self) -> &'static str {
        match self {
            Column::MatchId => "matchId",
            Column::TeamId => "teamId",
            Column::PlayerName => "playerName",
            Column::Type => "type",
            Column::OutcomeType => "outcomeType",
            Column::X => "x",
            Column::Y => "y",
            Column::EndX => "endX",
            Column::EndY => "endY",
            Column::XThreat => "xThreat",
            Column::Flag(flag) => flag.column(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    Null,
}

impl Cell<'_> {
    fn number(self) -> Option<f64> {
        let v = match self {
            Cell::Text(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return None;
                }
                raw.parse::<f64>().ok()?
            }
            Cell::Number(v) => v,
            Cell::Bool(b) => f64::from(u8::from(b)),
            Cell::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    fn text(self) -> Option<String> {
        match self {
            Cell::Text(raw) => {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| raw.to_string())
            }
            _ => None,
        }
    }

    fn flag(self) -> bool {
        match self {
            Cell::Bool(b) => b,
            Cell::Number(v) => v != 0.0 && v.is_finite(),
            Cell::Text(raw) => matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "1.0" | "yes"
            ),
            Cell::Null => false,
        }
    }

    fn id<T: TryFrom<u64>>(self) -> Option<T> {
        let v = self.number()?;
        if v < 0.0 || v.fract() != 0.0 {
            return None;
        }
        T::try_from(v as u64).ok()
    }
}

fn field_cell(field: &Field) -> Cell<'_> {
    match field {
        Field::Null => Cell::Null,
        Field::Bool(b) => Cell::Bool(*b),
        Field::Byte(v) => Cell::Number(f64::from(*v)),
        Field::Short(v) => Cell::Number(f64::from(*v)),
        Field::Int(v) => Cell::Number(f64::from(*v)),
        Field::Long(v) => Cell::Number(*v as f64),
        Field::UByte(v) => Cell::Number(f64::from(*v)),
        Field::UShort(v) => Cell::Number(f64::from(*v)),
        Field::UInt(v) => Cell::Number(f64::from(*v)),
        Field::ULong(v) => Cell::Number(*v as f64),
        Field::Float(v) => Cell::Number(f64::from(*v)),
        Field::Double(v) => Cell::Number(*v),
        Field::Str(s) => Cell::Text(s.as_str()),
        _ => Cell::Null,
    }
}

#[derive(Debug, Default)]
struct EventBuilder {
    match_id: Option<u64>,
    team_id: Option<u32>,
    player_name: Option<String>,
    event_type: Option<EventType>,
    outcome: Option<Outcome>,
    x: Option<f64>,
    y: Option<f64>,
    end_x: Option<f64>,
    end_y: Option<f64>,
    x_threat: f64,
    flags: crate::event::EventFlags,
}

impl EventBuilder {
    fn set(&mut self, column: Column, cell: Cell<'_>) {
        match column {
            Column::MatchId => self.match_id = cell.id(),
            Column::TeamId => self.team_id = cell.id(),
            Column::PlayerName => self.player_name = cell.text(),
            Column::Type => self.event_type = cell.text().map(EventType::from),
            Column::OutcomeType => {
                self.outcome = cell.text().and_then(|raw| raw.parse().ok());
            }
            Column::X => self.x = cell.number(),
            Column::Y => self.y = cell.number(),
            Column::EndX => self.end_x = cell.number(),
            Column::EndY => self.end_y = cell.number(),
            Column::XThreat => self.x_threat = cell.number().unwrap_or(0.0),
            Column::Flag(flag) => self.flags.set(flag, cell.flag()),
        }
    }

    fn finish(self) -> Option<Event> {
        Some(Event {
            match_id: self.match_id?,
            team_id: self.team_id,
            team_name: None,
            player_name: self.player_name,
            event_type: self.event_type?,
            outcome: self.outcome,
            x: self.x,
            y: self.y,
            end_x: self.end_x,
            end_y: self.end_y,
            x_threat: self.x_threat,
            flags: self.flags,
        })
    }
}
