use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;

use crate::cache::DatasetKey;
use crate::config::EngineConfig;
use crate::event::Event;
use crate::ingest::{self, ParsedEvents, SourceFormat};
use crate::match_stats::{self, TeamMatchStats, TeamSeasonStats};
use crate::percentile::{self, CompareError, PercentileEntry, PlayerKey};
use crate::rankings::{
    self, AggregatedRow, AggregationMode, Grouping, RankingFilter, RankingTable, RankingView, Stat,
};
use crate::teams::TeamDirectory;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read dataset {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("required column {0:?} is missing")]
    MissingColumn(&'static str),
}

/// Coordinate system detected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateScale {
    /// Source used 0–1; every coordinate was multiplied by 100.
    Unit,
    /// Source already used 0–100 (or had no coordinates).
    Percent,
}

/// Rescales a 0–1 event log to 0–100 in place.
///
/// The check is global: if the largest `x` in the whole log is at most 1.0,
/// `x`, `y`, `endX` and `endY` of every event are multiplied by 100.
pub fn normalize_coordinates(events: &mut [Event]) -> CoordinateScale {
    let max_x = events
        .iter()
        .filter_map(|e| e.x)
        .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |m| m.max(x))));
    match max_x {
        Some(max) if max <= 1.0 => {
            for event in events.iter_mut() {
                for coord in [&mut event.x, &mut event.y, &mut event.end_x, &mut event.end_y] {
                    if let Some(v) = coord.as_mut() {
                        *v *= 100.0;
                    }
                }
            }
            CoordinateScale::Unit
        }
        _ => CoordinateScale::Percent,
    }
}

/// Fills `team_name` from `team_id`; unknown ids stay `None`.
pub fn resolve_team_names(events: &mut [Event], directory: &TeamDirectory) {
    for event in events.iter_mut() {
        event.team_name = event
            .team_id
            .and_then(|id| directory.resolve(id))
            .map(str::to_string);
    }
}

/// A normalized event log plus lazily derived tables.
///
/// Everything here is immutable once built; derived tables are computed on
/// first use and reused for the lifetime of the dataset.
#[derive(Debug)]
pub struct Dataset {
    key: DatasetKey,
    source: Option<PathBuf>,
    config: EngineConfig,
    events: Vec<Event>,
    scale: CoordinateScale,
    skipped_rows: usize,
    match_stats: OnceCell<Vec<TeamMatchStats>>,
    player_rows: OnceCell<Vec<AggregatedRow>>,
    team_rows: OnceCell<Vec<AggregatedRow>>,
}

impl Dataset {
    /// Reads, parses and normalizes a file without going through a cache.
    pub fn open(path: &Path, config: &EngineConfig) -> Result<Self, DatasetError> {
        let bytes = read_source(path)?;
        let key = DatasetKey::derive(&bytes, config);
        Self::from_bytes(key, path, bytes, config)
    }

    pub(crate) fn from_bytes(
        key: DatasetKey,
        path: &Path,
        bytes: Vec<u8>,
        config: &EngineConfig,
    ) -> Result<Self, DatasetError> {
        let parsed = ingest::parse_events(bytes, SourceFormat::from_path(path))?;
        let dataset = Self::from_parsed(key, Some(path.to_path_buf()), parsed, config);
        info!(
            path = %path.display(),
            events = dataset.events.len(),
            skipped = dataset.skipped_rows,
            scale = ?dataset.scale,
            key = %dataset.key,
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Builds a dataset from already-parsed rows (team names are resolved
    /// and coordinates normalized here).
    pub fn from_events(key: DatasetKey, events: Vec<Event>, config: &EngineConfig) -> Self {
        Self::from_parsed(
            key,
            None,
            ParsedEvents {
                events,
                skipped_rows: 0,
            },
            config,
        )
    }

    fn from_parsed(
        key: DatasetKey,
        source: Option<PathBuf>,
        parsed: ParsedEvents,
        config: &EngineConfig,
    ) -> Self {
        let ParsedEvents {
            mut events,
            skipped_rows,
        } = parsed;
        resolve_team_names(&mut events, &config.team_directory());
        let scale = normalize_coordinates(&mut events);
        Self {
            key,
            source,
            config: config.clone(),
            events,
            scale,
            skipped_rows,
            match_stats: OnceCell::new(),
            player_rows: OnceCell::new(),
            team_rows: OnceCell::new(),
        }
    }

    pub fn key(&self) -> &DatasetKey {
        &self.key
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn scale(&self) -> CoordinateScale {
        self.scale
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn match_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.match_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct resolved team names, sorted.
    pub fn teams(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.team_name.as_deref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn match_stats(&self) -> &[TeamMatchStats] {
        self.match_stats
            .get_or_init(|| match_stats::compute_match_stats(&self.events, &self.config))
    }

    pub fn season_stats(&self) -> Vec<TeamSeasonStats> {
        match_stats::season_averages(self.match_stats(), self.config.unbounded_ppda)
    }

    pub fn aggregated(&self, grouping: Grouping) -> &[AggregatedRow] {
        let cell = match grouping {
            Grouping::Player => &self.player_rows,
            Grouping::Team => &self.team_rows,
        };
        cell.get_or_init(|| rankings::aggregate(&self.events, grouping, &self.config))
    }

    pub fn rankings(
        &self,
        view: RankingView,
        grouping: Grouping,
        mode: AggregationMode,
        filter: &RankingFilter,
    ) -> RankingTable {
        RankingTable::for_view(self.aggregated(grouping), view, mode, filter)
    }

    pub fn leaderboard(
        &self,
        stat: Stat,
        grouping: Grouping,
        mode: AggregationMode,
        filter: &RankingFilter,
    ) -> RankingTable {
        RankingTable::for_stats(self.aggregated(grouping), &[stat], mode, filter)
    }

    pub fn compare(
        &self,
        players: &[PlayerKey],
        stats: &[Stat],
    ) -> Result<Vec<PercentileEntry>, CompareError> {
        percentile::compare_players(self.aggregated(Grouping::Player), players, stats)
    }
}

pub(crate) fn read_source(path: &Path) -> Result<Vec<u8>, DatasetError> {
    fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DatasetError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DatasetError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;

    fn at(x: f64, y: f64) -> Event {
        let mut e = Event::new(1, EventType::Pass);
        e.x = Some(x);
        e.y = Some(y);
        e.end_x = Some(x);
        e.end_y = Some(y);
        e
    }

    #[test]
    fn unit_coordinates_are_scaled_once() {
        let mut events = vec![at(0.25, 0.5), at(1.0, 0.1)];
        assert_eq!(normalize_coordinates(&mut events), CoordinateScale::Unit);
        assert_eq!(events[0].x, Some(25.0));
        assert_eq!(events[0].end_y, Some(50.0));
        assert_eq!(events[1].x, Some(100.0));

        let snapshot = events.clone();
        assert_eq!(normalize_coordinates(&mut events), CoordinateScale::Percent);
        assert_eq!(events, snapshot);
    }

    #[test]
    fn percent_coordinates_are_untouched() {
        let mut events = vec![at(0.5, 0.5), at(55.0, 20.0)];
        assert_eq!(normalize_coordinates(&mut events), CoordinateScale::Percent);
        assert_eq!(events[0].x, Some(0.5));
    }

    #[test]
    fn empty_log_is_left_alone() {
        let mut events: Vec<Event> = Vec::new();
        assert_eq!(normalize_coordinates(&mut events), CoordinateScale::Percent);
    }

    #[test]
    fn unknown_team_ids_resolve_to_none() {
        let mut events = vec![at(10.0, 10.0), at(20.0, 20.0), at(30.0, 30.0)];
        events[0].team_id = Some(1239);
        events[1].team_id = Some(4242);
        resolve_team_names(&mut events, &TeamDirectory::brasileirao_2025());
        assert_eq!(events[0].team_name.as_deref(), Some("Flamengo"));
        assert_eq!(events[1].team_name, None);
        assert_eq!(events[2].team_name, None);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Dataset::open(
            Path::new("/definitely/not/here/BRA25.csv"),
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::NotFound { .. }));
    }
}
