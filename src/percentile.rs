use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rankings::{AggregatedRow, AggregationMode, Stat};
use crate::value::Value;

pub const METRIC_RANGE: RangeInclusive<usize> = 4..=10;
pub const PLAYER_RANGE: RangeInclusive<usize> = 2..=4;

/// Players are identified by name and club; the same name may appear for
/// two teams after a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerKey {
    pub player: String,
    pub team: String,
}

impl PlayerKey {
    pub fn new(player: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            team: team.into(),
        }
    }

    fn matches(&self, row: &AggregatedRow) -> bool {
        row.player.as_deref() == Some(self.player.as_str()) && row.team == self.team
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.player, self.team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileEntry {
    pub player: String,
    pub team: String,
    pub stat: Stat,
    /// Per-game value the percentile was computed from.
    pub value: Value,
    /// In `(0, 1]`; `None` when the player's value is undefined.
    pub percentile: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum CompareError {
    #[error("pick between 4 and 10 metrics (got {0})")]
    MetricCount(usize),
    #[error("pick between 2 and 4 players (got {0})")]
    PlayerCount(usize),
    #[error("metric {0:?} selected twice")]
    DuplicateMetric(Stat),
    #[error("player {0} selected twice")]
    DuplicatePlayer(PlayerKey),
    #[error("player {0} not found in dataset")]
    UnknownPlayer(PlayerKey),
}

/// Ranks the selected players against the whole per-game population.
///
/// Output is one entry per (player, metric), players in selection order and
/// metrics in selection order within each player.
pub fn compare_players(
    population: &[AggregatedRow],
    players: &[PlayerKey],
    stats: &[Stat],
) -> Result<Vec<PercentileEntry>, CompareError> {
    if !METRIC_RANGE.contains(&stats.len()) {
        return Err(CompareError::MetricCount(stats.len()));
    }
    if !PLAYER_RANGE.contains(&players.len()) {
        return Err(CompareError::PlayerCount(players.len()));
    }
    let mut seen_stats = HashSet::new();
    for stat in stats {
        if !seen_stats.insert(*stat) {
            return Err(CompareError::DuplicateMetric(*stat));
        }
    }
    let mut seen_players = HashSet::new();
    let mut selected = Vec::with_capacity(players.len());
    for key in players {
        if !seen_players.insert(key) {
            return Err(CompareError::DuplicatePlayer(key.clone()));
        }
        let row = population
            .iter()
            .find(|row| key.matches(row))
            .ok_or_else(|| CompareError::UnknownPlayer(key.clone()))?;
        selected.push((key, row));
    }

    let columns: Vec<Vec<f64>> = stats
        .iter()
        .map(|stat| {
            population
                .iter()
                .filter(|row| row.player.is_some())
                .filter_map(|row| row.value(*stat, AggregationMode::PerGame).as_f64())
                .collect()
        })
        .collect();

    let mut out = Vec::with_capacity(players.len() * stats.len());
    for (key, row) in selected {
        for (stat, column) in stats.iter().zip(&columns) {
            let value = row.value(*stat, AggregationMode::PerGame);
            out.push(PercentileEntry {
                player: key.player.clone(),
                team: key.team.clone(),
                stat: *stat,
                value,
                percentile: value.as_f64().and_then(|v| percentile_rank(column, v)),
            });
        }
    }
    Ok(out)
}

/// Average-rank percentile of `value` within `population`.
///
/// Ties share the mean of the ranks they span; the result is that rank
/// divided by the population size. A unique maximum maps to 1.0, while `k`
/// tied maxima each get `(2n - k + 1) / 2n` and stay below it.
pub fn percentile_rank(population: &[f64], value: f64) -> Option<f64> {
    if population.is_empty() {
        return None;
    }
    let below = population.iter().filter(|v| **v < value).count();
    let equal = population.iter().filter(|v| **v == value).count();
    if equal == 0 {
        return None;
    }
    let first = below as f64 + 1.0;
    let last = (below + equal) as f64;
    Some((first + last) / 2.0 / population.len() as f64)
}
