use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventType;
use crate::teams::{TeamDirectory, TeamEntry};

/// Opponent-half line: defensive actions count only beyond it.
pub const PRESSING_LINE_X: f64 = 60.0;
/// Build-up line: opponent passes count as "allowed" only behind it.
pub const BUILD_UP_LINE_X: f64 = 40.0;
pub const ATTACKING_THIRD_X: f64 = 67.0;

pub const DEFENSIVE_ACTIONS_WITH_FOULS: [EventType; 4] = [
    EventType::Tackle,
    EventType::Challenge,
    EventType::Interception,
    EventType::Foul,
];
pub const DEFENSIVE_ACTIONS_WITHOUT_FOULS: [EventType; 3] =
    [EventType::Tackle, EventType::Challenge, EventType::Interception];

pub const CONFIG_ENV: &str = "DATAFUTEBOL_CONFIG";
pub const DEFENSIVE_SET_ENV: &str = "DATAFUTEBOL_DEFENSIVE_SET";
pub const DATA_ENV: &str = "DATAFUTEBOL_DATA";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("unknown defensive action set {0:?} (expected with_fouls or without_fouls)")]
    DefensiveSet(String),
    #[error("no dataset: pass --data, set DATAFUTEBOL_DATA or use --demo")]
    NoDataset,
}

/// How unbounded per-match PPDA values enter the season mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnboundedPpdaPolicy {
    /// Leave unbounded matches out of the mean; unbounded only if every match is.
    #[default]
    Exclude,
    /// Any unbounded match makes the mean unbounded.
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub defensive_actions: Vec<EventType>,
    pub pressing_line_x: f64,
    pub build_up_line_x: f64,
    pub attacking_third_x: f64,
    pub unbounded_ppda: UnboundedPpdaPolicy,
    /// Added to (or overriding) the built-in team directory.
    pub extra_teams: Vec<TeamEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defensive_actions: DEFENSIVE_ACTIONS_WITH_FOULS.to_vec(),
            pressing_line_x: PRESSING_LINE_X,
            build_up_line_x: BUILD_UP_LINE_X,
            attacking_third_x: ATTACKING_THIRD_X,
            unbounded_ppda: UnboundedPpdaPolicy::default(),
            extra_teams: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn without_fouls() -> Self {
        Self {
            defensive_actions: DEFENSIVE_ACTIONS_WITHOUT_FOULS.to_vec(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit path first, then `DATAFUTEBOL_CONFIG`, then defaults; the
    /// `DATAFUTEBOL_DEFENSIVE_SET` override applies on top of any of them.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let mut config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        if let Ok(raw) = std::env::var(DEFENSIVE_SET_ENV) {
            if !raw.trim().is_empty() {
                config.defensive_actions = parse_defensive_set(&raw)?;
            }
        }
        Ok(config)
    }

    pub fn is_defensive_action(&self, kind: &EventType) -> bool {
        self.defensive_actions.contains(kind)
    }

    pub fn team_directory(&self) -> TeamDirectory {
        let mut dir = TeamDirectory::brasileirao_2025();
        dir.extend(&self.extra_teams);
        dir
    }

    /// Stable byte form used in dataset cache keys.
    pub fn fingerprint(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

pub fn parse_defensive_set(raw: &str) -> Result<Vec<EventType>, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "with_fouls" | "full" => Ok(DEFENSIVE_ACTIONS_WITH_FOULS.to_vec()),
        "without_fouls" | "no_fouls" => Ok(DEFENSIVE_ACTIONS_WITHOUT_FOULS.to_vec()),
        _ => Err(ConfigError::DefensiveSet(raw.to_string())),
    }
}

/// Dataset path from `DATAFUTEBOL_DATA`, if set.
pub fn data_path_from_env() -> Option<PathBuf> {
    std::env::var(DATA_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

/// Where the event log comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    File(PathBuf),
    /// Synthetic season; only ever picked on explicit request.
    Demo,
}

impl DataSource {
    /// `--demo` wins, then an explicit path, then `fallback`. With none of
    /// them there is no dataset.
    pub fn pick(
        explicit: Option<PathBuf>,
        fallback: Option<PathBuf>,
        demo: bool,
    ) -> Result<Self, ConfigError> {
        if demo {
            return Ok(DataSource::Demo);
        }
        explicit
            .or(fallback)
            .map(DataSource::File)
            .ok_or(ConfigError::NoDataset)
    }

    /// [`DataSource::pick`] with `DATAFUTEBOL_DATA` as the fallback.
    pub fn resolve(explicit: Option<PathBuf>, demo: bool) -> Result<Self, ConfigError> {
        Self::pick(explicit, data_path_from_env(), demo)
    }
}
