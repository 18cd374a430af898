use std::collections::HashSet;

use serde::Serialize;

use crate::event::{Event, EventType, Flag};

/// Opta pitch: both axes run 0–100.
pub const PITCH_LENGTH: f64 = 100.0;
pub const PITCH_WIDTH: f64 = 100.0;

pub const HEATMAP_COLS: usize = 30;
pub const HEATMAP_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapAction {
    Passes,
    Carries,
    Shots,
    BallRecoveries,
    Tackles,
    Interceptions,
    KeyPasses,
}

enum Selector {
    Type(EventType),
    Flag(Flag),
}

impl MapAction {
    pub const ALL: [MapAction; 7] = [
        MapAction::Passes,
        MapAction::Carries,
        MapAction::Shots,
        MapAction::BallRecoveries,
        MapAction::Tackles,
        MapAction::Interceptions,
        MapAction::KeyPasses,
    ];

    fn selector(self) -> Selector {
        match self {
            MapAction::Passes => Selector::Type(EventType::Pass),
            MapAction::Carries => Selector::Type(EventType::Carry),
            MapAction::Shots => Selector::Flag(Flag::IsShot),
            MapAction::BallRecoveries => Selector::Type(EventType::BallRecovery),
            MapAction::Tackles => Selector::Type(EventType::Tackle),
            MapAction::Interceptions => Selector::Type(EventType::Interception),
            MapAction::KeyPasses => Selector::Flag(Flag::KeyPass),
        }
    }

    pub fn matches(self, event: &Event) -> bool {
        match self.selector() {
            Selector::Type(kind) => event.event_type == kind,
            Selector::Flag(flag) => event.has(flag),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MapAction::Passes => "Passes",
            MapAction::Carries => "Conduções",
            MapAction::Shots => "Finalizações",
            MapAction::BallRecoveries => "Recuperações de bola",
            MapAction::Tackles => "Desarmes",
            MapAction::Interceptions => "Interceptações",
            MapAction::KeyPasses => "Passes-chave",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            MapAction::Passes => "passes",
            MapAction::Carries => "carries",
            MapAction::Shots => "shots",
            MapAction::BallRecoveries => "ball_recoveries",
            MapAction::Tackles => "tackles",
            MapAction::Interceptions => "interceptions",
            MapAction::KeyPasses => "key_passes",
        }
    }
}

impl std::str::FromStr for MapAction {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        MapAction::ALL
            .into_iter()
            .find(|a| a.key().eq_ignore_ascii_case(needle) || a.label() == needle)
            .ok_or_else(|| format!("unknown map action {needle:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapKind {
    #[default]
    Locations,
    Heatmap,
}

impl MapKind {
    pub fn label(self) -> &'static str {
        match self {
            MapKind::Locations => "Localização",
            MapKind::Heatmap => "Heatmap",
        }
    }
}

pub fn player_actions<'a>(events: &'a [Event], player: &str, action: MapAction) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|e| e.player_name.as_deref() == Some(player) && action.matches(e))
        .collect()
}

pub type Point = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mark", rename_all = "snake_case")]
pub enum PitchMark {
    /// Pass from start to end, coloured by outcome.
    Arrow { from: Point, to: Point, successful: bool },
    /// Carry path; the end point is highlighted.
    Line { from: Point, to: Point },
    Dot { at: Point },
}

impl PitchMark {
    pub fn anchor(&self) -> Point {
        match self {
            PitchMark::Arrow { from, .. } | PitchMark::Line { from, .. } => *from,
            PitchMark::Dot { at } => *at,
        }
    }
}

/// Location marks for a set of actions. Events missing a coordinate the
/// mark needs are left out.
pub fn marks(events: &[&Event], action: MapAction) -> Vec<PitchMark> {
    events
        .iter()
        .filter_map(|e| {
            let from = (e.x?, e.y?);
            match action {
                MapAction::Passes => Some(PitchMark::Arrow {
                    from,
                    to: (e.end_x?, e.end_y?),
                    successful: e.is_successful(),
                }),
                MapAction::Carries => Some(PitchMark::Line {
                    from,
                    to: (e.end_x?, e.end_y?),
                }),
                _ => Some(PitchMark::Dot { at: from }),
            }
        })
        .collect()
}

/// Count grid over the pitch, column-major from the defending goal line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cols: usize,
    pub rows: usize,
    counts: Vec<u32>,
}

impl Heatmap {
    pub fn bin(events: &[&Event], cols: usize, rows: usize) -> Self {
        let mut map = Self {
            cols,
            rows,
            counts: vec![0; cols * rows],
        };
        if cols == 0 || rows == 0 {
            return map;
        }
        for event in events {
            let (Some(x), Some(y)) = (event.x, event.y) else {
                continue;
            };
            let (Some(c), Some(r)) = (bin_index(x, PITCH_LENGTH, cols), bin_index(y, PITCH_WIDTH, rows))
            else {
                continue;
            };
            map.counts[r * cols + c] += 1;
        }
        map
    }

    pub fn count(&self, col: usize, row: usize) -> u32 {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        self.counts[row * self.cols + col]
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

fn bin_index(v: f64, extent: f64, bins: usize) -> Option<usize> {
    if !(0.0..=extent).contains(&v) {
        return None;
    }
    let idx = (v / extent * bins as f64).floor() as usize;
    Some(idx.min(bins - 1))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSearch {
    pub players: Vec<String>,
    /// Nothing matched the query; `players` holds everyone.
    pub fallback: bool,
}

/// Case-insensitive substring search over distinct player names, in
/// first-appearance order.
pub fn search_players(events: &[Event], query: &str) -> PlayerSearch {
    let mut seen = HashSet::new();
    let all: Vec<&str> = events
        .iter()
        .filter_map(|e| e.player_name.as_deref())
        .filter(|name| seen.insert(*name))
        .collect();

    let needle = query.trim().to_lowercase();
    let hits: Vec<String> = all
        .iter()
        .filter(|name| name.to_lowercase().contains(&needle))
        .map(|name| name.to_string())
        .collect();
    if hits.is_empty() {
        PlayerSearch {
            players: all.into_iter().map(str::to_string).collect(),
            fallback: true,
        }
    } else {
        PlayerSearch {
            players: hits,
            fallback: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Outcome;

    fn ev(player: &str, kind: EventType, x: f64, y: f64) -> Event {
        let mut e = Event::new(1, kind);
        e.player_name = Some(player.to_string());
        e.x = Some(x);
        e.y = Some(y);
        e
    }

    #[test]
    fn shots_are_selected_by_flag() {
        let mut shot = ev("Pedro", EventType::SavedShot, 88.0, 50.0);
        shot.flags.insert(Flag::IsShot);
        let events = vec![shot, ev("Pedro", EventType::Pass, 40.0, 40.0)];
        let picked = player_actions(&events, "Pedro", MapAction::Shots);
        assert_eq!(picked.len(), 1);
        assert_eq!(marks(&picked, MapAction::Shots), vec![PitchMark::Dot { at: (88.0, 50.0) }]);
    }

    #[test]
    fn pass_arrows_need_end_points() {
        let mut ok = ev("Arrascaeta", EventType::Pass, 50.0, 50.0);
        ok.end_x = Some(70.0);
        ok.end_y = Some(30.0);
        ok.outcome = Some(Outcome::Successful);
        let open = ev("Arrascaeta", EventType::Pass, 60.0, 50.0);
        let events = [&ok, &open];
        let out = marks(&events, MapAction::Passes);
        assert_eq!(
            out,
            vec![PitchMark::Arrow {
                from: (50.0, 50.0),
                to: (70.0, 30.0),
                successful: true
            }]
        );
    }

    #[test]
    fn heatmap_edges_land_in_last_bin() {
        let events = [
            ev("A", EventType::Pass, 100.0, 100.0),
            ev("A", EventType::Pass, 0.0, 0.0),
            ev("A", EventType::Pass, 101.0, 10.0),
        ];
        let refs: Vec<&Event> = events.iter().collect();
        let map = Heatmap::bin(&refs, HEATMAP_COLS, HEATMAP_ROWS);
        assert_eq!(map.count(29, 19), 1);
        assert_eq!(map.count(0, 0), 1);
        assert_eq!(map.total(), 2);
        assert_eq!(map.max(), 1);
    }

    #[test]
    fn search_falls_back_to_everyone() {
        let events = vec![
            ev("Pedro", EventType::Pass, 1.0, 1.0),
            ev("Gerson", EventType::Pass, 1.0, 1.0),
            ev("Pedro", EventType::Pass, 1.0, 1.0),
        ];
        let hit = search_players(&events, "ped");
        assert_eq!(hit.players, vec!["Pedro".to_string()]);
        assert!(!hit.fallback);

        let miss = search_players(&events, "zico");
        assert!(miss.fallback);
        assert_eq!(miss.players, vec!["Pedro".to_string(), "Gerson".to_string()]);
    }
}
