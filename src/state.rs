use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::dataset::Dataset;
use crate::match_stats::{TeamMatchStats, TeamSeasonStats};
use crate::percentile::{CompareError, PercentileEntry, PlayerKey, PLAYER_RANGE};
use crate::pitch::{self, Heatmap, MapAction, MapKind, PitchMark, PlayerSearch};
use crate::rankings::{
    AggregationMode, Grouping, RankingFilter, RankingRow, RankingTable, RankingView, Stat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Rankings,
    Teams,
    Compare,
    Map,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Screen::Rankings => "RANKINGS",
            Screen::Teams => "TIMES",
            Screen::Compare => "COMPARAR",
            Screen::Map => "MAPA",
        }
    }
}

/// Metric sets offered on the comparison screen.
pub const COMPARE_PRESETS: [(&str, &[Stat]); 3] = [
    (
        "Criação",
        &[
            Stat::TotalPasses,
            Stat::PassAccuracy,
            Stat::KeyPasses,
            Stat::Assists,
            Stat::ProgressivePasses,
            Stat::BoxEntries,
        ],
    ),
    (
        "Finalização",
        &[
            Stat::Goals,
            Stat::Shots,
            Stat::ShotsOnTarget,
            Stat::XThreat,
            Stat::BigChancesCreated,
            Stat::DribblesWon,
        ],
    ),
    (
        "Defesa",
        &[
            Stat::TacklesWon,
            Stat::Interceptions,
            Stat::Clearances,
            Stat::BallRecoveries,
            Stat::AerialsWon,
            Stat::Fouls,
        ],
    ),
];

pub const MAX_MIN_GAMES: u32 = 38;

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub dataset: Option<Arc<Dataset>>,
    pub view: RankingView,
    pub mode: AggregationMode,
    pub grouping: Grouping,
    pub team_filter: Option<String>,
    pub min_games: u32,
    /// Column the rankings are sorted by; `None` means the view's default.
    pub sort_stat: Option<Stat>,
    pub rankings_selected: usize,
    pub teams_selected: usize,
    pub compare_players: Vec<PlayerKey>,
    pub compare_selected: usize,
    pub compare_preset: usize,
    pub map_query: String,
    pub map_search_active: bool,
    pub map_selected: usize,
    pub map_action: MapAction,
    pub map_kind: MapKind,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Rankings,
            dataset: None,
            view: RankingView::Passing,
            mode: AggregationMode::Total,
            grouping: Grouping::Player,
            team_filter: None,
            min_games: 0,
            sort_stat: None,
            rankings_selected: 0,
            teams_selected: 0,
            compare_players: Vec::with_capacity(*PLAYER_RANGE.end()),
            compare_selected: 0,
            compare_preset: 0,
            map_query: String::new(),
            map_search_active: false,
            map_selected: 0,
            map_action: MapAction::Passes,
            map_kind: MapKind::Locations,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn with_dataset(dataset: Arc<Dataset>) -> Self {
        let mut state = Self::new();
        state.set_dataset(dataset);
        state
    }

    /// Swaps the loaded dataset and resets every selection that pointed into
    /// the previous one.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.push_log(format!(
            "[INFO] Loaded {} events ({} matches, {} teams)",
            dataset.events().len(),
            dataset.match_count(),
            dataset.teams().len()
        ));
        if dataset.skipped_rows() > 0 {
            self.push_log(format!(
                "[WARN] {} rows without match id or type were skipped",
                dataset.skipped_rows()
            ));
        }
        self.dataset = Some(dataset);
        self.team_filter = None;
        self.rankings_selected = 0;
        self.teams_selected = 0;
        self.compare_players.clear();
        self.compare_selected = 0;
        self.map_selected = 0;
    }

    /// Drops the loaded dataset after a failed load so stale figures are
    /// not shown under the new source.
    pub fn clear_dataset(&mut self, reason: impl std::fmt::Display) {
        self.push_log(format!("[ERROR] {reason}"));
        self.dataset = None;
        self.team_filter = None;
        self.rankings_selected = 0;
        self.teams_selected = 0;
        self.compare_players.clear();
        self.compare_selected = 0;
        self.map_selected = 0;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn cycle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Rankings => Screen::Teams,
            Screen::Teams => Screen::Compare,
            Screen::Compare => Screen::Map,
            Screen::Map => Screen::Rankings,
        };
    }

    pub fn cycle_view(&mut self) {
        self.view = match self.view {
            RankingView::Passing => RankingView::Attacking,
            RankingView::Attacking => RankingView::Defending,
            RankingView::Defending => RankingView::Passing,
        };
        self.sort_stat = None;
        self.rankings_selected = 0;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AggregationMode::Total => AggregationMode::PerGame,
            AggregationMode::PerGame => AggregationMode::Total,
        };
        self.clamp_selection();
    }

    pub fn toggle_grouping(&mut self) {
        self.grouping = match self.grouping {
            Grouping::Player => Grouping::Team,
            Grouping::Team => Grouping::Player,
        };
        self.rankings_selected = 0;
    }

    /// None → first team → … → last team → None.
    pub fn cycle_team_filter(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let teams = dataset.teams();
        let next = match &self.team_filter {
            None => teams.first().map(|t| t.to_string()),
            Some(current) => teams
                .iter()
                .position(|t| t == current)
                .and_then(|idx| teams.get(idx + 1))
                .map(|t| t.to_string()),
        };
        self.team_filter = next;
        self.rankings_selected = 0;
    }

    pub fn adjust_min_games(&mut self, delta: i32) {
        let next = (self.min_games as i64 + i64::from(delta)).clamp(0, i64::from(MAX_MIN_GAMES));
        self.min_games = next as u32;
        self.clamp_selection();
    }

    /// Moves the sort key to the next column of the current view.
    pub fn cycle_sort_column(&mut self) {
        let columns = self.view.columns();
        let current = self.sort_stat.unwrap_or(columns[0]);
        let idx = columns.iter().position(|s| *s == current).unwrap_or(0);
        let next = columns[(idx + 1) % columns.len()];
        self.sort_stat = if next == columns[0] { None } else { Some(next) };
        self.rankings_selected = 0;
    }

    pub fn filter(&self) -> RankingFilter {
        RankingFilter {
            team: self.team_filter.clone(),
            min_games: self.min_games,
        }
    }

    pub fn ranking_table(&self) -> Option<RankingTable> {
        let dataset = self.dataset.as_ref()?;
        let mut table = dataset.rankings(self.view, self.grouping, self.mode, &self.filter());
        if let Some(stat) = self.sort_stat {
            table.sort_by(stat);
        }
        Some(table)
    }

    pub fn selected_ranking_row(&self) -> Option<RankingRow> {
        self.ranking_table()?
            .rows
            .into_iter()
            .nth(self.rankings_selected)
    }

    pub fn season_rows(&self) -> Vec<TeamSeasonStats> {
        self.dataset
            .as_ref()
            .map(|d| d.season_stats())
            .unwrap_or_default()
    }

    pub fn selected_team_matches(&self) -> Vec<TeamMatchStats> {
        let Some(dataset) = &self.dataset else {
            return Vec::new();
        };
        let season = dataset.season_stats();
        let Some(team) = season.get(self.teams_selected) else {
            return Vec::new();
        };
        dataset
            .match_stats()
            .iter()
            .filter(|m| m.team == team.team)
            .cloned()
            .collect()
    }

    /// Adds the highlighted player to the comparison, or removes them if
    /// already picked.
    pub fn toggle_compare_selected(&mut self) {
        if self.grouping != Grouping::Player {
            self.push_log("[INFO] Switch to player rankings to pick players");
            return;
        }
        let Some(row) = self.selected_ranking_row() else {
            return;
        };
        let Some(player) = row.player else {
            return;
        };
        let key = PlayerKey::new(player, row.team);
        if let Some(pos) = self.compare_players.iter().position(|k| *k == key) {
            self.compare_players.remove(pos);
            self.push_log(format!("[INFO] Removed {key} from comparison"));
            return;
        }
        if self.compare_players.len() >= *PLAYER_RANGE.end() {
            self.push_log(format!(
                "[WARN] Comparison is limited to {} players",
                PLAYER_RANGE.end()
            ));
            return;
        }
        self.push_log(format!("[INFO] Added {key} to comparison"));
        self.compare_players.push(key);
    }

    pub fn remove_compare_selected(&mut self) {
        if self.compare_selected >= self.compare_players.len() {
            return;
        }
        let key = self.compare_players.remove(self.compare_selected);
        self.push_log(format!("[INFO] Removed {key} from comparison"));
        self.clamp_selection();
    }

    pub fn cycle_compare_preset(&mut self) {
        self.compare_preset = (self.compare_preset + 1) % COMPARE_PRESETS.len();
    }

    pub fn compare_stats(&self) -> &'static [Stat] {
        COMPARE_PRESETS[self.compare_preset % COMPARE_PRESETS.len()].1
    }

    pub fn comparison(&self) -> Option<Result<Vec<PercentileEntry>, CompareError>> {
        let dataset = self.dataset.as_ref()?;
        Some(dataset.compare(&self.compare_players, self.compare_stats()))
    }

    pub fn map_search(&self) -> PlayerSearch {
        match &self.dataset {
            Some(dataset) => pitch::search_players(dataset.events(), &self.map_query),
            None => PlayerSearch {
                players: Vec::new(),
                fallback: true,
            },
        }
    }

    pub fn map_player(&self) -> Option<String> {
        self.map_search().players.into_iter().nth(self.map_selected)
    }

    pub fn push_map_query(&mut self, ch: char) {
        self.map_query.push(ch);
        self.map_selected = 0;
    }

    pub fn pop_map_query(&mut self) {
        self.map_query.pop();
        self.map_selected = 0;
    }

    pub fn cycle_map_action(&mut self) {
        let all = MapAction::ALL;
        let idx = all.iter().position(|a| *a == self.map_action).unwrap_or(0);
        self.map_action = all[(idx + 1) % all.len()];
    }

    pub fn toggle_map_kind(&mut self) {
        self.map_kind = match self.map_kind {
            MapKind::Locations => MapKind::Heatmap,
            MapKind::Heatmap => MapKind::Locations,
        };
    }

    pub fn map_marks(&self) -> Vec<PitchMark> {
        let (Some(dataset), Some(player)) = (&self.dataset, self.map_player()) else {
            return Vec::new();
        };
        let actions = pitch::player_actions(dataset.events(), &player, self.map_action);
        pitch::marks(&actions, self.map_action)
    }

    pub fn map_heatmap(&self, cols: usize, rows: usize) -> Option<Heatmap> {
        let dataset = self.dataset.as_ref()?;
        let player = self.map_player()?;
        let actions = pitch::player_actions(dataset.events(), &player, self.map_action);
        Some(Heatmap::bin(&actions, cols, rows))
    }

    fn list_len(&self) -> usize {
        match self.screen {
            Screen::Rankings => self.ranking_table().map_or(0, |t| t.rows.len()),
            Screen::Teams => self.season_rows().len(),
            Screen::Compare => self.compare_players.len(),
            Screen::Map => self.map_search().players.len(),
        }
    }

    fn cursor_mut(&mut self) -> &mut usize {
        match self.screen {
            Screen::Rankings => &mut self.rankings_selected,
            Screen::Compare => &mut self.compare_selected,
            Screen::Teams => &mut self.teams_selected,
            Screen::Map => &mut self.map_selected,
        }
    }

    pub fn select_next(&mut self) {
        let total = self.list_len();
        let cursor = self.cursor_mut();
        if total == 0 {
            *cursor = 0;
            return;
        }
        *cursor = (*cursor + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.list_len();
        let cursor = self.cursor_mut();
        if total == 0 {
            *cursor = 0;
            return;
        }
        if *cursor == 0 {
            *cursor = total - 1;
        } else {
            *cursor -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.list_len();
        let cursor = self.cursor_mut();
        if total == 0 {
            *cursor = 0;
        } else if *cursor >= total {
            *cursor = total - 1;
        }
    }

    pub fn maybe_clear_export(&mut self, now: Instant) {
        self.export.clear_if_done_for(now, 8);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub message: String,
    pub failed: bool,
    pub last_updated: Option<Instant>,
}

impl ExportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&mut self, path: String, message: String, failed: bool, now: Instant) {
        self.active = true;
        self.done = true;
        self.path = Some(path);
        self.message = message;
        self.failed = failed;
        self.last_updated = Some(now);
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}
