use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::event::{Event, EventType, Flag};
use crate::value::{Value, round_to};

/// Number of raw (summed) statistics; they are the leading variants of [`Stat`].
pub const RAW_STATS: usize = 32;

/// Every column a ranking table can surface.
///
/// The first [`RAW_STATS`] variants are season totals summed straight from
/// the event log; the rest are derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    PassesAccurate,
    PassesInaccurate,
    KeyPasses,
    Assists,
    ProgressivePasses,
    FinalThirdPasses,
    BoxEntries,
    LastThirdEntries,
    CrossesAccurate,
    CrossesInaccurate,
    Corners,
    CornersAccurate,
    CornersInaccurate,
    OffsidePasses,
    Goals,
    Shots,
    ShotsOnTarget,
    BigChancesCreated,
    BigChancesScored,
    BigChancesMissed,
    DribblesWon,
    DribblesLost,
    Carries,
    XThreat,
    TacklesWon,
    TacklesLost,
    Interceptions,
    Clearances,
    BallRecoveries,
    AerialsWon,
    AerialsLost,
    Fouls,
    TotalPasses,
    PassAccuracy,
    CornerAccuracy,
    ShotConversion,
    ShotAccuracy,
    DribbleSuccess,
    TackleSuccess,
    AerialSuccess,
}

/// Where a raw statistic is counted from.
#[derive(Debug, Clone, PartialEq)]
enum Source {
    Flag(Flag),
    Type(EventType),
    /// Passes starting beyond the attacking-third line.
    FinalThirdPass,
    /// Passes carrying the progressive-action flag.
    ProgressivePass,
    XThreat,
}

impl Stat {
    pub const ALL: [Stat; 40] = [
        Stat::PassesAccurate,
        Stat::PassesInaccurate,
        Stat::KeyPasses,
        Stat::Assists,
        Stat::ProgressivePasses,
        Stat::FinalThirdPasses,
        Stat::BoxEntries,
        Stat::LastThirdEntries,
        Stat::CrossesAccurate,
        Stat::CrossesInaccurate,
        Stat::Corners,
        Stat::CornersAccurate,
        Stat::CornersInaccurate,
        Stat::OffsidePasses,
        Stat::Goals,
        Stat::Shots,
        Stat::ShotsOnTarget,
        Stat::BigChancesCreated,
        Stat::BigChancesScored,
        Stat::BigChancesMissed,
        Stat::DribblesWon,
        Stat::DribblesLost,
        Stat::Carries,
        Stat::XThreat,
        Stat::TacklesWon,
        Stat::TacklesLost,
        Stat::Interceptions,
        Stat::Clearances,
        Stat::BallRecoveries,
        Stat::AerialsWon,
        Stat::AerialsLost,
        Stat::Fouls,
        Stat::TotalPasses,
        Stat::PassAccuracy,
        Stat::CornerAccuracy,
        Stat::ShotConversion,
        Stat::ShotAccuracy,
        Stat::DribbleSuccess,
        Stat::TackleSuccess,
        Stat::AerialSuccess,
    ];

    pub fn is_raw(self) -> bool {
        (self as usize) < RAW_STATS
    }

    /// Percentage columns: never rescaled per game.
    pub fn is_rate(self) -> bool {
        self.rate_parts().is_some()
    }

    fn source(self) -> Option<Source> {
        let source = match self {
            Stat::PassesAccurate => Source::Flag(Flag::PassAccurate),
            Stat::PassesInaccurate => Source::Flag(Flag::PassInaccurate),
            Stat::KeyPasses => Source::Flag(Flag::KeyPass),
            Stat::Assists => Source::Flag(Flag::Assist),
            Stat::ProgressivePasses => Source::ProgressivePass,
            Stat::FinalThirdPasses => Source::FinalThirdPass,
            Stat::BoxEntries => Source::Flag(Flag::BoxEntry),
            Stat::LastThirdEntries => Source::Flag(Flag::LastThirdEntry),
            Stat::CrossesAccurate => Source::Flag(Flag::PassCrossAccurate),
            Stat::CrossesInaccurate => Source::Flag(Flag::PassCrossInaccurate),
            Stat::Corners => Source::Flag(Flag::PassCorner),
            Stat::CornersAccurate => Source::Flag(Flag::PassCornerAccurate),
            Stat::CornersInaccurate => Source::Flag(Flag::PassCornerInaccurate),
            Stat::OffsidePasses => Source::Type(EventType::OffsidePass),
            Stat::Goals => Source::Flag(Flag::IsGoal),
            Stat::Shots => Source::Flag(Flag::IsShot),
            Stat::ShotsOnTarget => Source::Flag(Flag::ShotOnTarget),
            Stat::BigChancesCreated => Source::Flag(Flag::BigChanceCreated),
            Stat::BigChancesScored => Source::Flag(Flag::BigChanceScored),
            Stat::BigChancesMissed => Source::Flag(Flag::BigChanceMissed),
            Stat::DribblesWon => Source::Flag(Flag::DribbleWon),
            Stat::DribblesLost => Source::Flag(Flag::DribbleLost),
            Stat::Carries => Source::Type(EventType::Carry),
            Stat::XThreat => Source::XThreat,
            Stat::TacklesWon => Source::Flag(Flag::TackleWon),
            Stat::TacklesLost => Source::Flag(Flag::TackleLost),
            Stat::Interceptions => Source::Type(EventType::Interception),
            Stat::Clearances => Source::Type(EventType::Clearance),
            Stat::BallRecoveries => Source::Type(EventType::BallRecovery),
            Stat::AerialsWon => Source::Flag(Flag::DuelAerialWon),
            Stat::AerialsLost => Source::Flag(Flag::DuelAerialLost),
            Stat::Fouls => Source::Type(EventType::Foul),
            _ => return None,
        };
        Some(source)
    }

    /// `(successes, failures-or-total, denominator includes successes)`.
    fn rate_parts(self) -> Option<(Stat, Stat, bool)> {
        match self {
            Stat::PassAccuracy => Some((Stat::PassesAccurate, Stat::PassesInaccurate, false)),
            Stat::CornerAccuracy => Some((Stat::CornersAccurate, Stat::CornersInaccurate, false)),
            Stat::ShotConversion => Some((Stat::Goals, Stat::Shots, true)),
            Stat::ShotAccuracy => Some((Stat::ShotsOnTarget, Stat::Shots, true)),
            Stat::DribbleSuccess => Some((Stat::DribblesWon, Stat::DribblesLost, false)),
            Stat::TackleSuccess => Some((Stat::TacklesWon, Stat::TacklesLost, false)),
            Stat::AerialSuccess => Some((Stat::AerialsWon, Stat::AerialsLost, false)),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stat::PassesAccurate => "Passes certos",
            Stat::PassesInaccurate => "Passes errados",
            Stat::KeyPasses => "Passes-chave",
            Stat::Assists => "Assistências",
            Stat::ProgressivePasses => "Passes progressivos",
            Stat::FinalThirdPasses => "Passes no terço final",
            Stat::BoxEntries => "Entradas na área",
            Stat::LastThirdEntries => "Entradas no último terço",
            Stat::CrossesAccurate => "Cruzamentos precisos",
            Stat::CrossesInaccurate => "Cruzamentos imprecisos",
            Stat::Corners => "Escanteios",
            Stat::CornersAccurate => "Escanteios certos",
            Stat::CornersInaccurate => "Escanteios errados",
            Stat::OffsidePasses => "Passes em impedimento",
            Stat::Goals => "Gols",
            Stat::Shots => "Finalizações",
            Stat::ShotsOnTarget => "Finalizações no alvo",
            Stat::BigChancesCreated => "Grandes chances criadas",
            Stat::BigChancesScored => "Grandes chances convertidas",
            Stat::BigChancesMissed => "Grandes chances perdidas",
            Stat::DribblesWon => "Dribles certos",
            Stat::DribblesLost => "Dribles errados",
            Stat::Carries => "Conduções",
            Stat::XThreat => "xThreat",
            Stat::TacklesWon => "Desarmes certos",
            Stat::TacklesLost => "Desarmes errados",
            Stat::Interceptions => "Interceptações",
            Stat::Clearances => "Cortes",
            Stat::BallRecoveries => "Recuperações de bola",
            Stat::AerialsWon => "Duelos aéreos ganhos",
            Stat::AerialsLost => "Duelos aéreos perdidos",
            Stat::Fouls => "Faltas",
            Stat::TotalPasses => "Passes Totais",
            Stat::PassAccuracy => "Aproveitamento (%)",
            Stat::CornerAccuracy => "Escanteios certos (%)",
            Stat::ShotConversion => "Conversão (%)",
            Stat::ShotAccuracy => "Finalizações no alvo (%)",
            Stat::DribbleSuccess => "Dribles certos (%)",
            Stat::TackleSuccess => "Desarmes certos (%)",
            Stat::AerialSuccess => "Duelos aéreos ganhos (%)",
        }
    }

    /// Machine name, as used on the command line and in JSON.
    pub fn key(self) -> &'static str {
        match self {
            Stat::PassesAccurate => "passes_accurate",
            Stat::PassesInaccurate => "passes_inaccurate",
            Stat::KeyPasses => "key_passes",
            Stat::Assists => "assists",
            Stat::ProgressivePasses => "progressive_passes",
            Stat::FinalThirdPasses => "final_third_passes",
            Stat::BoxEntries => "box_entries",
            Stat::LastThirdEntries => "last_third_entries",
            Stat::CrossesAccurate => "crosses_accurate",
            Stat::CrossesInaccurate => "crosses_inaccurate",
            Stat::Corners => "corners",
            Stat::CornersAccurate => "corners_accurate",
            Stat::CornersInaccurate => "corners_inaccurate",
            Stat::OffsidePasses => "offside_passes",
            Stat::Goals => "goals",
            Stat::Shots => "shots",
            Stat::ShotsOnTarget => "shots_on_target",
            Stat::BigChancesCreated => "big_chances_created",
            Stat::BigChancesScored => "big_chances_scored",
            Stat::BigChancesMissed => "big_chances_missed",
            Stat::DribblesWon => "dribbles_won",
            Stat::DribblesLost => "dribbles_lost",
            Stat::Carries => "carries",
            Stat::XThreat => "x_threat",
            Stat::TacklesWon => "tackles_won",
            Stat::TacklesLost => "tackles_lost",
            Stat::Interceptions => "interceptions",
            Stat::Clearances => "clearances",
            Stat::BallRecoveries => "ball_recoveries",
            Stat::AerialsWon => "aerials_won",
            Stat::AerialsLost => "aerials_lost",
            Stat::Fouls => "fouls",
            Stat::TotalPasses => "total_passes",
            Stat::PassAccuracy => "pass_accuracy",
            Stat::CornerAccuracy => "corner_accuracy",
            Stat::ShotConversion => "shot_conversion",
            Stat::ShotAccuracy => "shot_accuracy",
            Stat::DribbleSuccess => "dribble_success",
            Stat::TackleSuccess => "tackle_success",
            Stat::AerialSuccess => "aerial_success",
        }
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim();
        Stat::ALL
            .into_iter()
            .find(|s| s.key().eq_ignore_ascii_case(needle) || s.label() == needle)
            .ok_or_else(|| format!("unknown statistic {needle:?}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    Player,
    Team,
}

impl Grouping {
    pub fn label(self) -> &'static str {
        match self {
            Grouping::Player => "Jogadores",
            Grouping::Team => "Times",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    Total,
    PerGame,
}

impl AggregationMode {
    pub fn label(self) -> &'static str {
        match self {
            AggregationMode::Total => "Total",
            AggregationMode::PerGame => "Por jogo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingView {
    Passing,
    Attacking,
    Defending,
}

impl RankingView {
    pub const ALL: [RankingView; 3] = [
        RankingView::Passing,
        RankingView::Attacking,
        RankingView::Defending,
    ];

    /// Surfaced columns; the first one is the default sort key.
    pub fn columns(self) -> &'static [Stat] {
        match self {
            RankingView::Passing => &[
                Stat::TotalPasses,
                Stat::PassesAccurate,
                Stat::PassesInaccurate,
                Stat::PassAccuracy,
                Stat::KeyPasses,
                Stat::Assists,
                Stat::ProgressivePasses,
                Stat::FinalThirdPasses,
                Stat::BoxEntries,
                Stat::LastThirdEntries,
                Stat::CrossesAccurate,
                Stat::CrossesInaccurate,
                Stat::Corners,
                Stat::CornerAccuracy,
                Stat::OffsidePasses,
            ],
            RankingView::Attacking => &[
                Stat::Goals,
                Stat::Shots,
                Stat::ShotsOnTarget,
                Stat::ShotAccuracy,
                Stat::ShotConversion,
                Stat::XThreat,
                Stat::BigChancesCreated,
                Stat::BigChancesScored,
                Stat::BigChancesMissed,
                Stat::DribblesWon,
                Stat::DribblesLost,
                Stat::DribbleSuccess,
                Stat::Carries,
            ],
            RankingView::Defending => &[
                Stat::TacklesWon,
                Stat::TacklesLost,
                Stat::TackleSuccess,
                Stat::Interceptions,
                Stat::Clearances,
                Stat::BallRecoveries,
                Stat::AerialsWon,
                Stat::AerialsLost,
                Stat::AerialSuccess,
                Stat::Fouls,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankingView::Passing => "Passe",
            RankingView::Attacking => "Ataque",
            RankingView::Defending => "Defesa",
        }
    }
}

/// Season totals for one player (or one team).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub player: Option<String>,
    pub team: String,
    /// Distinct matches the group has events in.
    pub games: u32,
    totals: [f64; RAW_STATS],
}

impl AggregatedRow {
    pub fn new(player: Option<String>, team: String, games: u32) -> Self {
        Self {
            player,
            team,
            games,
            totals: [0.0; RAW_STATS],
        }
    }

    /// Display name: the player, or the team for team rows.
    pub fn name(&self) -> &str {
        self.player.as_deref().unwrap_or(&self.team)
    }

    /// Season total of a raw statistic; `None` for derived ones.
    pub fn total(&self, stat: Stat) -> Option<f64> {
        stat.is_raw().then(|| self.totals[stat as usize])
    }

    pub fn set_total(&mut self, stat: Stat, value: f64) {
        if stat.is_raw() {
            self.totals[stat as usize] = value;
        }
    }

    pub fn value(&self, stat: Stat, mode: AggregationMode) -> Value {
        if let Some(total) = self.total(stat) {
            return match mode {
                AggregationMode::Total => Value::Defined(total),
                AggregationMode::PerGame => {
                    Value::rate(total, f64::from(self.games), 1.0).round(2)
                }
            };
        }
        if stat == Stat::TotalPasses {
            let sum = self.totals[Stat::PassesAccurate as usize]
                + self.totals[Stat::PassesInaccurate as usize];
            return match mode {
                AggregationMode::Total => Value::Defined(sum),
                AggregationMode::PerGame => Value::rate(sum, f64::from(self.games), 1.0).round(2),
            };
        }
        match stat.rate_parts() {
            Some((num, other, other_is_total)) => {
                let n = self.totals[num as usize];
                let o = self.totals[other as usize];
                let den = if other_is_total { o } else { n + o };
                Value::rate(n, den, 100.0).round(1)
            }
            None => Value::Undefined,
        }
    }
}

/// Groups the event log and sums every raw statistic.
///
/// Rows whose grouping key has no player (player grouping) or no resolved
/// team are dropped. Output is sorted by team, then player.
pub fn aggregate(events: &[Event], grouping: Grouping, config: &EngineConfig) -> Vec<AggregatedRow> {
    let sources: Vec<(usize, Source)> = Stat::ALL
        .into_iter()
        .filter_map(|s| s.source().map(|src| (s as usize, src)))
        .collect();

    let mut index: HashMap<(Option<&str>, &str), usize> = HashMap::new();
    let mut rows: Vec<(AggregatedRow, HashSet<u64>)> = Vec::new();

    for event in events {
        let Some(team) = event.team_name.as_deref() else {
            continue;
        };
        let player = match grouping {
            Grouping::Player => match event.player_name.as_deref() {
                Some(p) => Some(p),
                None => continue,
            },
            Grouping::Team => None,
        };

        let slot = *index.entry((player, team)).or_insert_with(|| {
            rows.push((
                AggregatedRow::new(player.map(str::to_string), team.to_string(), 0),
                HashSet::new(),
            ));
            rows.len() - 1
        });
        let (row, matches) = &mut rows[slot];
        matches.insert(event.match_id);

        for (idx, source) in &sources {
            row.totals[*idx] += contribution(event, source, config);
        }
    }

    let mut out: Vec<AggregatedRow> = rows
        .into_iter()
        .map(|(mut row, matches)| {
            row.games = matches.len() as u32;
            row
        })
        .collect();
    out.sort_by(|a, b| a.team.cmp(&b.team).then_with(|| a.player.cmp(&b.player)));
    out
}

fn contribution(event: &Event, source: &Source, config: &EngineConfig) -> f64 {
    let hit = match source {
        Source::Flag(flag) => event.has(*flag),
        Source::Type(kind) => event.event_type == *kind,
        Source::FinalThirdPass => {
            event.event_type == EventType::Pass && event.x_above(config.attacking_third_x)
        }
        Source::ProgressivePass => {
            event.event_type == EventType::Pass && event.has(Flag::ProgressiveAction)
        }
        Source::XThreat => return event.x_threat,
    };
    if hit { 1.0 } else { 0.0 }
}

/// Post-aggregation row filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingFilter {
    pub team: Option<String>,
    pub min_games: u32,
}

impl RankingFilter {
    pub fn accepts(&self, row: &AggregatedRow) -> bool {
        if row.games < self.min_games {
            return false;
        }
        match &self.team {
            Some(team) => row.team == *team,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub player: Option<String>,
    pub team: String,
    pub games: u32,
    pub values: Vec<Value>,
}

impl RankingRow {
    pub fn name(&self) -> &str {
        self.player.as_deref().unwrap_or(&self.team)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingTable {
    pub columns: Vec<Stat>,
    pub mode: AggregationMode,
    pub rows: Vec<RankingRow>,
}

impl RankingTable {
    pub fn for_view(
        rows: &[AggregatedRow],
        view: RankingView,
        mode: AggregationMode,
        filter: &RankingFilter,
    ) -> Self {
        Self::for_stats(rows, view.columns(), mode, filter)
    }

    /// Table over arbitrary columns, sorted by the first one.
    pub fn for_stats(
        rows: &[AggregatedRow],
        columns: &[Stat],
        mode: AggregationMode,
        filter: &RankingFilter,
    ) -> Self {
        let out_rows = rows
            .iter()
            .filter(|row| filter.accepts(row))
            .map(|row| RankingRow {
                player: row.player.clone(),
                team: row.team.clone(),
                games: row.games,
                values: columns.iter().map(|s| row.value(*s, mode)).collect(),
            })
            .collect();
        let mut table = Self {
            columns: columns.to_vec(),
            mode,
            rows: out_rows,
        };
        if let Some(first) = columns.first() {
            table.sort_by(*first);
        }
        table
    }

    pub fn column_index(&self, stat: Stat) -> Option<usize> {
        self.columns.iter().position(|s| *s == stat)
    }

    /// Descending by `stat`, undefined values last, ties by name.
    pub fn sort_by(&mut self, stat: Stat) {
        let Some(idx) = self.column_index(stat) else {
            return;
        };
        self.rows.sort_by(|a, b| {
            a.values[idx]
                .cmp_desc(b.values[idx])
                .then_with(|| a.name().cmp(b.name()))
                .then_with(|| a.team.cmp(&b.team))
        });
    }

    pub fn value(&self, row: usize, stat: Stat) -> Option<Value> {
        let idx = self.column_index(stat)?;
        self.rows.get(row).map(|r| r.values[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_stats_lead_the_enum() {
        let raw: Vec<Stat> = Stat::ALL.into_iter().filter(|s| s.is_raw()).collect();
        assert_eq!(raw.len(), RAW_STATS);
        assert!(raw.iter().all(|s| s.source().is_some()));
        assert!(
            Stat::ALL
                .into_iter()
                .filter(|s| !s.is_raw())
                .all(|s| s.source().is_none())
        );
    }

    #[test]
    fn stat_names_parse() {
        assert_eq!("pass_accuracy".parse::<Stat>().unwrap(), Stat::PassAccuracy);
        assert_eq!("Passes Totais".parse::<Stat>().unwrap(), Stat::TotalPasses);
        assert!("nope".parse::<Stat>().is_err());
    }

    #[test]
    fn shot_rates_use_shots_as_denominator() {
        let mut row = AggregatedRow::new(Some("P".into()), "T".into(), 2);
        row.set_total(Stat::Goals, 1.0);
        row.set_total(Stat::Shots, 3.0);
        row.set_total(Stat::ShotsOnTarget, 2.0);
        assert_eq!(row.value(Stat::ShotConversion, AggregationMode::Total), Value::Defined(33.3));
        assert_eq!(row.value(Stat::ShotAccuracy, AggregationMode::Total), Value::Defined(66.7));
        assert_eq!(row.value(Stat::DribbleSuccess, AggregationMode::Total), Value::Undefined);
    }

    #[test]
    fn filter_by_team_and_games() {
        let row = AggregatedRow::new(Some("P".into()), "Bahia".into(), 3);
        let mut filter = RankingFilter::default();
        assert!(filter.accepts(&row));
        filter.min_games = 4;
        assert!(!filter.accepts(&row));
        filter.min_games = 3;
        filter.team = Some("Santos".into());
        assert!(!filter.accepts(&row));
        filter.team = Some("Bahia".into());
        assert!(filter.accepts(&row));
    }
}
