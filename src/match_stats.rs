use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{EngineConfig, UnboundedPpdaPolicy};
use crate::event::{Event, EventType};
use crate::value::{Value, round_to};

/// Pressing and territory figures for one team in one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMatchStats {
    pub match_id: u64,
    pub team: String,
    pub opponent: String,
    /// Team's defensive actions beyond the pressing line.
    pub defensive_actions: u32,
    /// Opponent's completed passes behind the build-up line.
    pub passes_allowed: u32,
    pub attacking_passes: u32,
    pub opponent_attacking_passes: u32,
    pub ppda: Value,
    /// Share of the match's attacking-third passes, in percent.
    pub field_tilt: f64,
}

/// Season means of the per-match figures for one team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonStats {
    pub team: String,
    pub matches: u32,
    pub ppda: Value,
    /// Matches whose PPDA was unbounded.
    pub ppda_unbounded_matches: u32,
    pub field_tilt: f64,
}

/// Computes PPDA and Field Tilt for both sides of every two-team match.
///
/// Records come out in match first-appearance order, and within a match in
/// team first-appearance order. Matches that don't have exactly two named
/// teams produce nothing.
pub fn compute_match_stats(events: &[Event], config: &EngineConfig) -> Vec<TeamMatchStats> {
    let mut order: Vec<u64> = Vec::new();
    let mut by_match: HashMap<u64, Vec<&Event>> = HashMap::new();
    for event in events {
        by_match
            .entry(event.match_id)
            .or_insert_with(|| {
                order.push(event.match_id);
                Vec::new()
            })
            .push(event);
    }

    order
        .par_iter()
        .map(|match_id| {
            let rows = &by_match[match_id];
            let teams = distinct_teams(rows);
            match teams.as_slice() {
                [a, b] => vec![
                    team_match_stats(*match_id, rows, a, b, config),
                    team_match_stats(*match_id, rows, b, a, config),
                ],
                [] | [_] => {
                    debug!(match_id, teams = teams.len(), "match skipped: fewer than two teams");
                    Vec::new()
                }
                _ => {
                    warn!(match_id, teams = ?teams, "match skipped: more than two teams");
                    Vec::new()
                }
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

fn distinct_teams<'a>(rows: &[&'a Event]) -> Vec<&'a str> {
    let mut teams: Vec<&str> = Vec::with_capacity(2);
    for name in rows.iter().filter_map(|e| e.team_name.as_deref()) {
        if !teams.contains(&name) {
            teams.push(name);
        }
    }
    teams
}

fn team_match_stats(
    match_id: u64,
    rows: &[&Event],
    team: &str,
    opponent: &str,
    config: &EngineConfig,
) -> TeamMatchStats {
    let count = |pred: &dyn Fn(&Event) -> bool| rows.iter().filter(|e| pred(**e)).count() as u32;

    let defensive_actions = count(&|e| {
        e.is_team(team)
            && e.x_above(config.pressing_line_x)
            && config.is_defensive_action(&e.event_type)
    });
    let passes_allowed = count(&|e| {
        e.is_team(opponent)
            && e.x_below(config.build_up_line_x)
            && e.event_type == EventType::Pass
            && e.is_successful()
    });
    let attacking_passes = count(&|e| {
        e.is_team(team) && e.x_above(config.attacking_third_x) && e.event_type == EventType::Pass
    });
    let opponent_attacking_passes = count(&|e| {
        e.is_team(opponent)
            && e.x_above(config.attacking_third_x)
            && e.event_type == EventType::Pass
    });

    let ppda = Value::unbounded_ratio(passes_allowed as f64, defensive_actions as f64).round(2);
    let attacking_total = attacking_passes + opponent_attacking_passes;
    let field_tilt = if attacking_total > 0 {
        round_to(attacking_passes as f64 / attacking_total as f64 * 100.0, 2)
    } else {
        0.0
    };

    TeamMatchStats {
        match_id,
        team: team.to_string(),
        opponent: opponent.to_string(),
        defensive_actions,
        passes_allowed,
        attacking_passes,
        opponent_attacking_passes,
        ppda,
        field_tilt,
    }
}

/// Unweighted per-team means over every match the team appears in.
pub fn season_averages(
    stats: &[TeamMatchStats],
    policy: UnboundedPpdaPolicy,
) -> Vec<TeamSeasonStats> {
    #[derive(Default)]
    struct Acc {
        matches: u32,
        ppda_sum: f64,
        ppda_n: u32,
        unbounded: u32,
        tilt_sum: f64,
    }

    let mut acc: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in stats {
        let entry = acc.entry(row.team.as_str()).or_default();
        entry.matches += 1;
        entry.tilt_sum += row.field_tilt;
        match row.ppda {
            Value::Defined(v) => {
                entry.ppda_sum += v;
                entry.ppda_n += 1;
            }
            Value::Unbounded => entry.unbounded += 1,
            Value::Undefined => {}
        }
    }

    acc.into_iter()
        .map(|(team, a)| {
            let ppda = match policy {
                UnboundedPpdaPolicy::Propagate if a.unbounded > 0 => Value::Unbounded,
                _ if a.ppda_n == 0 && a.unbounded > 0 => Value::Unbounded,
                _ => Value::rate(a.ppda_sum, a.ppda_n as f64, 1.0),
            };
            TeamSeasonStats {
                team: team.to_string(),
                matches: a.matches,
                ppda,
                ppda_unbounded_matches: a.unbounded,
                field_tilt: a.tilt_sum / a.matches as f64,
            }
        })
        .collect()
}
