use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use datafutebol::cache::DatasetCache;
use datafutebol::config::{DataSource, EngineConfig};
use datafutebol::dataset::Dataset;
use datafutebol::demo::{self, DemoSeason};
use datafutebol::export;
use datafutebol::percentile::PlayerKey;
use datafutebol::pitch::{self, HEATMAP_COLS, HEATMAP_ROWS, Heatmap, MapAction};
use datafutebol::rankings::{AggregationMode, Grouping, RankingFilter, RankingTable, RankingView, Stat};
use datafutebol::value::Value;

#[derive(Debug, clap::Parser)]
#[command(about = "Brasileirão event-log statistics")]
struct Args {
    /// Event log (.csv or .parquet); falls back to DATAFUTEBOL_DATA.
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Engine config (JSON); falls back to DATAFUTEBOL_CONFIG.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use the synthetic demo season.
    #[arg(long, global = true)]
    demo: bool,

    /// Print JSON instead of a text table.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct TableOpts {
    /// Aggregate by player or team.
    #[arg(short, long, default_value = "player", value_parser = parse_grouping)]
    group: Grouping,

    /// Divide counts by games played.
    #[arg(long)]
    per_game: bool,

    /// Only rows for this team.
    #[arg(short, long)]
    team: Option<String>,

    /// Minimum games played.
    #[arg(long, default_value_t = 0)]
    min_games: u32,

    /// Rows to print.
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
}

impl TableOpts {
    fn mode(&self) -> AggregationMode {
        if self.per_game {
            AggregationMode::PerGame
        } else {
            AggregationMode::Total
        }
    }

    fn filter(&self) -> RankingFilter {
        RankingFilter {
            team: self.team.clone(),
            min_games: self.min_games,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Season PPDA and Field Tilt per team.
    Teams,
    /// Per-match PPDA and Field Tilt.
    Matches {
        #[arg(short, long)]
        team: Option<String>,
    },
    /// Passing, attacking or defending table.
    Rankings {
        #[arg(short, long, default_value = "passing", value_parser = parse_view)]
        view: RankingView,
        #[command(flatten)]
        opts: TableOpts,
    },
    /// Single-statistic leaderboard.
    Leaderboard {
        /// Statistic key, e.g. `goals` or `pass_accuracy`.
        stat: Stat,
        #[command(flatten)]
        opts: TableOpts,
    },
    /// Percentile comparison of 2-4 players over 4-10 metrics.
    Compare {
        /// `Player@Team`, repeated.
        #[arg(short, long = "player", required = true, value_parser = parse_player_key)]
        players: Vec<PlayerKey>,
        /// Statistic key, repeated.
        #[arg(short, long = "stat", required = true)]
        stats: Vec<Stat>,
    },
    /// Player names matching a search.
    Players { query: Option<String> },
    /// A player's action locations or heatmap.
    Map {
        #[arg(short, long)]
        player: String,
        #[arg(short, long, default_value = "passes")]
        action: MapAction,
        #[arg(long)]
        heatmap: bool,
    },
    /// Write the .xlsx workbook.
    Export {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        per_game: bool,
    },
    /// Write the demo season as a CSV event log.
    DemoCsv {
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = demo::DEMO_SEED)]
        seed: u64,
    },
}

fn parse_view(s: &str) -> Result<RankingView> {
    match s.to_lowercase().as_str() {
        "passing" | "passe" => Ok(RankingView::Passing),
        "attacking" | "ataque" => Ok(RankingView::Attacking),
        "defending" | "defesa" => Ok(RankingView::Defending),
        _ => Err(anyhow!("unsupported view {s}")),
    }
}

fn parse_grouping(s: &str) -> Result<Grouping> {
    match s.to_lowercase().as_str() {
        "player" | "jogador" => Ok(Grouping::Player),
        "team" | "time" => Ok(Grouping::Team),
        _ => Err(anyhow!("unsupported grouping {s}")),
    }
}

fn parse_player_key(s: &str) -> Result<PlayerKey> {
    let (player, team) = s
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("expected Player@Team, got {s}"))?;
    Ok(PlayerKey::new(player.trim(), team.trim()))
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    debug!("args: {args:?}");
    let config = EngineConfig::resolve(args.config.as_deref()).context("loading engine config")?;

    if let Command::DemoCsv { out, seed } = &args.command {
        let season = DemoSeason {
            seed: *seed,
            ..DemoSeason::default()
        };
        let bytes = demo::to_csv(&season.events()).context("serializing demo season")?;
        std::fs::write(out, bytes).with_context(|| format!("writing {}", out.display()))?;
        info!("demo season written to {}", out.display());
        return Ok(());
    }

    let start_time = Instant::now();
    let dataset = load_dataset(&args, &config)?;
    debug!("dataset ready in {}ms", start_time.elapsed().as_millis());

    match &args.command {
        Command::Teams => {
            let season = dataset.season_stats();
            if args.json {
                return print_json(&season);
            }
            println!("{:<24}{:>4}{:>9}{:>6}{:>12}", "Time", "J", "PPDA", "∞", "Field Tilt");
            for team in season {
                println!(
                    "{:<24}{:>4}{:>9}{:>6}{:>11.2}%",
                    team.team,
                    team.matches,
                    format!("{:.2}", team.ppda),
                    team.ppda_unbounded_matches,
                    team.field_tilt
                );
            }
        }
        Command::Matches { team } => {
            let rows: Vec<_> = dataset
                .match_stats()
                .iter()
                .filter(|m| team.as_ref().is_none_or(|t| m.team == *t))
                .collect();
            if args.json {
                return print_json(&rows);
            }
            println!(
                "{:<10}{:<24}{:<24}{:>6}{:>6}{:>9}{:>10}",
                "Partida", "Time", "Adversário", "Ações", "Passes", "PPDA", "Tilt"
            );
            for m in rows {
                println!(
                    "{:<10}{:<24}{:<24}{:>6}{:>6}{:>9}{:>9.2}%",
                    m.match_id,
                    m.team,
                    m.opponent,
                    m.defensive_actions,
                    m.passes_allowed,
                    format!("{:.2}", m.ppda),
                    m.field_tilt
                );
            }
        }
        Command::Rankings { view, opts } => {
            let table = dataset.rankings(*view, opts.group, opts.mode(), &opts.filter());
            print_table(&table, opts.limit, args.json)?;
        }
        Command::Leaderboard { stat, opts } => {
            let table = dataset.leaderboard(*stat, opts.group, opts.mode(), &opts.filter());
            print_table(&table, opts.limit, args.json)?;
        }
        Command::Compare { players, stats } => {
            let entries = dataset.compare(players, stats)?;
            if args.json {
                return print_json(&entries);
            }
            for entry in entries {
                let pct = entry
                    .percentile
                    .map(|p| format!("{:>5.1}", p * 100.0))
                    .unwrap_or_else(|| "    -".to_string());
                println!(
                    "{:<24}{:<20}{:<30}{:>9} {pct} {}",
                    entry.player,
                    entry.team,
                    entry.stat.label(),
                    format!("{:.2}", entry.value),
                    bar(entry.percentile)
                );
            }
        }
        Command::Players { query } => {
            let search = pitch::search_players(dataset.events(), query.as_deref().unwrap_or(""));
            if search.fallback && query.is_some() {
                eprintln!("[INFO] no player matched; listing everyone");
            }
            if args.json {
                return print_json(&search.players);
            }
            for name in search.players {
                println!("{name}");
            }
        }
        Command::Map {
            player,
            action,
            heatmap,
        } => {
            let actions = pitch::player_actions(dataset.events(), player, *action);
            if actions.is_empty() {
                bail!("no {} found for {player}", action.label());
            }
            if *heatmap {
                let map = Heatmap::bin(&actions, HEATMAP_COLS, HEATMAP_ROWS);
                if args.json {
                    return print_json(&map);
                }
                print_heatmap(&map);
            } else {
                let marks = pitch::marks(&actions, *action);
                if args.json {
                    return print_json(&marks);
                }
                for mark in marks {
                    println!("{mark:?}");
                }
            }
        }
        Command::Export { out, per_game } => {
            let mode = if *per_game {
                AggregationMode::PerGame
            } else {
                AggregationMode::Total
            };
            let report = export::export_dataset_with_progress(&dataset, out, mode, |p| {
                eprintln!("[INFO] {}/{} {}", p.current, p.total, p.message);
            })?;
            println!(
                "Wrote {} ({} teams, {} matches, {} players)",
                out.display(),
                report.teams,
                report.matches,
                report.players
            );
        }
        Command::DemoCsv { .. } => {}
    }
    Ok(())
}

fn load_dataset(args: &Args, config: &EngineConfig) -> Result<Arc<Dataset>> {
    match DataSource::resolve(args.data.clone(), args.demo)? {
        DataSource::Demo => {
            info!("using demo season");
            Ok(Arc::new(DemoSeason::default().dataset(config)))
        }
        DataSource::File(path) => DatasetCache::global()
            .load(&path, config)
            .with_context(|| format!("loading {}", path.display())),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(table: &RankingTable, limit: usize, json: bool) -> Result<()> {
    if json {
        return print_json(table);
    }
    let mut header = format!("{:<26}{:<22}{:>4}", "Nome", "Time", "J");
    for stat in &table.columns {
        header.push_str(&format!("  {}", stat.label()));
    }
    println!("{header}");
    for row in table.rows.iter().take(limit) {
        let mut line = format!(
            "{:<26}{:<22}{:>4}",
            row.name(),
            if row.player.is_some() { row.team.as_str() } else { "" },
            row.games
        );
        for (stat, value) in table.columns.iter().zip(&row.values) {
            let width = stat.label().chars().count();
            line.push_str(&format!("  {:>width$}", cell(*value)));
        }
        println!("{line}");
    }
    Ok(())
}

fn cell(value: Value) -> String {
    match value {
        Value::Defined(v) if v.fract() == 0.0 => format!("{v:.0}"),
        other => format!("{other:.2}"),
    }
}

fn bar(percentile: Option<f64>) -> String {
    let filled = percentile.map_or(0, |p| (p * 20.0).round() as usize);
    format!("{}{}", "█".repeat(filled), "·".repeat(20 - filled.min(20)))
}

fn print_heatmap(map: &Heatmap) {
    const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
    let max = map.max().max(1) as usize;
    for row in (0..map.rows).rev() {
        let line: String = (0..map.cols)
            .map(|col| {
                let count = map.count(col, row) as usize;
                SHADES[(count * (SHADES.len() - 1)).div_ceil(max).min(SHADES.len() - 1)]
            })
            .collect();
        println!("|{line}|");
    }
    println!("{} actions, busiest cell {}", map.total(), map.max());
}
