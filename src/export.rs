use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::dataset::Dataset;
use crate::rankings::{AggregationMode, Grouping, RankingFilter, RankingTable, RankingView};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub teams: usize,
    pub matches: usize,
    pub players: usize,
    pub generated_at: String,
}

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<u32> for Cell {
    fn from(v: u32) -> Self {
        Cell::Number(f64::from(v))
    }
}

impl From<Value> for Cell {
    fn from(v: Value) -> Self {
        match v {
            Value::Defined(x) => Cell::Number(x),
            other => Cell::Text(other.to_string()),
        }
    }
}

struct Sheet {
    name: &'static str,
    rows: Vec<Vec<Cell>>,
}

pub fn export_dataset(dataset: &Dataset, path: &Path, mode: AggregationMode) -> Result<ExportReport> {
    export_dataset_with_progress(dataset, path, mode, |_| {})
}

/// Writes team, match and player-ranking sheets to an `.xlsx` workbook.
pub fn export_dataset_with_progress(
    dataset: &Dataset,
    path: &Path,
    mode: AggregationMode,
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport> {
    let total = 2 + RankingView::ALL.len();
    let mut current = 0usize;
    let mut step = |message: String| {
        current += 1;
        on_progress(ExportProgress {
            current,
            total,
            message,
        });
    };

    let season = dataset.season_stats();
    let mut teams_rows: Vec<Vec<Cell>> = vec![
        ["Time", "Jogos", "PPDA", "Jogos sem ação defensiva", "Field Tilt (%)"]
            .map(Cell::from)
            .to_vec(),
    ];
    for team in &season {
        teams_rows.push(vec![
            team.team.as_str().into(),
            team.matches.into(),
            team.ppda.round(2).into(),
            team.ppda_unbounded_matches.into(),
            round2(team.field_tilt).into(),
        ]);
    }
    step("Times".to_string());

    let matches = dataset.match_stats();
    let mut match_rows: Vec<Vec<Cell>> = vec![
        [
            "Partida",
            "Time",
            "Adversário",
            "Ações defensivas",
            "Passes permitidos",
            "PPDA",
            "Passes no terço final",
            "Field Tilt (%)",
        ]
        .map(Cell::from)
        .to_vec(),
    ];
    for row in matches {
        match_rows.push(vec![
            row.match_id.to_string().into(),
            row.team.as_str().into(),
            row.opponent.as_str().into(),
            row.defensive_actions.into(),
            row.passes_allowed.into(),
            row.ppda.into(),
            row.attacking_passes.into(),
            row.field_tilt.into(),
        ]);
    }
    step("Partidas".to_string());

    let mut sheets = vec![
        Sheet {
            name: "Times",
            rows: teams_rows,
        },
        Sheet {
            name: "Partidas",
            rows: match_rows,
        },
    ];
    let mut players = 0usize;
    for view in RankingView::ALL {
        let table = dataset.rankings(view, Grouping::Player, mode, &RankingFilter::default());
        players = players.max(table.rows.len());
        sheets.push(Sheet {
            name: view.label(),
            rows: ranking_rows(&table),
        });
        step(view.label().to_string());
    }

    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    sheets.push(Sheet {
        name: "Sobre",
        rows: vec![
            vec!["Gerado em".into(), generated_at.clone().into()],
            vec!["Modo".into(), mode.label().into()],
            vec![
                "Fonte".into(),
                dataset
                    .source()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "demo".to_string())
                    .into(),
            ],
            vec!["Chave".into(), dataset.key().to_string().into()],
        ],
    });

    let mut workbook = Workbook::new();
    for sheet in &sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name)
            .with_context(|| format!("invalid sheet name {}", sheet.name))?;
        write_rows(worksheet, sheet.name, &sheet.rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    let report = ExportReport {
        teams: season.len(),
        matches: matches.len() / 2,
        players,
        generated_at,
    };
    info!(
        path = %path.display(),
        teams = report.teams,
        matches = report.matches,
        players = report.players,
        "workbook exported"
    );
    Ok(report)
}

fn ranking_rows(table: &RankingTable) -> Vec<Vec<Cell>> {
    let mut header: Vec<Cell> = vec!["Jogador".into(), "Time".into(), "Jogos".into()];
    header.extend(table.columns.iter().map(|s| Cell::from(s.label())));

    let mut rows = vec![header];
    for row in &table.rows {
        let mut out: Vec<Cell> = vec![
            row.player.clone().unwrap_or_default().into(),
            row.team.as_str().into(),
            row.games.into(),
        ];
        out.extend(row.values.iter().map(|v| Cell::from(*v)));
        rows.push(out);
    }
    rows
}

fn round2(v: f64) -> f64 {
    crate::value::round_to(v, 2)
}

fn write_rows(worksheet: &mut Worksheet, sheet: &str, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match value {
                Cell::Text(text) => worksheet.write_string(r, c, text).map(|_| ()),
                Cell::Number(n) => worksheet.write_number(r, c, *n).map(|_| ()),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx}) on {sheet}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_values_become_text_cells() {
        assert_eq!(Cell::from(Value::Defined(1.5)), Cell::Number(1.5));
        assert_eq!(Cell::from(Value::Unbounded), Cell::Text("∞".to_string()));
        assert_eq!(Cell::from(Value::Undefined), Cell::Text("-".to_string()));
    }
}
