use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::bracket_layout::BRACKET;
use crate::model::{Match, TableEntry};
use crate::zones::Zone;

pub struct ExportReport {
    pub standings: usize,
    pub playoff_fixtures: usize,
}

/// Write the table and the playoff fixtures to an `.xlsx` workbook.
pub fn export_standings(
    path: &Path,
    table: &[TableEntry],
    zones: &[Option<Zone>],
    matches: &[Match],
) -> Result<ExportReport> {
    let mut standings_rows = vec![
        [
            "Pos", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "Zone", "Out",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>(),
    ];
    for (idx, row) in table.iter().enumerate() {
        standings_rows.push(standings_row(idx, row, zones.get(idx).copied().flatten()));
    }

    let mut playoff_rows = vec![
        ["Fixture", "Round", "Home", "Away", "Score", "Venue", "Date", "Time"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    ];
    for id_match in BRACKET.fixture_ids() {
        let Some(m) = matches.iter().find(|m| m.id_match == id_match) else {
            continue;
        };
        playoff_rows.push(playoff_row(m));
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Standings")?;
        write_rows(sheet, &standings_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Playoffs")?;
        write_rows(sheet, &playoff_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        standings: standings_rows.len().saturating_sub(1),
        playoff_fixtures: playoff_rows.len().saturating_sub(1),
    })
}

fn standings_row(idx: usize, row: &TableEntry, zone: Option<Zone>) -> Vec<String> {
    vec![
        (idx + 1).to_string(),
        row.equipo.clone(),
        row.jj.to_string(),
        row.jg.to_string(),
        row.je.to_string(),
        row.jp.to_string(),
        row.gf.to_string(),
        row.gc.to_string(),
        row.dg.to_string(),
        row.pts.to_string(),
        zone.map(|z| z.label().to_string()).unwrap_or_default(),
        if row.eliminado { "yes" } else { "" }.to_string(),
    ]
}

fn playoff_row(m: &Match) -> Vec<String> {
    let score = match (m.score(), m.shootout()) {
        (Some((l, v)), Some((pl, pv))) => format!("{l}-{v} ({pl}-{pv} pen)"),
        (Some((l, v)), None) => format!("{l}-{v}"),
        _ => String::new(),
    };
    vec![
        m.id_match.to_string(),
        BRACKET.fixture_label(m.id_match).unwrap_or_default(),
        m.local.clone(),
        m.visitante.clone(),
        score,
        m.estadio.clone(),
        m.fecha.clone(),
        m.hora.clone(),
    ]
}

fn write_rows(sheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            // Keep numbers numeric so the sheet sorts properly.
            let written = match value.parse::<f64>() {
                Ok(n) => sheet.write_number(r as u32, c as u16, n),
                Err(_) => sheet.write_string(r as u32, c as u16, value),
            };
            written.with_context(|| format!("write cell ({r},{c})"))?;
        }
    }
    Ok(())
}
