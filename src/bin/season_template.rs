use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};

use liga_playoffs::config::app_data_dir;
use liga_playoffs::season::build_season_template;
use liga_playoffs::store::JsonFileStore;

// season_template [--teams=<file>|--count=<n>] [--start=YYYY-MM-DD] [--out=<season.json>]
fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let teams = match arg_value(&args, "--teams") {
        Some(path) => read_teams(&PathBuf::from(path))?,
        None => {
            let count = arg_value(&args, "--count")
                .map(|raw| raw.parse::<usize>().context("--count must be a number"))
                .transpose()?
                .unwrap_or(18);
            (1..=count).map(|i| format!("Club {i:02}")).collect()
        }
    };
    let start = match arg_value(&args, "--start") {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("bad --start date {raw}"))?,
        None => Local::now().date_naive(),
    };
    let out = arg_value(&args, "--out")
        .map(PathBuf::from)
        .or_else(|| app_data_dir().map(|dir| dir.join("season.json")))
        .ok_or_else(|| anyhow!("unable to resolve output path, pass --out"))?;

    let season = build_season_template(&teams, |team| format!("Estadio {team}"), start)?;
    JsonFileStore::new(&out).save(&season)?;

    println!("Season template written");
    println!("File: {}", out.display());
    println!("Teams: {}", season.teams.len());
    println!("Fixtures: {}", season.matches.len());
    Ok(())
}

fn read_teams(path: &PathBuf) -> Result<Vec<String>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let teams: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    if teams.len() < 2 {
        return Err(anyhow!("{} lists fewer than two teams", path.display()));
    }
    Ok(teams)
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
