use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;

use liga_playoffs::bracket_layout::BRACKET;
use liga_playoffs::config::{LeagueConfig, StoreKind};
use liga_playoffs::demo;
use liga_playoffs::engine::{LeagueEngine, Refresh};
use liga_playoffs::export::export_standings;
use liga_playoffs::model::{Match, Season, TableEntry};
use liga_playoffs::season::build_season_template;
use liga_playoffs::standings::calculate_table;
use liga_playoffs::store::{JsonFileStore, MatchStore, MemoryStore, SqliteStore};
use liga_playoffs::zones::{Zone, classify_zones};

const USAGE: &str = "usage: liga_playoffs <table|bracket|upcoming|export|import|demo> [args]

  table [season.json]            standings with live zones
  bracket [season.json]          project the playoffs and write the assignments
  upcoming [season.json]         unplayed fixtures by kickoff
  export <out.xlsx> [season.json]
  import <season.json>           load a season file into the sqlite store
  demo [seed]                    simulate a full 18-team season in memory";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = LeagueConfig::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = args.first() else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    let rest = &args[1..];

    match cmd.as_str() {
        "table" => cmd_table(&cfg, rest.first()),
        "bracket" => cmd_bracket(&cfg, rest.first()),
        "upcoming" => cmd_upcoming(&cfg, rest.first()),
        "export" => {
            let out = rest
                .first()
                .ok_or_else(|| anyhow!("export needs an output path"))?;
            cmd_export(&cfg, Path::new(out), rest.get(1))
        }
        "import" => {
            let src = rest
                .first()
                .ok_or_else(|| anyhow!("import needs a season file"))?;
            cmd_import(&cfg, Path::new(src))
        }
        "demo" => {
            let seed = rest
                .first()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(2026);
            cmd_demo(&cfg, seed)
        }
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command '{other}'\n{USAGE}")),
    }
}

fn open_store(cfg: &LeagueConfig, explicit: Option<&String>) -> Result<Box<dyn MatchStore>> {
    if let Some(path) = explicit {
        return Ok(Box::new(JsonFileStore::new(path)));
    }
    let path = cfg
        .store_path
        .clone()
        .ok_or_else(|| anyhow!("no season path given and LIGA_STORE_PATH is unset"))?;
    Ok(match cfg.store {
        StoreKind::Json => Box::new(JsonFileStore::new(path)),
        StoreKind::Sqlite => Box::new(SqliteStore::open(&sqlite_path(path))?),
    })
}

fn sqlite_path(path: PathBuf) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "json") {
        path.with_extension("db")
    } else {
        path
    }
}

fn cmd_table(cfg: &LeagueConfig, path: Option<&String>) -> Result<()> {
    let season = open_store(cfg, path)?.load()?;
    let table = calculate_table(&season.teams, &season.matches, &cfg.season);
    let zones = classify_zones(&table, cfg.season.regular_season_rounds);
    print_table(&table, &zones);
    Ok(())
}

fn cmd_bracket(cfg: &LeagueConfig, path: Option<&String>) -> Result<()> {
    let store = open_store(cfg, path)?;
    let mut engine = LeagueEngine::new(store, cfg.season, cfg.bracket);
    let refresh = engine.refresh_from_store()?;
    print_refresh(&refresh);
    let season = engine.store().load()?;
    print_playoffs(&season.matches);
    Ok(())
}

fn cmd_upcoming(cfg: &LeagueConfig, path: Option<&String>) -> Result<()> {
    let season = open_store(cfg, path)?.load()?;
    let mut pending: Vec<&Match> = season
        .matches
        .iter()
        .filter(|m| !m.is_final() && !m.local.is_empty())
        .collect();
    pending.sort_by_key(|m| (m.kickoff(), m.id_match));
    for m in pending {
        let when = m
            .kickoff()
            .map(|k| k.format("%a %d %b %H:%M").to_string())
            .unwrap_or_else(|| "TBD".to_string());
        println!(
            "{when:<18} J{:<3} {:>22} vs {:<22} {}",
            m.jornada, m.local, m.visitante, m.estadio
        );
    }
    Ok(())
}

fn cmd_export(cfg: &LeagueConfig, out: &Path, path: Option<&String>) -> Result<()> {
    let season = open_store(cfg, path)?.load()?;
    // Project the bracket in memory so the export shows current pairings without writing back.
    let mut engine = LeagueEngine::new(MemoryStore::new(season.clone()), cfg.season, cfg.bracket);
    let refresh = engine.refresh(&season.teams, &season.matches)?;
    let projected = engine.into_store().season;
    let report = export_standings(out, &refresh.table, &refresh.zones, &projected.matches)?;
    println!(
        "Exported {} standings rows and {} playoff fixtures to {}",
        report.standings,
        report.playoff_fixtures,
        out.display()
    );
    Ok(())
}

fn cmd_import(cfg: &LeagueConfig, src: &Path) -> Result<()> {
    let season = JsonFileStore::new(src).load()?;
    let path = cfg
        .store_path
        .clone()
        .map(sqlite_path)
        .ok_or_else(|| anyhow!("LIGA_STORE_PATH is unset"))?;
    let mut store = SqliteStore::open(&path)?;
    store.import(&season)?;
    println!(
        "Imported {} teams and {} fixtures into {}",
        season.teams.len(),
        season.matches.len(),
        path.display()
    );
    Ok(())
}

fn cmd_demo(cfg: &LeagueConfig, seed: u64) -> Result<()> {
    let teams: Vec<String> = (1..=18).map(|i| format!("Club {i:02}")).collect();
    let start = NaiveDate::from_ymd_opt(2026, 1, 9)
        .unwrap_or_else(|| Local::now().date_naive());
    let mut season: Season = build_season_template(&teams, |t| format!("Estadio {t}"), start)
        .context("build demo season")?;
    let mut rng = StdRng::seed_from_u64(seed);
    demo::simulate_results(&mut season.matches, &mut rng, cfg.season.regular_season_rounds);

    let mut engine = LeagueEngine::new(MemoryStore::new(season), cfg.season, cfg.bracket);
    let mut refresh = engine.refresh_from_store()?;
    print_table(&refresh.table, &refresh.zones);

    // One playoff week per pass; each refresh re-derives the pairings the next week needs.
    for week in BRACKET.play_order() {
        let mut season = engine.store().load()?;
        demo::simulate_fixtures(&mut season.matches, &mut rng, &week);
        engine = LeagueEngine::new(MemoryStore::new(season), cfg.season, cfg.bracket);
        refresh = engine.refresh_from_store()?;
    }
    if refresh.champion.is_none() {
        eprintln!("[WARN] Bracket finished without a champion");
    }

    print_refresh(&refresh);
    print_playoffs(&engine.store().load()?.matches);
    Ok(())
}

fn print_table(table: &[TableEntry], zones: &[Option<Zone>]) {
    println!(
        "{:>3} {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}  zone",
        "#", "team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts"
    );
    for (idx, row) in table.iter().enumerate() {
        let zone = zones
            .get(idx)
            .copied()
            .flatten()
            .map(Zone::label)
            .unwrap_or("");
        println!(
            "{:>3} {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4} {:>4} {:>4}  {zone}",
            idx + 1,
            row.equipo,
            row.jj,
            row.jg,
            row.je,
            row.jp,
            row.gf,
            row.gc,
            row.dg,
            row.pts
        );
    }
}

fn print_refresh(refresh: &Refresh) {
    for line in &refresh.log {
        eprintln!("{line}");
    }
    let alive: Vec<&str> = refresh
        .table
        .iter()
        .filter(|row| !row.eliminado)
        .map(|row| row.equipo.as_str())
        .collect();
    println!("In contention: {}", alive.join(", "));
    if let Some(champion) = &refresh.champion {
        println!("Champion: {champion}");
    }
}

fn print_playoffs(matches: &[Match]) {
    for id_match in BRACKET.fixture_ids() {
        let Some(m) = matches.iter().find(|m| m.id_match == id_match) else {
            continue;
        };
        let label = BRACKET.fixture_label(id_match).unwrap_or_default();
        let score = match m.score() {
            Some((l, v)) => format!("{l}-{v}"),
            None => "-".to_string(),
        };
        println!(
            "{id_match:>4} {label:<22} {:>22} {score:^5} {:<22} {}",
            m.local, m.visitante, m.estadio
        );
    }
}
