use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::bracket_layout::BRACKET;

pub const DEFAULT_REGULAR_SEASON_ROUNDS: u32 = 17;
pub const DEFAULT_PLAYOFF_ZONE: usize = 10;

const APP_DIR: &str = "liga_playoffs";
const SEASON_FILE: &str = "season.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonConfig {
    /// Matchdays that count for the table; playoff fixtures share the store with later jornadas.
    pub regular_season_rounds: u32,
    /// Rows from this index on start out provisionally eliminated.
    pub playoff_zone: usize,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            regular_season_rounds: DEFAULT_REGULAR_SEASON_ROUNDS,
            playoff_zone: DEFAULT_PLAYOFF_ZONE,
        }
    }
}

impl SeasonConfig {
    /// Single round robin: every team meets every other team once.
    pub fn from_team_count(teams: usize) -> Self {
        Self {
            regular_season_rounds: teams.saturating_sub(1) as u32,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Level ties without a shoot-out go to the higher seed (the second-leg host).
    #[default]
    HigherSeed,
    /// Level ties without a shoot-out stay open until one is recorded.
    Pending,
}

impl TiePolicy {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "higher-seed" | "higher_seed" | "seed" => Ok(Self::HigherSeed),
            "pending" | "strict" => Ok(Self::Pending),
            other => Err(anyhow!("unknown tie policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BracketConfig {
    pub tie_policy: TiePolicy,
    /// Also write `/table/{team}/eliminado` paths to the store.
    pub persist_eliminations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub season: SeasonConfig,
    pub bracket: BracketConfig,
    pub store: StoreKind,
    pub store_path: Option<PathBuf>,
}

impl LeagueConfig {
    pub fn from_env() -> Result<Self> {
        let regular_season_rounds = env::var("LIGA_REGULAR_SEASON_ROUNDS")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_REGULAR_SEASON_ROUNDS)
            .max(1);
        let playoff_zone = parse_playoff_zone(env::var("LIGA_PLAYOFF_ZONE").ok().as_deref())?;
        let tie_policy = match env::var("LIGA_TIE_POLICY") {
            Ok(raw) if !raw.trim().is_empty() => TiePolicy::parse(&raw)?,
            _ => TiePolicy::default(),
        };
        let persist_eliminations = env::var("LIGA_PERSIST_ELIMINATIONS")
            .map(|val| matches!(val.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let store = match env::var("LIGA_STORE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "" | "json" => StoreKind::Json,
            "sqlite" | "db" => StoreKind::Sqlite,
            other => return Err(anyhow!("unknown store kind '{other}'")),
        };
        let store_path = env::var("LIGA_STORE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(default_store_path);

        Ok(Self {
            season: SeasonConfig {
                regular_season_rounds,
                playoff_zone,
            },
            bracket: BracketConfig {
                tie_policy,
                persist_eliminations,
            },
            store,
            store_path,
        })
    }
}

/// `LIGA_PLAYOFF_ZONE`: at least as many rows as the play-in reads.
pub fn parse_playoff_zone(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_PLAYOFF_ZONE);
    };
    let zone = raw
        .parse::<usize>()
        .map_err(|_| anyhow!("LIGA_PLAYOFF_ZONE is not a number: '{raw}'"))?;
    let needed = BRACKET.min_table_rows();
    if zone < needed {
        return Err(anyhow!("LIGA_PLAYOFF_ZONE must be at least {needed}, got {zone}"));
    }
    Ok(zone)
}

pub fn app_data_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn default_store_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(SEASON_FILE))
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PLAYOFF_ZONE, SeasonConfig, TiePolicy, parse_playoff_zone};

    #[test]
    fn tie_policy_parses_aliases() {
        assert_eq!(TiePolicy::parse("Higher-Seed").unwrap(), TiePolicy::HigherSeed);
        assert_eq!(TiePolicy::parse(" pending ").unwrap(), TiePolicy::Pending);
        assert!(TiePolicy::parse("coin-toss").is_err());
    }

    #[test]
    fn rounds_derive_from_team_count() {
        assert_eq!(SeasonConfig::from_team_count(18).regular_season_rounds, 17);
        assert_eq!(SeasonConfig::from_team_count(0).regular_season_rounds, 0);
    }

    #[test]
    fn playoff_zone_never_drops_below_play_in_rows() {
        assert_eq!(parse_playoff_zone(None).unwrap(), DEFAULT_PLAYOFF_ZONE);
        assert_eq!(parse_playoff_zone(Some("  ")).unwrap(), DEFAULT_PLAYOFF_ZONE);
        assert_eq!(parse_playoff_zone(Some("12")).unwrap(), 12);
        let err = parse_playoff_zone(Some("8")).unwrap_err();
        assert!(err.to_string().contains("at least 10"));
        assert!(parse_playoff_zone(Some("ten")).is_err());
    }
}
