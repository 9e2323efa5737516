use anyhow::{Context, Result};

use crate::bracket::{BracketOutcome, calculate_play_in};
use crate::config::{BracketConfig, SeasonConfig};
use crate::model::{Match, TableEntry};
use crate::standings::calculate_table;
use crate::store::MatchStore;
use crate::zones::{Zone, classify_zones};

#[derive(Debug, Clone)]
pub struct Refresh {
    /// Table after the bracket has marked its eliminations.
    pub table: Vec<TableEntry>,
    pub zones: Vec<Option<Zone>>,
    pub champion: Option<String>,
    pub log: Vec<String>,
}

/// Owns the store so that one table + bracket pass runs at a time: `refresh` takes `&mut self`.
pub struct LeagueEngine<S: MatchStore> {
    store: S,
    season: SeasonConfig,
    bracket: BracketConfig,
}

impl<S: MatchStore> LeagueEngine<S> {
    pub fn new(store: S, season: SeasonConfig, bracket: BracketConfig) -> Self {
        Self {
            store,
            season,
            bracket,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Recompute the table and push bracket assignments for the given data.
    pub fn refresh(&mut self, teams: &[String], matches: &[Match]) -> Result<Refresh> {
        let table = calculate_table(teams, matches, &self.season);
        let zones = classify_zones(&table, self.season.regular_season_rounds);
        let BracketOutcome {
            table,
            champion,
            log,
        } = calculate_play_in(table, matches, &self.bracket, &mut self.store)?;
        Ok(Refresh {
            table,
            zones,
            champion,
            log,
        })
    }

    /// Same as `refresh`, reading teams and matches from the store first.
    pub fn refresh_from_store(&mut self) -> Result<Refresh> {
        let season = self.store.load().context("load season from store")?;
        self.refresh(&season.teams, &season.matches)
    }
}
