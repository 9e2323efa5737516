use std::collections::VecDeque;

use crate::bracket::calculate_play_in;
use crate::bracket_layout::BRACKET;
use crate::config::{BracketConfig, SeasonConfig};
use crate::model::{Match, Season, TableEntry};
use crate::standings::calculate_table;
use crate::store::{MatchStore, MemoryStore};
use crate::zones::{Zone, classify_zones};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub struct LeagueState {
    pub store: MemoryStore,
    pub season_cfg: SeasonConfig,
    pub bracket_cfg: BracketConfig,
    pub table: Vec<TableEntry>,
    pub zones: Vec<Option<Zone>>,
    pub champion: Option<String>,
    pub logs: VecDeque<String>,
}

impl Default for LeagueState {
    fn default() -> Self {
        Self::new(SeasonConfig::default(), BracketConfig::default())
    }
}

impl LeagueState {
    pub fn new(season_cfg: SeasonConfig, bracket_cfg: BracketConfig) -> Self {
        Self {
            store: MemoryStore::default(),
            season_cfg,
            bracket_cfg,
            table: Vec::new(),
            zones: Vec::new(),
            champion: None,
            logs: VecDeque::new(),
        }
    }

    pub fn season(&self) -> &Season {
        &self.store.season
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn zone_of(&self, team: &str) -> Option<Zone> {
        let idx = self.table.iter().position(|row| row.equipo == team)?;
        self.zones.get(idx).copied().flatten()
    }

    /// Standings first, then the bracket on top of them. The bracket writes land in the
    /// in-memory store so pairings show up in `season().matches`.
    fn recompute(&mut self) {
        let teams = self.store.season.teams.clone();
        let matches = self.store.season.matches.clone();
        let table = calculate_table(&teams, &matches, &self.season_cfg);
        self.zones = classify_zones(&table, self.season_cfg.regular_season_rounds);
        self.champion = None;

        if table.len() < BRACKET.min_table_rows() {
            self.table = table;
            return;
        }
        match calculate_play_in(table.clone(), &matches, &self.bracket_cfg, &mut self.store) {
            Ok(outcome) => {
                self.table = outcome.table;
                self.champion = outcome.champion;
                for line in outcome.log {
                    self.push_log(line);
                }
            }
            Err(err) => {
                self.table = table;
                self.push_log(format!("[WARN] Bracket not updated: {err:#}"));
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTeams(Vec<String>),
    SetMatches(Vec<Match>),
    UpsertMatch(Match),
    SetScore {
        id_match: u32,
        gol_local: Option<u32>,
        gol_visitante: Option<u32>,
    },
    Log(String),
}

pub fn apply_delta(state: &mut LeagueState, delta: Delta) {
    match delta {
        Delta::SetTeams(teams) => {
            state.store.season.teams = teams;
            state.recompute();
        }
        Delta::SetMatches(matches) => {
            state.store.season.matches = matches;
            state.recompute();
        }
        Delta::UpsertMatch(m) => {
            let matches = &mut state.store.season.matches;
            if let Some(existing) = matches.iter_mut().find(|x| x.id_match == m.id_match) {
                *existing = m;
            } else {
                matches.push(m);
                matches.sort_by_key(|x| x.id_match);
            }
            state.recompute();
        }
        Delta::SetScore {
            id_match,
            gol_local,
            gol_visitante,
        } => {
            let Some(m) = state
                .store
                .season
                .matches
                .iter_mut()
                .find(|m| m.id_match == id_match)
            else {
                state.push_log(format!("[WARN] Score for unknown fixture {id_match} ignored"));
                return;
            };
            m.gol_local = gol_local;
            m.gol_visitante = gol_visitante;
            state.recompute();
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Rebuild a state from whatever the store currently holds.
pub fn load_state<S: MatchStore>(
    store: &S,
    season_cfg: SeasonConfig,
    bracket_cfg: BracketConfig,
) -> anyhow::Result<LeagueState> {
    let season = store.load()?;
    let mut state = LeagueState::new(season_cfg, bracket_cfg);
    state.store = MemoryStore::new(season);
    state.recompute();
    Ok(state)
}
