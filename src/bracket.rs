use anyhow::{Context, Result, anyhow, bail};

use crate::bracket_layout::{BRACKET, PlayInTie, TwoLegTie};
use crate::config::{BracketConfig, TiePolicy};
use crate::model::{Match, TableEntry};
use crate::standings::home_venue;
use crate::store::{MatchField, MatchStore, UpdateBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PlayInPairing,
    PlayInResolution,
    QuarterfinalPairing,
    QuarterfinalResolution,
    SemifinalResolution,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::PlayInPairing,
        Stage::PlayInResolution,
        Stage::QuarterfinalPairing,
        Stage::QuarterfinalResolution,
        Stage::SemifinalResolution,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::PlayInPairing => "play-in pairing",
            Stage::PlayInResolution => "play-in resolution",
            Stage::QuarterfinalPairing => "quarterfinal pairing",
            Stage::QuarterfinalResolution => "quarterfinal resolution",
            Stage::SemifinalResolution => "semifinal resolution",
        }
    }
}

/// State threaded from one stage to the next. Each stage consumes the previous run and hands
/// back a new table plus the writes it produced.
#[derive(Debug, Clone, Default)]
pub struct BracketRun {
    pub table: Vec<TableEntry>,
    pub updates: UpdateBatch,
    pub log: Vec<String>,
    pub champion: Option<String>,
}

impl BracketRun {
    pub fn new(table: Vec<TableEntry>) -> Self {
        Self {
            table,
            ..Self::default()
        }
    }

    /// Names of rows still in contention, in table order.
    pub fn seeds(&self) -> Vec<String> {
        self.table
            .iter()
            .filter(|row| !row.eliminado)
            .map(|row| row.equipo.clone())
            .collect()
    }

    fn row_index(&self, team: &str) -> Result<usize> {
        self.table
            .iter()
            .position(|row| row.equipo == team)
            .ok_or_else(|| anyhow!("team '{team}' is not in the table"))
    }

    fn eliminate(&mut self, team: &str, cfg: &BracketConfig) -> Result<()> {
        let idx = self.row_index(team)?;
        self.table[idx].eliminado = true;
        if cfg.persist_eliminations {
            self.updates.set_eliminated(team, true);
        }
        Ok(())
    }

    fn info(&mut self, msg: String) {
        self.log.push(format!("[INFO] {msg}"));
    }

    fn warn(&mut self, msg: String) {
        self.log.push(format!("[WARN] {msg}"));
    }
}

#[derive(Debug, Clone)]
pub struct BracketOutcome {
    pub table: Vec<TableEntry>,
    pub champion: Option<String>,
    pub log: Vec<String>,
}

/// Project the playoff bracket from the table and persist the fixture assignments.
///
/// Each stage's writes go to `store` as one batch before the next stage runs; the next stage
/// works from the in-memory table, not from the store. A failed write stops the run.
pub fn calculate_play_in<S: MatchStore + ?Sized>(
    table: Vec<TableEntry>,
    matches: &[Match],
    cfg: &BracketConfig,
    store: &mut S,
) -> Result<BracketOutcome> {
    let mut run = BracketRun::new(table);
    let mut log = Vec::new();
    for stage in Stage::ALL {
        run = run_stage(stage, run, matches, cfg)?;
        let batch = std::mem::take(&mut run.updates);
        store
            .apply_updates(&batch)
            .with_context(|| format!("persist {} updates", stage.name()))?;
        log.append(&mut run.log);
    }
    Ok(BracketOutcome {
        table: run.table,
        champion: run.champion,
        log,
    })
}

pub fn run_stage(
    stage: Stage,
    run: BracketRun,
    matches: &[Match],
    cfg: &BracketConfig,
) -> Result<BracketRun> {
    match stage {
        Stage::PlayInPairing => pair_play_in(run, matches),
        Stage::PlayInResolution => resolve_play_in(run, matches, cfg),
        Stage::QuarterfinalPairing => pair_quarterfinals(run, matches),
        Stage::QuarterfinalResolution => resolve_quarterfinals(run, matches, cfg),
        Stage::SemifinalResolution => resolve_semifinals(run, matches, cfg),
    }
}

fn pair_play_in(mut run: BracketRun, matches: &[Match]) -> Result<BracketRun> {
    let needed = BRACKET.min_table_rows();
    if run.table.len() < needed {
        bail!(
            "play-in needs at least {needed} teams in the table, got {}",
            run.table.len()
        );
    }
    for tie in [BRACKET.play_in_1, BRACKET.play_in_2] {
        let local = run.table[tie.local_row].equipo.clone();
        let visitante = run.table[tie.visitante_row].equipo.clone();
        schedule(&mut run.updates, tie.fixture, &local, &visitante, matches)?;
    }
    Ok(run)
}

fn resolve_play_in(mut run: BracketRun, matches: &[Match], cfg: &BracketConfig) -> Result<BracketRun> {
    let po3 = BRACKET.play_off_3;

    let pi1 = BRACKET.play_in_1;
    if let Some((m, side)) = decided_single(&mut run, pi1, matches, cfg.tie_policy)
        && seated(&mut run, pi1, m)
    {
        let (winner, loser) = side.split(&m.local, &m.visitante);
        // The winner takes the higher play-in row so later seeding reads it first.
        if side == Side::Visitante {
            run.table.swap(pi1.local_row, pi1.visitante_row);
        }
        let venue = lookup_venue(loser, matches)?;
        run.updates.set_match_field(po3, MatchField::Local, loser);
        run.updates.set_match_field(po3, MatchField::Estadio, venue);
        run.info(format!("{}: {winner} advance, {loser} to play-off 3", pi1.name));
    }

    let pi2 = BRACKET.play_in_2;
    if let Some((m, side)) = decided_single(&mut run, pi2, matches, cfg.tie_policy)
        && seated(&mut run, pi2, m)
    {
        let (winner, loser) = side.split(&m.local, &m.visitante);
        run.eliminate(loser, cfg)?;
        run.updates.set_match_field(po3, MatchField::Visitante, winner);
        run.info(format!("{}: {winner} to play-off 3, {loser} eliminated", pi2.name));
    }

    if let Some(m) = fixture(matches, po3).filter(|m| m.is_final() && has_teams(m)) {
        match decide_single(m, cfg.tie_policy) {
            Some(side) => {
                let (winner, loser) = side.split(&m.local, &m.visitante);
                run.eliminate(loser, cfg)?;
                run.info(format!("Play-off 3: {winner} advance, {loser} eliminated"));
            }
            None => run.warn(format!("Play-off 3 finished level without a shoot-out ({})", tie_label(m))),
        }
    }
    Ok(run)
}

fn pair_quarterfinals(mut run: BracketRun, matches: &[Match]) -> Result<BracketRun> {
    let seeds = run.seeds();
    let needed = BRACKET.quarterfinal_seeds();
    if seeds.len() < needed {
        bail!("quarterfinals need {needed} teams still in contention, got {}", seeds.len());
    }
    for tie in &BRACKET.quarterfinals {
        schedule_two_legs(&mut run.updates, tie, &seeds, matches)?;
    }
    Ok(run)
}

fn resolve_quarterfinals(mut run: BracketRun, matches: &[Match], cfg: &BracketConfig) -> Result<BracketRun> {
    let decided = resolve_round(&mut run, &BRACKET.quarterfinals, matches, cfg)?;
    if decided == BRACKET.quarterfinals.len() {
        pair_next_round(&mut run, &BRACKET.semifinals, BRACKET.semifinal_seeds(), matches)?;
    }
    Ok(run)
}

fn resolve_semifinals(mut run: BracketRun, matches: &[Match], cfg: &BracketConfig) -> Result<BracketRun> {
    let decided = resolve_round(&mut run, &BRACKET.semifinals, matches, cfg)?;
    if decided == BRACKET.semifinals.len()
        && pair_next_round(&mut run, std::slice::from_ref(&BRACKET.final_tie), BRACKET.final_seeds(), matches)?
    {
        let final_tie = BRACKET.final_tie;
        if let Some((winner, _)) = resolve_two_legs(&mut run, &final_tie, matches, cfg)? {
            run.info(format!("{winner} are champions"));
            run.champion = Some(winner);
        }
    }
    Ok(run)
}

/// Resolve every tie of a round, eliminating losers. Returns how many are decided.
fn resolve_round(
    run: &mut BracketRun,
    ties: &[TwoLegTie],
    matches: &[Match],
    cfg: &BracketConfig,
) -> Result<usize> {
    let mut decided = 0;
    for tie in ties {
        if resolve_two_legs(run, tie, matches, cfg)?.is_some() {
            decided += 1;
        }
    }
    Ok(decided)
}

fn pair_next_round(
    run: &mut BracketRun,
    ties: &[TwoLegTie],
    needed: usize,
    matches: &[Match],
) -> Result<bool> {
    let seeds = run.seeds();
    if seeds.len() != needed {
        run.warn(format!(
            "{} not paired: expected {needed} teams in contention, found {}",
            ties.first().map(|t| t.name).unwrap_or("next round"),
            seeds.len()
        ));
        return Ok(false);
    }
    for tie in ties {
        schedule_two_legs(&mut run.updates, tie, &seeds, matches)?;
    }
    Ok(true)
}

/// Aggregate a home-and-away tie and eliminate the loser. Returns `(winner, loser)` once the
/// tie is decided.
fn resolve_two_legs(
    run: &mut BracketRun,
    tie: &TwoLegTie,
    matches: &[Match],
    cfg: &BracketConfig,
) -> Result<Option<(String, String)>> {
    let (Some(first), Some(second)) = (fixture(matches, tie.first_leg), fixture(matches, tie.second_leg)) else {
        return Ok(None);
    };
    if !first.is_final() || !second.is_final() || !has_teams(second) {
        return Ok(None);
    }
    let Some(side) = decide_two_legs(first, second, cfg.tie_policy) else {
        let (agg_local, agg_visitante) = aggregate(first, second).unwrap_or_default();
        run.warn(format!(
            "{}: level on aggregate {agg_local}-{agg_visitante} without a shoot-out",
            tie.name
        ));
        return Ok(None);
    };
    let (winner, loser) = side.split(&second.local, &second.visitante);
    run.eliminate(loser, cfg)?;
    run.info(format!("{}: {winner} beat {loser}", tie.name));
    Ok(Some((winner.to_string(), loser.to_string())))
}

fn decided_single<'a>(
    run: &mut BracketRun,
    tie: PlayInTie,
    matches: &'a [Match],
    policy: TiePolicy,
) -> Option<(&'a Match, Side)> {
    let m = fixture(matches, tie.fixture).filter(|m| m.is_final() && has_teams(m))?;
    match decide_single(m, policy) {
        Some(side) => Some((m, side)),
        None => {
            run.warn(format!("{} finished level without a shoot-out ({})", tie.name, tie_label(m)));
            None
        }
    }
}

/// A play-in result only counts while its two teams still hold the rows the tie reads.
fn seated(run: &mut BracketRun, tie: PlayInTie, m: &Match) -> bool {
    let holds = |row: usize, team: &str| run.table.get(row).is_some_and(|r| r.equipo == team);
    if holds(tie.local_row, &m.local) && holds(tie.visitante_row, &m.visitante) {
        return true;
    }
    run.warn(format!(
        "{} result ignored: {} no longer sit at rows {} and {}",
        tie.name,
        tie_label(m),
        tie.local_row + 1,
        tie.visitante_row + 1
    ));
    false
}

/// Which side of the deciding fixture goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Visitante,
}

impl Side {
    /// `(winner, loser)` given the deciding fixture's local and visitante.
    fn split<'a>(self, local: &'a str, visitante: &'a str) -> (&'a str, &'a str) {
        match self {
            Side::Local => (local, visitante),
            Side::Visitante => (visitante, local),
        }
    }
}

pub fn decide_single(m: &Match, policy: TiePolicy) -> Option<Side> {
    let (local, visitante) = m.score()?;
    if local != visitante {
        return Some(if local > visitante { Side::Local } else { Side::Visitante });
    }
    settle_level(m, policy)
}

/// `(local, visitante)` aggregate from the second-leg host's point of view.
pub fn aggregate(first: &Match, second: &Match) -> Option<(u32, u32)> {
    let (first_local, first_visitante) = first.score()?;
    let (second_local, second_visitante) = second.score()?;
    Some((first_visitante + second_local, first_local + second_visitante))
}

/// Winner side is expressed against the second leg, whose local is the higher seed.
pub fn decide_two_legs(first: &Match, second: &Match, policy: TiePolicy) -> Option<Side> {
    let (agg_local, agg_visitante) = aggregate(first, second)?;
    if agg_local != agg_visitante {
        return Some(if agg_local > agg_visitante { Side::Local } else { Side::Visitante });
    }
    settle_level(second, policy)
}

fn settle_level(deciding: &Match, policy: TiePolicy) -> Option<Side> {
    if let Some((pen_local, pen_visitante)) = deciding.shootout()
        && pen_local != pen_visitante
    {
        return Some(if pen_local > pen_visitante { Side::Local } else { Side::Visitante });
    }
    match policy {
        TiePolicy::HigherSeed => Some(Side::Local),
        TiePolicy::Pending => None,
    }
}

fn schedule_two_legs(
    updates: &mut UpdateBatch,
    tie: &TwoLegTie,
    seeds: &[String],
    matches: &[Match],
) -> Result<()> {
    let local = seed(seeds, tie.local_seed, tie.name)?;
    let visitante = seed(seeds, tie.visitante_seed, tie.name)?;
    schedule(updates, tie.first_leg, visitante, local, matches)?;
    schedule(updates, tie.second_leg, local, visitante, matches)
}

fn schedule(
    updates: &mut UpdateBatch,
    id_match: u32,
    local: &str,
    visitante: &str,
    matches: &[Match],
) -> Result<()> {
    let venue = lookup_venue(local, matches)?;
    updates.set_match_field(id_match, MatchField::Local, local);
    updates.set_match_field(id_match, MatchField::Visitante, visitante);
    updates.set_match_field(id_match, MatchField::Estadio, venue);
    Ok(())
}

fn seed<'a>(seeds: &'a [String], idx: usize, tie: &str) -> Result<&'a str> {
    seeds
        .get(idx)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{tie}: no team for seed {}", idx + 1))
}

fn lookup_venue(team: &str, matches: &[Match]) -> Result<String> {
    home_venue(team, matches)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no home fixture recorded for '{team}', cannot resolve its venue"))
}

fn fixture(matches: &[Match], id_match: u32) -> Option<&Match> {
    matches.iter().find(|m| m.id_match == id_match)
}

fn has_teams(m: &Match) -> bool {
    !m.local.is_empty() && !m.visitante.is_empty()
}

fn tie_label(m: &Match) -> String {
    format!(
        "{} {}-{} {}",
        m.local,
        m.gol_local.unwrap_or_default(),
        m.gol_visitante.unwrap_or_default(),
        m.visitante
    )
}
