use anyhow::{Result, bail};
use chrono::{Duration, NaiveDate};

use crate::bracket_layout::BRACKET;
use crate::model::{Match, Season};

const KICKOFF: &str = "19:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub jornada: u32,
    pub local: String,
    pub visitante: String,
}

/// Single round robin by the circle method: `n - 1` jornadas for an even `n`, one bye per
/// jornada for an odd `n` (bye games are dropped).
pub fn round_robin(teams: &[String]) -> Vec<Pairing> {
    let mut slots: Vec<Option<&str>> = teams.iter().map(|t| Some(t.as_str())).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    if n < 2 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n / 2 * (n - 1));
    for round in 0..n - 1 {
        for i in 0..n / 2 {
            let (a, b) = (slots[i], slots[n - 1 - i]);
            let (Some(a), Some(b)) = (a, b) else { continue };
            // The fixed team alternates by round. Every other team moves one slot per round,
            // so hosting by slot parity alternates its venue as well.
            let (local, visitante) = if (i == 0 && round % 2 == 1) || (i > 0 && i % 2 == 0) {
                (b, a)
            } else {
                (a, b)
            };
            out.push(Pairing {
                jornada: round as u32 + 1,
                local: local.to_string(),
                visitante: visitante.to_string(),
            });
        }
        // Keep slot 0 fixed, rotate the rest clockwise.
        if let Some(last) = slots.pop() {
            slots.insert(1, last);
        }
    }
    out
}

/// Blank season: the regular-season round robin, then one placeholder fixture per playoff
/// slot. Playoff fixtures keep the fixed ids the bracket addresses and sit after the last
/// regular jornada so they never count for the table.
pub fn build_season_template(
    teams: &[String],
    venue_for: impl Fn(&str) -> String,
    start: NaiveDate,
) -> Result<Season> {
    let pairings = round_robin(teams);
    let first_playoff = BRACKET.first_fixture();
    if pairings.len() > first_playoff as usize {
        bail!(
            "{} regular-season fixtures overlap the playoff fixtures starting at {first_playoff}",
            pairings.len()
        );
    }

    let mut matches = Vec::with_capacity(pairings.len() + BRACKET.fixture_ids().len());
    let mut last_round = 0;
    for (id, p) in pairings.into_iter().enumerate() {
        last_round = last_round.max(p.jornada);
        let mut m = Match::new(id as u32, p.jornada, &p.local, &p.visitante);
        m.estadio = venue_for(&p.local);
        m.fecha = round_date(start, p.jornada).format("%Y-%m-%d").to_string();
        m.hora = KICKOFF.to_string();
        matches.push(m);
    }

    for id_match in BRACKET.fixture_ids() {
        let jornada = last_round + playoff_week(id_match);
        let mut m = Match::new(id_match, jornada, "", "");
        m.fecha = round_date(start, jornada).format("%Y-%m-%d").to_string();
        m.hora = KICKOFF.to_string();
        matches.push(m);
    }

    Ok(Season {
        teams: teams.to_vec(),
        matches,
        ..Season::default()
    })
}

fn round_date(start: NaiveDate, jornada: u32) -> NaiveDate {
    start + Duration::weeks(i64::from(jornada.saturating_sub(1)))
}

// Weeks after the regular season, one per entry of the bracket's play order.
fn playoff_week(id_match: u32) -> u32 {
    BRACKET
        .play_order()
        .iter()
        .position(|week| week.contains(&id_match))
        .map(|idx| idx as u32 + 1)
        .unwrap_or(1)
}
