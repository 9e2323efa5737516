use rand::Rng;

use crate::bracket::aggregate;
use crate::bracket_layout::BRACKET;
use crate::model::Match;

/// Fill random scores for every unplayed fixture up to `through_jornada`. Returns how many
/// fixtures got a score.
pub fn simulate_results<R: Rng>(matches: &mut [Match], rng: &mut R, through_jornada: u32) -> usize {
    let mut played = 0;
    for m in matches
        .iter_mut()
        .filter(|m| m.jornada <= through_jornada && !m.is_final())
    {
        play(m, rng);
        played += 1;
    }
    played
}

/// Score fixtures that already have both teams assigned but no result yet, restricted to
/// `ids`. A knockout that ends level on the deciding fixture (the single game, or the second
/// leg on aggregate) also gets a shoot-out.
pub fn simulate_fixtures<R: Rng>(matches: &mut [Match], rng: &mut R, ids: &[u32]) -> usize {
    let mut played = 0;
    for &id_match in ids {
        let Some(idx) = matches.iter().position(|m| {
            m.id_match == id_match && !m.is_final() && !m.local.is_empty() && !m.visitante.is_empty()
        }) else {
            continue;
        };
        play(&mut matches[idx], rng);
        if level_on_decider(matches, idx) {
            shootout(&mut matches[idx], rng);
        }
        played += 1;
    }
    played
}

fn level_on_decider(matches: &[Match], idx: usize) -> bool {
    let m = &matches[idx];
    if BRACKET.is_single_game(m.id_match) {
        return m.gol_local == m.gol_visitante;
    }
    BRACKET
        .first_leg_of(m.id_match)
        .and_then(|first_id| matches.iter().find(|x| x.id_match == first_id))
        .and_then(|first| aggregate(first, m))
        .is_some_and(|(agg_local, agg_visitante)| agg_local == agg_visitante)
}

fn shootout<R: Rng>(m: &mut Match, rng: &mut R) {
    let pen_local = rng.gen_range(2..=5);
    let mut pen_visitante = rng.gen_range(2..=5);
    if pen_visitante == pen_local {
        pen_visitante = pen_local + 1;
    }
    m.penales_local = Some(pen_local);
    m.penales_visitante = Some(pen_visitante);
}

fn play<R: Rng>(m: &mut Match, rng: &mut R) {
    m.gol_local = Some(goals(rng, true));
    m.gol_visitante = Some(goals(rng, false));
}

fn goals<R: Rng>(rng: &mut R, home: bool) -> u32 {
    // Rough league distribution, a little kinder to the home side.
    let roll = rng.gen_range(0..100) + if home { 8 } else { 0 };
    match roll {
        0..=27 => 0,
        28..=62 => 1,
        63..=84 => 2,
        85..=95 => 3,
        _ => 4,
    }
}
