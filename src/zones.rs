use serde::Serialize;

use crate::model::TableEntry;

const SEVENTH: usize = 6;
const TENTH: usize = 9;
const ELEVENTH: usize = 10;

/// Live projection of where a row can still finish. Independent from `TableEntry::eliminado`,
/// which the bracket overwrites once the playoffs start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Qualified,
    #[serde(rename = "playin")]
    PlayIn,
    Eliminated,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Qualified => "qualified",
            Zone::PlayIn => "playin",
            Zone::Eliminated => "eliminated",
        }
    }
}

pub fn classify_zone(table: &[TableEntry], i: usize, total_matches: u32) -> Option<Zone> {
    if table.len() <= ELEVENTH {
        return None;
    }
    let team = table.get(i)?;
    let team7 = &table[SEVENTH];
    let team10 = &table[TENTH];
    let team11 = &table[ELEVENTH];

    let out_of_reach = |other: &TableEntry| other.max_points(total_matches) < team.pts;
    let finished_behind = |other: &TableEntry| other.jj == total_matches && other.pts <= team.pts;

    if out_of_reach(team7) || (finished_behind(team7) && i < SEVENTH && i != SEVENTH) {
        return Some(Zone::Qualified);
    }
    if out_of_reach(team11) || (finished_behind(team11) && i < ELEVENTH && i != ELEVENTH) {
        return Some(Zone::PlayIn);
    }
    if team.max_points(total_matches) < team10.pts
        || (team.jj == total_matches && team.pts <= team10.pts && i != TENTH)
    {
        return Some(Zone::Eliminated);
    }
    None
}

pub fn classify_zones(table: &[TableEntry], total_matches: u32) -> Vec<Option<Zone>> {
    (0..table.len())
        .map(|i| classify_zone(table, i, total_matches))
        .collect()
}
