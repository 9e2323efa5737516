use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id_match: u32,
    #[serde(default)]
    pub jornada: u32,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub visitante: String,
    #[serde(default, deserialize_with = "de_goals")]
    pub gol_local: Option<u32>,
    #[serde(default, deserialize_with = "de_goals")]
    pub gol_visitante: Option<u32>,
    #[serde(default)]
    pub estadio: String,
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub hora: String,
    // Shoot-out score, only read when a knockout tie finishes level.
    #[serde(default, deserialize_with = "de_goals", skip_serializing_if = "Option::is_none")]
    pub penales_local: Option<u32>,
    #[serde(default, deserialize_with = "de_goals", skip_serializing_if = "Option::is_none")]
    pub penales_visitante: Option<u32>,
}

impl Match {
    pub fn new(id_match: u32, jornada: u32, local: &str, visitante: &str) -> Self {
        Self {
            id_match,
            jornada,
            local: local.to_string(),
            visitante: visitante.to_string(),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, gol_local: u32, gol_visitante: u32) -> Self {
        self.gol_local = Some(gol_local);
        self.gol_visitante = Some(gol_visitante);
        self
    }

    pub fn with_venue(mut self, estadio: &str) -> Self {
        self.estadio = estadio.to_string();
        self
    }

    /// Both goal fields recorded.
    pub fn is_final(&self) -> bool {
        self.gol_local.is_some() && self.gol_visitante.is_some()
    }

    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.gol_local?, self.gol_visitante?))
    }

    pub fn shootout(&self) -> Option<(u32, u32)> {
        Some((self.penales_local?, self.penales_visitante?))
    }

    pub fn involves(&self, team: &str) -> bool {
        self.local == team || self.visitante == team
    }

    /// Goals (for, against) from `team`'s side, if the match is final and the team played.
    pub fn goals_for(&self, team: &str) -> Option<(u32, u32)> {
        let (home, away) = self.score()?;
        if self.local == team {
            Some((home, away))
        } else if self.visitante == team {
            Some((away, home))
        } else {
            None
        }
    }

    pub fn kickoff(&self) -> Option<NaiveDateTime> {
        let date = parse_fecha(&self.fecha)?;
        let time = NaiveTime::parse_from_str(self.hora.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(self.hora.trim(), "%H:%M:%S"))
            .ok()?;
        Some(date.and_time(time))
    }
}

fn parse_fecha(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

// The store writes goals as numbers, numeric strings, "" or null depending on who edited the
// fixture last. Only the first two count as a recorded score.
fn de_goals<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub equipo: String,
    pub jj: u32,
    pub jg: u32,
    pub je: u32,
    pub jp: u32,
    pub gf: u32,
    pub gc: u32,
    pub dg: i32,
    pub pts: u32,
    #[serde(default)]
    pub eliminado: bool,
}

impl TableEntry {
    pub fn new(equipo: &str) -> Self {
        Self {
            equipo: equipo.to_string(),
            ..Self::default()
        }
    }

    /// Points still reachable if every remaining regular-season game is won.
    pub fn max_points(&self, total_matches: u32) -> u32 {
        self.pts + total_matches.saturating_sub(self.jj) * 3
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub matches: Vec<Match>,
    // Only filled when bracket eliminations are persisted.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub eliminados: BTreeMap<String, bool>,
}
