use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use crate::model::{Match, Season};

/// Keyed field writes, e.g. `/matches/153/local -> "Tigres"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    entries: BTreeMap<String, Value>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_match_field(&mut self, id_match: u32, field: MatchField, value: impl Into<Value>) {
        self.entries
            .insert(format!("/matches/{id_match}/{}", field.key()), value.into());
    }

    pub fn set_eliminated(&mut self, team: &str, eliminado: bool) {
        self.entries
            .insert(format!("/table/{}/eliminado", encode_segment(team)), Value::Bool(eliminado));
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.get(path)
    }

    pub fn match_field(&self, id_match: u32, field: MatchField) -> Option<&str> {
        self.get(&format!("/matches/{id_match}/{}", field.key()))
            .and_then(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    pub fn extend(&mut self, other: UpdateBatch) {
        self.entries.extend(other.entries);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Local,
    Visitante,
    GolLocal,
    GolVisitante,
    Estadio,
    Fecha,
    Hora,
}

impl MatchField {
    pub fn key(self) -> &'static str {
        match self {
            MatchField::Local => "local",
            MatchField::Visitante => "visitante",
            MatchField::GolLocal => "golLocal",
            MatchField::GolVisitante => "golVisitante",
            MatchField::Estadio => "estadio",
            MatchField::Fecha => "fecha",
            MatchField::Hora => "hora",
        }
    }

    fn column(self) -> &'static str {
        match self {
            MatchField::Local => "local",
            MatchField::Visitante => "visitante",
            MatchField::GolLocal => "gol_local",
            MatchField::GolVisitante => "gol_visitante",
            MatchField::Estadio => "estadio",
            MatchField::Fecha => "fecha",
            MatchField::Hora => "hora",
        }
    }

    fn from_key(raw: &str) -> Option<Self> {
        Some(match raw {
            "local" => MatchField::Local,
            "visitante" => MatchField::Visitante,
            "golLocal" => MatchField::GolLocal,
            "golVisitante" => MatchField::GolVisitante,
            "estadio" => MatchField::Estadio,
            "fecha" => MatchField::Fecha,
            "hora" => MatchField::Hora,
            _ => return None,
        })
    }

    fn is_goal(self) -> bool {
        matches!(self, MatchField::GolLocal | MatchField::GolVisitante)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdatePath<'a> {
    MatchField { id_match: u32, field: MatchField },
    Eliminated { team: Cow<'a, str> },
}

/// Team names go into a path segment with `%` and `/` escaped.
fn encode_segment(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['%', '/']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace('%', "%25").replace('/', "%2F"))
}

fn decode_segment(raw: &str) -> Result<Cow<'_, str>> {
    if !raw.contains('%') {
        return Ok(Cow::Borrowed(raw));
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = rest.find('%') {
        out.push_str(&rest[..at]);
        let escape = rest.get(at + 1..at + 3).unwrap_or("");
        match escape {
            "25" => out.push('%'),
            "2F" | "2f" => out.push('/'),
            _ => bail!("bad escape in path segment {raw}"),
        }
        rest = &rest[at + 3..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

pub fn parse_path(path: &str) -> Result<UpdatePath<'_>> {
    let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    match parts.as_slice() {
        ["matches", id, field] => {
            let id_match = id
                .parse::<u32>()
                .with_context(|| format!("bad fixture id in path {path}"))?;
            let field = MatchField::from_key(field)
                .ok_or_else(|| anyhow!("unknown match field in path {path}"))?;
            Ok(UpdatePath::MatchField { id_match, field })
        }
        ["table", team, "eliminado"] if !team.is_empty() => Ok(UpdatePath::Eliminated {
            team: decode_segment(team)?,
        }),
        _ => Err(anyhow!("unsupported update path {path}")),
    }
}

fn goal_value(value: &Value) -> Result<Option<u32>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| anyhow!("goal value out of range: {n}")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .with_context(|| format!("goal value is not a number: {s}")),
        other => Err(anyhow!("unexpected goal value {other}")),
    }
}

fn text_value(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(anyhow!("expected text, got {other}")),
    }
}

/// Apply a batch to an in-memory season. Paths and fixture ids are all checked before the
/// first write.
pub fn apply_to_season(season: &mut Season, batch: &UpdateBatch) -> Result<()> {
    let mut writes = Vec::with_capacity(batch.len());
    for (path, value) in batch.iter() {
        let parsed = parse_path(path)?;
        if let UpdatePath::MatchField { id_match, .. } = parsed {
            let idx = season
                .matches
                .iter()
                .position(|m| m.id_match == id_match)
                .ok_or_else(|| anyhow!("unknown fixture {id_match}"))?;
            writes.push((Some(idx), parsed, value));
        } else {
            writes.push((None, parsed, value));
        }
    }

    for (idx, parsed, value) in writes {
        match (idx, parsed) {
            (Some(idx), UpdatePath::MatchField { field, .. }) => {
                set_field(&mut season.matches[idx], field, value)?;
            }
            (_, UpdatePath::Eliminated { team }) => {
                let flag = value
                    .as_bool()
                    .ok_or_else(|| anyhow!("eliminado for {team} is not a boolean"))?;
                season.eliminados.insert(team.into_owned(), flag);
            }
            (None, UpdatePath::MatchField { id_match, .. }) => bail!("unknown fixture {id_match}"),
        }
    }
    Ok(())
}

fn set_field(m: &mut Match, field: MatchField, value: &Value) -> Result<()> {
    match field {
        MatchField::Local => m.local = text_value(value)?,
        MatchField::Visitante => m.visitante = text_value(value)?,
        MatchField::Estadio => m.estadio = text_value(value)?,
        MatchField::Fecha => m.fecha = text_value(value)?,
        MatchField::Hora => m.hora = text_value(value)?,
        MatchField::GolLocal => m.gol_local = goal_value(value)?,
        MatchField::GolVisitante => m.gol_visitante = goal_value(value)?,
    }
    Ok(())
}

/// The persistence side of the league: hands out the season and accepts field writes.
pub trait MatchStore {
    fn load(&self) -> Result<Season>;
    fn apply_updates(&mut self, batch: &UpdateBatch) -> Result<()>;
}

impl<T: MatchStore + ?Sized> MatchStore for Box<T> {
    fn load(&self) -> Result<Season> {
        (**self).load()
    }

    fn apply_updates(&mut self, batch: &UpdateBatch) -> Result<()> {
        (**self).apply_updates(batch)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub season: Season,
    /// Every non-empty batch received, in order.
    pub batches: Vec<UpdateBatch>,
}

impl MemoryStore {
    pub fn new(season: Season) -> Self {
        Self {
            season,
            batches: Vec::new(),
        }
    }

    /// All batches folded together, later writes winning.
    pub fn merged(&self) -> UpdateBatch {
        let mut out = UpdateBatch::new();
        for batch in &self.batches {
            out.extend(batch.clone());
        }
        out
    }
}

impl MatchStore for MemoryStore {
    fn load(&self) -> Result<Season> {
        Ok(self.season.clone())
    }

    fn apply_updates(&mut self, batch: &UpdateBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        apply_to_season(&mut self.season, batch)?;
        self.batches.push(batch.clone());
        Ok(())
    }
}

/// Season file on disk, rewritten through a temp file on every batch.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, season: &Season) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(season).context("serialize season")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("swap {}", self.path.display()))?;
        Ok(())
    }
}

impl MatchStore for JsonFileStore {
    fn load(&self) -> Result<Season> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read season file {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid season file {}", self.path.display()))
    }

    fn apply_updates(&mut self, batch: &UpdateBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut season = self.load()?;
        apply_to_season(&mut season, batch)?;
        self.save(&season)
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS teams (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS matches (
                id_match INTEGER PRIMARY KEY,
                jornada INTEGER NOT NULL,
                local TEXT NOT NULL,
                visitante TEXT NOT NULL,
                gol_local INTEGER,
                gol_visitante INTEGER,
                estadio TEXT NOT NULL,
                fecha TEXT NOT NULL,
                hora TEXT NOT NULL,
                penales_local INTEGER,
                penales_visitante INTEGER
            );
            CREATE TABLE IF NOT EXISTS eliminations (
                equipo TEXT PRIMARY KEY,
                eliminado INTEGER NOT NULL
            );
            "#,
        )
        .context("init sqlite schema")?;
        Ok(Self { conn })
    }

    /// Replace the stored season wholesale.
    pub fn import(&mut self, season: &Season) -> Result<()> {
        let tx = self.conn.transaction().context("begin import transaction")?;
        tx.execute("DELETE FROM teams", []).context("clear teams")?;
        tx.execute("DELETE FROM matches", []).context("clear matches")?;
        tx.execute("DELETE FROM eliminations", [])
            .context("clear eliminations")?;
        for (position, name) in season.teams.iter().enumerate() {
            tx.execute(
                "INSERT INTO teams (position, name) VALUES (?1, ?2)",
                params![position as i64, name],
            )
            .context("insert team")?;
        }
        for m in &season.matches {
            tx.execute(
                r#"
                INSERT INTO matches (
                    id_match, jornada, local, visitante, gol_local, gol_visitante,
                    estadio, fecha, hora, penales_local, penales_visitante
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    m.id_match,
                    m.jornada,
                    m.local,
                    m.visitante,
                    m.gol_local,
                    m.gol_visitante,
                    m.estadio,
                    m.fecha,
                    m.hora,
                    m.penales_local,
                    m.penales_visitante,
                ],
            )
            .with_context(|| format!("insert fixture {}", m.id_match))?;
        }
        for (team, flag) in &season.eliminados {
            tx.execute(
                "INSERT INTO eliminations (equipo, eliminado) VALUES (?1, ?2)",
                params![team, *flag as i64],
            )
            .context("insert elimination")?;
        }
        tx.commit().context("commit import transaction")?;
        Ok(())
    }

    fn load_teams(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM teams ORDER BY position")
            .context("prepare load teams query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query load teams")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode team row")?);
        }
        Ok(out)
    }

    fn load_matches(&self) -> Result<Vec<Match>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT id_match, jornada, local, visitante, gol_local, gol_visitante,
                       estadio, fecha, hora, penales_local, penales_visitante
                FROM matches
                ORDER BY id_match
                "#,
            )
            .context("prepare load matches query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Match {
                    id_match: row.get(0)?,
                    jornada: row.get(1)?,
                    local: row.get(2)?,
                    visitante: row.get(3)?,
                    gol_local: row.get(4)?,
                    gol_visitante: row.get(5)?,
                    estadio: row.get(6)?,
                    fecha: row.get(7)?,
                    hora: row.get(8)?,
                    penales_local: row.get(9)?,
                    penales_visitante: row.get(10)?,
                })
            })
            .context("query load matches")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode match row")?);
        }
        Ok(out)
    }

    fn load_eliminations(&self) -> Result<BTreeMap<String, bool>> {
        let mut stmt = self
            .conn
            .prepare("SELECT equipo, eliminado FROM eliminations")
            .context("prepare load eliminations query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
            })
            .context("query load eliminations")?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (team, flag) = row.context("decode elimination row")?;
            out.insert(team, flag);
        }
        Ok(out)
    }

    pub fn fixture(&self, id_match: u32) -> Result<Option<Match>> {
        Ok(self
            .load_matches()?
            .into_iter()
            .find(|m| m.id_match == id_match))
    }

    pub fn eliminated(&self, team: &str) -> Result<Option<bool>> {
        self.conn
            .query_row(
                "SELECT eliminado FROM eliminations WHERE equipo = ?1",
                params![team],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .map(|flag| flag.map(|v| v != 0))
            .context("query elimination")
    }
}

impl MatchStore for SqliteStore {
    fn load(&self) -> Result<Season> {
        Ok(Season {
            teams: self.load_teams()?,
            matches: self.load_matches()?,
            eliminados: self.load_eliminations()?,
        })
    }

    fn apply_updates(&mut self, batch: &UpdateBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let tx = self.conn.transaction().context("begin update transaction")?;
        for (path, value) in batch.iter() {
            match parse_path(path)? {
                UpdatePath::MatchField { id_match, field } => {
                    let sql = format!("UPDATE matches SET {} = ?1 WHERE id_match = ?2", field.column());
                    let written = if field.is_goal() {
                        tx.execute(&sql, params![goal_value(value)?, id_match])
                    } else {
                        tx.execute(&sql, params![text_value(value)?, id_match])
                    };
                    let changed = written.with_context(|| format!("write {path}"))?;
                    if changed == 0 {
                        bail!("unknown fixture {id_match}");
                    }
                }
                UpdatePath::Eliminated { team } => {
                    let flag = value
                        .as_bool()
                        .ok_or_else(|| anyhow!("eliminado for {team} is not a boolean"))?;
                    tx.execute(
                        r#"
                        INSERT INTO eliminations (equipo, eliminado) VALUES (?1, ?2)
                        ON CONFLICT(equipo) DO UPDATE SET eliminado = excluded.eliminado
                        "#,
                        params![team.as_ref(), flag as i64],
                    )
                    .with_context(|| format!("write {path}"))?;
                }
            }
        }
        tx.commit().context("commit update transaction")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_paths() {
        assert_eq!(
            parse_path("/matches/153/estadio").unwrap(),
            UpdatePath::MatchField {
                id_match: 153,
                field: MatchField::Estadio
            }
        );
        assert_eq!(
            parse_path("/table/Tigres/eliminado").unwrap(),
            UpdatePath::Eliminated {
                team: "Tigres".into()
            }
        );
        assert_eq!(
            parse_path("/table/Club 1%2FB/eliminado").unwrap(),
            UpdatePath::Eliminated {
                team: "Club 1/B".into()
            }
        );
        assert!(parse_path("/matches/x/local").is_err());
        assert!(parse_path("/matches/1/eliminado").is_err());
        assert!(parse_path("/teams/0").is_err());
    }

    #[test]
    fn team_segments_escape_slashes_and_percents() {
        assert_eq!(encode_segment("Tigres"), "Tigres");
        assert_eq!(encode_segment("Club 1/B"), "Club 1%2FB");
        assert_eq!(encode_segment("100%/x"), "100%25%2Fx");
        assert_eq!(decode_segment("100%25%2Fx").unwrap(), "100%/x");
        assert_eq!(decode_segment("a%2fb").unwrap(), "a/b");
        assert!(decode_segment("a%2").is_err());
        assert!(decode_segment("a%41").is_err());
    }

    #[test]
    fn goal_values_accept_store_sentinels() {
        assert_eq!(goal_value(&Value::Null).unwrap(), None);
        assert_eq!(goal_value(&Value::from("")).unwrap(), None);
        assert_eq!(goal_value(&Value::from("3")).unwrap(), Some(3));
        assert_eq!(goal_value(&Value::from(2)).unwrap(), Some(2));
        assert!(goal_value(&Value::from(true)).is_err());
    }
}
