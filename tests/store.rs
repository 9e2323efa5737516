use std::fs;
use std::path::PathBuf;

use liga_playoffs::config::SeasonConfig;
use liga_playoffs::model::Match;
use liga_playoffs::standings::calculate_table;
use liga_playoffs::store::{
    JsonFileStore, MatchField, MatchStore, MemoryStore, SqliteStore, UpdateBatch,
};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("liga_playoffs_{}", std::process::id()))
        .join(name)
}

#[test]
fn season_file_tolerates_goal_sentinels() {
    let season = JsonFileStore::new(fixture_path("season_sample.json"))
        .load()
        .expect("fixture should parse");
    assert_eq!(season.teams.len(), 4);
    assert_eq!(season.matches[0].score(), Some((2, 1)));
    assert_eq!(season.matches[1].score(), Some((0, 0)));
    assert!(!season.matches[2].is_final());
    assert!(!season.matches[3].is_final());
    let mut same_day = season.matches[1].clone();
    same_day.hora = "19:00".to_string();
    assert_eq!(season.matches[0].kickoff(), same_day.kickoff());
    assert!(season.matches[3].kickoff().is_none());

    let table = calculate_table(&season.teams, &season.matches, &SeasonConfig::default());
    let order: Vec<&str> = table.iter().map(|r| r.equipo.as_str()).collect();
    assert_eq!(order, vec!["Tigres", "Toros", "Halcones", "Pumas"]);
}

#[test]
fn json_store_round_trips_and_applies_batches() {
    let season = JsonFileStore::new(fixture_path("season_sample.json"))
        .load()
        .unwrap();
    let path = scratch_path("round_trip.json");
    let mut store = JsonFileStore::new(&path);
    store.save(&season).unwrap();
    assert_eq!(store.load().unwrap(), season);

    let mut batch = UpdateBatch::new();
    batch.set_match_field(2, MatchField::GolLocal, 3);
    batch.set_match_field(2, MatchField::GolVisitante, "1");
    batch.set_match_field(3, MatchField::Estadio, "Estadio Nuevo");
    batch.set_eliminated("Pumas", true);
    store.apply_updates(&batch).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.matches[2].score(), Some((3, 1)));
    assert_eq!(reloaded.matches[3].estadio, "Estadio Nuevo");
    assert_eq!(reloaded.eliminados.get("Pumas"), Some(&true));
    assert!(!path.with_extension("json.tmp").exists());

    let _ = fs::remove_file(&path);
}

#[test]
fn unknown_fixture_leaves_the_file_alone() {
    let season = JsonFileStore::new(fixture_path("season_sample.json"))
        .load()
        .unwrap();
    let path = scratch_path("unknown_fixture.json");
    let mut store = JsonFileStore::new(&path);
    store.save(&season).unwrap();

    let mut batch = UpdateBatch::new();
    batch.set_match_field(1, MatchField::Local, "Changed");
    batch.set_match_field(99, MatchField::Local, "Nobody");
    let err = store.apply_updates(&batch).unwrap_err();
    assert!(err.to_string().contains("unknown fixture 99"));
    assert_eq!(store.load().unwrap(), season);

    let _ = fs::remove_file(&path);
}

#[test]
fn memory_store_keeps_non_empty_batches() {
    let mut store = MemoryStore::new(
        JsonFileStore::new(fixture_path("season_sample.json"))
            .load()
            .unwrap(),
    );
    store.apply_updates(&UpdateBatch::new()).unwrap();
    assert!(store.batches.is_empty());

    let mut first = UpdateBatch::new();
    first.set_match_field(3, MatchField::Hora, "18:00");
    let mut second = UpdateBatch::new();
    second.set_match_field(3, MatchField::Hora, "20:30");
    store.apply_updates(&first).unwrap();
    store.apply_updates(&second).unwrap();

    assert_eq!(store.batches.len(), 2);
    assert_eq!(store.merged().match_field(3, MatchField::Hora), Some("20:30"));
    assert_eq!(store.season.matches[3].hora, "20:30");
}

#[test]
fn sqlite_store_imports_and_updates_in_place() {
    let season = JsonFileStore::new(fixture_path("season_sample.json"))
        .load()
        .unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.import(&season).unwrap();
    assert_eq!(store.load().unwrap(), season);

    let mut batch = UpdateBatch::new();
    batch.set_match_field(0, MatchField::GolLocal, "");
    batch.set_match_field(3, MatchField::Local, "Tigres");
    batch.set_match_field(3, MatchField::Visitante, "Halcones");
    batch.set_eliminated("Toros", true);
    store.apply_updates(&batch).unwrap();

    let first = store.fixture(0).unwrap().expect("fixture 0");
    assert_eq!(first.gol_local, None);
    assert_eq!(first.gol_visitante, Some(1));
    let swapped = store.fixture(3).unwrap().expect("fixture 3");
    assert_eq!((swapped.local.as_str(), swapped.visitante.as_str()), ("Tigres", "Halcones"));
    assert_eq!(store.eliminated("Toros").unwrap(), Some(true));
    assert_eq!(store.eliminated("Pumas").unwrap(), None);
    assert_eq!(store.load().unwrap().teams, season.teams);
}

#[test]
fn team_names_with_slashes_survive_every_store() {
    let mut batch = UpdateBatch::new();
    batch.set_eliminated("Club 1/B", true);
    batch.set_eliminated("100% Futbol", false);

    let mut memory = MemoryStore::default();
    memory.apply_updates(&batch).unwrap();
    assert_eq!(memory.season.eliminados.get("Club 1/B"), Some(&true));
    assert_eq!(memory.season.eliminados.get("100% Futbol"), Some(&false));

    let mut sqlite = SqliteStore::open_in_memory().unwrap();
    sqlite.apply_updates(&batch).unwrap();
    assert_eq!(sqlite.eliminated("Club 1/B").unwrap(), Some(true));
    assert_eq!(sqlite.eliminated("100% Futbol").unwrap(), Some(false));
}

#[test]
fn sqlite_store_rolls_back_a_failed_batch() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let season = liga_playoffs::model::Season {
        teams: vec!["A".to_string(), "B".to_string()],
        matches: vec![Match::new(153, 18, "", "")],
        ..Default::default()
    };
    store.import(&season).unwrap();

    let mut batch = UpdateBatch::new();
    batch.set_match_field(153, MatchField::Local, "A");
    batch.set_match_field(999, MatchField::Local, "B");
    assert!(store.apply_updates(&batch).is_err());
    assert_eq!(store.fixture(153).unwrap().unwrap().local, "");
}

#[test]
fn non_text_team_name_is_rejected() {
    let mut store = MemoryStore::default();
    let mut batch = UpdateBatch::new();
    batch.set_match_field(1, MatchField::Local, serde_json::json!(5));
    store.season.matches.push(Match::new(1, 1, "A", "B"));
    assert!(store.apply_updates(&batch).is_err());
    assert_eq!(store.season.matches[0].local, "A");
}
