use liga_playoffs::config::{DEFAULT_REGULAR_SEASON_ROUNDS, SeasonConfig};
use liga_playoffs::model::{Match, TableEntry};
use liga_playoffs::season::round_robin;
use liga_playoffs::standings::calculate_table;
use liga_playoffs::zones::{Zone, classify_zone, classify_zones};

fn teams() -> Vec<String> {
    (1..=18).map(|i| format!("T{i:02}")).collect()
}

// Round robin where the better-named side always wins 1-0, so T01 finishes first and T18 last.
fn ranked_matches(through_jornada: u32) -> Vec<Match> {
    round_robin(&teams())
        .into_iter()
        .enumerate()
        .map(|(id, p)| {
            let m = Match::new(id as u32, p.jornada, &p.local, &p.visitante);
            if p.jornada > through_jornada {
                m
            } else if p.local < p.visitante {
                m.with_score(1, 0)
            } else {
                m.with_score(0, 1)
            }
        })
        .collect()
}

#[test]
fn finished_season_splits_into_three_zones() {
    let table = calculate_table(&teams(), &ranked_matches(17), &SeasonConfig::default());
    assert_eq!(table[0].equipo, "T01");
    assert_eq!(table[0].pts, 51);
    let zones = classify_zones(&table, DEFAULT_REGULAR_SEASON_ROUNDS);
    assert_eq!(zones.len(), 18);
    for (idx, zone) in zones.iter().enumerate() {
        let expected = match idx {
            0..=5 => Zone::Qualified,
            6..=9 => Zone::PlayIn,
            _ => Zone::Eliminated,
        };
        assert_eq!(*zone, Some(expected), "row {idx}");
    }
}

#[test]
fn early_season_leaves_every_zone_open() {
    let table = calculate_table(&teams(), &ranked_matches(1), &SeasonConfig::default());
    let zones = classify_zones(&table, DEFAULT_REGULAR_SEASON_ROUNDS);
    assert!(zones.iter().all(Option::is_none));
}

#[test]
fn leader_out_of_reach_is_qualified_mid_season() {
    let mut table: Vec<TableEntry> = teams().iter().map(|t| TableEntry::new(t)).collect();
    for row in table.iter_mut() {
        row.jj = 10;
    }
    // Seventh place can reach at most 21 + 7 * 3 = 42, not enough to pass 43.
    table[0].pts = 43;
    table[6].pts = 21;
    assert_eq!(classify_zone(&table, 0, 17), Some(Zone::Qualified));
    assert_eq!(classify_zone(&table, 3, 17), None);
}

// Rows as (points, games played), already in table order.
fn table_of(rows: &[(u32, u32)]) -> Vec<TableEntry> {
    rows.iter()
        .enumerate()
        .map(|(i, &(pts, jj))| {
            let mut row = TableEntry::new(&format!("T{:02}", i + 1));
            row.pts = pts;
            row.jj = jj;
            row
        })
        .collect()
}

#[test]
fn play_in_is_secured_once_eleventh_cannot_catch_up() {
    let table = table_of(&[
        (60, 12),
        (58, 12),
        (56, 12),
        (54, 12),
        (52, 12),
        (50, 12),
        (38, 12),
        (40, 12),
        (30, 12),
        (30, 12),
        (20, 12),
        (10, 12),
    ]);
    // Seventh can still reach 53, eleventh tops out at 35.
    assert_eq!(classify_zone(&table, 7, 17), Some(Zone::PlayIn));
    // Sixth is out of eleventh's reach but seventh can still pass it.
    assert_eq!(classify_zone(&table, 5, 17), Some(Zone::PlayIn));
    assert_eq!(classify_zone(&table, 0, 17), Some(Zone::Qualified));
    assert_eq!(classify_zone(&table, 8, 17), None);
}

#[test]
fn eliminated_once_tenth_is_out_of_reach() {
    let table = table_of(&[
        (40, 12),
        (39, 12),
        (38, 12),
        (37, 12),
        (36, 12),
        (35, 12),
        (34, 12),
        (33, 12),
        (32, 12),
        (30, 12),
        (20, 12),
        (10, 12),
    ]);
    // 10 + 5 * 3 = 25 < 30.
    assert_eq!(classify_zone(&table, 11, 17), Some(Zone::Eliminated));
    // 20 + 15 = 35 can still pass tenth.
    assert_eq!(classify_zone(&table, 10, 17), None);
}

#[test]
fn tenth_is_never_eliminated_by_its_own_points() {
    let table = table_of(&[
        (40, 17),
        (38, 17),
        (36, 17),
        (34, 17),
        (32, 17),
        (31, 17),
        (30, 17),
        (28, 17),
        (25, 17),
        (25, 17),
        (24, 16),
        (10, 17),
    ]);
    // Eleventh can still reach 27, so tenth is not safe either.
    assert_eq!(classify_zone(&table, 9, 17), None);
    // A finished row level with tenth but above it reads as out.
    assert_eq!(classify_zone(&table, 8, 17), Some(Zone::Eliminated));
}

#[test]
fn finished_seventh_only_qualifies_the_top_six() {
    let table = table_of(&[
        (40, 17),
        (38, 17),
        (36, 17),
        (34, 17),
        (32, 17),
        (30, 17),
        (30, 17),
        (30, 17),
        (29, 17),
        (28, 17),
        (20, 17),
        (20, 17),
    ]);
    assert_eq!(classify_zone(&table, 5, 17), Some(Zone::Qualified));
    // Level with seventh, but seventh and below still go through the play-in.
    assert_eq!(classify_zone(&table, 6, 17), Some(Zone::PlayIn));
    assert_eq!(classify_zone(&table, 7, 17), Some(Zone::PlayIn));
    assert_eq!(classify_zone(&table, 9, 17), Some(Zone::PlayIn));
    // Eleventh and below never read the play-in through eleventh's own finish.
    assert_eq!(classify_zone(&table, 10, 17), Some(Zone::Eliminated));
    assert_eq!(classify_zone(&table, 11, 17), Some(Zone::Eliminated));
}

#[test]
fn short_tables_have_no_zones() {
    let table: Vec<TableEntry> = (1..=11).map(|i| TableEntry::new(&format!("T{i}"))).collect();
    assert!(classify_zone(&table[..10], 0, 17).is_none());
    assert!(classify_zone(&table, 11, 17).is_none());
}

#[test]
fn zone_labels_match_serialized_names() {
    for zone in [Zone::Qualified, Zone::PlayIn, Zone::Eliminated] {
        let json = serde_json::to_string(&zone).unwrap();
        assert_eq!(json, format!("\"{}\"", zone.label()));
    }
}
