use crate::config::SeasonConfig;
use crate::model::{Match, TableEntry};

/// Build the league table from scratch.
///
/// Only final regular-season matches count; playoff fixtures share the store but sit past
/// `regular_season_rounds`. Rows are ordered by points, goal difference and goals for, with
/// remaining ties left in `teams` order. Rows outside the playoff zone start out eliminated.
pub fn calculate_table(teams: &[String], matches: &[Match], cfg: &SeasonConfig) -> Vec<TableEntry> {
    let mut table: Vec<TableEntry> = teams
        .iter()
        .map(|team| team_row(team, matches, cfg.regular_season_rounds))
        .collect();

    // `sort_by` is stable, which keeps input order for full ties.
    table.sort_by(|a, b| {
        b.pts
            .cmp(&a.pts)
            .then(b.dg.cmp(&a.dg))
            .then(b.gf.cmp(&a.gf))
    });

    for row in table.iter_mut().skip(cfg.playoff_zone) {
        row.eliminado = true;
    }
    table
}

fn team_row(team: &str, matches: &[Match], rounds: u32) -> TableEntry {
    let mut row = TableEntry::new(team);
    for m in matches.iter().filter(|m| m.jornada <= rounds) {
        let Some((scored, conceded)) = m.goals_for(team) else {
            continue;
        };
        if scored > conceded {
            row.jg += 1;
        } else if scored == conceded {
            row.je += 1;
        } else {
            row.jp += 1;
        }
        row.gf += scored;
        row.gc += conceded;
    }
    row.jj = row.jg + row.je + row.jp;
    row.pts = row.jg * 3 + row.je;
    row.dg = row.gf as i32 - row.gc as i32;
    row
}

/// First fixture in which `team` plays at home; the store has no separate stadium field.
pub fn home_venue<'a>(team: &str, matches: &'a [Match]) -> Option<&'a str> {
    matches
        .iter()
        .find(|m| m.local == team)
        .map(|m| m.estadio.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playoff_fixtures_do_not_count() {
        let teams = vec!["A".to_string(), "B".to_string()];
        let matches = vec![
            Match::new(0, 17, "A", "B").with_score(1, 0),
            Match::new(153, 18, "B", "A").with_score(5, 0),
        ];
        let table = calculate_table(&teams, &matches, &SeasonConfig::default());
        assert_eq!(table[0].equipo, "A");
        assert_eq!(table[0].pts, 3);
        assert_eq!(table[1].gf, 0);
    }

    #[test]
    fn home_venue_uses_first_home_fixture() {
        let matches = vec![
            Match::new(0, 1, "B", "A").with_venue("Stadium B"),
            Match::new(1, 2, "A", "B").with_venue("Stadium A"),
            Match::new(2, 3, "A", "C").with_venue("Elsewhere"),
        ];
        assert_eq!(home_venue("A", &matches), Some("Stadium A"));
        assert_eq!(home_venue("C", &matches), None);
    }
}
