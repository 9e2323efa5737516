/// Single game between two table rows, hosted by `local_row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayInTie {
    pub name: &'static str,
    pub local_row: usize,
    pub visitante_row: usize,
    pub fixture: u32,
}

/// Home-and-away tie between two seeds. Seeds index the non-eliminated table rows; the
/// visitante seed hosts the first leg and the local seed hosts the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoLegTie {
    pub name: &'static str,
    pub local_seed: usize,
    pub visitante_seed: usize,
    pub first_leg: u32,
    pub second_leg: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketLayout {
    pub play_in_1: PlayInTie,
    pub play_in_2: PlayInTie,
    /// Play-in 1 loser hosts play-in 2 winner.
    pub play_off_3: u32,
    pub quarterfinals: [TwoLegTie; 4],
    pub semifinals: [TwoLegTie; 2],
    pub final_tie: TwoLegTie,
}

const fn two_legs(name: &'static str, local_seed: usize, visitante_seed: usize, first_leg: u32) -> TwoLegTie {
    TwoLegTie {
        name,
        local_seed,
        visitante_seed,
        first_leg,
        second_leg: first_leg + 1,
    }
}

// 18 teams, 17 jornadas of 9 games: fixtures 0..=152 are the regular season.
pub const BRACKET: BracketLayout = BracketLayout {
    play_in_1: PlayInTie {
        name: "Play-in 1",
        local_row: 6,
        visitante_row: 7,
        fixture: 153,
    },
    play_in_2: PlayInTie {
        name: "Play-in 2",
        local_row: 8,
        visitante_row: 9,
        fixture: 154,
    },
    play_off_3: 155,
    quarterfinals: [
        two_legs("Quarterfinal 1", 0, 7, 156),
        two_legs("Quarterfinal 2", 1, 6, 158),
        two_legs("Quarterfinal 3", 2, 5, 160),
        two_legs("Quarterfinal 4", 3, 4, 162),
    ],
    semifinals: [
        two_legs("Semifinal 1", 0, 3, 164),
        two_legs("Semifinal 2", 1, 2, 166),
    ],
    final_tie: two_legs("Final", 0, 1, 168),
};

impl BracketLayout {
    /// Table rows the play-in reads directly.
    pub fn min_table_rows(&self) -> usize {
        [
            self.play_in_1.local_row,
            self.play_in_1.visitante_row,
            self.play_in_2.local_row,
            self.play_in_2.visitante_row,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    pub fn quarterfinal_seeds(&self) -> usize {
        seeds_needed(&self.quarterfinals)
    }

    pub fn semifinal_seeds(&self) -> usize {
        seeds_needed(&self.semifinals)
    }

    pub fn final_seeds(&self) -> usize {
        seeds_needed(std::slice::from_ref(&self.final_tie))
    }

    /// Every playoff fixture id, in bracket order.
    pub fn fixture_ids(&self) -> Vec<u32> {
        let mut ids = vec![self.play_in_1.fixture, self.play_in_2.fixture, self.play_off_3];
        for tie in self
            .quarterfinals
            .iter()
            .chain(self.semifinals.iter())
            .chain(std::iter::once(&self.final_tie))
        {
            ids.push(tie.first_leg);
            ids.push(tie.second_leg);
        }
        ids
    }

    /// Fixtures grouped by the week they are played in: both play-in games, play-off 3, then
    /// each leg of each round.
    pub fn play_order(&self) -> Vec<Vec<u32>> {
        let mut out = vec![
            vec![self.play_in_1.fixture, self.play_in_2.fixture],
            vec![self.play_off_3],
        ];
        for ties in [
            self.quarterfinals.as_slice(),
            self.semifinals.as_slice(),
            std::slice::from_ref(&self.final_tie),
        ] {
            out.push(ties.iter().map(|t| t.first_leg).collect());
            out.push(ties.iter().map(|t| t.second_leg).collect());
        }
        out
    }

    /// Play-in games and play-off 3, decided on the day.
    pub fn is_single_game(&self, id_match: u32) -> bool {
        [self.play_in_1.fixture, self.play_in_2.fixture, self.play_off_3].contains(&id_match)
    }

    /// First leg of the tie whose second leg is `id_match`.
    pub fn first_leg_of(&self, id_match: u32) -> Option<u32> {
        self.quarterfinals
            .iter()
            .chain(self.semifinals.iter())
            .chain(std::iter::once(&self.final_tie))
            .find(|tie| tie.second_leg == id_match)
            .map(|tie| tie.first_leg)
    }

    pub fn first_fixture(&self) -> u32 {
        self.play_in_1.fixture
    }

    /// Human label for a playoff fixture id.
    pub fn fixture_label(&self, id_match: u32) -> Option<String> {
        if id_match == self.play_in_1.fixture {
            return Some(self.play_in_1.name.to_string());
        }
        if id_match == self.play_in_2.fixture {
            return Some(self.play_in_2.name.to_string());
        }
        if id_match == self.play_off_3 {
            return Some("Play-off 3".to_string());
        }
        self.quarterfinals
            .iter()
            .chain(self.semifinals.iter())
            .chain(std::iter::once(&self.final_tie))
            .find_map(|tie| {
                if id_match == tie.first_leg {
                    Some(format!("{} (leg 1)", tie.name))
                } else if id_match == tie.second_leg {
                    Some(format!("{} (leg 2)", tie.name))
                } else {
                    None
                }
            })
    }
}

fn seeds_needed(ties: &[TwoLegTie]) -> usize {
    ties.iter()
        .map(|t| t.local_seed.max(t.visitante_seed) + 1)
        .max()
        .unwrap_or(0)
}
