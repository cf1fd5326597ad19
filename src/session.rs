// src/session.rs
//
// Interactive mission driver: a numbered menu over the round primitives.
//
// Menu numbering for N regions:
//   0                exit
//   1..=N            search region i twice
//   N+1..            search one pair of regions once each (pairs in
//                    lexicographic order)
//   last             start over with a new target
//
// For the three-area map this gives 1-3 twice, 4 = 1&2, 5 = 1&3, 6 = 2&3,
// 7 = start over. No I/O happens here; `main.rs` owns stdin/stdout.

use std::fmt::Write as _;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SearchSpace;
use crate::error::SearchError;
use crate::round::RoundReport;
use crate::state::Target;
use crate::trial::Trial;
use crate::types::{Allocation, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    Twice(RegionId),
    Split(RegionId, RegionId),
    Restart,
}

impl MenuChoice {
    pub fn label(&self) -> String {
        match self {
            MenuChoice::Exit => "Exit the program".to_string(),
            MenuChoice::Twice(r) => format!("Search area {r} twice"),
            MenuChoice::Split(a, b) => format!("Search areas {a} & {b}"),
            MenuChoice::Restart => "Start all over again".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Menu {
    entries: Vec<MenuChoice>,
}

impl Menu {
    pub fn for_regions(n: usize) -> Self {
        let mut entries = vec![MenuChoice::Exit];
        entries.extend((0..n).map(|i| MenuChoice::Twice(RegionId::from_index(i))));
        for a in 0..n {
            for b in a + 1..n {
                entries.push(MenuChoice::Split(
                    RegionId::from_index(a),
                    RegionId::from_index(b),
                ));
            }
        }
        entries.push(MenuChoice::Restart);
        Self { entries }
    }

    pub fn entries(&self) -> &[MenuChoice] {
        &self.entries
    }

    /// Parse a typed menu number.
    pub fn parse(&self, input: &str) -> Option<MenuChoice> {
        let n: usize = input.trim().parse().ok()?;
        self.entries.get(n).copied()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Select the next areas to search:\n");
        for (i, choice) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "    {i} - {}", choice.label());
        }
        out
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Exit,
    /// A new mission started with a freshly placed target.
    Restarted { target: Target },
    Searched(RoundReport),
    /// The target was already found; only restart or exit are accepted.
    MissionOver,
}

pub struct Session<'a> {
    space: &'a SearchSpace,
    menu: Menu,
    rng: ChaCha8Rng,
    trial: Trial<'a>,
    missions: u32,
}

impl<'a> Session<'a> {
    pub fn new(space: &'a SearchSpace, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let trial = Trial::start(space, &mut rng);
        Self {
            space,
            menu: Menu::for_regions(space.num_regions()),
            rng,
            trial,
            missions: 1,
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn trial(&self) -> &Trial<'a> {
        &self.trial
    }

    pub fn missions(&self) -> u32 {
        self.missions
    }

    /// Next round number to be played.
    pub fn next_round(&self) -> u32 {
        self.trial.rounds_played() + 1
    }

    /// Map coordinate of the hidden target.
    pub fn target_map_position(&self) -> Option<(u32, u32)> {
        let t = self.trial.target()?;
        Some(self.space.region(t.region).corners.to_map(t.cell))
    }

    pub fn apply(&mut self, choice: MenuChoice) -> Result<SessionEvent, SearchError> {
        let allocation = match choice {
            MenuChoice::Exit => return Ok(SessionEvent::Exit),
            MenuChoice::Restart => {
                self.trial = Trial::start(self.space, &mut self.rng);
                self.missions += 1;
                let target = self
                    .trial
                    .target()
                    .ok_or_else(|| SearchError::config("restart did not place a target"))?;
                tracing::debug!(mission = self.missions, "mission restarted");
                return Ok(SessionEvent::Restarted { target });
            }
            MenuChoice::Twice(r) => Allocation::twice(r),
            MenuChoice::Split(a, b) => Allocation::split(a, b),
        };

        if self.trial.is_found() {
            return Ok(SessionEvent::MissionOver);
        }

        let report = self.trial.step_with(allocation, &mut self.rng)?;
        Ok(SessionEvent::Searched(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;

    #[test]
    fn three_region_menu_matches_classic_numbering() {
        let m = Menu::for_regions(3);
        assert_eq!(m.entries().len(), 8);
        assert_eq!(m.parse("0"), Some(MenuChoice::Exit));
        assert_eq!(m.parse("2"), Some(MenuChoice::Twice(RegionId(2))));
        assert_eq!(m.parse("4"), Some(MenuChoice::Split(RegionId(1), RegionId(2))));
        assert_eq!(m.parse("5"), Some(MenuChoice::Split(RegionId(1), RegionId(3))));
        assert_eq!(m.parse(" 6 "), Some(MenuChoice::Split(RegionId(2), RegionId(3))));
        assert_eq!(m.parse("7"), Some(MenuChoice::Restart));
        assert_eq!(m.parse("8"), None);
        assert_eq!(m.parse("x"), None);
        assert!(m.render().contains("4 - Search areas 1 & 2"));
    }

    #[test]
    fn session_plays_until_found_then_requires_restart() {
        let space = SearchSpace::new(SearchConfig::from_grids(&[(3, 3), (3, 3)], &[0.5, 0.5])).unwrap();
        let mut session = Session::new(&space, 17);
        let target = session.trial().target().unwrap();

        let (x, y) = session.target_map_position().unwrap();
        let corners = space.region(target.region).corners;
        assert!(x >= corners.ul_x && x < corners.lr_x && y >= corners.ul_y && y < corners.lr_y);

        let mut rounds = 0;
        loop {
            match session.apply(MenuChoice::Twice(target.region)).unwrap() {
                SessionEvent::Searched(report) => {
                    rounds += 1;
                    assert_eq!(report.round, rounds);
                    if report.found() {
                        break;
                    }
                }
                other => panic!("unexpected event {other:?}"),
            }
            assert!(rounds < 1000);
        }

        assert!(matches!(
            session.apply(MenuChoice::Split(RegionId(1), RegionId(2))).unwrap(),
            SessionEvent::MissionOver
        ));
        assert!(matches!(
            session.apply(MenuChoice::Restart).unwrap(),
            SessionEvent::Restarted { .. }
        ));
        assert_eq!(session.missions(), 2);
        assert_eq!(session.next_round(), 1);
        assert!(matches!(session.apply(MenuChoice::Exit).unwrap(), SessionEvent::Exit));
    }
}
