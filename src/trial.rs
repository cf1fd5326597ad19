// src/trial.rs
//
// A trial is one full episode: place the target, then run rounds until a
// search finds it. The loop has no intrinsic bound; `max_rounds` lets a
// caller cap it, in which case the trial ends as exhausted.

use rand::Rng;

use crate::config::SearchSpace;
use crate::error::SearchError;
use crate::policy::Policy;
use crate::round::{RoundReport, SearchRound};
use crate::state::{SearchState, Target};
use crate::types::{Allocation, RegionId};

/// Terminal state of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Target found in `region` during round `rounds` (1-based).
    Found { rounds: u32, region: RegionId },
    /// Round cap reached without a find.
    Exhausted { rounds: u32 },
}

impl TrialOutcome {
    pub fn rounds(&self) -> u32 {
        match *self {
            TrialOutcome::Found { rounds, .. } | TrialOutcome::Exhausted { rounds } => rounds,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, TrialOutcome::Found { .. })
    }
}

/// Live trial: exclusive owner of its `SearchState`.
#[derive(Debug, Clone)]
pub struct Trial<'a> {
    round: SearchRound<'a>,
    state: SearchState,
    rounds_played: u32,
    found: Option<RegionId>,
}

impl<'a> Trial<'a> {
    /// Fresh state with a freshly placed target.
    pub fn start<R: Rng + ?Sized>(space: &'a SearchSpace, rng: &mut R) -> Self {
        Self::with_state(space, SearchState::start(space, rng))
    }

    /// Trial over a prepared state (the target must already be placed).
    pub fn with_state(space: &'a SearchSpace, state: SearchState) -> Self {
        Self {
            round: SearchRound::new(space),
            state,
            rounds_played: 0,
            found: None,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn target(&self) -> Option<Target> {
        self.state.target()
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn is_found(&self) -> bool {
        self.found.is_some()
    }

    /// Play the next round with `policy` choosing the allocation.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        policy: &dyn Policy,
        rng: &mut R,
    ) -> Result<RoundReport, SearchError> {
        let report = self
            .round
            .run(self.rounds_played + 1, &mut self.state, policy, rng)?;
        self.record(&report);
        Ok(report)
    }

    /// Play the next round with a fixed allocation (interactive play).
    pub fn step_with<R: Rng + ?Sized>(
        &mut self,
        allocation: Allocation,
        rng: &mut R,
    ) -> Result<RoundReport, SearchError> {
        self.state
            .sample_effectiveness(self.round.space().config().effectiveness, rng);
        let report = self
            .round
            .run_allocation(self.rounds_played + 1, &mut self.state, allocation, rng)?;
        self.record(&report);
        Ok(report)
    }

    fn record(&mut self, report: &RoundReport) {
        self.rounds_played = report.round;
        if self.found.is_none() {
            self.found = report.found_in();
        }
    }

    /// Run rounds until found, or until `max_rounds` rounds have been played.
    pub fn run<R: Rng + ?Sized>(
        mut self,
        policy: &dyn Policy,
        max_rounds: Option<u32>,
        rng: &mut R,
    ) -> Result<TrialOutcome, SearchError> {
        loop {
            if let Some(region) = self.found {
                return Ok(TrialOutcome::Found {
                    rounds: self.rounds_played,
                    region,
                });
            }
            if max_rounds.is_some_and(|cap| self.rounds_played >= cap) {
                return Ok(TrialOutcome::Exhausted {
                    rounds: self.rounds_played,
                });
            }

            let report = self.step(policy, rng)?;
            tracing::trace!(
                round = report.round,
                found = report.found(),
                beliefs = ?report.beliefs,
                "round complete"
            );
        }
    }
}

/// Run one complete trial with a fresh state.
pub fn run_trial<R: Rng + ?Sized>(
    space: &SearchSpace,
    policy: &dyn Policy,
    max_rounds: Option<u32>,
    rng: &mut R,
) -> Result<TrialOutcome, SearchError> {
    Trial::start(space, rng).run(policy, max_rounds, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::policy::{FixedTwice, SplitTopTwo, TwiceHighestBelief};
    use crate::types::Cell;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_space() -> SearchSpace {
        SearchSpace::new(SearchConfig::from_grids(
            &[(4, 4), (4, 4), (4, 4)],
            &[0.2, 0.5, 0.3],
        ))
        .unwrap()
    }

    #[test]
    fn trial_ends_found_with_positive_round() {
        let space = small_space();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for policy in [&TwiceHighestBelief as &dyn Policy, &SplitTopTwo] {
            let out = run_trial(&space, policy, Some(10_000), &mut rng).unwrap();
            assert!(out.is_found(), "{} did not find the target", policy.name());
            assert!(out.rounds() >= 1);
        }
    }

    #[test]
    fn fixed_policy_on_empty_region_exhausts() {
        let space = small_space();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut state = SearchState::initialize(&space);
        state.set_target(Target {
            region: RegionId(1),
            cell: Cell::new(0, 0),
        });

        let out = Trial::with_state(&space, state)
            .run(&FixedTwice::new(RegionId(3)), Some(25), &mut rng)
            .unwrap();
        assert_eq!(out, TrialOutcome::Exhausted { rounds: 25 });
    }

    #[test]
    fn found_region_matches_target() {
        let space = small_space();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let trial = Trial::start(&space, &mut rng);
        let target = trial.target().unwrap();
        match trial.run(&SplitTopTwo, None, &mut rng).unwrap() {
            TrialOutcome::Found { region, .. } => assert_eq!(region, target.region),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn same_seed_same_outcome() {
        let space = small_space();
        let a = run_trial(&space, &TwiceHighestBelief, None, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        let b = run_trial(&space, &TwiceHighestBelief, None, &mut ChaCha8Rng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }
}
