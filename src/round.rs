// src/round.rs
//
// One search round:
//   sample effectiveness -> policy allocation -> search each allocated
//   region -> combine double passes -> Bayesian revision.
//
// Regions the allocation does not touch get effectiveness 0 for the
// revision, so they gain (never lose) belief mass.

use rand::Rng;

use crate::belief;
use crate::config::SearchSpace;
use crate::error::SearchError;
use crate::outcome::{Coverage, OutcomeModel};
use crate::policy::{Policy, PolicyView};
use crate::state::SearchState;
use crate::types::{Allocation, RegionId, SearchPass};

/// Outcome of searching one region in a round.
#[derive(Debug, Clone)]
pub struct RegionSearchResult {
    pub region: RegionId,
    pub passes: SearchPass,
    /// Effectiveness used in the revision (combined for double passes).
    pub effectiveness: f64,
    /// Cells covered by all passes.
    pub coverage: Coverage,
    /// Found flag of each pass, in pass order.
    pub pass_found: Vec<bool>,
}

impl RegionSearchResult {
    pub fn found(&self) -> bool {
        self.pass_found.iter().any(|f| *f)
    }

    /// Human-readable label of each pass.
    pub fn pass_labels(&self) -> Vec<String> {
        self.pass_found
            .iter()
            .map(|&found| outcome_label(self.region, found))
            .collect()
    }
}

/// "Found in area N." or "Not found."
pub fn outcome_label(region: RegionId, found: bool) -> String {
    if found {
        format!("Found in area {region}.")
    } else {
        "Not found.".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct RoundReport {
    /// 1-based round number.
    pub round: u32,
    pub allocation: Allocation,
    /// Effectiveness drawn for every region before the allocation.
    pub sampled_effectiveness: Vec<f64>,
    /// Effectiveness applied in the revision (0 for untouched regions).
    pub applied_effectiveness: Vec<f64>,
    pub results: Vec<RegionSearchResult>,
    /// Beliefs after the revision.
    pub beliefs: Vec<f64>,
}

impl RoundReport {
    pub fn found(&self) -> bool {
        self.results.iter().any(|r| r.found())
    }

    /// Region that produced the find, if any.
    pub fn found_in(&self) -> Option<RegionId> {
        self.results.iter().find(|r| r.found()).map(|r| r.region)
    }
}

/// Executes rounds against a shared search space.
#[derive(Debug, Clone, Copy)]
pub struct SearchRound<'a> {
    space: &'a SearchSpace,
    model: OutcomeModel,
}

impl<'a> SearchRound<'a> {
    pub fn new(space: &'a SearchSpace) -> Self {
        Self {
            space,
            model: OutcomeModel::new(space.config().combined_coverage),
        }
    }

    pub fn space(&self) -> &'a SearchSpace {
        self.space
    }

    /// Run one round with `policy` deciding the allocation.
    pub fn run<R: Rng + ?Sized>(
        &self,
        round: u32,
        state: &mut SearchState,
        policy: &dyn Policy,
        rng: &mut R,
    ) -> Result<RoundReport, SearchError> {
        state.sample_effectiveness(self.space.config().effectiveness, rng);

        let allocation = policy.allocate(&PolicyView {
            beliefs: state.beliefs(),
            effectiveness: state.effectiveness(),
        })?;

        self.run_allocation(round, state, allocation, rng)
    }

    /// Run one round with a fixed allocation, using the effectiveness
    /// already sampled into `state`.
    pub fn run_allocation<R: Rng + ?Sized>(
        &self,
        round: u32,
        state: &mut SearchState,
        allocation: Allocation,
        rng: &mut R,
    ) -> Result<RoundReport, SearchError> {
        allocation.validate(state.num_regions())?;

        let sampled = state.effectiveness().to_vec();
        let target = state.target();
        let mut applied = vec![0.0; sampled.len()];
        let mut results = Vec::with_capacity(allocation.searches.len());

        for &(region, passes) in &allocation.searches {
            let grid = self.space.grid(region);
            let e = sampled[region.index()];

            let result = match passes {
                SearchPass::Once => {
                    let pass = self.model.search_once(region, grid, e, target, rng);
                    RegionSearchResult {
                        region,
                        passes,
                        effectiveness: e,
                        coverage: pass.coverage,
                        pass_found: vec![pass.found],
                    }
                }
                SearchPass::Twice => {
                    let double = self.model.search_twice(region, grid, e, target, rng);
                    RegionSearchResult {
                        region,
                        passes,
                        effectiveness: double.combined_effectiveness,
                        pass_found: vec![double.first.found, double.second.found],
                        coverage: double.union,
                    }
                }
            };

            applied[region.index()] = result.effectiveness;
            results.push(result);
        }

        state.set_effectiveness(applied.clone());
        belief::revise(state.beliefs_mut(), &applied)?;

        Ok(RoundReport {
            round,
            allocation,
            sampled_effectiveness: sampled,
            applied_effectiveness: applied,
            results,
            beliefs: state.beliefs().to_vec(),
        })
    }
}
