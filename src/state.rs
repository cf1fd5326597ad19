// src/state.rs
//
// Per-trial mutable state: belief probabilities, the round's sampled search
// effectiveness, and the hidden target. Owned by exactly one trial; the
// shared, read-only inputs live in `SearchSpace`.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::config::{EffectivenessRange, SearchSpace, TargetPlacement, PRIOR_SUM_TOLERANCE};
use crate::error::SearchError;
use crate::types::{Cell, RegionId};

/// Ground truth for one trial: the region holding the target and its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub region: RegionId,
    pub cell: Cell,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    /// P(target in region i), indexed by `RegionId::index()`. Sums to 1.
    beliefs: Vec<f64>,
    /// Effectiveness per region for the current round.
    effectiveness: Vec<f64>,
    /// Hidden target; set once by `place_target`.
    target: Option<Target>,
}

impl SearchState {
    /// Fresh state from the configured priors, with zeroed effectiveness and
    /// no target yet.
    pub fn initialize(space: &SearchSpace) -> Self {
        let beliefs = space.config().priors();
        let n = beliefs.len();
        Self {
            beliefs,
            effectiveness: vec![0.0; n],
            target: None,
        }
    }

    /// Fresh state from explicit priors.
    pub fn from_priors(priors: Vec<f64>) -> Result<Self, SearchError> {
        if priors.is_empty() {
            return Err(SearchError::config("no regions"));
        }
        if priors.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(SearchError::config("priors must be finite and non-negative"));
        }
        let sum: f64 = priors.iter().sum();
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(SearchError::config(format!(
                "priors must sum to 1, got {sum}"
            )));
        }
        let n = priors.len();
        Ok(Self {
            beliefs: priors,
            effectiveness: vec![0.0; n],
            target: None,
        })
    }

    /// Initialize and place the target in one step (start of a trial).
    pub fn start<R: Rng + ?Sized>(space: &SearchSpace, rng: &mut R) -> Self {
        let mut state = Self::initialize(space);
        state.place_target(space, rng);
        state
    }

    pub fn num_regions(&self) -> usize {
        self.beliefs.len()
    }

    pub fn beliefs(&self) -> &[f64] {
        &self.beliefs
    }

    pub fn beliefs_mut(&mut self) -> &mut [f64] {
        &mut self.beliefs
    }

    pub fn belief(&self, region: RegionId) -> f64 {
        self.beliefs[region.index()]
    }

    pub fn effectiveness(&self) -> &[f64] {
        &self.effectiveness
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    pub(crate) fn set_effectiveness(&mut self, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.beliefs.len());
        self.effectiveness = values;
    }

    /// Draw the hidden target's region and cell.
    ///
    /// With `TargetPlacement::Triangular` the region comes from a triangular
    /// draw over [1, N+1) truncated to an integer, which favours the middle
    /// indices regardless of the priors. `TargetPlacement::Priors` draws by
    /// the prior weights instead. The cell is uniform over the region grid.
    pub fn place_target<R: Rng + ?Sized>(&mut self, space: &SearchSpace, rng: &mut R) -> Target {
        let n = space.num_regions();
        let region = match space.config().placement {
            TargetPlacement::Triangular => triangular_region(n, rng),
            TargetPlacement::Priors => weighted_region(&space.config().priors(), rng)
                .unwrap_or_else(|| triangular_region(n, rng)),
        };

        let grid = space.grid(region);
        let cell = Cell::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));

        let target = Target { region, cell };
        self.target = Some(target);
        target
    }

    /// Overwrite the target (fixtures and replays).
    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    /// Draw this round's effectiveness for every region, uniform in the range.
    pub fn sample_effectiveness<R: Rng + ?Sized>(&mut self, range: EffectivenessRange, rng: &mut R) {
        for e in self.effectiveness.iter_mut() {
            *e = rng.gen_range(range.min..=range.max);
        }
    }

    /// Region with the highest belief. Ties go to the lowest region id.
    pub fn most_likely(&self) -> RegionId {
        let mut best = 0;
        for (i, p) in self.beliefs.iter().enumerate() {
            if *p > self.beliefs[best] {
                best = i;
            }
        }
        RegionId::from_index(best)
    }
}

/// Triangular draw over [1, n+1) with the mode in the middle, truncated.
pub fn triangular_region<R: Rng + ?Sized>(n: usize, rng: &mut R) -> RegionId {
    let low = 1.0;
    let high = n as f64 + 1.0;
    let c = 0.5;
    let u: f64 = rng.gen();
    let x = if u > c {
        high + (low - high) * ((1.0 - u) * (1.0 - c)).sqrt()
    } else {
        low + (high - low) * (u * c).sqrt()
    };
    RegionId((x as usize).clamp(1, n))
}

fn weighted_region<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<RegionId> {
    let dist = WeightedIndex::new(weights).ok()?;
    Some(RegionId::from_index(dist.sample(rng)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn space() -> SearchSpace {
        SearchSpace::new(SearchConfig::cape_python()).unwrap()
    }

    #[test]
    fn initialize_copies_priors_and_zeroes_effectiveness() {
        let s = SearchState::initialize(&space());
        assert_eq!(s.beliefs(), &[0.2, 0.5, 0.3]);
        assert!(s.effectiveness().iter().all(|e| *e == 0.0));
        assert!(s.target().is_none());
        let sum: f64 = s.beliefs().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn from_priors_rejects_bad_sum() {
        assert!(SearchState::from_priors(vec![0.5, 0.4]).is_err());
        assert!(SearchState::from_priors(vec![0.5, 0.5]).is_ok());
    }

    #[test]
    fn triangular_placement_favours_middle_region() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut counts = [0usize; 3];
        let draws = 60_000;
        for _ in 0..draws {
            counts[triangular_region(3, &mut rng).index()] += 1;
        }
        // Exact shares for n = 3: 2/9, 5/9, 2/9.
        let share = |c: usize| c as f64 / draws as f64;
        assert!((share(counts[0]) - 2.0 / 9.0).abs() < 0.01);
        assert!((share(counts[1]) - 5.0 / 9.0).abs() < 0.01);
        assert!((share(counts[2]) - 2.0 / 9.0).abs() < 0.01);
    }

    #[test]
    fn target_cell_is_inside_its_region() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            let s = SearchState::start(&space, &mut rng);
            let t = s.target().unwrap();
            assert!(space.grid(t.region).index_of(t.cell).is_some());
        }
    }

    #[test]
    fn effectiveness_stays_in_range() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut s = SearchState::initialize(&space);
        for _ in 0..1000 {
            s.sample_effectiveness(space.config().effectiveness, &mut rng);
            assert!(s.effectiveness().iter().all(|e| (0.2..=0.9).contains(e)));
        }
    }

    #[test]
    fn most_likely_breaks_ties_low() {
        let s = SearchState::from_priors(vec![0.4, 0.4, 0.2]).unwrap();
        assert_eq!(s.most_likely(), RegionId(1));
    }
}
