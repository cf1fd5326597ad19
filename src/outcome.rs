// src/outcome.rs
//
// Search outcome model.
//
// A pass over a region at effectiveness e covers floor(e * C) distinct cells
// of its C-cell grid, drawn uniformly without replacement, and finds the
// target iff the target's cell is among them. Cells are sampled as indices
// from the virtual range 0..C; the coordinate list is never materialised.
// Every pass draws from the caller's RNG, so two passes over the same region
// in one round cover independent cell sets.

use rand::Rng;

use crate::config::CombinedCoverage;
use crate::grid::RegionGrid;
use crate::state::Target;
use crate::types::{Cell, RegionId};

/// Set of cells covered by one or more passes over a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    grid: RegionGrid,
    /// Sorted, unique row-major cell indices.
    indices: Vec<usize>,
}

impl Coverage {
    fn from_unsorted(grid: RegionGrid, mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        Self { grid, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.grid
            .index_of(cell)
            .is_some_and(|i| self.indices.binary_search(&i).is_ok())
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.indices.iter().map(|&i| self.grid.cell_at(i))
    }

    /// Cells covered by either set.
    pub fn union(&self, other: &Coverage) -> Coverage {
        let (a, b) = (&self.indices, &other.indices);
        let mut merged = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            if a[i] < b[j] {
                merged.push(a[i]);
                i += 1;
            } else if b[j] < a[i] {
                merged.push(b[j]);
                j += 1;
            } else {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        Coverage {
            grid: self.grid,
            indices: merged,
        }
    }
}

/// Result of a single pass.
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub coverage: Coverage,
    pub found: bool,
}

/// Result of searching the same region twice in one round.
#[derive(Debug, Clone)]
pub struct DoubleOutcome {
    pub first: PassOutcome,
    pub second: PassOutcome,
    /// Cells covered by either pass.
    pub union: Coverage,
    /// Effectiveness fed into the belief update for this region.
    pub combined_effectiveness: f64,
}

impl DoubleOutcome {
    pub fn found(&self) -> bool {
        self.first.found || self.second.found
    }
}

/// Number of cells a pass at `effectiveness` covers in a grid of `total` cells.
pub fn cells_to_search(effectiveness: f64, total: usize) -> usize {
    let e = if effectiveness.is_finite() {
        effectiveness.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((e * total as f64).floor() as usize).min(total)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeModel {
    combined: CombinedCoverage,
}

impl OutcomeModel {
    pub fn new(combined: CombinedCoverage) -> Self {
        Self { combined }
    }

    /// One pass over `region` at `effectiveness`.
    pub fn search_once<R: Rng + ?Sized>(
        &self,
        region: RegionId,
        grid: &RegionGrid,
        effectiveness: f64,
        target: Option<Target>,
        rng: &mut R,
    ) -> PassOutcome {
        let total = grid.cell_count();
        let k = cells_to_search(effectiveness, total);
        let indices = rand::seq::index::sample(rng, total, k).into_vec();
        let coverage = Coverage::from_unsorted(*grid, indices);

        let found = target
            .filter(|t| t.region == region)
            .is_some_and(|t| coverage.contains(t.cell));

        PassOutcome { coverage, found }
    }

    /// Two independent passes at the same effectiveness, combined.
    pub fn search_twice<R: Rng + ?Sized>(
        &self,
        region: RegionId,
        grid: &RegionGrid,
        effectiveness: f64,
        target: Option<Target>,
        rng: &mut R,
    ) -> DoubleOutcome {
        let first = self.search_once(region, grid, effectiveness, target, rng);
        let second = self.search_once(region, grid, effectiveness, target, rng);
        let union = first.coverage.union(&second.coverage);
        let combined_effectiveness = self.combined_effectiveness(union.len(), grid);

        DoubleOutcome {
            first,
            second,
            union,
            combined_effectiveness,
        }
    }

    /// Effectiveness credited to a region whose passes covered `covered` cells.
    pub fn combined_effectiveness(&self, covered: usize, grid: &RegionGrid) -> f64 {
        let denom = match self.combined {
            CombinedCoverage::CellsSquared => (grid.cell_count() as f64).powi(2),
            CombinedCoverage::RowsSquared => (grid.height() as f64).powi(2),
        };
        if denom > 0.0 {
            covered as f64 / denom
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn pass_covers_floor_of_effectiveness_times_cells() {
        let grid = RegionGrid::new(50, 50);
        let model = OutcomeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for e in [0.0, 0.2, 0.33, 0.5, 0.9, 1.0] {
            let out = model.search_once(RegionId(1), &grid, e, None, &mut rng);
            assert_eq!(out.coverage.len(), (e * 2500.0_f64).floor() as usize);
            assert!(!out.found);
        }
    }

    #[test]
    fn full_pass_finds_target_only_in_its_region() {
        let grid = RegionGrid::new(4, 4);
        let model = OutcomeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let target = Some(Target {
            region: RegionId(2),
            cell: Cell::new(3, 1),
        });

        assert!(model.search_once(RegionId(2), &grid, 1.0, target, &mut rng).found);
        assert!(!model.search_once(RegionId(1), &grid, 1.0, target, &mut rng).found);
        assert!(!model.search_once(RegionId(2), &grid, 0.0, target, &mut rng).found);
    }

    #[test]
    fn two_passes_draw_different_cells() {
        let grid = RegionGrid::new(50, 50);
        let model = OutcomeModel::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let d = model.search_twice(RegionId(1), &grid, 0.5, None, &mut rng);
        assert_ne!(d.first.coverage, d.second.coverage);
        assert!(d.union.len() > d.first.coverage.len());
        assert!(d.union.len() <= 2 * d.first.coverage.len());
    }

    #[test]
    fn combined_effectiveness_divides_by_cells_squared() {
        let grid = RegionGrid::new(50, 50);
        let cells = OutcomeModel::new(CombinedCoverage::CellsSquared);
        assert!((cells.combined_effectiveness(1875, &grid) - 1875.0 / 6_250_000.0).abs() < 1e-15);

        let rows = OutcomeModel::new(CombinedCoverage::RowsSquared);
        assert!((rows.combined_effectiveness(1875, &grid) - 0.75).abs() < 1e-15);
    }

    #[test]
    fn union_merges_without_duplicates() {
        let grid = RegionGrid::new(10, 1);
        let a = Coverage::from_unsorted(grid, vec![5, 1, 3]);
        let b = Coverage::from_unsorted(grid, vec![3, 9, 0]);
        let u = a.union(&b);
        let xs: Vec<u32> = u.cells().map(|c| c.x).collect();
        assert_eq!(xs, vec![0, 1, 3, 5, 9]);
    }
}
