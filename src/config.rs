// src/config.rs
//
// Central configuration for the search simulation.
//
// `SearchConfig` is the serialisable description (regions, priors,
// effectiveness bounds, model options). `SearchSpace` is the validated,
// immutable form shared read-only by every trial: it owns the resolved
// region grids so the hot loop never re-derives them.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::grid::{Corners, MapExtent, RegionGrid};
use crate::types::RegionId;

/// Tolerance used when checking that priors sum to one.
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-9;

/// Reference search areas on the Cape Python map: (UL-X, UL-Y, LR-X, LR-Y).
pub const CAPE_PYTHON_CORNERS: [Corners; 3] = [
    Corners::new(130, 265, 180, 315),
    Corners::new(80, 255, 130, 305),
    Corners::new(105, 205, 155, 255),
];

/// Reference prior estimate for each Cape Python area.
pub const CAPE_PYTHON_PRIORS: [f64; 3] = [0.2, 0.5, 0.3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Human-readable label used in logs and menus.
    pub name: String,
    /// Extent of the region on the map.
    pub corners: Corners,
    /// Prior probability that the target is in this region.
    pub prior: f64,
}

/// Bounds of the per-round search effectiveness draw.
///
/// A single pass is never perfect (max < 1) nor useless (min > 0) in the
/// reference setup: [0.2, 0.9].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessRange {
    pub min: f64,
    pub max: f64,
}

impl Default for EffectivenessRange {
    fn default() -> Self {
        Self { min: 0.2, max: 0.9 }
    }
}

/// How the hidden target's region is drawn at the start of a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlacement {
    /// Triangular draw over [1, N+1) truncated to an index. Favours the
    /// middle regions and ignores the priors.
    #[default]
    Triangular,
    /// Draw the region with probability proportional to its prior.
    Priors,
}

impl TargetPlacement {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triangular" | "tri" => Some(TargetPlacement::Triangular),
            "priors" | "prior" | "weighted" => Some(TargetPlacement::Priors),
            _ => None,
        }
    }
}

/// Normalisation of the covered-cell count after a region is searched twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinedCoverage {
    /// |union of covered cells| / cells².
    #[default]
    CellsSquared,
    /// |union of covered cells| / rows². Equals the covered fraction on
    /// square regions.
    RowsSquared,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Identifier used in logs and summaries.
    pub name: String,
    /// Optional full map size; regions are clipped to it and must lie inside.
    #[serde(default)]
    pub map: Option<MapExtent>,
    /// Search regions, in region-id order (region 1 first).
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub effectiveness: EffectivenessRange,
    #[serde(default)]
    pub placement: TargetPlacement,
    #[serde(default)]
    pub combined_coverage: CombinedCoverage,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::cape_python()
    }
}

impl SearchConfig {
    /// The three-area Cape Python reference configuration.
    pub fn cape_python() -> Self {
        let regions = CAPE_PYTHON_CORNERS
            .iter()
            .zip(CAPE_PYTHON_PRIORS)
            .enumerate()
            .map(|(i, (corners, prior))| RegionConfig {
                name: format!("area {}", i + 1),
                corners: *corners,
                prior,
            })
            .collect();

        Self {
            name: "cape_python".to_string(),
            map: None,
            regions,
            effectiveness: EffectivenessRange::default(),
            placement: TargetPlacement::default(),
            combined_coverage: CombinedCoverage::default(),
        }
    }

    /// Build a configuration from bare grid sizes laid out side by side.
    ///
    /// Handy for experiments that only care about cell counts.
    pub fn from_grids(sizes: &[(u32, u32)], priors: &[f64]) -> Self {
        let mut x = 0;
        let regions = sizes
            .iter()
            .zip(priors)
            .enumerate()
            .map(|(i, (&(w, h), &prior))| {
                let corners = Corners::new(x, 0, x + w, h);
                x += w;
                RegionConfig {
                    name: format!("area {}", i + 1),
                    corners,
                    prior,
                }
            })
            .collect();

        Self {
            name: "grid".to_string(),
            map: None,
            regions,
            effectiveness: EffectivenessRange::default(),
            placement: TargetPlacement::default(),
            combined_coverage: CombinedCoverage::default(),
        }
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    pub fn priors(&self) -> Vec<f64> {
        self.regions.iter().map(|r| r.prior).collect()
    }

    /// Resolve each region's grid, clipping to the map when one is set.
    pub fn grids(&self) -> Result<Vec<RegionGrid>, SearchError> {
        self.regions
            .iter()
            .map(|r| match self.map {
                Some(map) => map.slice(&r.corners),
                None => {
                    let g = r.corners.grid();
                    if g.is_empty() {
                        Err(SearchError::config(format!(
                            "region '{}' has a zero-area grid",
                            r.name
                        )))
                    } else {
                        Ok(g)
                    }
                }
            })
            .collect()
    }

    /// Check every structural invariant. Fails fast with `InvalidConfiguration`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.regions.len() < 2 {
            return Err(SearchError::config(format!(
                "need at least 2 regions, got {}",
                self.regions.len()
            )));
        }

        for r in &self.regions {
            if !r.prior.is_finite() || !(0.0..=1.0).contains(&r.prior) {
                return Err(SearchError::config(format!(
                    "prior of '{}' must be in [0, 1], got {}",
                    r.name, r.prior
                )));
            }
        }

        let sum: f64 = self.regions.iter().map(|r| r.prior).sum();
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(SearchError::config(format!(
                "priors must sum to 1, got {sum}"
            )));
        }

        let e = self.effectiveness;
        if !(e.min.is_finite() && e.max.is_finite()) || e.min < 0.0 || e.min > e.max || e.max >= 1.0
        {
            return Err(SearchError::config(format!(
                "effectiveness bounds must satisfy 0 <= min <= max < 1, got [{}, {}]",
                e.min, e.max
            )));
        }

        if let Some(map) = self.map {
            for r in &self.regions {
                if !map.contains(&r.corners) {
                    return Err(SearchError::config(format!(
                        "region '{}' extends past the {}x{} map",
                        r.name, map.width, map.height
                    )));
                }
            }
        }

        for (i, a) in self.regions.iter().enumerate() {
            for b in &self.regions[i + 1..] {
                if a.corners.overlaps(&b.corners) {
                    return Err(SearchError::config(format!(
                        "regions '{}' and '{}' overlap",
                        a.name, b.name
                    )));
                }
            }
        }

        self.grids()?;
        Ok(())
    }

    /// Apply research overrides from the process environment.
    ///
    ///   - BAYES_SEARCH_EFFECTIVENESS_MIN  (f64)
    ///   - BAYES_SEARCH_EFFECTIVENESS_MAX  (f64)
    ///   - BAYES_SEARCH_PLACEMENT          (triangular | priors)
    ///
    /// Any variable that fails to parse is ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("BAYES_SEARCH_EFFECTIVENESS_MIN") {
            match raw.trim().parse::<f64>() {
                Ok(v) => {
                    self.effectiveness.min = v;
                    tracing::info!(value = v, "BAYES_SEARCH_EFFECTIVENESS_MIN overrode default");
                }
                Err(_) => tracing::warn!(
                    raw = %raw,
                    "could not parse BAYES_SEARCH_EFFECTIVENESS_MIN as f64; keeping {}",
                    self.effectiveness.min
                ),
            }
        }

        if let Some(raw) = lookup("BAYES_SEARCH_EFFECTIVENESS_MAX") {
            match raw.trim().parse::<f64>() {
                Ok(v) => {
                    self.effectiveness.max = v;
                    tracing::info!(value = v, "BAYES_SEARCH_EFFECTIVENESS_MAX overrode default");
                }
                Err(_) => tracing::warn!(
                    raw = %raw,
                    "could not parse BAYES_SEARCH_EFFECTIVENESS_MAX as f64; keeping {}",
                    self.effectiveness.max
                ),
            }
        }

        if let Some(raw) = lookup("BAYES_SEARCH_PLACEMENT") {
            match TargetPlacement::parse(&raw) {
                Some(p) => {
                    self.placement = p;
                    tracing::info!(placement = ?p, "BAYES_SEARCH_PLACEMENT overrode default");
                }
                None => tracing::warn!(
                    raw = %raw,
                    "invalid BAYES_SEARCH_PLACEMENT (expected triangular | priors); ignoring"
                ),
            }
        }
    }
}

/// Validated, immutable configuration shared by all trials.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    config: SearchConfig,
    grids: Vec<RegionGrid>,
}

impl SearchSpace {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let grids = config.grids()?;
        Ok(Self { config, grids })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn num_regions(&self) -> usize {
        self.grids.len()
    }

    pub fn grid(&self, region: RegionId) -> &RegionGrid {
        &self.grids[region.index()]
    }

    pub fn grids(&self) -> &[RegionGrid] {
        &self.grids
    }

    pub fn region(&self, region: RegionId) -> &RegionConfig {
        &self.config.regions[region.index()]
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> {
        (0..self.grids.len()).map(RegionId::from_index)
    }
}
