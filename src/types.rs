// src/types.rs
//
// Common shared types for the search simulation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// 1-based region identifier (region 1 is the first configured region).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub usize);

impl RegionId {
    /// Region id for a 0-based slot in the per-region vectors.
    pub fn from_index(index: usize) -> Self {
        RegionId(index + 1)
    }

    /// 0-based slot in the per-region vectors.
    pub fn index(self) -> usize {
        self.0.saturating_sub(1)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local cell coordinate inside a region grid (x = column, y = row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// How many passes a region receives in one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPass {
    Once,
    Twice,
}

impl SearchPass {
    pub fn count(self) -> u8 {
        match self {
            SearchPass::Once => 1,
            SearchPass::Twice => 2,
        }
    }
}

/// A round's decision: which regions to search and how many times each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub searches: Vec<(RegionId, SearchPass)>,
}

impl Allocation {
    /// One region searched twice.
    pub fn twice(region: RegionId) -> Self {
        Self {
            searches: vec![(region, SearchPass::Twice)],
        }
    }

    /// Two distinct regions searched once each.
    pub fn split(a: RegionId, b: RegionId) -> Self {
        Self {
            searches: vec![(a, SearchPass::Once), (b, SearchPass::Once)],
        }
    }

    /// Regions touched this round, in allocation order.
    pub fn regions(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.searches.iter().map(|(r, _)| *r)
    }

    /// Check the allocation against a configuration of `num_regions` regions.
    pub fn validate(&self, num_regions: usize) -> Result<(), SearchError> {
        if self.searches.is_empty() {
            return Err(SearchError::InvalidAllocation {
                reason: "allocation searches no region".to_string(),
            });
        }

        let mut seen = vec![false; num_regions];
        for (region, _) in &self.searches {
            if region.0 == 0 || region.0 > num_regions {
                return Err(SearchError::InvalidAllocation {
                    reason: format!("region {region} outside 1..={num_regions}"),
                });
            }
            let slot = &mut seen[region.index()];
            if *slot {
                return Err(SearchError::InvalidAllocation {
                    reason: format!("region {region} allocated more than once"),
                });
            }
            *slot = true;
        }
        Ok(())
    }
}
