// src/policy.rs
//
// Search policies.
//
// A policy takes a read-only view of the round (current beliefs plus the
// effectiveness sampled for this round) and returns an `Allocation`: which
// regions to search and how many passes each gets. Policies are pure, so
// one instance can be shared by every worker in the harness.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::{Allocation, RegionId};

/// What a policy is allowed to see when deciding a round.
#[derive(Debug, Clone, Copy)]
pub struct PolicyView<'a> {
    pub beliefs: &'a [f64],
    pub effectiveness: &'a [f64],
}

impl PolicyView<'_> {
    pub fn num_regions(&self) -> usize {
        self.beliefs.len()
    }

    /// Region ids ordered by descending belief; ties keep the lower id first.
    pub fn ranked(&self) -> Vec<RegionId> {
        let mut order: Vec<usize> = (0..self.beliefs.len()).collect();
        order.sort_by(|&a, &b| {
            self.beliefs[b]
                .partial_cmp(&self.beliefs[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.into_iter().map(RegionId::from_index).collect()
    }
}

/// Interface for all search policies.
pub trait Policy: Send + Sync {
    /// Stable name used in reports and on the command line.
    fn name(&self) -> &str;

    /// Decide this round's allocation.
    fn allocate(&self, view: &PolicyView<'_>) -> Result<Allocation, SearchError>;
}

/// Search the currently most likely region twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwiceHighestBelief;

impl Policy for TwiceHighestBelief {
    fn name(&self) -> &str {
        "twice"
    }

    fn allocate(&self, view: &PolicyView<'_>) -> Result<Allocation, SearchError> {
        // First maximum wins, so ties go to the lowest region id.
        let mut best = 0;
        for (i, p) in view.beliefs.iter().enumerate() {
            if *p > view.beliefs[best] {
                best = i;
            }
        }
        Ok(Allocation::twice(RegionId::from_index(best)))
    }
}

/// Search the two most likely regions once each.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitTopTwo;

impl Policy for SplitTopTwo {
    fn name(&self) -> &str {
        "split"
    }

    fn allocate(&self, view: &PolicyView<'_>) -> Result<Allocation, SearchError> {
        let ranked = view.ranked();
        if ranked.len() < 2 {
            return Err(SearchError::InvalidAllocation {
                reason: "split search needs at least two regions".to_string(),
            });
        }
        let (a, b) = (ranked[0].min(ranked[1]), ranked[0].max(ranked[1]));
        Ok(Allocation::split(a, b))
    }
}

/// Always search one fixed region twice.
#[derive(Debug, Clone)]
pub struct FixedTwice {
    region: RegionId,
    name: String,
}

impl FixedTwice {
    pub fn new(region: RegionId) -> Self {
        Self {
            region,
            name: format!("twice-{region}"),
        }
    }
}

impl Policy for FixedTwice {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, _view: &PolicyView<'_>) -> Result<Allocation, SearchError> {
        Ok(Allocation::twice(self.region))
    }
}

/// Always search one fixed pair of regions once each.
#[derive(Debug, Clone)]
pub struct FixedSplit {
    pair: (RegionId, RegionId),
    name: String,
}

impl FixedSplit {
    pub fn new(a: RegionId, b: RegionId) -> Self {
        Self {
            pair: (a, b),
            name: format!("split-{a}-{b}"),
        }
    }
}

impl Policy for FixedSplit {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(&self, _view: &PolicyView<'_>) -> Result<Allocation, SearchError> {
        Ok(Allocation::split(self.pair.0, self.pair.1))
    }
}

/// Named policies selectable from scenario files and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Search the most likely region twice.
    TwiceHighest,
    /// Search the two most likely regions once each.
    SplitTopTwo,
}

impl PolicyKind {
    pub fn build(self) -> Box<dyn Policy> {
        match self {
            PolicyKind::TwiceHighest => Box::new(TwiceHighestBelief),
            PolicyKind::SplitTopTwo => Box::new(SplitTopTwo),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "twice" | "twice_highest" => Some(PolicyKind::TwiceHighest),
            "split" | "split_top_two" => Some(PolicyKind::SplitTopTwo),
            _ => None,
        }
    }
}
