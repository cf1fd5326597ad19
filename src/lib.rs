//! Bayesian search-and-rescue simulation library.
//!
//! This crate exposes the search state, outcome model, Bayesian belief
//! revision, search policies and the Monte Carlo harness that compares them.
//! The binaries (`src/main.rs` for the interactive game and
//! `src/bin/monte_carlo.rs` for policy comparison) are thin drivers around
//! these components.

pub mod belief;
pub mod config;
pub mod error;
pub mod grid;
pub mod harness;
pub mod logging;
pub mod metrics;
pub mod outcome;
pub mod policy;
pub mod round;
pub mod scenario;
pub mod session;
pub mod state;
pub mod trial;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use belief::revise;

pub use config::{
    CombinedCoverage, EffectivenessRange, RegionConfig, SearchConfig, SearchSpace,
    TargetPlacement,
};

pub use error::SearchError;

pub use grid::{Corners, MapExtent, RegionGrid};

pub use harness::{
    CancellationToken, Comparison, HarnessOptions, MonteCarloHarness, PolicyReport, TrialRecord,
    TrialStatus,
};

pub use logging::{init_tracing, EventSink, JsonlSink, NoopSink};

pub use metrics::{RoundsSummary, RunningStats};

pub use outcome::{Coverage, OutcomeModel};

pub use policy::{
    FixedSplit, FixedTwice, Policy, PolicyKind, PolicyView, SplitTopTwo, TwiceHighestBelief,
};

pub use round::{RegionSearchResult, RoundReport, SearchRound};

pub use scenario::Scenario;

pub use session::{Menu, MenuChoice, Session, SessionEvent};

pub use state::{SearchState, Target};

pub use trial::{run_trial, Trial, TrialOutcome};

pub use types::{Allocation, Cell, RegionId, SearchPass};
