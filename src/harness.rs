// src/harness.rs
//
// Monte Carlo harness: many independent trials per policy, aggregated into
// rounds-to-success statistics.
//
// - Trial i of a batch runs on its own ChaCha8 stream seeded with
//   base_seed + i, so every policy in a comparison sees the same seed
//   sequence and results do not depend on thread count or completion order.
// - threads == 1 runs inline; otherwise a dedicated rayon pool runs one task
//   per trial index. Results come back per task and are aggregated in index
//   order after the batch; nothing mutable is shared between workers.
// - Cancellation is checked before each trial starts. In-flight trials run
//   to completion; the rest are reported as skipped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SearchSpace;
use crate::error::SearchError;
use crate::metrics::RoundsSummary;
use crate::policy::Policy;
use crate::trial::{Trial, TrialOutcome};
use crate::types::RegionId;

pub const DEFAULT_TRIALS: usize = 1000;
pub const DEFAULT_BASE_SEED: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessOptions {
    /// Trials per policy.
    pub trials: usize,
    /// Trial i uses seed base_seed + i.
    pub base_seed: u64,
    /// Worker threads. 1 = sequential, 0 = one per available core.
    pub threads: usize,
    /// Optional cap on rounds per trial.
    pub max_rounds: Option<u32>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            base_seed: DEFAULT_BASE_SEED,
            threads: 1,
            max_rounds: None,
        }
    }
}

impl HarnessOptions {
    pub fn seed_for(&self, trial_index: usize) -> u64 {
        self.base_seed.wrapping_add(trial_index as u64)
    }
}

/// Shared cancellation flag for a harness run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Found,
    Exhausted,
    /// Trial aborted by an error (e.g. a degenerate belief update).
    Anomaly,
    /// Not started because the run was cancelled.
    Skipped,
}

/// Per-trial record, one JSONL line in the harness output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub policy: String,
    pub trial_index: usize,
    pub seed: u64,
    pub status: TrialStatus,
    pub rounds: u32,
    pub target_region: Option<RegionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of one policy's batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    pub policy: String,
    pub trials_requested: usize,
    pub found: usize,
    pub exhausted: usize,
    pub anomalies: usize,
    pub skipped: usize,
    /// Rounds-to-success over found trials.
    pub rounds: RoundsSummary,
}

impl PolicyReport {
    pub fn from_records(policy: &str, requested: usize, records: &[TrialRecord]) -> Self {
        let count = |s: TrialStatus| records.iter().filter(|r| r.status == s).count();
        let found_rounds: Vec<u32> = records
            .iter()
            .filter(|r| r.status == TrialStatus::Found)
            .map(|r| r.rounds)
            .collect();

        Self {
            policy: policy.to_string(),
            trials_requested: requested,
            found: found_rounds.len(),
            exhausted: count(TrialStatus::Exhausted),
            anomalies: count(TrialStatus::Anomaly),
            skipped: count(TrialStatus::Skipped),
            rounds: RoundsSummary::from_rounds(&found_rounds),
        }
    }

    /// Arithmetic mean of rounds-to-success.
    pub fn mean_rounds(&self) -> f64 {
        self.rounds.mean
    }

    pub fn completed(&self) -> usize {
        self.found + self.exhausted + self.anomalies
    }

    pub fn success_rate(&self) -> f64 {
        let done = self.completed();
        if done == 0 {
            0.0
        } else {
            self.found as f64 / done as f64
        }
    }
}

/// Reports for several policies run over the same seed sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub reports: Vec<PolicyReport>,
}

impl Comparison {
    /// Policy name -> mean rounds-to-success.
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.reports
            .iter()
            .map(|r| (r.policy.clone(), r.mean_rounds()))
            .collect()
    }

    /// Policy with the lowest mean, among those with at least one find.
    pub fn best(&self) -> Option<&PolicyReport> {
        self.reports
            .iter()
            .filter(|r| r.found > 0)
            .min_by(|a, b| {
                a.mean_rounds()
                    .partial_cmp(&b.mean_rounds())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

pub struct MonteCarloHarness<'a> {
    space: &'a SearchSpace,
    options: HarnessOptions,
    cancel: CancellationToken,
}

impl<'a> MonteCarloHarness<'a> {
    pub fn new(space: &'a SearchSpace, options: HarnessOptions) -> Self {
        Self {
            space,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Mean-rounds report for one policy.
    pub fn run(&self, policy: &dyn Policy) -> Result<PolicyReport, SearchError> {
        Ok(self.run_with_records(policy)?.0)
    }

    /// Report plus every trial's record, in trial-index order.
    pub fn run_with_records(
        &self,
        policy: &dyn Policy,
    ) -> Result<(PolicyReport, Vec<TrialRecord>), SearchError> {
        tracing::info!(
            policy = policy.name(),
            trials = self.options.trials,
            base_seed = self.options.base_seed,
            threads = self.options.threads,
            "starting batch"
        );

        let records = self.run_trials(policy)?;
        let report = PolicyReport::from_records(policy.name(), self.options.trials, &records);

        if report.skipped > 0 {
            tracing::warn!(
                policy = policy.name(),
                skipped = report.skipped,
                "batch cancelled before all trials started"
            );
        }
        tracing::info!(
            policy = policy.name(),
            found = report.found,
            exhausted = report.exhausted,
            anomalies = report.anomalies,
            mean_rounds = report.mean_rounds(),
            "batch complete"
        );

        Ok((report, records))
    }

    /// Run every policy over the same seed sequence.
    pub fn compare(&self, policies: &[Box<dyn Policy>]) -> Result<Comparison, SearchError> {
        Ok(self.compare_with_records(policies)?.0)
    }

    pub fn compare_with_records(
        &self,
        policies: &[Box<dyn Policy>],
    ) -> Result<(Comparison, Vec<TrialRecord>), SearchError> {
        let mut reports = Vec::with_capacity(policies.len());
        let mut records = Vec::with_capacity(policies.len() * self.options.trials);
        for policy in policies {
            let (report, mut batch) = self.run_with_records(policy.as_ref())?;
            reports.push(report);
            records.append(&mut batch);
        }
        Ok((Comparison { reports }, records))
    }

    fn run_trials(&self, policy: &dyn Policy) -> Result<Vec<TrialRecord>, SearchError> {
        let n = self.options.trials;
        if self.options.threads == 1 {
            return Ok((0..n).map(|i| self.run_one(policy, i)).collect());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()?;
        Ok(pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|i| self.run_one(policy, i))
                .collect()
        }))
    }

    fn run_one(&self, policy: &dyn Policy, trial_index: usize) -> TrialRecord {
        let seed = self.options.seed_for(trial_index);
        let mut record = TrialRecord {
            policy: policy.name().to_string(),
            trial_index,
            seed,
            status: TrialStatus::Skipped,
            rounds: 0,
            target_region: None,
            error: None,
        };

        if self.cancel.is_cancelled() {
            return record;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let trial = Trial::start(self.space, &mut rng);
        record.target_region = trial.target().map(|t| t.region);

        match trial.run(policy, self.options.max_rounds, &mut rng) {
            Ok(TrialOutcome::Found { rounds, .. }) => {
                record.status = TrialStatus::Found;
                record.rounds = rounds;
            }
            Ok(TrialOutcome::Exhausted { rounds }) => {
                record.status = TrialStatus::Exhausted;
                record.rounds = rounds;
            }
            Err(err) => {
                tracing::warn!(
                    policy = policy.name(),
                    trial_index,
                    seed,
                    error = %err,
                    "trial aborted"
                );
                record.status = TrialStatus::Anomaly;
                record.error = Some(err.to_string());
            }
        }

        tracing::debug!(
            policy = policy.name(),
            trial_index,
            status = ?record.status,
            rounds = record.rounds,
            "trial finished"
        );
        record
    }
}
