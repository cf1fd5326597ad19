// src/scenario.rs
//
// Scenario files: a YAML document that fully defines a reproducible policy
// comparison (search configuration, harness options, policies to compare).
//
//   scenario_id: cape_python_baseline
//   harness:
//     trials: 1000
//     base_seed: 42
//     threads: 4
//   policies: [twice_highest, split_top_two]
//
// `config` is optional and defaults to the Cape Python reference setup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, SearchSpace};
use crate::error::SearchError;
use crate::harness::HarnessOptions;
use crate::policy::{Policy, PolicyKind};

fn default_policies() -> Vec<PolicyKind> {
    vec![PolicyKind::TwiceHighest, PolicyKind::SplitTopTwo]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: SearchConfig,
    #[serde(default)]
    pub harness: HarnessOptions,
    #[serde(default = "default_policies")]
    pub policies: Vec<PolicyKind>,
}

impl Scenario {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchError> {
        Self::parse_named(yaml, "<inline>")
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let shown = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| SearchError::Scenario {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        Self::parse_named(&text, &shown)
    }

    fn parse_named(yaml: &str, path: &str) -> Result<Self, SearchError> {
        let scenario: Scenario = serde_yaml::from_str(yaml).map_err(|e| SearchError::Scenario {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        scenario.validate().map_err(|e| SearchError::Scenario {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.scenario_id.trim().is_empty() {
            return Err(SearchError::config("scenario_id must not be empty"));
        }
        if self.harness.trials == 0 {
            return Err(SearchError::config("harness.trials must be >= 1"));
        }
        if self.policies.is_empty() {
            return Err(SearchError::config("at least one policy is required"));
        }
        self.config.validate()
    }

    pub fn space(&self) -> Result<SearchSpace, SearchError> {
        SearchSpace::new(self.config.clone())
    }

    pub fn build_policies(&self) -> Vec<Box<dyn Policy>> {
        self.policies.iter().map(|k| k.build()).collect()
    }

    /// (trial index, seed) pairs every policy will run.
    pub fn expand_seeds(&self) -> Vec<(usize, u64)> {
        (0..self.harness.trials)
            .map(|i| (i, self.harness.seed_for(i)))
            .collect()
    }
}
