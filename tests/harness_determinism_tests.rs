use std::fs;
use std::path::Path;
use std::process::Command;

use bayes_search::{
    HarnessOptions, MonteCarloHarness, Policy, PolicyKind, SearchConfig, SearchSpace,
};

const SMALL_SCENARIO: &str = r#"
scenario_id: determinism
config:
  name: small
  regions:
    - { name: a, corners: { ul_x: 0, ul_y: 0, lr_x: 4, lr_y: 4 }, prior: 0.2 }
    - { name: b, corners: { ul_x: 4, ul_y: 0, lr_x: 8, lr_y: 4 }, prior: 0.5 }
    - { name: c, corners: { ul_x: 8, ul_y: 0, lr_x: 12, lr_y: 4 }, prior: 0.3 }
harness:
  trials: 200
  base_seed: 11
  max_rounds: 10000
"#;

fn small_space() -> SearchSpace {
    SearchSpace::new(SearchConfig::from_grids(
        &[(4, 4), (4, 4), (4, 4)],
        &[0.2, 0.5, 0.3],
    ))
    .unwrap()
}

fn policies() -> Vec<Box<dyn Policy>> {
    vec![PolicyKind::TwiceHighest.build(), PolicyKind::SplitTopTwo.build()]
}

fn opts(threads: usize) -> HarnessOptions {
    HarnessOptions {
        trials: 1_000,
        base_seed: 7,
        threads,
        max_rounds: Some(10_000),
    }
}

#[test]
fn fixed_seeds_reproduce_identical_means() {
    let space = small_space();
    let policies = policies();

    let first = MonteCarloHarness::new(&space, opts(1)).compare(&policies).unwrap();
    let again = MonteCarloHarness::new(&space, opts(1)).compare(&policies).unwrap();
    let threaded = MonteCarloHarness::new(&space, opts(4)).compare(&policies).unwrap();

    let means = first.means();
    assert_eq!(means.len(), 2);
    for (name, mean) in &means {
        assert!(mean.is_finite() && *mean > 0.0, "{name}: {mean}");
    }
    assert_eq!(means, again.means());
    assert_eq!(means, threaded.means());
    assert_eq!(first, threaded);
}

#[test]
fn policies_share_the_seed_sequence() {
    let space = small_space();
    let (_, records) = MonteCarloHarness::new(&space, opts(2))
        .compare_with_records(&policies())
        .unwrap();

    let (twice, split) = records.split_at(1_000);
    for (a, b) in twice.iter().zip(split) {
        assert_eq!(a.seed, b.seed);
        // Target placement is drawn first, so both policies chase the same target.
        assert_eq!(a.target_region, b.target_region);
    }
}

fn run_binary(scenario: &Path, out: &Path, threads: &str) -> serde_json::Value {
    let status = Command::new(env!("CARGO_BIN_EXE_monte_carlo"))
        .arg("--scenario")
        .arg(scenario)
        .args(["--threads", threads, "--quiet", "--output-dir"])
        .arg(out)
        .env_remove("BAYES_SEARCH_EFFECTIVENESS_MIN")
        .env_remove("BAYES_SEARCH_EFFECTIVENESS_MAX")
        .env_remove("BAYES_SEARCH_PLACEMENT")
        .env("BAYES_SEARCH_LOG", "off")
        .status()
        .unwrap();
    assert!(status.success());

    let runs = fs::read_to_string(out.join("mc_runs.jsonl")).unwrap();
    assert_eq!(runs.lines().count(), 400);

    let text = fs::read_to_string(out.join("mc_summary.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn binary_output_is_independent_of_thread_count() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("small.yaml");
    fs::write(&scenario, SMALL_SCENARIO).unwrap();

    let sequential = run_binary(&scenario, &dir.path().join("t1"), "1");
    let parallel = run_binary(&scenario, &dir.path().join("t4"), "4");

    assert_eq!(sequential, parallel);
    assert_eq!(sequential["scenario_id"], "determinism");
    assert_eq!(sequential["trials"], 200);
    let means = sequential["means"].as_object().unwrap();
    assert_eq!(means.len(), 2);
    assert!(means["twice"].as_f64().unwrap() > 0.0);
    assert!(means["split"].as_f64().unwrap() > 0.0);
}

#[test]
fn binary_rejects_invalid_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("bad.yaml");
    fs::write(
        &scenario,
        SMALL_SCENARIO.replace("prior: 0.2", "prior: 0.9"),
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_monte_carlo"))
        .arg("--scenario")
        .arg(&scenario)
        .env("BAYES_SEARCH_LOG", "off")
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(2));
}
