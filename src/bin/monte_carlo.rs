// src/bin/monte_carlo.rs
//
// Monte Carlo policy comparison runner.
//
// Goals:
// - Deterministic multi-trial evaluation using seed offsets (trial i uses seed + i).
// - Every policy runs over the same seed sequence, so means are directly comparable.
// - Results do not depend on --threads.
//
// Run examples:
//   cargo run --release --bin monte_carlo -- --trials 1000 --seed 1
//   cargo run --release --bin monte_carlo -- --trials 5000 --threads 8 --policy split-top-two
//   BAYES_SEARCH_PLACEMENT=priors cargo run --release --bin monte_carlo -- --scenario scenarios/cape_python.yaml --output-dir out/
//
// Precedence: CLI flags > environment overrides > scenario file > defaults.
//
// Output files (with --output-dir):
//   mc_runs.jsonl     one JSON object per trial
//   mc_summary.json   per-policy reports and the mean-rounds map

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use bayes_search::logging::build_sink;
use bayes_search::{
    init_tracing, Comparison, EventSink, HarnessOptions, MonteCarloHarness, Policy, PolicyKind,
    Scenario, SearchConfig, TrialRecord,
};

const RUNS_FILE: &str = "mc_runs.jsonl";
const SUMMARY_FILE: &str = "mc_summary.json";

#[derive(Parser, Debug)]
#[command(name = "monte_carlo", version, about = "Compare search policies by mean rounds-to-success")]
struct Args {
    /// Trials per policy (default: 1000, or the scenario's value).
    #[arg(long, alias = "runs")]
    trials: Option<usize>,

    /// Base seed. Trial i uses seed + i.
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads. 1 = sequential, 0 = one per core.
    #[arg(long)]
    threads: Option<usize>,

    /// Cap on rounds per trial; trials hitting it count as exhausted.
    #[arg(long)]
    max_rounds: Option<u32>,

    /// Policy to run (repeatable). Defaults to both built-in policies.
    #[arg(long = "policy", value_enum)]
    policies: Vec<PolicyKind>,

    /// YAML scenario file.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Directory for mc_runs.jsonl and mc_summary.json.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Only print the final summary.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    scenario_id: &'a str,
    config: &'a str,
    trials: usize,
    base_seed: u64,
    max_rounds: Option<u32>,
    comparison: &'a Comparison,
    means: BTreeMap<String, f64>,
    best: Option<&'a str>,
}

/// Resolve the run plan: scenario (or defaults), then env, then CLI.
fn build_scenario(args: &Args) -> Result<Scenario> {
    let mut scenario = match args.scenario.as_deref() {
        Some(path) => Scenario::load(path)?,
        None => Scenario {
            scenario_id: "default".to_string(),
            description: None,
            config: SearchConfig::default(),
            harness: HarnessOptions::default(),
            policies: vec![PolicyKind::TwiceHighest, PolicyKind::SplitTopTwo],
        },
    };

    scenario.config.apply_env_overrides();

    if let Some(trials) = args.trials {
        scenario.harness.trials = trials;
    }
    if let Some(seed) = args.seed {
        scenario.harness.base_seed = seed;
    }
    if let Some(threads) = args.threads {
        scenario.harness.threads = threads;
    }
    if args.max_rounds.is_some() {
        scenario.harness.max_rounds = args.max_rounds;
    }
    if !args.policies.is_empty() {
        scenario.policies = args.policies.clone();
    }

    scenario.validate()?;
    Ok(scenario)
}

fn write_outputs(dir: &Path, summary: &Summary<'_>, records: &[TrialRecord]) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let runs_path = dir.join(RUNS_FILE);
    let mut sink = build_sink(Some(&runs_path))
        .with_context(|| format!("creating {}", runs_path.display()))?;
    for record in records {
        sink.log_trial(record)?;
    }
    sink.flush()?;

    let summary_path = dir.join(SUMMARY_FILE);
    let file = File::create(&summary_path)
        .with_context(|| format!("creating {}", summary_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing("bayes_search=info");
    let args = Args::parse();

    let (scenario, space) = match build_scenario(&args)
        .and_then(|s| s.space().map(|space| (s, space)).map_err(Into::into))
    {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    };

    let opts = scenario.harness;
    let policies: Vec<Box<dyn Policy>> = scenario.build_policies();
    let names: Vec<&str> = policies.iter().map(|p| p.name()).collect();

    println!(
        "bayes-search-mc v{} | scenario={} config={} trials={} seed={} threads={} max_rounds={} policies={}",
        env!("CARGO_PKG_VERSION"),
        scenario.scenario_id,
        space.config().name,
        opts.trials,
        opts.base_seed,
        opts.threads,
        opts.max_rounds
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string()),
        names.join(",")
    );

    let harness = MonteCarloHarness::new(&space, opts);
    let (comparison, records) = harness.compare_with_records(&policies)?;

    if !args.quiet {
        for r in &comparison.reports {
            println!(
                "policy {:<8} found={:>6}/{:<6} exhausted={:<5} anomalies={:<4} mean={:>9.3}",
                r.policy, r.found, r.trials_requested, r.exhausted, r.anomalies, r.mean_rounds()
            );
        }
    }

    let means = comparison.means();
    let best = comparison.best().map(|r| r.policy.as_str());

    println!();
    println!("SUMMARY");
    println!("  trials per policy: {}", opts.trials);
    for r in &comparison.reports {
        let s = &r.rounds;
        println!(
            "  {:<8} success={:.2}%  mean={:.3}  std={:.3}  se={:.3}  min={:.0}  max={:.0}  p50={:.0}  p95={:.0}",
            r.policy,
            100.0 * r.success_rate(),
            s.mean,
            s.stddev,
            s.std_error,
            s.min,
            s.max,
            s.p50,
            s.p95
        );
    }
    if let Some(name) = best {
        println!("  best (lowest mean rounds): {name}");
    }

    if let Some(dir) = args.output_dir.as_deref() {
        let summary = Summary {
            scenario_id: &scenario.scenario_id,
            config: &space.config().name,
            trials: opts.trials,
            base_seed: opts.base_seed,
            max_rounds: opts.max_rounds,
            comparison: &comparison,
            means,
            best,
        };
        write_outputs(dir, &summary, &records)?;
        println!("  wrote {} and {} to {}", RUNS_FILE, SUMMARY_FILE, dir.display());
    }

    Ok(())
}
