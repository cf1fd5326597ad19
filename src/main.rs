// src/main.rs
//
// Interactive search-and-rescue game around the bayes_search library.
// All of the real logic lives in the lib crate (state, round, session).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use bayes_search::{
    init_tracing, MenuChoice, RoundReport, Scenario, SearchConfig, SearchSpace, Session,
    SessionEvent,
};

/// Command-line arguments for the interactive binary.
#[derive(Parser, Debug)]
#[command(name = "bayes-search", version)]
struct Cli {
    /// Seed for the session RNG. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Optional YAML scenario; only its `config` section is used here.
    #[arg(long)]
    scenario: Option<PathBuf>,
}

/// Build the search space from the scenario (or the reference defaults),
/// then apply env research overrides.
fn build_space(cli: &Cli) -> Result<SearchSpace> {
    let mut cfg = match cli.scenario.as_deref() {
        Some(path) => Scenario::load(path)?.config,
        None => SearchConfig::default(),
    };
    cfg.apply_env_overrides();
    SearchSpace::new(cfg).context("search configuration rejected")
}

fn format_probabilities(values: &[f64]) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, p)| format!("P{} = {:.3}", i + 1, p))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_round(report: &RoundReport) {
    let n = report.round;
    let labels: Vec<String> = report
        .results
        .iter()
        .flat_map(|r| r.pass_labels())
        .collect();
    for (i, label) in labels.iter().enumerate() {
        println!("Search {n} Results {} = {label}", i + 1);
    }

    println!("\nSearch {n} Effectiveness (E):");
    let effectiveness = report
        .applied_effectiveness
        .iter()
        .enumerate()
        .map(|(i, e)| format!("E{} = {:.3}", i + 1, e))
        .collect::<Vec<_>>()
        .join(", ");
    println!("{effectiveness}");

    if !report.found() {
        println!("\nNew Target Probabilities (P) for Search {}:", n + 1);
        println!("{}", format_probabilities(&report.beliefs));
    }
    println!();
}

fn announce_mission(session: &Session<'_>) {
    println!("\nNew mission: target placed.");
    println!(
        "Initial Target Probabilities (P): {}\n",
        format_probabilities(session.trial().state().beliefs())
    );
}

fn main() -> Result<()> {
    init_tracing("bayes_search=warn");
    let cli = Cli::parse();

    let space = match build_space(&cli) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(2);
        }
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, config = %space.config().name, "starting session");

    let mut session = Session::new(&space, seed);
    announce_mission(&session);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}Choice: ", session.menu().render());
        io::stdout().flush().context("flushing stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("reading choice from stdin")?;
        let Some(choice) = session.menu().parse(&line) else {
            println!("\nSorry, but that isn't a valid choice.\n");
            continue;
        };

        match session.apply(choice)? {
            SessionEvent::Exit => break,
            SessionEvent::Restarted { .. } => announce_mission(&session),
            SessionEvent::MissionOver => println!("\nThe target was already found.\n"),
            SessionEvent::Searched(report) => {
                println!();
                print_round(&report);
                if report.found() {
                    if let Some((x, y)) = session.target_map_position() {
                        println!("Target found at map coordinate ({x}, {y}).\n");
                    }
                    session.apply(MenuChoice::Restart)?;
                    announce_mission(&session);
                }
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}
