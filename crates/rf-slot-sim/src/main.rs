//! rf-slot-sim: batch spin simulator
//!
//! Usage:
//!   rf-slot-sim --spins 100000 --sessions 8 --seed 42
//!   rf-slot-sim --bet 10 --lines 0,1,2 --json
//!   rf-slot-sim --bet 5 --preset 5
//!   rf-slot-sim --config slot.yaml --no-adaptive

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use rf_slot_core::{ALL_LINES, CREDIT_MULTIPLIERS, SlotConfig, line_selection};
use rf_slot_sim::{SimulationPlan, run};

#[derive(Parser)]
#[command(name = "rf-slot-sim", about = "Simulate adaptive slot sessions and report RTP")]
struct Cli {
    /// Spins per session
    #[arg(long, default_value_t = 100_000)]
    spins: u64,

    /// Independent sessions (run in parallel)
    #[arg(long, default_value_t = 4)]
    sessions: usize,

    /// Base seed; session i uses seed + i
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Bet per line
    #[arg(long, default_value_t = 1.0)]
    bet: f64,

    /// Active pay-lines, comma separated (default: all 8)
    #[arg(long, value_delimiter = ',')]
    lines: Vec<usize>,

    /// Line preset by line count (1, 3, 5 or 8)
    #[arg(long, conflicts_with = "lines")]
    preset: Option<usize>,

    /// JSON or YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw from base weights only
    #[arg(long)]
    no_adaptive: bool,

    /// Worker threads (default: one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SlotConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SlotConfig::default(),
    };
    if cli.no_adaptive {
        config = config.without_adaptation();
    }

    if !cli.bet.is_finite() || cli.bet <= 0.0 {
        bail!("--bet must be a positive number, got {}", cli.bet);
    }
    if !CREDIT_MULTIPLIERS.contains(&cli.bet) {
        log::warn!("--bet {} is not one of the panel steps {:?}", cli.bet, CREDIT_MULTIPLIERS);
    }

    let lines = match cli.preset {
        Some(count) => match line_selection(count) {
            Some(preset) => preset.lines.to_vec(),
            None => bail!("--preset must be 1, 3, 5 or 8, got {count}"),
        },
        None if cli.lines.is_empty() => ALL_LINES.to_vec(),
        None => cli.lines,
    };

    let plan = SimulationPlan {
        spins: cli.spins,
        sessions: cli.sessions,
        seed: cli.seed,
        bet_per_line: cli.bet,
        lines,
        threads: cli.threads,
    };

    let report = run(&config, &plan).context("Simulation failed")?;

    if cli.json {
        println!("{}", report.to_json().context("Failed to serialize report")?);
    } else {
        print!("{}", report.render_table());
    }
    Ok(())
}
