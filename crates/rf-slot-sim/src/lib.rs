//! Batch spin simulator
//!
//! Runs independent seeded sessions against `rf-slot-core`, one machine per
//! session, spread over a rayon pool.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rf_slot_core::{ALL_LINES, ManualClock, SlotConfig, SlotError, SlotMachine, VolatilityRegime};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Slot error in session {session}: {source}")]
    Slot {
        session: usize,
        #[source]
        source: SlotError,
    },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// What to simulate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPlan {
    pub spins: u64,
    pub sessions: usize,
    /// Session `i` is seeded with `seed + i`
    pub seed: u64,
    pub bet_per_line: f64,
    pub lines: Vec<usize>,
    /// Worker threads, 0 for one per CPU
    pub threads: usize,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            spins: 100_000,
            sessions: 4,
            seed: 42,
            bet_per_line: 1.0,
            lines: ALL_LINES.to_vec(),
            threads: 0,
        }
    }
}

impl SimulationPlan {
    pub fn total_bet_per_spin(&self) -> f64 {
        self.bet_per_line * self.lines.len() as f64
    }

    fn validate(&self) -> Result<(), SimError> {
        if self.sessions == 0 {
            return Err(SimError::InvalidPlan("at least one session is required".into()));
        }
        if self.spins == 0 {
            return Err(SimError::InvalidPlan("at least one spin per session is required".into()));
        }
        Ok(())
    }
}

/// Result of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: usize,
    pub seed: u64,
    pub spins: u64,
    pub total_bet: f64,
    pub total_won: f64,
    pub rtp: f64,
    /// Final EMA tracked by the controller
    pub ema_rtp: f64,
    pub hit_rate: f64,
    pub near_miss_spins: u64,
    pub jackpot_bonuses: u64,
    pub jackpots_won: u64,
    pub max_win: f64,
    pub final_regime: VolatilityRegime,
}

/// Totals across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_spins: u64,
    pub total_bet: f64,
    pub total_won: f64,
    /// Pooled RTP (total won over total bet)
    pub rtp: f64,
    pub mean_session_rtp: f64,
    pub min_session_rtp: f64,
    pub max_session_rtp: f64,
    pub std_session_rtp: f64,
    pub hit_rate: f64,
    pub jackpots_won: u64,
}

impl AggregateReport {
    fn from_sessions(sessions: &[SessionReport]) -> Self {
        let total_spins: u64 = sessions.iter().map(|s| s.spins).sum();
        let total_bet: f64 = sessions.iter().map(|s| s.total_bet).sum();
        let total_won: f64 = sessions.iter().map(|s| s.total_won).sum();
        let wins: f64 = sessions.iter().map(|s| s.hit_rate * s.spins as f64).sum();

        let n = sessions.len().max(1) as f64;
        let mean = sessions.iter().map(|s| s.rtp).sum::<f64>() / n;
        let variance = sessions.iter().map(|s| (s.rtp - mean).powi(2)).sum::<f64>() / n;

        Self {
            total_spins,
            total_bet,
            total_won,
            rtp: if total_bet > 0.0 { total_won / total_bet } else { 0.0 },
            mean_session_rtp: mean,
            min_session_rtp: sessions.iter().map(|s| s.rtp).fold(f64::INFINITY, f64::min),
            max_session_rtp: sessions.iter().map(|s| s.rtp).fold(f64::NEG_INFINITY, f64::max),
            std_session_rtp: variance.sqrt(),
            hit_rate: if total_spins > 0 { wins / total_spins as f64 } else { 0.0 },
            jackpots_won: sessions.iter().map(|s| s.jackpots_won).sum(),
        }
    }
}

/// Complete simulation output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub plan: SimulationPlan,
    pub adaptive: bool,
    pub target_rtp: f64,
    pub sessions: Vec<SessionReport>,
    pub aggregate: AggregateReport,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl SimulationReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text table, one row per session plus totals
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} sessions × {} spins | bet {} × {} lines | adaptive: {} | target RTP {:.2}%",
            self.plan.sessions,
            self.plan.spins,
            self.plan.bet_per_line,
            self.plan.lines.len(),
            if self.adaptive { "on" } else { "off" },
            self.target_rtp * 100.0
        );
        let _ = writeln!(
            out,
            "{:>7} {:>20} {:>9} {:>9} {:>9} {:>8} {:>10} {:>7}",
            "session", "seed", "rtp %", "ema %", "hit %", "jackpot", "max win", "regime"
        );
        for s in &self.sessions {
            let _ = writeln!(
                out,
                "{:>7} {:>20} {:>9.3} {:>9.3} {:>9.3} {:>8} {:>10.1} {:>7}",
                s.session,
                s.seed,
                s.rtp * 100.0,
                s.ema_rtp * 100.0,
                s.hit_rate * 100.0,
                s.jackpots_won,
                s.max_win,
                s.final_regime.label()
            );
        }
        let a = &self.aggregate;
        let _ = writeln!(
            out,
            "total: {} spins | RTP {:.3}% (mean {:.3}%, min {:.3}%, max {:.3}%, std {:.3}) | hit {:.3}% | jackpots {} | {} ms",
            a.total_spins,
            a.rtp * 100.0,
            a.mean_session_rtp * 100.0,
            a.min_session_rtp * 100.0,
            a.max_session_rtp * 100.0,
            a.std_session_rtp * 100.0,
            a.hit_rate * 100.0,
            a.jackpots_won,
            self.elapsed_ms
        );
        out
    }
}

/// Run one session on the calling thread
///
/// The wallet is funded for every spin up front (plus one spare) and the clock stands still,
/// so the only randomness is the seed.
pub fn run_session(
    config: &SlotConfig,
    plan: &SimulationPlan,
    session: usize,
) -> Result<SessionReport, SimError> {
    let slot_err = |source| SimError::Slot { session, source };
    let seed = plan.seed.wrapping_add(session as u64);

    let mut config = config.clone();
    config.machine.starting_balance = plan.total_bet_per_spin() * (plan.spins + 1) as f64;

    let mut machine = SlotMachine::with_config(config)
        .map_err(slot_err)?
        .with_clock(Arc::new(ManualClock::default()))
        .with_seed(seed);

    for _ in 0..plan.spins {
        machine
            .spin(plan.bet_per_line, &plan.lines)
            .map_err(slot_err)?;
    }

    let stats = machine.stats();
    let state = machine.game_state();
    log::debug!(
        "Session {session} (seed {seed}) finished: RTP {:.4}, regime {}",
        stats.rtp(),
        state.volatility.label()
    );

    Ok(SessionReport {
        session,
        seed,
        spins: stats.total_spins,
        total_bet: stats.total_bet,
        total_won: stats.total_won,
        rtp: stats.rtp(),
        ema_rtp: state.current_rtp,
        hit_rate: stats.hit_rate(),
        near_miss_spins: stats.near_miss_spins,
        jackpot_bonuses: stats.jackpot_bonuses,
        jackpots_won: stats.jackpots_won,
        max_win: stats.max_win,
        final_regime: state.volatility,
    })
}

/// Run every session of the plan in parallel
pub fn run(config: &SlotConfig, plan: &SimulationPlan) -> Result<SimulationReport, SimError> {
    plan.validate()?;
    config
        .validate()
        .map_err(|e| SimError::Slot { session: 0, source: e.into() })?;

    let threads = if plan.threads == 0 {
        num_cpus::get()
    } else {
        plan.threads
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SimError::ThreadPool(e.to_string()))?;

    log::info!(
        "Simulating {} sessions × {} spins on {} threads",
        plan.sessions,
        plan.spins,
        threads
    );

    let started = Instant::now();
    let sessions = pool.install(|| {
        (0..plan.sessions)
            .into_par_iter()
            .map(|session| run_session(config, plan, session))
            .collect::<Result<Vec<_>, _>>()
    })?;

    Ok(SimulationReport {
        plan: plan.clone(),
        adaptive: config.adaptive.enabled,
        target_rtp: config.adaptive.target_rtp,
        aggregate: AggregateReport::from_sessions(&sessions),
        sessions,
        elapsed_ms: started.elapsed().as_millis() as u64,
        generated_at: Utc::now(),
    })
}
