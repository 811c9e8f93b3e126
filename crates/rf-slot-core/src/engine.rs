//! Slot machine: wallet, jackpot pool and the spin sequence

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adaptive::{AdaptiveWeightController, GameState};
use crate::config::SlotConfig;
use crate::error::{SlotError, SlotResult};
use crate::grid::Grid;
use crate::outcome::OutcomeGenerator;
use crate::paytable::{PayTable, WinResult, payline};
use crate::ports::{
    AudioPort, Clock, MemorySessionStore, SessionStore, SilentAudio, SoundCue, SystemClock,
};
use crate::spin::SpinOutcome;
use crate::symbols::{Symbol, SymbolConfig, WeightTable};

/// Session flag set once the intro has been shown
pub const INTRO_FLAG: &str = "has_seen_intro";

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub total_bet: f64,
    /// Winnings plus pool awards
    pub total_won: f64,
    pub wins: u64,
    pub losses: u64,
    pub near_miss_spins: u64,
    pub consolation_paid: f64,
    /// Spins that paid a jackpot bonus
    pub jackpot_bonuses: u64,
    /// Full jackpots (pool awarded)
    pub jackpots_won: u64,
    pub pool_awarded: f64,
    pub max_win: f64,
}

impl SessionStats {
    /// Realized return-to-player as a fraction of total bet
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_won / self.total_bet
        } else {
            0.0
        }
    }

    /// Fraction of spins with at least one winning line
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            self.wins as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    fn record(&mut self, outcome: &SpinOutcome) {
        self.total_spins += 1;
        self.total_bet += outcome.total_bet;
        self.total_won += outcome.credited();

        if outcome.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if !outcome.win.near_misses.is_empty() {
            self.near_miss_spins += 1;
            self.consolation_paid += outcome.win.consolation_total();
        }
        if outcome.win.jackpot_paid() {
            self.jackpot_bonuses += 1;
        }
        if outcome.is_jackpot() {
            self.jackpots_won += 1;
            self.pool_awarded += outcome.pool_award;
        }
        self.max_win = self.max_win.max(outcome.credited());
    }
}

/// Adaptive slot machine
///
/// Owns the wallet balance, the progressive jackpot pool, the weight
/// controller and the outcome generator. One spin at a time; wrap it in
/// [`crate::shared::SharedSlotMachine`] to reject overlapping spins.
pub struct SlotMachine {
    config: SlotConfig,
    paytable: PayTable,
    controller: AdaptiveWeightController,
    generator: OutcomeGenerator,
    audio: Arc<dyn AudioPort>,
    session: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    balance: f64,
    jackpot_pool: f64,
    spin_count: u64,
    stats: SessionStats,
}

impl SlotMachine {
    /// Machine with the default configuration
    pub fn new() -> SlotResult<Self> {
        Self::with_config(SlotConfig::default())
    }

    /// Machine from a validated configuration, entropy-seeded
    pub fn with_config(config: SlotConfig) -> SlotResult<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let paytable = PayTable::new(config.catalog.clone(), config.evaluator.clone());
        let controller = AdaptiveWeightController::new(
            config.catalog.clone(),
            config.adaptive.clone(),
            config.jackpot.clone(),
            clock.now(),
        )?;
        let generator = OutcomeGenerator::new(config.catalog.fallback_symbol());

        Ok(Self {
            balance: config.machine.starting_balance,
            jackpot_pool: config.machine.jackpot_seed,
            config,
            paytable,
            controller,
            generator,
            audio: Arc::new(SilentAudio),
            session: Arc::new(MemorySessionStore::new()),
            clock,
            spin_count: 0,
            stats: SessionStats::default(),
        })
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioPort>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = session;
        self
    }

    /// Swap the clock; the idle timer restarts from the new clock's time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.controller.touch(clock.now());
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed(seed);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn jackpot_pool(&self) -> f64 {
        self.jackpot_pool
    }

    /// Weights used by the most recent spin
    pub fn current_weights(&self) -> &WeightTable {
        self.controller.weights()
    }

    /// Paytable display lookup
    pub fn symbol_config(&self, symbol: Symbol) -> Option<&SymbolConfig> {
        self.paytable.symbol_config(symbol)
    }

    pub fn game_state(&self) -> &GameState {
        self.controller.state()
    }

    /// Resume a persisted session
    pub fn restore_game_state(&mut self, state: GameState) {
        self.controller.restore_state(state);
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn paytable(&self) -> &PayTable {
        &self.paytable
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Seed the outcome generator for reproducible results
    pub fn seed(&mut self, seed: u64) {
        self.generator.seed(seed);
    }

    /// Balance and pool back to their starting values; game state is kept
    pub fn reset(&mut self) {
        self.balance = self.config.machine.starting_balance;
        self.jackpot_pool = self.config.machine.jackpot_seed;
    }

    /// True the first time it is called for a session store
    pub fn take_intro_flag(&self) -> bool {
        if self.session.get_flag(INTRO_FLAG) {
            false
        } else {
            self.session.set_flag(INTRO_FLAG, true);
            true
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check a spin request without touching any state; returns the total bet
    pub fn validate_spin(&self, bet_per_line: f64, active_lines: &[usize]) -> SlotResult<f64> {
        if !bet_per_line.is_finite() || bet_per_line <= 0.0 {
            return Err(SlotError::InvalidBet(bet_per_line));
        }
        if active_lines.is_empty() {
            return Err(SlotError::NoActiveLines);
        }
        for &index in active_lines {
            payline(index)?;
        }
        let total_bet = bet_per_line * active_lines.len() as f64;
        if self.balance < total_bet {
            return Err(SlotError::InsufficientBalance {
                balance: self.balance,
                required: total_bet,
            });
        }
        Ok(total_bet)
    }

    /// Execute one spin
    pub fn spin(&mut self, bet_per_line: f64, active_lines: &[usize]) -> SlotResult<SpinOutcome> {
        let total_bet = match self.validate_spin(bet_per_line, active_lines) {
            Ok(total) => total,
            Err(e) => {
                log::warn!("Spin rejected: {e}");
                return Err(e);
            }
        };

        let controller_checkpoint = self.controller.checkpoint();
        let rng_checkpoint = self.generator.rng_mut().clone();
        let (grid, weights, win) = match self.draw_and_evaluate(total_bet, bet_per_line, active_lines) {
            Ok(drawn) => drawn,
            Err(e) => {
                self.controller.rollback(controller_checkpoint);
                *self.generator.rng_mut() = rng_checkpoint;
                log::warn!("Spin aborted, machine state restored: {e}");
                return Err(e);
            }
        };

        self.audio.play(SoundCue::Spin);
        self.spin_count += 1;
        self.balance -= total_bet;
        self.jackpot_pool += total_bet * self.config.machine.jackpot_contribution;

        let pool_award = if win.jackpot {
            let award = self.jackpot_pool;
            self.jackpot_pool = self.config.machine.jackpot_seed;
            log::info!("JACKPOT! Pool of {award:.2} awarded on spin {}", self.spin_count);
            award
        } else {
            0.0
        };

        let credited = win.winnings + pool_award;
        self.balance += credited;
        self.controller
            .record_outcome(credited, total_bet, win.jackpot_paid());

        let outcome = SpinOutcome {
            spin_id: format!("spin-{:06}", self.spin_count),
            grid,
            bet_per_line,
            total_bet,
            win,
            pool_award,
            balance: self.balance,
            jackpot_pool: self.jackpot_pool,
            weights,
        };

        self.emit_cues(&outcome);
        self.stats.record(&outcome);

        let state = self.controller.state();
        log::debug!(
            "{}: bet {} won {} | rtp ema {:.4} | regime {} | losses {} | jackpot weight {:.4}\n{}",
            outcome.spin_id,
            total_bet,
            credited,
            state.current_rtp,
            state.volatility.label(),
            state.consecutive_losses,
            state.jackpot_weight,
            outcome.grid
        );

        Ok(outcome)
    }

    /// Weights, grid and evaluation for one spin; only the controller and RNG are touched
    fn draw_and_evaluate(
        &mut self,
        total_bet: f64,
        bet_per_line: f64,
        active_lines: &[usize],
    ) -> SlotResult<(Grid, WeightTable, WinResult)> {
        let now = self.clock.now();
        let near_miss_probability = self.controller.near_miss_probability();
        let weights = self
            .controller
            .begin_spin(total_bet, now, self.generator.rng_mut())?;
        let grid = self
            .generator
            .generate_adaptive_grid(weights, near_miss_probability)?;
        let weights = weights.clone();
        let win = self.paytable.evaluate(&grid, active_lines, bet_per_line)?;
        Ok((grid, weights, win))
    }

    fn emit_cues(&self, outcome: &SpinOutcome) {
        if outcome.is_jackpot() {
            self.audio.play(SoundCue::Jackpot);
        } else if let Some(symbol) = outcome.top_symbol() {
            self.audio.play(SoundCue::Win(symbol));
        }
        if !outcome.win.near_misses.is_empty() {
            self.audio.play(SoundCue::NearMiss);
        }
    }
}
