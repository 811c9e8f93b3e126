//! Adaptive weight controller
//!
//! Recomputes symbol weights before every spin so the session's return
//! tracks a target RTP:
//!
//! ```text
//! begin_spin ──► jackpot track (spins, bet, idle time, decay)
//!            ──► RTP track (EMA gap × regime boost, loss streak boost)
//!            ──► variance jitter ──► normalize
//! record_outcome ──► EMA, streaks, regime window
//! ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SlotResult};
use crate::symbols::{Symbol, SymbolCatalog, WeightTable};

// ═══════════════════════════════════════════════════════════════════════════════
// VOLATILITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Session volatility regime, derived from the observed win rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VolatilityRegime {
    Low,
    #[default]
    Medium,
    High,
}

impl VolatilityRegime {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Per-regime tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPreset {
    /// Width of the random jitter applied to each weight
    pub weight_variance: f64,
    /// Scales the RTP correction
    pub boost_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityPresets {
    pub low: VolatilityPreset,
    pub medium: VolatilityPreset,
    pub high: VolatilityPreset,
}

impl VolatilityPresets {
    pub fn get(&self, regime: VolatilityRegime) -> &VolatilityPreset {
        match regime {
            VolatilityRegime::Low => &self.low,
            VolatilityRegime::Medium => &self.medium,
            VolatilityRegime::High => &self.high,
        }
    }
}

impl Default for VolatilityPresets {
    fn default() -> Self {
        Self {
            low: VolatilityPreset { weight_variance: 0.1, boost_multiplier: 1.5 },
            medium: VolatilityPreset { weight_variance: 0.2, boost_multiplier: 2.0 },
            high: VolatilityPreset { weight_variance: 0.3, boost_multiplier: 2.5 },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// RTP tracking parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Disable to draw from base weights (jackpot track still applies)
    pub enabled: bool,
    pub target_rtp: f64,
    /// EMA smoothing factor
    pub ema_alpha: f64,
    pub boost_step: f64,
    pub max_boost: f64,
    /// Symbols paying at most this for three are "low payout"
    pub high_payout_threshold: f64,
    /// Loss streak length after which the boost grows
    pub loss_boost_start: u32,
    pub loss_boost_step: f64,
    /// Near-miss probability per consecutive loss
    pub near_miss_step: f64,
    pub near_miss_cap: f64,
    /// Spins between regime re-evaluations
    pub regime_window: u64,
    pub low_win_rate: f64,
    pub high_win_rate: f64,
    pub presets: VolatilityPresets,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_rtp: 0.95,
            ema_alpha: 0.1,
            boost_step: 0.05,
            max_boost: 2.0,
            high_payout_threshold: 12.0,
            loss_boost_start: 5,
            loss_boost_step: 0.1,
            near_miss_step: 0.05,
            near_miss_cap: 0.5,
            regime_window: 10,
            low_win_rate: 0.2,
            high_win_rate: 0.4,
            presets: VolatilityPresets::default(),
        }
    }
}

impl AdaptiveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = [
            ("ema_alpha", self.ema_alpha),
            ("near_miss_cap", self.near_miss_cap),
            ("low_win_rate", self.low_win_rate),
            ("high_win_rate", self.high_win_rate),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("adaptive.{name} must be in [0, 1], got {value}")));
            }
        }
        let non_negative = [
            ("target_rtp", self.target_rtp),
            ("boost_step", self.boost_step),
            ("max_boost", self.max_boost),
            ("loss_boost_step", self.loss_boost_step),
            ("near_miss_step", self.near_miss_step),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("adaptive.{name} must be non-negative, got {value}")));
            }
        }
        if self.regime_window == 0 {
            return Err(ConfigError::Invalid("adaptive.regime_window must be at least 1".into()));
        }
        if self.low_win_rate > self.high_win_rate {
            return Err(ConfigError::Invalid("adaptive.low_win_rate exceeds high_win_rate".into()));
        }
        Ok(())
    }
}

/// Jackpot symbol weight track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JackpotWeightConfig {
    pub base_weight: f64,
    pub max_weight: f64,
    /// Added per spin since the last jackpot
    pub spin_boost: f64,
    /// Added per credit of total bet
    pub bet_boost: f64,
    /// Added per idle minute
    pub time_boost: f64,
    /// Per-minute decay once idle for more than a minute
    pub decay_rate: f64,
    pub reset_on_jackpot: bool,
}

impl Default for JackpotWeightConfig {
    fn default() -> Self {
        Self {
            base_weight: 0.02,
            max_weight: 0.10,
            spin_boost: 0.001,
            bet_boost: 0.0001,
            time_boost: 0.0005,
            decay_rate: 0.95,
            reset_on_jackpot: true,
        }
    }
}

impl JackpotWeightConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("base_weight", self.base_weight),
            ("max_weight", self.max_weight),
            ("spin_boost", self.spin_boost),
            ("bet_boost", self.bet_boost),
            ("time_boost", self.time_boost),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("jackpot.{name} must be non-negative, got {value}")));
            }
        }
        if self.base_weight > self.max_weight {
            return Err(ConfigError::Invalid("jackpot.base_weight exceeds max_weight".into()));
        }
        if !(0.0..=1.0).contains(&self.decay_rate) {
            return Err(ConfigError::Invalid(format!(
                "jackpot.decay_rate must be in [0, 1], got {}",
                self.decay_rate
            )));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Session bookkeeping carried between spins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Exponential moving average of per-spin return
    pub current_rtp: f64,
    pub session_wins: u64,
    pub session_spins: u64,
    pub volatility: VolatilityRegime,
    pub last_win_amount: f64,
    pub consecutive_losses: u32,
    pub spins_since_jackpot: u64,
    pub total_wagered: f64,
    pub total_won: f64,
    pub last_activity: DateTime<Utc>,
    pub jackpot_weight: f64,
}

impl GameState {
    pub fn new(target_rtp: f64, jackpot_weight: f64, now: DateTime<Utc>) -> Self {
        Self {
            current_rtp: target_rtp,
            session_wins: 0,
            session_spins: 0,
            volatility: VolatilityRegime::Medium,
            last_win_amount: 0.0,
            consecutive_losses: 0,
            spins_since_jackpot: 0,
            total_wagered: 0.0,
            total_won: 0.0,
            last_activity: now,
            jackpot_weight,
        }
    }

    /// Total won over total wagered
    pub fn realized_rtp(&self) -> f64 {
        if self.total_wagered > 0.0 {
            self.total_won / self.total_wagered
        } else {
            0.0
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.session_spins > 0 {
            self.session_wins as f64 / self.session_spins as f64
        } else {
            0.0
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROLLER
// ═══════════════════════════════════════════════════════════════════════════════

/// Saved controller state, see [`AdaptiveWeightController::checkpoint`]
#[derive(Debug, Clone)]
pub struct ControllerCheckpoint {
    state: GameState,
    weights: WeightTable,
}

/// Owns the game state and the current weight table
#[derive(Debug, Clone)]
pub struct AdaptiveWeightController {
    catalog: SymbolCatalog,
    base_shares: WeightTable,
    config: AdaptiveConfig,
    jackpot: JackpotWeightConfig,
    state: GameState,
    weights: WeightTable,
}

impl AdaptiveWeightController {
    pub fn new(
        catalog: SymbolCatalog,
        config: AdaptiveConfig,
        jackpot: JackpotWeightConfig,
        now: DateTime<Utc>,
    ) -> SlotResult<Self> {
        config.validate()?;
        jackpot.validate()?;
        let base_shares = catalog.base_weights()?;
        let state = GameState::new(config.target_rtp, jackpot.base_weight, now);
        let mut controller = Self {
            catalog,
            weights: base_shares.clone(),
            base_shares,
            config,
            jackpot,
            state,
        };
        controller.weights = controller.static_weights()?;
        Ok(controller)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Replace the game state, e.g. when resuming a persisted session
    pub fn restore_state(&mut self, state: GameState) {
        self.state = state;
    }

    /// Snapshot of state and weights, taken before a spin that may fail
    pub fn checkpoint(&self) -> ControllerCheckpoint {
        ControllerCheckpoint {
            state: self.state.clone(),
            weights: self.weights.clone(),
        }
    }

    /// Undo everything since `checkpoint`
    pub fn rollback(&mut self, checkpoint: ControllerCheckpoint) {
        self.state = checkpoint.state;
        self.weights = checkpoint.weights;
    }

    /// Mark activity without spinning (resets the idle timer)
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.state.last_activity = now;
    }

    /// Weights used for the most recent draw, normalized
    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn regime(&self) -> VolatilityRegime {
        self.state.volatility
    }

    /// Per-column near-miss probability for the next draw
    pub fn near_miss_probability(&self) -> f64 {
        (self.state.consecutive_losses as f64 * self.config.near_miss_step).min(self.config.near_miss_cap)
    }

    /// Update counters and recompute weights ahead of a draw
    pub fn begin_spin<R: Rng + ?Sized>(
        &mut self,
        total_bet: f64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SlotResult<&WeightTable> {
        self.state.session_spins += 1;
        self.state.spins_since_jackpot += 1;
        self.state.total_wagered += total_bet;

        self.update_jackpot_weight(total_bet, now);

        self.weights = if self.config.enabled {
            self.adjusted_weights(rng)?
        } else {
            self.static_weights()?
        };
        Ok(&self.weights)
    }

    /// Feed back the credited amount of a finished spin
    pub fn record_outcome(&mut self, win: f64, total_bet: f64, jackpot_hit: bool) {
        if total_bet > 0.0 {
            let alpha = self.config.ema_alpha;
            self.state.current_rtp = (1.0 - alpha) * self.state.current_rtp + alpha * (win / total_bet);
        }
        self.state.total_won += win;

        if win > 0.0 {
            self.state.session_wins += 1;
            self.state.last_win_amount = win;
            self.state.consecutive_losses = 0;
            if jackpot_hit && self.jackpot.reset_on_jackpot {
                self.state.spins_since_jackpot = 0;
                self.state.jackpot_weight = self.jackpot.base_weight;
            }
        } else {
            self.state.consecutive_losses += 1;
        }

        if self.state.session_spins > 0 && self.state.session_spins % self.config.regime_window == 0 {
            self.update_regime();
        }
    }

    fn update_regime(&mut self) {
        let win_rate = self.state.win_rate();
        let regime = if win_rate < self.config.low_win_rate {
            VolatilityRegime::Low
        } else if win_rate > self.config.high_win_rate {
            VolatilityRegime::High
        } else {
            VolatilityRegime::Medium
        };
        if regime != self.state.volatility {
            log::info!(
                "Volatility regime {} -> {} (win rate {:.3} after {} spins)",
                self.state.volatility.label(),
                regime.label(),
                win_rate,
                self.state.session_spins
            );
            self.state.volatility = regime;
        }
    }

    fn update_jackpot_weight(&mut self, total_bet: f64, now: DateTime<Utc>) {
        let idle_ms = (now - self.state.last_activity).num_milliseconds().max(0);
        let minutes = idle_ms as f64 / 60_000.0;
        self.state.last_activity = now;

        let jp = &self.jackpot;
        let mut weight = (jp.base_weight
            + self.state.spins_since_jackpot as f64 * jp.spin_boost
            + total_bet * jp.bet_boost
            + minutes * jp.time_boost)
            .min(jp.max_weight);
        if minutes > 1.0 {
            weight *= jp.decay_rate.powf(minutes);
        }
        self.state.jackpot_weight = weight;
    }

    fn static_weights(&self) -> SlotResult<WeightTable> {
        let jackpot_symbol = self.catalog.jackpot_symbol;
        let mut table = WeightTable::from_pairs(self.base_shares.iter().map(|(symbol, share)| {
            if symbol == jackpot_symbol {
                (symbol, self.state.jackpot_weight)
            } else {
                (symbol, share)
            }
        }));
        table.normalize()?;
        Ok(table)
    }

    fn adjusted_weights<R: Rng + ?Sized>(&self, rng: &mut R) -> SlotResult<WeightTable> {
        let diff = self.config.target_rtp - self.state.current_rtp;
        let preset = self.config.presets.get(self.state.volatility);

        let mut boost = (diff.abs() * self.config.boost_step * preset.boost_multiplier).min(self.config.max_boost);
        if self.state.consecutive_losses > self.config.loss_boost_start {
            let excess = (self.state.consecutive_losses - self.config.loss_boost_start) as f64;
            boost *= 1.0 + excess * self.config.loss_boost_step;
        }

        let jackpot_symbol = self.catalog.jackpot_symbol;
        let mut table = WeightTable::default();
        for (symbol, share) in self.base_shares.iter() {
            if symbol == jackpot_symbol {
                table.set(symbol, self.state.jackpot_weight);
                continue;
            }
            let low_payout = self.catalog.config_for(symbol)?.payout.three <= self.config.high_payout_threshold;
            // Behind target favors frequent small wins, ahead favors rare large ones
            let favored = low_payout == (diff > 0.0);
            let adjusted = if favored { share * (1.0 + boost) } else { share * (1.0 - boost) };
            let jitter = 1.0 + (rng.random::<f64>() - 0.5) * preset.weight_variance;
            table.set(symbol, adjusted.max(0.0) * jitter);
        }
        table.normalize()?;
        Ok(table)
    }

    /// Normalized weight of one symbol in the current table
    pub fn weight_of(&self, symbol: Symbol) -> f64 {
        self.weights.get(symbol)
    }
}
