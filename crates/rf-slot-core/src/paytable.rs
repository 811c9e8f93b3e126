//! Pay-lines and win evaluation

use serde::{Deserialize, Serialize};

use crate::error::{SlotError, SlotResult};
use crate::grid::{Grid, Position};
use crate::symbols::{Symbol, SymbolCatalog, SymbolConfig, WeightTable};

/// A fixed pay-line: three grid positions read in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PayLine {
    /// Line index (0-based)
    pub index: usize,
    /// Display name
    pub name: &'static str,
    /// Positions as (column, row), first position anchors the run
    pub positions: [Position; 3],
}

impl PayLine {
    /// Symbols under this line
    pub fn symbols(&self, grid: &Grid) -> [Symbol; 3] {
        self.positions.map(|pos| grid.get(pos))
    }
}

/// The 8-line catalog: 3 horizontal, 2 diagonal, 3 vertical
pub const PAYLINES: [PayLine; 8] = [
    PayLine { index: 0, name: "top row", positions: [(0, 0), (1, 0), (2, 0)] },
    PayLine { index: 1, name: "middle row", positions: [(0, 1), (1, 1), (2, 1)] },
    PayLine { index: 2, name: "bottom row", positions: [(0, 2), (1, 2), (2, 2)] },
    PayLine { index: 3, name: "diagonal main", positions: [(0, 0), (1, 1), (2, 2)] },
    PayLine { index: 4, name: "diagonal anti", positions: [(2, 0), (1, 1), (0, 2)] },
    PayLine { index: 5, name: "left column", positions: [(0, 0), (0, 1), (0, 2)] },
    PayLine { index: 6, name: "middle column", positions: [(1, 0), (1, 1), (1, 2)] },
    PayLine { index: 7, name: "right column", positions: [(2, 0), (2, 1), (2, 2)] },
];

/// All line indices
pub const ALL_LINES: [usize; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// A player-facing line preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSelection {
    pub label: &'static str,
    pub lines: &'static [usize],
}

/// Line presets offered at the bet panel
pub const LINE_SELECTIONS: [LineSelection; 4] = [
    LineSelection { label: "1 Line", lines: &[1] },
    LineSelection { label: "3 Lines", lines: &[0, 1, 2] },
    LineSelection { label: "5 Lines", lines: &[0, 1, 2, 3, 4] },
    LineSelection { label: "8 Lines", lines: &ALL_LINES },
];

/// Bet-per-line steps offered at the bet panel; the top step is the
/// standard catalog's jackpot-eligible bet
pub const CREDIT_MULTIPLIERS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];

/// Preset with exactly `count` lines
pub fn line_selection(count: usize) -> Option<&'static LineSelection> {
    LINE_SELECTIONS.iter().find(|s| s.lines.len() == count)
}

/// Resolve a line index
pub fn payline(index: usize) -> SlotResult<&'static PayLine> {
    PAYLINES.get(index).ok_or(SlotError::InvalidLineIndex(index))
}

/// Length of the run of identical symbols starting at the first position
pub fn run_length(symbols: &[Symbol]) -> usize {
    match symbols.first() {
        Some(first) => symbols.iter().take_while(|s| *s == first).count(),
        None => 0,
    }
}

/// A winning pay-line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    pub line_index: usize,
    pub symbol: Symbol,
    /// Matched run length (3 on a 3×3 grid)
    pub match_count: usize,
    /// Pay multiplier applied
    pub multiplier: f64,
    /// `multiplier × bet_per_line`, before the multi-line bonus
    pub amount: f64,
}

/// A two-symbol run that paid a consolation prize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearMiss {
    pub line_index: usize,
    pub symbol: Symbol,
    pub consolation_prize: f64,
}

/// Aggregate evaluation of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinResult {
    /// Total credits won (same unit as the bet)
    pub winnings: f64,
    /// Every active line won with the jackpot symbol at the jackpot bet
    pub jackpot: bool,
    /// Jackpot symbol, set whenever a jackpot bonus was paid
    pub symbol: Option<Symbol>,
    /// Additive jackpot component of `winnings`
    pub jackpot_bonus: f64,
    /// Multi-line factor applied to regular winnings (1.0 when none)
    pub multi_line_bonus: f64,
    pub lines: Vec<LineWin>,
    pub near_misses: Vec<NearMiss>,
}

impl WinResult {
    fn empty() -> Self {
        Self {
            winnings: 0.0,
            jackpot: false,
            symbol: None,
            jackpot_bonus: 0.0,
            multi_line_bonus: 1.0,
            lines: Vec::new(),
            near_misses: Vec::new(),
        }
    }

    /// At least one line matched (consolation alone is not a win)
    pub fn is_win(&self) -> bool {
        !self.lines.is_empty()
    }

    /// A jackpot bonus was paid on this spin
    pub fn jackpot_paid(&self) -> bool {
        self.jackpot_bonus > 0.0
    }

    pub fn consolation_total(&self) -> f64 {
        self.near_misses.iter().map(|n| n.consolation_prize).sum()
    }
}

/// Evaluator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Per-winning-line step of the multi-line bonus factor
    pub multi_line_bonus_step: f64,
    /// Pay consolation prizes for runs of exactly two
    pub consolation_enabled: bool,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            multi_line_bonus_step: 0.1,
            consolation_enabled: true,
        }
    }
}

/// Symbol catalog plus evaluation rules
#[derive(Debug, Clone)]
pub struct PayTable {
    pub catalog: SymbolCatalog,
    pub config: EvaluatorConfig,
}

impl PayTable {
    pub fn new(catalog: SymbolCatalog, config: EvaluatorConfig) -> Self {
        Self { catalog, config }
    }

    /// Standard catalog with default rules
    pub fn standard() -> Self {
        Self::new(SymbolCatalog::standard(), EvaluatorConfig::default())
    }

    /// Paytable display lookup
    pub fn symbol_config(&self, symbol: Symbol) -> Option<&SymbolConfig> {
        self.catalog.get(symbol)
    }

    /// Evaluate a grid against the active lines
    pub fn evaluate(
        &self,
        grid: &Grid,
        active_lines: &[usize],
        bet_per_line: f64,
    ) -> SlotResult<WinResult> {
        if !bet_per_line.is_finite() || bet_per_line <= 0.0 {
            return Err(SlotError::InvalidBet(bet_per_line));
        }
        if active_lines.is_empty() {
            return Err(SlotError::NoActiveLines);
        }
        let lines = active_lines
            .iter()
            .map(|&index| payline(index))
            .collect::<SlotResult<Vec<_>>>()?;

        let mut result = WinResult::empty();

        for line in lines {
            let symbols = line.symbols(grid);
            let run = run_length(&symbols);
            let symbol = symbols[0];
            let config = self.catalog.config_for(symbol)?;

            if let Some(multiplier) = config.payout.for_run(run) {
                result.lines.push(LineWin {
                    line_index: line.index,
                    symbol,
                    match_count: run,
                    multiplier,
                    amount: multiplier * bet_per_line,
                });
            } else if run == 2 && self.config.consolation_enabled && config.consolation_prize > 0.0 {
                result.near_misses.push(NearMiss {
                    line_index: line.index,
                    symbol,
                    consolation_prize: config.consolation_prize,
                });
            }
        }

        let mut regular: f64 = result.lines.iter().map(|w| w.amount).sum();
        if result.lines.len() > 1 {
            let factor = 1.0 + self.config.multi_line_bonus_step * result.lines.len() as f64;
            regular = (regular * factor).floor();
            result.multi_line_bonus = factor;
        }

        let jackpot_symbol = self.catalog.jackpot_symbol;
        if bet_per_line == self.catalog.max_credit_multiplier {
            let jackpot_lines = result
                .lines
                .iter()
                .filter(|w| w.symbol == jackpot_symbol)
                .count();
            if jackpot_lines > 0 {
                let jackpot_multiplier = self.catalog.config_for(jackpot_symbol)?.jackpot_multiplier;
                result.jackpot_bonus = jackpot_lines as f64 * jackpot_multiplier * bet_per_line;
                result.symbol = Some(jackpot_symbol);
                result.jackpot = result.lines.len() == active_lines.len()
                    && result.lines.iter().all(|w| w.symbol == jackpot_symbol);
                log::debug!(
                    "Jackpot bonus {} on {} line(s), full jackpot: {}",
                    result.jackpot_bonus,
                    jackpot_lines,
                    result.jackpot
                );
            }
        }

        result.winnings = regular + result.jackpot_bonus + result.consolation_total();
        Ok(result)
    }

    /// Theoretical single-line return for a weight table (independent cells)
    pub fn expected_line_rtp(&self, weights: &WeightTable) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            return 0.0;
        }
        weights
            .iter()
            .filter_map(|(symbol, weight)| {
                let config = self.catalog.get(symbol)?;
                let p = weight / total;
                let line = p.powi(3) * config.payout.three;
                let consolation = if self.config.consolation_enabled {
                    p * p * (1.0 - p) * config.consolation_prize
                } else {
                    0.0
                };
                Some(line + consolation)
            })
            .sum()
    }
}

impl Default for PayTable {
    fn default() -> Self {
        Self::standard()
    }
}
