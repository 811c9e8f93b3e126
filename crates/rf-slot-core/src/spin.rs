//! Spin outcome returned by the machine

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::paytable::WinResult;
use crate::symbols::{Symbol, WeightTable};

/// Complete result of one spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    /// Spin ID ("spin-000001", ...)
    pub spin_id: String,
    pub grid: Grid,
    pub bet_per_line: f64,
    /// `bet_per_line × active lines`
    pub total_bet: f64,
    pub win: WinResult,
    /// Pool paid out on a full jackpot, otherwise 0
    pub pool_award: f64,
    /// Balance after the spin settled
    pub balance: f64,
    /// Pool after contribution and any award
    pub jackpot_pool: f64,
    /// Weights the grid was drawn from
    pub weights: WeightTable,
}

impl SpinOutcome {
    /// Winnings plus any pool award
    pub fn credited(&self) -> f64 {
        self.win.winnings + self.pool_award
    }

    pub fn is_win(&self) -> bool {
        self.win.is_win()
    }

    pub fn is_jackpot(&self) -> bool {
        self.win.jackpot
    }

    /// Credited amount over total bet
    pub fn win_ratio(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.credited() / self.total_bet
        } else {
            0.0
        }
    }

    /// Symbol of the best-paying winning line
    pub fn top_symbol(&self) -> Option<Symbol> {
        self.win
            .lines
            .iter()
            .max_by(|a, b| a.amount.total_cmp(&b.amount))
            .map(|w| w.symbol)
    }
}
