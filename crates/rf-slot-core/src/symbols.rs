//! Symbol definitions, the symbol catalog and weight tables

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SlotError, SlotResult};

/// Reel symbol
///
/// Declaration order is the catalog order and therefore the draw walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Symbol {
    /// ⛽️ rarest, the jackpot symbol
    FuelPump = 0,
    /// 🏎️
    RaceCar = 1,
    /// 🔔
    Bell = 2,
    /// 🪓
    Axe = 3,
    /// 💣
    Bomb = 4,
    /// 🔥 most common
    Fire = 5,
}

impl Symbol {
    /// All symbols in declaration order
    pub const ALL: [Symbol; 6] = [
        Symbol::FuelPump,
        Symbol::RaceCar,
        Symbol::Bell,
        Symbol::Axe,
        Symbol::Bomb,
        Symbol::Fire,
    ];

    /// Display glyph
    pub fn glyph(&self) -> &'static str {
        match self {
            Symbol::FuelPump => "⛽️",
            Symbol::RaceCar => "🏎️",
            Symbol::Bell => "🔔",
            Symbol::Axe => "🪓",
            Symbol::Bomb => "💣",
            Symbol::Fire => "🔥",
        }
    }

    /// Stable identifier (matches the serde name)
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::FuelPump => "fuel_pump",
            Symbol::RaceCar => "race_car",
            Symbol::Bell => "bell",
            Symbol::Axe => "axe",
            Symbol::Bomb => "bomb",
            Symbol::Fire => "fire",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Pay multipliers per run length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPayout {
    /// Three of a kind
    pub three: f64,
    /// Four of a kind (grids wider than 3 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub four: Option<f64>,
    /// Five of a kind (grids wider than 3 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub five: Option<f64>,
}

impl SymbolPayout {
    /// Three-of-a-kind only
    pub fn three(three: f64) -> Self {
        Self {
            three,
            four: None,
            five: None,
        }
    }

    /// Multiplier for a run, `None` below three.
    ///
    /// Missing upper tiers fall back to the highest defined lower tier.
    pub fn for_run(&self, run_length: usize) -> Option<f64> {
        match run_length {
            0..=2 => None,
            3 => Some(self.three),
            4 => Some(self.four.unwrap_or(self.three)),
            _ => Some(self.five.or(self.four).unwrap_or(self.three)),
        }
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.three)
            .chain(self.four)
            .chain(self.five)
    }
}

/// Static per-symbol data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolConfig {
    /// Relative draw weight (normalized at draw time)
    pub base_weight: f64,
    /// Line pay multipliers
    pub payout: SymbolPayout,
    /// Jackpot bonus multiplier per jackpot line
    pub jackpot_multiplier: f64,
    /// Flat credits for a run of exactly two
    #[serde(default)]
    pub consolation_prize: f64,
}

impl SymbolConfig {
    pub fn new(base_weight: f64, three: f64, jackpot_multiplier: f64, consolation_prize: f64) -> Self {
        Self {
            base_weight,
            payout: SymbolPayout::three(three),
            jackpot_multiplier,
            consolation_prize,
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub config: SymbolConfig,
}

/// Ordered symbol table plus jackpot eligibility rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    /// Entries in draw order
    pub entries: Vec<SymbolEntry>,
    /// Designated jackpot symbol
    pub jackpot_symbol: Symbol,
    /// Bet per line that makes a spin jackpot-eligible (exact match)
    pub max_credit_multiplier: f64,
}

impl SymbolCatalog {
    /// Standard fuel-themed catalog
    pub fn standard() -> Self {
        let entry = |symbol, config| SymbolEntry { symbol, config };
        Self {
            entries: vec![
                entry(Symbol::FuelPump, SymbolConfig::new(3.0, 100.0, 50.0, 5.0)),
                entry(Symbol::RaceCar, SymbolConfig::new(7.0, 50.0, 25.0, 3.0)),
                entry(Symbol::Bell, SymbolConfig::new(10.0, 30.0, 15.0, 2.0)),
                entry(Symbol::Axe, SymbolConfig::new(20.0, 22.0, 10.0, 1.0)),
                entry(Symbol::Bomb, SymbolConfig::new(30.0, 11.0, 5.0, 0.0)),
                entry(Symbol::Fire, SymbolConfig::new(30.0, 11.0, 5.0, 0.0)),
            ],
            jackpot_symbol: Symbol::FuelPump,
            max_credit_multiplier: 10.0,
        }
    }

    /// Read-only lookup (paytable display)
    pub fn get(&self, symbol: Symbol) -> Option<&SymbolConfig> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| &e.config)
    }

    /// Lookup that treats a missing entry as a configuration fault
    pub fn config_for(&self, symbol: Symbol) -> SlotResult<&SymbolConfig> {
        self.get(symbol).ok_or(SlotError::UnknownSymbol(symbol))
    }

    /// Symbols in draw order
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.entries.iter().map(|e| e.symbol)
    }

    /// Highest base weight; ties resolve to the last declared entry
    pub fn fallback_symbol(&self) -> Symbol {
        self.entries
            .iter()
            .max_by(|a, b| a.config.base_weight.total_cmp(&b.config.base_weight))
            .map(|e| e.symbol)
            .unwrap_or(Symbol::Fire)
    }

    /// Base weights normalized to probabilities, in catalog order
    pub fn base_weights(&self) -> SlotResult<WeightTable> {
        let mut table = WeightTable::from_pairs(
            self.entries
                .iter()
                .map(|e| (e.symbol, e.config.base_weight)),
        );
        table.normalize()?;
        Ok(table)
    }

    /// Check completeness and value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        for symbol in Symbol::ALL {
            let count = self.entries.iter().filter(|e| e.symbol == symbol).count();
            if count != 1 {
                return Err(ConfigError::Invalid(format!(
                    "symbol {} must appear exactly once in the catalog (found {})",
                    symbol.name(),
                    count
                )));
            }
        }

        for entry in &self.entries {
            let config = &entry.config;
            let values = std::iter::once(config.base_weight)
                .chain(config.payout.values())
                .chain([config.jackpot_multiplier, config.consolation_prize]);
            for value in values {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "symbol {} has a negative or non-finite value: {}",
                        entry.symbol.name(),
                        value
                    )));
                }
            }
        }

        let total: f64 = self.entries.iter().map(|e| e.config.base_weight).sum();
        if total <= 0.0 {
            return Err(ConfigError::Invalid("catalog base weights sum to zero".into()));
        }

        if !self.max_credit_multiplier.is_finite() || self.max_credit_multiplier <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_credit_multiplier must be positive, got {}",
                self.max_credit_multiplier
            )));
        }

        Ok(())
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Ordered `Symbol → weight` mapping
///
/// Iteration order is insertion order; draws walk it front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    entries: Vec<(Symbol, f64)>,
}

impl WeightTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Symbol, f64)>) -> Self {
        let mut table = Self::default();
        for (symbol, weight) in pairs {
            table.set(symbol, weight);
        }
        table
    }

    /// Weight for a symbol, zero when absent
    pub fn get(&self, symbol: Symbol) -> f64 {
        self.entries
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Set a weight, keeping the existing position for known symbols
    pub fn set(&mut self, symbol: Symbol, weight: f64) {
        match self.entries.iter_mut().find(|(s, _)| *s == symbol) {
            Some(entry) => entry.1 = weight,
            None => self.entries.push((symbol, weight)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Scale weights to sum to 1
    pub fn normalize(&mut self) -> SlotResult<()> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(SlotError::ZeroTotalWeight);
        }
        for (_, weight) in &mut self.entries {
            *weight /= total;
        }
        Ok(())
    }

    pub fn is_normalized(&self, epsilon: f64) -> bool {
        (self.total() - 1.0).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_tiers() {
        let payout = SymbolPayout {
            three: 5.0,
            four: Some(15.0),
            five: None,
        };
        assert_eq!(payout.for_run(2), None);
        assert_eq!(payout.for_run(3), Some(5.0));
        assert_eq!(payout.for_run(4), Some(15.0));
        assert_eq!(payout.for_run(5), Some(15.0));
        assert_eq!(SymbolPayout::three(7.0).for_run(5), Some(7.0));
    }

    #[test]
    fn test_standard_catalog() {
        let catalog = SymbolCatalog::standard();
        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.jackpot_symbol, Symbol::FuelPump);
        assert_eq!(catalog.symbols().collect::<Vec<_>>(), Symbol::ALL.to_vec());
        assert_eq!(catalog.config_for(Symbol::FuelPump).unwrap().payout.three, 100.0);
    }

    #[test]
    fn test_fallback_is_heaviest_last_declared() {
        // Bomb and Fire tie at 30; Fire is declared last
        assert_eq!(SymbolCatalog::standard().fallback_symbol(), Symbol::Fire);
    }

    #[test]
    fn test_missing_symbol_fails_fast() {
        let mut catalog = SymbolCatalog::standard();
        catalog.entries.retain(|e| e.symbol != Symbol::Bell);
        assert_eq!(
            catalog.config_for(Symbol::Bell),
            Err(SlotError::UnknownSymbol(Symbol::Bell))
        );
        assert!(catalog.get(Symbol::Bell).is_none());
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut catalog = SymbolCatalog::standard();
        catalog.entries[2].config.base_weight = -1.0;
        assert!(catalog.validate().is_err());

        let mut catalog = SymbolCatalog::standard();
        catalog.entries[0].config.jackpot_multiplier = f64::NAN;
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_base_weights_normalized_in_order() {
        let weights = SymbolCatalog::standard().base_weights().unwrap();
        assert!(weights.is_normalized(1e-12));
        assert_eq!(weights.iter().map(|(s, _)| s).collect::<Vec<_>>(), Symbol::ALL.to_vec());
        assert!((weights.get(Symbol::Fire) - 0.30).abs() < 1e-12);
    }

    #[test]
    fn test_weight_table_zero_total() {
        let mut table = WeightTable::from_pairs([(Symbol::Bell, 0.0), (Symbol::Axe, 0.0)]);
        assert_eq!(table.normalize(), Err(SlotError::ZeroTotalWeight));
    }

    #[test]
    fn test_weight_table_set_keeps_position() {
        let mut table = WeightTable::from_pairs([(Symbol::Bell, 1.0), (Symbol::Axe, 2.0)]);
        table.set(Symbol::Bell, 4.0);
        assert_eq!(table.iter().next(), Some((Symbol::Bell, 4.0)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_catalog_serde() {
        let json = serde_json::to_string(&SymbolCatalog::standard()).unwrap();
        assert!(json.contains("\"fuel_pump\""));
        let back: SymbolCatalog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SymbolCatalog::standard());
    }
}
