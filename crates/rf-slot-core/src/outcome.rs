//! Outcome generator: weighted symbol draws and grid generation

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{SlotError, SlotResult};
use crate::grid::{COLUMNS, Grid, ROWS};
use crate::symbols::{Symbol, WeightTable};

/// Walk the table in catalog order until `point` falls inside a symbol's band
///
/// A point at or past the summed weights (float drift when the draw lands
/// at the top of the range) falls through to `fallback`.
pub fn pick(weights: &WeightTable, point: f64, fallback: Symbol) -> Symbol {
    let mut remaining = point;
    for (symbol, weight) in weights.iter() {
        if remaining < weight {
            return symbol;
        }
        remaining -= weight;
    }
    log::warn!(
        "Weighted draw fell through (remainder {remaining:e}), using {}",
        fallback.name()
    );
    fallback
}

/// Draws symbols from a weight table
///
/// The walk iterates the table in catalog order, so the same seed and the
/// same weights always yield the same grid.
pub struct OutcomeGenerator {
    rng: ChaCha8Rng,
    fallback: Symbol,
}

impl OutcomeGenerator {
    /// Entropy-seeded generator
    pub fn new(fallback: Symbol) -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
            fallback,
        }
    }

    /// Reproducible generator
    pub fn seeded(seed: u64, fallback: Symbol) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            fallback,
        }
    }

    /// Reseed in place
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Underlying RNG, shared with the weight controller's variance jitter
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Draw one symbol
    pub fn draw(&mut self, weights: &WeightTable) -> SlotResult<Symbol> {
        let total = weights.total();
        if !total.is_finite() || total <= 0.0 {
            return Err(SlotError::ZeroTotalWeight);
        }
        let point = self.rng.random::<f64>() * total;
        Ok(pick(weights, point, self.fallback))
    }

    /// Nine independent draws, column by column
    pub fn generate_grid(&mut self, weights: &WeightTable) -> SlotResult<Grid> {
        let mut cells = [[self.fallback; ROWS]; COLUMNS];
        for column in cells.iter_mut() {
            for cell in column.iter_mut() {
                *cell = self.draw(weights)?;
            }
        }
        Ok(Grid::from_columns(cells))
    }

    /// Column with two positions forced to `target` and one drawn normally
    ///
    /// The drawn position may itself land on `target`.
    pub fn generate_near_miss_column(
        &mut self,
        target: Symbol,
        weights: &WeightTable,
    ) -> SlotResult<[Symbol; ROWS]> {
        let mut column = [target; ROWS];
        let miss = self.rng.random_range(0..ROWS);
        column[miss] = self.draw(weights)?;
        Ok(column)
    }

    /// Grid where each column independently becomes a near-miss column
    /// with probability `near_miss_probability`
    pub fn generate_adaptive_grid(
        &mut self,
        weights: &WeightTable,
        near_miss_probability: f64,
    ) -> SlotResult<Grid> {
        let p = near_miss_probability.clamp(0.0, 1.0);
        let mut cells = [[self.fallback; ROWS]; COLUMNS];
        for column in cells.iter_mut() {
            if p > 0.0 && self.rng.random_bool(p) {
                let target = self.draw(weights)?;
                *column = self.generate_near_miss_column(target, weights)?;
            } else {
                for cell in column.iter_mut() {
                    *cell = self.draw(weights)?;
                }
            }
        }
        Ok(Grid::from_columns(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolCatalog;

    #[test]
    fn test_pick_bands_follow_catalog_order() {
        let w = WeightTable::from_pairs([(Symbol::Bell, 0.25), (Symbol::Axe, 0.0), (Symbol::Bomb, 0.75)]);
        assert_eq!(pick(&w, 0.0, Symbol::Fire), Symbol::Bell);
        assert_eq!(pick(&w, 0.2499, Symbol::Fire), Symbol::Bell);
        // Zero-weight symbols own no band
        assert_eq!(pick(&w, 0.25, Symbol::Fire), Symbol::Bomb);
        assert_eq!(pick(&w, 0.9999, Symbol::Fire), Symbol::Bomb);
    }

    #[test]
    fn test_pick_falls_back_past_the_total() {
        let catalog = SymbolCatalog::standard();
        let fallback = catalog.fallback_symbol();
        let w = WeightTable::from_pairs([(Symbol::FuelPump, 0.1), (Symbol::RaceCar, 0.2), (Symbol::Bell, 0.3)]);

        // Draw landed at the very top while the bands sum short of it
        let short_total = w.total() + 1e-12;
        assert_eq!(pick(&w, short_total * (1.0 - f64::EPSILON), fallback), fallback);
        assert_eq!(pick(&w, 1.0, fallback), fallback);
        assert_eq!(fallback, Symbol::Fire);
    }

    fn weights() -> WeightTable {
        SymbolCatalog::standard().base_weights().unwrap()
    }

    #[test]
    fn test_seeded_draws_reproducible() {
        let w = weights();
        let mut a = OutcomeGenerator::seeded(42, Symbol::Fire);
        let mut b = OutcomeGenerator::seeded(42, Symbol::Fire);
        for _ in 0..50 {
            assert_eq!(a.generate_grid(&w).unwrap(), b.generate_grid(&w).unwrap());
        }
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let w = weights();
        let mut generator = OutcomeGenerator::seeded(7, Symbol::Fire);
        let first = generator.generate_grid(&w).unwrap();
        generator.seed(7);
        assert_eq!(generator.generate_grid(&w).unwrap(), first);
    }

    #[test]
    fn test_single_weight_always_drawn() {
        let w = WeightTable::from_pairs([(Symbol::Bell, 1.0), (Symbol::Axe, 0.0)]);
        let mut generator = OutcomeGenerator::seeded(1, Symbol::Fire);
        for _ in 0..100 {
            assert_eq!(generator.draw(&w).unwrap(), Symbol::Bell);
        }
    }

    #[test]
    fn test_zero_total_rejected() {
        let w = WeightTable::from_pairs([(Symbol::Bell, 0.0), (Symbol::Axe, 0.0)]);
        let mut generator = OutcomeGenerator::seeded(1, Symbol::Fire);
        assert_eq!(generator.draw(&w), Err(SlotError::ZeroTotalWeight));
        assert_eq!(generator.generate_grid(&w), Err(SlotError::ZeroTotalWeight));
    }

    #[test]
    fn test_draw_frequencies_follow_weights() {
        let w = WeightTable::from_pairs([(Symbol::Bomb, 0.75), (Symbol::Bell, 0.25)]);
        let mut generator = OutcomeGenerator::seeded(99, Symbol::Fire);
        let n = 20_000;
        let bombs = (0..n)
            .filter(|_| generator.draw(&w).unwrap() == Symbol::Bomb)
            .count();
        let share = bombs as f64 / n as f64;
        assert!((share - 0.75).abs() < 0.02, "share {share}");
    }

    #[test]
    fn test_near_miss_column_has_two_targets() {
        let w = weights();
        let mut generator = OutcomeGenerator::seeded(3, Symbol::Fire);
        for _ in 0..200 {
            let column = generator
                .generate_near_miss_column(Symbol::FuelPump, &w)
                .unwrap();
            let targets = column.iter().filter(|s| **s == Symbol::FuelPump).count();
            assert!(targets >= 2);
        }
    }

    #[test]
    fn test_adaptive_grid_zero_probability_matches_plain() {
        let w = weights();
        let mut a = OutcomeGenerator::seeded(11, Symbol::Fire);
        let mut b = OutcomeGenerator::seeded(11, Symbol::Fire);
        for _ in 0..20 {
            assert_eq!(
                a.generate_adaptive_grid(&w, 0.0).unwrap(),
                b.generate_grid(&w).unwrap()
            );
        }
    }

    #[test]
    fn test_adaptive_grid_full_probability_forces_pairs() {
        let w = weights();
        let mut generator = OutcomeGenerator::seeded(5, Symbol::Fire);
        for _ in 0..50 {
            let grid = generator.generate_adaptive_grid(&w, 1.0).unwrap();
            for column in grid.columns() {
                let has_pair = Symbol::ALL
                    .iter()
                    .any(|s| column.iter().filter(|c| *c == s).count() >= 2);
                assert!(has_pair);
            }
        }
    }
}
