//! 3×3 result grid

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::symbols::Symbol;

/// Number of reels (columns)
pub const COLUMNS: usize = 3;
/// Visible rows per reel
pub const ROWS: usize = 3;

/// Grid position as (column, row)
pub type Position = (usize, usize);

/// Spin result grid, stored column-major (`cells[column][row]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Symbol; ROWS]; COLUMNS],
}

impl Grid {
    /// Build from columns (each column top to bottom)
    pub fn from_columns(cells: [[Symbol; ROWS]; COLUMNS]) -> Self {
        Self { cells }
    }

    /// Build from rows as they appear on screen (each row left to right)
    pub fn from_rows(rows: [[Symbol; COLUMNS]; ROWS]) -> Self {
        let mut cells = [[Symbol::Fire; ROWS]; COLUMNS];
        for (row, symbols) in rows.iter().enumerate() {
            for (column, &symbol) in symbols.iter().enumerate() {
                cells[column][row] = symbol;
            }
        }
        Self { cells }
    }

    /// Grid filled with one symbol
    pub fn filled(symbol: Symbol) -> Self {
        Self {
            cells: [[symbol; ROWS]; COLUMNS],
        }
    }

    pub fn get(&self, (column, row): Position) -> Symbol {
        self.cells[column][row]
    }

    pub fn set(&mut self, (column, row): Position, symbol: Symbol) {
        self.cells[column][row] = symbol;
    }

    pub fn column(&self, column: usize) -> &[Symbol; ROWS] {
        &self.cells[column]
    }

    pub fn columns(&self) -> &[[Symbol; ROWS]; COLUMNS] {
        &self.cells
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..ROWS {
            if row > 0 {
                writeln!(f)?;
            }
            for column in 0..COLUMNS {
                if column > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.cells[column][row])?;
            }
        }
        Ok(())
    }
}
