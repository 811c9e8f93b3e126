//! # rf-slot-core: Adaptive 3×3 slot engine
//!
//! Draws weighted symbols onto a 3×3 grid, evaluates eight fixed pay-lines
//! and nudges symbol weights every spin so the session return tracks a
//! target RTP.
//!
//! ## Features
//!
//! - **Symbol Catalog**: Six symbols with weights, payouts, jackpot multipliers
//! - **Outcome Generator**: Seeded ChaCha draws, near-miss columns
//! - **Pay-Line Evaluator**: Multi-line bonus, max-bet jackpot, consolation prizes
//! - **Adaptive Weights**: EMA RTP tracking, volatility regimes, jackpot weight track
//! - **Slot Machine**: Wallet, progressive pool, audio cues, shared spin guard
//!
//! ## Architecture
//!
//! ```text
//! SlotMachine
//!     │
//!     ├── AdaptiveWeightController (GameState → WeightTable)
//!     ├── OutcomeGenerator (WeightTable → Grid)
//!     ├── PayTable (Grid × lines × bet → WinResult)
//!     └── Ports (AudioPort, SessionStore, Clock)
//!           │
//!           v
//!     SpinOutcome
//! ```

pub mod adaptive;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod outcome;
pub mod paytable;
pub mod ports;
pub mod shared;
pub mod spin;
pub mod symbols;

pub use adaptive::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use grid::*;
pub use outcome::*;
pub use paytable::*;
pub use ports::*;
pub use shared::*;
pub use spin::*;
pub use symbols::*;
