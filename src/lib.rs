//! Concentration: a timed memory-matching game on a 4x4 board.
//!
//! The library holds the game core. It never touches a clock or a screen:
//! [`GameSession`] changes state in response to card flips, the START
//! overlay finishing and its own timers firing, and tells its host what to
//! schedule through [`Effect`]s. The GTK front-end lives in the binary.

pub mod config;
pub mod deck;
pub mod session;
pub mod shuffle;
pub mod text;
pub mod timers;
pub mod viewport;

pub use config::{ConfigError, GameConfig};
pub use deck::{Card, CardStatus, Deck, DeckError, ImageId};
pub use session::{FlipOutcome, GameSession, Phase, Rejection, SessionError};
pub use timers::{EndReason, Effect, Schedule, TimerKind, TimerTarget, TimerToken, VirtualClock};
pub use viewport::{LayoutMetrics, fit_card_size};
