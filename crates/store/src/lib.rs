//! State stores for the duty rotation bot.
//!
//! This crate provides:
//! - `RosterStore` — ordered set of duty participants and their rotation positions
//! - `VacationStore` — per-participant, non-overlapping vacation intervals
//! - `StateDocument` — the combined persisted snapshot
//! - `StateStore` — JSON file persistence with load-or-default semantics

pub mod roster;
pub mod state;
pub mod vacation;

pub use roster::{Participant, RosterStore};
pub use state::{StateDocument, StateStore};
pub use vacation::{VacationInterval, VacationStore};
