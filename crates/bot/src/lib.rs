//! Telegram adapter for the duty rotation bot.
//!
//! This crate provides:
//! - `Command` — the logical chat commands and their execution
//! - `Poller` — the `getUpdates` long-polling loop and command dispatch

pub mod command;
pub mod poller;

pub use command::Command;
pub use poller::Poller;
