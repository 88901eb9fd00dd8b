//! # Gomoku self-play
//!
//! A five-in-a-row board game engine with a self-play loop that trains a
//! move-scoring value network after every finished game. Built on the Burn ML
//! framework, with a Ratatui dashboard for watching training live.
//!
//! ## Modules
//!
//! - [`game`]: board state machine, win detection, move generation, snapshots
//! - [`oracle`]: the `ScoringOracle` trait and the value-network oracle
//! - [`training`]: self-play driver, replay buffer, metrics, dashboard messages
//! - [`checkpoint`]: oracle persistence, `latest` symlink, pruning
//! - [`store`]: named board snapshots in a JSON key-value file
//! - [`ui`]: board view, interactive play with a saved-boards picker, and the
//!   self-play dashboard
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

#![recursion_limit = "256"]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod oracle;
pub mod store;
pub mod training;
pub mod ui;
