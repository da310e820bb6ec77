//! Shared core of the podcast player: the episode model, feed ingestion,
//! player state machine, episode grid and the config/platform plumbing used
//! by both binaries.

pub mod config;
pub mod episode;
pub mod error;
pub mod feed;
pub mod grid;
pub mod ingest;
pub mod platform;
pub mod player;
pub mod scroll;
