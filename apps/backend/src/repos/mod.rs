//! Repository traits for the domain layer.

pub mod games;

pub use games::{require_game, GameRepo};
