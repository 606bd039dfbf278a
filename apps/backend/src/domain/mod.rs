//! Game domain: records, transitions, roles, scoring.

pub mod game;
pub mod results;
pub mod role;
pub mod words;

pub use game::{Change, Game, GameStatus, Player, PlayerStatus, RoundResult};
pub use role::Role;

#[cfg(test)]
mod tests_transitions;
