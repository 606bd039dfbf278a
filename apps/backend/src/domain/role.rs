use serde::{Deserialize, Serialize};

use super::game::Game;

/// What a connected identity may do in a game. Computed once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sole authority for round advances and finishing the game.
    Host,
    Player,
    Spectator,
}

impl Role {
    /// The host role wins when the host address is also listed as a player.
    pub fn derive(game: &Game, address: &str) -> Self {
        if game.host_address == address {
            Role::Host
        } else if game.player(address).is_some() {
            Role::Player
        } else {
            Role::Spectator
        }
    }

    pub fn is_host(self) -> bool {
        self == Role::Host
    }
}
