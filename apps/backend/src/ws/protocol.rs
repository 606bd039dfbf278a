use serde::{Deserialize, Serialize};

use crate::domain::{Game, Player};

/// The three broadcast topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "gameUpdate")]
    GameUpdate,
    #[serde(rename = "playerUpdate")]
    PlayerUpdate,
    #[serde(rename = "updateRound")]
    UpdateRound,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::GameUpdate, Topic::PlayerUpdate, Topic::UpdateRound];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::GameUpdate => "gameUpdate",
            Topic::PlayerUpdate => "playerUpdate",
            Topic::UpdateRound => "updateRound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub game_id: String,
    pub player: Player,
}

/// "Move to the next round" signal; starts a countdown on every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSignal {
    pub game_id: String,
}

/// One broadcast message: `{"topic": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "data")]
pub enum Envelope {
    #[serde(rename = "gameUpdate")]
    GameUpdate(Game),
    #[serde(rename = "playerUpdate")]
    PlayerUpdate(PlayerSnapshot),
    #[serde(rename = "updateRound")]
    UpdateRound(RoundSignal),
}

impl Envelope {
    pub fn topic(&self) -> Topic {
        match self {
            Envelope::GameUpdate(_) => Topic::GameUpdate,
            Envelope::PlayerUpdate(_) => Topic::PlayerUpdate,
            Envelope::UpdateRound(_) => Topic::UpdateRound,
        }
    }

    pub fn game_id(&self) -> &str {
        match self {
            Envelope::GameUpdate(game) => &game.id,
            Envelope::PlayerUpdate(snapshot) => &snapshot.game_id,
            Envelope::UpdateRound(signal) => &signal.game_id,
        }
    }

    pub fn round_signal(game_id: impl Into<String>) -> Self {
        Envelope::UpdateRound(RoundSignal {
            game_id: game_id.into(),
        })
    }
}

/// Frames a WebSocket client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    Publish { envelope: Envelope },
    Ping,
}

/// Non-envelope frames the server sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerNotice {
    Pong,
    Error { code: String, message: String },
}
