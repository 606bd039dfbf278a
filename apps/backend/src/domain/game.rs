//! Game and player records plus every legal state change on them.
//!
//! All mutations are pure: they validate against the current record and
//! either change it in place or return a `DomainError` without touching it.
//! Persistence and broadcast happen in `services::games`.

use serde::{Deserialize, Serialize};

use crate::errors::domain::{DomainError, NotFoundKind, TransitionKind};

pub const MIN_TOTAL_ROUNDS: u32 = 1;
pub const MAX_TOTAL_ROUNDS: u32 = 10;

/// Points for the first matching drawing of a round.
pub const POINTS_FIRST_MATCH: u32 = 3;
/// Points for any later matching drawing of the same round.
pub const POINTS_MATCH: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Lobby,
    Active,
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Lobby => "lobby",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Waiting,
    Drawing,
    Classifying,
}

impl PlayerStatus {
    /// waiting -> drawing -> classifying -> waiting, with drawing optional
    /// and a reset to waiting always allowed.
    pub fn can_become(self, next: PlayerStatus) -> bool {
        use PlayerStatus::*;
        matches!(
            (self, next),
            (_, Waiting)
                | (Waiting, Drawing)
                | (Drawing, Drawing)
                | (Waiting, Classifying)
                | (Drawing, Classifying)
                | (Classifying, Classifying)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub address: String,
    pub user_name: String,
    pub current_round: u32,
    pub status: PlayerStatus,
    #[serde(default)]
    pub rounds: Vec<RoundResult>,
}

impl Player {
    pub fn new(address: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            user_name: user_name.into(),
            current_round: 0,
            status: PlayerStatus::Waiting,
            rounds: Vec::new(),
        }
    }

    pub fn total_points(&self) -> u32 {
        self.rounds.iter().map(|r| r.points).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub invite_code: String,
    pub host_address: String,
    pub status: GameStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub words_list: Vec<String>,
    #[serde(default)]
    pub players: Vec<Player>,
    /// Bumped by the store on every successful save.
    #[serde(default)]
    pub version: i32,
}

/// Whether a mutation changed the record. `Unchanged` lets callers skip the
/// save and the broadcast for repeated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

impl Game {
    /// New lobby game; one round per word.
    pub fn new(
        id: impl Into<String>,
        invite_code: impl Into<String>,
        host_address: impl Into<String>,
        words_list: Vec<String>,
    ) -> Result<Self, DomainError> {
        let host_address = host_address.into();
        if host_address.trim().is_empty() {
            return Err(DomainError::validation("host address must not be empty"));
        }
        let total_rounds = words_list.len() as u32;
        validate_total_rounds(total_rounds)?;

        Ok(Self {
            id: id.into(),
            invite_code: invite_code.into(),
            host_address,
            status: GameStatus::Lobby,
            current_round: 0,
            total_rounds,
            words_list,
            players: Vec::new(),
            version: 0,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    pub fn player(&self, address: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.address == address)
    }

    fn player_mut(&mut self, address: &str) -> Result<&mut Player, DomainError> {
        let game_id = self.id.clone();
        self.players
            .iter_mut()
            .find(|p| p.address == address)
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Player,
                    format!("player {address} is not in game {game_id}"),
                )
            })
    }

    /// Prompt word for a round index.
    pub fn word_for_round(&self, round: u32) -> Option<&str> {
        self.words_list.get(round as usize).map(String::as_str)
    }

    /// True when `round` is the last playable round index.
    pub fn is_final_round(&self, round: u32) -> bool {
        round + 1 >= self.total_rounds
    }

    fn ensure_not_finished(&self) -> Result<(), DomainError> {
        if self.is_finished() {
            return Err(DomainError::transition(
                TransitionKind::GameFinished,
                format!("game {} has finished", self.id),
            ));
        }
        Ok(())
    }

    /// Authoritative round advance. Accepts the current round again (a
    /// duplicate request) or exactly the next one.
    pub fn advance_round(&mut self, new_round: u32) -> Result<Change, DomainError> {
        self.ensure_not_finished()?;

        if new_round >= self.total_rounds {
            return Err(DomainError::transition(
                TransitionKind::RoundOutOfRange,
                format!(
                    "round {new_round} exceeds the {} rounds of game {}",
                    self.total_rounds, self.id
                ),
            ));
        }
        if new_round == self.current_round {
            return Ok(Change::Unchanged);
        }
        if new_round != self.current_round + 1 {
            return Err(DomainError::transition(
                TransitionKind::RoundOutOfRange,
                format!(
                    "round may only advance by one (current {}, requested {new_round})",
                    self.current_round
                ),
            ));
        }

        self.current_round = new_round;
        Ok(Change::Applied)
    }

    /// lobby -> active -> finished (lobby -> finished allowed); never back.
    pub fn set_status(&mut self, status: GameStatus) -> Result<Change, DomainError> {
        self.ensure_not_finished()?;

        match (self.status, status) {
            (current, next) if current == next => Ok(Change::Unchanged),
            (GameStatus::Lobby, GameStatus::Active)
            | (GameStatus::Lobby, GameStatus::Finished)
            | (GameStatus::Active, GameStatus::Finished) => {
                self.status = status;
                Ok(Change::Applied)
            }
            (current, next) => Err(DomainError::transition(
                TransitionKind::GameStatus,
                format!("cannot move game from {} to {}", current.as_str(), next.as_str()),
            )),
        }
    }

    /// Add a player while in the lobby; rejoining with a known address is a no-op.
    pub fn join(&mut self, address: &str, user_name: &str) -> Result<Change, DomainError> {
        self.ensure_not_finished()?;

        if address.trim().is_empty() {
            return Err(DomainError::validation("player address must not be empty"));
        }
        if self.player(address).is_some() {
            return Ok(Change::Unchanged);
        }
        if self.status != GameStatus::Lobby {
            return Err(DomainError::transition(
                TransitionKind::GameNotInLobby,
                format!("game {} is no longer accepting players", self.id),
            ));
        }

        self.players.push(Player::new(address, user_name));
        Ok(Change::Applied)
    }

    pub fn set_player_status(
        &mut self,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Change, DomainError> {
        self.ensure_not_finished()?;

        let player = self.player_mut(address)?;
        if player.status == status {
            return Ok(Change::Unchanged);
        }
        if !player.status.can_become(status) {
            return Err(DomainError::transition(
                TransitionKind::PlayerStatus,
                format!("player {address} cannot go from {:?} to {status:?}", player.status),
            ));
        }

        player.status = status;
        Ok(Change::Applied)
    }

    /// Close the player's current round and move their pointer to `new_round`.
    ///
    /// A win scores `POINTS_FIRST_MATCH` when no other player has scored the
    /// same round yet, `POINTS_MATCH` otherwise.
    pub fn advance_player_round(
        &mut self,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Change, DomainError> {
        self.ensure_not_finished()?;

        let total_rounds = self.total_rounds;
        let current = self.player_mut(address)?.current_round;

        if new_round == current {
            return Ok(Change::Unchanged);
        }
        if new_round != current + 1 || new_round > total_rounds {
            return Err(DomainError::transition(
                TransitionKind::RoundOutOfRange,
                format!("player {address} cannot move from round {current} to {new_round}"),
            ));
        }

        let points = if !won {
            0
        } else if self.round_has_winner(current) {
            POINTS_MATCH
        } else {
            POINTS_FIRST_MATCH
        };

        let player = self.player_mut(address)?;
        player.rounds.push(RoundResult {
            round: current,
            points,
        });
        player.current_round = new_round;
        Ok(Change::Applied)
    }

    fn round_has_winner(&self, round: u32) -> bool {
        self.players
            .iter()
            .flat_map(|p| p.rounds.iter())
            .any(|r| r.round == round && r.points > 0)
    }
}

pub fn validate_total_rounds(total_rounds: u32) -> Result<(), DomainError> {
    if !(MIN_TOTAL_ROUNDS..=MAX_TOTAL_ROUNDS).contains(&total_rounds) {
        return Err(DomainError::validation(format!(
            "total rounds must be between {MIN_TOTAL_ROUNDS} and {MAX_TOTAL_ROUNDS}, got {total_rounds}"
        )));
    }
    Ok(())
}
