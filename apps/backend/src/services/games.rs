//! Authoritative game mutations.
//!
//! Every write is read-modify-write on the whole game document, guarded by
//! the document version. A successful change is saved and then broadcast
//! as exactly one `gameUpdate` (plus one `playerUpdate` for player writes).
//! A request that changes nothing is answered without save or broadcast.
//! That includes re-sending the current round: unlike a save-and-publish
//! route, a repeated `PATCH {newRound}` is a quiet 200 with no second
//! `gameUpdate`, and subscribers keep the snapshot they already hold.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use ulid::Ulid;

use crate::domain::game::validate_total_rounds;
use crate::domain::results::{leaderboard, PlayerResult};
use crate::domain::words::{generate_invite_code, pick_words};
use crate::domain::{Change, Game, GameStatus, PlayerStatus};
use crate::errors::domain::{DomainError, ConflictKind, NotFoundKind, TransitionKind};
use crate::repos::games::{require_game, GameRepo};
use crate::ws::hub::BroadcastHub;
use crate::ws::protocol::{Envelope, PlayerSnapshot};

/// Optimistic-lock retries before a write gives up with `Conflict`.
const SAVE_ATTEMPTS: usize = 3;
const INVITE_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct GameService {
    repo: Arc<dyn GameRepo>,
    hub: Arc<BroadcastHub>,
}

impl GameService {
    pub fn new(repo: Arc<dyn GameRepo>, hub: Arc<BroadcastHub>) -> Self {
        Self { repo, hub }
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    #[instrument(skip(self))]
    pub async fn create_game(
        &self,
        host_address: &str,
        total_rounds: u32,
    ) -> Result<Game, DomainError> {
        validate_total_rounds(total_rounds)?;

        let mut attempt = 1;
        loop {
            let game = {
                let mut rng = rand::rng();
                let words = pick_words(&mut rng, total_rounds as usize);
                Game::new(
                    Ulid::new().to_string(),
                    generate_invite_code(&mut rng),
                    host_address,
                    words,
                )?
            };

            match self.repo.create(game).await {
                Ok(created) => {
                    info!(game_id = %created.id, invite_code = %created.invite_code, "game created");
                    return Ok(created);
                }
                Err(DomainError::Conflict(ConflictKind::InviteCode, _))
                    if attempt < INVITE_CODE_ATTEMPTS =>
                {
                    debug!(attempt, "invite code collision, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_game(&self, id: &str) -> Result<Game, DomainError> {
        require_game(self.repo.as_ref(), id).await
    }

    pub async fn get_by_invite_code(&self, invite_code: &str) -> Result<Game, DomainError> {
        self.repo
            .find_by_invite_code(invite_code)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(
                    NotFoundKind::Game,
                    format!("no game with invite code {invite_code}"),
                )
            })
    }

    pub async fn results(&self, id: &str) -> Result<Vec<PlayerResult>, DomainError> {
        Ok(leaderboard(&self.get_game(id).await?))
    }

    #[instrument(skip(self))]
    pub async fn join_game(
        &self,
        invite_code: &str,
        address: &str,
        user_name: &str,
    ) -> Result<Game, DomainError> {
        let id = self.get_by_invite_code(invite_code).await?.id;
        let (game, change) = self.mutate(&id, |g| g.join(address, user_name)).await?;
        if change == Change::Applied {
            info!(game_id = %id, address, "player joined");
            self.broadcast_game(&game);
        }
        Ok(game)
    }

    /// Host-authoritative round advance (`PATCH /api/games/{id}`).
    #[instrument(skip(self))]
    pub async fn advance_round(&self, id: &str, new_round: u32) -> Result<Game, DomainError> {
        let (game, change) = self.mutate(id, |g| g.advance_round(new_round)).await?;
        if change == Change::Applied {
            info!(game_id = %id, round = new_round, "round advanced");
            self.broadcast_game(&game);
        }
        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn set_status(&self, id: &str, status: GameStatus) -> Result<Game, DomainError> {
        let (game, change) = self.mutate(id, |g| g.set_status(status)).await?;
        if change == Change::Applied {
            info!(game_id = %id, status = status.as_str(), "game status changed");
            self.broadcast_game(&game);
        }
        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn set_player_status(
        &self,
        id: &str,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Game, DomainError> {
        let (game, change) = self
            .mutate(id, |g| g.set_player_status(address, status))
            .await?;
        if change == Change::Applied {
            self.broadcast_player(&game, address);
            self.broadcast_game(&game);
        }
        Ok(game)
    }

    #[instrument(skip(self))]
    pub async fn advance_player_round(
        &self,
        id: &str,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Game, DomainError> {
        let (game, change) = self
            .mutate(id, |g| g.advance_player_round(address, new_round, won))
            .await?;
        if change == Change::Applied {
            info!(game_id = %id, address, round = new_round, won, "player round closed");
            self.broadcast_player(&game, address);
            self.broadcast_game(&game);
        }
        Ok(game)
    }

    /// Relay an `updateRound` signal for a live game.
    pub async fn signal_round(&self, id: &str) -> Result<(), DomainError> {
        let game = self.get_game(id).await?;
        if game.is_finished() {
            return Err(DomainError::transition(
                TransitionKind::GameFinished,
                format!("game {id} has finished"),
            ));
        }
        self.hub.publish(Envelope::round_signal(id));
        Ok(())
    }

    async fn mutate<F>(&self, id: &str, apply: F) -> Result<(Game, Change), DomainError>
    where
        F: Fn(&mut Game) -> Result<Change, DomainError> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let mut game = require_game(self.repo.as_ref(), id).await?;
            if apply(&mut game)? == Change::Unchanged {
                return Ok((game, Change::Unchanged));
            }

            match self.repo.save(game).await {
                Ok(saved) => return Ok((saved, Change::Applied)),
                Err(e) if e.is_optimistic_lock() && attempt < SAVE_ATTEMPTS => {
                    debug!(game_id = %id, attempt, "stale game version, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn broadcast_game(&self, game: &Game) {
        self.hub.publish(Envelope::GameUpdate(game.clone()));
    }

    fn broadcast_player(&self, game: &Game, address: &str) {
        if let Some(player) = game.player(address) {
            self.hub.publish(Envelope::PlayerUpdate(PlayerSnapshot {
                game_id: game.id.clone(),
                player: player.clone(),
            }));
        }
    }
}
