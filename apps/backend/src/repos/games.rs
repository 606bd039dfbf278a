//! Persistent store contract for game documents.

use async_trait::async_trait;

use crate::domain::Game;
use crate::errors::domain::{DomainError, NotFoundKind};

/// Whole-document game store.
///
/// `save` overwrites the stored document only when the stored version still
/// equals `game.version`, and returns the game with the bumped version.
/// A stale version yields `Conflict(OptimisticLock)`.
#[async_trait]
pub trait GameRepo: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Game>, DomainError>;

    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<Game>, DomainError>;

    /// Insert a new game. The stored game starts at version 1.
    async fn create(&self, game: Game) -> Result<Game, DomainError>;

    async fn save(&self, game: Game) -> Result<Game, DomainError>;
}

/// Find a game or fail with `NotFound(Game)`.
pub async fn require_game(repo: &dyn GameRepo, id: &str) -> Result<Game, DomainError> {
    repo.find(id)
        .await?
        .ok_or_else(|| DomainError::not_found(NotFoundKind::Game, format!("game {id} not found")))
}
