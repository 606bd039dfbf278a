//! In-memory adapter for the game repository.
//!
//! Used when no `DATABASE_URL` is configured and by tests. Same version
//! semantics as the SeaORM adapter.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::Game;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::repos::games::GameRepo;

#[derive(Debug, Default)]
pub struct GameRepoMemory {
    games: DashMap<String, Game>,
    invite_codes: DashMap<String, String>,
}

impl GameRepoMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

#[async_trait]
impl GameRepo for GameRepoMemory {
    async fn find(&self, id: &str) -> Result<Option<Game>, DomainError> {
        Ok(self.games.get(id).map(|g| g.value().clone()))
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<Game>, DomainError> {
        let Some(id) = self.invite_codes.get(invite_code).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        self.find(&id).await
    }

    async fn create(&self, mut game: Game) -> Result<Game, DomainError> {
        match self.invite_codes.entry(game.invite_code.clone()) {
            Entry::Occupied(_) => {
                return Err(DomainError::conflict(
                    ConflictKind::InviteCode,
                    "invite code already in use",
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(game.id.clone());
            }
        }
        game.version = 1;
        self.games.insert(game.id.clone(), game.clone());
        Ok(game)
    }

    async fn save(&self, mut game: Game) -> Result<Game, DomainError> {
        let Some(mut stored) = self.games.get_mut(&game.id) else {
            return Err(DomainError::not_found(
                NotFoundKind::Game,
                format!("game {} not found", game.id),
            ));
        };
        if stored.version != game.version {
            return Err(DomainError::conflict(
                ConflictKind::OptimisticLock,
                format!(
                    "game {} is at version {}, expected {}",
                    game.id, stored.version, game.version
                ),
            ));
        }
        game.version += 1;
        *stored = game.clone();
        Ok(game)
    }
}
