//! SeaORM adapter for the game repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use time::OffsetDateTime;

use crate::domain::Game;
use crate::entities::games;
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind};
use crate::infra::db_errors::map_db_err;
use crate::repos::games::GameRepo;

/// SeaORM implementation of `GameRepo` (Postgres or SQLite).
#[derive(Debug, Clone)]
pub struct GameRepoSea {
    db: DatabaseConnection,
}

impl GameRepoSea {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn decode(row: games::Model) -> Result<Game, DomainError> {
    let mut game: Game = serde_json::from_str(&row.document)?;
    // The column is authoritative; the embedded copy may lag on old rows.
    game.version = row.version;
    Ok(game)
}

#[async_trait]
impl GameRepo for GameRepoSea {
    async fn find(&self, id: &str) -> Result<Option<Game>, DomainError> {
        let row = games::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        row.map(decode).transpose()
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> Result<Option<Game>, DomainError> {
        let row = games::Entity::find()
            .filter(games::Column::InviteCode.eq(invite_code))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        row.map(decode).transpose()
    }

    async fn create(&self, mut game: Game) -> Result<Game, DomainError> {
        game.version = 1;
        let now = OffsetDateTime::now_utc();
        let row = games::ActiveModel {
            id: Set(game.id.clone()),
            invite_code: Set(game.invite_code.clone()),
            status: Set(game.status.as_str().to_string()),
            current_round: Set(game.current_round as i32),
            document: Set(serde_json::to_string(&game)?),
            version: Set(game.version),
            created_at: Set(now),
            updated_at: Set(now),
        };
        row.insert(&self.db).await.map_err(map_db_err)?;
        Ok(game)
    }

    async fn save(&self, mut game: Game) -> Result<Game, DomainError> {
        let expected = game.version;
        game.version = expected + 1;
        let document = serde_json::to_string(&game)?;

        let result = games::Entity::update_many()
            .col_expr(games::Column::Document, Expr::value(document))
            .col_expr(
                games::Column::Status,
                Expr::value(game.status.as_str().to_string()),
            )
            .col_expr(
                games::Column::CurrentRound,
                Expr::value(game.current_round as i32),
            )
            .col_expr(games::Column::Version, Expr::value(game.version))
            .col_expr(
                games::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(games::Column::Id.eq(game.id.clone()))
            .filter(games::Column::Version.eq(expected))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return match self.find(&game.id).await? {
                None => Err(DomainError::not_found(
                    NotFoundKind::Game,
                    format!("game {} not found", game.id),
                )),
                Some(current) => Err(DomainError::conflict(
                    ConflictKind::OptimisticLock,
                    format!(
                        "game {} is at version {}, expected {expected}",
                        game.id, current.version
                    ),
                )),
            };
        }

        Ok(game)
    }
}
