//! SeaORM -> DomainError translation.
//!
//! Adapters convert `sea_orm::DbErr` here; higher layers map `DomainError`
//! to `AppError` via `From`.

use tracing::warn;

use crate::errors::domain::{ConflictKind, DomainError};

fn is_invite_code_violation(msg: &str) -> bool {
    // SQLite: "UNIQUE constraint failed: games.invite_code"
    // Postgres: duplicate key value violates unique constraint "ux_games_invite_code"
    msg.contains("games.invite_code") || msg.contains("ux_games_invite_code")
}

pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let msg = e.to_string();

    if is_invite_code_violation(&msg) {
        return DomainError::conflict(ConflictKind::InviteCode, "invite code already in use");
    }

    warn!(error = %msg, "database operation failed");
    DomainError::persistence(msg)
}
