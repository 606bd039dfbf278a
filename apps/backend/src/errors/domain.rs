//! Domain-level error type used across services, adapters and the client.
//!
//! This error type is HTTP- and DB-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert with one of the
//! `AppError::from_write` / `AppError::from_read` mappings.

use thiserror::Error;

/// Which referenced entity was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Game,
    Player,
}

/// Which rule a rejected state change broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionKind {
    /// The game is finished; nothing may change any more.
    GameFinished,
    /// Joining is only possible while the game is in the lobby.
    GameNotInLobby,
    /// The game has not started.
    GameNotActive,
    /// Requested round is outside `0..total_rounds` or not the next one.
    RoundOutOfRange,
    /// Game status may only move lobby -> active -> finished.
    GameStatus,
    /// Player status graph violated (e.g. drawing while classifying).
    PlayerStatus,
    /// The player's own round pointer does not match the game round.
    RoundNotOpen,
    /// The caller's role may not perform this action.
    NotHost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    /// Compare-and-swap on the game version failed.
    OptimisticLock,
    /// Generated invite code collided with an existing game.
    InviteCode,
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("not found {0:?}: {1}")]
    NotFound(NotFoundKind, String),
    #[error("invalid transition {0:?}: {1}")]
    InvalidTransition(TransitionKind, String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict {0:?}: {1}")]
    Conflict(ConflictKind, String),
    /// The classifier returned no usable answer. Failure is opaque.
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }

    pub fn transition(kind: TransitionKind, detail: impl Into<String>) -> Self {
        Self::InvalidTransition(kind, detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }

    pub fn classifier(detail: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(detail.into())
    }

    pub fn persistence(detail: impl Into<String>) -> Self {
        Self::Persistence(detail.into())
    }

    pub fn is_optimistic_lock(&self) -> bool {
        matches!(self, Self::Conflict(ConflictKind::OptimisticLock, _))
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::persistence(format!("db error: {e}"))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::persistence(format!("document encoding: {e}"))
    }
}
