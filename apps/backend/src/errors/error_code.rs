//! Error codes for the Doodle Exchange HTTP API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! Every code is SCREAMING_SNAKE_CASE and maps 1:1 to the string that
//! appears in responses.

use core::fmt;

use super::domain::{ConflictKind, NotFoundKind, TransitionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request validation
    ValidationError,
    BadRequest,
    InvalidInviteCode,
    InvalidTotalRounds,

    // Not found
    GameNotFound,
    PlayerNotFound,
    NotFound,

    // Rejected writes
    GameFinished,
    GameNotInLobby,
    GameNotActive,
    RoundOutOfRange,
    InvalidGameStatus,
    InvalidPlayerStatus,
    RoundNotOpen,
    NotHost,

    // Conflicts
    OptimisticLock,
    InviteCodeConflict,

    // System
    ClassifierUnavailable,
    PersistenceError,
    InternalError,
    ConfigError,
}

impl ErrorCode {
    /// Canonical string for this code as it appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::InvalidInviteCode => "INVALID_INVITE_CODE",
            Self::InvalidTotalRounds => "INVALID_TOTAL_ROUNDS",

            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::GameFinished => "GAME_FINISHED",
            Self::GameNotInLobby => "GAME_NOT_IN_LOBBY",
            Self::GameNotActive => "GAME_NOT_ACTIVE",
            Self::RoundOutOfRange => "ROUND_OUT_OF_RANGE",
            Self::InvalidGameStatus => "INVALID_GAME_STATUS",
            Self::InvalidPlayerStatus => "INVALID_PLAYER_STATUS",
            Self::RoundNotOpen => "ROUND_NOT_OPEN",
            Self::NotHost => "NOT_HOST",

            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::InviteCodeConflict => "INVITE_CODE_CONFLICT",

            Self::ClassifierUnavailable => "CLASSIFIER_UNAVAILABLE",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl From<NotFoundKind> for ErrorCode {
    fn from(kind: NotFoundKind) -> Self {
        match kind {
            NotFoundKind::Game => Self::GameNotFound,
            NotFoundKind::Player => Self::PlayerNotFound,
        }
    }
}

impl From<TransitionKind> for ErrorCode {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::GameFinished => Self::GameFinished,
            TransitionKind::GameNotInLobby => Self::GameNotInLobby,
            TransitionKind::GameNotActive => Self::GameNotActive,
            TransitionKind::RoundOutOfRange => Self::RoundOutOfRange,
            TransitionKind::GameStatus => Self::InvalidGameStatus,
            TransitionKind::PlayerStatus => Self::InvalidPlayerStatus,
            TransitionKind::RoundNotOpen => Self::RoundNotOpen,
            TransitionKind::NotHost => Self::NotHost,
        }
    }
}

impl From<ConflictKind> for ErrorCode {
    fn from(kind: ConflictKind) -> Self {
        match kind {
            ConflictKind::OptimisticLock => Self::OptimisticLock,
            ConflictKind::InviteCode => Self::InviteCodeConflict,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique_screaming_snake() {
        let all = [
            ErrorCode::ValidationError,
            ErrorCode::BadRequest,
            ErrorCode::InvalidInviteCode,
            ErrorCode::InvalidTotalRounds,
            ErrorCode::GameNotFound,
            ErrorCode::PlayerNotFound,
            ErrorCode::NotFound,
            ErrorCode::GameFinished,
            ErrorCode::GameNotInLobby,
            ErrorCode::GameNotActive,
            ErrorCode::RoundOutOfRange,
            ErrorCode::InvalidGameStatus,
            ErrorCode::InvalidPlayerStatus,
            ErrorCode::RoundNotOpen,
            ErrorCode::NotHost,
            ErrorCode::OptimisticLock,
            ErrorCode::InviteCodeConflict,
            ErrorCode::ClassifierUnavailable,
            ErrorCode::PersistenceError,
            ErrorCode::InternalError,
            ErrorCode::ConfigError,
        ];
        let mut seen = HashSet::new();
        for code in all {
            let s = code.as_str();
            assert!(seen.insert(s), "duplicate code {s}");
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }
}
