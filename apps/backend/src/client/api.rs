//! The narrow write API a client session uses against the authoritative
//! game record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Game, GameStatus, PlayerStatus};
use crate::errors::domain::{ConflictKind, DomainError, NotFoundKind, TransitionKind};
use crate::services::games::GameService;

#[async_trait]
pub trait GameApi: Send + Sync {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, DomainError>;
    async fn advance_round(&self, game_id: &str, new_round: u32) -> Result<Game, DomainError>;
    async fn set_game_status(&self, game_id: &str, status: GameStatus)
        -> Result<Game, DomainError>;
    async fn set_player_status(
        &self,
        game_id: &str,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Game, DomainError>;
    async fn advance_player_round(
        &self,
        game_id: &str,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Game, DomainError>;
}

/// In-process API straight onto the service (server-side sessions, tests).
#[derive(Clone)]
pub struct ServiceGameApi {
    service: GameService,
}

impl ServiceGameApi {
    pub fn new(service: GameService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl GameApi for ServiceGameApi {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, DomainError> {
        self.service.get_game(game_id).await
    }

    async fn advance_round(&self, game_id: &str, new_round: u32) -> Result<Game, DomainError> {
        self.service.advance_round(game_id, new_round).await
    }

    async fn set_game_status(
        &self,
        game_id: &str,
        status: GameStatus,
    ) -> Result<Game, DomainError> {
        self.service.set_status(game_id, status).await
    }

    async fn set_player_status(
        &self,
        game_id: &str,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Game, DomainError> {
        self.service.set_player_status(game_id, address, status).await
    }

    async fn advance_player_round(
        &self,
        game_id: &str,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Game, DomainError> {
        self.service
            .advance_player_round(game_id, address, new_round, won)
            .await
    }
}

#[derive(Deserialize)]
struct GameBody {
    game: Game,
}

/// The subset of a ProblemDetails body the client reads.
#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    code: String,
    #[serde(default)]
    detail: String,
}

/// API over HTTP against the backend's `/api/games` routes.
pub struct HttpGameApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGameApi {
    /// `base_url` is the server root, e.g. `http://localhost:3001`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::persistence(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/games/{path}", self.base_url)
    }

    async fn send_patch(&self, path: &str, body: serde_json::Value) -> Result<Game, DomainError> {
        let response = self
            .client
            .patch(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(transport_err)?;
        read_json::<GameBody>(response).await.map(|b| b.game)
    }
}

fn transport_err(e: reqwest::Error) -> DomainError {
    DomainError::persistence(format!("game api unreachable: {e}"))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DomainError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| DomainError::persistence(format!("unreadable game api response: {e}")));
    }
    let problem = response.json::<Problem>().await.unwrap_or_default();
    Err(problem_to_domain(status, problem))
}

fn problem_to_domain(status: StatusCode, problem: Problem) -> DomainError {
    let Problem { code, detail } = problem;
    match status {
        StatusCode::BAD_REQUEST => DomainError::validation(detail),
        StatusCode::NOT_FOUND => DomainError::not_found(NotFoundKind::Game, detail),
        StatusCode::FORBIDDEN => match code.as_str() {
            "GAME_NOT_FOUND" => DomainError::not_found(NotFoundKind::Game, detail),
            "PLAYER_NOT_FOUND" => DomainError::not_found(NotFoundKind::Player, detail),
            other => match transition_kind(other) {
                Some(kind) => DomainError::transition(kind, detail),
                None => DomainError::persistence(format!("rejected ({other}): {detail}")),
            },
        },
        StatusCode::CONFLICT => {
            let kind = if code == "INVITE_CODE_CONFLICT" {
                ConflictKind::InviteCode
            } else {
                ConflictKind::OptimisticLock
            };
            DomainError::conflict(kind, detail)
        }
        other => DomainError::persistence(format!("game api returned {other}: {detail}")),
    }
}

fn transition_kind(code: &str) -> Option<TransitionKind> {
    let kind = match code {
        "GAME_FINISHED" => TransitionKind::GameFinished,
        "GAME_NOT_IN_LOBBY" => TransitionKind::GameNotInLobby,
        "GAME_NOT_ACTIVE" => TransitionKind::GameNotActive,
        "ROUND_OUT_OF_RANGE" => TransitionKind::RoundOutOfRange,
        "INVALID_GAME_STATUS" => TransitionKind::GameStatus,
        "INVALID_PLAYER_STATUS" => TransitionKind::PlayerStatus,
        "ROUND_NOT_OPEN" => TransitionKind::RoundNotOpen,
        "NOT_HOST" => TransitionKind::NotHost,
        _ => return None,
    };
    Some(kind)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRoundBody {
    new_round: u32,
    won: bool,
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, DomainError> {
        let response = self
            .client
            .get(self.url(game_id))
            .send()
            .await
            .map_err(transport_err)?;
        read_json::<GameBody>(response).await.map(|b| b.game)
    }

    async fn advance_round(&self, game_id: &str, new_round: u32) -> Result<Game, DomainError> {
        self.send_patch(game_id, json!({ "newRound": new_round }))
            .await
    }

    async fn set_game_status(
        &self,
        game_id: &str,
        status: GameStatus,
    ) -> Result<Game, DomainError> {
        self.send_patch(&format!("{game_id}/status"), json!({ "status": status }))
            .await
    }

    async fn set_player_status(
        &self,
        game_id: &str,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Game, DomainError> {
        self.send_patch(
            &format!("{game_id}/players/{address}/status"),
            json!({ "status": status }),
        )
        .await
    }

    async fn advance_player_round(
        &self,
        game_id: &str,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Game, DomainError> {
        let body = serde_json::to_value(PlayerRoundBody { new_round, won })?;
        self.send_patch(&format!("{game_id}/players/{address}/round"), body)
            .await
    }
}
