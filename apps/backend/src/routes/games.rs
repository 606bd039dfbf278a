//! `/api/games/**`: the authoritative write API and game reads.
//!
//! Read handlers map a missing game to 404; write handlers use the default
//! `DomainError -> AppError` mapping, where a missing game or player and an
//! illegal transition are both 403.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::results::PlayerResult;
use crate::domain::words::is_valid_invite_code;
use crate::domain::{Game, GameStatus, PlayerStatus};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::extractors::JsonBody;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub host_address: String,
    pub total_rounds: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    pub address: String,
    pub user_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRoundRequest {
    pub new_round: u32,
}

#[derive(Debug, Deserialize)]
pub struct GameStatusRequest {
    pub status: GameStatus,
}

#[derive(Debug, Deserialize)]
pub struct PlayerStatusRequest {
    pub status: PlayerStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRoundRequest {
    pub new_round: u32,
    #[serde(default)]
    pub won: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameResponse {
    pub game: Game,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub message: String,
    pub game: Game,
}

fn updated(message: &str, game: Game) -> HttpResponse {
    HttpResponse::Ok().json(UpdateResponse {
        message: message.to_string(),
        game,
    })
}

async fn create_game(
    app_state: web::Data<AppState>,
    body: JsonBody<CreateGameRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let game = app_state
        .service
        .create_game(&body.host_address, body.total_rounds)
        .await?;
    Ok(HttpResponse::Created().json(GameResponse { game }))
}

async fn get_game(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .service
        .get_game(&path)
        .await
        .map_err(AppError::from_read)?;
    Ok(HttpResponse::Ok().json(GameResponse { game }))
}

async fn get_by_invite_code(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner().to_ascii_uppercase();
    if !is_valid_invite_code(&code) {
        return Err(AppError::bad_request(
            ErrorCode::InvalidInviteCode,
            format!("'{code}' is not a valid invite code"),
        ));
    }
    let game = app_state
        .service
        .get_by_invite_code(&code)
        .await
        .map_err(AppError::from_read)?;
    Ok(HttpResponse::Ok().json(GameResponse { game }))
}

async fn join_game(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody<JoinGameRequest>,
) -> Result<HttpResponse, AppError> {
    let code = path.into_inner().to_ascii_uppercase();
    if !is_valid_invite_code(&code) {
        return Err(AppError::bad_request(
            ErrorCode::InvalidInviteCode,
            format!("'{code}' is not a valid invite code"),
        ));
    }
    let body = body.into_inner();
    let game = app_state
        .service
        .join_game(&code, &body.address, &body.user_name)
        .await?;
    Ok(updated("Joined game", game))
}

async fn advance_round(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody<AdvanceRoundRequest>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .service
        .advance_round(&path, body.into_inner().new_round)
        .await?;
    Ok(updated("Game updated", game))
}

async fn set_game_status(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
    body: JsonBody<GameStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let game = app_state
        .service
        .set_status(&path, body.into_inner().status)
        .await?;
    Ok(updated("Game status updated", game))
}

async fn set_player_status(
    app_state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: JsonBody<PlayerStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let (game_id, address) = path.into_inner();
    let game = app_state
        .service
        .set_player_status(&game_id, &address, body.into_inner().status)
        .await?;
    Ok(updated("Player status updated", game))
}

async fn advance_player_round(
    app_state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: JsonBody<PlayerRoundRequest>,
) -> Result<HttpResponse, AppError> {
    let (game_id, address) = path.into_inner();
    let body = body.into_inner();
    let game = app_state
        .service
        .advance_player_round(&game_id, &address, body.new_round, body.won)
        .await?;
    Ok(updated("Player round updated", game))
}

async fn round_signal(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    app_state.service.signal_round(&path).await?;
    Ok(HttpResponse::Accepted().finish())
}

async fn results(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let results: Vec<PlayerResult> = app_state
        .service
        .results(&path)
        .await
        .map_err(AppError::from_read)?;
    Ok(HttpResponse::Ok().json(results))
}

/// Registered under the `/api/games` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_game)))
        .service(web::resource("/invite/{code}").route(web::get().to(get_by_invite_code)))
        .service(web::resource("/invite/{code}/join").route(web::post().to(join_game)))
        .service(
            web::resource("/{game_id}")
                .route(web::get().to(get_game))
                .route(web::patch().to(advance_round)),
        )
        .service(web::resource("/{game_id}/status").route(web::patch().to(set_game_status)))
        .service(
            web::resource("/{game_id}/players/{address}/status")
                .route(web::patch().to(set_player_status)),
        )
        .service(
            web::resource("/{game_id}/players/{address}/round")
                .route(web::patch().to(advance_player_round)),
        )
        .service(web::resource("/{game_id}/round-signal").route(web::post().to(round_signal)))
        .service(web::resource("/{game_id}/results").route(web::get().to(results)));
}
