// /api/ws against a real server

mod common;
mod support;

use std::time::Duration;

use doodle_backend::domain::GameStatus;
use doodle_backend::infra::state::build_state;
use doodle_backend::state::app_state::AppState;
use serde_json::{json, Value};

use support::websocket::{start_test_server, WebSocketClient};

const WAIT: Duration = Duration::from_secs(2);

/// Round-trip a ping so the server side has subscribed before we go on.
async fn ready(client: &mut WebSocketClient) {
    client.send_json(&json!({ "type": "ping" })).await.unwrap();
    let pong = client.recv_json_timeout(WAIT).await.expect("pong");
    assert_eq!(pong, json!({ "type": "pong" }));
}

async fn connect(addr: std::net::SocketAddr, query: &str) -> WebSocketClient {
    let url = format!("ws://{addr}/api/ws{query}");
    let mut client = WebSocketClient::connect_retry(&url, WAIT).await.unwrap();
    ready(&mut client).await;
    client
}

async fn state() -> AppState {
    build_state().build().await.unwrap()
}

#[actix_web::test]
async fn committed_writes_arrive_as_game_updates() {
    let state = state().await;
    let game = state.service.create_game("0xhost", 3).await.unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();

    let mut client = connect(addr, &format!("?gameId={}", game.id)).await;
    state
        .service
        .set_status(&game.id, GameStatus::Active)
        .await
        .unwrap();

    let frame = client.recv_json_timeout(WAIT).await.expect("gameUpdate");
    assert_eq!(frame["topic"], "gameUpdate");
    assert_eq!(frame["data"]["id"], Value::String(game.id.clone()));
    assert_eq!(frame["data"]["status"], "active");

    client.close().await;
    handle.stop(true).await;
}

#[actix_web::test]
async fn game_filter_hides_other_games() {
    let state = state().await;
    let mine = state.service.create_game("0xhost", 3).await.unwrap();
    let other = state.service.create_game("0xhost", 3).await.unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();

    let mut client = connect(addr, &format!("?gameId={}", mine.id)).await;
    state
        .service
        .set_status(&other.id, GameStatus::Active)
        .await
        .unwrap();
    state
        .service
        .set_status(&mine.id, GameStatus::Active)
        .await
        .unwrap();

    let frame = client.recv_json_timeout(WAIT).await.expect("gameUpdate");
    assert_eq!(frame["data"]["id"], Value::String(mine.id.clone()));

    handle.stop(true).await;
}

#[actix_web::test]
async fn published_round_signal_reaches_every_client() {
    let state = state().await;
    let game = state.service.create_game("0xhost", 3).await.unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();

    let mut sender = connect(addr, "").await;
    let mut watcher = connect(addr, "").await;

    let signal = json!({ "topic": "updateRound", "data": { "gameId": game.id } });
    sender
        .send_json(&json!({ "type": "publish", "envelope": signal }))
        .await
        .unwrap();

    assert_eq!(watcher.recv_json_timeout(WAIT).await, Some(signal.clone()));
    assert_eq!(sender.recv_json_timeout(WAIT).await, Some(signal));

    handle.stop(true).await;
}

#[actix_web::test]
async fn clients_cannot_publish_snapshots_or_signal_finished_games() {
    let state = state().await;
    let game = state.service.create_game("0xhost", 3).await.unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();
    let mut client = connect(addr, "").await;

    let forged = json!({
        "type": "publish",
        "envelope": { "topic": "gameUpdate", "data": game },
    });
    client.send_json(&forged).await.unwrap();
    let frame = client.recv_json_timeout(WAIT).await.expect("error frame");
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "forbidden_topic");

    state
        .service
        .set_status(&game.id, GameStatus::Finished)
        .await
        .unwrap();
    // the finish itself is broadcast first
    let update = client.recv_json_timeout(WAIT).await.expect("gameUpdate");
    assert_eq!(update["topic"], "gameUpdate");

    client
        .send_json(&json!({
            "type": "publish",
            "envelope": { "topic": "updateRound", "data": { "gameId": game.id } },
        }))
        .await
        .unwrap();
    let frame = client.recv_json_timeout(WAIT).await.expect("error frame");
    assert_eq!(frame["type"], "error");
    assert_eq!(frame["code"], "rejected");

    client.send_json(&json!({ "type": "shout" })).await.unwrap();
    let frame = client.recv_json_timeout(WAIT).await.expect("error frame");
    assert_eq!(frame["code"], "bad_request");

    handle.stop(true).await;
}
