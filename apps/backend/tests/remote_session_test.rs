// Client session wired from config against a running server

mod common;
mod support;

use std::sync::Arc;
use std::time::Duration;

use doodle_backend::client::{
    BroadcastChannel, ClientConfig, ClientSession, CoordinatorPhase, SessionDeps, WsChannel,
};
use doodle_backend::domain::GameStatus;
use doodle_backend::infra::state::build_state;
use doodle_backend::ws::{Envelope, Topic};

use support::websocket::start_test_server;

const ALICE: &str = "0xalice";
const WAIT: Duration = Duration::from_secs(2);

async fn until<F: Fn() -> bool>(what: &str, check: F) {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

#[actix_web::test]
async fn session_from_config_follows_remote_broadcasts() {
    let state = build_state().build().await.unwrap();
    let game = state.service.create_game("0xhost", 3).await.unwrap();
    state
        .service
        .join_game(&game.invite_code, ALICE, "alice")
        .await
        .unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();

    let config = ClientConfig {
        api_url: Some(format!("http://{addr}")),
        // never called in this test
        classifier_url: Some("http://127.0.0.1:9/classify".into()),
        ..ClientConfig::default()
    };
    let deps = SessionDeps::connect(&config, ALICE).await.unwrap();
    let alice = Arc::new(ClientSession::start(deps, &game.id).await.unwrap());
    let _link = alice.attach();

    until("the relay connection to subscribe", || {
        state.hub.subscriber_count(Topic::UpdateRound) > 0
    })
    .await;

    // a server-side commit reaches the local store
    state
        .service
        .set_status(&game.id, GameStatus::Active)
        .await
        .unwrap();
    let store = Arc::clone(alice.store());
    until("gameUpdate", || {
        store.game().map(|g| g.status) == Some(GameStatus::Active)
    })
    .await;

    // a remote round signal starts the countdown
    state.service.signal_round(&game.id).await.unwrap();
    let coordinator = alice.coordinator().clone();
    until("countdown", || {
        matches!(coordinator.phase(), CoordinatorPhase::CountingDown { .. })
    })
    .await;

    alice.close();
    drop(_link);
    drop(alice);
    handle.stop(true).await;
}

#[actix_web::test]
async fn published_signals_go_through_the_server() {
    let state = build_state().build().await.unwrap();
    let game = state.service.create_game("0xhost", 3).await.unwrap();
    let (handle, addr, _join) = start_test_server(state.clone()).await.unwrap();

    let channel = WsChannel::connect(&format!("ws://{addr}/api/ws"))
        .await
        .unwrap();
    let mut echoed = channel.subscribe(Topic::UpdateRound);
    until("the relay connection to subscribe", || {
        state.hub.subscriber_count(Topic::UpdateRound) > 0
    })
    .await;
    let mut on_server = state.hub.subscribe(Topic::UpdateRound);

    channel.publish(Envelope::round_signal(game.id.clone()));

    let seen = tokio::time::timeout(WAIT, on_server.receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen, Envelope::round_signal(game.id.clone()));
    let back = tokio::time::timeout(WAIT, echoed.receiver.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(back, Envelope::round_signal(game.id.clone()));
    assert!(channel.is_connected());

    handle.stop(false).await;
    until("the channel to notice the close", || !channel.is_connected()).await;
}

#[actix_web::test]
async fn connect_fails_cleanly_without_a_relay() {
    let config = ClientConfig {
        api_url: Some("http://127.0.0.1:9".into()),
        classifier_url: Some("http://127.0.0.1:9/classify".into()),
        ..ClientConfig::default()
    };
    assert!(SessionDeps::connect(&config, ALICE).await.is_err());
}
