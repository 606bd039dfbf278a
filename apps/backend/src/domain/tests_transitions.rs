use super::game::{Change, Game, GameStatus, PlayerStatus, POINTS_FIRST_MATCH, POINTS_MATCH};
use super::results::leaderboard;
use super::role::Role;
use crate::errors::domain::{DomainError, NotFoundKind, TransitionKind};

fn words(n: usize) -> Vec<String> {
    ["cat", "dog", "sun", "tree", "boat"]
        .iter()
        .take(n)
        .map(|w| w.to_string())
        .collect()
}

fn active_game(total_rounds: usize) -> Game {
    let mut game = Game::new("g1", "ABC123", "host", words(total_rounds)).unwrap();
    game.join("alice", "Alice").unwrap();
    game.join("bob", "Bob").unwrap();
    game.set_status(GameStatus::Active).unwrap();
    game
}

fn transition_kind(err: DomainError) -> TransitionKind {
    match err {
        DomainError::InvalidTransition(kind, _) => kind,
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}

#[test]
fn new_game_starts_in_lobby_at_round_zero() {
    let game = Game::new("g1", "ABC123", "host", words(3)).unwrap();
    assert_eq!(game.status, GameStatus::Lobby);
    assert_eq!(game.current_round, 0);
    assert_eq!(game.total_rounds, 3);
}

#[test]
fn new_game_rejects_empty_word_list() {
    let err = Game::new("g1", "ABC123", "host", Vec::new()).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn advance_moves_by_exactly_one() {
    let mut game = active_game(3);
    assert_eq!(game.advance_round(1).unwrap(), Change::Applied);
    assert_eq!(game.current_round, 1);

    let err = game.advance_round(0).unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::RoundOutOfRange);
    assert_eq!(game.current_round, 1);
}

#[test]
fn repeated_advance_is_unchanged() {
    let mut game = active_game(3);
    game.advance_round(1).unwrap();
    assert_eq!(game.advance_round(1).unwrap(), Change::Unchanged);
}

#[test]
fn advance_never_reaches_total_rounds() {
    let mut game = active_game(2);
    game.advance_round(1).unwrap();
    let err = game.advance_round(2).unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::RoundOutOfRange);
}

#[test]
fn finished_game_rejects_every_mutation() {
    let mut game = active_game(3);
    game.set_status(GameStatus::Finished).unwrap();
    let before = game.clone();

    assert_eq!(
        transition_kind(game.advance_round(1).unwrap_err()),
        TransitionKind::GameFinished
    );
    assert_eq!(
        transition_kind(game.set_status(GameStatus::Finished).unwrap_err()),
        TransitionKind::GameFinished
    );
    assert_eq!(
        transition_kind(game.set_player_status("alice", PlayerStatus::Drawing).unwrap_err()),
        TransitionKind::GameFinished
    );
    assert_eq!(
        transition_kind(game.advance_player_round("alice", 1, true).unwrap_err()),
        TransitionKind::GameFinished
    );
    assert_eq!(game, before);
}

#[test]
fn status_never_moves_backward() {
    let mut game = active_game(3);
    let err = game.set_status(GameStatus::Lobby).unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::GameStatus);
}

#[test]
fn join_is_idempotent_and_lobby_only() {
    let mut game = Game::new("g1", "ABC123", "host", words(3)).unwrap();
    assert_eq!(game.join("alice", "Alice").unwrap(), Change::Applied);
    assert_eq!(game.join("alice", "Alice").unwrap(), Change::Unchanged);
    assert_eq!(game.players.len(), 1);

    game.set_status(GameStatus::Active).unwrap();
    let err = game.join("carol", "Carol").unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::GameNotInLobby);
}

#[test]
fn player_status_graph() {
    let mut game = active_game(3);
    game.set_player_status("alice", PlayerStatus::Drawing).unwrap();
    game.set_player_status("alice", PlayerStatus::Classifying).unwrap();

    let err = game
        .set_player_status("alice", PlayerStatus::Drawing)
        .unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::PlayerStatus);

    game.set_player_status("alice", PlayerStatus::Waiting).unwrap();
    assert_eq!(game.player("alice").unwrap().status, PlayerStatus::Waiting);
}

#[test]
fn unknown_player_is_not_found() {
    let mut game = active_game(3);
    let err = game
        .set_player_status("mallory", PlayerStatus::Drawing)
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(NotFoundKind::Player, _)));
}

#[test]
fn first_match_scores_more_than_later_ones() {
    let mut game = active_game(3);
    game.advance_player_round("alice", 1, true).unwrap();
    game.advance_player_round("bob", 1, true).unwrap();

    assert_eq!(game.player("alice").unwrap().total_points(), POINTS_FIRST_MATCH);
    assert_eq!(game.player("bob").unwrap().total_points(), POINTS_MATCH);
    assert_eq!(game.player("bob").unwrap().current_round, 1);
}

#[test]
fn player_round_is_append_only_and_sequential() {
    let mut game = active_game(3);
    game.advance_player_round("alice", 1, false).unwrap();
    assert_eq!(
        game.advance_player_round("alice", 1, true).unwrap(),
        Change::Unchanged
    );
    let err = game.advance_player_round("alice", 3, true).unwrap_err();
    assert_eq!(transition_kind(err), TransitionKind::RoundOutOfRange);

    let alice = game.player("alice").unwrap();
    assert_eq!(alice.rounds.len(), 1);
    assert_eq!(alice.rounds[0].points, 0);
}

#[test]
fn final_round_detection_is_zero_based() {
    let mut game = active_game(3);
    game.current_round = 2;
    assert!(game.is_final_round(game.current_round));
    assert!(!game.is_final_round(1));
    assert_eq!(game.word_for_round(2), Some("sun"));
}

#[test]
fn roles_are_derived_from_addresses() {
    let game = active_game(3);
    assert_eq!(Role::derive(&game, "host"), Role::Host);
    assert_eq!(Role::derive(&game, "alice"), Role::Player);
    assert_eq!(Role::derive(&game, "eve"), Role::Spectator);
}

#[test]
fn leaderboard_orders_by_points_then_join_order() {
    let mut game = active_game(3);
    game.join_unchecked_for_test("carol", "Carol");
    game.advance_player_round("bob", 1, true).unwrap();
    game.advance_player_round("carol", 1, true).unwrap();

    let board = leaderboard(&game);
    let order: Vec<&str> = board.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(order, vec!["bob", "carol", "alice"]);
}

impl Game {
    fn join_unchecked_for_test(&mut self, address: &str, user_name: &str) {
        self.players
            .push(super::game::Player::new(address, user_name));
    }
}
