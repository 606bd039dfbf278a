//! One connected user's view of a game.
//!
//! The session owns the state container, the coordinator and the gate.
//! Every inbound broadcast goes through [`ClientSession::handle`].

use std::sync::Arc;

use futures_util::stream::{select_all, StreamExt};
use tokio::runtime::Handle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api::{GameApi, HttpGameApi};
use super::archive::{Archive, HttpArchive, NoopArchive};
use super::channel::{BroadcastChannel, WsChannel};
use super::classifier::HttpClassifier;
use super::config::ClientConfig;
use super::coordinator::{Countdown, RoundCoordinator};
use super::drawing::Drawing;
use super::gate::{Attempt, ClassificationGate, Verdict};
use super::store::{ApplyOutcome, FileStorage, GameStateStore, MemoryStorage, SnapshotStorage};
use crate::domain::{Game, GameStatus, Player, PlayerStatus, Role};
use crate::error::AppError;
use crate::errors::domain::{DomainError, NotFoundKind, TransitionKind};
use crate::ws::protocol::{Envelope, Topic};

/// Collaborators a session is built from.
pub struct SessionDeps {
    pub identity: String,
    pub store: Arc<GameStateStore>,
    pub api: Arc<dyn GameApi>,
    pub channel: Arc<dyn BroadcastChannel>,
    pub gate: ClassificationGate,
    pub countdown: Countdown,
}

impl SessionDeps {
    /// HTTP-backed collaborators from `config`. The channel is supplied by
    /// the caller.
    pub fn from_config(
        config: &ClientConfig,
        identity: impl Into<String>,
        channel: Arc<dyn BroadcastChannel>,
    ) -> Result<Self, AppError> {
        let identity = identity.into();

        let api_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| AppError::config("DOODLE_API_URL must be set"))?;
        let classifier_url = config
            .classifier_url
            .as_deref()
            .ok_or_else(|| AppError::config("DOODLE_CLASSIFIER_URL must be set"))?;

        let api = HttpGameApi::new(api_url, config.http_timeout)?;
        let classifier = HttpClassifier::new(classifier_url, config.http_timeout)?;
        let archive: Arc<dyn Archive> = match config.archive_url.as_deref() {
            Some(url) => Arc::new(HttpArchive::new(url, config.http_timeout)?),
            None => Arc::new(NoopArchive),
        };
        let storage: Box<dyn SnapshotStorage> = match &config.state_path {
            Some(path) => Box::new(FileStorage::new(path)),
            None => Box::new(MemoryStorage::new()),
        };

        Ok(Self {
            store: Arc::new(GameStateStore::new(identity.clone(), storage)),
            identity,
            api: Arc::new(api),
            channel,
            gate: ClassificationGate::new(Arc::new(classifier), archive),
            countdown: Countdown::seconds(config.countdown_secs),
        })
    }

    /// Like [`SessionDeps::from_config`], with a [`WsChannel`] connected to
    /// the server's relay.
    pub async fn connect(
        config: &ClientConfig,
        identity: impl Into<String>,
    ) -> Result<Self, AppError> {
        let relay_url = config.relay_url()?;
        let channel = WsChannel::connect(&relay_url).await?;
        Self::from_config(config, identity, Arc::new(channel))
    }
}

/// What a submitted drawing led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Matched; the round signal went out.
    Advanced,
    /// Matched on the final round; the game is finished.
    Finished,
    /// Classified but not a match. The player may resubmit.
    TryAgain { guess: String },
    /// No classification; nothing changed.
    Discarded,
}

/// What [`ClientSession::handle`] did with an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Game(ApplyOutcome),
    Player(ApplyOutcome),
    CountdownStarted,
    Ignored,
}

pub struct ClientSession {
    identity: String,
    role: Role,
    store: Arc<GameStateStore>,
    api: Arc<dyn GameApi>,
    channel: Arc<dyn BroadcastChannel>,
    gate: ClassificationGate,
    coordinator: RoundCoordinator,
    runtime: Handle,
}

impl ClientSession {
    /// Load persisted state, fetch `game_id` and fix the role for the
    /// lifetime of the session.
    pub async fn start(deps: SessionDeps, game_id: &str) -> Result<Self, DomainError> {
        let SessionDeps {
            identity,
            store,
            api,
            channel,
            gate,
            countdown,
        } = deps;

        store.load()?;
        if store.game_id().is_some_and(|held| held != game_id) {
            store.clear()?;
        }
        let game = api.fetch_game(game_id).await?;
        store.apply_game(game.clone());

        let role = Role::derive(&game, &identity);
        info!(game_id, address = %identity, ?role, "client session started");

        let coordinator = RoundCoordinator::new(
            role,
            countdown,
            Arc::clone(&store),
            Arc::clone(&api),
            Arc::clone(&channel),
        );

        Ok(Self {
            identity,
            role,
            store,
            api,
            channel,
            gate,
            coordinator,
            runtime: Handle::current(),
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn store(&self) -> &Arc<GameStateStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &RoundCoordinator {
        &self.coordinator
    }

    /// Single entry point for inbound broadcasts.
    ///
    /// Countdowns run on the runtime the session was started on, so this
    /// may be called from any thread.
    pub fn handle(&self, envelope: Envelope) -> Handled {
        match envelope {
            Envelope::GameUpdate(game) => Handled::Game(self.store.apply_game(game)),
            Envelope::PlayerUpdate(snapshot) => {
                Handled::Player(self.store.apply_player(&snapshot.game_id, snapshot.player))
            }
            Envelope::UpdateRound(signal) => {
                if self.coordinator.on_round_signal(&signal.game_id) {
                    Handled::CountdownStarted
                } else {
                    Handled::Ignored
                }
            }
        }
    }

    /// Subscribe to every topic and feed envelopes to `handle` one at a
    /// time, in arrival order. Dropping the returned handle detaches.
    pub fn attach(self: &Arc<Self>) -> Attachment {
        let subscriptions: Vec<_> = Topic::ALL
            .iter()
            .map(|topic| self.channel.subscribe(*topic))
            .collect();
        let registrations = subscriptions.iter().map(|s| (s.topic, s.id)).collect();
        let mut inbound = select_all(
            subscriptions
                .into_iter()
                .map(|s| UnboundedReceiverStream::new(s.receiver)),
        );

        let token = CancellationToken::new();
        let stop = token.clone();
        let session = Arc::clone(self);
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    next = inbound.next() => match next {
                        Some(envelope) => {
                            let topic = envelope.topic();
                            let handled = session.handle(envelope);
                            debug!(topic = topic.as_str(), ?handled, "envelope handled");
                        }
                        None => break,
                    },
                }
            }
        });

        Attachment {
            channel: Arc::clone(&self.channel),
            registrations,
            token,
        }
    }

    /// Mark the player as drawing for the open round. Repeating it while
    /// already drawing does nothing.
    pub async fn begin_drawing(&self) -> Result<(), DomainError> {
        let (game, player) = self.open_round()?;
        match player.status {
            PlayerStatus::Drawing => Ok(()),
            PlayerStatus::Classifying => Err(DomainError::transition(
                TransitionKind::PlayerStatus,
                "a drawing is already being classified",
            )),
            PlayerStatus::Waiting => self.set_own_status(&game.id, PlayerStatus::Drawing).await,
        }
    }

    /// Submit a finished drawing for the player's current round.
    pub async fn submit_drawing(&self, drawing: Drawing) -> Result<SubmitOutcome, DomainError> {
        let (game, player) = self.open_round()?;
        if player.status == PlayerStatus::Classifying {
            return Err(DomainError::transition(
                TransitionKind::PlayerStatus,
                "a drawing is already being classified",
            ));
        }

        let round = game.current_round;
        let target = game
            .word_for_round(round)
            .ok_or_else(|| {
                DomainError::transition(
                    TransitionKind::RoundOutOfRange,
                    format!("no word for round {round}"),
                )
            })?
            .to_string();

        self.set_own_status(&game.id, PlayerStatus::Classifying)
            .await?;

        let attempt = Attempt {
            game_id: &game.id,
            round,
            address: &self.identity,
        };
        let verdict = self.gate.evaluate(&drawing, &target, attempt).await;

        let committed = match &verdict {
            Verdict::Match { .. } => self
                .api
                .advance_player_round(&game.id, &self.identity, round + 1, true)
                .await
                .map(|updated| {
                    self.store.apply_game(updated);
                }),
            _ => Ok(()),
        };

        // back to waiting whatever happened
        if let Err(e) = self.set_own_status(&game.id, PlayerStatus::Waiting).await {
            warn!(game_id = %game.id, error = %e, "could not reset player status");
        }
        committed?;

        match verdict {
            Verdict::Unavailable => Ok(SubmitOutcome::Discarded),
            Verdict::Miss { guess } => Ok(SubmitOutcome::TryAgain { guess }),
            Verdict::Match { .. } if game.is_final_round(round) => {
                info!(game_id = %game.id, round, "final round matched, finishing game");
                self.commit_status(&game.id, GameStatus::Finished).await?;
                Ok(SubmitOutcome::Finished)
            }
            Verdict::Match { .. } => {
                self.coordinator.request_advance()?;
                Ok(SubmitOutcome::Advanced)
            }
        }
    }

    /// Host only: lobby -> active.
    pub async fn start_game(&self) -> Result<Game, DomainError> {
        self.require_host("start the game")?;
        let id = self.current_game()?.id;
        self.commit_status(&id, GameStatus::Active).await
    }

    /// Host only: end the game now.
    pub async fn finish_game(&self) -> Result<Game, DomainError> {
        self.require_host("finish the game")?;
        let id = self.current_game()?.id;
        self.commit_status(&id, GameStatus::Finished).await
    }

    /// Stop the countdown; attachments are detached by dropping them.
    pub fn close(&self) {
        self.coordinator.shutdown();
    }

    /// The held game and own player, provided the game is active and the
    /// player is on the game's round.
    fn open_round(&self) -> Result<(Game, Player), DomainError> {
        let game = self.current_game()?;
        let player = self.store.player().ok_or_else(|| {
            DomainError::not_found(
                NotFoundKind::Player,
                format!("{} is not a player in game {}", self.identity, game.id),
            )
        })?;

        if game.status != GameStatus::Active {
            return Err(DomainError::transition(
                TransitionKind::GameNotActive,
                format!("game {} is {}", game.id, game.status.as_str()),
            ));
        }
        if player.current_round != game.current_round {
            return Err(DomainError::transition(
                TransitionKind::RoundNotOpen,
                format!(
                    "player is on round {} but the game is on round {}",
                    player.current_round, game.current_round
                ),
            ));
        }
        Ok((game, player))
    }

    fn current_game(&self) -> Result<Game, DomainError> {
        self.store
            .game()
            .ok_or_else(|| DomainError::not_found(NotFoundKind::Game, "no game loaded"))
    }

    fn require_host(&self, action: &str) -> Result<(), DomainError> {
        if self.role.is_host() {
            Ok(())
        } else {
            Err(DomainError::transition(
                TransitionKind::NotHost,
                format!("only the host may {action}"),
            ))
        }
    }

    async fn commit_status(&self, game_id: &str, status: GameStatus) -> Result<Game, DomainError> {
        let game = self.api.set_game_status(game_id, status).await?;
        self.store.apply_game(game.clone());
        Ok(game)
    }

    async fn set_own_status(&self, game_id: &str, status: PlayerStatus) -> Result<(), DomainError> {
        let game = self
            .api
            .set_player_status(game_id, &self.identity, status)
            .await?;
        self.store.apply_game(game);
        Ok(())
    }
}

/// Live subscription of a session to the channel.
pub struct Attachment {
    channel: Arc<dyn BroadcastChannel>,
    registrations: Vec<(Topic, Uuid)>,
    token: CancellationToken,
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.token.cancel();
        for (topic, id) in self.registrations.drain(..) {
            self.channel.unsubscribe(topic, id);
        }
    }
}
