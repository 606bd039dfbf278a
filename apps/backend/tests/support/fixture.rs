// Game fixtures on the in-memory store, plus client sessions wired to them

use std::sync::Arc;

use doodle_backend::adapters::GameRepoMemory;
use doodle_backend::client::{
    Archive, ClassificationGate, Classifier, ClientSession, Countdown, GameStateStore, HubChannel,
    MemoryStorage, SessionDeps,
};
use doodle_backend::domain::{Game, GameStatus};
use doodle_backend::services::GameService;
use doodle_backend::ws::BroadcastHub;

use super::fakes::{ChannelArchive, RecordingApi, ScriptedClassifier};

pub const HOST: &str = "0xhost";

pub struct Fixture {
    pub hub: Arc<BroadcastHub>,
    pub service: GameService,
    pub game: Game,
}

/// A session plus the recording API it writes through.
pub struct TestSession {
    pub session: Arc<ClientSession>,
    pub api: Arc<RecordingApi>,
}

impl Fixture {
    /// Lobby game hosted by [`HOST`] with `players` joined.
    pub async fn lobby(total_rounds: u32, players: &[&str]) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let service = GameService::new(Arc::new(GameRepoMemory::new()), Arc::clone(&hub));

        let mut game = service.create_game(HOST, total_rounds).await.unwrap();
        for address in players {
            game = service
                .join_game(&game.invite_code, address, &format!("user-{address}"))
                .await
                .unwrap();
        }

        Self { hub, service, game }
    }

    /// Started game hosted by [`HOST`] with `players` joined.
    pub async fn active(total_rounds: u32, players: &[&str]) -> Self {
        let mut fixture = Self::lobby(total_rounds, players).await;
        fixture.game = fixture
            .service
            .set_status(&fixture.game.id, GameStatus::Active)
            .await
            .unwrap();
        fixture
    }

    /// Advance the game and every player's pointer to `round` (no points).
    pub async fn to_round(&mut self, round: u32) {
        let id = self.game.id.clone();
        for r in self.game.current_round + 1..=round {
            self.service.advance_round(&id, r).await.unwrap();
            for player in self.game.players.clone() {
                self.service
                    .advance_player_round(&id, &player.address, r, false)
                    .await
                    .unwrap();
            }
        }
        self.refresh().await;
    }

    pub async fn refresh(&mut self) {
        self.game = self.service.get_game(&self.game.id).await.unwrap();
    }

    pub fn word(&self, round: u32) -> String {
        self.game.words_list[round as usize].clone()
    }

    pub async fn session_with(
        &self,
        identity: &str,
        classifier: Arc<dyn Classifier>,
        archive: Arc<dyn Archive>,
        countdown: Countdown,
    ) -> TestSession {
        let api = Arc::new(RecordingApi::new(self.service.clone()));
        let deps = SessionDeps {
            identity: identity.to_string(),
            store: Arc::new(GameStateStore::new(identity, Box::new(MemoryStorage::new()))),
            api: api.clone(),
            channel: Arc::new(HubChannel::new(Arc::clone(&self.hub))),
            gate: ClassificationGate::new(classifier, archive),
            countdown,
        };
        let session = ClientSession::start(deps, &self.game.id).await.unwrap();
        TestSession {
            session: Arc::new(session),
            api,
        }
    }

    /// Session with an unavailable classifier and the default countdown.
    pub async fn session(&self, identity: &str) -> TestSession {
        let (archive, _rx) = ChannelArchive::new();
        self.session_with(
            identity,
            ScriptedClassifier::unavailable(),
            archive,
            Countdown::default(),
        )
        .await
    }
}
