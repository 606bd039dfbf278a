// Test doubles for the client-side collaborators

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use doodle_backend::client::{Archive, ArchiveRecord, Classifier, Drawing, GameApi, ServiceGameApi};
use doodle_backend::domain::{Game, GameStatus, PlayerStatus};
use doodle_backend::errors::DomainError;
use doodle_backend::services::GameService;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// One call made through [`RecordingApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Fetch(String),
    AdvanceRound(String, u32),
    SetGameStatus(String, GameStatus),
    SetPlayerStatus(String, String, PlayerStatus),
    AdvancePlayerRound(String, String, u32, bool),
}

impl ApiCall {
    /// Round advances and game-status writes: the host commit surface.
    pub fn is_commit(&self) -> bool {
        matches!(self, ApiCall::AdvanceRound(..) | ApiCall::SetGameStatus(..))
    }
}

/// Real in-process API that also records every call.
pub struct RecordingApi {
    inner: ServiceGameApi,
    calls: Mutex<Vec<ApiCall>>,
}

impl RecordingApi {
    pub fn new(service: GameService) -> Self {
        Self {
            inner: ServiceGameApi::new(service),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    pub fn commits(&self) -> Vec<ApiCall> {
        self.calls().into_iter().filter(ApiCall::is_commit).collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl GameApi for RecordingApi {
    async fn fetch_game(&self, game_id: &str) -> Result<Game, DomainError> {
        self.record(ApiCall::Fetch(game_id.to_string()));
        self.inner.fetch_game(game_id).await
    }

    async fn advance_round(&self, game_id: &str, new_round: u32) -> Result<Game, DomainError> {
        self.record(ApiCall::AdvanceRound(game_id.to_string(), new_round));
        self.inner.advance_round(game_id, new_round).await
    }

    async fn set_game_status(
        &self,
        game_id: &str,
        status: GameStatus,
    ) -> Result<Game, DomainError> {
        self.record(ApiCall::SetGameStatus(game_id.to_string(), status));
        self.inner.set_game_status(game_id, status).await
    }

    async fn set_player_status(
        &self,
        game_id: &str,
        address: &str,
        status: PlayerStatus,
    ) -> Result<Game, DomainError> {
        self.record(ApiCall::SetPlayerStatus(
            game_id.to_string(),
            address.to_string(),
            status,
        ));
        self.inner.set_player_status(game_id, address, status).await
    }

    async fn advance_player_round(
        &self,
        game_id: &str,
        address: &str,
        new_round: u32,
        won: bool,
    ) -> Result<Game, DomainError> {
        self.record(ApiCall::AdvancePlayerRound(
            game_id.to_string(),
            address.to_string(),
            new_round,
            won,
        ));
        self.inner
            .advance_player_round(game_id, address, new_round, won)
            .await
    }
}

/// Classifier that replays scripted answers; unavailable once they run out.
#[derive(Default)]
pub struct ScriptedClassifier {
    answers: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn answering<I, S>(answers: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let this = Self::default();
        this.answers
            .lock()
            .extend(answers.into_iter().map(|a| Some(a.into())));
        Arc::new(this)
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, _drawing: &Drawing) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .pop_front()
            .flatten()
            .ok_or_else(|| DomainError::classifier("scripted classifier has no answer"))
    }
}

/// Archive that forwards every record to a channel the test reads.
pub struct ChannelArchive {
    tx: mpsc::UnboundedSender<ArchiveRecord>,
}

impl ChannelArchive {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ArchiveRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Archive for ChannelArchive {
    async fn store(&self, record: ArchiveRecord) -> Result<(), DomainError> {
        self.tx.send(record).ok();
        Ok(())
    }
}

/// Archive that always fails.
pub struct BrokenArchive;

#[async_trait]
impl Archive for BrokenArchive {
    async fn store(&self, _record: ArchiveRecord) -> Result<(), DomainError> {
        Err(DomainError::persistence("archive is down"))
    }
}

pub fn sample_drawing() -> Drawing {
    Drawing::from_bytes("image/png", vec![0x89u8, b'P', b'N', b'G', 1, 2, 3])
}
