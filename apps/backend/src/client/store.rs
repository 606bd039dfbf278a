//! Client-side state container for the current game and own player.
//!
//! Snapshots arrive at least once and in any order, so every update goes
//! through [`GameStateStore::apply_game`] / [`GameStateStore::apply_player`],
//! which drop stale versions and report identical snapshots as `Unchanged`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Game, Player};
use crate::errors::domain::DomainError;

/// What a client keeps between restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredState {
    pub game: Option<Game>,
    pub player: Option<Player>,
}

pub trait SnapshotStorage: Send + Sync {
    fn read(&self) -> Result<Option<StoredState>, DomainError>;
    fn write(&self, state: &StoredState) -> Result<(), DomainError>;
    fn remove(&self) -> Result<(), DomainError>;
}

/// JSON file storage. Writes go to a sibling temp file which is then renamed
/// over the target, so a crash never leaves a half-written snapshot.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "doodle-state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_err(action: &str, path: &Path, e: std::io::Error) -> DomainError {
    DomainError::persistence(format!("{action} {}: {e}", path.display()))
}

impl SnapshotStorage for FileStorage {
    fn read(&self) -> Result<Option<StoredState>, DomainError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("reading", &self.path, e)),
        }
    }

    fn write(&self, state: &StoredState) -> Result<(), DomainError> {
        let json = serde_json::to_vec(state)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp).map_err(|e| io_err("creating", &tmp, e))?;
            file.write_all(&json)
                .and_then(|_| file.sync_all())
                .map_err(|e| io_err("writing", &tmp, e))?;
        }
        fs::rename(&tmp, &self.path).map_err(|e| io_err("replacing", &self.path, e))
    }

    fn remove(&self) -> Result<(), DomainError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err("removing", &self.path, e)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<StoredState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self) -> Result<Option<StoredState>, DomainError> {
        Ok(self.slot.lock().clone())
    }

    fn write(&self, state: &StoredState) -> Result<(), DomainError> {
        *self.slot.lock() = Some(state.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), DomainError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Result of offering a snapshot to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Identical to what is held; nothing changed.
    Unchanged,
    /// Stale or for another game/player; dropped.
    Ignored,
}

pub struct GameStateStore {
    identity: String,
    storage: Box<dyn SnapshotStorage>,
    state: RwLock<StoredState>,
}

impl GameStateStore {
    pub fn new(identity: impl Into<String>, storage: Box<dyn SnapshotStorage>) -> Self {
        Self {
            identity: identity.into(),
            storage,
            state: RwLock::new(StoredState::default()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Replace in-memory state with whatever storage holds.
    pub fn load(&self) -> Result<(), DomainError> {
        let loaded = self.storage.read()?.unwrap_or_default();
        debug!(
            game_id = loaded.game.as_ref().map(|g| g.id.as_str()),
            "client state loaded"
        );
        *self.state.write() = loaded;
        Ok(())
    }

    pub fn game(&self) -> Option<Game> {
        self.state.read().game.clone()
    }

    pub fn game_id(&self) -> Option<String> {
        self.state.read().game.as_ref().map(|g| g.id.clone())
    }

    pub fn player(&self) -> Option<Player> {
        self.state.read().player.clone()
    }

    /// Offer a full game snapshot.
    ///
    /// A different game id replaces the held game only when nothing is held.
    /// A lower version than the held one is ignored. The own player is
    /// re-derived from the snapshot's player list.
    pub fn apply_game(&self, game: Game) -> ApplyOutcome {
        let mut state = self.state.write();

        if let Some(held) = &state.game {
            if held.id != game.id || game.version < held.version {
                return ApplyOutcome::Ignored;
            }
            if *held == game {
                return ApplyOutcome::Unchanged;
            }
        }

        state.player = game.player(&self.identity).cloned();
        state.game = Some(game);
        self.persist(&state);
        ApplyOutcome::Applied
    }

    /// Offer a snapshot of one player. Only the own player is tracked.
    pub fn apply_player(&self, game_id: &str, player: Player) -> ApplyOutcome {
        let mut state = self.state.write();

        let same_game = state.game.as_ref().is_some_and(|g| g.id == game_id);
        if !same_game || player.address != self.identity {
            return ApplyOutcome::Ignored;
        }
        if let Some(held) = &state.player {
            // rounds only ever grow; a shorter history is an older snapshot
            if player.rounds.len() < held.rounds.len() {
                return ApplyOutcome::Ignored;
            }
            if *held == player {
                return ApplyOutcome::Unchanged;
            }
        }

        state.player = Some(player);
        self.persist(&state);
        ApplyOutcome::Applied
    }

    /// Forget everything, in memory and in storage.
    pub fn clear(&self) -> Result<(), DomainError> {
        *self.state.write() = StoredState::default();
        self.storage.remove()
    }

    fn persist(&self, state: &StoredState) {
        if let Err(e) = self.storage.write(state) {
            warn!(error = %e, "persisting client state failed");
        }
    }
}
