use std::sync::Arc;

use crate::adapters::{GameRepoMemory, GameRepoSea};
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::repos::games::GameRepo;
use crate::services::games::GameService;
use crate::state::app_state::AppState;
use crate::ws::hub::BroadcastHub;

/// Builder for [`AppState`] (used in both tests and main).
pub struct StateBuilder {
    database_url: Option<String>,
    max_connections: u32,
    hub: Option<Arc<BroadcastHub>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            hub: None,
        }
    }

    /// Persist games through sea-orm at `url`; migrations run during `build`.
    pub fn with_db(mut self, url: impl Into<String>, max_connections: u32) -> Self {
        self.database_url = Some(url.into());
        self.max_connections = max_connections;
        self
    }

    /// Share an existing hub, e.g. one a test already subscribed to.
    pub fn with_hub(mut self, hub: Arc<BroadcastHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let hub = self.hub.unwrap_or_else(|| Arc::new(BroadcastHub::new()));

        match self.database_url {
            Some(url) => {
                let conn = bootstrap_db(&url, self.max_connections).await?;
                let repo: Arc<dyn GameRepo> = Arc::new(GameRepoSea::new(conn.clone()));
                Ok(AppState::new(GameService::new(repo, hub), Some(conn)))
            }
            None => {
                let repo: Arc<dyn GameRepo> = Arc::new(GameRepoMemory::new());
                Ok(AppState::new(GameService::new(repo, hub), None))
            }
        }
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
