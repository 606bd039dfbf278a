use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::games::GameService;
use crate::ws::hub::BroadcastHub;

/// Shared handles for every request handler and WebSocket session.
#[derive(Clone)]
pub struct AppState {
    pub service: GameService,
    pub hub: Arc<BroadcastHub>,
    /// Present when games are persisted through sea-orm.
    pub db: Option<DatabaseConnection>,
}

impl AppState {
    pub fn new(service: GameService, db: Option<DatabaseConnection>) -> Self {
        let hub = Arc::clone(service.hub());
        Self { service, hub, db }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// Label reported by `/health`.
    pub fn store_kind(&self) -> &'static str {
        match &self.db {
            Some(_) => "database",
            None => "memory",
        }
    }
}
