use std::future::Future;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::{info, warn};

use crate::error::AppError;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_INTERVAL_MS: u64 = 500;

/// Connect to `url`. Does NOT run migrations.
///
/// In-memory SQLite gets a single connection; every pooled connection would
/// otherwise see its own empty database.
pub async fn connect_db(url: &str, max_connections: u32) -> Result<DatabaseConnection, AppError> {
    let max_connections = if is_sqlite_memory(url) {
        1
    } else {
        max_connections
    };

    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = retry_connection(
        || {
            let options = options.clone();
            async move { Database::connect(options).await.map_err(AppError::from) }
        },
        CONNECT_ATTEMPTS,
        CONNECT_INTERVAL_MS,
    )
    .await?;

    info!(
        backend = ?conn.get_database_backend(),
        max_connections,
        "database connected"
    );
    Ok(conn)
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(url: &str, max_connections: u32) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(url, max_connections).await?;
    migrate(&conn, MigrationCommand::Up).await?;
    Ok(conn)
}

fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Retry with a fixed interval; returns the last error once attempts run out.
async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempts = attempt, "connection_retry=success");
                }
                return Ok(result);
            }
            Err(e) if attempt < max_attempts => {
                warn!(attempt, max_attempts, interval_ms, error = %e, "connection_retry=failed");
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
