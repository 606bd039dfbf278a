use actix_web::{web, HttpResponse};
use migration::get_latest_migration_version;
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::AppError;
use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migrations: Option<String>,
    time: String,
}

async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let time = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let (store_error, migrations) = match app_state.db() {
        None => (None, None),
        Some(db) => {
            let ping = Statement::from_string(
                db.get_database_backend(),
                "SELECT 1 AS health_check".to_string(),
            );
            match db.query_one(ping).await {
                Ok(_) => {
                    let version = match get_latest_migration_version(db).await {
                        Ok(Some(version)) => version,
                        Ok(None) => "no_migrations".to_string(),
                        Err(_) => "unknown".to_string(),
                    };
                    (None, Some(version))
                }
                Err(e) => (Some(format!("DB query failed: {e}")), None),
            }
        }
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: if store_error.is_none() { "ok" } else { "degraded" },
        app_version: env!("CARGO_PKG_VERSION"),
        store: app_state.store_kind(),
        store_error,
        migrations,
        time,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::get().to(health)));
}
