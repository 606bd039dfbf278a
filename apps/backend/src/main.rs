use actix_web::{web, App, HttpServer};
use doodle_backend::config::AppConfig;
use doodle_backend::infra::state::build_state;
use doodle_backend::middleware::cors::cors_middleware;
use doodle_backend::middleware::request_trace::RequestTrace;
use doodle_backend::middleware::structured_logger::StructuredLogger;
use doodle_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let mut builder = build_state();
    if let Some(url) = &config.database_url {
        builder = builder.with_db(url.clone(), config.database_max_connections);
    }
    let app_state = match builder.build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    info!(
        host = %config.host,
        port = config.port,
        store = app_state.store_kind(),
        "starting doodle backend"
    );

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
