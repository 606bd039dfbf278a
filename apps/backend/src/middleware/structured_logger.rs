use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error as ActixError, HttpMessage};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, error, info, warn};

use super::request_trace::TraceId;

/// Emits one `request_completed` event per request, tagged with the game id
/// when the path names one. Level follows the status class; health checks
/// log at debug.
pub struct StructuredLogger;

impl<S, B> Transform<S, ServiceRequest> for StructuredLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type InitError = ();
    type Transform = StructuredLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(StructuredLoggerMiddleware { service }))
    }
}

pub struct StructuredLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for StructuredLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let game_id = game_id_from_path(&path).map(str::to_string);
        let trace_id = req
            .extensions()
            .get::<TraceId>()
            .map(|t| t.0.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let fut = self.service.call(req);

        Box::pin(async move {
            let result = fut.await;

            let status = match &result {
                Ok(res) => res.status(),
                Err(err) => err.as_response_error().status_code(),
            };
            let line = Completed {
                method: &method,
                path: &path,
                game_id: game_id.as_deref(),
                status: status.as_u16(),
                duration_us: start.elapsed().as_micros() as u64,
                trace_id: &trace_id,
            };

            if status.is_server_error() {
                line.emit(Level::Error);
            } else if status.is_client_error() {
                line.emit(Level::Warn);
            } else if path.starts_with("/health") {
                line.emit(Level::Debug);
            } else {
                line.emit(Level::Info);
            }

            result
        })
    }
}

enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

struct Completed<'a> {
    method: &'a str,
    path: &'a str,
    game_id: Option<&'a str>,
    status: u16,
    duration_us: u64,
    trace_id: &'a str,
}

impl Completed<'_> {
    fn emit(&self, level: Level) {
        let Completed {
            method,
            path,
            game_id,
            status,
            duration_us,
            trace_id,
        } = *self;
        match level {
            Level::Error => error!(http.method = method, url.path = path, game_id, http.status_code = status, duration_us, trace_id, "request_completed"),
            Level::Warn => warn!(http.method = method, url.path = path, game_id, http.status_code = status, duration_us, trace_id, "request_completed"),
            Level::Info => info!(http.method = method, url.path = path, game_id, http.status_code = status, duration_us, trace_id, "request_completed"),
            Level::Debug => debug!(http.method = method, url.path = path, game_id, http.status_code = status, duration_us, trace_id, "request_completed"),
        }
    }
}

/// Game id segment of `/api/games/{id}/...`. Invite-code paths carry no id.
fn game_id_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/api/games/")?;
    let segment = rest.split('/').next()?;
    if segment.is_empty() || segment == "invite" {
        None
    } else {
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::game_id_from_path;

    #[test]
    fn extracts_game_id_from_game_paths() {
        assert_eq!(game_id_from_path("/api/games/01HX"), Some("01HX"));
        assert_eq!(
            game_id_from_path("/api/games/01HX/players/0xabc/round"),
            Some("01HX")
        );
    }

    #[test]
    fn other_paths_have_no_game_id() {
        assert_eq!(game_id_from_path("/api/games"), None);
        assert_eq!(game_id_from_path("/api/games/"), None);
        assert_eq!(game_id_from_path("/api/games/invite/ABC234"), None);
        assert_eq!(game_id_from_path("/health"), None);
        assert_eq!(game_id_from_path("/api/ws"), None);
    }
}
