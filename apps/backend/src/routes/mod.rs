use actix_web::web;

pub mod games;
pub mod health;
pub mod realtime;

/// Register every route. Used by `main.rs` and by the route tests, which
/// exercise the same paths without the outer middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(web::scope("/api/games").configure(games::configure_routes));
    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
