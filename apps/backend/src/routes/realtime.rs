use actix_web::web;

use crate::ws::session::upgrade;

/// `GET /api/ws?gameId=...`: broadcast relay over WebSocket.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::get().to(upgrade)));
}
