//! Per-request trace id.
//!
//! `RequestTrace` mints a trace id, stores it in the request extensions,
//! exposes it through a task-local for error rendering, opens a `request`
//! span around the handler and echoes the id as `x-trace-id`.
//!
//! Wire it inside `StructuredLogger` so the logger can read the id:
//!
//! App::new()
//!     .wrap(RequestTrace)
//!     .wrap(StructuredLogger)

use std::cell::RefCell;
use std::future::{ready, Ready};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::HttpMessage;
use futures_util::future::LocalBoxFuture;
use tokio::task_local;
use tracing::{info_span, Instrument};
use uuid::Uuid;

task_local! {
    static TRACE_ID: RefCell<Option<String>>;
}

/// Trace id of the request being served, or "unknown" outside a request.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extension value inserted by [`RequestTrace`].
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

pub struct RequestTrace;

impl<S, B> Transform<S, ServiceRequest> for RequestTrace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequestTraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTraceMiddleware { service }))
    }
}

pub struct RequestTraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestTraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let id = Uuid::new_v4().to_string();
        req.extensions_mut().insert(TraceId(id.clone()));

        let span = info_span!(
            "request",
            trace_id = %id,
            method = %req.method(),
            path = %req.path()
        );
        let fut = self.service.call(req).instrument(span);
        let scoped = TRACE_ID.scope(RefCell::new(Some(id.clone())), fut);

        Box::pin(async move {
            let mut res = scoped.await?;
            if let Ok(value) = HeaderValue::from_str(&id) {
                res.headers_mut()
                    .insert(HeaderName::from_static("x-trace-id"), value);
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trace_id_is_unknown_outside_a_request() {
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn trace_id_is_visible_inside_scope() {
        let seen = TRACE_ID
            .scope(RefCell::new(Some("abc".to_string())), async { trace_id() })
            .await;
        assert_eq!(seen, "abc");
        assert_eq!(trace_id(), "unknown");
    }
}
