// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only unless `bind_address` is overridden.
//
// Endpoints (all under /api/v1):
//   GET  /health                          (no auth)
//   POST /auth/register                   (no auth)
//   POST /auth/login                      (no auth)
//   GET  /universities                    (no auth — public reference data)
//   GET  /universities/recommend          (no auth)
//   GET  /universities/{name}/cutoffs     (no auth)
//   GET  /auth/me
//   GET|POST /schedules, GET /schedules/today, DELETE /schedules/{id}
//   GET|POST /grades, GET /grades/summary, DELETE /grades/{id}
//   GET|POST /activities, DELETE /activities/{id}
//   GET|POST /questions, GET /questions/all, GET /questions/{id},
//   POST /questions/{id}/answers
//   GET  /dashboard

pub mod auth;
pub mod error;
pub mod routes;
pub mod validate;

use anyhow::Result;
use axum::{
    extract::Request,
    http::Method,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let public = Router::new()
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/universities", get(routes::universities::search))
        .route(
            "/api/v1/universities/recommend",
            get(routes::universities::recommend),
        )
        .route(
            "/api/v1/universities/{name}/cutoffs",
            get(routes::universities::cutoffs),
        );

    let protected = Router::new()
        .route("/api/v1/auth/me", get(routes::auth::me))
        .route(
            "/api/v1/schedules",
            get(routes::schedules::list).post(routes::schedules::create),
        )
        .route("/api/v1/schedules/today", get(routes::schedules::today))
        .route("/api/v1/schedules/{id}", delete(routes::schedules::remove))
        .route(
            "/api/v1/grades",
            get(routes::grades::list).post(routes::grades::create),
        )
        .route("/api/v1/grades/summary", get(routes::grades::summary))
        .route("/api/v1/grades/{id}", delete(routes::grades::remove))
        .route(
            "/api/v1/activities",
            get(routes::activities::list).post(routes::activities::create),
        )
        .route(
            "/api/v1/activities/{id}",
            delete(routes::activities::remove),
        )
        .route(
            "/api/v1/questions",
            get(routes::questions::list_mine).post(routes::questions::create),
        )
        .route("/api/v1/questions/all", get(routes::questions::list_all))
        .route("/api/v1/questions/{id}", get(routes::questions::get_one))
        .route(
            "/api/v1/questions/{id}/answers",
            post(routes::questions::answer),
        )
        .route("/api/v1/dashboard", get(routes::dashboard::dashboard))
        .route_layer(from_fn_with_state(ctx.clone(), auth::require_auth));

    public
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(from_fn(log_request))
        .with_state(ctx)
}

/// Log one line per request: method, path, status, elapsed ms.
async fn log_request(request: Request, next: axum::middleware::Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = start.elapsed().as_millis();
    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = elapsed_ms as u64,
        "request"
    );
    response
}
