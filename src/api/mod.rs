pub mod body;
pub mod caller;
pub mod error;
mod handlers;
pub mod middleware;
pub mod validation;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::db::Database;
use middleware::SecurityConfig;

/// Router with no API key, no rate limit and permissive CORS.
pub fn create_router(db: Database) -> Router {
    create_router_with_security(db, SecurityConfig::disabled())
}

pub fn create_router_with_security(db: Database, security: SecurityConfig) -> Router {
    let mut api = Router::new()
        // Projects
        .route("/projects", get(handlers::list_projects).post(handlers::create_project))
        .route("/projects/{id}", get(handlers::get_project).delete(handlers::delete_project))
        .route("/projects/{id}/members", get(handlers::list_members).post(handlers::add_member))
        // Orderable resources
        .route("/projects/{id}/features", get(handlers::list_features).post(handlers::create_feature))
        .route("/features/{id}/comments", get(handlers::list_comments).post(handlers::create_comment))
        .route(
            "/projects/{id}/roadmap-items",
            get(handlers::list_roadmap_items).post(handlers::create_roadmap_item),
        )
        .route("/projects/{id}/sprints", get(handlers::list_sprints).post(handlers::create_sprint))
        .route("/projects/{id}/tasks", get(handlers::list_tasks).post(handlers::create_task))
        // Reordering
        .route("/features/order", patch(handlers::reorder_features))
        .route("/comments/order", patch(handlers::reorder_comments))
        .route("/roadmap-items/order", patch(handlers::reorder_roadmap_items))
        .route("/sprints/order", patch(handlers::reorder_sprints))
        .route("/tasks/order", patch(handlers::reorder_tasks));

    if security.api_key.is_some() {
        api = api.layer(from_fn_with_state(security.clone(), middleware::auth_middleware));
    }
    if let Some(limiter) = security.rate_limiter.clone() {
        api = api.layer(from_fn_with_state(limiter, middleware::rate_limit_middleware));
    }

    // Health stays outside the auth layer
    let api = api.route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&security)),
        )
        .with_state(db)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    match &security.cors_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match o.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
