use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod error;
mod groups;
mod observability;
mod passwords;
mod requests;
mod sessions;
mod system;
mod types;
mod users;
pub mod validation;

pub use error::ApiError;
pub use types::*;

use crate::services::{GroupService, IdentityService, MembershipService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn identity_service(&self) -> &Arc<dyn IdentityService> {
        &self.shared.identity_service
    }

    #[must_use]
    pub fn group_service(&self) -> &Arc<dyn GroupService> {
        &self.shared.group_service
    }

    #[must_use]
    pub fn membership_service(&self) -> &Arc<dyn MembershipService> {
        &self.shared.membership_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let public_routes = Router::new()
        .route("/users", post(users::register))
        .route("/sessions", post(sessions::login))
        .route("/forgot-password", post(passwords::forgot_password))
        .route("/reset-password", post(passwords::reset_password))
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(public_routes)
        .merge(create_protected_router(state.clone()))
        .fallback(system::fallback)
        .with_state(state)
        .layer(middleware::from_fn(observability::request_telemetry))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/{user_id}", put(users::update_user))
        .route("/sessions", delete(sessions::logout))
        .route(
            "/groups",
            get(groups::list_groups).post(groups::create_group),
        )
        .route(
            "/groups/{group_id}",
            get(groups::show_group)
                .patch(groups::update_group)
                .delete(groups::delete_group),
        )
        .route(
            "/groups/{group_id}/players/{player_id}",
            delete(groups::remove_player),
        )
        .route(
            "/groups/{group_id}/requests",
            get(requests::list_requests).post(requests::create_request),
        )
        .route(
            "/groups/{group_id}/requests/{request_id}",
            delete(requests::reject_request),
        )
        .route(
            "/groups/{group_id}/requests/{request_id}/accept",
            post(requests::accept_request),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
