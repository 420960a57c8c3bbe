use anyhow::Context;
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants::API_PREFIX;
use crate::db::Store;
use crate::services::{
    ActivationNotifier, ActivationService, Argon2Hasher, RegistrationService, UserService,
    UserStore, UuidTokenGenerator, notifier_from_config,
};

pub mod auth;
mod context;
pub mod error;
mod health;
mod observability;
mod types;
mod users;
pub mod validation;

pub use context::RequestContext;
pub use error::{ApiError, AppError};
pub use types::*;

pub struct AppState {
    pub config: Arc<Config>,

    pub registration: Arc<RegistrationService>,

    pub activation: Arc<ActivationService>,

    pub users: Arc<UserService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wires the services over `store`, sending activation emails through
    /// `notifier`.
    pub fn new(
        config: Config,
        store: &Store,
        notifier: Arc<dyn ActivationNotifier>,
        prometheus_handle: Option<PrometheusHandle>,
    ) -> anyhow::Result<Arc<Self>> {
        let user_store: Arc<dyn UserStore> = Arc::new(store.user_repo());
        let hasher = Arc::new(
            Argon2Hasher::new(&config.security).context("Invalid Argon2 parameters")?,
        );

        let registration = Arc::new(RegistrationService::new(
            user_store.clone(),
            hasher.clone(),
            Arc::new(UuidTokenGenerator),
            notifier,
        ));
        let activation = Arc::new(ActivationService::new(user_store.clone()));
        let users = Arc::new(UserService::new(user_store, hasher));

        Ok(Arc::new(Self {
            config: Arc::new(config),
            registration,
            activation,
            users,
            start_time: std::time::Instant::now(),
            prometheus_handle,
        }))
    }
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await
    .context("Failed to open database")?;

    let notifier =
        notifier_from_config(&config.mail).context("Failed to set up activation mailer")?;
    tracing::info!(notifier = notifier.name(), "Activation notifier ready");

    AppState::new(config, &store, notifier, prometheus_handle)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config.server.cors_allowed_origins;

    // matchit needs one parameter name per segment position, so the activation
    // token shares `{id}` with the user routes.
    let api_router = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/{id}/active", patch(users::activate_user))
        .route("/users/{id}", get(users::get_user).put(users::update_user))
        .route("/userList", get(users::list_users))
        .route("/activation-emails", post(users::resend_activation))
        .route("/health", get(health::health));

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest(API_PREFIX, api_router)
        .route("/metrics", get(observability::get_metrics))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
