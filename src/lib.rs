use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod journal;
pub mod models;
pub mod services;
pub mod supabase;

#[cfg(test)]
mod testing;

use auth::middleware::BrowserSession;
use auth::store::SessionStore;
use config::Config;
use services::notifier::Notifier;
use services::Collaborators;
use supabase::{SupabaseClient, SupabaseEntries};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub supabase: SupabaseClient,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let supabase = SupabaseClient::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            supabase,
            sessions: SessionStore::new(),
        })
    }

    /// Wire the journal's collaborators for one browser session.
    pub fn collaborators(&self, browser: &BrowserSession, notifier: Arc<dyn Notifier>) -> Collaborators {
        let entries = SupabaseEntries::new(self.supabase.clone(), browser.session.clone());
        Collaborators::new(browser.session.clone(), Arc::new(entries), notifier)
    }
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/auth/login", post(handlers::auth::login))
        // Authenticates through its token query parameter
        .route("/ws", get(handlers::ws::ws_handler));

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/dashboard", get(handlers::entries::get_dashboard))
        .route("/api/entries", post(handlers::entries::create_entry))
        .route("/api/entries/:id", put(handlers::entries::update_entry))
        .route("/api/entries/:id", delete(handlers::entries::delete_entry))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(config.cors_extra_origins.iter())
        .filter_map(|o| match o.parse::<axum::http::HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}
