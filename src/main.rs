use mood_journal_api::auth::store::spawn_session_sweeper;
use mood_journal_api::config::Config;
use mood_journal_api::{router, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mood_journal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    let sweep_secs = config.session_sweep_secs;
    let addr = config.listen_addr();

    let state = AppState::new(config).expect("Failed to build Supabase client");

    tracing::info!(
        supabase_url = %state.config.supabase_url,
        table = %state.config.entries_table,
        "Supabase backend configured"
    );

    // Refreshes browser sessions near expiry and drops dead ones
    spawn_session_sweeper(state.sessions.clone(), sweep_secs);

    let app = router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
