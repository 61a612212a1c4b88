pub mod accounts;
pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod flash;
pub mod forms;
pub mod profiles;
pub mod state;
pub mod store;

pub use app::build_app;
pub use state::AppState;

/// Installs the global tracing subscriber. `LOG_FORMAT=json` switches to
/// JSON lines.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "curenet=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
