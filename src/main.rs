use std::sync::Arc;

use curenet::{
    app::{build_app, serve},
    config::AppConfig,
    state::{connect, AppState},
    store::{AccountStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    curenet::init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    let db = connect(&config).await?;

    // Run migrations if present
    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let store = Arc::new(PgStore::new(db)) as Arc<dyn AccountStore>;
    let app = build_app(AppState::from_parts(store, config));
    serve(app).await
}
