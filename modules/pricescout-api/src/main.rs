use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pricescout_api::{
    router, AppState, GeminiReasoners, LogSearchHistory, PgSearchHistory, SearchHistory,
};
use pricescout_archive::{Archive, ArchiveConfig};
use pricescout_common::{Config, PriceScoutError};
use pricescout_scout::{PriceScout, RenderSlot};

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("pricescout=info"))?;

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    info!(backend = ?config.render_backend, model = %config.gemini_model, "Starting PriceScout API");

    let archive = Archive::new(ArchiveConfig {
        render_backend: config.render_backend.clone(),
        acquisition: config.acquisition.clone(),
    })
    .map_err(|e| PriceScoutError::Config(e.to_string()))?;

    let history: Arc<dyn SearchHistory> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            sqlx::migrate!("../../migrations").run(&pool).await?;
            info!("Connected to database, migrations complete");
            Arc::new(PgSearchHistory::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, search history is log-only");
            Arc::new(LogSearchHistory)
        }
    };

    let state = Arc::new(AppState {
        scout: PriceScout::new(Arc::new(archive), RenderSlot::new()),
        reasoners: Arc::new(GeminiReasoners::new(
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
        )),
        history,
    });

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("PriceScout API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
