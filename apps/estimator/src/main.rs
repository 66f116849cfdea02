use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use estimator::config::Config;
use estimator::embeddings::load_caches;
use estimator::features::FeatureSchema;
use estimator::inference::{HttpSalaryModel, Predictor};
use estimator::llm_client::LlmClient;
use estimator::routes::build_router;
use estimator::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting salary estimator v{}", env!("CARGO_PKG_VERSION"));

    // Embedding caches are mandatory; a missing or mis-sized cache aborts startup
    let (job_function_cache, skill_cache) = load_caches(
        &config.job_function_cache_path,
        &config.skill_cache_path,
        config.embedding_dim,
    )?;
    let schema = FeatureSchema::new(config.embedding_dim);
    info!("Feature schema: {} columns", schema.len());

    let llm = LlmClient::new(config.llm_base_url.clone(), config.llm_api_key.clone())?;
    info!(
        "LLM client initialized ({}, model: {})",
        llm.base_url(),
        config.decoder_model
    );

    let lower = HttpSalaryModel::new(config.lower_model_url.clone())?;
    let upper = HttpSalaryModel::new(config.upper_model_url.clone())?;
    info!("Quantile models: {} / {}", lower.url(), upper.url());

    let predictor = Predictor::new(
        Arc::new(llm),
        config.decoder_model.clone(),
        Arc::new(job_function_cache),
        Arc::new(skill_cache),
        schema,
        Arc::new(lower),
        Arc::new(upper),
    );

    let state = AppState {
        config: config.clone(),
        predictor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
