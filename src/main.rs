use ai_art_detector::api::{self, AppState, RouterOptions};
use ai_art_detector::classifier::HostedClassifier;
use ai_art_detector::config::AppConfig;
use ai_art_detector::storage::FeedbackStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("🚀 Starting AI Art Detector API");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Classifier: {}", config.classifier.endpoint);
    info!("   - Feedback file: {:?}", config.storage.feedback_path);
    info!("   - Server: {}", config.bind_address());

    // Initialize classifier client
    let classifier = Arc::new(HostedClassifier::new(&config.classifier)?);
    if config.classifier.api_token.is_none() {
        info!("⚠️  No classifier API token configured, requests are anonymous");
    }
    info!("✅ Classifier client ready ({})", classifier.endpoint());

    // Initialize feedback storage
    info!("💾 Loading feedback aggregate...");
    let feedback_store = Arc::new(FeedbackStore::open(&config.storage.feedback_path).await?);
    match feedback_store.get_aggregate().await {
        Some(aggregate) => info!(
            "✅ Feedback storage ready ({} positive, {} negative)",
            aggregate.positive_count, aggregate.negative_count
        ),
        None => info!("✅ Feedback storage ready (empty)"),
    }

    // Create application state
    let state = AppState {
        classifier,
        feedback_store,
    };

    let app = api::router(
        state,
        RouterOptions {
            max_body_bytes: config.server.max_body_bytes,
            cors: config.server.cors,
        },
    );

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   ANY  /core/                 - Welcome message");
    info!("   POST /core/process-image/   - Classify an image");
    info!("   POST /core/submit-feedback/ - Submit accuracy feedback");
    info!("   GET  /core/fetch-feedback/  - Fetch accuracy ratio");
    info!("   GET  /core/health/          - Health check");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
