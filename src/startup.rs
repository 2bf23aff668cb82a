use crate::config::{AnalysisConfig, VisionBackend};
use crate::error::AppError;
use crate::handlers;
use crate::services::providers::{
    VisionProvider, gemini::GeminiVisionProvider, mock::MockVisionProvider,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: AnalysisConfig,
    pub vision: Arc<dyn VisionProvider>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    pub async fn build(config: AnalysisConfig) -> Result<Self, AppError> {
        let vision: Arc<dyn VisionProvider> = match config.vision.backend {
            VisionBackend::Gemini => Arc::new(GeminiVisionProvider::new(config.gemini.clone())),
            VisionBackend::Mock => Arc::new(MockVisionProvider::new()),
        };

        tracing::info!(
            backend = ?config.vision.backend,
            model = %config.gemini.model,
            "Initialized vision provider"
        );

        let state = AppState {
            config: config.clone(),
            vision,
        };

        let app = Router::new()
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/analyze", post(handlers::analyze_image))
            .route("/download", post(handlers::download_report))
            .fallback_service(ServeDir::new(&config.static_assets.dir))
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
