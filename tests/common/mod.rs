use plant_analysis_service::config::{AnalysisConfig, VisionBackend};
use plant_analysis_service::startup::Application;

/// Load a test configuration: ephemeral port, mock vision backend. Individual
/// tests override fields as needed.
pub fn test_config() -> AnalysisConfig {
    // Same value in every test, so concurrent setters are benign.
    std::env::set_var("GEMINI_API_KEY", "test-api-key");

    let mut config = AnalysisConfig::load().expect("Failed to load configuration");
    config.common.port = 0; // Random port for testing
    config.vision.backend = VisionBackend::Mock;
    config
}

/// Spawn the application in the background and return its base URL.
pub async fn spawn_app(config: AnalysisConfig) -> String {
    let app = Application::build(config)
        .await
        .expect("Failed to build test application");
    let port = app.port();

    tokio::spawn(app.run_until_stopped());

    format!("http://127.0.0.1:{}", port)
}
