use crate::error::AppError;
use config::{Config as Cfg, File};
use secrecy::Secret;
use serde::Deserialize;
use std::env;

/// Default Gemini REST endpoint.
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default cap on a single uploaded image (10MB).
const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Default cap on the whole request body (16MB); leaves headroom for the
/// multipart framing around a maximum-size image.
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl HttpConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(flatten)]
    pub common: HttpConfig,
    pub vision: VisionConfig,
    pub gemini: GeminiSettings,
    pub limits: LimitsConfig,
    pub static_assets: StaticAssetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    pub backend: VisionBackend,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum VisionBackend {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_image_bytes: usize,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticAssetsConfig {
    pub dir: String,
}

impl AnalysisConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = HttpConfig::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: VisionBackend = get_env("VISION_BACKEND", Some("gemini"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The mock backend never calls out, so the credential is optional there;
        // the real backend refuses to start without one.
        let api_key = match backend {
            VisionBackend::Gemini => Secret::new(get_env("GEMINI_API_KEY", None, is_prod)?),
            VisionBackend::Mock => Secret::new(env::var("GEMINI_API_KEY").unwrap_or_default()),
        };

        Ok(AnalysisConfig {
            common: common_config,
            vision: VisionConfig { backend },
            gemini: GeminiSettings {
                api_key,
                model: get_env("GEMINI_MODEL", Some("gemini-2.5-flash"), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
                timeout_secs: get_env(
                    "GEMINI_TIMEOUT_SECS",
                    Some(&DEFAULT_GEMINI_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
            },
            limits: LimitsConfig {
                max_image_bytes: get_env(
                    "MAX_IMAGE_BYTES",
                    Some(&DEFAULT_MAX_IMAGE_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
                max_body_bytes: get_env(
                    "MAX_BODY_BYTES",
                    Some(&DEFAULT_MAX_BODY_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            },
            static_assets: StaticAssetsConfig {
                dir: get_env("STATIC_DIR", Some("public"), is_prod)?,
            },
        })
    }
}

impl std::str::FromStr for VisionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(VisionBackend::Gemini),
            "mock" => Ok(VisionBackend::Mock),
            _ => Err(format!("Invalid vision backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
