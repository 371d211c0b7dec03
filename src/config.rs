//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or an
//! explicit `--config` path), then applies environment overrides. API keys are
//! only ever read from the environment, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Which preprocessing steps run before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub contrast: bool,
    pub binarize: bool,
    pub denoise: bool,
}

/// Recognizer invocation settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract executable (bare name is resolved through `PATH`).
    pub tesseract_cmd: PathBuf,
    /// Tesseract language pack, e.g. `"eng"`.
    pub language: String,
    /// Tesseract page segmentation mode.
    pub psm: u8,
}

/// Webhook delegate settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// `None` disables the webhook tier.
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

/// Gemini REST provider settings (`[gemini]`).
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL up to and including the API version, e.g. `.../v1beta`.
    pub api_base_url: String,
    /// Primary model, already normalized (no `models/` prefix).
    pub model: String,
    /// Tried in order after a model-class failure, skipping the primary.
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// DeepSeek chat-completions provider settings (`[deepseek]`).
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    /// Endpoints tried in order; the first success wins.
    pub api_urls: Vec<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// SerpAPI search settings (`[search]`).
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub endpoint: String,
    pub num_results: usize,
    pub cache_ttl_seconds: u64,
    pub timeout_seconds: u64,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
    pub webhook: WebhookConfig,
    pub gemini: GeminiConfig,
    pub deepseek: DeepSeekConfig,
    pub search: SearchConfig,
    /// From `GEMINI_API_KEY`.
    pub gemini_api_key: Option<String>,
    /// From `DEEPSEEK_API_KEY`.
    pub deepseek_api_key: Option<String>,
    /// From `SERPAPI_KEY`.
    pub serpapi_key: Option<String>,
}

/// Values taken from the process environment.
///
/// Tests build this directly instead of mutating env vars.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub log_level: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub deepseek_model: Option<String>,
    pub deepseek_api_url: Option<String>,
    pub serpapi_key: Option<String>,
    pub webhook_url: Option<String>,
    pub tesseract_cmd: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        let var = |name: &str| non_blank(env::var(name).ok());
        Self {
            log_level: var("ICMARK_LOG_LEVEL"),
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL"),
            deepseek_api_key: var("DEEPSEEK_API_KEY"),
            deepseek_model: var("DEEPSEEK_MODEL"),
            deepseek_api_url: var("DEEPSEEK_API_URL"),
            serpapi_key: var("SERPAPI_KEY"),
            webhook_url: var("N8N_WEBHOOK_URL"),
            tesseract_cmd: var("TESSERACT_CMD"),
        }
    }
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    app: RawApp,
    preprocess: RawPreprocess,
    ocr: RawOcr,
    webhook: RawWebhook,
    gemini: RawGemini,
    deepseek: RawDeepSeek,
    search: RawSearch,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawApp {
    log_level: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawPreprocess {
    contrast: bool,
    binarize: bool,
    denoise: bool,
}

impl Default for RawPreprocess {
    fn default() -> Self {
        Self { contrast: true, binarize: true, denoise: true }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawOcr {
    tesseract_cmd: String,
    language: String,
    psm: u8,
}

impl Default for RawOcr {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: 6,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawWebhook {
    url: Option<String>,
    timeout_seconds: u64,
}

impl Default for RawWebhook {
    fn default() -> Self {
        Self { url: None, timeout_seconds: 10 }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawGemini {
    api_base_url: String,
    model: String,
    fallback_models: Vec<String>,
    temperature: f32,
    timeout_seconds: u64,
}

impl Default for RawGemini {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            fallback_models: vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()],
            temperature: 0.2,
            timeout_seconds: 25,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawDeepSeek {
    api_urls: Vec<String>,
    model: String,
    temperature: f32,
    timeout_seconds: u64,
}

impl Default for RawDeepSeek {
    fn default() -> Self {
        Self {
            api_urls: vec![
                "https://api.deepseek.com/v1/chat/completions".to_string(),
                "https://api.deepseek.com/chat/completions".to_string(),
            ],
            model: "deepseek-reasoner".to_string(),
            temperature: 0.2,
            timeout_seconds: 25,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawSearch {
    endpoint: String,
    num_results: usize,
    cache_ttl_seconds: u64,
    timeout_seconds: u64,
}

impl Default for RawSearch {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search".to_string(),
            num_results: 5,
            cache_ttl_seconds: 600,
            timeout_seconds: 15,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from `path`, or from [`DEFAULT_CONFIG_PATH`], then apply
/// environment overrides.
///
/// An explicit path must exist. When no path is given and the default file is
/// absent, built-in defaults are used.
pub fn load(path: Option<&Path>) -> Result<Config, AppError> {
    let env = EnvOverrides::from_env();
    match path {
        Some(p) => load_from(p, &env),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_from(default, &env)
            } else {
                Config::with_env(&env)
            }
        }
    }
}

/// Internal loader: explicit path and explicit overrides.
pub fn load_from(path: &Path, env: &EnvOverrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    resolve(parsed, env)
}

fn resolve(parsed: RawConfig, env: &EnvOverrides) -> Result<Config, AppError> {
    if parsed.search.num_results == 0 {
        return Err(AppError::Config("search.num_results must be at least 1".into()));
    }
    if parsed.deepseek.api_urls.is_empty() && env.deepseek_api_url.is_none() {
        return Err(AppError::Config("deepseek.api_urls must not be empty".into()));
    }

    let gemini_model = normalize_model(
        env.gemini_model.as_deref().unwrap_or(&parsed.gemini.model),
    );

    // DEEPSEEK_API_URL stands in for the primary endpoint; the rest stay as fallbacks.
    let mut deepseek_urls = parsed.deepseek.api_urls;
    if let Some(url) = &env.deepseek_api_url {
        match deepseek_urls.first_mut() {
            Some(first) => *first = url.clone(),
            None => deepseek_urls.push(url.clone()),
        }
        deepseek_urls.dedup();
    }

    let log_level = env.log_level.clone().unwrap_or(parsed.app.log_level);
    crate::logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("app.log_level: {e}")))?;

    let tesseract_cmd = env
        .tesseract_cmd
        .clone()
        .unwrap_or(parsed.ocr.tesseract_cmd);

    Ok(Config {
        log_level,
        preprocess: PreprocessConfig {
            contrast: parsed.preprocess.contrast,
            binarize: parsed.preprocess.binarize,
            denoise: parsed.preprocess.denoise,
        },
        ocr: OcrConfig {
            tesseract_cmd: expand_home(&tesseract_cmd),
            language: parsed.ocr.language,
            psm: parsed.ocr.psm,
        },
        webhook: WebhookConfig {
            url: env.webhook_url.clone().or(non_blank(parsed.webhook.url)),
            timeout_seconds: parsed.webhook.timeout_seconds,
        },
        gemini: GeminiConfig {
            api_base_url: parsed.gemini.api_base_url.trim_end_matches('/').to_string(),
            model: gemini_model,
            fallback_models: parsed
                .gemini
                .fallback_models
                .iter()
                .map(|m| normalize_model(m))
                .collect(),
            temperature: parsed.gemini.temperature,
            timeout_seconds: parsed.gemini.timeout_seconds,
        },
        deepseek: DeepSeekConfig {
            api_urls: deepseek_urls,
            model: env.deepseek_model.clone().unwrap_or(parsed.deepseek.model),
            temperature: parsed.deepseek.temperature,
            timeout_seconds: parsed.deepseek.timeout_seconds,
        },
        search: SearchConfig {
            endpoint: parsed.search.endpoint,
            num_results: parsed.search.num_results,
            cache_ttl_seconds: parsed.search.cache_ttl_seconds,
            timeout_seconds: parsed.search.timeout_seconds,
        },
        gemini_api_key: env.gemini_api_key.clone(),
        deepseek_api_key: env.deepseek_api_key.clone(),
        serpapi_key: env.serpapi_key.clone(),
    })
}

/// Accept both `gemini-1.5-flash` and `models/gemini-1.5-flash`.
pub fn normalize_model(model: &str) -> String {
    let m = model.trim();
    match m.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("models/") => m[7..].to_string(),
        _ => m.to_string(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── built-in defaults ─────────────────────────────────────────────────────────

impl Config {
    /// Built-in defaults with the given environment applied.
    pub fn with_env(env: &EnvOverrides) -> Result<Self, AppError> {
        resolve(RawConfig::default(), env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn empty_file_yields_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.gemini.model, "gemini-1.5-flash");
        assert_eq!(cfg.deepseek.model, "deepseek-reasoner");
        assert_eq!(cfg.deepseek.api_urls.len(), 2);
        assert_eq!(cfg.search.num_results, 5);
        assert_eq!(cfg.search.cache_ttl_seconds, 600);
        assert_eq!(cfg.webhook.timeout_seconds, 10);
        assert!(cfg.webhook.url.is_none());
        assert!(cfg.preprocess.contrast && cfg.preprocess.binarize && cfg.preprocess.denoise);
    }

    #[test]
    fn keys_never_come_from_toml() {
        let f = write_toml(
            r#"
[gemini]
api_key = "from-toml"
model = "gemini-1.5-pro"
"#,
        );
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert!(cfg.gemini_api_key.is_none());
        assert_eq!(cfg.gemini.model, "gemini-1.5-pro");
    }

    #[test]
    fn env_overrides_apply() {
        let f = write_toml(
            r#"
[app]
log_level = "warn"

[webhook]
url = "http://toml.example/hook"
"#,
        );
        let env = EnvOverrides {
            log_level: Some("debug".into()),
            gemini_model: Some("models/gemini-1.5-pro".into()),
            deepseek_model: Some("deepseek-chat".into()),
            deepseek_api_url: Some("http://local/v1/chat/completions".into()),
            webhook_url: Some("http://env.example/hook".into()),
            serpapi_key: Some("serp".into()),
            ..EnvOverrides::default()
        };
        let cfg = load_from(f.path(), &env).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.gemini.model, "gemini-1.5-pro");
        assert_eq!(cfg.deepseek.model, "deepseek-chat");
        assert_eq!(
            cfg.deepseek.api_urls,
            vec!["http://local/v1/chat/completions", "https://api.deepseek.com/chat/completions"]
        );
        assert_eq!(cfg.webhook.url.as_deref(), Some("http://env.example/hook"));
        assert_eq!(cfg.serpapi_key.as_deref(), Some("serp"));
    }

    #[test]
    fn deepseek_url_override_keeps_fallback_count() {
        let f = write_toml(
            r#"
[deepseek]
api_urls = ["https://a.example/v1/chat", "https://b.example/chat"]
"#,
        );
        let env = EnvOverrides {
            deepseek_api_url: Some("https://b.example/chat".into()),
            ..EnvOverrides::default()
        };
        let cfg = load_from(f.path(), &env).unwrap();
        assert_eq!(cfg.deepseek.api_urls, vec!["https://b.example/chat"]);

        let cfg = Config::with_env(&EnvOverrides {
            deepseek_api_url: Some("http://local/chat".into()),
            ..EnvOverrides::default()
        })
        .unwrap();
        assert_eq!(cfg.deepseek.api_urls.len(), 2);
        assert_eq!(cfg.deepseek.api_urls[0], "http://local/chat");
    }

    #[test]
    fn bad_log_level_rejected() {
        let f = write_toml("[app]\nlog_level = \"verbose\"\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("app.log_level"), "{err}");

        let env = EnvOverrides { log_level: Some("loud".into()), ..EnvOverrides::default() };
        assert!(Config::with_env(&env).is_err());

        let env = EnvOverrides { log_level: Some("TRACE".into()), ..EnvOverrides::default() };
        assert_eq!(Config::with_env(&env).unwrap().log_level, "TRACE");
    }

    #[test]
    fn blank_webhook_url_is_unset() {
        let f = write_toml("[webhook]\nurl = \"   \"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert!(cfg.webhook.url.is_none());
    }

    #[test]
    fn zero_results_rejected() {
        let f = write_toml("[search]\nnum_results = 0\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("num_results"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn malformed_toml_errors() {
        let f = write_toml("[search\nendpoint = ");
        let msg = load_from(f.path(), &EnvOverrides::default()).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn model_prefix_stripped() {
        assert_eq!(normalize_model("models/gemini-1.5-flash"), "gemini-1.5-flash");
        assert_eq!(normalize_model("Models/gemini-1.5-pro "), "gemini-1.5-pro");
        assert_eq!(normalize_model("gemini-1.5-flash"), "gemini-1.5-flash");
        assert_eq!(normalize_model("model"), "model");
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/usr/bin/tesseract"), PathBuf::from("/usr/bin/tesseract"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/bin/tesseract");
        assert!(expanded.starts_with(&home));
    }
}
