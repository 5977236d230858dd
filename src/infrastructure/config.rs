use crate::domain::models::AiProvider;
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const PROVIDERS_JSON: &str = "providers.json";
const DEFAULT_NEWS_CACHE_HOURS: i64 = 5;

pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub providers: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub deepseek_base_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            gemini_base_url: GEMINI_DEFAULT_BASE_URL.to_string(),
            openai_base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            deepseek_base_url: DEEPSEEK_DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn base_url(&self, provider: AiProvider) -> &str {
        match provider {
            AiProvider::Gemini => &self.gemini_base_url,
            AiProvider::OpenAi => &self.openai_base_url,
            AiProvider::DeepSeek => &self.deepseek_base_url,
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "Routine Planner",
                "defaultProvider": "gemini",
                "newsCacheHours": DEFAULT_NEWS_CACHE_HOURS
            }),
        ),
        (
            PROVIDERS_JSON,
            serde_json::json!({
                "schema": 1,
                "gemini": { "baseUrl": GEMINI_DEFAULT_BASE_URL },
                "openai": { "baseUrl": OPENAI_DEFAULT_BASE_URL },
                "deepseek": { "baseUrl": DEEPSEEK_DEFAULT_BASE_URL }
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        providers: read_config(&config_dir.join(PROVIDERS_JSON))?,
    })
}

pub fn read_default_provider(config_dir: &Path) -> Result<AiProvider, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let Some(raw) = app
        .get("defaultProvider")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
    else {
        return Ok(AiProvider::Gemini);
    };
    raw.parse::<AiProvider>().map_err(InfraError::InvalidConfig)
}

pub fn read_news_cache_hours(config_dir: &Path) -> Result<i64, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let Some(hours) = app.get("newsCacheHours") else {
        return Ok(DEFAULT_NEWS_CACHE_HOURS);
    };
    let hours = hours.as_i64().ok_or_else(|| {
        InfraError::InvalidConfig("newsCacheHours must be an integer".to_string())
    })?;
    if hours < 0 {
        return Err(InfraError::InvalidConfig(
            "newsCacheHours must be >= 0".to_string(),
        ));
    }
    Ok(hours)
}

pub fn read_provider_endpoints(config_dir: &Path) -> Result<ProviderEndpoints, InfraError> {
    let providers = read_config(&config_dir.join(PROVIDERS_JSON))?;
    let defaults = ProviderEndpoints::default();
    let base_url = |provider: AiProvider| -> String {
        providers
            .get(provider.as_str())
            .and_then(|entry| entry.get("baseUrl"))
            .and_then(serde_json::Value::as_str)
            .map(|value| value.trim().trim_end_matches('/'))
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| defaults.base_url(provider).to_string())
    };

    let endpoints = ProviderEndpoints {
        gemini_base_url: base_url(AiProvider::Gemini),
        openai_base_url: base_url(AiProvider::OpenAi),
        deepseek_base_url: base_url(AiProvider::DeepSeek),
    };
    for provider in AiProvider::ALL {
        url::Url::parse(endpoints.base_url(provider)).map_err(|error| {
            InfraError::InvalidConfig(format!("invalid {} baseUrl: {error}", provider.as_str()))
        })?;
    }
    Ok(endpoints)
}

/// Overrides one provider's base URL, e.g. to aim it at a local mock server.
pub fn save_provider_base_url(
    config_dir: &Path,
    provider: AiProvider,
    base_url: &str,
) -> Result<(), InfraError> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(InfraError::InvalidConfig("baseUrl must not be empty".to_string()));
    }
    url::Url::parse(base_url)
        .map_err(|error| InfraError::InvalidConfig(format!("invalid baseUrl: {error}")))?;

    let path = config_dir.join(PROVIDERS_JSON);
    let mut providers = read_config(&path)?;
    let object = providers.as_object_mut().ok_or_else(|| {
        InfraError::InvalidConfig(format!("invalid object structure in {}", path.display()))
    })?;
    object.insert(
        provider.as_str().to_string(),
        serde_json::json!({ "baseUrl": base_url }),
    );

    let formatted = serde_json::to_string_pretty(&providers)?;
    fs::write(path, format!("{formatted}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_DIR: AtomicUsize = AtomicUsize::new(0);

    struct TempConfigDir {
        path: PathBuf,
    }

    impl TempConfigDir {
        fn new() -> Self {
            let sequence = NEXT_TEMP_DIR.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "routine-planner-config-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp config dir");
            Self { path }
        }
    }

    impl Drop for TempConfigDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn defaults_are_written_and_readable() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");

        let bundle = load_configs(&dir.path).expect("load configs");
        assert_eq!(bundle.app["appName"], "Routine Planner");
        assert_eq!(read_default_provider(&dir.path).expect("provider"), AiProvider::Gemini);
        assert_eq!(read_news_cache_hours(&dir.path).expect("hours"), 5);
        assert_eq!(
            read_provider_endpoints(&dir.path).expect("endpoints"),
            ProviderEndpoints::default()
        );
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = TempConfigDir::new();
        fs::write(
            dir.path.join(APP_JSON),
            r#"{"schema":1,"defaultProvider":"deepseek","newsCacheHours":1}"#,
        )
        .expect("write custom app config");
        ensure_default_configs(&dir.path).expect("write defaults");

        assert_eq!(read_default_provider(&dir.path).expect("provider"), AiProvider::DeepSeek);
        assert_eq!(read_news_cache_hours(&dir.path).expect("hours"), 1);
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = TempConfigDir::new();
        fs::write(dir.path.join(APP_JSON), r#"{"schema":2}"#).expect("write config");
        assert!(matches!(
            read_news_cache_hours(&dir.path),
            Err(InfraError::InvalidConfig(_))
        ));
    }

    #[test]
    fn base_url_override_is_trimmed_and_validated() {
        let dir = TempConfigDir::new();
        ensure_default_configs(&dir.path).expect("write defaults");
        save_provider_base_url(&dir.path, AiProvider::OpenAi, "http://127.0.0.1:9999/v1/")
            .expect("save base url");

        let endpoints = read_provider_endpoints(&dir.path).expect("endpoints");
        assert_eq!(endpoints.openai_base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(endpoints.gemini_base_url, GEMINI_DEFAULT_BASE_URL);

        assert!(save_provider_base_url(&dir.path, AiProvider::Gemini, "not a url").is_err());
    }
}
