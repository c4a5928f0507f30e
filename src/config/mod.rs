// src/config/mod.rs
// Environment-driven configuration, loaded once at startup

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct OakConfig {
    // ── Database
    pub database_url: String,
    pub sqlite_max_connections: u32,

    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_bytes: usize,

    // ── Storage
    pub storage_dir: String,

    // ── Identity (no auth: every course belongs to this teacher)
    pub teacher_id: String,

    // ── LLM (OpenAI-compatible chat completions)
    pub openai_base_url: String,
    pub openai_api_key: String,
    pub model: String,
    pub max_output_tokens: usize,

    // ── Logging
    pub log_level: String,
}

/// Parse `key` from `lookup`, tolerating trailing `# comments` and whitespace.
fn value_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    // tracing is not installed yet when the config loads
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        None => default,
    }
}

impl OakConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            database_url: value_or(&lookup, "DATABASE_URL", "sqlite:./oaktree.db?mode=rwc".to_string()),
            sqlite_max_connections: value_or(&lookup, "SQLITE_MAX_CONNECTIONS", 5),
            host: value_or(&lookup, "OAKTREE_HOST", "0.0.0.0".to_string()),
            port: value_or(&lookup, "OAKTREE_PORT", 3001),
            cors_origin: value_or(&lookup, "OAKTREE_CORS_ORIGIN", "*".to_string()),
            max_upload_bytes: value_or(&lookup, "OAKTREE_MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            storage_dir: value_or(&lookup, "OAKTREE_STORAGE_DIR", "./storage".to_string()),
            teacher_id: value_or(&lookup, "OAKTREE_TEACHER_ID", "teacher-default".to_string()),
            openai_base_url: value_or(&lookup, "OPENAI_BASE_URL", "https://api.openai.com".to_string()),
            openai_api_key: value_or(&lookup, "OPENAI_API_KEY", String::new()),
            model: value_or(&lookup, "OAKTREE_MODEL", "gpt-4o-mini".to_string()),
            max_output_tokens: value_or(&lookup, "OAKTREE_MAX_OUTPUT_TOKENS", 4096),
            log_level: value_or(&lookup, "OAKTREE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Full URL of the chat completions endpoint
    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.openai_base_url.trim_end_matches('/'))
    }

    pub fn is_debug(&self) -> bool {
        matches!(self.log_level.to_lowercase().as_str(), "debug" | "trace")
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<OakConfig> = Lazy::new(OakConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> OakConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        OakConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3001);
        assert_eq!(config.teacher_id, "teacher-default");
        assert_eq!(config.sqlite_max_connections, 5);
        assert!(!config.is_debug());
    }

    #[test]
    fn test_values_with_comments() {
        let config = config_from(&[
            ("OAKTREE_PORT", "8080   # local dev"),
            ("OAKTREE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(config.port, 8080);
        assert!(config.is_debug());
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let config = config_from(&[("SQLITE_MAX_CONNECTIONS", "many")]);
        assert_eq!(config.sqlite_max_connections, 5);
    }

    #[test]
    fn test_convenience_methods() {
        let config = config_from(&[
            ("OPENAI_BASE_URL", "http://localhost:11434/"),
            ("OAKTREE_HOST", "127.0.0.1"),
        ]);
        assert_eq!(config.chat_completions_url(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
    }
}
