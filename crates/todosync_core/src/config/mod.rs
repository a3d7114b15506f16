use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TODOSYNC_CONFIG_PATH";

pub const STORE_URL_ENV_VAR: &str = "SUPABASE_URL";
pub const STORE_KEY_ENV_VAR: &str = "SUPABASE_ANON_KEY";

pub const DEFAULT_TABLE: &str = "todos";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub alert: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        self.paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.paint(self.muted, text)
    }

    pub fn alertize(&self, text: &str) -> String {
        self.paint(self.alert, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            accent: "\x1b[38;5;208m",
            muted: "\x1b[38;5;250m",
            alert: "\x1b[38;5;203m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            accent: "\x1b[38;5;108m",
            muted: "\x1b[38;5;250m",
            alert: "\x1b[38;5;160m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            accent: "",
            muted: "",
            alert: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let cleaned = canonical_key(raw);
    if cleaned.is_empty() {
        return Some("default".into());
    }

    match cleaned.as_str() {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        _ => Some(cleaned),
    }
}

/// Lowercases and collapses every run of non-alphanumerics into one underscore.
pub fn canonical_key(raw: &str) -> String {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    cleaned.trim_matches('_').to_string()
}

/// Optional settings read from the JSON config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub table: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("todosync")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todosync")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let mut config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_deref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }
    if let Some(table) = overrides.table.as_ref() {
        merged.table = Some(table.clone());
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        merged.timeout_secs = Some(timeout_secs);
    }

    merged
}

/// Connection settings for the remote task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub anon_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl StoreConfig {
    /// Reads the endpoint and key from the process environment. Missing values
    /// are a startup failure.
    pub fn from_env(config: &Config) -> Result<Self, AppError> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(config: &Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let (url, anon_key) = match (required(STORE_URL_ENV_VAR), required(STORE_KEY_ENV_VAR)) {
            (Some(url), Some(anon_key)) => (url, anon_key),
            _ => {
                return Err(AppError::config(format!(
                    "store URL or access key is missing; set {STORE_URL_ENV_VAR} and {STORE_KEY_ENV_VAR}"
                )));
            }
        };

        let table = config
            .table
            .as_deref()
            .map(str::trim)
            .filter(|table| !table.is_empty())
            .unwrap_or(DEFAULT_TABLE)
            .to_string();
        let timeout =
            Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1));

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            table,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Config, ConfigOverrides, DEFAULT_TABLE, StoreConfig, canonical_theme_name,
        load_config_from_path, load_config_with_fallback_from_path, merge_overrides,
        palette_for_theme,
    };
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todosync-{nanos}-{file_name}"))
    }

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert_eq!(result.error.map(|err| err.code()), Some("invalid_data"));
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "theme": "Dark Mode",
            "table": "chores",
            "timeout_secs": 5
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.theme.as_deref(), Some("noir"));
        assert_eq!(loaded.table.as_deref(), Some("chores"));
        assert_eq!(loaded.timeout_secs, Some(5));
    }

    #[test]
    fn merge_overrides_replaces_only_given_fields() {
        let base = Config {
            theme: Some("default".into()),
            table: Some("todos".into()),
            timeout_secs: Some(10),
        };
        let overrides = ConfigOverrides {
            theme: Some("solarized".into()),
            table: None,
            timeout_secs: Some(3),
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(base.theme.as_deref(), Some("default"));
        assert_eq!(merged.theme.as_deref(), Some("solarized"));
        assert_eq!(merged.table.as_deref(), Some("todos"));
        assert_eq!(merged.timeout_secs, Some(3));
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = Config {
            theme: Some("noir".into()),
            table: None,
            timeout_secs: None,
        };

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn canonical_theme_name_maps_variants() {
        assert_eq!(canonical_theme_name("Vanilla"), Some("default".into()));
        assert_eq!(canonical_theme_name("Noir"), Some("noir".into()));
        assert_eq!(canonical_theme_name("dark-mode"), Some("noir".into()));
        assert_eq!(canonical_theme_name("  "), Some("default".into()));
    }

    #[test]
    fn palette_for_theme_returns_palette() {
        let plain = palette_for_theme(None);
        assert_eq!(plain.alertize("boom"), "boom");

        let noir = palette_for_theme(Some("noir"));
        assert_eq!(noir.accentize("x"), "\x1b[38;5;208mx\x1b[0m");

        assert!(palette_for_theme(Some("oceanic")).muted.is_empty());
    }

    #[test]
    fn store_config_requires_url_and_key() {
        let env = env_of(&[("SUPABASE_URL", "https://demo.supabase.co")]);
        let err = StoreConfig::from_lookup(&Config::default(), |name| env.get(name).cloned())
            .unwrap_err();
        assert_eq!(err.code(), "config_error");
        assert!(err.is_fatal());

        let env = env_of(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "   "),
        ]);
        assert!(
            StoreConfig::from_lookup(&Config::default(), |name| env.get(name).cloned()).is_err()
        );
    }

    #[test]
    fn store_config_applies_defaults_and_trims_url() {
        let env = env_of(&[
            ("SUPABASE_URL", "https://demo.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]);
        let store = StoreConfig::from_lookup(&Config::default(), |name| env.get(name).cloned())
            .unwrap();

        assert_eq!(store.url, "https://demo.supabase.co");
        assert_eq!(store.anon_key, "anon");
        assert_eq!(store.table, DEFAULT_TABLE);
        assert_eq!(store.timeout, Duration::from_secs(30));
    }

    #[test]
    fn store_config_uses_file_settings() {
        let env = env_of(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]);
        let config = Config {
            theme: None,
            table: Some("chores".into()),
            timeout_secs: Some(0),
        };
        let store = StoreConfig::from_lookup(&config, |name| env.get(name).cloned()).unwrap();

        assert_eq!(store.table, "chores");
        assert_eq!(store.timeout, Duration::from_secs(1));
    }
}
