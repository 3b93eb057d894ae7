//! Runtime configuration loaded from `$IETE_HOME/config.toml`.

use iete_api::GenerationParams;
use iete_api::Provider;
use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const CONFIG_TOML_FILE: &str = "config.toml";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
pub const DEFAULT_MAX_TURNS: usize = 10;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_STREAM_IDLE_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory; set IETE_HOME")]
    NoHome,
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    pub model: Option<String>,
    pub image_model: Option<String>,
    pub base_url: Option<String>,
    pub max_turns: Option<usize>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub stream_idle_timeout_ms: Option<u64>,
    pub api_key: Option<String>,
}

/// Values supplied on the command line or through the environment; they win
/// over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone)]
pub struct Config {
    pub model: String,
    pub image_model: String,
    pub base_url: String,
    pub max_turns: NonZeroUsize,
    pub temperature: f64,
    pub max_output_tokens: Option<u32>,
    pub stream_idle_timeout: Duration,
    /// `None` when no credential was configured anywhere.
    pub api_key: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("base_url", &self.base_url)
            .field("max_turns", &self.max_turns)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("stream_idle_timeout", &self.stream_idle_timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: iete_api::provider::DEFAULT_BASE_URL.to_string(),
            max_turns: NonZeroUsize::new(DEFAULT_MAX_TURNS).unwrap_or(NonZeroUsize::MIN),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: None,
            stream_idle_timeout: Duration::from_millis(DEFAULT_STREAM_IDLE_TIMEOUT_MS),
            api_key: None,
        }
    }
}

impl Config {
    /// Reads `config.toml` under `iete_home`; a missing file means defaults.
    pub fn load(iete_home: &Path, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let path = iete_home.join(CONFIG_TOML_FILE);
        let cfg = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<ConfigToml>(&contents)
                .map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                ConfigToml::default()
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Self::from_toml(cfg, overrides)
    }

    pub fn from_toml(cfg: ConfigToml, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let max_turns = match cfg.max_turns {
            Some(n) => NonZeroUsize::new(n)
                .ok_or_else(|| ConfigError::Invalid("max_turns must be at least 1".to_string()))?,
            None => defaults.max_turns,
        };

        let temperature = cfg.temperature.unwrap_or(defaults.temperature);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0 and 2, got {temperature}"
            )));
        }

        let api_key = non_blank(overrides.api_key).or_else(|| non_blank(cfg.api_key));

        Ok(Self {
            model: non_blank(overrides.model)
                .or_else(|| non_blank(cfg.model))
                .unwrap_or(defaults.model),
            image_model: non_blank(cfg.image_model).unwrap_or(defaults.image_model),
            base_url: non_blank(cfg.base_url).unwrap_or(defaults.base_url),
            max_turns,
            temperature,
            max_output_tokens: cfg.max_output_tokens,
            stream_idle_timeout: cfg
                .stream_idle_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.stream_idle_timeout),
            api_key,
        })
    }

    pub fn provider(&self) -> Provider {
        Provider::gemini(self.base_url.clone(), self.stream_idle_timeout)
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `$IETE_HOME` if set, otherwise `~/.iete`.
pub fn find_iete_home() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os("IETE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".iete"))
        .ok_or(ConfigError::NoHome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load(dir.path(), ConfigOverrides::default()).expect("config");

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_turns.get(), DEFAULT_MAX_TURNS);
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn reads_file_and_applies_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_TOML_FILE),
            r#"
model = "gemini-2.0-flash"
max_turns = 20
temperature = 0.2
max_output_tokens = 2048
api_key = "from-file"
"#,
        )
        .expect("write");

        let config = Config::load(
            dir.path(),
            ConfigOverrides {
                model: None,
                api_key: Some("from-env".to_string()),
            },
        )
        .expect("config");

        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_turns.get(), 20);
        assert_eq!(config.generation_params().max_output_tokens, Some(2048));
        assert_eq!(config.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn blank_override_does_not_hide_file_key() {
        let cfg = ConfigToml {
            api_key: Some("from-file".to_string()),
            ..Default::default()
        };
        let config = Config::from_toml(
            cfg,
            ConfigOverrides {
                model: None,
                api_key: Some(String::new()),
            },
        )
        .expect("config");
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn rejects_zero_max_turns() {
        let cfg = ConfigToml {
            max_turns: Some(0),
            ..Default::default()
        };
        assert_matches!(
            Config::from_toml(cfg, ConfigOverrides::default()),
            Err(ConfigError::Invalid(_))
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_TOML_FILE), "modle = \"typo\"\n").expect("write");
        assert_matches!(
            Config::load(dir.path(), ConfigOverrides::default()),
            Err(ConfigError::Parse { .. })
        );
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
