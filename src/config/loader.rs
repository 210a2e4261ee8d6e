//! Config file discovery, loading, and environment variable overlay.

use crate::config::{Config, ConfigError};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Names the config file explicitly.
pub const CONFIG_PATH_VAR: &str = "POETRY_CAMERA_CONFIG";

const LOCAL_CONFIG: &str = "poetry-camera.toml";
const SYSTEM_CONFIG: &str = "/etc/poetry-camera/config.toml";

/// Where the loaded values came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSources {
    /// The config file that was read, if any.
    pub file: Option<PathBuf>,
    /// Environment variables that overrode config values.
    pub env_overrides: Vec<String>,
}

/// Picks the config file to load.
///
/// An explicit path wins even if it does not exist, so a typo surfaces as a
/// read error instead of silently falling back to defaults.
pub fn discover_config_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    [PathBuf::from(LOCAL_CONFIG), PathBuf::from(SYSTEM_CONFIG)]
        .into_iter()
        .find(|path| path.exists())
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_toml(&contents, path)
}

fn parse_toml(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut Config, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, |name| env::var(name).ok());
}

fn apply_overrides_from(
    config: &mut Config,
    sources: &mut ConfigSources,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("REPLICATE_API_TOKEN") {
        config.captioning.api_token = Some(v);
        sources.env_overrides.push("REPLICATE_API_TOKEN".to_string());
    }
    if let Some(v) = lookup("OPENAI_API_KEY") {
        config.generation.api_key = Some(v);
        sources.env_overrides.push("OPENAI_API_KEY".to_string());
    }
    if let Some(v) = lookup("OPENAI_BASE_URL") {
        config.generation.base_url = v;
        sources.env_overrides.push("OPENAI_BASE_URL".to_string());
    }
}

impl Config {
    /// Loads configuration from all sources and validates it.
    ///
    /// File discovery: `$POETRY_CAMERA_CONFIG`, then `./poetry-camera.toml`,
    /// then `/etc/poetry-camera/config.toml`, else built-in defaults. The
    /// environment overlay is applied last.
    pub fn load() -> Result<(Config, ConfigSources), ConfigError> {
        let explicit = env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let file = discover_config_file(explicit);
        Self::load_with(file, |name| env::var(name).ok())
    }

    fn load_with(
        file: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(Config, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = match &file {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                load_from_file(path)?
            }
            None => Config::default(),
        };
        sources.file = file;

        apply_overrides_from(&mut config, &mut sources, lookup);
        config.validate()?;

        info!(
            file = ?sources.file,
            env_overrides = ?sources.env_overrides,
            "Configuration loaded"
        );
        Ok((config, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LedPattern;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_toml(
            r#"
            [gpio]
            base = 512
            hold_secs = 3

            [session]
            busy_led = "solid"
            remote_attempts = 2
            "#,
            Path::new("test.toml"),
        )
        .unwrap();

        assert_eq!(config.gpio.base, 512);
        assert_eq!(config.gpio.shutter_pin, 16);
        assert_eq!(config.gpio.hold_secs, 3);
        assert_eq!(config.session.busy_led, LedPattern::Solid);
        assert_eq!(config.session.remote_attempts, 2);
        assert_eq!(config.receipt.wrap_width, 32);
    }

    #[test]
    fn bad_toml_reports_path() {
        let err = parse_toml("[gpio\nbase = ", Path::new("broken.toml")).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, PathBuf::from("broken.toml")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_led_pattern_is_a_parse_error() {
        let result = parse_toml("[session]\nbusy_led = \"disco\"", Path::new("x.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overlay_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[generation]\nbase_url = \"https://file.example\"\napi_key = \"from-file\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("REPLICATE_API_TOKEN", "r8-env"),
        ]
        .into_iter()
        .collect();

        let (config, sources) =
            Config::load_with(Some(path.clone()), |name| env.get(name).map(|v| v.to_string()))
                .unwrap();

        assert_eq!(config.generation.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.captioning.api_token.as_deref(), Some("r8-env"));
        assert_eq!(config.generation.base_url, "https://file.example");
        assert_eq!(sources.file, Some(path));
        assert_eq!(
            sources.env_overrides,
            vec!["REPLICATE_API_TOKEN".to_string(), "OPENAI_API_KEY".to_string()]
        );
    }

    #[test]
    fn no_file_means_defaults() {
        let (config, sources) = Config::load_with(None, no_env).unwrap();
        assert_eq!(config, Config::default());
        assert!(sources.file.is_none());
        assert!(sources.env_overrides.is_empty());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let file = discover_config_file(Some(PathBuf::from("/nonexistent/poetry.toml")));
        let result = Config::load_with(file, no_env);
        assert!(matches!(result, Err(ConfigError::FileRead { .. })));
    }

    #[test]
    fn invalid_values_fail_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[receipt]\nwrap_width = 2\n").unwrap();

        let result = Config::load_with(Some(path), no_env);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
