//! Layered configuration.
//!
//! Settings are merged from four layers, later layers winning:
//!
//! 1. built-in defaults;
//! 2. the first configuration file found by [`ConfigDiscovery`]: `--config`
//!    (which must exist), then `MONOCLE_CONFIG_PATH`, the platform
//!    configuration directories, the home directory and finally
//!    `.monocle.toml` in the working directory;
//! 3. `MONOCLE_*` environment variables, for example `MONOCLE_DIRECTION=TB`;
//! 4. command-line flags.
//!
//! ```toml
//! direction = "TB"
//! strict = false
//! fetch_timeout_secs = 30
//! fetch_retries = 1
//! ```

use crate::mermaid_gen::Direction;
use crate::source::FetchSettings;
use crate::tokenizer::TokenizeOptions;
use ortho_config::declarative::LayerComposition;
use ortho_config::figment::{Figment, providers::Env};
use ortho_config::uncased::Uncased;
use ortho_config::{
    ConfigDiscovery, MergeComposer, OrthoConfig, OrthoMergeExt, OrthoResult, sanitize_value,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application name used for configuration discovery.
pub const APP_NAME: &str = "monocle";
/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "MONOCLE_CONFIG_PATH";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MONOCLE_";
/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".monocle.toml";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FETCH_RETRIES: u32 = 1;

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MONOCLE")]
pub struct AppConfig {
    /// Flowchart direction.
    #[ortho_config(default = Direction::LeftRight)]
    pub direction: Direction,
    /// Reject Makefile lines the tokenizer cannot classify.
    #[ortho_config(default = false)]
    pub strict: bool,
    /// Overall timeout for one fetch attempt, in seconds.
    #[ortho_config(default = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,
    /// Extra fetch attempts after a transient failure.
    #[ortho_config(default = DEFAULT_FETCH_RETRIES)]
    pub fetch_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            strict: false,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            fetch_retries: DEFAULT_FETCH_RETRIES,
        }
    }
}

/// Settings given as command-line flags. Unset fields defer to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CliOverrides {
    /// Flowchart direction.
    pub direction: Option<Direction>,
    /// Reject unclassifiable lines.
    pub strict: Option<bool>,
}

impl AppConfig {
    /// Resolve the configuration from file, environment and `overrides`.
    ///
    /// `explicit_file` is searched before every other location and must
    /// exist when given.
    ///
    /// # Errors
    ///
    /// Returns an [`ortho_config::OrthoError`] when a layer cannot be read,
    /// parsed or merged.
    pub fn load(explicit_file: Option<&Path>, overrides: &CliOverrides) -> OrthoResult<Self> {
        Self::load_from(&config_discovery(explicit_file), overrides)
    }

    /// Resolve the configuration using the files found by `discovery`.
    ///
    /// # Errors
    ///
    /// Returns an [`ortho_config::OrthoError`] when a layer cannot be read,
    /// parsed or merged.
    pub fn load_from(discovery: &ConfigDiscovery, overrides: &CliOverrides) -> OrthoResult<Self> {
        let mut errors = Vec::new();
        let mut composer = MergeComposer::with_capacity(4);

        match sanitize_value(&Self::default()) {
            Ok(value) => composer.push_defaults(value),
            Err(err) => errors.push(err),
        }

        let mut file_layers = discovery.compose_layers();
        errors.append(&mut file_layers.required_errors);
        if file_layers.value.is_empty() {
            errors.append(&mut file_layers.optional_errors);
        }
        for layer in file_layers.value {
            debug!(path = ?layer.path(), "loaded config file");
            composer.push_layer(layer);
        }

        let env_provider = Env::prefixed(ENV_PREFIX)
            .map(|key| Uncased::new(key.as_str().to_ascii_uppercase()))
            .split("__");
        match Figment::from(env_provider)
            .extract::<serde_json::Value>()
            .into_ortho_merge()
        {
            Ok(value) => composer.push_environment(value),
            Err(err) => errors.push(err),
        }

        match sanitize_value(overrides) {
            Ok(value) if !is_empty_value(&value) => composer.push_cli(value),
            Ok(_) => {}
            Err(err) => errors.push(err),
        }

        let config = LayerComposition::new(composer.layers(), errors)
            .into_merge_result(Self::merge_from_layers)?;
        debug!(?config, "resolved configuration");
        Ok(config)
    }

    /// Fetch policy derived from these settings.
    #[must_use]
    pub const fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            retries: self.fetch_retries,
        }
    }

    /// Tokenizer options derived from these settings.
    #[must_use]
    pub const fn tokenize_options(&self) -> TokenizeOptions {
        TokenizeOptions {
            strict: self.strict,
        }
    }
}

/// Build configuration discovery, requiring `explicit_file` when given.
#[must_use]
pub fn config_discovery(explicit_file: Option<&Path>) -> ConfigDiscovery {
    let mut builder = ConfigDiscovery::builder(APP_NAME)
        .env_var(CONFIG_ENV_VAR)
        .dotfile_name(DEFAULT_CONFIG_FILE);
    if let Some(path) = explicit_file {
        builder = builder.add_required_path(path);
    }
    builder.build()
}

/// Return `true` when no CLI overrides were supplied.
fn is_empty_value(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::Object(map) if map.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    /// Discovery that only looks at `.monocle.toml` inside `dir`.
    fn discovery_in(dir: &TempDir, explicit: Option<&Path>) -> ConfigDiscovery {
        let mut builder = ConfigDiscovery::builder(APP_NAME)
            .dotfile_name(DEFAULT_CONFIG_FILE)
            .clear_project_roots()
            .add_project_root(dir.path());
        if let Some(path) = explicit {
            builder = builder.add_required_path(path);
        }
        builder.build()
    }

    #[rstest]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.direction, Direction::LeftRight);
        assert!(!config.strict);
        assert_eq!(config.fetch_settings().timeout, Duration::from_secs(30));
        assert_eq!(config.fetch_settings().retries, 1);
    }

    #[rstest]
    fn later_layers_win_field_by_field() {
        let mut composer = MergeComposer::new();
        composer.push_defaults(sanitize_value(&AppConfig::default()).expect("defaults"));
        composer.push_file(json!({"direction": "TB", "fetch_retries": 3}), None);
        composer.push_environment(json!({"fetch_retries": 2, "strict": true}));
        composer.push_cli(json!({"fetch_retries": 0}));
        let config = AppConfig::merge_from_layers(composer.layers()).expect("merge");
        assert_eq!(config.direction, Direction::TopBottom);
        assert!(config.strict);
        assert_eq!(config.fetch_retries, 0);
        assert_eq!(config.fetch_timeout_secs, 30);
    }

    #[rstest]
    #[case("lr", Direction::LeftRight)]
    #[case("tb", Direction::TopBottom)]
    fn direction_accepts_lowercase(#[case] value: &str, #[case] expected: Direction) {
        let mut composer = MergeComposer::new();
        composer.push_defaults(sanitize_value(&AppConfig::default()).expect("defaults"));
        composer.push_file(json!({ "direction": value }), None);
        let config = AppConfig::merge_from_layers(composer.layers()).expect("merge");
        assert_eq!(config.direction, expected);
    }

    #[rstest]
    fn unknown_direction_is_rejected() {
        let mut composer = MergeComposer::new();
        composer.push_defaults(sanitize_value(&AppConfig::default()).expect("defaults"));
        composer.push_file(json!({"direction": "RL"}), None);
        assert!(AppConfig::merge_from_layers(composer.layers()).is_err());
    }

    #[rstest]
    fn working_directory_file_sits_under_cli_overrides() {
        let dir = tempdir().expect("temp dir");
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "direction = \"TB\"\nstrict = true\nfetch_timeout_secs = 5\n",
        )
        .expect("write config");
        let overrides = CliOverrides {
            direction: Some(Direction::LeftRight),
            ..CliOverrides::default()
        };
        let config = AppConfig::load_from(&discovery_in(&dir, None), &overrides).expect("load");
        assert_eq!(config.direction, Direction::LeftRight);
        assert!(config.strict);
        assert_eq!(config.fetch_timeout_secs, 5);
        assert_eq!(config.fetch_retries, 1);
    }

    #[rstest]
    fn explicit_file_precedes_working_directory_file() {
        let dir = tempdir().expect("temp dir");
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "direction = \"TB\"\n")
            .expect("write config");
        let explicit = dir.path().join("ci.toml");
        fs::write(&explicit, "fetch_retries = 4\n").expect("write config");
        let config = AppConfig::load_from(
            &discovery_in(&dir, Some(&explicit)),
            &CliOverrides::default(),
        )
        .expect("load");
        assert_eq!(config.direction, Direction::LeftRight);
        assert_eq!(config.fetch_retries, 4);
    }

    #[rstest]
    fn explicit_file_must_exist() {
        let dir = tempdir().expect("temp dir");
        let missing = dir.path().join("absent.toml");
        let err = AppConfig::load_from(
            &discovery_in(&dir, Some(&missing)),
            &CliOverrides::default(),
        )
        .expect_err("missing explicit file");
        assert!(err.to_string().contains("absent.toml"), "message: {err}");
    }

    #[rstest]
    fn invalid_file_names_its_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("bad.toml");
        fs::write(&path, "fetch_retries = \n").expect("write config");
        let err = AppConfig::load_from(&discovery_in(&dir, Some(&path)), &CliOverrides::default())
            .expect_err("invalid file");
        assert!(err.to_string().contains("bad.toml"), "message: {err}");
    }

    #[rstest]
    fn empty_overrides_add_no_layer() {
        let value = sanitize_value(&CliOverrides::default()).expect("sanitize");
        assert!(is_empty_value(&value));
        let value = sanitize_value(&CliOverrides {
            strict: Some(true),
            ..CliOverrides::default()
        })
        .expect("sanitize");
        assert_eq!(value, json!({"strict": true}));
    }
}
