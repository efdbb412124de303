//! Configuration loading from the environment and YAML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::env::{apply_env, ROOT_FIELDS, ROUTE_FIELDS};
use crate::config::schema::{Configuration, RouteSettings};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {yaml_key} ({env}): {reason}")]
    InvalidEnv {
        env: &'static str,
        yaml_key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// YAML document shape. Keys that are present override the environment.
#[derive(Debug, Default, Deserialize)]
struct ConfigurationFile {
    settings: Option<Vec<RouteSettings>>,
    debug: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
    request_timeout_secs: Option<u64>,
    max_body_bytes: Option<usize>,
    metrics_enabled: Option<bool>,
    metrics_address: Option<String>,
}

impl ConfigurationFile {
    fn merge_into(self, config: &mut Configuration) {
        if let Some(settings) = self.settings {
            config.settings = settings;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(bytes) = self.max_body_bytes {
            config.max_body_bytes = bytes;
        }
        if let Some(enabled) = self.metrics_enabled {
            config.metrics_enabled = enabled;
        }
        if let Some(address) = self.metrics_address {
            config.metrics_address = address;
        }
    }
}

/// Load and validate configuration from the process environment and an optional YAML file.
pub fn load_config(path: Option<&Path>, debug: bool) -> Result<Configuration, ConfigError> {
    let yaml = match path {
        Some(path) => Some(fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?),
        None => None,
    };

    build_config(|key| std::env::var(key).ok(), debug, yaml.as_deref())
}

/// Build configuration in layers: environment, then YAML, then the debug flag.
///
/// When no routes are defined after the YAML layer a single route is read from
/// the environment.
pub fn build_config<F>(lookup: F, debug: bool, yaml: Option<&str>) -> Result<Configuration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Configuration::default();
    apply_env(&mut config, ROOT_FIELDS, &lookup)?;

    if let Some(yaml) = yaml.filter(|y| !y.trim().is_empty()) {
        let file: Option<ConfigurationFile> = serde_yaml::from_str(yaml)?;
        file.unwrap_or_default().merge_into(&mut config);
    }

    // The command line flag can only turn debug on.
    config.debug |= debug;

    if config.settings.is_empty() {
        if config.debug {
            tracing::debug!("Configuration contains no routes, using environment to configure one");
        }
        let mut route = RouteSettings::default();
        apply_env(&mut route, ROUTE_FIELDS, &lookup)?;
        config.settings.push(route);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FailurePolicy;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_debug_flag() {
        let config = build_config(no_env, true, None).unwrap();
        assert!(config.debug);
        assert_eq!(config.settings.len(), 1);
        assert_eq!(config.settings[0].uri, "save");
    }

    #[test]
    fn test_debug_flag_wins_over_yaml() {
        let config = build_config(no_env, true, Some("debug: false\n")).unwrap();
        assert!(config.debug);

        let config = build_config(no_env, false, Some("debug: false\n")).unwrap();
        assert!(!config.debug);
    }

    #[test]
    fn test_yaml_routes() {
        let yaml = r#"
settings:
  - name: test glutton
    redirect: /url
    parser: test
"#;
        let config = build_config(no_env, true, Some(yaml)).unwrap();
        assert_eq!(config.settings.len(), 1);
        let route = &config.settings[0];
        assert_eq!(route.name, "test glutton");
        assert_eq!(route.redirect.as_deref(), Some("/url"));
        assert_eq!(route.parser, "test");
        // Keys absent from YAML keep their defaults.
        assert_eq!(route.saver, "SimpleFileSystemSaver");
        assert_eq!(route.on_stage_error, FailurePolicy::Continue);
    }

    #[test]
    fn test_yaml_overrides_env() {
        let lookup = |key: &str| match key {
            "PORT" => Some("9000".to_string()),
            "HOST" => Some("127.0.0.1".to_string()),
            _ => None,
        };
        let config = build_config(lookup, false, Some("port: 9100\n")).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.bind_address(), "127.0.0.1:9100");
    }

    #[test]
    fn test_yaml_without_routes_falls_back_to_env_route() {
        let lookup = |key: &str| match key {
            "URI" => Some("hooks".to_string()),
            "USE_TOKEN" => Some("true".to_string()),
            _ => None,
        };
        let config = build_config(lookup, false, Some("debug: false\n")).unwrap();
        assert_eq!(config.settings.len(), 1);
        assert_eq!(config.settings[0].uri, "hooks");
        assert!(config.settings[0].use_token);
    }

    #[test]
    fn test_multiple_routes_and_policy() {
        let yaml = r#"
settings:
  - uri: a
    on_stage_error: abort
  - uri: c
    on_stage_error: Abort
  - uri: b
    use_token: true
    token_key: 0123456789abcdef
"#;
        let config = build_config(no_env, false, Some(yaml)).unwrap();
        assert_eq!(config.settings[0].on_stage_error, FailurePolicy::Abort);
        assert_eq!(config.settings[1].on_stage_error, FailurePolicy::Abort);
        assert!(config.settings[2].use_token);
    }

    #[test]
    fn test_malformed_yaml() {
        let err = build_config(no_env, false, Some("settings: [uri: ")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let yaml = r#"
settings:
  - uri: same
  - uri: same
"#;
        let err = build_config(no_env, false, Some(yaml)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("same"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/glutton.yaml")), false).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
