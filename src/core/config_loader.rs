//! Configuration file loader for generic-publisher
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use crate::security::SecureTokenManager;
use lazy_static::lazy_static;
use regex::Regex;
use secrecy::ExposeSecret;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".generic-publisher.yaml";

/// Environment variable holding the base url
pub const BASE_URL_ENV_VAR: &str = "GENERIC_PUBLISHER_BASE_URL";

lazy_static! {
    /// Environment variable pattern (${VAR_NAME})
    static ref ENV_VAR_REGEX: Regex =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env var pattern");
}

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Home directory holding the global config (skipped when `None`)
    pub home_dir: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublishConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    /// Is configuration valid?
    pub valid: bool,

    /// Validation errors
    pub errors: Vec<ConfigValidationError>,

    /// Validation warnings
    pub warnings: Vec<ConfigValidationWarning>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field name (e.g., "baseUrl")
    pub field: String,

    /// Error message
    pub message: String,
}

/// Configuration validation warning
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationWarning {
    /// Field name
    pub field: String,

    /// Warning message
    pub message: String,

    /// Suggestion
    pub suggestion: Option<String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.generic-publisher.yaml)
    /// 4. Global config (~/.generic-publisher.yaml)
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let mut configs: Vec<PublishConfig> = Vec::new();

        // 4. Global config
        if let Some(home_dir) = &options.home_dir {
            let global_path = home_dir.join(CONFIG_FILENAME);
            if let Some(global_config) = Self::load_config_file(&global_path, HashSet::new()).await?
            {
                configs.push(global_config);
            }
        } else {
            tracing::debug!("no home directory, skipping global config");
        }

        // 3. Project config
        if let Some(project_config) =
            Self::load_config_file(&options.project_path.join(CONFIG_FILENAME), HashSet::new())
                .await?
        {
            configs.push(project_config);
        }

        // 2. Environment variables
        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        // 1. CLI arguments (highest priority)
        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged_config = Self::merge_configs(configs);

        Ok(Self::expand_env_vars(merged_config, &options.env))
    }

    /// Load, validate and resolve configuration into a `PublisherConfig`
    pub async fn load_resolved(
        options: ConfigLoadOptions,
    ) -> Result<PublisherConfig, PublishError> {
        let config = Self::load(options).await?;
        Self::resolve(config)
    }

    /// Load configuration from YAML file
    ///
    /// `visited` holds the canonical paths already on the `extends` chain.
    fn load_config_file(
        file_path: &Path,
        mut visited: HashSet<PathBuf>,
    ) -> std::pin::Pin<
        Box<
            dyn std::future::Future<Output = Result<Option<PublishConfig>, PublishError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            if !file_path.exists() {
                return Ok(None);
            }

            let canonical = fs::canonicalize(file_path)
                .await
                .unwrap_or_else(|_| file_path.to_path_buf());
            if !visited.insert(canonical) {
                return Err(PublishError::Config(format!(
                    "extends cycle detected at {}",
                    file_path.display()
                )));
            }

            tracing::debug!(path = %file_path.display(), "loading config file");

            let content = fs::read_to_string(file_path).await.map_err(|e| {
                PublishError::Config(format!(
                    "Failed to read config file {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::Config(format!(
                    "Failed to parse YAML config {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            // Handle extends if present
            if let Some(extends_path) = &config.extends {
                let base_path = file_path
                    .parent()
                    .ok_or_else(|| PublishError::Config("Invalid config file path".to_string()))?
                    .join(extends_path);

                if let Some(base_config) = Self::load_config_file(&base_path, visited).await? {
                    return Ok(Some(Self::merge_configs(vec![base_config, config])));
                }
            }

            Ok(Some(config))
        })
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublishConfig> {
        let base_url = env.get(BASE_URL_ENV_VAR).cloned();
        let token = SecureTokenManager::new()
            .get_token(env)
            .map(|token| token.expose_secret().to_string());

        if base_url.is_none() && token.is_none() {
            return None;
        }

        Some(PublishConfig {
            extends: None,
            base_url,
            token,
        })
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        if source.extends.is_some() {
            target.extends = source.extends;
        }
        if source.base_url.is_some() {
            target.base_url = source.base_url;
        }
        if source.token.is_some() {
            target.token = source.token;
        }
    }

    /// Expand `${VAR}` placeholders in configuration values
    fn expand_env_vars(mut config: PublishConfig, env: &HashMap<String, String>) -> PublishConfig {
        config.base_url = config.base_url.map(|v| Self::expand_string(&v, env));
        config.token = config.token.map(|v| Self::expand_string(&v, env));
        config
    }

    /// Expand environment variables in a single string
    ///
    /// Unknown variables are left untouched.
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        ENV_VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| match env.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(
                        variable = &caps[1],
                        "environment variable not set, leaving placeholder"
                    );
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match config.base_url.as_deref().map(str::trim) {
            None | Some("") => errors.push(ConfigValidationError {
                field: "baseUrl".to_string(),
                message: "baseUrl is required".to_string(),
            }),
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    errors.push(ConfigValidationError {
                        field: "baseUrl".to_string(),
                        message: format!("baseUrl must start with http:// or https://: {}", url),
                    });
                }
                if url.ends_with('/') {
                    warnings.push(ConfigValidationWarning {
                        field: "baseUrl".to_string(),
                        message: "baseUrl has a trailing slash".to_string(),
                        suggestion: Some(format!("Use {}", url.trim_end_matches('/'))),
                    });
                }
            }
        }

        if config.token.as_deref().is_none_or(str::is_empty) {
            errors.push(ConfigValidationError {
                field: "token".to_string(),
                message: "token is required".to_string(),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Validate and convert a merged configuration into its resolved form
    pub fn resolve(config: PublishConfig) -> Result<PublisherConfig, PublishError> {
        let result = Self::validate(&config);

        for warning in &result.warnings {
            tracing::warn!(field = %warning.field, "{}", warning.message);
        }

        if let Some(error) = result.errors.iter().find(|e| e.field != "token") {
            return Err(PublishError::Config(format!("[{}] {}", error.field, error.message)));
        }

        let (Some(base_url), Some(token)) = (config.base_url, config.token) else {
            return Err(PublishError::TokenMissing);
        };
        if token.is_empty() {
            return Err(PublishError::TokenMissing);
        }

        Ok(PublisherConfig::new(
            base_url.trim().trim_end_matches('/'),
            token,
        ))
    }

    /// Format validation result for display
    pub fn format_validation_result(result: &ConfigValidationResult) -> String {
        let mut lines = Vec::new();

        if result.valid {
            lines.push("✅ Configuration is valid".to_string());
        } else {
            lines.push("❌ Configuration has errors".to_string());
        }

        if !result.errors.is_empty() {
            lines.push("\n🔴 Errors:".to_string());
            for error in &result.errors {
                lines.push(format!("  - [{}] {}", error.field, error.message));
            }
        }

        if !result.warnings.is_empty() {
            lines.push("\n🟡 Warnings:".to_string());
            for warning in &result.warnings {
                lines.push(format!("  - [{}] {}", warning.field, warning.message));
                if let Some(suggestion) = &warning.suggestion {
                    lines.push(format!("    Suggestion: {}", suggestion));
                }
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::TOKEN_ENV_VAR;
    use tempfile::TempDir;

    fn options_for(dir: &TempDir) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_env_config() {
        let mut env = HashMap::new();
        env.insert(BASE_URL_ENV_VAR.to_string(), "https://env.example.com".to_string());
        env.insert(TOKEN_ENV_VAR.to_string(), "env-token".to_string());

        let config = ConfigLoader::load_env_config(&env).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.token.as_deref(), Some("env-token"));
    }

    #[test]
    fn test_load_env_config_empty() {
        assert!(ConfigLoader::load_env_config(&HashMap::new()).is_none());
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("UPDATE_TOKEN".to_string(), "secret123".to_string());

        let result = ConfigLoader::expand_string("Bearer ${UPDATE_TOKEN}", &env);
        assert_eq!(result, "Bearer secret123");
    }

    #[test]
    fn test_expand_string_leaves_unknown_placeholders() {
        let result = ConfigLoader::expand_string("${MISSING}-x", &HashMap::new());
        assert_eq!(result, "${MISSING}-x");
    }

    #[test]
    fn test_merge_configs() {
        let file = PublishConfig {
            base_url: Some("https://file.example.com".to_string()),
            token: Some("file-token".to_string()),
            ..Default::default()
        };
        let cli = PublishConfig {
            token: Some("cli-token".to_string()),
            ..Default::default()
        };

        let merged = ConfigLoader::merge_configs(vec![file, cli]);

        assert_eq!(merged.base_url.as_deref(), Some("https://file.example.com"));
        assert_eq!(merged.token.as_deref(), Some("cli-token"));
    }

    #[test]
    fn test_validate_missing_fields() {
        let result = ConfigLoader::validate(&PublishConfig::default());

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].field, "baseUrl");
        assert_eq!(result.errors[1].field, "token");
    }

    #[test]
    fn test_validate_scheme_and_trailing_slash() {
        let config = PublishConfig {
            base_url: Some("updates.example.com/".to_string()),
            token: Some("t".to_string()),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].field, "baseUrl");
    }

    #[test]
    fn test_resolve_trims_trailing_slash() {
        let config = PublishConfig {
            base_url: Some("https://updates.example.com/".to_string()),
            token: Some("Bearer t".to_string()),
            ..Default::default()
        };

        let resolved = ConfigLoader::resolve(config).unwrap();

        assert_eq!(resolved.base_url, "https://updates.example.com");
        assert_eq!(resolved.token(), "Bearer t");
    }

    #[test]
    fn test_resolve_missing_token() {
        let config = PublishConfig {
            base_url: Some("https://updates.example.com".to_string()),
            ..Default::default()
        };

        let err = ConfigLoader::resolve(config).unwrap_err();
        assert!(matches!(err, PublishError::TokenMissing));
    }

    #[test]
    fn test_resolve_invalid_base_url() {
        let config = PublishConfig {
            base_url: Some("ftp://updates.example.com".to_string()),
            token: Some("t".to_string()),
            ..Default::default()
        };

        let err = ConfigLoader::resolve(config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[tokio::test]
    async fn test_load_project_config_with_env_override() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "baseUrl: https://file.example.com\ntoken: ${DEPLOY_TOKEN}\n",
        )
        .unwrap();

        let mut options = options_for(&dir);
        options.env.insert("DEPLOY_TOKEN".to_string(), "expanded".to_string());
        options.env.insert(BASE_URL_ENV_VAR.to_string(), "https://env.example.com".to_string());

        let config = ConfigLoader::load(options).await.unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.token.as_deref(), Some("expanded"));
    }

    #[tokio::test]
    async fn test_load_global_then_project() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(
            home.path().join(CONFIG_FILENAME),
            "baseUrl: https://global.example.com\ntoken: global\n",
        )
        .unwrap();
        std::fs::write(project.path().join(CONFIG_FILENAME), "token: project\n").unwrap();

        let mut options = options_for(&project);
        options.home_dir = Some(home.path().to_path_buf());

        let config = ConfigLoader::load(options).await.unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://global.example.com"));
        assert_eq!(config.token.as_deref(), Some("project"));
    }

    #[tokio::test]
    async fn test_load_extends() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("base.yaml"),
            "baseUrl: https://base.example.com\ntoken: base\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "extends: base.yaml\ntoken: child\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options_for(&dir)).await.unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://base.example.com"));
        assert_eq!(config.token.as_deref(), Some("child"));
    }

    #[tokio::test]
    async fn test_load_extends_cycle() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "extends: other.yaml\ntoken: child\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("other.yaml"),
            format!("extends: {}\nbaseUrl: https://base.example.com\n", CONFIG_FILENAME),
        )
        .unwrap();

        let err = ConfigLoader::load(options_for(&dir)).await.unwrap_err();

        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("extends cycle"));
    }

    #[tokio::test]
    async fn test_load_extends_self() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            format!("extends: ./{}\ntoken: t\n", CONFIG_FILENAME),
        )
        .unwrap();

        let err = ConfigLoader::load(options_for(&dir)).await.unwrap_err();
        assert!(err.to_string().contains("extends cycle"));
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "baseUrl: [unclosed\n").unwrap();

        let err = ConfigLoader::load(options_for(&dir)).await.unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_format_validation_result() {
        let result = ConfigValidationResult {
            valid: false,
            errors: vec![ConfigValidationError {
                field: "token".to_string(),
                message: "token is required".to_string(),
            }],
            warnings: vec![ConfigValidationWarning {
                field: "baseUrl".to_string(),
                message: "baseUrl has a trailing slash".to_string(),
                suggestion: Some("Use https://u.example.com".to_string()),
            }],
        };

        let formatted = ConfigLoader::format_validation_result(&result);

        assert!(formatted.contains("❌ Configuration has errors"));
        assert!(formatted.contains("[token]"));
        assert!(formatted.contains("🟡 Warnings:"));
        assert!(formatted.contains("Suggestion: Use https://u.example.com"));
    }
}
