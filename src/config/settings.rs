use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_LANGFUSE_HOST: &str = "https://cloud.langfuse.com";

/// Settings keys and the environment variables that override them
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("mlflow.tracking_uri", "MLFLOW_TRACKING_URI"),
    ("mlflow.experiment_name", "MLFLOW_EXPERIMENT_NAME"),
    ("mlflow.tracking_token", "MLFLOW_TRACKING_TOKEN"),
    ("mlflow.username", "MLFLOW_TRACKING_USERNAME"),
    ("mlflow.password", "MLFLOW_TRACKING_PASSWORD"),
    ("langfuse.host", "LANGFUSE_HOST"),
    ("langfuse.public_key", "LANGFUSE_PUBLIC_KEY"),
    ("langfuse.secret_key", "LANGFUSE_SECRET_KEY"),
    ("logging.level", "CENTRAL_PROMPT_LOG_LEVEL"),
    ("logging.format", "CENTRAL_PROMPT_LOG_FORMAT"),
];

/// Settings for both prompt registries and logging
#[derive(Debug, Clone, Deserialize)]
pub struct PromptSettings {
    #[serde(default)]
    pub mlflow: MlflowSettings,
    #[serde(default)]
    pub langfuse: LangfuseSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MLflow tracking server connection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MlflowSettings {
    pub tracking_uri: Option<String>,
    pub experiment_name: Option<String>,
    pub tracking_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Langfuse project connection
#[derive(Debug, Clone, Deserialize)]
pub struct LangfuseSettings {
    #[serde(default = "default_langfuse_host")]
    pub host: String,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_langfuse_host() -> String {
    DEFAULT_LANGFUSE_HOST.to_string()
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            mlflow: MlflowSettings::default(),
            langfuse: LangfuseSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LangfuseSettings {
    fn default() -> Self {
        Self {
            host: default_langfuse_host(),
            public_key: None,
            secret_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl PromptSettings {
    /// Load settings from `config/central_prompt.*` and the process environment.
    ///
    /// With `load_env`, a `.env` file in the working directory (or a parent) is
    /// read into the environment first. A missing `.env` is not an error.
    pub fn load(load_env: bool) -> Result<Self, config::ConfigError> {
        if load_env {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
                Err(e) => debug!("No .env file loaded: {}", e),
            }
        }

        Self::load_with(|var| std::env::var(var).ok())
    }

    /// Load settings, resolving environment variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .set_default("langfuse.host", DEFAULT_LANGFUSE_HOST)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(config::File::with_name("config/central_prompt").required(false));

        for (key, var) in ENV_OVERRIDES {
            let value = lookup(var).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn with_mlflow(mut self, mlflow: MlflowSettings) -> Self {
        self.mlflow = mlflow;
        self
    }

    pub fn with_langfuse(mut self, langfuse: LangfuseSettings) -> Self {
        self.langfuse = langfuse;
        self
    }
}

impl MlflowSettings {
    pub fn new(tracking_uri: impl Into<String>) -> Self {
        Self {
            tracking_uri: Some(tracking_uri.into()),
            ..Default::default()
        }
    }

    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = Some(name.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tracking_token = Some(token.into());
        self
    }
}

impl LangfuseSettings {
    pub fn new(
        host: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            public_key: Some(public_key.into()),
            secret_key: Some(secret_key.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let settings = PromptSettings::load_with(lookup(&[])).unwrap();

        assert!(settings.mlflow.tracking_uri.is_none());
        assert_eq!(settings.langfuse.host, DEFAULT_LANGFUSE_HOST);
        assert!(settings.langfuse.public_key.is_none());
        assert_eq!(settings.logging.level, "info");
        assert!(matches!(settings.logging.format, LogFormat::Pretty));
    }

    #[test]
    fn test_environment_overrides() {
        let settings = PromptSettings::load_with(lookup(&[
            ("MLFLOW_TRACKING_URI", "http://localhost:5000"),
            ("MLFLOW_EXPERIMENT_NAME", "prompts"),
            ("LANGFUSE_PUBLIC_KEY", "pk-lf-123"),
            ("LANGFUSE_SECRET_KEY", "sk-lf-456"),
            ("LANGFUSE_HOST", "http://localhost:3000"),
            ("CENTRAL_PROMPT_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(
            settings.mlflow.tracking_uri.as_deref(),
            Some("http://localhost:5000")
        );
        assert_eq!(settings.mlflow.experiment_name.as_deref(), Some("prompts"));
        assert_eq!(settings.langfuse.public_key.as_deref(), Some("pk-lf-123"));
        assert_eq!(settings.langfuse.secret_key.as_deref(), Some("sk-lf-456"));
        assert_eq!(settings.langfuse.host, "http://localhost:3000");
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let settings =
            PromptSettings::load_with(lookup(&[("MLFLOW_TRACKING_URI", "  ")])).unwrap();
        assert!(settings.mlflow.tracking_uri.is_none());
    }
}
