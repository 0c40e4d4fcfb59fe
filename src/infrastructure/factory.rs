use std::sync::Arc;

use super::http_client::HttpClient;
use super::langfuse::LangfuseProvider;
use super::mlflow::MlflowProvider;
use crate::config::PromptSettings;
use crate::domain::{PromptProvider, ProviderKind};

/// Factory for creating registry adapters
#[derive(Debug)]
pub struct PromptProviderFactory;

impl PromptProviderFactory {
    /// Create the adapter for `kind` from settings.
    ///
    /// `experiment` is only used by MLflow, where it overrides the configured experiment name.
    pub fn create(
        kind: ProviderKind,
        settings: &PromptSettings,
        experiment: Option<&str>,
    ) -> Arc<dyn PromptProvider> {
        let http_client = HttpClient::new();

        match kind {
            ProviderKind::Mlflow => {
                Arc::new(MlflowProvider::new(http_client, &settings.mlflow, experiment))
            }
            ProviderKind::Langfuse => {
                Arc::new(LangfuseProvider::new(http_client, &settings.langfuse))
            }
        }
    }

    /// Create an MLflow adapter for a tracking server
    pub fn create_mlflow(tracking_uri: impl Into<String>) -> Arc<dyn PromptProvider> {
        Arc::new(MlflowProvider::with_tracking_uri(HttpClient::new(), tracking_uri))
    }

    /// Create a Langfuse adapter with explicit credentials
    pub fn create_langfuse(
        host: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Arc<dyn PromptProvider> {
        Arc::new(LangfuseProvider::with_credentials(
            HttpClient::new(),
            host,
            public_key,
            secret_key,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mlflow() {
        let provider = PromptProviderFactory::create(
            ProviderKind::Mlflow,
            &PromptSettings::default(),
            Some("prompts"),
        );
        assert_eq!(provider.kind(), ProviderKind::Mlflow);
    }

    #[test]
    fn test_create_langfuse() {
        let provider =
            PromptProviderFactory::create(ProviderKind::Langfuse, &PromptSettings::default(), None);
        assert_eq!(provider.kind(), ProviderKind::Langfuse);
    }

    #[test]
    fn test_direct_constructors() {
        let mlflow = PromptProviderFactory::create_mlflow("http://localhost:5000");
        assert_eq!(mlflow.kind(), ProviderKind::Mlflow);

        let langfuse =
            PromptProviderFactory::create_langfuse("http://localhost:3000", "pk", "sk");
        assert_eq!(langfuse.kind(), ProviderKind::Langfuse);
    }
}
