use std::error::Error as StdError;

use thiserror::Error;

/// Boxed error kept as the cause of a [`PromptError`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Category of a [`PromptError`], for callers that only branch on the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptErrorKind {
    Provider,
    Creation,
    Fetch,
    Compilation,
}

/// Errors raised by the prompt facade, its adapters and prompt handles
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Provider error: {message}")]
    Provider {
        provider: Option<String>,
        message: String,
    },

    #[error("Prompt creation failed ({provider}): {message}")]
    Creation {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Prompt fetch failed ({provider}): {message}")]
    Fetch {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Prompt compilation failed ({provider}): {message}")]
    Compilation {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl PromptError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            provider: None,
            message: message.into(),
        }
    }

    /// Invalid arguments for `operation` on an already selected backend.
    ///
    /// The message is prefixed with the backend and operation, e.g.
    /// `langfuse get_prompt: provide either 'version' or 'label', not both`.
    pub fn invalid_request(
        provider: impl Into<String>,
        operation: &str,
        message: impl Into<String>,
    ) -> Self {
        let provider = provider.into();
        Self::Provider {
            message: format!("{} {}: {}", provider, operation, message.into()),
            provider: Some(provider),
        }
    }

    pub fn creation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Creation {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn fetch(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn compilation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compilation {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the originating error. Provider errors carry no cause and are returned unchanged.
    pub fn with_source(mut self, error: impl Into<BoxError>) -> Self {
        match &mut self {
            Self::Provider { .. } => {}
            Self::Creation { source, .. }
            | Self::Fetch { source, .. }
            | Self::Compilation { source, .. } => *source = Some(error.into()),
        }
        self
    }

    pub fn kind(&self) -> PromptErrorKind {
        match self {
            Self::Provider { .. } => PromptErrorKind::Provider,
            Self::Creation { .. } => PromptErrorKind::Creation,
            Self::Fetch { .. } => PromptErrorKind::Fetch,
            Self::Compilation { .. } => PromptErrorKind::Compilation,
        }
    }

    /// Name of the backend involved, when the failure happened past provider selection
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::Provider { provider, .. } => provider.as_deref(),
            Self::Creation { provider, .. }
            | Self::Fetch { provider, .. }
            | Self::Compilation { provider, .. } => Some(provider),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Provider { message, .. }
            | Self::Creation { message, .. }
            | Self::Fetch { message, .. }
            | Self::Compilation { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error() {
        let error = PromptError::provider("Unsupported provider 'openai'");
        assert_eq!(error.to_string(), "Provider error: Unsupported provider 'openai'");
        assert_eq!(error.kind(), PromptErrorKind::Provider);
        assert!(error.provider_name().is_none());
    }

    #[test]
    fn test_invalid_request_names_provider_and_operation() {
        let error = PromptError::invalid_request(
            "langfuse",
            "get_prompt",
            "provide either 'version' or 'label', not both",
        );
        assert_eq!(
            error.to_string(),
            "Provider error: langfuse get_prompt: provide either 'version' or 'label', not both"
        );
        assert_eq!(error.kind(), PromptErrorKind::Provider);
        assert_eq!(error.provider_name(), Some("langfuse"));
    }

    #[test]
    fn test_fetch_error_message() {
        let error = PromptError::fetch("langfuse", "Prompt 'greet' not found");
        assert_eq!(
            error.to_string(),
            "Prompt fetch failed (langfuse): Prompt 'greet' not found"
        );
        assert_eq!(error.provider_name(), Some("langfuse"));
    }

    #[test]
    fn test_source_is_preserved() {
        let cause = std::io::Error::other("connection reset");
        let error = PromptError::creation("mlflow", "register_prompt failed").with_source(cause);

        let source = error.source().expect("source should be set");
        assert_eq!(source.to_string(), "connection reset");
        assert_eq!(error.kind(), PromptErrorKind::Creation);
    }

    #[test]
    fn test_provider_error_ignores_source() {
        let error = PromptError::provider("bad arguments")
            .with_source(std::io::Error::other("ignored"));
        assert!(error.source().is_none());
        assert_eq!(error.message(), "bad arguments");
    }
}
