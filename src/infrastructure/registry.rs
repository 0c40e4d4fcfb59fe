//! Helpers shared by the registry adapters

use base64::{Engine as _, engine::general_purpose};

use crate::domain::{PromptError, ProviderKind};

/// Registry call being performed, used to classify backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegistryOperation {
    Create,
    Fetch,
}

impl RegistryOperation {
    /// Facade operation name used in error messages
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Create => "set_prompt",
            Self::Fetch => "get_prompt",
        }
    }

    /// Argument error raised before any backend call
    pub(crate) fn invalid(self, provider: ProviderKind, message: impl Into<String>) -> PromptError {
        PromptError::invalid_request(provider.as_str(), self.name(), message)
    }

    pub(crate) fn error(self, provider: ProviderKind, message: impl Into<String>) -> PromptError {
        match self {
            Self::Create => PromptError::creation(provider.as_str(), message),
            Self::Fetch => PromptError::fetch(provider.as_str(), message),
        }
    }
}

/// `Authorization` header value for HTTP basic auth
pub(crate) fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

/// Ensure a required query argument is a non-empty string
pub(crate) fn require_name(
    provider: ProviderKind,
    name: Option<&str>,
    message: &str,
) -> Result<String, PromptError> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(RegistryOperation::Fetch.invalid(provider, message)),
    }
}
