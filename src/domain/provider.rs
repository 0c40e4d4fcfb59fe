use std::fmt::{self, Debug};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use mockall::automock;

use super::prompt::{CreatePromptOptions, PromptCreated, PromptHandle, PromptQuery, PromptTemplate};
use super::PromptError;

/// Supported prompt registries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mlflow,
    Langfuse,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mlflow => "mlflow",
            Self::Langfuse => "langfuse",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = PromptError;

    /// Case-insensitive; surrounding whitespace and the hyphenated spellings are accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mlflow" | "ml-flow" => Ok(Self::Mlflow),
            "langfuse" | "lang-fuse" => Ok(Self::Langfuse),
            other => Err(PromptError::provider(format!(
                "Unsupported provider '{}'; use 'mlflow' or 'langfuse'",
                other
            ))),
        }
    }
}

/// Trait implemented by each prompt registry adapter (MLflow, Langfuse)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PromptProvider: Send + Sync + Debug {
    /// Register a new version of a prompt
    async fn create(
        &self,
        name: &str,
        template: &PromptTemplate,
        options: &CreatePromptOptions,
    ) -> Result<PromptCreated, PromptError>;

    /// Fetch one prompt version and bind it to a handle
    async fn fetch(&self, query: &PromptQuery) -> Result<PromptHandle, PromptError>;

    /// Registry this adapter talks to
    fn kind(&self) -> ProviderKind;
}
