//! Handle returned to callers after a successful fetch

use std::fmt;
use std::sync::Arc;

use super::{PromptTemplate, TemplateError, TemplateVariables};
use crate::domain::{PromptError, ProviderKind};

/// Backend-native prompt object wrapped by a [`PromptHandle`]
pub trait NativePrompt: Send + Sync + fmt::Debug {
    /// Type name shown in diagnostics
    fn type_name(&self) -> &'static str;

    /// Stored template, as returned by the backend
    fn template(&self) -> &PromptTemplate;

    /// Backend's own compile routine. Defaults to plain template substitution.
    fn compile(&self, variables: &TemplateVariables) -> Result<PromptTemplate, TemplateError> {
        self.template().compile(variables)
    }
}

/// A fetched prompt bound to exactly one backend object
#[derive(Debug, Clone)]
pub struct PromptHandle {
    provider: ProviderKind,
    name: String,
    version: Option<u32>,
    label: Option<String>,
    underlying: Arc<dyn NativePrompt>,
}

impl PromptHandle {
    pub fn new(
        provider: ProviderKind,
        name: impl Into<String>,
        version: Option<u32>,
        underlying: Arc<dyn NativePrompt>,
    ) -> Self {
        Self {
            provider,
            name: name.into(),
            version,
            label: None,
            underlying,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn template(&self) -> &PromptTemplate {
        self.underlying.template()
    }

    pub fn underlying(&self) -> &dyn NativePrompt {
        self.underlying.as_ref()
    }

    /// Compile the prompt, returning a template of the stored kind
    pub fn compile(&self, variables: &TemplateVariables) -> Result<PromptTemplate, PromptError> {
        self.underlying.compile(variables).map_err(|e| {
            PromptError::compilation(
                self.provider.as_str(),
                format!("Failed to compile prompt '{}': {}", self.describe_target(), e),
            )
            .with_source(e)
        })
    }

    fn describe_target(&self) -> String {
        match (&self.version, &self.label) {
            (Some(version), _) => format!("{} v{}", self.name, version),
            (None, Some(label)) => format!("{}@{}", self.name, label),
            (None, None) => self.name.clone(),
        }
    }
}

impl fmt::Display for PromptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PromptHandle(provider='{}', name='{}'", self.provider, self.name)?;
        if let Some(version) = self.version {
            write!(f, ", version={}", version)?;
        }
        if let Some(ref label) = self.label {
            write!(f, ", label='{}'", label)?;
        }
        write!(f, ", underlying={})", self.underlying.type_name())
    }
}
