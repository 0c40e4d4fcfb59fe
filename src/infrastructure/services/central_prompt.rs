//! Central prompt service - one entry point over every supported prompt registry

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::config::PromptSettings;
use crate::domain::{
    CreatePromptOptions, PromptCreated, PromptError, PromptHandle, PromptProvider, PromptQuery,
    PromptTemplate, ProviderKind,
};
use crate::infrastructure::factory::PromptProviderFactory;
use crate::infrastructure::registry::RegistryOperation;

/// Provider-agnostic prompt registry client.
///
/// The backend is chosen once at construction and fixed for the lifetime of the value.
/// Argument validation happens here before any request reaches the backend.
pub struct CentralPrompt {
    provider: ProviderKind,
    experiment: Option<String>,
    adapter: Arc<dyn PromptProvider>,
}

impl CentralPrompt {
    /// Create a client for `provider`, reading backend settings from the environment.
    ///
    /// With `load_env`, a `.env` file is loaded into the environment first.
    pub fn new(provider: &str, experiment: Option<&str>, load_env: bool) -> Result<Self, PromptError> {
        let kind: ProviderKind = provider.parse()?;

        let settings = PromptSettings::load(load_env).map_err(|e| {
            PromptError::invalid_request(
                kind.as_str(),
                "load_settings",
                format!("failed to load prompt registry settings: {}", e),
            )
        })?;

        Ok(Self::for_kind(kind, experiment, &settings))
    }

    /// Create a client for `provider` from explicit settings
    pub fn with_settings(
        provider: &str,
        experiment: Option<&str>,
        settings: &PromptSettings,
    ) -> Result<Self, PromptError> {
        let kind: ProviderKind = provider.parse()?;
        Ok(Self::for_kind(kind, experiment, settings))
    }

    /// Create a client over an already constructed adapter
    pub fn with_provider(adapter: Arc<dyn PromptProvider>, experiment: Option<&str>) -> Self {
        Self {
            provider: adapter.kind(),
            experiment: experiment
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string),
            adapter,
        }
    }

    fn for_kind(kind: ProviderKind, experiment: Option<&str>, settings: &PromptSettings) -> Self {
        debug!(provider = %kind, experiment = ?experiment, "Creating prompt registry adapter");
        let adapter = PromptProviderFactory::create(kind, settings, experiment);
        Self::with_provider(adapter, experiment)
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn experiment(&self) -> Option<&str> {
        self.experiment.as_deref()
    }

    /// Register a new prompt version with the backend
    #[instrument(skip(self, template, options), fields(provider = %self.provider))]
    pub async fn set_prompt(
        &self,
        name: &str,
        template: impl Into<PromptTemplate>,
        options: CreatePromptOptions,
    ) -> Result<PromptCreated, PromptError> {
        let template = template.into();
        validate_create(self.provider, name, &template, &options)?;

        let created = self.adapter.create(name, &template, &options).await?;
        info!(prompt = %created.name, version = ?created.version, "Prompt registered");

        Ok(created)
    }

    /// Fetch one prompt version and bind a handle to it
    #[instrument(skip(self), fields(provider = %self.provider))]
    pub async fn get_prompt(&self, query: PromptQuery) -> Result<PromptHandle, PromptError> {
        validate_query(self.provider, &query)?;

        let handle = self.adapter.fetch(&query).await?;
        debug!(%handle, "Prompt fetched");

        Ok(handle)
    }
}

impl fmt::Debug for CentralPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CentralPrompt")
            .field("provider", &self.provider)
            .field("experiment", &self.experiment)
            .finish_non_exhaustive()
    }
}

fn validate_create(
    provider: ProviderKind,
    name: &str,
    template: &PromptTemplate,
    options: &CreatePromptOptions,
) -> Result<(), PromptError> {
    let invalid = |message: String| RegistryOperation::Create.invalid(provider, message);

    if name.trim().is_empty() {
        return Err(invalid("'name' must be a non-empty string".into()));
    }

    match template {
        PromptTemplate::Text(text) if text.trim().is_empty() => {
            return Err(invalid("'template' must be a non-empty string".into()));
        }
        PromptTemplate::Chat(messages) if messages.is_empty() => {
            return Err(invalid(
                "'template' must contain at least one chat message".into(),
            ));
        }
        PromptTemplate::Chat(messages) => {
            if let Some(index) = messages.iter().position(|m| m.role.trim().is_empty()) {
                return Err(invalid(format!("chat message {} has an empty role", index)));
            }
        }
        PromptTemplate::Text(_) => {}
    }

    if let Some(ref labels) = options.labels {
        if labels.iter().any(|label| label.trim().is_empty()) {
            return Err(invalid("labels must be non-empty strings".into()));
        }
    }

    if let Some(ref tags) = options.tags {
        if tags.keys().any(|key| key.trim().is_empty()) {
            return Err(invalid("tag keys must be non-empty strings".into()));
        }
    }

    Ok(())
}

fn validate_query(provider: ProviderKind, query: &PromptQuery) -> Result<(), PromptError> {
    let invalid = |message: &str| RegistryOperation::Fetch.invalid(provider, message);

    if let Some(ref name) = query.name {
        if name.trim().is_empty() {
            return Err(invalid("'name' must be a non-empty string"));
        }
    }

    if query.version.is_some() && query.label.is_some() {
        return Err(invalid("provide either 'version' or 'label', not both"));
    }

    Ok(())
}
