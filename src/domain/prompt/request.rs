//! Request and result types shared by every prompt provider

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{PromptTemplate, TemplateKind};
use crate::domain::{PromptError, ProviderKind};

/// Optional fields accepted by `set_prompt`. Each backend uses the subset it supports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatePromptOptions {
    /// Explicit template kind; inferred from the template shape when omitted
    pub prompt_type: Option<TemplateKind>,
    /// Labels to attach to the new version (Langfuse)
    pub labels: Option<Vec<String>>,
    /// Metadata tags (MLflow)
    pub tags: Option<HashMap<String, String>>,
    /// Structured-output schema stored with the prompt
    pub response_format: Option<serde_json::Value>,
    /// Description of the change introduced by this version
    pub commit_message: Option<String>,
}

impl CreatePromptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt_type(mut self, prompt_type: TemplateKind) -> Self {
        self.prompt_type = Some(prompt_type);
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.get_or_insert_with(Vec::new).push(label.into());
        self
    }

    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_response_format(mut self, response_format: serde_json::Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = Some(message.into());
        self
    }

    /// Kind to register the template under. An explicit kind must match the template shape.
    pub fn resolve_kind(
        &self,
        provider: ProviderKind,
        template: &PromptTemplate,
    ) -> Result<TemplateKind, PromptError> {
        let inferred = template.kind();
        let mismatch = |message: &str| {
            PromptError::invalid_request(provider.as_str(), "set_prompt", message)
        };

        match self.prompt_type {
            None => Ok(inferred),
            Some(kind) if kind == inferred => Ok(kind),
            Some(TemplateKind::Chat) => Err(mismatch(
                "for prompt_type 'chat', template must be a list of {role, content} messages",
            )),
            Some(TemplateKind::Text) => Err(mismatch(
                "for prompt_type 'text', template must be a string",
            )),
        }
    }
}

/// Selects the prompt version to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptQuery {
    pub name: Option<String>,
    pub version: Option<u32>,
    /// Composite `prompts:/<name>/<version>` path (MLflow)
    pub path: Option<String>,
    /// Label such as `production` (Langfuse)
    pub label: Option<String>,
}

impl PromptQuery {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Summary of a newly registered prompt version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCreated {
    pub provider: ProviderKind,
    pub name: String,
    pub version: Option<u32>,
}

impl PromptCreated {
    pub fn new(provider: ProviderKind, name: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            provider,
            name: name.into(),
            version,
        }
    }
}
