//! Langfuse prompt management adapter (public API v2)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::http_client::{HttpClientTrait, HttpError};
use super::registry::{RegistryOperation, basic_auth_header, require_name};
use crate::config::LangfuseSettings;
use crate::domain::{
    CreatePromptOptions, NativePrompt, PromptCreated, PromptError, PromptHandle, PromptProvider,
    PromptQuery, PromptTemplate, ProviderKind, TemplateError, TemplateKind, TemplateVariables,
};

const PROVIDER: ProviderKind = ProviderKind::Langfuse;

/// Label served when a fetch names neither a version nor a label
pub const DEFAULT_LABEL: &str = "production";

const MISSING_CREDENTIALS: &str =
    "Langfuse credentials are not configured; set LANGFUSE_PUBLIC_KEY and LANGFUSE_SECRET_KEY";

/// Langfuse prompt management provider
#[derive(Debug)]
pub struct LangfuseProvider<C: HttpClientTrait> {
    client: C,
    host: String,
    auth_header: Option<String>,
}

impl<C: HttpClientTrait> LangfuseProvider<C> {
    pub fn new(client: C, settings: &LangfuseSettings) -> Self {
        let auth_header = match (&settings.public_key, &settings.secret_key) {
            (Some(public_key), Some(secret_key)) => Some(basic_auth_header(public_key, secret_key)),
            _ => None,
        };

        Self {
            client,
            host: settings.host.clone(),
            auth_header,
        }
    }

    pub fn with_credentials(
        client: C,
        host: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self::new(client, &LangfuseSettings::new(host, public_key, secret_key))
    }

    /// `{host}/api/public/v2/prompts[/{name}]`, with the name percent-encoded as one segment
    fn prompts_url(
        &self,
        op: RegistryOperation,
        name: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let invalid_host =
            || op.error(PROVIDER, format!("Invalid Langfuse host '{}'", self.host));

        let mut url = Url::parse(&self.host).map_err(|e| invalid_host().with_source(e))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid_host())?;
            segments
                .pop_if_empty()
                .extend(["api", "public", "v2", "prompts"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }

    fn headers(&self, op: RegistryOperation) -> Result<Vec<(&str, &str)>, PromptError> {
        let auth = self
            .auth_header
            .as_deref()
            .ok_or_else(|| op.error(PROVIDER, MISSING_CREDENTIALS))?;

        Ok(vec![("Accept", "application/json"), ("Authorization", auth)])
    }

    fn build_create_request(
        name: &str,
        template: &PromptTemplate,
        kind: TemplateKind,
        options: &CreatePromptOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "name": name,
            "type": kind,
            "prompt": template,
        });

        if let Some(ref labels) = options.labels {
            body["labels"] = serde_json::json!(labels);
        }

        if let Some(ref response_format) = options.response_format {
            body["config"] = serde_json::json!({ "response_format": response_format });
        }

        if let Some(ref message) = options.commit_message {
            body["commitMessage"] = serde_json::json!(message);
        }

        body
    }

    /// Validate the query; returns the name and the query parameters to send
    fn resolve_target(query: &PromptQuery) -> Result<(String, Vec<(&'static str, String)>), PromptError> {
        let invalid = |message: &str| RegistryOperation::Fetch.invalid(PROVIDER, message);

        if query.path.is_some() {
            return Err(invalid("prompts are addressed by name; 'path' is not supported"));
        }

        let name = require_name(
            PROVIDER,
            query.name.as_deref(),
            "'name' is required and must be a non-empty string",
        )?;

        let params = match (query.version, query.label.as_deref()) {
            (Some(_), Some(_)) => {
                return Err(invalid("provide either 'version' or 'label', not both"));
            }
            (Some(0), None) => return Err(invalid("version must be a positive integer")),
            (Some(version), None) => vec![("version", version.to_string())],
            (None, Some(label)) if label.trim().is_empty() => {
                return Err(invalid("'label' must be a non-empty string"));
            }
            (None, Some(label)) => vec![("label", label.to_string())],
            (None, None) => vec![("label", DEFAULT_LABEL.to_string())],
        };

        Ok((name, params))
    }
}

#[async_trait]
impl<C: HttpClientTrait> PromptProvider for LangfuseProvider<C> {
    #[instrument(skip(self, template, options), fields(provider = "langfuse"))]
    async fn create(
        &self,
        name: &str,
        template: &PromptTemplate,
        options: &CreatePromptOptions,
    ) -> Result<PromptCreated, PromptError> {
        let op = RegistryOperation::Create;
        let kind = options.resolve_kind(PROVIDER, template)?;

        if let Some(ref tags) = options.tags {
            debug!(count = tags.len(), "Langfuse prompt versions take no key/value tags; ignoring");
        }

        let url = self.prompts_url(op, None, &[])?;
        let headers = self.headers(op)?;
        let body = Self::build_create_request(name, template, kind, options);

        let json = self.client.post_json(&url, headers, &body).await.map_err(|e| {
            warn!(prompt = name, error = %e, "Langfuse prompt creation failed");
            op.error(
                PROVIDER,
                format!(
                    "create_prompt failed for '{}': {}. Ensure LANGFUSE credentials are configured.",
                    name, e
                ),
            )
            .with_source(e)
        })?;

        let response: CreatePromptResponse = serde_json::from_value(json).map_err(|e| {
            op.error(PROVIDER, format!("Unexpected create_prompt response: {}", e))
                .with_source(e)
        })?;

        info!(prompt = %response.name, version = ?response.version, "Created Langfuse prompt version");

        Ok(PromptCreated::new(PROVIDER, response.name, response.version))
    }

    #[instrument(skip(self), fields(provider = "langfuse"))]
    async fn fetch(&self, query: &PromptQuery) -> Result<PromptHandle, PromptError> {
        let op = RegistryOperation::Fetch;
        let (name, params) = Self::resolve_target(query)?;

        let query_params: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let url = self.prompts_url(op, Some(&name), &query_params)?;
        let headers = self.headers(op)?;

        let json = self
            .client
            .get_json(&url, headers)
            .await
            .map_err(|e| fetch_error(&name, e))?;

        if json.is_null() {
            return Err(op.error(PROVIDER, format!("Prompt '{}' not found", name)));
        }

        let prompt: LangfusePrompt = serde_json::from_value(json).map_err(|e| {
            op.error(PROVIDER, format!("Malformed prompt '{}' returned by Langfuse: {}", name, e))
                .with_source(e)
        })?;
        prompt.check_kind()?;

        debug!(prompt = %name, version = prompt.version, kind = %prompt.prompt_type, "Loaded Langfuse prompt");

        let version = prompt.version;
        let handle = PromptHandle::new(PROVIDER, name, Some(version), Arc::new(prompt));

        Ok(match query.label.as_deref() {
            Some(label) => handle.with_label(label),
            None if query.version.is_none() => handle.with_label(DEFAULT_LABEL),
            None => handle,
        })
    }

    fn kind(&self) -> ProviderKind {
        PROVIDER
    }
}

fn fetch_error(name: &str, error: HttpError) -> PromptError {
    let op = RegistryOperation::Fetch;
    if error.is_not_found() {
        op.error(PROVIDER, format!("Prompt '{}' not found", name))
            .with_source(error)
    } else {
        op.error(PROVIDER, format!("get_prompt failed for '{}': {}", name, error))
            .with_source(error)
    }
}

/// A prompt version loaded from Langfuse
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LangfusePrompt {
    name: String,
    version: u32,
    #[serde(rename = "type")]
    prompt_type: TemplateKind,
    prompt: PromptTemplate,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(default)]
    commit_message: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl LangfusePrompt {
    fn check_kind(&self) -> Result<(), PromptError> {
        if self.prompt.kind() != self.prompt_type {
            return Err(RegistryOperation::Fetch.error(
                PROVIDER,
                format!(
                    "Prompt '{}' is declared as {} but its body is a {} template",
                    self.name,
                    self.prompt_type,
                    self.prompt.kind()
                ),
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn prompt_type(&self) -> TemplateKind {
        self.prompt_type
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn config(&self) -> &serde_json::Value {
        &self.config
    }

    pub fn commit_message(&self) -> Option<&str> {
        self.commit_message.as_deref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Fill the prompt's placeholders with `variables`
    pub fn compile(&self, variables: &TemplateVariables) -> Result<PromptTemplate, TemplateError> {
        self.prompt.compile(variables)
    }
}

impl NativePrompt for LangfusePrompt {
    fn type_name(&self) -> &'static str {
        "LangfusePrompt"
    }

    fn template(&self) -> &PromptTemplate {
        &self.prompt
    }

    fn compile(&self, variables: &TemplateVariables) -> Result<PromptTemplate, TemplateError> {
        LangfusePrompt::compile(self, variables)
    }
}

// Langfuse API types

#[derive(Debug, Deserialize)]
struct CreatePromptResponse {
    name: String,
    #[serde(default)]
    version: Option<u32>,
}
