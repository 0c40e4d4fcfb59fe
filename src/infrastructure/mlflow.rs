//! MLflow prompt registry adapter
//!
//! MLflow stores prompts in its model registry: a prompt is a registered model
//! tagged `mlflow.prompt.is_prompt=true` and each prompt version is a model
//! version whose tags carry the template text and type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::http_client::{HttpClientTrait, HttpError};
use super::registry::{RegistryOperation, basic_auth_header, require_name};
use crate::config::MlflowSettings;
use crate::domain::{
    ChatMessage, CreatePromptOptions, NativePrompt, PromptCreated, PromptError, PromptHandle,
    PromptProvider, PromptQuery, PromptTemplate, ProviderKind, TemplateError, TemplateKind,
    TemplateVariables,
};

const PROVIDER: ProviderKind = ProviderKind::Mlflow;

const IS_PROMPT_TAG: &str = "mlflow.prompt.is_prompt";
const PROMPT_TEXT_TAG: &str = "mlflow.prompt.text";
const PROMPT_TYPE_TAG: &str = "_mlflow_prompt_type";
const RESPONSE_FORMAT_TAG: &str = "_mlflow_prompt_response_format";
const EXPERIMENT_IDS_TAG: &str = "_mlflow_experiment_ids";
const PROMPT_SOURCE: &str = "dummy-source";

static PROMPT_URI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^prompts:/([^/]+)/([0-9]+)$").unwrap());

/// Composite `prompts:/<name>/<version>` path for a prompt version
pub fn prompt_uri(name: &str, version: u32) -> String {
    format!("prompts:/{}/{}", name, version)
}

/// Split a `prompts:/<name>/<version>` path into name and version
pub fn parse_prompt_uri(path: &str) -> Result<(String, u32), PromptError> {
    let op = RegistryOperation::Fetch;
    let invalid = || {
        op.invalid(
            PROVIDER,
            format!("path must be of the form 'prompts:/<name>/<version>', got '{}'", path),
        )
    };

    let caps = PROMPT_URI_PATTERN.captures(path).ok_or_else(invalid)?;
    let version: u32 = caps[2].parse().map_err(|_| invalid())?;
    if version == 0 {
        return Err(op.invalid(PROVIDER, "version must be a positive integer"));
    }

    Ok((caps[1].to_string(), version))
}

/// MLflow prompt registry provider
#[derive(Debug)]
pub struct MlflowProvider<C: HttpClientTrait> {
    client: C,
    tracking_uri: Option<String>,
    auth_header: Option<String>,
    experiment_name: Option<String>,
    experiment_id: OnceCell<String>,
}

impl<C: HttpClientTrait> MlflowProvider<C> {
    /// Create a provider from settings. `experiment` takes precedence over
    /// the experiment named in the settings.
    pub fn new(client: C, settings: &MlflowSettings, experiment: Option<&str>) -> Self {
        let auth_header = match (&settings.tracking_token, &settings.username, &settings.password)
        {
            (Some(token), _, _) => Some(format!("Bearer {}", token)),
            (None, Some(username), Some(password)) => Some(basic_auth_header(username, password)),
            _ => None,
        };

        Self {
            client,
            tracking_uri: settings
                .tracking_uri
                .as_ref()
                .map(|uri| uri.trim_end_matches('/').to_string()),
            auth_header,
            experiment_name: experiment
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string)
                .or_else(|| settings.experiment_name.clone()),
            experiment_id: OnceCell::new(),
        }
    }

    pub fn with_tracking_uri(client: C, tracking_uri: impl Into<String>) -> Self {
        Self::new(client, &MlflowSettings::new(tracking_uri), None)
    }

    pub fn experiment_name(&self) -> Option<&str> {
        self.experiment_name.as_deref()
    }

    fn endpoint(
        &self,
        op: RegistryOperation,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let base = self.tracking_uri.as_deref().ok_or_else(|| {
            op.error(
                PROVIDER,
                "MLflow tracking URI is not configured; set MLFLOW_TRACKING_URI",
            )
        })?;

        let mut url = Url::parse(&format!("{}/{}", base, path)).map_err(|e| {
            op.error(PROVIDER, format!("Invalid MLflow tracking URI '{}'", base))
                .with_source(e)
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Accept", "application/json")];
        if let Some(ref auth) = self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers
    }

    /// Experiment id for the configured experiment, resolved once per provider
    async fn experiment_id(&self, op: RegistryOperation) -> Result<Option<String>, PromptError> {
        let Some(name) = self.experiment_name.as_deref() else {
            return Ok(None);
        };

        self.experiment_id
            .get_or_try_init(|| self.resolve_experiment(name, op))
            .await
            .map(|id| Some(id.clone()))
    }

    async fn resolve_experiment(
        &self,
        name: &str,
        op: RegistryOperation,
    ) -> Result<String, PromptError> {
        let url = self.endpoint(
            op,
            "api/2.0/mlflow/experiments/get-by-name",
            &[("experiment_name", name)],
        )?;

        match self.client.get_json(&url, self.headers()).await {
            Ok(json) => {
                let response: GetExperimentResponse = serde_json::from_value(json)
                    .map_err(|e| {
                        op.error(PROVIDER, format!("Unexpected experiment response: {}", e))
                            .with_source(e)
                    })?;
                debug!(experiment = name, id = %response.experiment.experiment_id, "Resolved MLflow experiment");
                Ok(response.experiment.experiment_id)
            }
            Err(e) if e.is_not_found() || e.has_error_code("RESOURCE_DOES_NOT_EXIST") => {
                self.create_experiment(name, op).await
            }
            Err(e) => Err(op
                .error(PROVIDER, format!("set_experiment failed for '{}': {}", name, e))
                .with_source(e)),
        }
    }

    async fn create_experiment(
        &self,
        name: &str,
        op: RegistryOperation,
    ) -> Result<String, PromptError> {
        let url = self.endpoint(op, "api/2.0/mlflow/experiments/create", &[])?;
        let body = serde_json::json!({ "name": name });

        let json = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| {
                op.error(PROVIDER, format!("Failed to create experiment '{}': {}", name, e))
                    .with_source(e)
            })?;

        let response: CreateExperimentResponse = serde_json::from_value(json).map_err(|e| {
            op.error(PROVIDER, format!("Unexpected experiment response: {}", e))
                .with_source(e)
        })?;

        info!(experiment = name, id = %response.experiment_id, "Created MLflow experiment");
        Ok(response.experiment_id)
    }

    /// Register the prompt's parent model; an existing one is reused
    async fn ensure_registered_prompt(
        &self,
        name: &str,
        experiment_id: Option<&str>,
    ) -> Result<(), PromptError> {
        let op = RegistryOperation::Create;
        let url = self.endpoint(op, "api/2.0/mlflow/registered-models/create", &[])?;

        let mut tags = vec![MlflowTag::new(IS_PROMPT_TAG, "true")];
        if let Some(id) = experiment_id {
            tags.push(MlflowTag::new(EXPERIMENT_IDS_TAG, format!(",{},", id)));
        }
        let body = serde_json::json!({ "name": name, "tags": tags });

        match self.client.post_json(&url, self.headers(), &body).await {
            Ok(_) => {
                debug!(prompt = name, "Registered new MLflow prompt");
                Ok(())
            }
            Err(e) if e.has_error_code("RESOURCE_ALREADY_EXISTS") => {
                debug!(prompt = name, "MLflow prompt already registered");
                Ok(())
            }
            Err(e) => Err(op
                .error(PROVIDER, format!("register_prompt failed for '{}': {}", name, e))
                .with_source(e)),
        }
    }

    fn build_version_request(
        &self,
        name: &str,
        template: &PromptTemplate,
        kind: TemplateKind,
        options: &CreatePromptOptions,
    ) -> Result<serde_json::Value, PromptError> {
        let op = RegistryOperation::Create;

        let text = match template {
            PromptTemplate::Text(text) => text.clone(),
            PromptTemplate::Chat(messages) => serde_json::to_string(messages).map_err(|e| {
                op.error(PROVIDER, "Failed to serialize chat template").with_source(e)
            })?,
        };

        let mut tags = vec![
            MlflowTag::new(IS_PROMPT_TAG, "true"),
            MlflowTag::new(PROMPT_TEXT_TAG, text),
            MlflowTag::new(PROMPT_TYPE_TAG, kind.as_str()),
        ];

        if let Some(ref response_format) = options.response_format {
            tags.push(MlflowTag::new(RESPONSE_FORMAT_TAG, response_format.to_string()));
        }

        if let Some(ref user_tags) = options.tags {
            let mut sorted: Vec<_> = user_tags.iter().collect();
            sorted.sort();
            tags.extend(sorted.into_iter().map(|(k, v)| MlflowTag::new(k, v)));
        }

        let mut body = serde_json::json!({
            "name": name,
            "source": PROMPT_SOURCE,
            "tags": tags,
        });

        if let Some(ref message) = options.commit_message {
            body["description"] = serde_json::json!(message);
        }

        Ok(body)
    }

    /// Validate the query and resolve it to a name and version
    fn resolve_target(query: &PromptQuery) -> Result<(String, u32), PromptError> {
        let invalid = |message: &str| RegistryOperation::Fetch.invalid(PROVIDER, message);

        if query.label.is_some() {
            return Err(invalid(
                "prompts are addressed by version; 'label' is not supported",
            ));
        }

        if let Some(ref path) = query.path {
            if query.name.is_some() || query.version.is_some() {
                return Err(invalid(
                    "provide either 'path' or both 'name' and 'version', not both",
                ));
            }
            return parse_prompt_uri(path);
        }

        let message = "provide either 'path' or both 'name' and 'version'";
        let name = require_name(PROVIDER, query.name.as_deref(), message)?;
        let version = query.version.ok_or_else(|| invalid(message))?;
        if version == 0 {
            return Err(invalid("version must be a positive integer"));
        }

        Ok((name, version))
    }
}

#[async_trait]
impl<C: HttpClientTrait> PromptProvider for MlflowProvider<C> {
    #[instrument(skip(self, template, options), fields(provider = "mlflow"))]
    async fn create(
        &self,
        name: &str,
        template: &PromptTemplate,
        options: &CreatePromptOptions,
    ) -> Result<PromptCreated, PromptError> {
        let op = RegistryOperation::Create;
        let kind = options.resolve_kind(PROVIDER, template)?;

        if let Some(ref labels) = options.labels {
            debug!(count = labels.len(), "MLflow prompts have no labels; ignoring");
        }

        let body = self.build_version_request(name, template, kind, options)?;
        let url = self.endpoint(op, "api/2.0/mlflow/model-versions/create", &[])?;

        let experiment_id = self.experiment_id(op).await?;
        self.ensure_registered_prompt(name, experiment_id.as_deref())
            .await?;

        let json = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| {
                warn!(prompt = name, error = %e, "MLflow prompt registration failed");
                op.error(PROVIDER, format!("register_prompt failed for '{}': {}", name, e))
                    .with_source(e)
            })?;

        let response: ModelVersionResponse = serde_json::from_value(json).map_err(|e| {
            op.error(PROVIDER, format!("Unexpected register_prompt response: {}", e))
                .with_source(e)
        })?;

        let version = response.model_version.parse_version(op)?;
        info!(prompt = %response.model_version.name, version, "Registered MLflow prompt version");

        Ok(PromptCreated::new(
            PROVIDER,
            response.model_version.name,
            Some(version),
        ))
    }

    #[instrument(skip(self), fields(provider = "mlflow"))]
    async fn fetch(&self, query: &PromptQuery) -> Result<PromptHandle, PromptError> {
        let op = RegistryOperation::Fetch;
        let (name, version) = Self::resolve_target(query)?;
        let target = prompt_uri(&name, version);

        let version_param = version.to_string();
        let url = self.endpoint(
            op,
            "api/2.0/mlflow/model-versions/get",
            &[("name", name.as_str()), ("version", version_param.as_str())],
        )?;

        let json = self
            .client
            .get_json(&url, self.headers())
            .await
            .map_err(|e| fetch_error(&target, e))?;

        let response: ModelVersionResponse = serde_json::from_value(json).map_err(|e| {
            op.error(PROVIDER, format!("Unexpected load_prompt response for '{}': {}", target, e))
                .with_source(e)
        })?;

        let prompt = MlflowPromptVersion::from_model_version(response.model_version)?;
        debug!(prompt = %target, kind = %prompt.template.kind(), "Loaded MLflow prompt");

        Ok(PromptHandle::new(PROVIDER, name, Some(version), Arc::new(prompt)))
    }

    fn kind(&self) -> ProviderKind {
        PROVIDER
    }
}

fn fetch_error(target: &str, error: HttpError) -> PromptError {
    let op = RegistryOperation::Fetch;
    if error.is_not_found() || error.has_error_code("RESOURCE_DOES_NOT_EXIST") {
        op.error(PROVIDER, format!("Prompt '{}' not found", target))
            .with_source(error)
    } else {
        op.error(PROVIDER, format!("load_prompt failed for '{}': {}", target, error))
            .with_source(error)
    }
}

/// A prompt version loaded from MLflow
#[derive(Debug, Clone)]
pub struct MlflowPromptVersion {
    name: String,
    version: u32,
    template: PromptTemplate,
    commit_message: Option<String>,
    tags: HashMap<String, String>,
    response_format: Option<serde_json::Value>,
    created_at: Option<DateTime<Utc>>,
}

impl MlflowPromptVersion {
    fn from_model_version(model_version: MlflowModelVersion) -> Result<Self, PromptError> {
        let op = RegistryOperation::Fetch;
        let version = model_version.parse_version(op)?;
        let target = prompt_uri(&model_version.name, version);

        let mut tags: HashMap<String, String> = model_version
            .tags
            .into_iter()
            .map(|tag| (tag.key, tag.value))
            .collect();

        let text = tags.remove(PROMPT_TEXT_TAG).ok_or_else(|| {
            op.error(
                PROVIDER,
                format!("'{}' is not a prompt: missing {} tag", target, PROMPT_TEXT_TAG),
            )
        })?;

        let kind = match tags.remove(PROMPT_TYPE_TAG) {
            Some(kind) => kind.parse::<TemplateKind>().map_err(|e| {
                op.error(PROVIDER, format!("'{}' has an invalid prompt type", target))
                    .with_source(e)
            })?,
            None => TemplateKind::Text,
        };

        let template = match kind {
            TemplateKind::Text => PromptTemplate::Text(text),
            TemplateKind::Chat => {
                let messages: Vec<ChatMessage> = serde_json::from_str(&text).map_err(|e| {
                    op.error(PROVIDER, format!("'{}' has a malformed chat template", target))
                        .with_source(e)
                })?;
                PromptTemplate::Chat(messages)
            }
        };

        let response_format = match tags.remove(RESPONSE_FORMAT_TAG) {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                op.error(PROVIDER, format!("'{}' has a malformed response format", target))
                    .with_source(e)
            })?),
            None => None,
        };

        tags.retain(|key, _| !key.starts_with("mlflow.") && !key.starts_with("_mlflow"));

        Ok(Self {
            name: model_version.name,
            version,
            template,
            commit_message: model_version.description.filter(|d| !d.is_empty()),
            tags,
            response_format,
            created_at: model_version
                .creation_timestamp
                .and_then(DateTime::from_timestamp_millis),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn uri(&self) -> String {
        prompt_uri(&self.name, self.version)
    }

    pub fn commit_message(&self) -> Option<&str> {
        self.commit_message.as_deref()
    }

    /// User tags, without MLflow's internal prompt tags
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    pub fn response_format(&self) -> Option<&serde_json::Value> {
        self.response_format.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Fill the template's placeholders with `variables`
    pub fn format(&self, variables: &TemplateVariables) -> Result<PromptTemplate, TemplateError> {
        self.template.compile(variables)
    }
}

impl NativePrompt for MlflowPromptVersion {
    fn type_name(&self) -> &'static str {
        "MlflowPromptVersion"
    }

    fn template(&self) -> &PromptTemplate {
        &self.template
    }

    fn compile(&self, variables: &TemplateVariables) -> Result<PromptTemplate, TemplateError> {
        self.format(variables)
    }
}

// MLflow REST API types

#[derive(Debug, Serialize, Deserialize)]
struct MlflowTag {
    key: String,
    value: String,
}

impl MlflowTag {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelVersionResponse {
    model_version: MlflowModelVersion,
}

#[derive(Debug, Deserialize)]
struct MlflowModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    creation_timestamp: Option<i64>,
    #[serde(default)]
    tags: Vec<MlflowTag>,
}

impl MlflowModelVersion {
    fn parse_version(&self, op: RegistryOperation) -> Result<u32, PromptError> {
        self.version.parse().map_err(|_| {
            op.error(
                PROVIDER,
                format!("Unexpected version '{}' for prompt '{}'", self.version, self.name),
            )
        })
    }
}

#[derive(Debug, Deserialize)]
struct GetExperimentResponse {
    experiment: MlflowExperiment,
}

#[derive(Debug, Deserialize)]
struct MlflowExperiment {
    experiment_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateExperimentResponse {
    experiment_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromptErrorKind;
    use crate::infrastructure::http_client::mock::MockHttpClient;
    use std::error::Error;

    const BASE_URL: &str = "http://localhost:5000";
    const REGISTER_URL: &str = "http://localhost:5000/api/2.0/mlflow/registered-models/create";
    const VERSION_URL: &str = "http://localhost:5000/api/2.0/mlflow/model-versions/create";
    const GET_URL: &str =
        "http://localhost:5000/api/2.0/mlflow/model-versions/get?name=greet&version=1";

    fn version_response(name: &str, version: &str, tags: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "model_version": {
                "name": name,
                "version": version,
                "creation_timestamp": 1_700_000_000_000_i64,
                "description": "initial",
                "tags": tags
            }
        })
    }

    fn tag<'a>(body: &'a serde_json::Value, key: &str) -> Option<&'a str> {
        body["tags"]
            .as_array()?
            .iter()
            .find(|t| t["key"] == key)
            .and_then(|t| t["value"].as_str())
    }

    #[tokio::test]
    async fn test_create_text_prompt() {
        let client = MockHttpClient::new()
            .with_response(REGISTER_URL, serde_json::json!({"registered_model": {"name": "greet"}}))
            .with_response(VERSION_URL, version_response("greet", "3", serde_json::json!([])));

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let options = CreatePromptOptions::new()
            .with_tag("team", "support")
            .with_commit_message("initial");

        let created = provider
            .create("greet", &PromptTemplate::text("Hello {{ name }}!"), &options)
            .await
            .unwrap();

        assert_eq!(created, PromptCreated::new(ProviderKind::Mlflow, "greet", Some(3)));

        let requests = provider.client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, REGISTER_URL);

        let body = requests[1].body.as_ref().unwrap();
        assert_eq!(body["name"], "greet");
        assert_eq!(body["description"], "initial");
        assert_eq!(tag(body, PROMPT_TEXT_TAG), Some("Hello {{ name }}!"));
        assert_eq!(tag(body, PROMPT_TYPE_TAG), Some("text"));
        assert_eq!(tag(body, IS_PROMPT_TAG), Some("true"));
        assert_eq!(tag(body, "team"), Some("support"));
    }

    #[tokio::test]
    async fn test_create_chat_prompt_stores_json() {
        let client = MockHttpClient::new()
            .with_response(REGISTER_URL, serde_json::json!({}))
            .with_response(VERSION_URL, version_response("chat1", "1", serde_json::json!([])));

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let template = PromptTemplate::chat(vec![ChatMessage::system("You help with {{domain}}.")]);
        let options = CreatePromptOptions::new()
            .with_response_format(serde_json::json!({"type": "object"}));

        provider.create("chat1", &template, &options).await.unwrap();

        let requests = provider.client.requests();
        let body = requests[1].body.as_ref().unwrap();
        assert_eq!(tag(body, PROMPT_TYPE_TAG), Some("chat"));
        assert_eq!(tag(body, RESPONSE_FORMAT_TAG), Some(r#"{"type":"object"}"#));

        let stored: Vec<ChatMessage> =
            serde_json::from_str(tag(body, PROMPT_TEXT_TAG).unwrap()).unwrap();
        assert_eq!(stored, template.as_chat().unwrap());
    }

    #[tokio::test]
    async fn test_create_reuses_existing_registered_prompt() {
        let client = MockHttpClient::new()
            .with_error(
                REGISTER_URL,
                400,
                r#"{"error_code": "RESOURCE_ALREADY_EXISTS", "message": "exists"}"#,
            )
            .with_response(VERSION_URL, version_response("greet", "2", serde_json::json!([])));

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let created = provider
            .create("greet", &PromptTemplate::text("Hi"), &CreatePromptOptions::new())
            .await
            .unwrap();

        assert_eq!(created.version, Some(2));
    }

    #[tokio::test]
    async fn test_register_error_mentioning_existing_code_fails() {
        let client = MockHttpClient::new()
            .with_error(
                REGISTER_URL,
                400,
                r#"{"error_code": "INVALID_PARAMETER_VALUE", "message": "tag RESOURCE_ALREADY_EXISTS is reserved"}"#,
            )
            .with_response(VERSION_URL, version_response("greet", "2", serde_json::json!([])));

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let err = provider
            .create("greet", &PromptTemplate::text("Hi"), &CreatePromptOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), PromptErrorKind::Creation);
        assert_eq!(provider.client.request_count(), 1);
    }

    #[test]
    fn test_blank_experiment_falls_back_to_settings() {
        let settings = MlflowSettings::new(BASE_URL).with_experiment_name("from-env");

        let provider = MlflowProvider::new(MockHttpClient::new(), &settings, Some("  "));
        assert_eq!(provider.experiment_name(), Some("from-env"));

        let provider = MlflowProvider::new(MockHttpClient::new(), &settings, Some("explicit"));
        assert_eq!(provider.experiment_name(), Some("explicit"));
    }

    #[tokio::test]
    async fn test_create_failure_is_creation_error() {
        let client = MockHttpClient::new()
            .with_response(REGISTER_URL, serde_json::json!({}))
            .with_error(VERSION_URL, 500, "internal error");

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let err = provider
            .create("greet", &PromptTemplate::text("Hi"), &CreatePromptOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), PromptErrorKind::Creation);
        assert!(err.to_string().contains("register_prompt failed for 'greet'"));
        assert!(err.source().unwrap().to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_create_without_tracking_uri() {
        let provider = MlflowProvider::new(MockHttpClient::new(), &MlflowSettings::default(), None);
        let err = provider
            .create("greet", &PromptTemplate::text("Hi"), &CreatePromptOptions::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), PromptErrorKind::Creation);
        assert!(err.to_string().contains("MLFLOW_TRACKING_URI"));
        assert_eq!(provider.client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_resolves_experiment_once() {
        let client = MockHttpClient::new()
            .with_response(
                "http://localhost:5000/api/2.0/mlflow/experiments/get-by-name?experiment_name=prompts",
                serde_json::json!({"experiment": {"experiment_id": "7", "name": "prompts"}}),
            )
            .with_response(REGISTER_URL, serde_json::json!({}))
            .with_response(VERSION_URL, version_response("greet", "1", serde_json::json!([])));

        let provider = MlflowProvider::new(client, &MlflowSettings::new(BASE_URL), Some("prompts"));
        let template = PromptTemplate::text("Hi");

        provider.create("greet", &template, &CreatePromptOptions::new()).await.unwrap();
        provider.create("greet", &template, &CreatePromptOptions::new()).await.unwrap();

        let requests = provider.client.requests();
        let lookups = requests
            .iter()
            .filter(|r| r.url.contains("experiments/get-by-name"))
            .count();
        assert_eq!(lookups, 1);

        let register_body = requests
            .iter()
            .find(|r| r.url == REGISTER_URL)
            .and_then(|r| r.body.as_ref())
            .unwrap();
        assert_eq!(tag(register_body, EXPERIMENT_IDS_TAG), Some(",7,"));
    }

    #[tokio::test]
    async fn test_create_missing_experiment_is_created() {
        let client = MockHttpClient::new()
            .with_error(
                "http://localhost:5000/api/2.0/mlflow/experiments/get-by-name?experiment_name=new-exp",
                404,
                r#"{"error_code": "RESOURCE_DOES_NOT_EXIST"}"#,
            )
            .with_response(
                "http://localhost:5000/api/2.0/mlflow/experiments/create",
                serde_json::json!({"experiment_id": "12"}),
            )
            .with_response(REGISTER_URL, serde_json::json!({}))
            .with_response(VERSION_URL, version_response("greet", "1", serde_json::json!([])));

        let settings = MlflowSettings::new(BASE_URL).with_experiment_name("new-exp");
        let provider = MlflowProvider::new(client, &settings, None);
        assert_eq!(provider.experiment_name(), Some("new-exp"));

        provider
            .create("greet", &PromptTemplate::text("Hi"), &CreatePromptOptions::new())
            .await
            .unwrap();

        let requests = provider.client.requests();
        let create_body = requests[1].body.as_ref().unwrap();
        assert_eq!(create_body["name"], "new-exp");
    }

    #[tokio::test]
    async fn test_fetch_and_compile() {
        let client = MockHttpClient::new().with_response(
            GET_URL,
            version_response(
                "greet",
                "1",
                serde_json::json!([
                    {"key": PROMPT_TEXT_TAG, "value": "Hello {{ name }}!"},
                    {"key": PROMPT_TYPE_TAG, "value": "text"},
                    {"key": IS_PROMPT_TAG, "value": "true"},
                    {"key": "team", "value": "support"}
                ]),
            ),
        );

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let handle = provider
            .fetch(&PromptQuery::by_name("greet").with_version(1))
            .await
            .unwrap();

        assert_eq!(handle.name(), "greet");
        assert_eq!(handle.version(), Some(1));
        assert_eq!(
            handle.to_string(),
            "PromptHandle(provider='mlflow', name='greet', version=1, underlying=MlflowPromptVersion)"
        );

        let compiled = handle
            .compile(&TemplateVariables::new().with("name", "World"))
            .unwrap();
        assert_eq!(compiled.as_text(), Some("Hello World!"));
    }

    #[tokio::test]
    async fn test_fetch_by_path_chat() {
        let messages = serde_json::json!([{"role": "system", "content": "You help with {{domain}}."}]);
        let client = MockHttpClient::new().with_response(
            "http://localhost:5000/api/2.0/mlflow/model-versions/get?name=chat1&version=2",
            version_response(
                "chat1",
                "2",
                serde_json::json!([
                    {"key": PROMPT_TEXT_TAG, "value": messages.to_string()},
                    {"key": PROMPT_TYPE_TAG, "value": "chat"}
                ]),
            ),
        );

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let handle = provider
            .fetch(&PromptQuery::by_path("prompts:/chat1/2"))
            .await
            .unwrap();

        let compiled = handle
            .compile(&TemplateVariables::new().with("domain", "billing"))
            .unwrap();
        assert_eq!(
            compiled.as_chat().unwrap(),
            &[ChatMessage::system("You help with billing.")]
        );
    }

    #[test]
    fn test_prompt_version_metadata() {
        let model_version: MlflowModelVersion = serde_json::from_value(serde_json::json!({
            "name": "greet",
            "version": "4",
            "description": "tone tweak",
            "creation_timestamp": 1_700_000_000_000_i64,
            "tags": [
                {"key": PROMPT_TEXT_TAG, "value": "Hi"},
                {"key": RESPONSE_FORMAT_TAG, "value": "{\"type\":\"object\"}"},
                {"key": "mlflow.prompt.is_prompt", "value": "true"},
                {"key": "owner", "value": "support"}
            ]
        }))
        .unwrap();

        let prompt = MlflowPromptVersion::from_model_version(model_version).unwrap();
        assert_eq!(prompt.uri(), "prompts:/greet/4");
        assert_eq!(prompt.commit_message(), Some("tone tweak"));
        assert_eq!(prompt.response_format(), Some(&serde_json::json!({"type": "object"})));
        assert_eq!(prompt.tags().len(), 1);
        assert_eq!(prompt.tags().get("owner"), Some(&"support".to_string()));
        assert_eq!(
            prompt.created_at().unwrap().timestamp_millis(),
            1_700_000_000_000
        );
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let client = MockHttpClient::new().with_error(
            GET_URL,
            404,
            r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "not found"}"#,
        );

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let err = provider
            .fetch(&PromptQuery::by_name("greet").with_version(1))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), PromptErrorKind::Fetch);
        assert!(err.to_string().contains("Prompt 'prompts:/greet/1' not found"));
    }

    #[tokio::test]
    async fn test_fetch_model_version_without_prompt_text() {
        let client = MockHttpClient::new().with_response(
            GET_URL,
            version_response("greet", "1", serde_json::json!([])),
        );

        let provider = MlflowProvider::with_tracking_uri(client, BASE_URL);
        let err = provider
            .fetch(&PromptQuery::by_name("greet").with_version(1))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), PromptErrorKind::Fetch);
        assert!(err.to_string().contains("is not a prompt"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_queries_before_io() {
        let provider = MlflowProvider::with_tracking_uri(MockHttpClient::new(), BASE_URL);

        let invalid = [
            PromptQuery::by_name("greet"),
            PromptQuery::by_name("greet").with_version(0),
            PromptQuery::by_name("greet").with_label("production"),
            PromptQuery::by_path("prompts:/greet/1").with_version(1),
            PromptQuery::by_path("prompts:/greet"),
            PromptQuery::by_path("models:/greet/1"),
            PromptQuery::default(),
        ];

        for query in invalid {
            let err = provider.fetch(&query).await.unwrap_err();
            assert_eq!(err.kind(), PromptErrorKind::Provider, "query {:?}", query);
            assert_eq!(err.provider_name(), Some("mlflow"));
            assert!(err.message().starts_with("mlflow get_prompt: "), "{}", err);
        }

        assert_eq!(provider.client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_bearer_token_header() {
        let client = MockHttpClient::new().with_response(
            GET_URL,
            version_response(
                "greet",
                "1",
                serde_json::json!([{"key": PROMPT_TEXT_TAG, "value": "Hi"}]),
            ),
        );

        let settings = MlflowSettings::new(BASE_URL).with_token("dapi-123");
        let provider = MlflowProvider::new(client, &settings, None);
        provider
            .fetch(&PromptQuery::by_name("greet").with_version(1))
            .await
            .unwrap();

        let requests = provider.client.requests();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].header("authorization"), Some("Bearer dapi-123"));
    }

    #[test]
    fn test_parse_prompt_uri() {
        assert_eq!(
            parse_prompt_uri("prompts:/greet/12").unwrap(),
            ("greet".to_string(), 12)
        );
        assert!(parse_prompt_uri("prompts:/greet/0").is_err());
        assert!(parse_prompt_uri("prompts:/a/b/1").is_err());
        assert!(parse_prompt_uri("prompts:/greet/latest").is_err());
        assert_eq!(prompt_uri("greet", 3), "prompts:/greet/3");
    }
}
