//! Central Prompt
//!
//! A single interface over prompt registries with support for:
//! - MLflow prompt registry (model registry with prompt tags)
//! - Langfuse prompt management
//! - Text and chat templates with `{{ variable }}` placeholders
//! - Settings from config files, environment variables and `.env`

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::PromptSettings;
pub use domain::{
    ChatMessage, CreatePromptOptions, NativePrompt, PromptCreated, PromptError, PromptErrorKind,
    PromptHandle, PromptProvider, PromptQuery, PromptTemplate, ProviderKind, TemplateError,
    TemplateKind, TemplateVariables,
};
pub use infrastructure::CentralPrompt;
