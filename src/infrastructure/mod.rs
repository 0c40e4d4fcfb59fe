//! Infrastructure layer - Registry adapters, transport and services

pub mod factory;
pub mod http_client;
pub mod langfuse;
pub mod logging;
pub mod mlflow;
mod registry;
pub mod services;

pub use factory::PromptProviderFactory;
pub use http_client::{HttpClient, HttpClientTrait, HttpError};
pub use langfuse::{LangfusePrompt, LangfuseProvider};
pub use mlflow::{MlflowPromptVersion, MlflowProvider};
pub use services::CentralPrompt;
