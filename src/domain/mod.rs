//! Domain layer - Prompt model, provider contract and error taxonomy

pub mod error;
pub mod prompt;
pub mod provider;

pub use error::{BoxError, PromptError, PromptErrorKind};
pub use prompt::{
    ChatMessage, CreatePromptOptions, NativePrompt, PromptCreated, PromptHandle, PromptQuery,
    PromptTemplate, TemplateError, TemplateKind, TemplateVariables,
};
pub use provider::{PromptProvider, ProviderKind};

#[cfg(test)]
pub use provider::MockPromptProvider;
