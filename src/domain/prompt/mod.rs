//! Prompt domain - templates, variables, requests and fetched prompt handles

mod handle;
mod request;
mod template;
mod variables;

pub use handle::{NativePrompt, PromptHandle};
pub use request::{CreatePromptOptions, PromptCreated, PromptQuery};
pub use template::{ChatMessage, PromptTemplate, TemplateError, TemplateKind};
pub use variables::TemplateVariables;
