//! Infrastructure services

mod central_prompt;

pub use central_prompt::CentralPrompt;
