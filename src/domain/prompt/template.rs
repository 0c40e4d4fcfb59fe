//! Prompt template model and placeholder substitution
//!
//! Placeholder syntax: `{{ name }}`
//! - Whitespace around the name is insignificant (`{{name}}` == `{{ name }}`)
//! - Names are case sensitive
//! - A placeholder without a matching variable is an error, extra variables are ignored
//! - An unclosed `{{` outside any placeholder is a malformed placeholder

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::TemplateVariables;

/// Regex to match `{{ ... }}` placeholders
static PLACEHOLDER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());

/// Valid variable name inside a placeholder
static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },

    #[error("Malformed placeholder: {placeholder}")]
    InvalidPlaceholder { placeholder: String },

    #[error("Variable '{name}' has unsupported type {value_type}")]
    UnsupportedValue { name: String, value_type: String },

    #[error("Invalid template: {message}")]
    InvalidTemplate { message: String },
}

/// Kind of a prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Text,
    Chat,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "chat" => Ok(Self::Chat),
            other => Err(TemplateError::InvalidTemplate {
                message: format!("prompt type must be 'text' or 'chat', got '{}'", other),
            }),
        }
    }
}

/// A single turn of a chat template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// A prompt template: either a flat string or an ordered list of chat messages.
///
/// Serializes to the wire shape both registries use for prompt bodies: a JSON
/// string for text templates and an array of `{role, content}` objects for chat
/// templates. Deserializing infers the kind from that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptTemplate {
    Text(String),
    Chat(Vec<ChatMessage>),
}

impl PromptTemplate {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    pub fn chat(messages: Vec<ChatMessage>) -> Self {
        Self::Chat(messages)
    }

    /// Infer the template kind from a JSON value
    pub fn from_json(value: serde_json::Value) -> Result<Self, TemplateError> {
        serde_json::from_value(value).map_err(|_| TemplateError::InvalidTemplate {
            message: "template must be a string or a list of {role, content} messages"
                .to_string(),
        })
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            Self::Text(_) => TemplateKind::Text,
            Self::Chat(_) => TemplateKind::Chat,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Chat(messages) => messages.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Chat(_) => None,
        }
    }

    pub fn as_chat(&self) -> Option<&[ChatMessage]> {
        match self {
            Self::Text(_) => None,
            Self::Chat(messages) => Some(messages),
        }
    }

    /// Distinct placeholder names, in order of first appearance
    pub fn variables(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        let mut collect = |text: &str| {
            for cap in PLACEHOLDER_PATTERN.captures_iter(text) {
                let name = cap[1].trim();
                if VARIABLE_NAME.is_match(name) && seen.insert(name.to_string()) {
                    names.push(name.to_string());
                }
            }
        };

        match self {
            Self::Text(text) => collect(text),
            Self::Chat(messages) => messages.iter().for_each(|m| collect(&m.content)),
        }

        names
    }

    /// Substitute every placeholder, producing a template of the same kind
    pub fn compile(&self, variables: &TemplateVariables) -> Result<Self, TemplateError> {
        match self {
            Self::Text(text) => Ok(Self::Text(substitute(text, variables)?)),
            Self::Chat(messages) => {
                let compiled = messages
                    .iter()
                    .map(|m| {
                        Ok(ChatMessage {
                            role: m.role.clone(),
                            content: substitute(&m.content, variables)?,
                        })
                    })
                    .collect::<Result<Vec<_>, TemplateError>>()?;
                Ok(Self::Chat(compiled))
            }
        }
    }
}

impl From<&str> for PromptTemplate {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PromptTemplate {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<ChatMessage>> for PromptTemplate {
    fn from(value: Vec<ChatMessage>) -> Self {
        Self::Chat(value)
    }
}

fn substitute(text: &str, variables: &TemplateVariables) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;

    for cap in PLACEHOLDER_PATTERN.captures_iter(text) {
        let Some(placeholder) = cap.get(0) else {
            continue;
        };
        let name = cap[1].trim();

        if !VARIABLE_NAME.is_match(name) {
            return Err(TemplateError::InvalidPlaceholder {
                placeholder: placeholder.as_str().to_string(),
            });
        }

        let value = variables
            .render_value(name)?
            .ok_or_else(|| TemplateError::MissingVariable {
                name: name.to_string(),
            })?;

        result.push_str(check_literal(&text[last_end..placeholder.start()])?);
        result.push_str(&value);
        last_end = placeholder.end();
    }

    result.push_str(check_literal(&text[last_end..])?);
    Ok(result)
}

/// Text between placeholders must not open another one
fn check_literal(segment: &str) -> Result<&str, TemplateError> {
    match segment.find("{{") {
        Some(start) => Err(TemplateError::InvalidPlaceholder {
            placeholder: segment[start..].trim_end().to_string(),
        }),
        None => Ok(segment),
    }
}
