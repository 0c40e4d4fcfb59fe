//! Set command - registers a new prompt version

use std::collections::HashMap;

use clap::{ArgGroup, Args};

use super::{parse_json, parse_key_value, print_json};
use crate::domain::{ChatMessage, CreatePromptOptions, PromptTemplate, TemplateKind};
use crate::infrastructure::CentralPrompt;

/// Arguments for the set command
#[derive(Args, Clone, Debug)]
#[command(group(ArgGroup::new("body").required(true).args(["template", "messages"])))]
pub struct SetArgs {
    /// Prompt name
    #[arg(long, short)]
    pub name: String,

    /// Text template, e.g. "Hello {{ name }}!"
    #[arg(long, short)]
    pub template: Option<String>,

    /// Chat template as a JSON array of {"role", "content"} objects
    #[arg(long, short)]
    pub messages: Option<String>,

    /// Template kind; inferred from the template when omitted
    #[arg(long = "prompt-type")]
    pub prompt_type: Option<TemplateKind>,

    /// Label to attach to the new version (repeatable)
    #[arg(long = "label", short)]
    pub labels: Vec<String>,

    /// Tag to attach to the new version as KEY=VALUE (repeatable)
    #[arg(long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,

    /// Description of the change
    #[arg(long)]
    pub commit_message: Option<String>,

    /// Structured-output schema as JSON
    #[arg(long, value_parser = parse_json)]
    pub response_format: Option<serde_json::Value>,
}

impl SetArgs {
    pub fn template(&self) -> anyhow::Result<PromptTemplate> {
        match (&self.template, &self.messages) {
            (Some(text), _) => Ok(PromptTemplate::text(text.as_str())),
            (None, Some(messages)) => {
                let messages: Vec<ChatMessage> = serde_json::from_str(messages)
                    .map_err(|e| anyhow::anyhow!("--messages must be a JSON array of chat messages: {}", e))?;
                Ok(PromptTemplate::chat(messages))
            }
            (None, None) => anyhow::bail!("either --template or --messages is required"),
        }
    }

    pub fn options(&self) -> CreatePromptOptions {
        let mut options = CreatePromptOptions::new();

        if let Some(kind) = self.prompt_type {
            options = options.with_prompt_type(kind);
        }

        if !self.labels.is_empty() {
            options = options.with_labels(self.labels.clone());
        }

        if !self.tags.is_empty() {
            options = options.with_tags(self.tags.iter().cloned().collect::<HashMap<_, _>>());
        }

        if let Some(ref format) = self.response_format {
            options = options.with_response_format(format.clone());
        }

        if let Some(ref message) = self.commit_message {
            options = options.with_commit_message(message.as_str());
        }

        options
    }
}

pub async fn run(service: &CentralPrompt, args: SetArgs) -> anyhow::Result<()> {
    let template = args.template()?;
    let created = service.set_prompt(&args.name, template, args.options()).await?;
    print_json(&created)
}
