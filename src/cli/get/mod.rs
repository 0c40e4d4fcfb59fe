//! Get command - fetches a prompt version and prints it as JSON

use serde::Serialize;

use super::{print_json, PromptArgs};
use crate::domain::{PromptHandle, PromptTemplate, ProviderKind, TemplateKind};
use crate::infrastructure::CentralPrompt;

/// Printed form of a fetched prompt
#[derive(Debug, Serialize)]
pub struct PromptView<'a> {
    pub provider: ProviderKind,
    pub name: &'a str,
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    #[serde(rename = "type")]
    pub prompt_type: TemplateKind,
    pub underlying: &'static str,
    pub variables: Vec<String>,
    pub template: &'a PromptTemplate,
}

impl<'a> From<&'a PromptHandle> for PromptView<'a> {
    fn from(handle: &'a PromptHandle) -> Self {
        let template = handle.template();
        Self {
            provider: handle.provider(),
            name: handle.name(),
            version: handle.version(),
            label: handle.label(),
            prompt_type: template.kind(),
            underlying: handle.underlying().type_name(),
            variables: template.variables(),
            template,
        }
    }
}

pub async fn run(service: &CentralPrompt, args: PromptArgs) -> anyhow::Result<()> {
    let handle = service.get_prompt(args.to_query()).await?;
    print_json(&PromptView::from(&handle))
}
