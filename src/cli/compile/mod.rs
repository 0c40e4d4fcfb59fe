//! Compile command - fetches a prompt version and prints it with variables substituted

use clap::Args;

use super::{parse_json, parse_key_value, print_json, PromptArgs};
use crate::domain::TemplateVariables;
use crate::infrastructure::CentralPrompt;

/// Arguments for the compile command
#[derive(Args, Clone, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub prompt: PromptArgs,

    /// Variable value as KEY=VALUE (repeatable)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Variables as a JSON object; KEY=VALUE pairs take precedence
    #[arg(long = "vars-json", value_parser = parse_json)]
    pub vars_json: Option<serde_json::Value>,
}

impl CompileArgs {
    pub fn variables(&self) -> anyhow::Result<TemplateVariables> {
        let mut variables = TemplateVariables::new();

        if let Some(ref json) = self.vars_json {
            let object = json
                .as_object()
                .ok_or_else(|| anyhow::anyhow!("--vars-json must be a JSON object"))?;
            for (name, value) in object {
                variables.insert(name.as_str(), value.clone());
            }
        }

        for (name, value) in &self.vars {
            variables.insert(name.as_str(), value.as_str());
        }

        Ok(variables)
    }
}

pub async fn run(service: &CentralPrompt, args: CompileArgs) -> anyhow::Result<()> {
    let variables = args.variables()?;
    let handle = service.get_prompt(args.prompt.to_query()).await?;
    let compiled = handle.compile(&variables)?;
    print_json(&compiled)
}
