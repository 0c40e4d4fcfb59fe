mod settings;

pub use settings::{
    DEFAULT_LANGFUSE_HOST, LangfuseSettings, LogFormat, LoggingConfig, MlflowSettings,
    PromptSettings,
};
