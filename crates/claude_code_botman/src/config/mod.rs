//! Resolved configuration for a [`crate::ClaudeCode`] client.
//!
//! [`ClaudeConfig`] is immutable once built; use [`ClaudeConfig::builder`] or
//! [`ClaudeConfig::to_builder`] to derive a new one. Every value is validated in
//! [`ClaudeConfigBuilder::build`], so a config that exists is a config the
//! command builder can render.

mod env;
mod types;

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use tracing::warn;

pub use env::ENV_PREFIX;
pub use types::{InputFormat, OutputFormat, PermissionMode};

use crate::{paths, ClaudeCodeError};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const MODEL_FAMILIES: &[&str] = &["opus", "sonnet", "haiku"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaudeConfig {
    pub(crate) model: String,
    pub(crate) api_key: Option<String>,
    pub(crate) default_path: PathBuf,
    pub(crate) timeout: Duration,
    pub(crate) max_turns: Option<u32>,
    pub(crate) output_format: OutputFormat,
    pub(crate) input_format: InputFormat,
    pub(crate) permission_mode: PermissionMode,
    pub(crate) permission_prompt_tool: Option<String>,
    pub(crate) allowed_tools: Vec<String>,
    pub(crate) disallowed_tools: Vec<String>,
    pub(crate) add_dirs: Vec<PathBuf>,
    pub(crate) append_system_prompt: Option<String>,
    pub(crate) verbose: bool,
    pub(crate) dangerously_skip_permissions: bool,
    pub(crate) auto_continue: bool,
    pub(crate) save_sessions: bool,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) rules: Option<PathBuf>,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            default_path: PathBuf::from("."),
            timeout: DEFAULT_TIMEOUT,
            max_turns: None,
            output_format: OutputFormat::Text,
            input_format: InputFormat::Text,
            permission_mode: PermissionMode::Prompt,
            permission_prompt_tool: None,
            allowed_tools: Vec::new(),
            disallowed_tools: Vec::new(),
            add_dirs: Vec::new(),
            append_system_prompt: None,
            verbose: false,
            dangerously_skip_permissions: false,
            auto_continue: false,
            save_sessions: true,
            env: BTreeMap::new(),
            rules: None,
        }
    }
}

impl ClaudeConfig {
    pub fn builder() -> ClaudeConfigBuilder {
        ClaudeConfigBuilder::default()
    }

    /// Starts a builder seeded with this configuration.
    pub fn to_builder(&self) -> ClaudeConfigBuilder {
        ClaudeConfigBuilder {
            config: self.clone(),
        }
    }

    /// Reads `CLAUDE_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ClaudeCodeError> {
        env::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClaudeConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClaudeCodeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        env::from_lookup(lookup)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn default_path(&self) -> &PathBuf {
        &self.default_path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn input_format(&self) -> InputFormat {
        self.input_format
    }

    pub fn permission_mode(&self) -> PermissionMode {
        self.permission_mode
    }

    pub fn permission_prompt_tool(&self) -> Option<&str> {
        self.permission_prompt_tool.as_deref()
    }

    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }

    pub fn disallowed_tools(&self) -> &[String] {
        &self.disallowed_tools
    }

    pub fn add_dirs(&self) -> &[PathBuf] {
        &self.add_dirs
    }

    pub fn append_system_prompt(&self) -> Option<&str> {
        self.append_system_prompt.as_deref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn dangerously_skip_permissions(&self) -> bool {
        self.dangerously_skip_permissions
    }

    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    pub fn save_sessions(&self) -> bool {
        self.save_sessions
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn rules(&self) -> Option<&PathBuf> {
        self.rules.as_ref()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClaudeConfigBuilder {
    config: ClaudeConfig,
}

impl ClaudeConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.default_path = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.config.max_turns = Some(turns);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    pub fn input_format(mut self, format: InputFormat) -> Self {
        self.config.input_format = format;
        self
    }

    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.config.permission_mode = mode;
        self
    }

    pub fn permission_prompt_tool(mut self, tool: impl Into<String>) -> Self {
        self.config.permission_prompt_tool = Some(tool.into());
        self
    }

    pub fn allowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn disallowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.disallowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.config.add_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.append_system_prompt = Some(prompt.into());
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    pub fn dangerously_skip_permissions(mut self, enabled: bool) -> Self {
        self.config.dangerously_skip_permissions = enabled;
        self
    }

    pub fn auto_continue(mut self, enabled: bool) -> Self {
        self.config.auto_continue = enabled;
        self
    }

    pub fn save_sessions(mut self, enabled: bool) -> Self {
        self.config.save_sessions = enabled;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.insert(key.into(), value.into());
        self
    }

    pub fn rules(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rules = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ClaudeConfig, ClaudeCodeError> {
        let mut config = self.config;

        config.model = config.model.trim().to_string();
        if config.model.is_empty() {
            return Err(ClaudeCodeError::InvalidConfig(
                "model must not be empty".to_string(),
            ));
        }
        if !validate_model_name(&config.model) {
            warn!(model = %config.model, "model name is not a recognized Claude model");
        }
        if config.timeout.is_zero() {
            return Err(ClaudeCodeError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if config.max_turns == Some(0) {
            return Err(ClaudeCodeError::InvalidConfig(
                "max_turns must be at least 1".to_string(),
            ));
        }
        if matches!(config.api_key.as_deref(), Some(key) if key.trim().is_empty()) {
            config.api_key = None;
        }
        for (label, tools) in [
            ("allowed_tools", &config.allowed_tools),
            ("disallowed_tools", &config.disallowed_tools),
        ] {
            if tools.iter().any(|tool| tool.trim().is_empty()) {
                return Err(ClaudeCodeError::InvalidConfig(format!(
                    "{label} must not contain empty patterns"
                )));
            }
        }
        if config.dangerously_skip_permissions {
            warn!("dangerously_skip_permissions is enabled; the CLI will not ask before acting");
        }

        config.default_path = paths::sanitize_path(&config.default_path)?;
        config.add_dirs = config
            .add_dirs
            .iter()
            .map(|dir| paths::sanitize_path(dir))
            .collect::<Result<_, _>>()?;
        config.rules = config
            .rules
            .as_deref()
            .map(paths::sanitize_path)
            .transpose()?;

        Ok(config)
    }
}

/// Accepts Claude family aliases (`sonnet`, `opus-4`) and full model ids.
pub fn validate_model_name(model: &str) -> bool {
    let lower = model.trim().to_ascii_lowercase();
    lower.starts_with("claude-") || MODEL_FAMILIES.iter().any(|family| lower.contains(family))
}
