use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::Mutex,
};

use crate::{client::ClaudeCode, paths, session::SessionTracker, ClaudeCodeError, ClaudeConfig};

#[derive(Debug, Clone, Default)]
pub struct ClaudeCodeBuilder {
    pub(crate) config: ClaudeConfig,
    pub(crate) binary: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) mirror_stdout: bool,
    pub(crate) mirror_stderr: bool,
}

impl ClaudeCodeBuilder {
    /// Replaces the whole configuration. It must come from
    /// [`crate::ClaudeConfigBuilder::build`] and is therefore already valid.
    pub fn config(mut self, config: ClaudeConfig) -> Self {
        self.config = config;
        self
    }

    /// Path to the `claude` binary. Defaults to `CLAUDE_BINARY`, then `claude`
    /// on `PATH`.
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Process-level variable applied beneath the configuration's own `env`.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Copy child stdout to this process's stdout while capturing it.
    pub fn mirror_stdout(mut self, enabled: bool) -> Self {
        self.mirror_stdout = enabled;
        self
    }

    pub fn mirror_stderr(mut self, enabled: bool) -> Self {
        self.mirror_stderr = enabled;
        self
    }

    /// Loads the rules file, if one is configured, and returns the client.
    pub fn build(mut self) -> Result<ClaudeCode, ClaudeCodeError> {
        // Keep the CLI from updating itself mid-call unless the caller opts in.
        self.env
            .entry("DISABLE_AUTOUPDATER".to_string())
            .or_insert_with(|| "1".to_string());

        let rules_text = self
            .config
            .rules
            .as_deref()
            .map(paths::read_rules_file)
            .transpose()?;

        Ok(ClaudeCode {
            config: self.config,
            binary: self.binary,
            env: self.env,
            rules_text,
            mirror_stdout: self.mirror_stdout,
            mirror_stderr: self.mirror_stderr,
            sessions: Mutex::new(SessionTracker::new()),
        })
    }
}
