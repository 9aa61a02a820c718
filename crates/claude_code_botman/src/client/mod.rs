use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use semver::Version;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::{
    builder::ClaudeCodeBuilder,
    commands::{
        options::CallOptions,
        print::{ClaudeCommand, CommandBuilder, DEFAULT_BINARY},
    },
    health::{self, CliStatus, SystemInfo},
    paths, process,
    response::{translate, ClaudeResponse},
    session::{SessionRecord, SessionTracker},
    ClaudeCodeError, ClaudeConfig, ClaudeConfigBuilder,
};

/// Variable consulted for the binary path when none was set on the builder.
pub const BINARY_ENV: &str = "CLAUDE_BINARY";

/// Variable the CLI reads its API key from.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Async client for `claude -p`.
///
/// Holds a validated [`ClaudeConfig`] and the sessions seen by this instance.
/// Calls against the same session should not overlap; the tracker itself is
/// locked only for the instant it is read or updated.
#[derive(Debug)]
pub struct ClaudeCode {
    pub(crate) config: ClaudeConfig,
    pub(crate) binary: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) rules_text: Option<String>,
    pub(crate) mirror_stdout: bool,
    pub(crate) mirror_stderr: bool,
    pub(crate) sessions: Mutex<SessionTracker>,
}

impl ClaudeCode {
    pub fn builder() -> ClaudeCodeBuilder {
        ClaudeCodeBuilder::default()
    }

    pub fn new(config: ClaudeConfig) -> Result<Self, ClaudeCodeError> {
        Self::builder().config(config).build()
    }

    /// Client configured from `CLAUDE_*` environment variables.
    pub fn from_env() -> Result<Self, ClaudeCodeError> {
        Self::new(ClaudeConfig::from_env()?)
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    pub fn rules_text(&self) -> Option<&str> {
        self.rules_text.as_deref()
    }

    /// Binary that calls will launch.
    pub fn binary(&self) -> PathBuf {
        if let Some(b) = self.binary.as_ref() {
            return b.clone();
        }
        if let Ok(v) = std::env::var(BINARY_ENV) {
            if !v.trim().is_empty() {
                return PathBuf::from(v);
            }
        }
        PathBuf::from(DEFAULT_BINARY)
    }

    /// Renders the invocation `call_with` would run, without running it.
    pub fn build_command(&self, prompt: &str, options: &CallOptions) -> ClaudeCommand {
        let binary = self.binary();
        CommandBuilder::new(&self.config)
            .binary(&binary)
            .rules(self.rules_text.as_deref())
            .build(prompt, options)
    }

    pub async fn call(&self, prompt: &str) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.call_with(prompt, CallOptions::new()).await
    }

    /// Picks up the most recent conversation in the working directory.
    pub async fn continue_conversation(
        &self,
        prompt: &str,
    ) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.call_with(prompt, CallOptions::new().continue_session(true))
            .await
    }

    pub async fn resume_session(
        &self,
        session_id: &str,
        prompt: &str,
    ) -> Result<ClaudeResponse, ClaudeCodeError> {
        if session_id.trim().is_empty() {
            return Err(ClaudeCodeError::InvalidRequest(
                "session id must not be empty".to_string(),
            ));
        }
        self.call_with(prompt, CallOptions::new().resume(session_id))
            .await
    }

    /// Runs one prompt with per-call overrides.
    ///
    /// Non-zero exits become [`ClaudeCodeError::Execution`]. On success the
    /// session id found in the output (or the resumed id) is recorded when
    /// `save_sessions` is on.
    pub async fn call_with(
        &self,
        prompt: &str,
        mut options: CallOptions,
    ) -> Result<ClaudeResponse, ClaudeCodeError> {
        if prompt.trim().is_empty() {
            return Err(ClaudeCodeError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }

        if self.config.auto_continue
            && options.continue_session.is_none()
            && options.resume.is_none()
            && self.tracker().current_id().is_some()
        {
            options.continue_session = Some(true);
        }

        let working_dir =
            paths::resolve_working_dir(options.working_dir(), &self.config.default_path)?;
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let format = options.output_format.unwrap_or(self.config.output_format);
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());
        let command = self.build_command(prompt, &options);

        let mut cmd = Command::new(command.program());
        cmd.args(command.process_args()).current_dir(&working_dir);
        process::apply_env(&mut cmd, &self.env);
        process::apply_env(&mut cmd, &self.config.env);
        if let Some(key) = self.config.api_key() {
            cmd.env(API_KEY_ENV, key);
        }

        debug!(
            binary = ?command.program(),
            cwd = ?working_dir,
            model = %model,
            format = %format,
            timeout = ?timeout,
            "running claude prompt"
        );

        let output = process::run_command(
            cmd,
            command.program(),
            Some(timeout),
            self.mirror_stdout,
            self.mirror_stderr,
        )
        .await?;

        let exit_code = output.exit_code();
        let stdout = output.stdout_text();
        let stderr = output.stderr_text();
        if exit_code != 0 {
            return Err(ClaudeCodeError::Execution {
                exit_code,
                stdout,
                stderr,
            });
        }

        let response = translate(&stdout, exit_code, &stderr, format)?;
        if response.has_errors() {
            warn!(errors = ?response.errors(), "claude reported errors");
        }

        if self.config.save_sessions {
            if let Some(id) = response.session_id().or(options.resume_target()) {
                self.tracker().record(id, &working_dir, &model);
            }
        }

        Ok(response)
    }

    /// Snapshot of tracked sessions, oldest first.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.tracker().list()
    }

    pub fn session(&self, session_id: &str) -> Option<SessionRecord> {
        self.tracker().get(session_id).cloned()
    }

    pub fn current_session(&self) -> Option<SessionRecord> {
        self.tracker().current().cloned()
    }

    /// Forgets sessions idle for longer than `max_age`; returns their ids.
    pub fn cleanup_expired_sessions(&self, max_age: Duration) -> Vec<String> {
        self.tracker().expire(max_age)
    }

    pub fn clear_sessions(&self) {
        self.tracker().clear();
    }

    /// New client with `patch` applied to a copy of this configuration. The
    /// copy starts with no sessions.
    pub fn with_config<F>(&self, patch: F) -> Result<ClaudeCode, ClaudeCodeError>
    where
        F: FnOnce(ClaudeConfigBuilder) -> ClaudeConfigBuilder,
    {
        let config = patch(self.config.to_builder()).build()?;
        ClaudeCodeBuilder {
            config,
            binary: self.binary.clone(),
            env: self.env.clone(),
            mirror_stdout: self.mirror_stdout,
            mirror_stderr: self.mirror_stderr,
        }
        .build()
    }

    /// Confirms the binary resolves and answers `--version`.
    pub async fn health_check(&self) -> Result<CliStatus, ClaudeCodeError> {
        health::validate_cli(&self.binary()).await
    }

    pub async fn cli_version(&self) -> Result<Version, ClaudeCodeError> {
        health::cli_version(&self.binary()).await
    }

    pub async fn system_info(&self) -> SystemInfo {
        health::system_info(&self.binary()).await
    }

    pub(crate) fn tracker(&self) -> MutexGuard<'_, SessionTracker> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
