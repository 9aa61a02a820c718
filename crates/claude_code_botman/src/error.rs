use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::OutputFormat;

#[derive(Debug, Error)]
pub enum ClaudeCodeError {
    #[error("claude binary `{binary}` not available: {reason}")]
    NotFound { binary: PathBuf, reason: String },
    #[error("failed to spawn claude process (binary={binary:?}): {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("claude process timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("claude exited with code {exit_code}: {}", summarize_output(.stdout, .stderr))]
    Execution {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    #[error("invalid path `{path}`: {reason}")]
    Path { path: PathBuf, reason: String },
    #[error("failed to read rules file `{path}`: {source}")]
    RulesRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format} output: {message} (near `{fragment}`)")]
    ResponseParse {
        format: OutputFormat,
        fragment: String,
        message: String,
    },
    #[error("failed to create scratch file or directory: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("request is invalid: {0}")]
    InvalidRequest(String),
    #[error("failed waiting for claude process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("failed reading stdout: {0}")]
    StdoutRead(#[source] std::io::Error),
    #[error("failed reading stderr: {0}")]
    StderrRead(#[source] std::io::Error),
    #[error("internal error: missing stdout pipe")]
    MissingStdout,
    #[error("internal error: missing stderr pipe")]
    MissingStderr,
    #[error("internal error: join failure: {0}")]
    Join(String),
}

impl ClaudeCodeError {
    /// Timeouts are the only failures worth repeating as-is; everything else
    /// needs a different request, binary, or environment.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClaudeCodeError::Timeout { .. })
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ClaudeCodeError::Execution { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

fn summarize_output(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    let stdout = stdout.trim();
    match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => "<no output>".to_string(),
        (false, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) => format!("{stdout} (stderr: {stderr})"),
    }
}

/// Position-aware failure for a single stream-json line.
#[derive(Debug, Error, Clone)]
#[error("stream-json line {line_number}: {message}")]
pub struct StreamJsonLineError {
    pub line_number: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_mentions_stdout_and_stderr() {
        let err = ClaudeCodeError::Execution {
            exit_code: 1,
            stdout: "Error occurred\n".to_string(),
            stderr: "Command failed".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("code 1"));
        assert!(rendered.contains("Error occurred"));
        assert!(rendered.contains("Command failed"));
        assert_eq!(err.exit_code(), Some(1));
        assert!(!err.is_retryable());
    }

    #[test]
    fn only_timeouts_are_retryable() {
        let err = ClaudeCodeError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("30s"));
    }
}
