#![forbid(unsafe_code)]
//! Async SDK around the Claude Code CLI (`claude`) in headless `-p` mode.
//!
//! The crate renders a [`ClaudeConfig`] plus per-call [`CallOptions`] into a
//! `claude -p` command line, runs it as a child process, translates the
//! captured output into a [`ClaudeResponse`], and remembers the session ids it
//! sees so later calls can continue or resume them.
//!
//! ```no_run
//! use claude_code_botman::{CallOptions, ClaudeCode, ClaudeConfig, PermissionMode};
//!
//! # async fn demo() -> Result<(), claude_code_botman::ClaudeCodeError> {
//! let config = ClaudeConfig::builder()
//!     .model("claude-sonnet-4-20250514")
//!     .permission_mode(PermissionMode::Plan)
//!     .allowed_tools(["Read", "Bash(git log:*)"])
//!     .build()?;
//! let client = ClaudeCode::new(config)?;
//!
//! let response = client.call("Summarize the open TODOs").await?;
//! println!("{response}");
//!
//! if let Some(id) = response.session_id() {
//!     let follow_up = client
//!         .call_with("Now fix the first one", CallOptions::new().resume(id))
//!         .await?;
//!     println!("files modified: {:?}", follow_up.files_modified());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The crate shells out to a locally installed `claude` binary (override with
//! [`ClaudeCodeBuilder::binary`] or `CLAUDE_BINARY`). It installs no `tracing`
//! subscriber.

pub mod batch;
pub mod blocking;
mod builder;
mod client;
mod commands;
pub mod config;
mod error;
pub mod health;
pub mod paths;
mod process;
pub mod response;
pub mod retry;
pub mod session;
mod stream_json;
pub mod workspace;

pub use batch::{BatchOperation, BatchResult, ClaudeCodeBatch};
pub use blocking::BlockingClaudeCode;
pub use builder::ClaudeCodeBuilder;
pub use client::{ClaudeCode, API_KEY_ENV, BINARY_ENV};
pub use commands::command::ClaudeCommandRequest;
pub use commands::flags::{flag_name, format_flag_args, shell_quote, FlagValue};
pub use commands::options::CallOptions;
pub use commands::print::{build_command, ClaudeCommand, CommandBuilder};
pub use config::{
    validate_model_name, ClaudeConfig, ClaudeConfigBuilder, InputFormat, OutputFormat,
    PermissionMode,
};
pub use error::{ClaudeCodeError, StreamJsonLineError};
pub use process::CommandOutput;
pub use response::{translate, ClaudeResponse};
pub use retry::{Backoff, RetryPolicy};
pub use session::{SessionRecord, SessionTracker};
pub use stream_json::{parse_stream_json_lines, StreamJsonLine, StreamJsonLineOutcome};
pub use workspace::ClaudeCodeContext;
