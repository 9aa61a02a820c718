//! Synchronous facade over [`crate::ClaudeCode`].
//!
//! Each client owns a current-thread tokio runtime. Do not call it from inside
//! another async runtime; use the async client there.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::{
    commands::options::CallOptions, response::ClaudeResponse, session::SessionRecord,
    ClaudeCode, ClaudeCodeError, ClaudeConfig,
};

#[derive(Debug)]
pub struct BlockingClaudeCode {
    inner: ClaudeCode,
    runtime: Runtime,
}

impl BlockingClaudeCode {
    pub fn new(config: ClaudeConfig) -> Result<Self, ClaudeCodeError> {
        Self::from_client(ClaudeCode::new(config)?)
    }

    pub fn from_client(inner: ClaudeCode) -> Result<Self, ClaudeCodeError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ClaudeCodeError::Runtime)?;
        Ok(Self { inner, runtime })
    }

    pub fn client(&self) -> &ClaudeCode {
        &self.inner
    }

    pub fn call(&self, prompt: &str) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.runtime.block_on(self.inner.call(prompt))
    }

    pub fn call_with(
        &self,
        prompt: &str,
        options: CallOptions,
    ) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.runtime.block_on(self.inner.call_with(prompt, options))
    }

    pub fn continue_conversation(&self, prompt: &str) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.runtime
            .block_on(self.inner.continue_conversation(prompt))
    }

    pub fn resume_session(
        &self,
        session_id: &str,
        prompt: &str,
    ) -> Result<ClaudeResponse, ClaudeCodeError> {
        self.runtime
            .block_on(self.inner.resume_session(session_id, prompt))
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.inner.sessions()
    }

    pub fn current_session(&self) -> Option<SessionRecord> {
        self.inner.current_session()
    }

    pub fn cleanup_expired_sessions(&self, max_age: Duration) -> Vec<String> {
        self.inner.cleanup_expired_sessions(max_age)
    }
}
