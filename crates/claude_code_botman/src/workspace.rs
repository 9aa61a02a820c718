//! Scoped client with scratch files that disappear with it.

use std::{
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use tempfile::{Builder, NamedTempFile, TempDir};
use tracing::debug;

use crate::{ClaudeCode, ClaudeCodeError, ClaudeConfig};

pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

const SCRATCH_PREFIX: &str = "claude-botman-";

/// Owns a [`ClaudeCode`] plus any scratch files and directories created
/// through it. Scratch paths are removed on drop; [`ClaudeCodeContext::close`]
/// also expires idle sessions.
#[derive(Debug)]
pub struct ClaudeCodeContext {
    client: ClaudeCode,
    temp_files: Vec<NamedTempFile>,
    temp_dirs: Vec<TempDir>,
    session_max_age: Duration,
}

impl ClaudeCodeContext {
    pub fn new(config: ClaudeConfig) -> Result<Self, ClaudeCodeError> {
        Ok(Self::from_client(ClaudeCode::new(config)?))
    }

    pub fn from_client(client: ClaudeCode) -> Self {
        Self {
            client,
            temp_files: Vec::new(),
            temp_dirs: Vec::new(),
            session_max_age: DEFAULT_SESSION_MAX_AGE,
        }
    }

    pub fn session_max_age(mut self, max_age: Duration) -> Self {
        self.session_max_age = max_age;
        self
    }

    pub fn client(&self) -> &ClaudeCode {
        &self.client
    }

    /// Empty scratch file ending in `suffix` (for example `.txt`).
    pub fn create_temp_file(&mut self, suffix: &str) -> Result<PathBuf, ClaudeCodeError> {
        self.create_temp_file_with(suffix, "")
    }

    pub fn create_temp_file_with(
        &mut self,
        suffix: &str,
        contents: &str,
    ) -> Result<PathBuf, ClaudeCodeError> {
        let mut file = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(suffix)
            .tempfile()
            .map_err(ClaudeCodeError::Scratch)?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.flush())
            .map_err(ClaudeCodeError::Scratch)?;
        let path = file.path().to_path_buf();
        self.temp_files.push(file);
        Ok(path)
    }

    pub fn create_temp_dir(&mut self) -> Result<PathBuf, ClaudeCodeError> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir()
            .map_err(ClaudeCodeError::Scratch)?;
        let path = dir.path().to_path_buf();
        self.temp_dirs.push(dir);
        Ok(path)
    }

    pub fn temp_files(&self) -> Vec<&Path> {
        self.temp_files.iter().map(NamedTempFile::path).collect()
    }

    pub fn temp_dirs(&self) -> Vec<&Path> {
        self.temp_dirs.iter().map(TempDir::path).collect()
    }

    /// Removes scratch paths, expires idle sessions, and hands back the ids
    /// that were dropped.
    pub fn close(mut self) -> Vec<String> {
        let expired = self.client.cleanup_expired_sessions(self.session_max_age);
        debug!(
            files = self.temp_files.len(),
            dirs = self.temp_dirs.len(),
            expired = expired.len(),
            "closing claude context"
        );
        self.temp_files.clear();
        self.temp_dirs.clear();
        expired
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn context() -> ClaudeCodeContext {
        ClaudeCodeContext::new(ClaudeConfig::builder().build().unwrap()).unwrap()
    }

    #[test]
    fn temp_files_keep_suffix_and_vanish_on_close() {
        let mut context = context();
        let file = context.create_temp_file(".txt").unwrap();
        let seeded = context.create_temp_file_with(".md", "# notes").unwrap();
        let dir = context.create_temp_dir().unwrap();

        assert_eq!(file.extension().unwrap(), "txt");
        assert_eq!(fs::read_to_string(&seeded).unwrap(), "# notes");
        assert!(dir.is_dir());
        assert_eq!(context.temp_files(), [file.as_path(), seeded.as_path()]);
        assert_eq!(context.temp_dirs(), [dir.as_path()]);

        context.close();
        assert!(!file.exists());
        assert!(!seeded.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn close_expires_idle_sessions() {
        let context = context().session_max_age(Duration::from_secs(60));
        {
            let mut tracker = context.client().tracker();
            tracker.record("old", Path::new("/tmp"), "sonnet");
            tracker.record("fresh", Path::new("/tmp"), "sonnet");
            tracker.set_last_used(
                "old",
                std::time::SystemTime::now() - Duration::from_secs(3600),
            );
        }
        assert_eq!(context.close(), ["old"]);
    }
}
