use std::time::Duration;

/// Arbitrary argv for the `claude` binary outside the `-p` flow, such as the
/// `--version` probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaudeCommandRequest {
    pub(crate) args: Vec<String>,
    pub(crate) timeout: Option<Duration>,
}

impl ClaudeCommandRequest {
    pub fn new(args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn version() -> Self {
        Self::new(["--version"])
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }
}
