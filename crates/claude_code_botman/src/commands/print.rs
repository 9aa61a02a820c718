use std::path::{Path, PathBuf};

use super::{
    flags::{format_flag_args, shell_quote},
    options::CallOptions,
};
use crate::ClaudeConfig;

pub(crate) const DEFAULT_BINARY: &str = "claude";

/// A fully rendered `claude -p` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaudeCommand {
    pub(crate) program: PathBuf,
    pub(crate) args: Vec<String>,
    pub(crate) prompt: String,
}

impl ClaudeCommand {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Program, flags, then the shell-quoted prompt. Suitable for logging or
    /// pasting into a shell.
    pub fn argv(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.args.len() + 2);
        out.push(self.program.to_string_lossy().into_owned());
        out.extend(self.args.iter().cloned());
        out.push(shell_quote(&self.prompt));
        out
    }

    /// Arguments handed to the process launcher. No shell is involved, so the
    /// prompt travels verbatim.
    pub fn process_args(&self) -> Vec<String> {
        let mut out = self.args.clone();
        out.push(self.prompt.clone());
        out
    }

    /// The whole invocation as one line a POSIX shell splits back into
    /// `argv()`.
    pub fn shell_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 2);
        words.push(shell_quote(&self.program.to_string_lossy()));
        words.extend(self.args.iter().map(|arg| quote_if_needed(arg)));
        words.push(shell_quote(&self.prompt));
        words.join(" ")
    }
}

fn quote_if_needed(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        arg.to_string()
    } else {
        shell_quote(arg)
    }
}

/// Renders prompts plus per-call overrides against a stored configuration.
#[derive(Clone, Debug)]
pub struct CommandBuilder<'a> {
    config: &'a ClaudeConfig,
    binary: Option<&'a Path>,
    rules: Option<&'a str>,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a ClaudeConfig) -> Self {
        Self {
            config,
            binary: None,
            rules: None,
        }
    }

    pub fn binary(mut self, binary: &'a Path) -> Self {
        self.binary = Some(binary);
        self
    }

    /// Rules file text, appended to the system prompt.
    pub fn rules(mut self, rules: Option<&'a str>) -> Self {
        self.rules = rules;
        self
    }

    pub fn build(&self, prompt: &str, options: &CallOptions) -> ClaudeCommand {
        let resolved = options.resolve(self.config);

        let mut args = vec!["-p".to_string()];
        let table = resolved.flag_table(self.rules);
        args.extend(format_flag_args(
            table.iter().map(|(name, value)| (name.as_str(), value)),
        ));

        ClaudeCommand {
            program: self
                .binary
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY)),
            args,
            prompt: prompt.to_string(),
        }
    }
}

/// `build(prompt, config, overrides)` for the default `claude` binary.
pub fn build_command(prompt: &str, config: &ClaudeConfig, options: &CallOptions) -> Vec<String> {
    CommandBuilder::new(config).build(prompt, options).argv()
}
