use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use super::flags::{flag_name, FlagValue};
use crate::{ClaudeConfig, InputFormat, OutputFormat, PermissionMode};

/// Per-call overrides layered over a [`ClaudeConfig`].
///
/// Every field that is set wins over the stored configuration; unset fields
/// inherit it. List fields replace the configured list rather than extending
/// it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    pub(crate) model: Option<String>,
    pub(crate) path: Option<PathBuf>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) max_turns: Option<u32>,
    pub(crate) output_format: Option<OutputFormat>,
    pub(crate) input_format: Option<InputFormat>,
    pub(crate) permission_mode: Option<PermissionMode>,
    pub(crate) permission_prompt_tool: Option<String>,
    pub(crate) append_system_prompt: Option<String>,
    pub(crate) verbose: Option<bool>,
    pub(crate) dangerously_skip_permissions: Option<bool>,
    pub(crate) continue_session: Option<bool>,
    pub(crate) resume: Option<String>,
    pub(crate) allowed_tools: Option<Vec<String>>,
    pub(crate) disallowed_tools: Option<Vec<String>>,
    pub(crate) add_dirs: Option<Vec<PathBuf>>,
    pub(crate) extra_flags: Vec<(String, FlagValue)>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Working directory for this call only.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn input_format(mut self, format: InputFormat) -> Self {
        self.input_format = Some(format);
        self
    }

    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = Some(mode);
        self
    }

    pub fn permission_prompt_tool(mut self, tool: impl Into<String>) -> Self {
        self.permission_prompt_tool = Some(tool.into());
        self
    }

    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_system_prompt = Some(prompt.into());
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = Some(enabled);
        self
    }

    pub fn dangerously_skip_permissions(mut self, enabled: bool) -> Self {
        self.dangerously_skip_permissions = Some(enabled);
        self
    }

    /// Emits `--continue` to pick up the most recent conversation.
    pub fn continue_session(mut self, enabled: bool) -> Self {
        self.continue_session = Some(enabled);
        self
    }

    /// Emits `--resume <session_id>`.
    pub fn resume(mut self, session_id: impl Into<String>) -> Self {
        self.resume = Some(session_id.into());
        self
    }

    pub fn allowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn disallowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.disallowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn add_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.add_dirs = Some(dirs.into_iter().map(Into::into).collect());
        self
    }

    /// Any other CLI option, rendered with the generic `snake_case` ->
    /// `--kebab-case` rule after the typed options. A name that renders to
    /// the same token as a typed option (or `--model`) replaces that option
    /// in place.
    pub fn flag(mut self, name: impl Into<String>, value: impl Into<FlagValue>) -> Self {
        let name = name.into();
        let value = value.into();
        let token = flag_name(&name);
        match self
            .extra_flags
            .iter_mut()
            .find(|(existing, _)| flag_name(existing) == token)
        {
            Some(slot) => slot.1 = value,
            None => self.extra_flags.push((name, value)),
        }
        self
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn resume_target(&self) -> Option<&str> {
        self.resume.as_deref()
    }

    pub fn continues_session(&self) -> bool {
        self.continue_session.unwrap_or(false)
    }

    pub(crate) fn resolve(&self, config: &ClaudeConfig) -> ResolvedOptions {
        ResolvedOptions {
            model: self.model.clone().unwrap_or_else(|| config.model.clone()),
            timeout: self.timeout.unwrap_or(config.timeout),
            max_turns: self.max_turns.or(config.max_turns),
            output_format: self.output_format.unwrap_or(config.output_format),
            input_format: self.input_format.unwrap_or(config.input_format),
            permission_mode: self.permission_mode.unwrap_or(config.permission_mode),
            permission_prompt_tool: self
                .permission_prompt_tool
                .clone()
                .or_else(|| config.permission_prompt_tool.clone()),
            append_system_prompt: self
                .append_system_prompt
                .clone()
                .or_else(|| config.append_system_prompt.clone()),
            verbose: self.verbose.unwrap_or(config.verbose),
            dangerously_skip_permissions: self
                .dangerously_skip_permissions
                .unwrap_or(config.dangerously_skip_permissions),
            continue_session: self.continue_session.unwrap_or(false),
            resume: self.resume.clone(),
            allowed_tools: self
                .allowed_tools
                .clone()
                .unwrap_or_else(|| config.allowed_tools.clone()),
            disallowed_tools: self
                .disallowed_tools
                .clone()
                .unwrap_or_else(|| config.disallowed_tools.clone()),
            add_dirs: self
                .add_dirs
                .clone()
                .unwrap_or_else(|| config.add_dirs.clone()),
            extra_flags: self.extra_flags.clone(),
        }
    }
}

/// Configuration and overrides collapsed into the values one call uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub(crate) model: String,
    pub(crate) timeout: Duration,
    pub(crate) max_turns: Option<u32>,
    pub(crate) output_format: OutputFormat,
    pub(crate) input_format: InputFormat,
    pub(crate) permission_mode: PermissionMode,
    pub(crate) permission_prompt_tool: Option<String>,
    pub(crate) append_system_prompt: Option<String>,
    pub(crate) verbose: bool,
    pub(crate) dangerously_skip_permissions: bool,
    pub(crate) continue_session: bool,
    pub(crate) resume: Option<String>,
    pub(crate) allowed_tools: Vec<String>,
    pub(crate) disallowed_tools: Vec<String>,
    pub(crate) add_dirs: Vec<PathBuf>,
    pub(crate) extra_flags: Vec<(String, FlagValue)>,
}

impl ResolvedOptions {
    /// Named options in emission order, starting with `model`. `rules` is
    /// appended to the system prompt text. Each rendered flag token appears
    /// in at most one entry.
    pub(crate) fn flag_table(&self, rules: Option<&str>) -> Vec<(String, FlagValue)> {
        let mut table: Vec<(String, FlagValue)> = Vec::new();
        let mut push = |name: &str, value: FlagValue| table.push((name.to_string(), value));

        push("model", self.model.as_str().into());

        if self.permission_mode != PermissionMode::Prompt {
            push("permission_mode", self.permission_mode.as_str().into());
        }
        push("output_format", self.output_format.as_str().into());
        if self.input_format != InputFormat::Text {
            push("input_format", self.input_format.as_str().into());
        }
        if let Some(turns) = self.max_turns {
            push("max_turns", turns.into());
        }
        if let Some(system) = join_system_prompt(self.append_system_prompt.as_deref(), rules) {
            push("append_system_prompt", system.into());
        }
        if let Some(tool) = self.permission_prompt_tool.as_deref() {
            push("permission_prompt_tool", tool.into());
        }
        push("continue", self.continue_session.into());
        if let Some(id) = self.resume.as_deref() {
            push("resume", id.into());
        }
        push("verbose", self.verbose.into());
        push(
            "dangerously_skip_permissions",
            self.dangerously_skip_permissions.into(),
        );
        push("allowedTools", self.allowed_tools.clone().into());
        push("disallowedTools", self.disallowed_tools.clone().into());
        push(
            "add_dir",
            FlagValue::List(
                self.add_dirs
                    .iter()
                    .map(|dir| dir.to_string_lossy().into_owned())
                    .collect(),
            ),
        );

        for (name, value) in &self.extra_flags {
            let token = flag_name(name);
            match table.iter_mut().find(|(typed, _)| flag_name(typed) == token) {
                Some(slot) => slot.1 = value.clone(),
                None => table.push((name.clone(), value.clone())),
            }
        }
        table
    }
}

fn join_system_prompt(configured: Option<&str>, rules: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [configured, rules]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClaudeConfig {
        ClaudeConfig::builder()
            .model("claude-sonnet-4-20250514")
            .allowed_tools(["Read"])
            .max_turns(3)
            .verbose(true)
            .build()
            .unwrap()
    }

    #[test]
    fn overrides_win_for_present_fields() {
        let resolved = CallOptions::new()
            .model("claude-opus-4-20250514")
            .verbose(false)
            .allowed_tools(["Edit", "Write"])
            .resolve(&config());

        assert_eq!(resolved.model, "claude-opus-4-20250514");
        assert!(!resolved.verbose);
        assert_eq!(resolved.allowed_tools, ["Edit", "Write"]);
        assert_eq!(resolved.max_turns, Some(3));
    }

    #[test]
    fn empty_overrides_inherit_everything() {
        let config = config();
        let resolved = CallOptions::new().resolve(&config);
        assert_eq!(resolved.model, config.model());
        assert_eq!(resolved.timeout, config.timeout());
        assert!(resolved.verbose);
        assert!(!resolved.continue_session);
        assert!(resolved.resume.is_none());
    }

    #[test]
    fn extra_flags_replace_by_name() {
        let options = CallOptions::new()
            .flag("debug", true)
            .flag("fallback_model", "haiku")
            .flag("debug", false);
        assert_eq!(
            options.extra_flags,
            vec![
                ("debug".to_string(), FlagValue::Switch(false)),
                ("fallback_model".to_string(), FlagValue::from("haiku")),
            ]
        );
    }

    #[test]
    fn extra_flags_match_on_rendered_token() {
        let options = CallOptions::new()
            .flag("max_turns", 3u32)
            .flag("max-turns", 4u32);
        assert_eq!(
            options.extra_flags,
            vec![("max_turns".to_string(), FlagValue::from(4u32))]
        );
    }

    #[test]
    fn extra_flags_take_over_typed_entries() {
        let table = CallOptions::new()
            .max_turns(5)
            .flag("verbose", false)
            .flag("model", "opus")
            .flag("max_turns", 7u32)
            .flag("fallback_model", "haiku")
            .resolve(&config())
            .flag_table(None);

        let value = |name: &str| {
            table
                .iter()
                .filter(|(entry, _)| flag_name(entry) == flag_name(name))
                .map(|(_, value)| value.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(table[0], ("model".to_string(), FlagValue::from("opus")));
        assert_eq!(value("model"), [FlagValue::from("opus")]);
        assert_eq!(value("max_turns"), [FlagValue::from(7u32)]);
        assert_eq!(value("verbose"), [FlagValue::Switch(false)]);
        assert_eq!(
            table.last(),
            Some(&("fallback_model".to_string(), FlagValue::from("haiku")))
        );
    }

    #[test]
    fn system_prompt_parts_are_joined() {
        assert_eq!(join_system_prompt(None, None), None);
        assert_eq!(
            join_system_prompt(Some("be brief"), Some("# Rules\n")).as_deref(),
            Some("be brief\n\n# Rules")
        );
        assert_eq!(
            join_system_prompt(None, Some("  ")),
            None,
            "blank rules add nothing"
        );
    }
}
