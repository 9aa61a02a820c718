use std::{str::FromStr, time::Duration};

use crate::{ClaudeCodeError, ClaudeConfig};

pub const ENV_PREFIX: &str = "CLAUDE_";

const API_KEY_FALLBACK_ENV: &str = "ANTHROPIC_API_KEY";

pub(super) fn from_lookup<F>(lookup: F) -> Result<ClaudeConfig, ClaudeCodeError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| {
        lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
    };

    let mut builder = ClaudeConfig::builder();

    if let Some(model) = var("MODEL") {
        builder = builder.model(model);
    }
    if let Some(key) = var("API_KEY").or_else(|| lookup(API_KEY_FALLBACK_ENV)) {
        builder = builder.api_key(key);
    }
    if let Some(path) = var("DEFAULT_PATH") {
        builder = builder.default_path(path);
    }
    if let Some(raw) = var("TIMEOUT") {
        let secs: u64 = parse_number("TIMEOUT", &raw)?;
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(raw) = var("MAX_TURNS") {
        builder = builder.max_turns(parse_number("MAX_TURNS", &raw)?);
    }
    if let Some(raw) = var("OUTPUT_FORMAT") {
        builder = builder.output_format(raw.parse()?);
    }
    if let Some(raw) = var("INPUT_FORMAT") {
        builder = builder.input_format(raw.parse()?);
    }
    if let Some(raw) = var("PERMISSION_MODE") {
        builder = builder.permission_mode(raw.parse()?);
    }
    if let Some(tool) = var("PERMISSION_PROMPT_TOOL") {
        builder = builder.permission_prompt_tool(tool);
    }
    if let Some(raw) = var("ALLOWED_TOOLS") {
        builder = builder.allowed_tools(split_list(&raw));
    }
    if let Some(raw) = var("DISALLOWED_TOOLS") {
        builder = builder.disallowed_tools(split_list(&raw));
    }
    if let Some(raw) = var("ADD_DIR") {
        builder = builder.add_dirs(split_list(&raw));
    }
    if let Some(prompt) = var("APPEND_SYSTEM_PROMPT") {
        builder = builder.append_system_prompt(prompt);
    }
    if let Some(raw) = var("VERBOSE") {
        builder = builder.verbose(parse_bool("VERBOSE", &raw)?);
    }
    if let Some(raw) = var("DANGEROUSLY_SKIP_PERMISSIONS") {
        builder = builder.dangerously_skip_permissions(parse_bool(
            "DANGEROUSLY_SKIP_PERMISSIONS",
            &raw,
        )?);
    }
    if let Some(raw) = var("AUTO_CONTINUE") {
        builder = builder.auto_continue(parse_bool("AUTO_CONTINUE", &raw)?);
    }
    if let Some(raw) = var("SAVE_SESSIONS") {
        builder = builder.save_sessions(parse_bool("SAVE_SESSIONS", &raw)?);
    }
    if let Some(path) = var("RULES") {
        builder = builder.rules(path);
    }

    builder.build()
}

// Tool patterns such as `Bash(git log:*)` never contain commas, so a plain
// split is enough.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ClaudeCodeError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_var(name, raw, "a boolean")),
    }
}

fn parse_number<T: FromStr>(name: &str, raw: &str) -> Result<T, ClaudeCodeError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid_var(name, raw, "a non-negative integer"))
}

fn invalid_var(name: &str, raw: &str, expected: &str) -> ClaudeCodeError {
    ClaudeCodeError::InvalidConfig(format!(
        "{ENV_PREFIX}{name}=`{raw}` is not {expected}"
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{OutputFormat, PermissionMode};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = from_lookup(lookup(&[
            ("CLAUDE_MODEL", "claude-sonnet-4-20250514"),
            ("CLAUDE_VERBOSE", "true"),
            ("CLAUDE_PERMISSION_MODE", "allow"),
            ("CLAUDE_OUTPUT_FORMAT", "json"),
            ("CLAUDE_ALLOWED_TOOLS", "Read, Bash(git log:*)"),
            ("CLAUDE_MAX_TURNS", "5"),
            ("CLAUDE_TIMEOUT", "45"),
        ]))
        .unwrap();

        assert_eq!(config.model(), "claude-sonnet-4-20250514");
        assert!(config.verbose());
        assert_eq!(config.permission_mode(), PermissionMode::Allow);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert_eq!(config.allowed_tools(), ["Read", "Bash(git log:*)"]);
        assert_eq!(config.max_turns(), Some(5));
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn api_key_falls_back_to_anthropic_variable() {
        let config = from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.api_key(), Some("sk-test"));

        let config = from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("CLAUDE_API_KEY", "sk-override"),
        ]))
        .unwrap();
        assert_eq!(config.api_key(), Some("sk-override"));
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_lookup(|_| None).unwrap();
        assert_eq!(config, ClaudeConfig::builder().build().unwrap());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = from_lookup(lookup(&[("CLAUDE_MAX_TURNS", "many")])).unwrap_err();
        assert!(err.to_string().contains("CLAUDE_MAX_TURNS"));

        let err = from_lookup(lookup(&[("CLAUDE_VERBOSE", "sometimes")])).unwrap_err();
        assert!(err.to_string().contains("CLAUDE_VERBOSE"));

        assert!(from_lookup(lookup(&[("CLAUDE_PERMISSION_MODE", "always")])).is_err());
    }
}
