use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::ClaudeCodeError;

/// Shape of what `claude --print` writes to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    /// A single JSON document.
    Json,
    /// Newline-delimited JSON events.
    StreamJson,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::StreamJson => "stream-json",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    #[default]
    Text,
    StreamJson,
}

impl InputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            InputFormat::Text => "text",
            InputFormat::StreamJson => "stream-json",
        }
    }
}

/// Policy the CLI applies before running tools.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionMode {
    /// Ask before each action (CLI default, never emitted as a flag).
    #[default]
    Prompt,
    Allow,
    Deny,
    /// Describe the actions without executing them.
    Plan,
}

impl PermissionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Prompt => "prompt",
            PermissionMode::Allow => "allow",
            PermissionMode::Deny => "deny",
            PermissionMode::Plan => "plan",
        }
    }
}

macro_rules! str_enum_impls {
    ($ty:ty, $what:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ClaudeCodeError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let wanted = raw.trim().to_ascii_lowercase();
                [$($variant),+]
                    .into_iter()
                    .find(|candidate: &$ty| candidate.as_str() == wanted)
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = [$($variant),+]
                            .into_iter()
                            .map(|candidate: $ty| candidate.as_str())
                            .collect();
                        ClaudeCodeError::InvalidConfig(format!(
                            "unknown {} `{}` (expected one of: {})",
                            $what,
                            raw,
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

str_enum_impls!(
    OutputFormat,
    "output format",
    [OutputFormat::Text, OutputFormat::Json, OutputFormat::StreamJson]
);
str_enum_impls!(
    InputFormat,
    "input format",
    [InputFormat::Text, InputFormat::StreamJson]
);
str_enum_impls!(
    PermissionMode,
    "permission mode",
    [
        PermissionMode::Prompt,
        PermissionMode::Allow,
        PermissionMode::Deny,
        PermissionMode::Plan,
    ]
);
