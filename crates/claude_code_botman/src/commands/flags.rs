/// Value attached to a named CLI option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagValue {
    /// Emits `--name` when true, nothing when false.
    Switch(bool),
    /// Emits `--name <value>`.
    Value(String),
    /// Emits `--name <item>` once per item, in order.
    List(Vec<String>),
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Switch(value)
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::Value(value)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Value(value.to_string())
    }
}

impl From<u32> for FlagValue {
    fn from(value: u32) -> Self {
        FlagValue::Value(value.to_string())
    }
}

impl From<u64> for FlagValue {
    fn from(value: u64) -> Self {
        FlagValue::Value(value.to_string())
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(value: Vec<String>) -> Self {
        FlagValue::List(value)
    }
}

/// `max_turns` -> `--max-turns`. Names without underscores keep their casing
/// (`allowedTools` -> `--allowedTools`).
pub fn flag_name(name: &str) -> String {
    format!("--{}", name.trim_start_matches('-').replace('_', "-"))
}

/// Renders `(name, value)` pairs into argv tokens, preserving pair order.
pub fn format_flag_args<'a, I>(flags: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a FlagValue)>,
{
    let mut out = Vec::new();
    for (name, value) in flags {
        match value {
            FlagValue::Switch(true) => out.push(flag_name(name)),
            FlagValue::Switch(false) => {}
            FlagValue::Value(value) => {
                out.push(flag_name(name));
                out.push(value.clone());
            }
            FlagValue::List(items) => {
                let flag = flag_name(name);
                for item in items {
                    out.push(flag.clone());
                    out.push(item.clone());
                }
            }
        }
    }
    out
}

/// Wraps `arg` in single quotes so a POSIX shell reads it back unchanged.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r#"'"'"'"#))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_names_are_kebab_case() {
        assert_eq!(flag_name("max_turns"), "--max-turns");
        assert_eq!(flag_name("output_format"), "--output-format");
        assert_eq!(flag_name("allowedTools"), "--allowedTools");
        assert_eq!(flag_name("--verbose"), "--verbose");
    }

    #[test]
    fn formats_switches_values_and_lists() {
        let flags = [
            ("verbose", FlagValue::Switch(true)),
            ("debug", FlagValue::Switch(false)),
            ("max_turns", FlagValue::from(5u32)),
            (
                "files",
                FlagValue::List(vec!["file1.py".to_string(), "file2.py".to_string()]),
            ),
        ];
        let args = format_flag_args(flags.iter().map(|(name, value)| (*name, value)));
        assert_eq!(
            args,
            [
                "--verbose",
                "--max-turns",
                "5",
                "--files",
                "file1.py",
                "--files",
                "file2.py"
            ]
        );
    }

    #[test]
    fn shell_quote_wraps_and_escapes() {
        assert_eq!(shell_quote("hello"), "'hello'");
        assert_eq!(shell_quote("hello world"), "'hello world'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote(""), "''");
    }
}
