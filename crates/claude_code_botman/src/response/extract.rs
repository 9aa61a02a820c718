use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    FilesCreated,
    FilesModified,
    CommandsExecuted,
    Errors,
    Warnings,
    SessionId,
}

const RULES: &[(Field, &str)] = &[
    (Field::FilesCreated, r"^creat(?:ing|ed)(?:\s+file)?:?\s+(\S+)"),
    (Field::FilesCreated, r"^(?:writing|saved)\s+to:?\s+(\S+)"),
    (
        Field::FilesModified,
        r"^(?:modified|updated|editing|changed):?\s+(\S+)",
    ),
    (Field::CommandsExecuted, r"^(?:executing|running|command):\s*(.+)"),
    (Field::CommandsExecuted, r"^\$\s+(.+)"),
    (Field::Errors, r"^(?:error|failed|exception):?\s+(.+)"),
    (Field::Warnings, r"^(?:warning|warn|caution):?\s+(.+)"),
    (Field::SessionId, r"^session\s+id:\s*(\S+)"),
];

fn rules() -> &'static [(Field, Regex)] {
    static COMPILED: OnceLock<Vec<(Field, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(field, pattern)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("static extraction rule");
                (*field, regex)
            })
            .collect()
    })
}

/// Everything the line rules pulled out of one block of output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Extracted {
    pub(crate) files_created: Vec<String>,
    pub(crate) files_modified: Vec<String>,
    pub(crate) commands_executed: Vec<String>,
    pub(crate) errors: Vec<String>,
    pub(crate) warnings: Vec<String>,
    pub(crate) session_id: Option<String>,
}

impl Extracted {
    fn push(&mut self, field: Field, value: String) {
        match field {
            Field::FilesCreated => self.files_created.push(value),
            Field::FilesModified => self.files_modified.push(value),
            Field::CommandsExecuted => self.commands_executed.push(value),
            Field::Errors => self.errors.push(value),
            Field::Warnings => self.warnings.push(value),
            Field::SessionId => {
                if self.session_id.is_none() {
                    self.session_id = Some(value);
                }
            }
        }
    }

    pub(crate) fn merge(&mut self, other: Extracted) {
        self.files_created.extend(other.files_created);
        self.files_modified.extend(other.files_modified);
        self.commands_executed.extend(other.commands_executed);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        if self.session_id.is_none() {
            self.session_id = other.session_id;
        }
    }
}

/// Runs every rule against every trimmed line. A line may feed several fields.
pub(crate) fn extract(text: &str) -> Extracted {
    let mut out = Extracted::default();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        for (field, regex) in rules() {
            if let Some(value) = regex.captures(line).and_then(|caps| caps.get(1)) {
                let value = value.as_str().trim();
                if !value.is_empty() {
                    out.push(*field, value.to_string());
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_rule_compiles() {
        assert_eq!(rules().len(), RULES.len());
    }

    #[test]
    fn files_created() {
        let out = extract(
            "
            Creating hello.py
            Created file: world.txt
            Writing to test.js
            Saved to config.json
            ",
        );
        assert_eq!(
            out.files_created,
            ["hello.py", "world.txt", "test.js", "config.json"]
        );
    }

    #[test]
    fn files_modified() {
        let out = extract("Modified main.py\nUpdated: config.yaml\nEditing src/utils.py\nChanged package.json");
        assert_eq!(
            out.files_modified,
            ["main.py", "config.yaml", "src/utils.py", "package.json"]
        );
    }

    #[test]
    fn commands_keep_the_rest_of_the_line() {
        let out = extract(
            "Executing: npm install\nRunning: python setup.py build\nCommand: git add .\n$ make test",
        );
        assert_eq!(
            out.commands_executed,
            ["npm install", "python setup.py build", "git add .", "make test"]
        );
    }

    #[test]
    fn errors_and_warnings_are_case_insensitive() {
        let out = extract(
            "Error: File not found\nERROR: Compilation failed\nFailed: Network timeout\nException: Invalid syntax\nWarning: Deprecated function used\nWARN: Memory usage high\nCaution: Untested feature",
        );
        assert_eq!(
            out.errors,
            [
                "File not found",
                "Compilation failed",
                "Network timeout",
                "Invalid syntax"
            ]
        );
        assert_eq!(
            out.warnings,
            ["Deprecated function used", "Memory usage high", "Untested feature"]
        );
    }

    #[test]
    fn duplicates_are_kept_and_first_session_wins() {
        let out = extract("Error: again\nError: again\nSession ID: abc123\nsession id: zzz");
        assert_eq!(out.errors, ["again", "again"]);
        assert_eq!(out.session_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn prose_does_not_match() {
        let out = extract("Hello world\nThe build has no errors\nI created nothing");
        assert_eq!(out, Extracted::default());
    }
}
