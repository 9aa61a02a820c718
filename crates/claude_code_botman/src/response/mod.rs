//! Turns captured CLI output into a [`ClaudeResponse`].
//!
//! Decoding follows the declared [`OutputFormat`]. Independently of the
//! format, a table of line rules pulls out created and modified files,
//! executed commands, errors, warnings and the session id.

mod extract;

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use serde_json::{json, Map, Value};

use crate::{
    stream_json::{first_session_id, parse_stream_json_lines, StreamJsonLineOutcome},
    ClaudeCodeError, OutputFormat,
};

use extract::{extract, Extracted};

const FRAGMENT_LIMIT: usize = 120;

/// Structured view of one CLI invocation. Read-only once built.
#[derive(Clone)]
pub struct ClaudeResponse {
    raw_output: String,
    exit_code: i32,
    stderr: String,
    output_format: OutputFormat,
    parsed_content: Value,
    extracted: Extracted,
    timestamp: SystemTime,
}

/// Builds a response from captured process output.
///
/// `json` output must be one JSON document and `stream-json` output one
/// document per non-empty line; anything else is a
/// [`ClaudeCodeError::ResponseParse`]. Text output never fails.
pub fn translate(
    stdout: &str,
    exit_code: i32,
    stderr: &str,
    format: OutputFormat,
) -> Result<ClaudeResponse, ClaudeCodeError> {
    let (parsed_content, extracted) = match format {
        OutputFormat::Text => (json!({ "text": stdout }), extract(stdout)),
        OutputFormat::Json => parse_json(stdout)?,
        OutputFormat::StreamJson => parse_stream(stdout)?,
    };

    Ok(ClaudeResponse {
        raw_output: stdout.to_string(),
        exit_code,
        stderr: stderr.to_string(),
        output_format: format,
        parsed_content,
        extracted,
        timestamp: SystemTime::now(),
    })
}

fn parse_json(stdout: &str) -> Result<(Value, Extracted), ClaudeCodeError> {
    let value: Value =
        serde_json::from_str(stdout.trim()).map_err(|err| ClaudeCodeError::ResponseParse {
            format: OutputFormat::Json,
            fragment: fragment(stdout),
            message: err.to_string(),
        })?;

    let mut extracted = match value.get("result").and_then(Value::as_str) {
        Some(result) => extract(result),
        None => extract(stdout),
    };
    if extracted.session_id.is_none() {
        extracted.session_id = value
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    Ok((value, extracted))
}

fn parse_stream(stdout: &str) -> Result<(Value, Extracted), ClaudeCodeError> {
    let mut events = Vec::new();
    for outcome in parse_stream_json_lines(stdout) {
        match outcome {
            StreamJsonLineOutcome::Ok { value, .. } => events.push(value),
            StreamJsonLineOutcome::Err { line, error } => {
                return Err(ClaudeCodeError::ResponseParse {
                    format: OutputFormat::StreamJson,
                    fragment: fragment(&line.raw),
                    message: error.to_string(),
                });
            }
        }
    }

    let mut extracted = Extracted::default();
    for result in events
        .iter()
        .filter_map(|event| event.get("result").and_then(Value::as_str))
    {
        extracted.merge(extract(result));
    }
    if extracted.session_id.is_none() {
        extracted.session_id = first_session_id(&events);
    }

    Ok((json!({ "stream_results": events }), extracted))
}

fn fragment(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(FRAGMENT_LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl ClaudeResponse {
    /// Exit code zero and no extracted errors.
    pub fn success(&self) -> bool {
        self.exit_success() && !self.has_errors()
    }

    pub fn exit_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn has_errors(&self) -> bool {
        !self.extracted.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.extracted.warnings.is_empty()
    }

    /// Raw stdout, verbatim.
    pub fn text(&self) -> &str {
        &self.raw_output
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn parsed_content(&self) -> &Value {
        &self.parsed_content
    }

    /// Decoded stream-json events, empty for other formats.
    pub fn stream_results(&self) -> &[Value] {
        self.parsed_content
            .get("stream_results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn files_created(&self) -> &[String] {
        &self.extracted.files_created
    }

    pub fn files_modified(&self) -> &[String] {
        &self.extracted.files_modified
    }

    pub fn commands_executed(&self) -> &[String] {
        &self.extracted.commands_executed
    }

    pub fn errors(&self) -> &[String] {
        &self.extracted.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.extracted.warnings
    }

    pub fn session_id(&self) -> Option<&str> {
        self.extracted.session_id.as_deref()
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    pub fn to_value(&self) -> Value {
        let timestamp = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        let mut map = Map::new();
        map.insert("raw_output".into(), Value::from(self.raw_output.as_str()));
        map.insert("exit_code".into(), Value::from(self.exit_code));
        map.insert("stderr".into(), Value::from(self.stderr.as_str()));
        map.insert("timestamp".into(), Value::from(timestamp));
        map.insert("parsed_content".into(), self.parsed_content.clone());
        map.insert("files_created".into(), Value::from(self.files_created()));
        map.insert("files_modified".into(), Value::from(self.files_modified()));
        map.insert(
            "commands_executed".into(),
            Value::from(self.commands_executed()),
        );
        map.insert("errors".into(), Value::from(self.errors()));
        map.insert("warnings".into(), Value::from(self.warnings()));
        map.insert(
            "session_id".into(),
            self.session_id().map_or(Value::Null, Value::from),
        );
        map.insert("success".into(), Value::from(self.success()));
        Value::Object(map)
    }
}

impl fmt::Display for ClaudeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_output)
    }
}

impl fmt::Debug for ClaudeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeResponse")
            .field("success", &self.success())
            .field("exit_code", &self.exit_code)
            .field("output_format", &self.output_format)
            .field("session_id", &self.session_id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_succeeds() {
        let response = translate("Hello", 0, "", OutputFormat::Text).unwrap();
        assert!(response.success());
        assert_eq!(response.parsed_content(), &json!({"text": "Hello"}));
        assert_eq!(response.to_string(), "Hello");
        assert!(response.stream_results().is_empty());
    }

    #[test]
    fn json_document_becomes_parsed_content() {
        let response = translate(r#"{"a":1}"#, 0, "", OutputFormat::Json).unwrap();
        assert_eq!(response.parsed_content(), &json!({"a": 1}));
        assert!(response.success());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = translate("not json {", 0, "", OutputFormat::Json).unwrap_err();
        match err {
            ClaudeCodeError::ResponseParse {
                format, fragment, ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(fragment, "not json {");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn json_result_text_is_scanned_and_session_id_falls_back() {
        let stdout = r#"{"type":"result","result":"Created file: app.rs\nWarning: slow","session_id":"sess-9"}"#;
        let response = translate(stdout, 0, "", OutputFormat::Json).unwrap();
        assert_eq!(response.files_created(), ["app.rs"]);
        assert_eq!(response.warnings(), ["slow"]);
        assert_eq!(response.session_id(), Some("sess-9"));
    }

    #[test]
    fn extracted_error_makes_response_unsuccessful() {
        let response = translate("Error: disk full", 0, "", OutputFormat::Text).unwrap();
        assert!(!response.success());
        assert!(response.exit_success());
        assert_eq!(response.errors(), ["disk full"]);
    }

    #[test]
    fn nonzero_exit_is_unsuccessful() {
        let response = translate("", 1, "Command failed", OutputFormat::Text).unwrap();
        assert!(!response.success());
        assert_eq!(response.stderr(), "Command failed");
    }

    #[test]
    fn stream_json_collects_events() {
        let stdout = "{\"type\":\"system\",\"session_id\":\"s1\"}\n\n{\"type\":\"result\",\"result\":\"Modified: lib.rs\"}\n";
        let response = translate(stdout, 0, "", OutputFormat::StreamJson).unwrap();
        assert_eq!(response.stream_results().len(), 2);
        assert_eq!(response.session_id(), Some("s1"));
        assert_eq!(response.files_modified(), ["lib.rs"]);
    }

    #[test]
    fn stream_json_bad_line_fails_whole_parse() {
        let err = translate("{\"ok\":true}\n{broken\n", 0, "", OutputFormat::StreamJson)
            .unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("line 2"), "{rendered}");
        assert!(rendered.contains("{broken"), "{rendered}");
    }

    #[test]
    fn to_value_carries_every_field() {
        let response = translate(
            "Created file: test.py\nSession ID: abc123",
            0,
            "",
            OutputFormat::Text,
        )
        .unwrap();
        let value = response.to_value();
        assert_eq!(value["exit_code"], 0);
        assert_eq!(value["files_created"], json!(["test.py"]));
        assert_eq!(value["session_id"], "abc123");
        assert_eq!(value["success"], true);
        assert!(value["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn debug_shows_status_not_output() {
        let response = translate("secret output", 2, "", OutputFormat::Text).unwrap();
        let debug = format!("{response:?}");
        assert!(debug.contains("success: false"));
        assert!(debug.contains("exit_code: 2"));
        assert!(!debug.contains("secret output"));
    }

    #[test]
    fn long_fragments_are_truncated() {
        let long = "x".repeat(500);
        assert_eq!(fragment(&long).len(), FRAGMENT_LIMIT + 3);
    }
}
