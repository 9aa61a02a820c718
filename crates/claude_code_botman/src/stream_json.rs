use serde_json::Value;

use crate::StreamJsonLineError;

#[derive(Debug, Clone)]
pub struct StreamJsonLine {
    pub line_number: usize,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub enum StreamJsonLineOutcome {
    Ok { line: StreamJsonLine, value: Value },
    Err {
        line: StreamJsonLine,
        error: StreamJsonLineError,
    },
}

/// Decodes one JSON value per non-empty line. Bad lines are reported in place
/// instead of aborting the walk, so callers choose how strict to be.
pub fn parse_stream_json_lines(text: &str) -> Vec<StreamJsonLineOutcome> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_number = idx + 1;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }
        let line = StreamJsonLine {
            line_number,
            raw: raw.to_string(),
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => out.push(StreamJsonLineOutcome::Ok { line, value }),
            Err(err) => out.push(StreamJsonLineOutcome::Err {
                line,
                error: StreamJsonLineError {
                    line_number,
                    message: err.to_string(),
                },
            }),
        }
    }
    out
}

/// First `session_id` string carried by any event.
pub(crate) fn first_session_id(values: &[Value]) -> Option<String> {
    values
        .iter()
        .find_map(|value| value.get("session_id")?.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parser_is_tolerant_and_line_oriented() {
        let outcomes = parse_stream_json_lines("{\"k\":1}\n   \n{not-json}\r\n{\"k\":2}\n");
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], StreamJsonLineOutcome::Ok { .. }));
        match &outcomes[1] {
            StreamJsonLineOutcome::Err { line, error } => {
                assert_eq!(line.line_number, 3);
                assert_eq!(error.line_number, 3);
                assert_eq!(line.raw, "{not-json}");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(outcomes[2], StreamJsonLineOutcome::Ok { .. }));
    }

    #[test]
    fn session_id_comes_from_first_event_that_has_one() {
        let events = vec![
            json!({"type": "system"}),
            json!({"type": "assistant", "session_id": "abc"}),
            json!({"type": "result", "session_id": "def"}),
        ];
        assert_eq!(first_session_id(&events).as_deref(), Some("abc"));
        assert_eq!(first_session_id(&[]), None);
    }
}
