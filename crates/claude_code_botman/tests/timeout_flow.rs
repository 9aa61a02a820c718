#[cfg(unix)]
mod unix {
    use std::{
        fs,
        time::{Duration, Instant},
    };

    use claude_code_botman::{CallOptions, ClaudeCode, ClaudeCodeError, ClaudeConfig};
    use tempfile::TempDir;

    #[tokio::test]
    async fn timeout_kills_the_call_and_leaves_sessions_alone() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let script_path = dir.path().join("fake-claude");

        let script = r#"#!/bin/sh
echo "Session ID: too-late"
exec sleep 5
"#;

        fs::write(&script_path, script).expect("write script");
        let mut perms = fs::metadata(&script_path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).expect("chmod");

        let config = ClaudeConfig::builder()
            .default_path(dir.path())
            .build()
            .expect("config");
        let client = ClaudeCode::builder()
            .config(config)
            .binary(&script_path)
            .build()
            .expect("client");

        let started = Instant::now();
        let err = client
            .call_with(
                "hello",
                CallOptions::new().timeout(Duration::from_millis(300)),
            )
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(err.is_retryable());
        match err {
            ClaudeCodeError::Timeout { timeout } => {
                assert_eq!(timeout, Duration::from_millis(300));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.sessions().is_empty());
        assert!(client.current_session().is_none());
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let config = ClaudeConfig::builder()
            .default_path(dir.path())
            .build()
            .expect("config");
        let client = ClaudeCode::builder()
            .config(config)
            .binary(dir.path().join("no-such-claude"))
            .build()
            .expect("client");

        let err = client.call("hello").await.unwrap_err();
        assert!(
            matches!(err, ClaudeCodeError::NotFound { .. }),
            "unexpected error: {err:?}"
        );
        assert!(client.health_check().await.is_err());
    }
}
