//! Path checks that run before any process is launched.

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use tracing::warn;

use crate::ClaudeCodeError;

fn path_error(path: &Path, reason: impl Into<String>) -> ClaudeCodeError {
    ClaudeCodeError::Path {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Rejects paths with NUL bytes and turns relative paths into absolute ones.
///
/// The result is normalized lexically (`.` dropped, `..` folded) and does not
/// need to exist. Parent traversal is allowed but logged.
pub fn sanitize_path(path: &Path) -> Result<PathBuf, ClaudeCodeError> {
    if path.as_os_str().is_empty() {
        return Err(path_error(path, "path is empty"));
    }
    if path.to_string_lossy().contains('\0') {
        return Err(path_error(path, "path contains a NUL byte"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        warn!(path = %path.display(), "path contains parent directory traversal");
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir()
            .map_err(|err| path_error(path, format!("cannot resolve current directory: {err}")))?;
        cwd.join(path)
    };

    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn canonical_or_normalized(path: &Path) -> Result<PathBuf, ClaudeCodeError> {
    let sanitized = sanitize_path(path)?;
    Ok(fs::canonicalize(&sanitized).unwrap_or(sanitized))
}

/// True when `path` lies inside `base` once both are resolved.
pub fn is_safe_path(path: &Path, base: &Path) -> bool {
    match (canonical_or_normalized(path), canonical_or_normalized(base)) {
        (Ok(path), Ok(base)) => path.starts_with(base),
        _ => false,
    }
}

/// Creates `path` (and parents) when missing and returns its canonical form.
pub fn ensure_directory_exists(path: &Path) -> Result<PathBuf, ClaudeCodeError> {
    let sanitized = sanitize_path(path)?;
    if sanitized.exists() && !sanitized.is_dir() {
        return Err(path_error(&sanitized, "exists but is not a directory"));
    }
    fs::create_dir_all(&sanitized)
        .map_err(|err| path_error(&sanitized, format!("cannot create directory: {err}")))?;
    fs::canonicalize(&sanitized)
        .map_err(|err| path_error(&sanitized, format!("cannot resolve directory: {err}")))
}

/// Picks the per-call directory (or the configured default) and checks it exists.
pub fn resolve_working_dir(
    requested: Option<&Path>,
    default: &Path,
) -> Result<PathBuf, ClaudeCodeError> {
    let candidate = sanitize_path(requested.unwrap_or(default))?;
    if !candidate.exists() {
        return Err(path_error(&candidate, "working directory does not exist"));
    }
    if !candidate.is_dir() {
        return Err(path_error(&candidate, "working directory is not a directory"));
    }
    fs::canonicalize(&candidate)
        .map_err(|err| path_error(&candidate, format!("cannot resolve directory: {err}")))
}

/// Loads a rules file whose text is handed to the CLI as extra system prompt.
pub fn read_rules_file(path: &Path) -> Result<String, ClaudeCodeError> {
    let path = sanitize_path(path)?;
    if !path.exists() {
        return Err(path_error(&path, "rules file does not exist"));
    }
    if !path.is_file() {
        return Err(path_error(&path, "rules file is not a regular file"));
    }
    fs::read_to_string(&path).map_err(|source| ClaudeCodeError::RulesRead { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_makes_paths_absolute() {
        let path = sanitize_path(Path::new("./test")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("test"));

        let traversal = sanitize_path(Path::new("../test")).unwrap();
        assert!(traversal.is_absolute());
        assert!(!traversal
            .components()
            .any(|c| matches!(c, Component::ParentDir)));
    }

    #[test]
    fn sanitize_rejects_nul_and_empty() {
        assert!(matches!(
            sanitize_path(Path::new("\0invalid")),
            Err(ClaudeCodeError::Path { .. })
        ));
        assert!(sanitize_path(Path::new("")).is_err());
    }

    #[test]
    fn ensure_directory_creates_missing_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("new_dir").join("nested");

        let created = ensure_directory_exists(&target).unwrap();
        assert!(created.is_dir());
        assert_eq!(created, fs::canonicalize(&target).unwrap());

        let again = ensure_directory_exists(temp.path()).unwrap();
        assert_eq!(again, fs::canonicalize(temp.path()).unwrap());
    }

    #[test]
    fn safe_path_checks_containment() {
        let temp = tempfile::tempdir().unwrap();
        let base = temp.path().join("base");
        let other = temp.path().join("other");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&other).unwrap();

        assert!(is_safe_path(&base.join("subdir"), &base));
        assert!(!is_safe_path(&other, &base));
        assert!(!is_safe_path(&base.join("..").join("other"), &base));
    }

    #[test]
    fn working_dir_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let resolved = resolve_working_dir(Some(temp.path()), Path::new("/")).unwrap();
        assert_eq!(resolved, fs::canonicalize(temp.path()).unwrap());

        let default = resolve_working_dir(None, temp.path()).unwrap();
        assert_eq!(default, resolved);

        let err = resolve_working_dir(Some(Path::new("/nonexistent/path")), temp.path())
            .unwrap_err();
        assert!(matches!(err, ClaudeCodeError::Path { .. }));
    }

    #[test]
    fn rules_file_must_exist() {
        let temp = tempfile::tempdir().unwrap();
        let rules = temp.path().join("CLAUDE.md");
        fs::write(&rules, "# Rules\n- be terse\n").unwrap();

        assert!(read_rules_file(&rules).unwrap().contains("be terse"));
        assert!(matches!(
            read_rules_file(&temp.path().join("missing.md")),
            Err(ClaudeCodeError::Path { .. })
        ));
        assert!(matches!(
            read_rules_file(temp.path()),
            Err(ClaudeCodeError::Path { .. })
        ));
    }
}
