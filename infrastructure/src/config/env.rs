//! API key resolution and `.env` file loading
//!
//! A model's `api_key` field may hold a literal secret or an `env:VAR`
//! reference. References are resolved here, at provider-call time, so a
//! missing variable degrades that one model instead of failing the
//! whole config load.
//!
//! Keys may also live in `.env` files; those are folded into the
//! process environment at startup, with shell variables taking
//! precedence over file values.

use std::path::{Path, PathBuf};

/// Resolve a configured api_key value to the actual secret.
///
/// Returns `None` when the value is an `env:` reference to a variable
/// that is unset or empty.
pub fn resolve_api_key(raw: &str) -> Option<String> {
    match raw.strip_prefix("env:") {
        Some(var) => std::env::var(var.trim()).ok().filter(|v| !v.is_empty()),
        None => Some(raw.to_string()),
    }
}

/// Locations checked for a `.env` file, in load order
pub fn env_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".env"));
    }
    if let Some(config) = dirs::config_dir() {
        candidates.push(config.join("roundtable").join(".env"));
    }
    candidates
}

/// Load every `.env` file that exists, returning the paths loaded.
///
/// Variables already present in the process environment keep their
/// values, so the shell always wins over a file and earlier files win
/// over later ones.
pub fn load_env_files() -> Vec<PathBuf> {
    env_file_candidates()
        .into_iter()
        .filter(|path| path.exists() && load_env_file(path))
        .collect()
}

fn load_env_file(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

const EXAMPLE_ENV: &str = "\
# API keys for roundtable models.
# Variables already set in the shell take precedence over this file.
OPENAI_API_KEY=
ANTHROPIC_API_KEY=
GOOGLE_API_KEY=
";

/// Write an example `.env` file and return its path.
///
/// Defaults to `./.env`; refuses to overwrite an existing file.
pub fn create_example_env_file(path: Option<PathBuf>) -> std::io::Result<PathBuf> {
    let path = path.unwrap_or_else(|| PathBuf::from(".env"));
    if path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        ));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, EXAMPLE_ENV)?;
    Ok(path)
}

/// Mask a secret for status display: a short prefix, the rest elided
pub fn mask_key(value: &str) -> String {
    if value.chars().count() > 8 {
        let prefix: String = value.chars().take(8).collect();
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_key_passes_through() {
        assert_eq!(resolve_api_key("sk-abc123"), Some("sk-abc123".to_string()));
    }

    #[test]
    fn test_env_reference_resolves() {
        // SAFETY: test-local variable name, no concurrent reader cares
        unsafe { std::env::set_var("ROUNDTABLE_TEST_KEY_SET", "secret") };
        assert_eq!(
            resolve_api_key("env:ROUNDTABLE_TEST_KEY_SET"),
            Some("secret".to_string())
        );
    }

    #[test]
    fn test_unset_env_reference_is_none() {
        assert_eq!(resolve_api_key("env:ROUNDTABLE_TEST_KEY_UNSET"), None);
    }

    #[test]
    fn test_env_file_feeds_resolve_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ROUNDTABLE_TEST_DOTENV_KEY=sk-from-file\n").unwrap();

        assert!(load_env_file(&path));
        assert_eq!(
            resolve_api_key("env:ROUNDTABLE_TEST_DOTENV_KEY"),
            Some("sk-from-file".to_string())
        );
    }

    #[test]
    fn test_shell_variable_wins_over_env_file() {
        // SAFETY: test-local variable name, no concurrent reader cares
        unsafe { std::env::set_var("ROUNDTABLE_TEST_DOTENV_SHELL", "from-shell") };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ROUNDTABLE_TEST_DOTENV_SHELL=from-file\n").unwrap();

        assert!(load_env_file(&path));
        assert_eq!(
            std::env::var("ROUNDTABLE_TEST_DOTENV_SHELL").unwrap(),
            "from-shell"
        );
    }

    #[test]
    fn test_create_example_env_file_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        let created = create_example_env_file(Some(path.clone())).unwrap();
        let contents = std::fs::read_to_string(&created).unwrap();
        assert!(contents.contains("OPENAI_API_KEY="));
        assert!(contents.contains("ANTHROPIC_API_KEY="));

        let err = create_example_env_file(Some(path)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_mask_key_shows_only_prefix() {
        assert_eq!(mask_key("sk-1234567890abcdef"), "sk-12345...");
        assert_eq!(mask_key("short"), "***");
    }
}
