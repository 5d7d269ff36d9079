//! Discovery API app-token resolution.
//!
//! Precedence: explicit value > `SOCRATA_APP_TOKEN` > secrets file. The
//! resolved token is handed to the discovery client at construction; nothing
//! downstream reads the environment.
//!
//! The secrets file is either a JSON object or a legacy `key=value` document:
//!
//! ```text
//! {"AppToken": "abc123"}
//!
//! # legacy form
//! AppToken=abc123
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::default_config_dir;

pub const APP_TOKEN_ENV: &str = "SOCRATA_APP_TOKEN";

const SECRETS_FILE_NAME: &str = "secrets.json";

/// JSON keys checked in order; the first non-empty value wins.
const JSON_TOKEN_KEYS: &[&str] = &["AppToken", "APIKeyID", "APIKeyId", "api_key", "token"];

/// Keys recognized in the legacy `key=value` form.
const LEGACY_TOKEN_KEYS: &[&str] = &["AppToken", "APIKeyID"];

/// Where a token came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Explicit,
    Environment,
    SecretsFile(PathBuf),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "command line"),
            Self::Environment => write!(f, "{}", APP_TOKEN_ENV),
            Self::SecretsFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A resolved app token.
#[derive(Clone, PartialEq, Eq)]
pub struct AppToken {
    pub value: String,
    pub source: TokenSource,
}

// Keeps the secret out of logs.
impl fmt::Debug for AppToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppToken")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Returns `~/.config/catalogo/secrets.json` (platform equivalent).
pub fn default_secrets_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(SECRETS_FILE_NAME))
}

/// Resolves the app token from the explicit value, the process environment
/// and the secrets file, in that order.
///
/// A missing token is not an error; it is logged as a warning.
pub fn resolve_app_token(explicit: Option<&str>, secrets_path: Option<&Path>) -> Option<AppToken> {
    let env_value = std::env::var(APP_TOKEN_ENV).ok();
    let token = resolve_app_token_from(explicit, env_value.as_deref(), secrets_path);
    match &token {
        Some(token) => tracing::info!(source = %token.source, "Using X-App-Token"),
        None => tracing::warn!(
            "No Socrata app token found; the Discovery API may throttle or reject requests"
        ),
    }
    token
}

/// Same as [`resolve_app_token`] with the environment value supplied by the
/// caller.
pub fn resolve_app_token_from(
    explicit: Option<&str>,
    env_value: Option<&str>,
    secrets_path: Option<&Path>,
) -> Option<AppToken> {
    if let Some(value) = non_empty(explicit) {
        return Some(AppToken {
            value,
            source: TokenSource::Explicit,
        });
    }
    if let Some(value) = non_empty(env_value) {
        return Some(AppToken {
            value,
            source: TokenSource::Environment,
        });
    }
    let path = secrets_path?;
    read_secrets_token(path).map(|value| AppToken {
        value,
        source: TokenSource::SecretsFile(path.to_path_buf()),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_secrets_token(path: &Path) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read secrets file");
            return None;
        }
    };
    parse_secrets(&content)
}

/// Extracts a token from secrets-file content.
///
/// Content that parses as JSON is only searched as JSON, even when no key
/// matches; anything else is read as `key=value` lines.
pub fn parse_secrets(content: &str) -> Option<String> {
    let content = content.trim();
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(serde_json::Value::Object(map)) => JSON_TOKEN_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| match value {
                serde_json::Value::String(s) => non_empty(Some(s.as_str())),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        Ok(_) => None,
        Err(_) => content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| LEGACY_TOKEN_KEYS.contains(&key.trim()))
            .map(|(_, value)| value.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn secrets(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_explicit_beats_env_and_file() {
        let file = secrets(r#"{"AppToken": "from-file"}"#);
        let token =
            resolve_app_token_from(Some("from-flag"), Some("from-env"), Some(file.path())).unwrap();
        assert_eq!(token.value, "from-flag");
        assert_eq!(token.source, TokenSource::Explicit);
    }

    #[test]
    fn test_env_beats_file() {
        let file = secrets(r#"{"AppToken": "from-file"}"#);
        let token = resolve_app_token_from(None, Some("from-env"), Some(file.path())).unwrap();
        assert_eq!(token.value, "from-env");
        assert_eq!(token.source, TokenSource::Environment);
    }

    #[test]
    fn test_blank_values_fall_through() {
        let file = secrets(r#"{"AppToken": "from-file"}"#);
        let token = resolve_app_token_from(Some("  "), Some(""), Some(file.path())).unwrap();
        assert_eq!(token.value, "from-file");
        assert_eq!(token.source, TokenSource::SecretsFile(file.path().to_path_buf()));
    }

    #[test]
    fn test_missing_everything_is_none() {
        assert!(resolve_app_token_from(None, None, None).is_none());
        assert!(
            resolve_app_token_from(None, None, Some(Path::new("/nonexistent/secrets.json")))
                .is_none()
        );
    }

    #[test]
    fn test_json_key_order() {
        assert_eq!(
            parse_secrets(r#"{"token": "t", "APIKeyId": "k"}"#).as_deref(),
            Some("k")
        );
        assert_eq!(
            parse_secrets(r#"{"AppToken": "", "api_key": "fallback"}"#).as_deref(),
            Some("fallback")
        );
        assert_eq!(parse_secrets(r#"{"other": "x"}"#), None);
        assert_eq!(parse_secrets(r#"["AppToken"]"#), None);
    }

    #[test]
    fn test_legacy_key_value() {
        let content = "# comment\n\nOther=1\nAPIKeyID = legacy-token \n";
        assert_eq!(parse_secrets(content).as_deref(), Some("legacy-token"));
        // Only the two legacy keys are recognized in this form.
        assert_eq!(parse_secrets("token=nope"), None);
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AppToken {
            value: "super-secret".to_string(),
            source: TokenSource::Explicit,
        };
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
    }
}
