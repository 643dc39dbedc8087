//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES (e.g. `quotes.api_key_env:
//! "KTO_QUOTES_API_KEY"`). Values are read from the environment once and
//! are redacted in `Debug` output. Error messages mention the NAME only.

use serde_json::Value;

/// Env var read when the config does not name one.
pub const DEFAULT_QUOTE_API_KEY_ENV: &str = "KTO_QUOTES_API_KEY";

/// Secrets resolved from the environment.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Name of the env var the key was read from.
    pub quote_api_key_env: String,
    /// Quote service API key; `None` if the variable is unset or blank.
    pub quote_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("quote_api_key_env", &self.quote_api_key_env)
            .field("quote_api_key", &self.quote_api_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Non-empty string at `pointer`, trimmed.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve the quote service API key named by `/quotes/api_key_env`.
/// The key is optional: file-backed quote sources need none.
pub fn resolve_quote_api_key(config_json: &Value) -> ResolvedSecrets {
    let var = read_str_at(config_json, "/quotes/api_key_env")
        .unwrap_or_else(|| DEFAULT_QUOTE_API_KEY_ENV.to_string());
    ResolvedSecrets {
        quote_api_key: resolve_env(&var),
        quote_api_key_env: var,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_value() {
        let s = ResolvedSecrets {
            quote_api_key_env: "X".into(),
            quote_api_key: Some("hunter2-secret".into()),
        };
        let dbg = format!("{s:?}");
        assert!(dbg.contains("<REDACTED>"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn reads_configured_name() {
        std::env::set_var("KTO_TEST_QUOTE_KEY_A", "abc");
        let cfg = serde_json::json!({"quotes": {"api_key_env": "KTO_TEST_QUOTE_KEY_A"}});
        let s = resolve_quote_api_key(&cfg);
        assert_eq!(s.quote_api_key_env, "KTO_TEST_QUOTE_KEY_A");
        assert_eq!(s.quote_api_key.as_deref(), Some("abc"));

        let cfg = serde_json::json!({"quotes": {"api_key_env": "KTO_TEST_QUOTE_KEY_UNSET"}});
        assert!(resolve_quote_api_key(&cfg).quote_api_key.is_none());
    }
}
