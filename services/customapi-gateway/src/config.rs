//! Configuration types and loading
//!
//! Precedence: CLI `--config` > `CONFIG_PATH` for the file location;
//! `[api]` table > `CUSTOMAPI_*` env vars for connection settings, with env
//! vars filling whatever the file leaves unset; secret files > env vars for
//! the password and static token. Secrets never live in the TOML itself.

use common::settings::{AUTH_TOKEN_ENV, PASSWORD_ENV};
use common::{Secret, Settings};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    /// Connection settings; after `load` this also carries env values and secrets
    #[serde(default)]
    pub api: Settings,
    #[serde(default)]
    pub secrets: SecretFiles,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Timeout for token and proxied calls
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// Paths to files holding secrets (alternative to the env vars)
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretFiles {
    #[serde(default)]
    pub password_file: Option<PathBuf>,
    #[serde(default)]
    pub auth_token_file: Option<PathBuf>,
}

fn default_timeout() -> u64 {
    120
}

fn default_max_connections() -> usize {
    1000
}

impl Config {
    /// Load the TOML file, overlay `CUSTOMAPI_*` env vars, read secret files
    /// and validate the result.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        let file_settings = std::mem::take(&mut config.api);
        config.api = file_settings.or(Settings::from_env());

        if let Some(password) = read_secret_file(config.secrets.password_file.as_deref())? {
            config.api.password = Some(password);
        }
        if let Some(token) = read_secret_file(config.secrets.auth_token_file.as_deref())? {
            config.api.auth_token = Some(token);
        }

        for (name, url) in [
            ("base_url", &config.api.base_url),
            ("auth_url", &config.api.auth_url),
        ] {
            match url {
                Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    return Err(common::Error::Config(format!(
                        "{name} must start with http:// or https://, got: {url}"
                    )));
                }
                _ => {}
            }
        }

        if !config.api.has_credentials() {
            return Err(common::Error::Config(format!(
                "no credentials: set {AUTH_TOKEN_ENV}, or a username with {PASSWORD_ENV} \
                 (or the matching [secrets] files)"
            )));
        }
        if config.api.base_url.is_none() {
            warn!("no base_url configured; every proxied request will fail");
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("customapi-gateway.toml")
    }
}

/// Read and trim a secret file; whitespace-only content counts as unset.
fn read_secret_file(path: Option<&Path>) -> common::Result<Option<Secret<String>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let contents = std::fs::read_to_string(path).map_err(|e| {
        common::Error::Config(format!("failed to read secret file {}: {e}", path.display()))
    })?;
    Ok(Secret::non_empty(contents.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::settings::{
        AUDIENCE_ENV, AUTH_URL_ENV, BASE_URL_ENV, CLIENT_ID_ENV, ENVIRONMENT_ENV, ORG_ID_ENV,
        USERNAME_ENV,
    };
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const API_ENV_VARS: &[&str] = &[
        BASE_URL_ENV,
        AUTH_URL_ENV,
        ENVIRONMENT_ENV,
        ORG_ID_ENV,
        CLIENT_ID_ENV,
        AUDIENCE_ENV,
        USERNAME_ENV,
        PASSWORD_ENV,
        AUTH_TOKEN_ENV,
    ];

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    unsafe fn clear_api_env() {
        for key in API_ENV_VARS {
            unsafe { remove_env(key) };
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn valid_toml() -> &'static str {
        r#"
[server]
listen_addr = "127.0.0.1:8080"

[api]
base_url = "https://api.example.com"
environment = "staging"
org_id = "org-1"
username = "alice@example.com"
"#
    }

    #[test]
    fn test_load_valid_config_with_env_password() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { clear_api_env() };
        unsafe { set_env(PASSWORD_ENV, "hunter2") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let config = result.unwrap();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.server.timeout_secs, 120);
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.api.environment.as_deref(), Some("staging"));
        assert_eq!(config.api.org_id.as_deref(), Some("org-1"));
        assert_eq!(config.api.password.as_ref().unwrap().expose(), "hunter2");
        assert!(config.api.auth_token.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_password_in_toml_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[api]
username = "alice"
password = "plaintext"
"#,
        );
        let err = Config::load(&path).unwrap_err();
        assert!(
            err.to_string().contains("password"),
            "unknown-field error should name the key, got: {err}"
        );
    }

    #[test]
    fn test_file_settings_override_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { clear_api_env() };
        unsafe { set_env(BASE_URL_ENV, "https://env.example.com") };
        unsafe { set_env(ORG_ID_ENV, "org-env") };
        unsafe { set_env(AUTH_URL_ENV, "https://auth.env.example.com") };
        unsafe { set_env(AUTH_TOKEN_ENV, "static-token") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let config = result.unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.api.org_id.as_deref(), Some("org-1"));
        // Not in the file, so the env value fills the gap
        assert_eq!(
            config.api.auth_url.as_deref(),
            Some("https://auth.env.example.com")
        );
        assert_eq!(config.api.auth_token.as_ref().unwrap().expose(), "static-token");
    }

    #[test]
    fn test_secret_files_override_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let password_path = dir.path().join("password");
        std::fs::write(&password_path, "from-file\n").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[secrets]\npassword_file = \"{}\"\n",
                valid_toml(),
                password_path.display()
            ),
        );

        unsafe { clear_api_env() };
        unsafe { set_env(PASSWORD_ENV, "from-env") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let config = result.unwrap();
        assert_eq!(config.api.password.as_ref().unwrap().expose(), "from-file");
    }

    #[test]
    fn test_empty_secret_file_falls_back_to_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "  \n  ").unwrap();
        let path = write_config(
            &dir,
            &format!(
                "[server]\nlisten_addr = \"127.0.0.1:8080\"\n\n[secrets]\nauth_token_file = \"{}\"\n",
                token_path.display()
            ),
        );

        unsafe { clear_api_env() };
        unsafe { set_env(AUTH_TOKEN_ENV, "env-token") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let config = result.unwrap();
        assert_eq!(config.api.auth_token.as_ref().unwrap().expose(), "env-token");
    }

    #[test]
    fn test_missing_secret_file_returns_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            &format!(
                "{}\n[secrets]\npassword_file = \"/nonexistent/path/password\"\n",
                valid_toml()
            ),
        );

        unsafe { clear_api_env() };
        unsafe { set_env(PASSWORD_ENV, "from-env") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to read secret file"));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, valid_toml());

        unsafe { clear_api_env() };
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("no credentials"), "got: {err}");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[server]
listen_addr = "127.0.0.1:8080"

[api]
base_url = "api.example.com"
"#,
        );

        unsafe { clear_api_env() };
        unsafe { set_env(AUTH_TOKEN_ENV, "static-token") };
        let result = Config::load(&path);
        unsafe { clear_api_env() };

        let err = result.unwrap_err().to_string();
        assert!(
            err.contains("base_url must start with http"),
            "error message should explain the issue, got: {err}"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[server]\nlisten_addr = \"127.0.0.1:8080\"\ntimeout_secs = 0\n",
        );
        assert!(Config::load(&path).is_err(), "timeout_secs = 0 must be rejected");
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[server]\nlisten_addr = \"127.0.0.1:8080\"\nmax_connections = 0\n",
        );
        assert!(Config::load(&path).is_err(), "max_connections = 0 must be rejected");
    }

    #[test]
    fn test_resolve_path_cli_overrides_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/should-lose.toml") };
        let path = Config::resolve_path(Some("/cli/wins.toml"));
        assert_eq!(path, PathBuf::from("/cli/wins.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_env_var() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("/env/path.toml"));
        unsafe { remove_env("CONFIG_PATH") };
    }

    #[test]
    fn test_resolve_path_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { remove_env("CONFIG_PATH") };
        let path = Config::resolve_path(None);
        assert_eq!(path, PathBuf::from("customapi-gateway.toml"));
    }
}
