use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_URL: &str = "https://harmony.uat.earthdata.nasa.gov";

/// What a failed credential check means for the submission that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    /// Log the failure and submit anyway.
    #[default]
    BestEffort,
    /// Fail the submission, and every later one on the same client.
    ///
    /// The check still runs only once, so a transient network failure during it
    /// (DNS, connect, timeout) also fails every later submission on this client
    /// and its clones. Build a new client to check again.
    Strict,
}

#[derive(Clone)]
pub struct ClientConfig {
    /// Harmony root URL, e.g. `https://harmony.earthdata.nasa.gov`.
    pub url: String,
    /// Earthdata Login credentials. Requests are sent anonymously when absent.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Probe `GET {url}/jobs` once before the first submission.
    pub validate_auth: bool,
    pub auth_policy: AuthPolicy,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("verify", &self.verify)
            .field("validate_auth", &self.validate_auth)
            .field("auth_policy", &self.auth_policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// A config for `url` with every other setting at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            verify: true,
            validate_auth: true,
            auth_policy: AuthPolicy::default(),
            timeout: Duration::from_secs(60),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let parsed = reqwest::Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid url {:?}: {}", self.url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported url scheme {:?} in {}",
                parsed.scheme(),
                self.url
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(Error::Config(
                "a password was given without a username (set EDL_USERNAME)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves settings in order of precedence: explicit argument, environment
/// (`HARMONY_URL`, `EDL_USERNAME`, `EDL_PASSWORD`, `HARMONY_VERIFY`), default.
pub(crate) fn load_config(
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    load_config_with(|name| std::env::var(name).ok(), url, username, password, verify)
}

/// Same as [`load_config`], reading variables through `lookup`. Blank values count as unset.
pub(crate) fn load_config_with<F>(
    lookup: F,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let url = url
        .or_else(|| var("HARMONY_URL"))
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let username = username.or_else(|| var("EDL_USERNAME"));
    let password = password.or_else(|| var("EDL_PASSWORD"));
    let verify = verify
        .or_else(|| var("HARMONY_VERIFY").map(|v| parse_flag(&v)))
        .unwrap_or(true);

    let cfg = ClientConfig {
        username,
        password,
        verify,
        ..ClientConfig::new(url)
    };
    cfg.validate()?;
    Ok(cfg)
}

fn parse_flag(v: &str) -> bool {
    !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn explicit_arguments_win() {
        let env = fake_env(&[
            ("HARMONY_URL", "https://harmony.earthdata.nasa.gov"),
            ("EDL_USERNAME", "env-user"),
            ("EDL_PASSWORD", "env-pass"),
            ("HARMONY_VERIFY", "1"),
        ]);
        let cfg = load_config_with(
            env,
            Some("http://localhost:3000".to_string()),
            Some("user".to_string()),
            Some("pass".to_string()),
            Some(false),
        )
        .unwrap();
        assert_eq!(cfg.url, "http://localhost:3000");
        assert_eq!(cfg.username.as_deref(), Some("user"));
        assert_eq!(cfg.password.as_deref(), Some("pass"));
        assert!(!cfg.verify);
        assert!(cfg.validate_auth);
        assert_eq!(cfg.auth_policy, AuthPolicy::BestEffort);
    }

    #[test]
    fn environment_fills_missing_arguments() {
        let env = fake_env(&[
            ("HARMONY_URL", "https://harmony.earthdata.nasa.gov"),
            ("EDL_USERNAME", "env-user"),
            ("EDL_PASSWORD", "env-pass"),
            ("HARMONY_VERIFY", "false"),
        ]);
        let cfg = load_config_with(env, None, None, None, None).unwrap();
        assert_eq!(cfg.url, "https://harmony.earthdata.nasa.gov");
        assert_eq!(cfg.username.as_deref(), Some("env-user"));
        assert_eq!(cfg.password.as_deref(), Some("env-pass"));
        assert!(!cfg.verify);
    }

    #[test]
    fn defaults_apply_without_arguments_or_environment() {
        let cfg = load_config_with(fake_env(&[]), None, None, None, None).unwrap();
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.username, None);
        assert_eq!(cfg.password, None);
        assert!(cfg.verify);
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let env = fake_env(&[
            ("HARMONY_URL", ""),
            ("EDL_USERNAME", "   "),
            ("EDL_PASSWORD", ""),
            ("HARMONY_VERIFY", " "),
        ]);
        let cfg = load_config_with(env, None, None, None, None).unwrap();
        assert_eq!(cfg.url, DEFAULT_URL);
        assert_eq!(cfg.username, None);
        assert_eq!(cfg.password, None);
        assert!(cfg.verify);
    }

    #[test]
    fn invalid_url_from_environment_is_rejected() {
        let env = fake_env(&[("HARMONY_URL", "harmony without scheme")]);
        let err = load_config_with(env, None, None, None, None).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn bad_url_is_a_config_error() {
        let err = ClientConfig::new("not a url").validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
        assert!(ClientConfig::new("ftp://example.com").validate().is_err());
    }

    #[test]
    fn password_without_username_is_rejected() {
        let cfg = ClientConfig {
            password: Some("secret".to_string()),
            ..ClientConfig::new(DEFAULT_URL)
        };
        assert!(cfg.validate().is_err());
        assert!(!format!("{cfg:?}").contains("secret"));
    }

    #[test]
    fn verify_flag_parsing() {
        assert!(!parse_flag("0"));
        assert!(!parse_flag("False"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
    }
}
