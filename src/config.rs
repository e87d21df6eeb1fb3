//! Client configuration
//!
//! Values are stored exactly as given. Blank fields are not rejected here;
//! the operations that need them decide what a blank value means.

use crate::{Error, Result};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub pid: String,
    pub srv_id: String,
    pub srv_pwd: String,
    /// Base URL for upload, download and delete.
    pub intranet_url: String,
    /// Base URL used when building public image URLs.
    pub internet_url: String,
    /// Shared key the token is encrypted with.
    pub sec_key: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(
        pid: impl Into<String>,
        srv_id: impl Into<String>,
        srv_pwd: impl Into<String>,
        intranet_url: impl Into<String>,
        internet_url: impl Into<String>,
    ) -> Self {
        Self {
            pid: pid.into(),
            srv_id: srv_id.into(),
            srv_pwd: srv_pwd.into(),
            intranet_url: intranet_url.into(),
            internet_url: internet_url.into(),
            sec_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_sec_key(mut self, sec_key: impl Into<String>) -> Self {
        self.sec_key = Some(sec_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from a variable lookup. Missing values become empty strings; a
    /// blank key means no key.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| get(name).unwrap_or_default();

        let timeout = match get("IDPS_TIMEOUT_SECS") {
            Some(secs) => {
                let parsed: u64 = secs.trim().parse().map_err(|_| {
                    Error::Config(format!("IDPS_TIMEOUT_SECS is not a number: {}", secs))
                })?;
                if parsed == 0 {
                    return Err(Error::Config(
                        "IDPS_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(parsed)
            }
            None => DEFAULT_TIMEOUT,
        };

        let sec_key = get("IDPS_SEC_KEY").filter(|key| !key.trim().is_empty());

        Ok(Self {
            pid: var("IDPS_PID"),
            srv_id: var("IDPS_SRV_ID"),
            srv_pwd: var("IDPS_SRV_PWD"),
            intranet_url: var("IDPS_IMAGE_URL"),
            internet_url: var("IDPS_IMAGE_URL_INTER"),
            sec_key,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_new_stores_values_verbatim() {
        let config = ClientConfig::new("p", "s", "pw", "http://intra/", "");

        assert_eq!(config.pid, "p");
        assert_eq!(config.intranet_url, "http://intra/");
        assert_eq!(config.internet_url, "");
        assert!(config.sec_key.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("IDPS_PID", "p1"),
            ("IDPS_SRV_ID", "IDPS001"),
            ("IDPS_SRV_PWD", "pwd"),
            ("IDPS_IMAGE_URL", "http://intra"),
            ("IDPS_IMAGE_URL_INTER", "http://inter"),
            ("IDPS_SEC_KEY", "shared"),
            ("IDPS_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.pid, "p1");
        assert_eq!(config.srv_id, "IDPS001");
        assert_eq!(config.srv_pwd, "pwd");
        assert_eq!(config.intranet_url, "http://intra");
        assert_eq!(config.internet_url, "http://inter");
        assert_eq!(config.sec_key.as_deref(), Some("shared"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_missing_values_default() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.pid, "");
        assert_eq!(config.srv_id, "");
        assert_eq!(config.srv_pwd, "");
        assert_eq!(config.intranet_url, "");
        assert_eq!(config.internet_url, "");
        assert!(config.sec_key.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_lookup_blank_sec_key_is_none() {
        let config = ClientConfig::from_lookup(lookup(&[("IDPS_SEC_KEY", "")])).unwrap();
        assert!(config.sec_key.is_none());

        let config = ClientConfig::from_lookup(lookup(&[("IDPS_SEC_KEY", "  ")])).unwrap();
        assert!(config.sec_key.is_none());
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("IDPS_TIMEOUT_SECS", "abc")])).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("abc")));

        let err = ClientConfig::from_lookup(lookup(&[("IDPS_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("p", "s", "pw", "a", "b")
            .with_sec_key("key")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.sec_key.as_deref(), Some("key"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
