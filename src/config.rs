use std::time::Duration;

use anyhow::Context as _;
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetailPolicy {
    #[default]
    DiscardStale,
    LastResponseWins,
}

impl DetailPolicy {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw = lookup("COURSENAV_DETAIL_POLICY").unwrap_or_else(|| "discard-stale".to_string());
        Self::parse(&raw).with_context(|| {
            format!(
                "invalid COURSENAV_DETAIL_POLICY={raw:?}. expected one of: discard-stale, last-response-wins"
            )
        })
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "" | "discard-stale" => Ok(Self::DiscardStale),
            "last-response-wins" => Ok(Self::LastResponseWins),
            other => anyhow::bail!("unsupported detail policy: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub detail_policy: DetailPolicy,
    pub base_url: Option<Url>,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detail_policy: DetailPolicy::default(),
            base_url: None,
            http_timeout: Duration::from_secs(Self::default_http_timeout_secs()),
        }
    }
}

impl Config {
    pub fn default_http_timeout_secs() -> u64 {
        30
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let detail_policy = DetailPolicy::from_lookup(&lookup)?;

        let base_url = match lookup("COURSENAV_BASE_URL") {
            Some(raw) if !raw.trim().is_empty() => Some(
                Url::parse(raw.trim())
                    .with_context(|| format!("invalid COURSENAV_BASE_URL={raw:?}"))?,
            ),
            _ => None,
        };

        let http_timeout = match lookup("COURSENAV_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid COURSENAV_HTTP_TIMEOUT_SECS={raw:?}"))?;
                if secs == 0 {
                    anyhow::bail!("COURSENAV_HTTP_TIMEOUT_SECS must be positive");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(Self::default_http_timeout_secs()),
        };

        Ok(Self {
            detail_policy,
            base_url,
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let env = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key: &str| env.get(key).cloned()
    }

    #[test]
    fn parse_discard_stale_variants() {
        assert_eq!(
            DetailPolicy::parse("discard-stale").unwrap(),
            DetailPolicy::DiscardStale
        );
        assert_eq!(
            DetailPolicy::parse("DISCARD_STALE").unwrap(),
            DetailPolicy::DiscardStale
        );
        assert_eq!(DetailPolicy::parse("").unwrap(), DetailPolicy::DiscardStale);
    }

    #[test]
    fn parse_last_response_wins() {
        assert_eq!(
            DetailPolicy::parse(" Last-Response-Wins ").unwrap(),
            DetailPolicy::LastResponseWins
        );
    }

    #[test]
    fn parse_invalid_policy() {
        let err = DetailPolicy::parse("first-wins").unwrap_err().to_string();
        assert!(err.contains("unsupported detail policy"));
    }

    #[test]
    fn config_defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.detail_policy, DetailPolicy::DiscardStale);
        assert!(config.base_url.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("COURSENAV_DETAIL_POLICY", "last-response-wins"),
            ("COURSENAV_BASE_URL", "http://127.0.0.1:9000/api/"),
            ("COURSENAV_HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.detail_policy, DetailPolicy::LastResponseWins);
        assert_eq!(
            config.base_url.unwrap().as_str(),
            "http://127.0.0.1:9000/api/"
        );
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let err = Config::from_lookup(lookup(&[("COURSENAV_HTTP_TIMEOUT_SECS", "0")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("must be positive"));
    }
}
