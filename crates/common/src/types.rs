//! Credential types shared between the configuration resolver and the
//! DNS record-manipulation client.
//!
//! Two JSON shapes exist in the wild for ACME-DNS credentials: a mapping
//! from managed domain to a per-domain account, and a bare single-account
//! object. Both are modeled here; the resolver guarantees exactly one of
//! them survives configuration loading.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AcmeDnsError, AcmeDnsResult};

/// One registered ACME-DNS account, usable for any domain.
///
/// Field names match the ACME-DNS registration JSON. Extra fields in the
/// source document (for example `allowfrom`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
    pub subdomain: String,
    pub server_url: String,
}

/// Credentials for a single managed domain, including the delegated
/// subdomain address (`fulldomain`) at which TXT records are published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    pub username: String,
    pub password: String,
    pub subdomain: String,
    pub fulldomain: String,
    pub server_url: String,
}

/// The validated output of configuration resolution.
///
/// Built once during provisioning and immutable thereafter; a config
/// reload replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredentials {
    /// One account answering for every domain
    Account(AccountCredentials),
    /// Per-domain accounts, keyed by managed domain name
    PerDomain(HashMap<String, DomainConfig>),
}

/// Borrowed view of the credential fields the DNS client consumes for one
/// zone. `fulldomain` is only known for per-domain configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub subdomain: &'a str,
    pub fulldomain: Option<&'a str>,
    pub server_url: &'a str,
}

/// Strip the trailing dot from a fully-qualified zone name.
///
/// ACME libraries hand zones in FQDN form ("example.com."); the credential
/// map is keyed without the dot.
pub fn normalize_zone(zone: &str) -> &str {
    zone.strip_suffix('.').unwrap_or(zone)
}

impl ResolvedCredentials {
    /// Look up the credential set for a zone.
    ///
    /// A single-account configuration answers for every zone. A per-domain
    /// configuration requires an exact entry for the normalized zone name.
    pub fn credentials_for(&self, zone: &str) -> AcmeDnsResult<ZoneCredentials<'_>> {
        let normalized = normalize_zone(zone);
        match self {
            Self::Account(account) => Ok(ZoneCredentials {
                username: &account.username,
                password: &account.password,
                subdomain: &account.subdomain,
                fulldomain: None,
                server_url: &account.server_url,
            }),
            Self::PerDomain(configs) => {
                let config = configs
                    .get(normalized)
                    .ok_or_else(|| AcmeDnsError::unknown_domain(normalized))?;
                Ok(ZoneCredentials {
                    username: &config.username,
                    password: &config.password,
                    subdomain: &config.subdomain,
                    fulldomain: Some(&config.fulldomain),
                    server_url: &config.server_url,
                })
            }
        }
    }

    /// Number of domains this configuration can answer for.
    ///
    /// `None` for a single-account configuration, which is not bounded to
    /// an enumerable domain set.
    pub fn domain_count(&self) -> Option<usize> {
        match self {
            Self::Account(_) => None,
            Self::PerDomain(configs) => Some(configs.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain_config(tag: &str) -> DomainConfig {
        DomainConfig {
            username: format!("user-{tag}"),
            password: format!("pass-{tag}"),
            subdomain: format!("sub-{tag}"),
            fulldomain: format!("sub-{tag}.auth.example.org"),
            server_url: "https://auth.example.org".to_string(),
        }
    }

    #[test]
    fn test_normalize_zone() {
        assert_eq!(normalize_zone("example.com"), "example.com");
        assert_eq!(normalize_zone("example.com."), "example.com");
        assert_eq!(normalize_zone("sub.example.com."), "sub.example.com");
    }

    #[test]
    fn test_account_answers_for_any_zone() {
        let resolved = ResolvedCredentials::Account(AccountCredentials {
            username: "u".to_string(),
            password: "p".to_string(),
            subdomain: "s".to_string(),
            server_url: "https://auth.example.org".to_string(),
        });

        let creds = resolved.credentials_for("anything.example.net.").unwrap();
        assert_eq!(creds.username, "u");
        assert_eq!(creds.fulldomain, None);
        assert_eq!(resolved.domain_count(), None);
    }

    #[test]
    fn test_per_domain_exact_lookup() {
        let mut configs = HashMap::new();
        configs.insert("example.com".to_string(), domain_config("a"));
        let resolved = ResolvedCredentials::PerDomain(configs);

        let creds = resolved.credentials_for("example.com.").unwrap();
        assert_eq!(creds.username, "user-a");
        assert_eq!(creds.fulldomain, Some("sub-a.auth.example.org"));
        assert_eq!(resolved.domain_count(), Some(1));
    }

    #[test]
    fn test_per_domain_lookup_miss() {
        let mut configs = HashMap::new();
        configs.insert("example.com".to_string(), domain_config("a"));
        let resolved = ResolvedCredentials::PerDomain(configs);

        let err = resolved.credentials_for("other.com").unwrap_err();
        assert!(matches!(err, AcmeDnsError::UnknownDomain { domain } if domain == "other.com"));
    }

    #[test]
    fn test_account_decode_ignores_extra_fields() {
        // The ACME-DNS registration response carries an `allowfrom` list.
        let json = r#"{
            "username": "u",
            "password": "p",
            "subdomain": "s",
            "server_url": "https://auth.example.org",
            "allowfrom": ["192.168.1.0/24"]
        }"#;
        let account: AccountCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(account.subdomain, "s");
    }

    #[test]
    fn test_domain_config_requires_fulldomain() {
        let json = r#"{
            "username": "u",
            "password": "p",
            "subdomain": "s",
            "server_url": "https://auth.example.org"
        }"#;
        assert!(serde_json::from_str::<DomainConfig>(json).is_err());
    }
}
