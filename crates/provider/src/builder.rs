//! Exclusivity validation for parsed credential configuration.
//!
//! The directive grammar admits four surface syntaxes but exactly one
//! credential source may survive a parse pass. The builder tracks every
//! scalar with an `Option` presence marker, so an explicitly empty string
//! counts as set and a second assignment is always a duplicate.

use std::collections::HashMap;

use tracing::warn;

use acmedns_common::{AccountCredentials, AcmeDnsError, AcmeDnsResult, DomainConfig};

use crate::{CredentialSource, Provider};

/// The three accepted configuration modes, for error messages
const VALID_MODES: &str = "a config file path, a single inline account \
     (username, password, subdomain, server-url), or a 'config' block of \
     per-domain accounts";

const INLINE_FIELDS: [&str; 4] = ["username", "password", "subdomain", "server-url"];

/// Accumulates credential configuration from the directive grammar (or a
/// host building one programmatically) and validates mode exclusivity.
#[derive(Debug, Default)]
pub struct ProviderBuilder {
    config_file_path: Option<String>,
    username: Option<String>,
    password: Option<String>,
    subdomain: Option<String>,
    server_url: Option<String>,
    /// `Some` once a `config` block has been seen, even an empty one
    domains: Option<HashMap<String, DomainConfig>>,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_scalar(
        slot: &mut Option<String>,
        field: &'static str,
        value: impl Into<String>,
    ) -> AcmeDnsResult<()> {
        if slot.is_some() {
            return Err(AcmeDnsError::duplicate(field));
        }
        *slot = Some(value.into());
        Ok(())
    }

    pub fn set_config_file_path(&mut self, value: impl Into<String>) -> AcmeDnsResult<()> {
        Self::set_scalar(&mut self.config_file_path, "config-file-path", value)
    }

    pub fn set_username(&mut self, value: impl Into<String>) -> AcmeDnsResult<()> {
        Self::set_scalar(&mut self.username, "username", value)
    }

    pub fn set_password(&mut self, value: impl Into<String>) -> AcmeDnsResult<()> {
        Self::set_scalar(&mut self.password, "password", value)
    }

    pub fn set_subdomain(&mut self, value: impl Into<String>) -> AcmeDnsResult<()> {
        Self::set_scalar(&mut self.subdomain, "subdomain", value)
    }

    pub fn set_server_url(&mut self, value: impl Into<String>) -> AcmeDnsResult<()> {
        Self::set_scalar(&mut self.server_url, "server-url", value)
    }

    /// Record that a `config` block was present, even if it turns out to
    /// hold no domain entries (which `build` rejects).
    pub fn mark_config_block(&mut self) {
        self.domains.get_or_insert_with(HashMap::new);
    }

    /// Add a per-domain entry. Domain names are not validated for DNS
    /// well-formedness; a repeated domain overwrites the earlier entry
    /// (last one wins).
    pub fn add_domain(&mut self, domain: impl Into<String>, config: DomainConfig) {
        self.domains
            .get_or_insert_with(HashMap::new)
            .insert(domain.into(), config);
    }

    fn missing_inline_fields(&self) -> Vec<&'static str> {
        let slots = [&self.username, &self.password, &self.subdomain, &self.server_url];
        INLINE_FIELDS
            .iter()
            .zip(slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Validate mode exclusivity and produce the credential source.
    pub fn build(self) -> AcmeDnsResult<Provider> {
        let missing_inline = self.missing_inline_fields();
        let inline_seen = missing_inline.len() < INLINE_FIELDS.len();
        let inline_active = missing_inline.is_empty();
        let file_active = self.config_file_path.is_some();
        let multi_active = self.domains.as_ref().is_some_and(|d| !d.is_empty());

        if self.domains.as_ref().is_some_and(HashMap::is_empty) {
            return Err(AcmeDnsError::exclusivity(
                "the 'config' block contains no domain entries",
            ));
        }

        let mut active = Vec::new();
        if file_active {
            active.push("config file");
        }
        if inline_active {
            active.push("inline account");
        }
        if multi_active {
            active.push("per-domain config");
        }

        match active.len() {
            1 => {}
            0 => {
                let mut message =
                    format!("no credential source configured; expected exactly one of: {VALID_MODES}");
                if inline_seen {
                    message.push_str(&format!(
                        "; inline account is incomplete (missing: {})",
                        missing_inline.join(", ")
                    ));
                }
                return Err(AcmeDnsError::exclusivity(message));
            }
            _ => {
                return Err(AcmeDnsError::exclusivity(format!(
                    "multiple credential sources configured ({}); expected exactly one of: {VALID_MODES}",
                    active.join(", ")
                )));
            }
        }

        if inline_seen && !inline_active {
            warn!(
                missing = %missing_inline.join(", "),
                "Ignoring incomplete inline account fields next to the configured credential source"
            );
        }

        let Self {
            config_file_path,
            username,
            password,
            subdomain,
            server_url,
            domains,
        } = self;

        let source = if let Some(path) = config_file_path {
            CredentialSource::ConfigFile(path)
        } else if let (Some(username), Some(password), Some(subdomain), Some(server_url)) =
            (username, password, subdomain, server_url)
        {
            CredentialSource::Inline(AccountCredentials {
                username,
                password,
                subdomain,
                server_url,
            })
        } else if let Some(domains) = domains {
            CredentialSource::DomainMap(domains)
        } else {
            return Err(AcmeDnsError::exclusivity(format!(
                "no credential source configured; expected exactly one of: {VALID_MODES}"
            )));
        };

        Ok(Provider::new(source))
    }
}
