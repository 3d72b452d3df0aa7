//! ACME-DNS credential configuration for DNS-01 challenges
//!
//! This crate is the configuration adapter between a proxy host's KDL
//! grammar and the credential set an ACME-DNS record-manipulation client
//! needs. It parses the `acmedns` directive (or a JSON credentials file),
//! enforces that exactly one configuration mode is in use, and hands the
//! host an immutable, validated credential set. It deliberately contains
//! no DNS or ACME protocol logic; the wrapped client is an external
//! collaborator.
//!
//! # Architecture
//!
//! - [`Provider`] - The provider module: parsed source plus provisioning
//! - [`ProviderBuilder`] - Accumulates fields, validates mode exclusivity
//! - [`load_credentials_file`] - Two-shape JSON credentials file decoding
//! - [`ResolvedCredentials`] - The validated output, with zone lookup
//!
//! # Example
//!
//! ```kdl
//! acmedns "/etc/acmedns/credentials.json"
//! ```
//!
//! or inline, for a single registered account:
//!
//! ```kdl
//! acmedns {
//!     username "user"
//!     password "secret"
//!     subdomain "d420c923-bbd7-4056-ab64-c3ca54c9b3cf"
//!     server-url "https://auth.example.org"
//! }
//! ```
//!
//! # Lifecycle
//!
//! The host parses the directive once per configuration generation, calls
//! [`Provider::provision`] during startup, and passes the returned
//! [`ResolvedCredentials`] to the DNS client. A configuration reload
//! builds a fresh value; nothing is mutated in place.

mod builder;
mod directive;
mod file;

use std::collections::HashMap;

use kdl::KdlNode;
use tracing::debug;

pub use acmedns_common::{
    normalize_zone, AccountCredentials, AcmeDnsError, AcmeDnsResult, DomainConfig,
    ResolvedCredentials, ZoneCredentials,
};
pub use builder::ProviderBuilder;
pub use directive::parse_provider_node;
pub use file::{load_credentials_file, parse_credentials};

/// Name under which the host knows this provider module
pub const PROVIDER_NAME: &str = "acmedns";

/// Where the credentials will come from at provisioning time.
///
/// Exactly one variant survives parsing; the exclusivity validator rejects
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Path to a JSON credentials file, decoded during provisioning
    ConfigFile(String),
    /// One inline account from the directive block
    Inline(AccountCredentials),
    /// Inline per-domain accounts from a `config` block
    DomainMap(HashMap<String, DomainConfig>),
}

/// The ACME-DNS provider module.
///
/// Constructed by the host from the directive grammar or directly via the
/// `from_*` constructors; [`provision`](Self::provision) resolves it into
/// the credential set the DNS client consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    source: CredentialSource,
}

impl Provider {
    pub(crate) fn new(source: CredentialSource) -> Self {
        Self { source }
    }

    /// Parse a KDL document expected to contain exactly one `acmedns`
    /// directive.
    ///
    /// KDL-level parse failures are decorated with line and column
    /// information from the parser's diagnostics.
    pub fn from_kdl(content: &str) -> AcmeDnsResult<Self> {
        let doc: kdl::KdlDocument = content
            .parse()
            .map_err(|e: kdl::KdlError| AcmeDnsError::syntax(format_kdl_error(content, &e)))?;

        let mut provider_node = None;
        for node in doc.nodes() {
            match node.name().value() {
                PROVIDER_NAME => {
                    if provider_node.is_some() {
                        return Err(AcmeDnsError::syntax("duplicate 'acmedns' directive"));
                    }
                    provider_node = Some(node);
                }
                other => {
                    return Err(AcmeDnsError::syntax(format!(
                        "unknown directive '{other}'; expected '{PROVIDER_NAME}'"
                    )));
                }
            }
        }

        let node = provider_node
            .ok_or_else(|| AcmeDnsError::syntax(format!("missing '{PROVIDER_NAME}' directive")))?;
        directive::parse_provider_node(node)
    }

    /// Parse an already-extracted `acmedns` directive node.
    pub fn from_kdl_node(node: &KdlNode) -> AcmeDnsResult<Self> {
        directive::parse_provider_node(node)
    }

    /// Configure from a credentials file path.
    pub fn from_config_file(path: impl Into<String>) -> Self {
        Self::new(CredentialSource::ConfigFile(path.into()))
    }

    /// Configure from one inline account.
    pub fn from_account(account: AccountCredentials) -> Self {
        Self::new(CredentialSource::Inline(account))
    }

    /// Configure from a per-domain credential map; an empty map is
    /// rejected just like an empty `config` block.
    pub fn from_domain_configs(
        configs: HashMap<String, DomainConfig>,
    ) -> AcmeDnsResult<Self> {
        if configs.is_empty() {
            return Err(AcmeDnsError::exclusivity(
                "the 'config' block contains no domain entries",
            ));
        }
        Ok(Self::new(CredentialSource::DomainMap(configs)))
    }

    /// The parsed, not-yet-resolved credential source.
    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Resolve the credential source into the set the DNS client uses.
    ///
    /// Runs once during host provisioning, synchronously. A file-based
    /// source reads and decodes the file here; inline sources resolve in
    /// place. Failures yield no partial configuration.
    pub fn provision(&self) -> AcmeDnsResult<ResolvedCredentials> {
        let resolved = match &self.source {
            CredentialSource::ConfigFile(path) => file::load_credentials_file(path)?,
            CredentialSource::Inline(account) => ResolvedCredentials::Account(account.clone()),
            CredentialSource::DomainMap(configs) => {
                ResolvedCredentials::PerDomain(configs.clone())
            }
        };

        debug!(
            provider = PROVIDER_NAME,
            domains = ?resolved.domain_count(),
            "Provisioned ACME-DNS credentials"
        );
        Ok(resolved)
    }
}

/// Render a KDL parse failure with line/column context pulled from the
/// parser's miette diagnostics.
fn format_kdl_error(content: &str, error: &kdl::KdlError) -> String {
    use miette::Diagnostic;

    let mut message = String::from("KDL parse error in acmedns configuration:");
    let mut found_details = false;

    if let Some(related) = error.related() {
        for diagnostic in related {
            message.push_str(&format!("\n  {diagnostic}"));
            found_details = true;

            if let Some(labels) = diagnostic.labels() {
                for label in labels {
                    let (line, col) = directive::offset_to_line_col(content, label.offset());
                    message.push_str(&format!(" (line {line}, column {col})"));
                    if let Some(text) = label.label() {
                        message.push_str(&format!(": {text}"));
                    }
                }
            }
        }
    }

    if !found_details {
        message.push_str(&format!("\n  {error}"));
    }

    if let Some(help) = error.help() {
        message.push_str(&format!("\n  Help: {help}"));
    }

    message
}
