//! Credentials file loading.
//!
//! The file is JSON in one of two accepted shapes:
//!
//! - a mapping from managed domain to per-domain credentials:
//!   `{"example.com": {"username": ..., "password": ..., "subdomain": ...,
//!   "fulldomain": ..., "server_url": ...}}`
//! - a bare single-account object:
//!   `{"username": ..., "password": ..., "subdomain": ..., "server_url": ...}`
//!
//! The per-domain shape is tried first; the single-account shape is the
//! fallback. When neither matches, the caller gets one generic decode
//! error and the serde detail goes to the debug log.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use acmedns_common::{
    AccountCredentials, AcmeDnsError, AcmeDnsResult, DomainConfig, ResolvedCredentials,
};

/// Read and decode a credentials file.
///
/// A missing or unreadable file fails with an error naming the path. The
/// read handle is transient; nothing is kept open after the bytes are in.
pub fn load_credentials_file(path: &str) -> AcmeDnsResult<ResolvedCredentials> {
    check_permissions(Path::new(path));

    let content =
        fs::read_to_string(path).map_err(|source| AcmeDnsError::file_read(path, source))?;

    parse_credentials(&content)
}

/// Decode credentials file content, trying the per-domain map shape first
/// and the single-account shape second.
pub fn parse_credentials(content: &str) -> AcmeDnsResult<ResolvedCredentials> {
    match serde_json::from_str::<HashMap<String, DomainConfig>>(content) {
        Ok(configs) if configs.is_empty() => {
            Err(AcmeDnsError::decode("config file contains no domain entries"))
        }
        Ok(configs) => {
            debug!(domains = configs.len(), "Loaded per-domain ACME-DNS credentials");
            Ok(ResolvedCredentials::PerDomain(configs))
        }
        Err(map_err) => match serde_json::from_str::<AccountCredentials>(content) {
            Ok(account) => {
                debug!("Loaded single-account ACME-DNS credentials");
                Ok(ResolvedCredentials::Account(account))
            }
            Err(account_err) => {
                debug!(
                    %map_err,
                    %account_err,
                    "Credentials file matched neither accepted shape"
                );
                Err(AcmeDnsError::decode(
                    "config file matches neither the per-domain map nor the \
                     single-account format",
                ))
            }
        },
    }
}

/// Warn when the credentials file is readable by group or world.
/// 0600 or 0400 expected; loading continues either way.
#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = format!("{:o}", mode),
                "Credentials file is group- or world-accessible (expected 0600 or 0400)"
            );
        }
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}
