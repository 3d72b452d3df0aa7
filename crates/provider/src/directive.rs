//! KDL parsing for the `acmedns` directive.
//!
//! Four surface syntaxes are accepted, one per configuration mode (plus a
//! second spelling for the file path):
//!
//! ```kdl
//! acmedns "/etc/acmedns/credentials.json"
//!
//! acmedns {
//!     config-file-path "/etc/acmedns/credentials.json"
//! }
//!
//! acmedns {
//!     username "user"
//!     password "secret"
//!     subdomain "d420c923-bbd7-4056-ab64-c3ca54c9b3cf"
//!     server-url "https://auth.example.org"
//! }
//!
//! acmedns {
//!     config {
//!         "example.com" {
//!             username "user"
//!             password "secret"
//!             subdomain "d420c923-bbd7-4056-ab64-c3ca54c9b3cf"
//!             fulldomain "d420c923-bbd7-4056-ab64-c3ca54c9b3cf.auth.example.org"
//!             server-url "https://auth.example.org"
//!         }
//!     }
//! }
//! ```
//!
//! Mode exclusivity is enforced by [`ProviderBuilder::build`] after the
//! node has been walked.

use kdl::{KdlEntry, KdlNode};

use acmedns_common::{AcmeDnsError, AcmeDnsResult, DomainConfig};

use crate::builder::ProviderBuilder;
use crate::Provider;

const SUBDIRECTIVES: &str = "config-file-path, username, password, subdomain, server-url, config";

const DOMAIN_FIELDS: &str = "username, password, subdomain, fulldomain, server-url";

/// Parse the `acmedns` directive node into an unprovisioned [`Provider`].
pub fn parse_provider_node(node: &KdlNode) -> AcmeDnsResult<Provider> {
    let mut builder = ProviderBuilder::new();

    // Bare-argument form: acmedns "<path>"
    match node.entries() {
        [] => {}
        [entry] => builder.set_config_file_path(string_value(entry, "acmedns")?)?,
        _ => {
            return Err(AcmeDnsError::syntax(
                "'acmedns' takes at most one argument (a config file path)",
            ));
        }
    }

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "config-file-path" => {
                    builder.set_config_file_path(single_string_arg(child)?)?;
                }
                "username" => builder.set_username(single_string_arg(child)?)?,
                "password" => builder.set_password(single_string_arg(child)?)?,
                "subdomain" => builder.set_subdomain(single_string_arg(child)?)?,
                "server-url" => builder.set_server_url(single_string_arg(child)?)?,
                "config" => parse_config_block(child, &mut builder)?,
                other => {
                    return Err(AcmeDnsError::syntax(format!(
                        "unrecognized subdirective '{other}'. Valid subdirectives are: {SUBDIRECTIVES}"
                    )));
                }
            }
        }
    }

    builder.build()
}

/// Parse the `config` block: one child node per managed domain.
fn parse_config_block(node: &KdlNode, builder: &mut ProviderBuilder) -> AcmeDnsResult<()> {
    if !node.entries().is_empty() {
        return Err(AcmeDnsError::syntax("'config' takes no arguments"));
    }

    // An empty block still marks the mode as chosen, which build() rejects.
    builder.mark_config_block();

    if let Some(children) = node.children() {
        for domain_node in children.nodes() {
            let domain = domain_node.name().value().to_string();
            let config = parse_domain_entry(domain_node)?;
            builder.add_domain(domain, config);
        }
    }

    Ok(())
}

/// Parse one per-domain credential block. The node name is the domain; it
/// is not validated for DNS well-formedness.
fn parse_domain_entry(node: &KdlNode) -> AcmeDnsResult<DomainConfig> {
    let domain = node.name().value();

    if !node.entries().is_empty() {
        return Err(AcmeDnsError::syntax(format!(
            "domain '{domain}' takes no arguments, only a credential block"
        )));
    }

    let mut username = None;
    let mut password = None;
    let mut subdomain = None;
    let mut fulldomain = None;
    let mut server_url = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let field = child.name().value();
            let slot = match field {
                "username" => &mut username,
                "password" => &mut password,
                "subdomain" => &mut subdomain,
                "fulldomain" => &mut fulldomain,
                "server-url" => &mut server_url,
                other => {
                    return Err(AcmeDnsError::syntax(format!(
                        "unrecognized subdirective '{other}' in domain '{domain}'. \
                         Valid fields are: {DOMAIN_FIELDS}"
                    )));
                }
            };
            if slot.is_some() {
                return Err(AcmeDnsError::duplicate(field));
            }
            *slot = Some(single_string_arg(child)?);
        }
    }

    let require = |field: &str, value: Option<String>| {
        value.ok_or_else(|| {
            AcmeDnsError::syntax(format!(
                "domain '{domain}' is missing required field '{field}'"
            ))
        })
    };

    Ok(DomainConfig {
        username: require("username", username)?,
        password: require("password", password)?,
        subdomain: require("subdomain", subdomain)?,
        fulldomain: require("fulldomain", fulldomain)?,
        server_url: require("server-url", server_url)?,
    })
}

/// Extract the single string argument of a sub-directive; zero arguments,
/// extra arguments, properties, and non-string values are syntax errors.
fn single_string_arg(node: &KdlNode) -> AcmeDnsResult<String> {
    let name = node.name().value();
    match node.entries() {
        [entry] => string_value(entry, name),
        [] => Err(AcmeDnsError::syntax(format!(
            "'{name}' expects exactly one argument"
        ))),
        entries => Err(AcmeDnsError::syntax(format!(
            "'{name}' expects exactly one argument, got {}",
            entries.len()
        ))),
    }
}

fn string_value(entry: &KdlEntry, directive: &str) -> AcmeDnsResult<String> {
    if entry.name().is_some() {
        return Err(AcmeDnsError::syntax(format!(
            "'{directive}' does not accept properties"
        )));
    }
    entry
        .value()
        .as_string()
        .map(str::to_string)
        .ok_or_else(|| {
            AcmeDnsError::syntax(format!("'{directive}' expects a string argument"))
        })
}

/// Convert a byte offset to line and column numbers (1-indexed)
pub(crate) fn offset_to_line_col(content: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in content.chars().enumerate() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CredentialSource;

    fn parse(content: &str) -> AcmeDnsResult<Provider> {
        let doc: kdl::KdlDocument = content.parse().unwrap();
        let node = doc
            .nodes()
            .iter()
            .find(|n| n.name().value() == "acmedns")
            .unwrap();
        parse_provider_node(node)
    }

    #[test]
    fn test_bare_path_argument() {
        let provider = parse(r#"acmedns "/etc/acmedns/creds.json""#).unwrap();
        assert_eq!(
            provider.source(),
            &CredentialSource::ConfigFile("/etc/acmedns/creds.json".to_string())
        );
    }

    #[test]
    fn test_config_file_path_subdirective() {
        let provider = parse(
            r#"
            acmedns {
                config-file-path "/etc/acmedns/creds.json"
            }
            "#,
        )
        .unwrap();
        assert_eq!(
            provider.source(),
            &CredentialSource::ConfigFile("/etc/acmedns/creds.json".to_string())
        );
    }

    #[test]
    fn test_inline_account() {
        let provider = parse(
            r#"
            acmedns {
                username "user"
                password "secret"
                subdomain "sub"
                server-url "https://auth.example.org"
            }
            "#,
        )
        .unwrap();
        match provider.source() {
            CredentialSource::Inline(account) => {
                assert_eq!(account.username, "user");
                assert_eq!(account.server_url, "https://auth.example.org");
            }
            other => panic!("expected inline source, got {other:?}"),
        }
    }

    #[test]
    fn test_per_domain_config_block() {
        let provider = parse(
            r#"
            acmedns {
                config {
                    "example.com" {
                        username "u1"
                        password "p1"
                        subdomain "s1"
                        fulldomain "s1.auth.example.org"
                        server-url "https://auth.example.org"
                    }
                    "example.net" {
                        username "u2"
                        password "p2"
                        subdomain "s2"
                        fulldomain "s2.auth.example.org"
                        server-url "https://auth.example.org"
                    }
                }
            }
            "#,
        )
        .unwrap();
        match provider.source() {
            CredentialSource::DomainMap(map) => {
                assert_eq!(map.len(), 2);
                assert_eq!(map["example.net"].username, "u2");
                assert_eq!(map["example.com"].fulldomain, "s1.auth.example.org");
            }
            other => panic!("expected domain map source, got {other:?}"),
        }
    }

    #[test]
    fn test_two_bare_arguments_rejected() {
        let err = parse(r#"acmedns "/a" "/b""#).unwrap_err();
        assert!(matches!(err, AcmeDnsError::Syntax { .. }));
    }

    #[test]
    fn test_non_string_argument_rejected() {
        let err = parse("acmedns 42").unwrap_err();
        assert!(err.to_string().contains("string argument"));
    }

    #[test]
    fn test_subdirective_missing_argument() {
        let err = parse("acmedns { username }").unwrap_err();
        assert!(err.to_string().contains("exactly one argument"));
    }

    #[test]
    fn test_subdirective_extra_argument() {
        let err = parse(r#"acmedns { username "a" "b" }"#).unwrap_err();
        assert!(err.to_string().contains("got 2"));
    }

    #[test]
    fn test_property_style_argument_rejected() {
        let err = parse(r#"acmedns { username name="a" }"#).unwrap_err();
        assert!(err.to_string().contains("does not accept properties"));
    }

    #[test]
    fn test_unrecognized_subdirective_names_token() {
        let err = parse(r#"acmedns { api-key "x" }"#).unwrap_err();
        assert!(err.to_string().contains("'api-key'"));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let err = parse(
            r#"
            acmedns {
                username "a"
                username "a"
                password "p"
                subdomain "s"
                server-url "https://auth.example.org"
            }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AcmeDnsError::DuplicateField { field } if field == "username"));
    }

    #[test]
    fn test_bare_path_plus_subdirective_is_duplicate() {
        let err = parse(
            r#"
            acmedns "/a" {
                config-file-path "/b"
            }
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AcmeDnsError::DuplicateField { field } if field == "config-file-path"
        ));
    }

    #[test]
    fn test_empty_config_block_rejected() {
        let err = parse("acmedns { config { } }").unwrap_err();
        assert!(err.to_string().contains("no domain entries"));
    }

    #[test]
    fn test_config_with_argument_rejected() {
        let err = parse(r#"acmedns { config "x" { } }"#).unwrap_err();
        assert!(err.to_string().contains("takes no arguments"));
    }

    #[test]
    fn test_duplicate_domain_last_one_wins() {
        let provider = parse(
            r#"
            acmedns {
                config {
                    "example.com" {
                        username "first"
                        password "p"
                        subdomain "s"
                        fulldomain "s.auth.example.org"
                        server-url "https://auth.example.org"
                    }
                    "example.com" {
                        username "second"
                        password "p"
                        subdomain "s"
                        fulldomain "s.auth.example.org"
                        server-url "https://auth.example.org"
                    }
                }
            }
            "#,
        )
        .unwrap();
        match provider.source() {
            CredentialSource::DomainMap(map) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map["example.com"].username, "second");
            }
            other => panic!("expected domain map source, got {other:?}"),
        }
    }

    #[test]
    fn test_domain_missing_field() {
        let err = parse(
            r#"
            acmedns {
                config {
                    "example.com" {
                        username "u"
                        password "p"
                        subdomain "s"
                        server-url "https://auth.example.org"
                    }
                }
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing required field 'fulldomain'"));
    }

    #[test]
    fn test_domain_duplicate_field() {
        let err = parse(
            r#"
            acmedns {
                config {
                    "example.com" {
                        username "u"
                        username "u"
                    }
                }
            }
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AcmeDnsError::DuplicateField { field } if field == "username"));
    }

    #[test]
    fn test_domain_unrecognized_field_names_domain() {
        let err = parse(
            r#"
            acmedns {
                config {
                    "example.com" {
                        token "x"
                    }
                }
            }
            "#,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'token'"));
        assert!(message.contains("example.com"));
    }

    #[test]
    fn test_domain_with_argument_rejected() {
        let err = parse(
            r#"
            acmedns {
                config {
                    "example.com" "oops" {
                        username "u"
                    }
                }
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes no arguments"));
    }

    #[test]
    fn test_offset_to_line_col() {
        let content = "first\nsecond\nthird";
        assert_eq!(offset_to_line_col(content, 0), (1, 1));
        assert_eq!(offset_to_line_col(content, 6), (2, 1));
        assert_eq!(offset_to_line_col(content, 8), (2, 3));
    }
}
