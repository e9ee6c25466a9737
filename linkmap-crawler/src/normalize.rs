use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::NormalizeError;

/// A normalized root-domain identity: the lowercased host of a URL with
/// scheme, path, query, and fragment stripped.
///
/// Two domains are equal iff their normalized strings are equal.
/// `www.messenger.com` and `messenger.com` are deliberately distinct
/// identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Parse a seed as given on the command line or in a hosts file.
    /// Accepts a bare host (`facebook.com`) or a full URL
    /// (`https://facebook.com/whatever`).
    pub fn parse(input: &str) -> Result<Self, NormalizeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(NormalizeError::Syntax(input.to_string()));
        }
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let url =
            Url::parse(&candidate).map_err(|_| NormalizeError::Syntax(input.to_string()))?;
        domain_of(&url, input)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a raw href against the page it was found on and reduce it to
/// the target's domain identity.
///
/// Anything that cannot name a fetchable http(s) host is rejected:
/// `mailto:`, `javascript:`, `tel:`, fragment-only links, malformed
/// syntax. Callers drop rejected links and move on.
pub fn normalize(raw_href: &str, base: &Url) -> Result<Domain, NormalizeError> {
    let href = raw_href.trim();
    if href.is_empty() || href.starts_with('#') {
        return Err(NormalizeError::Syntax(raw_href.to_string()));
    }
    let resolved = base
        .join(href)
        .map_err(|_| NormalizeError::Syntax(raw_href.to_string()))?;
    domain_of(&resolved, raw_href)
}

fn domain_of(url: &Url, original: &str) -> Result<Domain, NormalizeError> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(NormalizeError::UnsupportedScheme(other.to_string())),
    }
    let host = url
        .host_str()
        .ok_or_else(|| NormalizeError::NoHost(original.to_string()))?;
    Ok(Domain(host.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://facebook.com/").unwrap()
    }

    #[test]
    fn test_normalize_absolute_link() {
        let domain = normalize("https://www.messenger.com/path?query", &base()).unwrap();
        assert_eq!(domain.as_str(), "www.messenger.com");
    }

    #[test]
    fn test_normalize_keeps_www_distinct() {
        let with_www = normalize("https://www.messenger.com/path?query", &base()).unwrap();
        let without = normalize("https://messenger.com/", &base()).unwrap();
        assert_ne!(with_www, without);
    }

    #[test]
    fn test_normalize_relative_link_resolves_against_base() {
        let domain = normalize("/photos/123", &base()).unwrap();
        assert_eq!(domain.as_str(), "facebook.com");
    }

    #[test]
    fn test_normalize_protocol_relative_link() {
        let domain = normalize("//cdn.example.com/app.js", &base()).unwrap();
        assert_eq!(domain.as_str(), "cdn.example.com");
    }

    #[test]
    fn test_normalize_lowercases_host() {
        let domain = normalize("HTTPS://WWW.Example.COM/About", &base()).unwrap();
        assert_eq!(domain.as_str(), "www.example.com");
    }

    #[test]
    fn test_normalize_rejects_javascript() {
        assert!(matches!(
            normalize("javascript:void(0)", &base()),
            Err(NormalizeError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_mailto() {
        assert!(matches!(
            normalize("mailto:a@b.com", &base()),
            Err(NormalizeError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_tel() {
        assert!(normalize("tel:+15551234567", &base()).is_err());
    }

    #[test]
    fn test_normalize_rejects_fragment_only() {
        assert!(matches!(
            normalize("#section", &base()),
            Err(NormalizeError::Syntax(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(normalize("", &base()).is_err());
        assert!(normalize("   ", &base()).is_err());
    }

    #[test]
    fn test_parse_bare_host() {
        let domain = Domain::parse("facebook.com").unwrap();
        assert_eq!(domain.as_str(), "facebook.com");
    }

    #[test]
    fn test_parse_full_url() {
        let domain = Domain::parse("https://news.ycombinator.com/item?id=1").unwrap();
        assert_eq!(domain.as_str(), "news.ycombinator.com");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Domain::parse("not a valid url!!!").is_err());
        assert!(Domain::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_http_scheme() {
        assert!(matches!(
            Domain::parse("ftp://mirror.example.com"),
            Err(NormalizeError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_domain_display_round_trip() {
        let domain = Domain::parse("Example.COM").unwrap();
        assert_eq!(domain.to_string(), "example.com");
    }
}
