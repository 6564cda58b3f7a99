// src/core/normalizer.rs

use std::fmt;
use std::net::IpAddr;

use tracing::debug;
use url::{Host, ParseError, Url};

use crate::core::error::AnalysisError;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";

/// Canonicalizes raw input: trims, lower-cases, and defaults the scheme to `https`.
///
/// The function never touches the network and is idempotent.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.starts_with(HTTP_PREFIX) || lowered.starts_with(HTTPS_PREFIX) {
        lowered
    } else {
        format!("{HTTPS_PREFIX}{lowered}")
    }
}

/// A normalized URL that is known to parse and to carry a non-empty hostname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    raw: String,
    scheme: String,
    host: String,
    port: u16,
    path: String,
    ip: Option<IpAddr>,
}

impl NormalizedUrl {
    /// Parses normalized input.
    ///
    /// Hosts that look numeric but are not valid IPv4 addresses, such as
    /// `999.999.999.999` or `1.2.3.4.5`, are accepted as opaque hostnames so
    /// they can still be analyzed.
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        let raw = normalize(input);
        let invalid = |reason: String| AnalysisError::InvalidUrl { input: input.to_string(), reason };

        let url = match Url::parse(&raw) {
            Ok(parsed) => Self::from_parsed(raw, &parsed),
            Err(ParseError::InvalidIpv4Address) => {
                debug!(url = %raw, "Host is not a valid IPv4 address, keeping it as an opaque name.");
                Self::from_parts(raw).map_err(|reason| invalid(reason.to_string()))?
            }
            Err(e) => return Err(invalid(e.to_string())),
        };

        if url.host.is_empty() {
            return Err(invalid("missing hostname".to_string()));
        }
        Ok(url)
    }

    fn from_parsed(raw: String, parsed: &Url) -> Self {
        let ip = match parsed.host() {
            Some(Host::Ipv4(addr)) => Some(IpAddr::V4(addr)),
            Some(Host::Ipv6(addr)) => Some(IpAddr::V6(addr)),
            _ => None,
        };
        Self {
            scheme: parsed.scheme().to_string(),
            host: parsed.host_str().unwrap_or_default().to_string(),
            port: parsed.port_or_known_default().unwrap_or(443),
            path: parsed.path().to_string(),
            ip,
            raw,
        }
    }

    // Splits `scheme://[userinfo@]host[:port][/path][?query][#fragment]` by hand.
    fn from_parts(raw: String) -> Result<Self, &'static str> {
        let (scheme, rest) = raw.split_once("://").ok_or("missing scheme")?;
        let default_port = if scheme == "http" { 80 } else { 443 };

        let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);
        let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) if port.is_empty() => (host, default_port),
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| "invalid port number")?),
            None => (host_port, default_port),
        };

        let path_end = tail.find(['?', '#']).unwrap_or(tail.len());
        let path = match &tail[..path_end] {
            "" => "/",
            path => path,
        };

        Ok(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            path: path.to_string(),
            ip: None,
            raw,
        })
    }

    /// The normalized string, exactly as produced by [`normalize`].
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Set when the host is an IP literal rather than a name.
    pub fn ip_host(&self) -> Option<IpAddr> {
        self.ip
    }

    /// Explicit port, or the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The same location over plain `http`, for `https` URLs only.
    pub fn downgraded(&self) -> Option<Self> {
        let rest = self.raw.strip_prefix(HTTPS_PREFIX)?;
        Self::parse(&format!("{HTTP_PREFIX}{rest}")).ok()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(normalize("example.com"), "https://example.com");
    }

    #[test]
    fn scheme_and_host_are_lowercased() {
        assert_eq!(normalize("HTTP://Example.COM/X"), "http://example.com/x");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize("  https://example.com/a \n"), "https://example.com/a");
        assert_eq!(normalize("\texample.com "), "https://example.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in [
            "example.com",
            "HTTP://Example.COM/X",
            "  Paypal-Secure-Login.TK ",
            "https://a.b.c.d.e/login?x=1",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn parse_exposes_components() {
        let url = NormalizedUrl::parse("Shop.Example.com:8443/Cart").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com:8443/cart");
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host(), "shop.example.com");
        assert_eq!(url.port(), 8443);
        assert_eq!(url.path(), "/cart");
        assert!(url.ip_host().is_none());
    }

    #[test]
    fn default_ports_follow_the_scheme() {
        assert_eq!(NormalizedUrl::parse("example.com").unwrap().port(), 443);
        assert_eq!(NormalizedUrl::parse("http://example.com").unwrap().port(), 80);
    }

    #[test]
    fn ip_literal_hosts_are_recognised() {
        let url = NormalizedUrl::parse("http://192.168.10.4/admin").unwrap();
        assert_eq!(url.ip_host(), Some("192.168.10.4".parse().unwrap()));
    }

    #[test]
    fn empty_or_hostless_input_is_rejected() {
        for input in ["", "   ", "https://", "https://:443/login"] {
            let err = NormalizedUrl::parse(input).unwrap_err();
            assert!(matches!(err, AnalysisError::InvalidUrl { .. }), "input {input:?}");
        }
    }

    #[test]
    fn invalid_ipv4_lookalikes_are_kept_as_names() {
        let url = NormalizedUrl::parse("999.999.999.999/login").unwrap();
        assert_eq!(url.as_str(), "https://999.999.999.999/login");
        assert_eq!(url.host(), "999.999.999.999");
        assert_eq!(url.path(), "/login");
        assert_eq!(url.port(), 443);
        assert!(url.ip_host().is_none());

        let url = NormalizedUrl::parse("http://user@1.2.3.4.5:8080?q=1").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host(), "1.2.3.4.5");
        assert_eq!(url.port(), 8080);
        assert_eq!(url.path(), "/");

        assert_eq!(NormalizedUrl::parse("256.1.1.1").unwrap().host(), "256.1.1.1");
    }

    #[test]
    fn invalid_ipv4_lookalike_with_bad_port_is_rejected() {
        let err = NormalizedUrl::parse("999.999.999.999:99999/login").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidUrl { .. }));
    }

    #[test]
    fn downgrade_switches_to_plain_http() {
        let url = NormalizedUrl::parse("example.com/path").unwrap();
        let plain = url.downgraded().unwrap();
        assert_eq!(plain.as_str(), "http://example.com/path");
        assert!(plain.downgraded().is_none());
    }
}
