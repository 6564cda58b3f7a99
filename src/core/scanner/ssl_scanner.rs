// src/core/scanner/ssl_scanner.rs

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use native_tls::{Certificate, TlsConnector};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

use crate::core::models::{CertificateInfo, TlsStatus};
use crate::core::normalizer::NormalizedUrl;

/// Checks whether a URL is served over a verifiable TLS connection.
#[async_trait]
pub trait TlsProbe: Send + Sync {
    async fn check(&self, url: &NormalizedUrl) -> TlsStatus;
}

/// Handshake probe using the platform trust store through `native-tls`.
pub struct NativeTlsProbe {
    timeout: Duration,
    resolver: TokioAsyncResolver,
}

impl NativeTlsProbe {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        Self {
            timeout,
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }

    async fn resolve(&self, url: &NormalizedUrl) -> Result<SocketAddr, String> {
        if let Some(ip) = url.ip_host() {
            return Ok(SocketAddr::new(ip, url.port()));
        }

        debug!(host = url.host(), "Resolving host for TLS connection.");
        let lookup = self
            .resolver
            .lookup_ip(url.host())
            .await
            .map_err(|e| format!("DNS Error: {}", e))?;
        lookup
            .iter()
            .next()
            .map(|ip| SocketAddr::new(ip, url.port()))
            .ok_or_else(|| "DNS Error: no addresses".to_string())
    }

    async fn scan(&self, url: &NormalizedUrl) -> Result<TlsStatus, String> {
        let addr = self.resolve(url).await?;

        // SNI needs the bare name; IP literals are passed in their textual form.
        let server_name = url.ip_host().map(|ip| ip.to_string()).unwrap_or_else(|| url.host().to_string());
        let timeout = self.timeout;

        debug!("Spawning blocking task for TLS connection.");
        spawn_blocking(move || perform_tls_scan(&server_name, addr, timeout))
            .await
            .unwrap_or_else(|e| {
                error!(panic = %e, "Blocking SSL scan task panicked!");
                Err(format!("Task panicked: {}", e))
            })
    }
}

#[async_trait]
impl TlsProbe for NativeTlsProbe {
    /// Resolution and handshake together are bounded by the probe timeout.
    async fn check(&self, url: &NormalizedUrl) -> TlsStatus {
        if !url.is_https() {
            debug!(url = %url, "Plain HTTP URL, skipping TLS handshake.");
            return TlsStatus::Absent;
        }

        info!(host = url.host(), "Starting SSL/TLS scan.");
        match tokio::time::timeout(self.timeout, self.scan(url)).await {
            Ok(Ok(status)) => {
                info!(ssl_valid = status.ssl_valid(), "SSL/TLS scan finished.");
                status
            }
            Ok(Err(e)) => {
                warn!(host = url.host(), error = %e, "SSL/TLS scan failed.");
                TlsStatus::Absent
            }
            Err(_) => {
                warn!(host = url.host(), timeout = ?self.timeout, "SSL/TLS scan timed out.");
                TlsStatus::Absent
            }
        }
    }
}

fn perform_tls_scan(server_name: &str, addr: SocketAddr, timeout: Duration) -> Result<TlsStatus, String> {
    debug!(server_name, %addr, "Performing TLS connection and handshake.");

    let connector = TlsConnector::new().map_err(|e| format!("TlsConnector Error: {}", e))?;

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|e| format!("TCP Connection Error: {}", e))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| format!("Socket Error: {}", e))?;

    let stream = connector
        .connect(server_name, stream)
        .map_err(|e| format!("TLS Handshake Error: {}", e))?;

    match stream.peer_certificate() {
        Ok(Some(cert)) => {
            debug!("Peer certificate found.");
            Ok(TlsStatus::Secured {
                certificate_present: true,
                certificate: certificate_info(&cert),
            })
        }
        Ok(None) => {
            debug!("TLS connection successful, but no peer certificate provided.");
            Ok(TlsStatus::Secured { certificate_present: false, certificate: None })
        }
        Err(e) => Err(format!("Could not get peer certificate: {}", e)),
    }
}

// Details are best effort; a certificate that cannot be decoded still counts as present.
fn certificate_info(cert: &Certificate) -> Option<CertificateInfo> {
    let der = cert
        .to_der()
        .map_err(|e| warn!(error = %e, "Failed to convert certificate to DER format"))
        .ok()?;
    let (_, x509) = parse_x509_certificate(&der)
        .map_err(|e| warn!(error = %e, "Failed to parse X.509 certificate"))
        .ok()?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Successfully parsed certificate.");

    let validity = x509.validity();
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);

    Some(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
