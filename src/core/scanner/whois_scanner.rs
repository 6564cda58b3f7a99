// src/core/scanner/whois_scanner.rs

use std::io::{Read, Write};
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::deadline::run_with_deadline;
use crate::core::models::DomainAge;

// --- WHOIS Records ---

/// A creation date as a WHOIS client reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationDate {
    Timestamp(DateTime<Utc>),
    Text(String),
    /// Several values for the same field; the first one wins.
    List(Vec<CreationDate>),
}

/// The parts of a registration record the age lookup cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhoisRecord {
    pub domain: String,
    pub creation_date: Option<CreationDate>,
    /// Registries that publish a bare `created:` field instead.
    pub created: Option<CreationDate>,
}

#[derive(Debug, Error)]
pub enum WhoisError {
    #[error("could not reach WHOIS server {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to WHOIS server {server}: {source}")]
    Io {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WHOIS server {server} returned an empty response")]
    EmptyResponse { server: String },
}

/// A blocking registration-record lookup.
///
/// Implementations may block for a long time or never return; callers bound
/// them with [`run_with_deadline`].
pub trait WhoisClient: Send + Sync {
    fn lookup(&self, domain: &str) -> Result<WhoisRecord, WhoisError>;
}

// --- Domain Age ---

pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(6);

/// Resolves the registration age of a hostname, never failing.
#[derive(Clone)]
pub struct DomainAgeLookup {
    client: Arc<dyn WhoisClient>,
    deadline: Duration,
}

impl DomainAgeLookup {
    pub fn new(client: Arc<dyn WhoisClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Looks up `host` and returns its age in whole days.
    ///
    /// Timeouts, transport errors, missing data and unparseable dates all
    /// degrade to [`DomainAge::Unknown`].
    pub async fn lookup(&self, host: &str) -> DomainAge {
        let domain = strip_www(host).to_string();
        if domain.starts_with('[') || domain.parse::<IpAddr>().is_ok() {
            debug!(domain = %domain, "IP literal has no registration record.");
            return DomainAge::Unknown;
        }
        if has_numeric_tld(&domain) {
            debug!(domain = %domain, "Numeric top-level label has no registry.");
            return DomainAge::Unknown;
        }

        info!(domain = %domain, deadline = ?self.deadline, "Starting domain age lookup.");
        let client = Arc::clone(&self.client);
        let query = domain.clone();
        let record = match run_with_deadline("whois", self.deadline, move || client.lookup(&query)).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!(domain = %domain, error = %e, "WHOIS lookup failed.");
                return DomainAge::Unknown;
            }
            Err(e) => {
                warn!(domain = %domain, error = %e, "WHOIS lookup did not complete.");
                return DomainAge::Unknown;
            }
        };

        match resolve_creation_date(&record).and_then(|created| age_in_days(created, Utc::now())) {
            Some(days) => {
                info!(domain = %domain, days, "Domain age resolved.");
                DomainAge::Known(days)
            }
            None => {
                warn!(domain = %domain, "WHOIS record has no usable creation date.");
                DomainAge::Unknown
            }
        }
    }
}

fn has_numeric_tld(domain: &str) -> bool {
    domain
        .rsplit('.')
        .next()
        .is_some_and(|label| !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()))
}

pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Picks the creation date out of a record: `creation_date` when present,
/// otherwise `created`; the first entry of a list; text parsed by [`parse_date_text`].
pub fn resolve_creation_date(record: &WhoisRecord) -> Option<DateTime<Utc>> {
    let field = record
        .creation_date
        .as_ref()
        .filter(|d| !is_empty(d))
        .or(record.created.as_ref())?;
    first_date(field)
}

fn is_empty(date: &CreationDate) -> bool {
    match date {
        CreationDate::List(items) => items.is_empty(),
        CreationDate::Text(text) => text.trim().is_empty(),
        CreationDate::Timestamp(_) => false,
    }
}

fn first_date(date: &CreationDate) -> Option<DateTime<Utc>> {
    match date {
        CreationDate::Timestamp(ts) => Some(*ts),
        CreationDate::Text(text) => parse_date_text(text),
        CreationDate::List(items) => items.first().and_then(first_date),
    }
}

/// ISO-8601 first (with or without offset; naive values are taken as UTC),
/// then a plain `YYYY-MM-DD` date.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whole days between `created` and `now`; `None` for dates in the future.
pub fn age_in_days(created: DateTime<Utc>, now: DateTime<Utc>) -> Option<u32> {
    u32::try_from(now.signed_duration_since(created).num_days()).ok()
}

// --- Port-43 Client ---

const WHOIS_PORT: u16 = 43;
const IANA_SERVER: &str = "whois.iana.org";

// Registries answered directly; anything else is looked up through IANA.
const REGISTRY_SERVERS: &[(&str, &str)] = &[
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.nic.info"),
    ("io", "whois.nic.io"),
    ("uk", "whois.nic.uk"),
    ("de", "whois.denic.de"),
    ("fr", "whois.nic.fr"),
    ("it", "whois.nic.it"),
    ("nl", "whois.domain-registry.nl"),
    ("ca", "whois.cira.ca"),
    ("au", "whois.auda.org.au"),
    ("tk", "whois.dot.tk"),
];

const TWO_PART_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "edu.au", "co.jp", "co.kr", "com.br",
    "co.za", "com.mx", "co.in", "com.sg", "co.nz", "com.ar", "co.il",
];

static RE_CREATION_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:creation date|domain registration date|registration date|registration time|registered on|domain_date_created|create_date|created_date|created on)\s*:\s*(.+?)\s*$",
    )
    .unwrap()
});
static RE_CREATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*created\s*:\s*(.+?)\s*$").unwrap());
static RE_REGISTRAR_REFERRAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*registrar whois server\s*:\s*(\S+)").unwrap());
static RE_IANA_REFER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*refer\s*:\s*(\S+)").unwrap());

/// Plain-text WHOIS over TCP port 43 with connect and read timeouts.
#[derive(Debug, Clone)]
pub struct TcpWhoisClient {
    io_timeout: Duration,
    server_override: Option<String>,
}

impl TcpWhoisClient {
    pub fn new(io_timeout: Duration, server_override: Option<String>) -> Self {
        Self { io_timeout, server_override }
    }

    fn server_for(&self, domain: &str) -> Result<String, WhoisError> {
        if let Some(server) = &self.server_override {
            return Ok(server.clone());
        }

        let tld = domain.rsplit('.').next().unwrap_or(domain);
        if let Some((_, server)) = REGISTRY_SERVERS.iter().find(|(t, _)| *t == tld) {
            return Ok(server.to_string());
        }

        debug!(tld, "Asking IANA for the registry WHOIS server.");
        let answer = self.query(IANA_SERVER, tld)?;
        Ok(capture(&RE_IANA_REFER, &answer).unwrap_or_else(|| IANA_SERVER.to_string()))
    }

    fn query(&self, server: &str, query: &str) -> Result<String, WhoisError> {
        debug!(server, query, "Sending WHOIS query.");
        let connect_err = |source| WhoisError::Connect { server: server.to_string(), source };
        let io_err = |source| WhoisError::Io { server: server.to_string(), source };

        let addr = (server, WHOIS_PORT)
            .to_socket_addrs()
            .map_err(connect_err)?
            .next()
            .ok_or_else(|| connect_err(std::io::Error::new(std::io::ErrorKind::NotFound, "no address")))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.io_timeout).map_err(connect_err)?;
        stream.set_read_timeout(Some(self.io_timeout)).map_err(io_err)?;
        stream.set_write_timeout(Some(self.io_timeout)).map_err(io_err)?;
        stream.write_all(format!("{query}\r\n").as_bytes()).map_err(io_err)?;

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).map_err(io_err)?;
        if raw.is_empty() {
            return Err(WhoisError::EmptyResponse { server: server.to_string() });
        }
        debug!(server, bytes = raw.len(), "Received WHOIS response.");
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl WhoisClient for TcpWhoisClient {
    fn lookup(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let root = registrable_domain(domain);
        let server = self.server_for(&root)?;
        let text = self.query(&server, &root)?;
        let record = parse_whois_text(&root, &text);

        if record.creation_date.is_some() || record.created.is_some() {
            return Ok(record);
        }

        // Thin registries leave the creation date to the registrar.
        match capture(&RE_REGISTRAR_REFERRAL, &text).map(|s| strip_scheme(&s).to_string()) {
            Some(referral) if referral != server => match self.query(&referral, &root) {
                Ok(text) => Ok(parse_whois_text(&root, &text)),
                Err(e) => {
                    debug!(referral = %referral, error = %e, "Registrar referral failed.");
                    Ok(record)
                }
            },
            _ => Ok(record),
        }
    }
}

/// Reduces a hostname to the name a registry knows about,
/// e.g. `mail.example.co.uk` becomes `example.co.uk`.
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.trim_end_matches('.').split('.').collect();
    if labels.len() < 2 {
        return host.to_string();
    }

    let suffix = labels[labels.len() - 2..].join(".");
    let keep = if labels.len() >= 3 && TWO_PART_SUFFIXES.contains(&suffix.as_str()) { 3 } else { 2 };
    labels[labels.len() - keep..].join(".")
}

/// Extracts creation-date fields from a free-text WHOIS response.
pub fn parse_whois_text(domain: &str, text: &str) -> WhoisRecord {
    WhoisRecord {
        domain: domain.to_string(),
        creation_date: collect_dates(&RE_CREATION_DATE, text),
        created: collect_dates(&RE_CREATED, text),
    }
}

fn collect_dates(re: &Regex, text: &str) -> Option<CreationDate> {
    let mut values: Vec<CreationDate> = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| to_creation_date(m.as_str()))
        .collect();

    match values.len() {
        0 => None,
        1 => values.pop(),
        _ => Some(CreationDate::List(values)),
    }
}

// ISO values stay text for the shared parser; a few registry-specific layouts
// are converted here.
fn to_creation_date(value: &str) -> CreationDate {
    if parse_date_text(value).is_none() {
        if let Some(ts) = parse_registry_date(value) {
            return CreationDate::Timestamp(ts);
        }
    }
    CreationDate::Text(value.to_string())
}

fn parse_registry_date(value: &str) -> Option<DateTime<Utc>> {
    let token = value.split_whitespace().next()?;
    ["%d-%b-%Y", "%d.%m.%Y", "%Y.%m.%d", "%Y/%m/%d", "%m/%d/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn strip_scheme(server: &str) -> &str {
    server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server)
        .trim_end_matches('/')
}
