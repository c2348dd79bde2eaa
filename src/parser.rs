//! Parsing of the free-form text printed by the provisioning tools.
//!
//! Nothing in here fails: output that does not match the expected shape
//! yields an empty list, a placeholder credential or `None`.

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Placeholder key written when an OAuth registration did not succeed.
pub const PLACEHOLDER_CONSUMER_KEY: &str = "TWITTER_CONSUMERKEY";
/// Placeholder secret written when an OAuth registration did not succeed.
pub const PLACEHOLDER_CONSUMER_SECRET: &str = "TWITTER_CONSUMERSECRET";

// `+ mocra-primary (123.123.123.123)`
static SLICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[^\w\s]\s*(?P<name>[^\s()]+)\s+\((?P<ip>[^\s()]+)\)\s*$").unwrap()
});

static CONSUMER_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*consumer[ \t]+key[ \t]*:[ \t]*(?P<value>\S[^\r\n]*?)[ \t]*\r?$").unwrap()
});

static CONSUMER_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*consumer[ \t]+secret[ \t]*:[ \t]*(?P<value>\S[^\r\n]*?)[ \t]*\r?$").unwrap()
});

static REGISTRATION_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t]*unable to register").unwrap());

/// A provisioned virtual machine as reported by `slicehost-slice list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub name: String,
    pub ip_address: String,
}

impl Slice {
    pub fn new(name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self { name: name.into(), ip_address: ip_address.into() }
    }
}

/// An OAuth consumer key/secret pair.
///
/// A failed registration is represented by the placeholder pair
/// ([`PLACEHOLDER_CONSUMER_KEY`], [`PLACEHOLDER_CONSUMER_SECRET`]) rather than
/// by an error, see [`OAuthCredential::is_placeholder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthCredential {
    pub key: String,
    pub secret: String,
}

impl OAuthCredential {
    pub fn placeholder() -> Self {
        Self {
            key: PLACEHOLDER_CONSUMER_KEY.to_string(),
            secret: PLACEHOLDER_CONSUMER_SECRET.to_string(),
        }
    }

    /// True when this is the placeholder pair of a failed registration.
    pub fn is_placeholder(&self) -> bool {
        self.key == PLACEHOLDER_CONSUMER_KEY && self.secret == PLACEHOLDER_CONSUMER_SECRET
    }
}

/// Extracts every `<marker> <name> (<ip>)` line, in order of appearance.
///
/// Non-matching lines are skipped and duplicates are kept.
pub fn parse_slice_list(text: &str) -> Vec<Slice> {
    let slices: Vec<Slice> = text
        .lines()
        .filter_map(|line| SLICE_LINE.captures(line))
        .map(|caps| Slice::new(&caps["name"], &caps["ip"]))
        .collect();

    debug!("Parsed {} slice(s) from listing.", slices.len());
    slices
}

/// Reads the consumer key and secret from `twitter register_oauth` output.
///
/// Both labeled lines must be present for the registration to count as a
/// success; anything else yields [`OAuthCredential::placeholder`].
pub fn parse_oauth_registration(text: &str) -> OAuthCredential {
    let key = CONSUMER_KEY.captures(text).map(|caps| caps["value"].to_string());
    let secret = CONSUMER_SECRET.captures(text).map(|caps| caps["value"].to_string());

    match (key, secret) {
        (Some(key), Some(secret)) => {
            debug!("OAuth registration succeeded.");
            OAuthCredential { key, secret }
        }
        _ => {
            if REGISTRATION_ERROR.is_match(text) {
                warn!("OAuth registration was rejected: {}", first_line(text));
            } else {
                warn!("OAuth registration output not recognised, using placeholder keys.");
            }
            OAuthCredential::placeholder()
        }
    }
}

/// Returns the first non-blank line of a config lookup such as
/// `git config --get github.user`, trimmed.
pub fn parse_config_value(text: &str) -> Option<String> {
    text.lines().map(str::trim).find(|line| !line.is_empty()).map(str::to_string)
}

fn first_line(text: &str) -> &str {
    text.lines().map(str::trim).find(|line| !line.is_empty()).unwrap_or_default()
}
