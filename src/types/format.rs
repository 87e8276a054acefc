//! String format constraints

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date regex is valid"));

static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_/-]|[A-Za-z0-9_-][A-Za-z0-9_/-]*[A-Za-z0-9_-])$")
        .expect("slug regex is valid")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .expect("email regex is valid")
});

static HASHTAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,139}$").expect("hashtag regex is valid"));

/// Format a string field's value must satisfy beyond length and pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    #[default]
    Unknown,
    Date,
    DateTime,
    Slug,
    Email,
    Hashtag,
    Hostname,
    Ipv4,
    Ipv6,
    Uri,
    Url,
    Uuid,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Unknown => "unknown",
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Slug => "slug",
            Format::Email => "email",
            Format::Hashtag => "hashtag",
            Format::Hostname => "hostname",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Uri => "uri",
            Format::Url => "url",
            Format::Uuid => "uuid",
        }
    }

    /// Check `value` against this format
    pub fn is_valid(&self, value: &str) -> bool {
        match self {
            Format::Unknown => true,
            Format::Date => DATE_REGEX.is_match(value),
            Format::DateTime => is_iso8601_date_time(value),
            Format::Slug => SLUG_REGEX.is_match(value),
            Format::Email => EMAIL_REGEX.is_match(value),
            Format::Hashtag => is_hashtag(value),
            Format::Ipv4 => value.parse::<Ipv4Addr>().is_ok(),
            Format::Ipv6 => value.parse::<Ipv6Addr>().is_ok(),
            Format::Hostname | Format::Uri | Format::Url => is_url_like(value),
            Format::Uuid => uuid::Uuid::parse_str(value).is_ok(),
        }
    }
}

fn is_iso8601_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").is_ok()
}

/// Hashtags are word characters, optionally prefixed with `#`, never all digits.
fn is_hashtag(value: &str) -> bool {
    let tag = value.strip_prefix('#').unwrap_or(value);
    HASHTAG_REGEX.is_match(tag) && !tag.bytes().all(|b| b.is_ascii_digit())
}

/// Values without a scheme are checked as if they were `https://` urls.
fn is_url_like(value: &str) -> bool {
    let candidate = if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{}", value)
    };

    match url::Url::parse(&candidate) {
        Ok(parsed) => parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}
