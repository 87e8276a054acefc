//! Microsecond-precision timestamps with a sortable string form

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{Result, SchemaError};

/// Unix seconds plus microseconds
///
/// Renders as the seconds followed by the zero-padded 6 digit microseconds,
/// e.g. `1419509594123456`, so string order matches time order for any
/// timestamp after 2001-09-09.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Microtime {
    sec: i64,
    usec: u32,
}

impl Microtime {
    pub fn new(sec: i64, usec: u32) -> Result<Self> {
        if sec < 0 || usec > 999_999 {
            return Err(SchemaError::validation(
                "microtime",
                (sec, usec),
                "seconds must be non-negative and microseconds below 1000000",
            ));
        }
        Ok(Self { sec, usec })
    }

    pub fn now() -> Self {
        Self::from_date_time(&Utc::now())
    }

    pub fn from_date_time(dt: &DateTime<Utc>) -> Self {
        Self {
            sec: dt.timestamp().max(0),
            usec: dt.timestamp_subsec_micros().min(999_999),
        }
    }

    /// Parse the concatenated seconds+microseconds string form
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SchemaError::validation("microtime", s, reason);

        if s.len() < 7 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must be at least 7 digits"));
        }

        let (sec, usec) = s.split_at(s.len() - 6);
        let sec = sec.parse().map_err(|_| invalid("seconds out of range"))?;
        let usec = usec.parse().map_err(|_| invalid("microseconds out of range"))?;
        Self::new(sec, usec)
    }

    pub fn seconds(&self) -> i64 {
        self.sec
    }

    pub fn microseconds(&self) -> u32 {
        self.usec
    }

    pub fn to_date_time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.sec, self.usec * 1_000).single()
    }
}

impl fmt::Display for Microtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:06}", self.sec, self.usec)
    }
}
