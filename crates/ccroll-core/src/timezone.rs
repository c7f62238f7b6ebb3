//! Timezone handling for calendar-date grouping
//!
//! Daily, session, and monthly reports bucket events by the local calendar
//! date of their timestamp. The zone comes from an explicit option, the `TZ`
//! environment variable, or the system setting, in that order. Usage windows
//! ignore this and always use UTC.

use crate::error::{CcrollError, Result};
use chrono_tz::Tz;
use std::str::FromStr;
use tracing::debug;

/// Zone used to turn timestamps into calendar dates
#[derive(Debug, Clone)]
pub struct TimezoneConfig {
    pub tz: Tz,
    /// Set for UTC however it was requested (`--utc`, `--timezone UTC`, `TZ=UTC`)
    pub is_utc: bool,
}

impl Default for TimezoneConfig {
    /// The local zone, detected once per call
    fn default() -> Self {
        Self::named(get_local_timezone())
    }
}

impl TimezoneConfig {
    pub fn utc() -> Self {
        Self::named(Tz::UTC)
    }

    /// Wrap an already parsed zone
    pub fn named(tz: Tz) -> Self {
        Self {
            is_utc: tz == Tz::UTC,
            tz,
        }
    }

    /// Resolve the `--timezone` / `--utc` flag pair
    ///
    /// `--utc` wins over a zone name; with neither, the local zone is used.
    ///
    /// # Errors
    ///
    /// Returns [`CcrollError::InvalidTimezone`] for names outside the IANA database.
    pub fn from_cli(timezone: Option<&str>, use_utc: bool) -> Result<Self> {
        match (use_utc, timezone) {
            (true, _) => Ok(Self::utc()),
            (false, Some(name)) => parse_timezone(name).map(Self::named),
            (false, None) => Ok(Self::default()),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.is_utc { "UTC" } else { self.tz.name() }
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| {
        CcrollError::InvalidTimezone(format!(
            "'{name}'. Expected an IANA name such as 'Europe/Berlin' or 'UTC'"
        ))
    })
}

/// `TZ`, if set to a zone name chrono-tz knows
fn timezone_from_env() -> Option<Tz> {
    let value = std::env::var("TZ").ok()?;
    let tz = Tz::from_str(value.trim()).ok()?;
    debug!("Timezone {} taken from TZ", tz.name());
    Some(tz)
}

/// The operating system's configured zone
fn system_timezone() -> Option<Tz> {
    let name = match iana_time_zone::get_timezone() {
        Ok(name) => name,
        Err(e) => {
            debug!("System timezone unavailable: {:?}", e);
            return None;
        }
    };

    match Tz::from_str(&name) {
        Ok(tz) => {
            debug!("Timezone {} taken from the system", name);
            Some(tz)
        }
        Err(_) => {
            debug!("System reported unknown timezone '{}'", name);
            None
        }
    }
}

/// Detect the local timezone, falling back to UTC
pub fn get_local_timezone() -> Tz {
    timezone_from_env()
        .or_else(system_timezone)
        .unwrap_or_else(|| {
            debug!("Falling back to UTC for calendar dates");
            Tz::UTC
        })
}
