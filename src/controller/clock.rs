use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Source of the local wall-clock time that defines "today".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// Host local time zone
    Local,
    Zone(Tz),
    /// Frozen time, for replaying a cycle
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn from_timezone(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(Self::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(Self::Zone)
                .map_err(|e| anyhow!("invalid timezone {name:?}: {e}")),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::Local => Local::now().naive_local(),
            Self::Zone(tz) => Utc::now().with_timezone(tz).naive_local(),
            Self::Fixed(at) => *at,
        }
    }
}
