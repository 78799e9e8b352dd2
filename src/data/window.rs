use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};

const MILLIS_PER_DAY: f64 = 24.0 * 3600.0 * 1000.0;
const DAY_MILLIS: i64 = 86_400_000;

/// Fixed-width time window, written the way pandas offset aliases are
/// (`"1s"`, `"60s"`, `"5min"`, `"1h"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    millis: i64,
    label: String,
}

impl Window {
    /// `secs` must be strictly positive.
    pub(crate) fn from_secs(secs: i64) -> Window {
        Window {
            millis: secs * 1000,
            label: format!("{secs}s"),
        }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn as_days(&self) -> f64 {
        self.millis as f64 / MILLIS_PER_DAY
    }

    pub fn floor(&self, t: &DateTime<Utc>) -> Bucket {
        self.floor_millis(t.timestamp_millis())
    }

    pub fn floor_millis(&self, millis: i64) -> Bucket {
        Bucket::from_millis(millis.div_euclid(self.millis) * self.millis)
    }

    /// Floors `millis` onto the grid of windows starting at `origin`.
    pub fn floor_millis_from(&self, origin: i64, millis: i64) -> Bucket {
        Bucket::from_millis(origin + (millis - origin).div_euclid(self.millis) * self.millis)
    }
}

/// UTC midnight of the day holding `millis`.
pub fn start_of_day(millis: i64) -> i64 {
    millis.div_euclid(DAY_MILLIS) * DAY_MILLIS
}

impl Default for Window {
    fn default() -> Self {
        Window::from_secs(60)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl FromStr for Window {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Window, Self::Err> {
        let trimmed = input.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (amount, unit) = trimmed.split_at(split);

        // A bare unit means one of it, as in pandas ("min" == "1min")
        let amount: i64 = if amount.is_empty() {
            1
        } else {
            amount
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid window amount (window={input}, error={e})"))?
        };

        let unit_millis = match unit {
            "ms" | "L" => 1,
            "s" | "S" | "sec" => 1_000,
            "min" | "T" | "m" => 60_000,
            "h" | "H" => 3_600_000,
            "d" | "D" => DAY_MILLIS,
            _ => anyhow::bail!("unrecognized window unit (window={input})"),
        };

        if amount <= 0 {
            anyhow::bail!("window must be strictly positive (window={input})");
        }

        let Some(millis) = amount.checked_mul(unit_millis) else {
            anyhow::bail!("window too large (window={input})");
        };

        Ok(Window {
            millis,
            label: trimmed.to_string(),
        })
    }
}

/// Half-open time interval identified by its floor timestamp, in
/// milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket {
    start_millis: i64,
}

impl Bucket {
    pub fn from_millis(start_millis: i64) -> Bucket {
        Bucket { start_millis }
    }

    pub fn start_millis(&self) -> i64 {
        self.start_millis
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_millis)
    }

    /// Position on a date axis measured in days since the epoch.
    pub fn as_days(&self) -> f64 {
        self.start_millis as f64 / MILLIS_PER_DAY
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.start() {
            Some(start) => write!(f, "{}", start.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "{}ms", self.start_millis),
        }
    }
}

/// Formats a date-axis value (days since the epoch) as `HH:MM`.
pub fn format_hour_minute(days: f64) -> String {
    match DateTime::from_timestamp_millis((days * MILLIS_PER_DAY).round() as i64) {
        Some(t) => t.format("%H:%M").to_string(),
        None => String::new(),
    }
}
