use log::error;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A physical magnitude tagged with the name of its unit, e.g. `3600
/// req/hour` or `1 hour`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: &str) -> Quantity {
        Quantity {
            magnitude,
            unit: unit.to_string(),
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit)
    }
}

/// Unit definitions used to interpret the quantities found in allocation
/// solutions. Passed explicitly to whoever needs conversions; custom units
/// are added with `with_time_unit`.
#[derive(Clone, Debug)]
pub struct UnitContext {
    /// Seconds per time unit.
    time_units: BTreeMap<String, f64>,
    /// Names accepted as "requests" in the numerator of a rate.
    request_units: Vec<String>,
}

impl Default for UnitContext {
    fn default() -> Self {
        let mut time_units = BTreeMap::new();
        for (names, secs) in [
            (&["ms", "millisecond", "milliseconds"][..], 1e-3),
            (&["s", "sec", "second", "seconds"][..], 1.0),
            (&["min", "minute", "minutes"][..], 60.0),
            (&["h", "hour", "hours"][..], 3600.0),
            (&["day", "days"][..], 86400.0),
        ] {
            for name in names {
                time_units.insert(name.to_string(), secs);
            }
        }

        UnitContext {
            time_units,
            request_units: ["req", "reqs", "request", "requests"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl UnitContext {
    pub fn with_time_unit(mut self, name: &str, secs: f64) -> Self {
        self.time_units.insert(name.to_string(), secs);
        self
    }

    fn seconds_per(&self, unit: &str) -> anyhow::Result<f64> {
        match self.time_units.get(unit.trim()) {
            Some(secs) => Ok(*secs),
            None => {
                error!("unrecognized time unit (unit={unit})");
                anyhow::bail!("unrecognized time unit (unit={unit})");
            }
        }
    }

    /// Converts a duration to seconds.
    pub fn to_seconds(&self, quantity: &Quantity) -> anyhow::Result<f64> {
        Ok(quantity.magnitude * self.seconds_per(&quantity.unit)?)
    }

    /// Converts a request rate (`req/hour`, `requests/s`, `rps`, `rph`) to
    /// requests per second.
    pub fn to_requests_per_second(&self, quantity: &Quantity) -> anyhow::Result<f64> {
        let unit = quantity.unit.trim();
        let per_time = match unit {
            "rps" => "s",
            "rpm" => "min",
            "rph" => "hour",
            _ => match unit.split_once('/') {
                Some((num, den)) if self.request_units.iter().any(|r| r == num.trim()) => den,
                _ => {
                    error!("unrecognized rate unit (unit={unit})");
                    anyhow::bail!("unrecognized rate unit (unit={unit})");
                }
            },
        };

        Ok(quantity.magnitude / self.seconds_per(per_time)?)
    }
}
