use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tolerance around a measured value. Relative tolerances (ppm, percent) are converted to
/// absolute dalton windows at the point of use, so the search engines only ever see absolute
/// windows.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum Tolerance {
    /// An absolute window in dalton.
    Absolute(f64),
    /// A relative window in parts per million of the target value.
    Ppm(f64),
    /// A relative window in percent of the target value.
    Percent(f64),
}

impl Tolerance {
    /// The half width of the window around the given value, in the unit of the value.
    pub fn half_width(&self, value: f64) -> f64 {
        match self {
            Self::Absolute(da) => da.abs(),
            Self::Ppm(ppm) => (value * ppm / 1e6).abs(),
            Self::Percent(percent) => (value * percent / 100.0).abs(),
        }
    }

    /// The lower and upper bound of the window around the given value.
    pub fn bounds(&self, value: f64) -> (f64, f64) {
        let half = self.half_width(value);
        (value - half, value + half)
    }

    /// Check if the measured value lies within the window around the target.
    pub fn contains(&self, target: f64, measured: f64) -> bool {
        let (low, high) = self.bounds(target);
        (low..=high).contains(&measured)
    }
}

/// The error returned when a tolerance string cannot be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid tolerance {0:?}, expected a number followed by `da`, `ppm`, or `%`")]
pub struct ToleranceParseError(String);

impl std::str::FromStr for Tolerance {
    type Err = ToleranceParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .ok_or_else(|| ToleranceParseError(s.to_string()))?;
        let (number, unit) = trimmed.split_at(split);
        let number: f64 = number
            .parse()
            .map_err(|_| ToleranceParseError(s.to_string()))?;
        match unit.trim().to_ascii_lowercase().as_str() {
            "da" | "dalton" => Ok(Self::Absolute(number)),
            "ppm" => Ok(Self::Ppm(number)),
            "%" | "percent" => Ok(Self::Percent(number)),
            _ => Err(ToleranceParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute(da) => write!(f, "{da} da"),
            Self::Ppm(ppm) => write!(f, "{ppm} ppm"),
            Self::Percent(percent) => write!(f, "{percent} %"),
        }
    }
}
