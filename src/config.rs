//! Competition configuration loading and validation

use crate::error::{BiathlonError, ConfigError};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Read-only competition parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionConfig {
    /// Amount of laps for the main distance
    pub laps: u32,
    /// Length of each main lap in meters
    pub lap_len: f64,
    /// Length of each penalty lap in meters
    pub penalty_len: f64,
    /// Number of firing lines per lap
    pub firing_lines: u32,
    /// Planned start time for the first competitor
    pub start: NaiveTime,
    /// Planned interval between starts
    #[serde(serialize_with = "crate::report::serialize_millis")]
    pub start_delta: Duration,
}

/// On-disk shape of the configuration, before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    laps: u32,
    lap_len: f64,
    penalty_len: f64,
    #[serde(default)]
    firing_lines: u32,
    start: String,
    start_delta: String,
}

impl CompetitionConfig {
    /// Create a configuration with the given distance parameters
    ///
    /// Start schedule defaults to midnight with no interval.
    pub fn new(laps: u32, lap_len: f64, penalty_len: f64) -> Self {
        Self {
            laps,
            lap_len,
            penalty_len,
            firing_lines: 0,
            start: NaiveTime::MIN,
            start_delta: Duration::zero(),
        }
    }

    /// Set the number of firing lines per lap
    pub fn with_firing_lines(mut self, firing_lines: u32) -> Self {
        self.firing_lines = firing_lines;
        self
    }

    /// Set the planned start schedule
    pub fn with_schedule(mut self, start: NaiveTime, start_delta: Duration) -> Self {
        self.start = start;
        self.start_delta = start_delta;
        self
    }

    /// Parse and validate a configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BiathlonError> {
        let data = fs::read_to_string(path)?;
        Ok(Self::from_json(&data)?)
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.laps < 1 {
            return Err(ConfigError::InvalidValue {
                field: "laps",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.lap_len > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "lapLen",
                reason: format!("must be positive, got {}", self.lap_len),
            });
        }
        if !(self.penalty_len > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "penaltyLen",
                reason: format!("must be positive, got {}", self.penalty_len),
            });
        }
        if self.start_delta < Duration::zero() {
            return Err(ConfigError::InvalidValue {
                field: "startDelta",
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Number of firing bouts a competitor completing the distance goes through
    pub fn expected_bouts(&self) -> u32 {
        self.laps.saturating_mul(self.firing_lines)
    }
}

impl TryFrom<RawConfig> for CompetitionConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let start = parse_time_of_day(&raw.start).ok_or_else(|| ConfigError::InvalidTime {
            field: "start",
            value: raw.start.clone(),
        })?;
        let start_delta = parse_interval(&raw.start_delta).ok_or_else(|| ConfigError::InvalidTime {
            field: "startDelta",
            value: raw.start_delta.clone(),
        })?;

        let config = CompetitionConfig {
            laps: raw.laps,
            lap_len: raw.lap_len,
            penalty_len: raw.penalty_len,
            firing_lines: raw.firing_lines,
            start,
            start_delta,
        };
        config.validate()?;
        Ok(config)
    }
}

/// `HH:MM:SS` with an optional fractional part
fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f").ok()
}

/// `HH:MM:SS` read as a span since midnight
fn parse_interval(value: &str) -> Option<Duration> {
    parse_time_of_day(value).map(|t| t.signed_duration_since(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "laps": 2,
        "lapLen": 3651,
        "penaltyLen": 50,
        "firingLines": 1,
        "start": "09:30:00",
        "startDelta": "00:00:30"
    }"#;

    #[test]
    fn test_from_json_valid() {
        let config = CompetitionConfig::from_json(VALID).unwrap();
        assert_eq!(config.laps, 2);
        assert_eq!(config.lap_len, 3651.0);
        assert_eq!(config.penalty_len, 50.0);
        assert_eq!(config.firing_lines, 1);
        assert_eq!(config.start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.start_delta, Duration::seconds(30));
        assert_eq!(config.expected_bouts(), 2);
    }

    #[test]
    fn test_from_json_accepts_fractional_start() {
        let json = VALID.replace("\"09:30:00\"", "\"09:30:00.500\"");
        let config = CompetitionConfig::from_json(&json).unwrap();
        assert_eq!(config.start, NaiveTime::from_hms_milli_opt(9, 30, 0, 500).unwrap());
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let json = VALID.replace("\"laps\": 2", "\"laps\": \"bad\"");
        assert!(matches!(
            CompetitionConfig::from_json(&json),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_bad_times() {
        let json = VALID.replace("\"09:30:00\"", "\"bad\"");
        assert!(matches!(
            CompetitionConfig::from_json(&json),
            Err(ConfigError::InvalidTime { field: "start", .. })
        ));

        let json = VALID.replace("\"00:00:30\"", "\"30s\"");
        assert!(matches!(
            CompetitionConfig::from_json(&json),
            Err(ConfigError::InvalidTime { field: "startDelta", .. })
        ));
    }

    #[test]
    fn test_from_json_rejects_zero_laps() {
        let json = VALID.replace("\"laps\": 2", "\"laps\": 0");
        assert!(matches!(
            CompetitionConfig::from_json(&json),
            Err(ConfigError::InvalidValue { field: "laps", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_lengths() {
        assert!(CompetitionConfig::new(1, 0.0, 50.0).validate().is_err());
        assert!(CompetitionConfig::new(1, 1000.0, -1.0).validate().is_err());
        assert!(CompetitionConfig::new(1, 1000.0, 150.0).validate().is_ok());
    }
}
