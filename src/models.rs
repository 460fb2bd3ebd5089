//! Simple data models for the energy dashboard.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---

/// A monitored metering point (PAC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Device {
    // ---
    pub id: &'static str,
    pub name: &'static str,
}

/// Fixed set of devices polled by the accumulator, in display order.
pub const DEVICES: &[Device] = &[
    Device {
        id: "PAC_01",
        name: "TRAFO 1",
    },
    Device {
        id: "PAC_02",
        name: "MACERAÇÃO",
    },
    Device {
        id: "PAC_03",
        name: "SECADOR",
    },
];

/// Look up a device of the static list by id.
pub fn find_device(id: &str) -> Option<&'static Device> {
    DEVICES.iter().find(|d| d.id == id)
}

/// Display name of a device id, falling back to the id itself.
pub fn device_name(id: &str) -> &str {
    find_device(id).map_or(id, |d| d.name)
}

/// One row of `daily_consumption`: a device's energy counter window for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyConsumption {
    // ---
    pub device_id: String,
    pub day: NaiveDate,
    pub energy_start: f64,
    pub energy_end: f64,
    pub consumption: f64,
}

impl DailyConsumption {
    /// Record for the first observation of a device on `day`.
    pub fn first_observation(device_id: &str, day: NaiveDate, reading: f64) -> Self {
        // ---
        Self {
            device_id: device_id.to_string(),
            day,
            energy_start: reading,
            energy_end: reading,
            consumption: 0.0,
        }
    }

    /// Move the end of the window to `reading`; `energy_start` never changes.
    pub fn observe(&mut self, reading: f64) {
        // ---
        self.energy_end = reading;
        self.consumption = self.energy_end - self.energy_start;
    }
}

/// A validated `YYYY-MM` month token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthToken {
    year: i32,
    month: u32,
}

impl MonthToken {
    pub fn parse(token: &str) -> Result<Self, AppError> {
        // ---
        let invalid = || AppError::Validation(format!("invalid month '{token}', expected YYYY-MM"));

        let (year, month) = token.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    /// Prefix matched against the stored `YYYY-MM-DD` day column.
    pub fn prefix(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Human label used in report bodies, e.g. "January 2026".
    pub fn label(&self) -> String {
        // ---
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| self.prefix())
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Direction of change between two monthly totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increase,
    Decrease,
    NoChange,
}

impl Trend {
    pub fn from_difference(difference: f64) -> Self {
        // ---
        if difference > 0.0 {
            Trend::Increase
        } else if difference < 0.0 {
            Trend::Decrease
        } else {
            Trend::NoChange
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Trend::Increase => "Increase",
            Trend::Decrease => "Decrease",
            Trend::NoChange => "No change",
        }
    }
}

/// Round a consumption value to the two decimals every output shows.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_first_observation_has_zero_consumption() {
        // ---
        let rec = DailyConsumption::first_observation("PAC_01", day("2026-01-05"), 1000.25);

        assert_eq!(rec.energy_start, 1000.25);
        assert_eq!(rec.energy_end, 1000.25);
        assert_eq!(rec.consumption, 0.0);
    }

    #[test]
    fn test_observe_keeps_start_and_recomputes_consumption() {
        // ---
        let mut rec = DailyConsumption::first_observation("PAC_01", day("2026-01-05"), 1000.0);
        rec.observe(1003.5);
        rec.observe(1010.0);

        assert_eq!(rec.energy_start, 1000.0);
        assert_eq!(rec.energy_end, 1010.0);
        assert_eq!(rec.consumption, rec.energy_end - rec.energy_start);
    }

    #[test]
    fn test_month_token_parsing() {
        // ---
        let m = MonthToken::parse("2026-01").unwrap();
        assert_eq!(m.prefix(), "2026-01");
        assert_eq!(m.label(), "January 2026");
        assert_eq!(m.to_string(), "2026-01");

        for bad in ["2026-13", "2026-00", "2026-1", "26-01", "2026/01", "2026-01-05", "", "abcd-ef"] {
            assert!(
                matches!(MonthToken::parse(bad), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_trend_follows_sign_of_difference() {
        // ---
        assert_eq!(Trend::from_difference(4.5), Trend::Increase);
        assert_eq!(Trend::from_difference(-0.01), Trend::Decrease);
        assert_eq!(Trend::from_difference(0.0), Trend::NoChange);
    }

    #[test]
    fn test_device_lookup() {
        // ---
        assert_eq!(device_name("PAC_03"), "SECADOR");
        assert_eq!(device_name("PAC_99"), "PAC_99");
        assert!(find_device("PAC_99").is_none());
    }
}
