use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::FromRow;
use uuid::Uuid;

/// One of the five numeric columns shared by `data` and `user_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    Pm25,
    Tvoc,
    Co2,
}

impl Metric {
    /// Column name in both reading tables. Only ever one of five fixed
    /// identifiers, so it is safe to splice into SQL text.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pm25 => "pm25",
            Metric::Tvoc => "tvoc",
            Metric::Co2 => "co2",
        }
    }

    /// Air-quality metrics get daily and hourly bucketed averages;
    /// temperature and humidity only have the rolling window.
    pub fn is_bucketed(self) -> bool {
        matches!(self, Metric::Pm25 | Metric::Tvoc | Metric::Co2)
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pm25 => "PM2.5",
            Metric::Tvoc => "TVOC",
            Metric::Co2 => "CO2",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "temperature" | "temp" => Ok(Self::Temperature),
            "humidity" => Ok(Self::Humidity),
            "pm25" => Ok(Self::Pm25),
            "tvoc" => Ok(Self::Tvoc),
            "co2" => Ok(Self::Co2),
            other => Err(anyhow::anyhow!("unknown metric: {other:?}")),
        }
    }
}

/// Which reading table an aggregate runs over.
///
/// `data` rows belong to a sensor, `user_data` rows to a user; both tables
/// have the same metric columns so every query is written once per scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Sensor,
    User,
}

impl Scope {
    pub fn table(self) -> &'static str {
        match self {
            Scope::Sensor => "data",
            Scope::User => "user_data",
        }
    }

    pub fn owner_column(self) -> &'static str {
        match self {
            Scope::Sensor => "sensor_id",
            Scope::User => "user_id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scope::Sensor => "sensor",
            Scope::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Sensor {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// The columns needed to check a login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    /// Stored hash, `salt$digest`.
    pub password: String,
}

/// Metric values and timestamp of one row in `data` or `user_data`.
///
/// Each metric is independently nullable; absence is never stored as zero.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Reading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pm25: Option<f64>,
    pub tvoc: Option<f64>,
    pub co2: Option<f64>,
    /// Eastern wall-clock time (UTC-4), no zone attached.
    pub date: NaiveDateTime,
}

/// A reading about to be written for `sensor_id`.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub sensor_id: Uuid,
    pub reading: Reading,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DailyAverage {
    pub day: NaiveDate,
    /// Zero when the day has no rows.
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HourlyAverage {
    pub hour: NaiveDateTime,
    /// Zero when the hour has no rows.
    pub average: f64,
}
