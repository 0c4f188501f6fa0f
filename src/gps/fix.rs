// src/gps/fix.rs
//! Position fix structures shared by the parser, the handler and callers

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// NMEA GGA fix quality indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FixQuality {
    #[default]
    NoFix = 0,
    Gps = 1,
    Dgps = 2,
    Pps = 3,
    RtkFixed = 4,
    RtkFloat = 5,
    Estimated = 6,
    Manual = 7,
    Simulation = 8,
}

impl FixQuality {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FixQuality::NoFix),
            1 => Some(FixQuality::Gps),
            2 => Some(FixQuality::Dgps),
            3 => Some(FixQuality::Pps),
            4 => Some(FixQuality::RtkFixed),
            5 => Some(FixQuality::RtkFloat),
            6 => Some(FixQuality::Estimated),
            7 => Some(FixQuality::Manual),
            8 => Some(FixQuality::Simulation),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_fix(self) -> bool {
        self != FixQuality::NoFix
    }

    /// Display label used by dashboards and the CLI
    pub fn description(self) -> &'static str {
        match self {
            FixQuality::NoFix => "No fix",
            FixQuality::Gps => "GPS",
            FixQuality::Dgps => "DGPS",
            FixQuality::Pps => "PPS",
            FixQuality::RtkFixed => "RTK",
            FixQuality::RtkFloat => "Float RTK",
            FixQuality::Estimated => "Estimated",
            FixQuality::Manual => "Manual",
            FixQuality::Simulation => "Simulation",
        }
    }
}

impl From<FixQuality> for u8 {
    fn from(quality: FixQuality) -> Self {
        quality.as_u8()
    }
}

impl TryFrom<u8> for FixQuality {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        FixQuality::from_u8(value).ok_or_else(|| format!("fix quality {} out of range 0-8", value))
    }
}

impl std::fmt::Display for FixQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// One decoded position sample.
///
/// `latitude` and `longitude` are `None` whenever `quality` is [`FixQuality::NoFix`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub utc_time: Option<NaiveTime>,
    /// Only RMC carries a date; GGA leaves this empty.
    pub date: Option<NaiveDate>,
    pub quality: FixQuality,
    /// `None` for sentences that do not report a satellite count (RMC).
    pub satellites: Option<u8>,
}

impl Fix {
    /// A sentence that was understood but reports no position.
    pub fn no_fix(utc_time: Option<NaiveTime>) -> Self {
        Self {
            utc_time,
            ..Self::default()
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Time of day as carried by the sentence, `HH:MM:SS`
    pub fn time_string(&self) -> Option<String> {
        self.utc_time.map(|t| t.format("%H:%M:%S").to_string())
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match (self.date, self.utc_time) {
            (Some(date), Some(time)) => Some(date.and_time(time)),
            _ => None,
        }
    }
}

/// Position record merged into each persisted detection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub gps_timestamp: Option<String>,
    pub gps_quality: u8,
}

impl Position {
    /// "No position available"
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Copy these fields into a detection payload, replacing any existing ones.
    pub fn merge_into(&self, payload: &mut serde_json::Map<String, serde_json::Value>) {
        payload.insert("latitude".to_string(), self.latitude.into());
        payload.insert("longitude".to_string(), self.longitude.into());
        payload.insert("gps_timestamp".to_string(), self.gps_timestamp.clone().into());
        payload.insert("gps_quality".to_string(), self.gps_quality.into());
    }

    /// Format coordinate for display
    pub fn format_coordinate(coord: Option<f64>) -> String {
        match coord {
            Some(val) => format!("{:>12.6}°", val),
            None => "No fix".to_string(),
        }
    }
}

impl From<&Fix> for Position {
    fn from(fix: &Fix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            gps_timestamp: fix.time_string(),
            gps_quality: fix.quality.as_u8(),
        }
    }
}
