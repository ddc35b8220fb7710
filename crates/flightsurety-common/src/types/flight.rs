//! Flight identity and status codes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SuretyError;
use crate::types::address::Address;

/// Reported flight status
///
/// Discriminants are the wire codes oracles report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl FlightStatus {
    pub const ALL: [FlightStatus; 6] = [
        FlightStatus::Unknown,
        FlightStatus::OnTime,
        FlightStatus::LateAirline,
        FlightStatus::LateWeather,
        FlightStatus::LateTechnical,
        FlightStatus::LateOther,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, SuretyError> {
        Self::ALL
            .into_iter()
            .find(|s| s.code() == code)
            .ok_or_else(|| SuretyError::invalid_state(format!("unknown status code {}", code)))
    }

    /// Delay attributable to the airline; the only status that pays out
    pub fn is_airline_fault(self) -> bool {
        self == FlightStatus::LateAirline
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlightStatus::Unknown => "STATUS_CODE_UNKNOWN",
            FlightStatus::OnTime => "STATUS_CODE_ON_TIME",
            FlightStatus::LateAirline => "STATUS_CODE_LATE_AIRLINE",
            FlightStatus::LateWeather => "STATUS_CODE_LATE_WEATHER",
            FlightStatus::LateTechnical => "STATUS_CODE_LATE_TECHNICAL",
            FlightStatus::LateOther => "STATUS_CODE_LATE_OTHER",
        };
        write!(f, "{}", name)
    }
}

/// Flight key: owning airline, flight code and departure timestamp
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlightKey {
    pub airline: Address,
    pub code: String,
    /// Departure time (Unix seconds)
    pub timestamp: i64,
}

impl FlightKey {
    pub fn new(airline: Address, code: impl Into<String>, timestamp: i64) -> Self {
        Self {
            airline,
            code: code.into(),
            timestamp,
        }
    }

    /// Stable 32-byte digest of the key
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.airline.as_bytes());
        hasher.update(self.code.as_bytes());
        hasher.update(&self.timestamp.to_le_bytes());
        *hasher.finalize().as_bytes()
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.code, self.timestamp, self.airline.short())
    }
}
