//! MVG data models
//!
//! Typed representations of locations, departures, serving lines and route
//! connections as returned by the MVG fahrinfo API, after normalization.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MvgError;
use crate::station_id::StationId;

/// Transport product classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Product {
    /// U-Bahn (subway)
    Ubahn,
    /// S-Bahn (suburban rail)
    Sbahn,
    /// Tram / Straßenbahn
    Tram,
    /// City bus
    Bus,
    /// Regional bus
    RegionalBus,
    /// Unknown transport product
    Unknown,
}

impl Product {
    /// Map a product string from the API to a typed product
    #[must_use]
    pub fn from_wire(product: &str) -> Self {
        match product {
            "UBAHN" => Self::Ubahn,
            "SBAHN" => Self::Sbahn,
            "TRAM" => Self::Tram,
            "BUS" => Self::Bus,
            "REGIONAL_BUS" => Self::RegionalBus,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Ubahn => "U-Bahn",
            Self::Sbahn => "S-Bahn",
            Self::Tram => "Tram",
            Self::Bus => "Bus",
            Self::RegionalBus => "Regionalbus",
            Self::Unknown => "Transit",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Product {
    type Err = MvgError;

    /// Parse a user-supplied mode name, e.g. for a CLI filter
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ubahn" | "u-bahn" => Ok(Self::Ubahn),
            "sbahn" | "s-bahn" => Ok(Self::Sbahn),
            "tram" => Ok(Self::Tram),
            "bus" => Ok(Self::Bus),
            "regionalbus" | "regional_bus" | "regional-bus" => Ok(Self::RegionalBus),
            _ => Err(MvgError::Parse(format!("unknown transport mode '{s}'"))),
        }
    }
}

/// A resolved place: a station, street, square or point of interest.
///
/// Produced only from API responses; calling code never constructs one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Result kind as reported by the API ("station", "street", ...)
    pub kind: String,
    /// Station identifier in composite form
    pub id: StationId,
    /// Human-readable name
    pub name: String,
    /// Municipality, when delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Transport products serving this location, as delivered
    pub products: Vec<String>,
    /// Distance in meters, only delivered by the nearby lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    /// Lines serving this location, grouped by mode
    pub lines: LocationLines,
}

impl Location {
    /// Whether this result is a station (as opposed to a street, POI, ...)
    #[must_use]
    pub fn is_station(&self) -> bool {
        self.kind == "station"
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Line numbers serving a location, grouped per mode
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationLines {
    /// U-Bahn lines
    pub ubahn: Vec<String>,
    /// Bus lines
    pub bus: Vec<String>,
    /// Tram lines
    pub tram: Vec<String>,
    /// S-Bahn lines
    pub sbahn: Vec<String>,
    /// Night bus lines
    pub nachtbus: Vec<String>,
    /// Night tram lines
    pub nachttram: Vec<String>,
    /// Anything else
    pub otherlines: Vec<String>,
}

/// One scheduled vehicle departure at a station.
///
/// Created fresh on every fetch and immutable once normalized; two fetches at
/// different wall-clock instants report different `departure_time_minutes`
/// even for identical raw data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Departure {
    /// Transport product
    pub product: Product,
    /// Line label, e.g. "U2"
    pub label: String,
    /// Destination headsign
    pub destination: String,
    /// Absolute departure instant in epoch milliseconds, as delivered
    pub departure_time: i64,
    /// Minutes until departure relative to normalization time, floored toward
    /// negative infinity and inclusive of any reported delay. Negative once
    /// the vehicle has departed.
    pub departure_time_minutes: i64,
    /// Line color as a hex string, e.g. "#dd3d4d"
    pub line_background_color: String,
    /// Whether this is live (real-time) data
    pub live: bool,
    /// Whether this is a replacement service (Schienenersatzverkehr)
    pub sev: bool,
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({} min)",
            self.label, self.destination, self.departure_time_minutes
        )
    }
}

/// One line serving a station, from the departure endpoint's line list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineSummary {
    /// Transport product
    pub product: Product,
    /// Line number, e.g. "53"
    pub line_number: String,
    /// Terminal stop of the line
    pub destination: String,
    /// Whether the line currently runs as replacement service
    pub sev: bool,
    /// Partial network the line belongs to, as delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_net: Option<String>,
    /// DIVA line identifier, as delivered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diva_id: Option<String>,
}

impl fmt::Display for LineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} → {}", self.product, self.line_number, self.destination)?;
        if self.sev {
            write!(f, " (SEV)")?;
        }
        Ok(())
    }
}

/// One itinerary option returned by route planning.
///
/// The leg sequence is carried through opaquely and unmodified; only the
/// structured timestamps are derived during normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    /// Departure instant in epoch milliseconds, as delivered
    pub departure: i64,
    /// Arrival instant in epoch milliseconds, as delivered
    pub arrival: i64,
    /// Departure instant as a structured timestamp
    pub departure_datetime: DateTime<Utc>,
    /// Arrival instant as a structured timestamp
    pub arrival_datetime: DateTime<Utc>,
    /// Ordered legs of the connection, passed through unmodified
    pub connection_part_list: Vec<serde_json::Value>,
}

impl Connection {
    /// Total travel duration in whole minutes
    #[must_use]
    pub const fn duration_minutes(&self) -> i64 {
        (self.arrival - self.departure).div_euclid(60_000)
    }

    /// Format as a compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        let dep = self.departure_datetime.format("%H:%M");
        let arr = self.arrival_datetime.format("%H:%M");
        let duration = self.duration_minutes();
        let legs = self.connection_part_list.len();
        format!("{dep} → {arr} ({duration} min, {legs} legs)")
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}
