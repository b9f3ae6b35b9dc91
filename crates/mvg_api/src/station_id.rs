//! Station identifiers
//!
//! The MVG API has gone through two identifier generations: plain integer ids
//! (legacy) and composite string ids of the shape `de:09162:1060`. Some
//! endpoints additionally accept a raw coordinate pair instead of a station.
//! [`StationId`] captures all three shapes as an explicit tagged union so that
//! validation happens once, at the boundary, before anything reaches the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MvgError;

/// Prefix that turns a legacy integer id into a composite id (Munich region).
pub const ID_PREFIX: &str = "de:09162:";

/// Region code a well-formed composite id must start with.
const REGION_CODE: &str = "de";

/// A station reference accepted by the MVG API.
///
/// Exactly one representation is active at a time. Legacy integer ids are
/// converted to composite form before being placed on the wire; composite
/// strings are validated first; coordinates are only valid where an endpoint
/// accepts a geographic position instead of a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StationId {
    /// Integer id from the previous API generation, e.g. `1060`
    Legacy(u32),
    /// Composite id of the current API generation, e.g. `de:09162:1060`
    Composite(String),
    /// A geographic position standing in for a station
    Coordinates {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
}

impl StationId {
    /// Create a legacy integer id
    #[must_use]
    pub const fn legacy(id: u32) -> Self {
        Self::Legacy(id)
    }

    /// Create a composite string id (validated when it is used)
    #[must_use]
    pub fn composite(id: impl Into<String>) -> Self {
        Self::Composite(id.into())
    }

    /// Create a coordinate pair
    #[must_use]
    pub const fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates {
            latitude,
            longitude,
        }
    }

    /// Check whether a string is a well-formed composite id.
    ///
    /// Well-formed means exactly three colon-separated fields with the first
    /// equal to the fixed region code: `de:09162:1060` is valid, `de:09162`
    /// and `xx:1:2` are not. The numeric fields are not range-checked, which
    /// mirrors what the API itself accepts.
    #[must_use]
    pub fn is_valid_composite(id: &str) -> bool {
        let fields: Vec<&str> = id.split(':').collect();
        fields.len() == 3 && fields[0] == REGION_CODE
    }

    /// The composite wire form of this id, for station-addressed endpoints.
    ///
    /// Legacy ids are converted by prefixing [`ID_PREFIX`]; composite ids are
    /// validated and passed through. Coordinates and malformed composite
    /// strings are rejected here, before any request is made.
    pub fn composite_id(&self) -> Result<String, MvgError> {
        match self {
            Self::Legacy(id) => Ok(format!("{ID_PREFIX}{id}")),
            Self::Composite(id) if Self::is_valid_composite(id) => Ok(id.clone()),
            Self::Composite(id) => Err(MvgError::InvalidStation(format!(
                "malformed composite id '{id}'"
            ))),
            Self::Coordinates {
                latitude,
                longitude,
            } => Err(MvgError::InvalidStation(format!(
                "a coordinate pair ({latitude}, {longitude}) cannot address a station"
            ))),
        }
    }
}

impl From<u32> for StationId {
    fn from(id: u32) -> Self {
        Self::Legacy(id)
    }
}

impl From<(f64, f64)> for StationId {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::Coordinates {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy(id) => write!(f, "{id}"),
            Self::Composite(id) => write!(f, "{id}"),
            Self::Coordinates {
                latitude,
                longitude,
            } => write!(f, "({latitude}, {longitude})"),
        }
    }
}
