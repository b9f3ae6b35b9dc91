//! Route query construction
//!
//! [`RouteQuery`] assembles the routing endpoint's query parameters from
//! heterogeneous start/destination representations and optional constraints.
//! The parameter list is ordered and serialized by the HTTP layer as
//! `key=value` pairs joined with `&`.

use chrono::{DateTime, Utc};

use crate::error::MvgError;
use crate::station_id::StationId;
use crate::time;

/// Parameter names for one side of the route
struct EndpointKeys {
    latitude: &'static str,
    longitude: &'static str,
    station: &'static str,
}

const FROM_KEYS: EndpointKeys = EndpointKeys {
    latitude: "fromLatitude",
    longitude: "fromLongitude",
    station: "fromStation",
};

const TO_KEYS: EndpointKeys = EndpointKeys {
    latitude: "toLatitude",
    longitude: "toLongitude",
    station: "toStation",
};

/// Options for a route planning query.
///
/// Constructed and consumed within a single call; no persisted identity.
#[allow(clippy::struct_excessive_bools)] // mode flags mirror the API's query parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    /// Start of the route
    pub start: StationId,
    /// Destination of the route
    pub dest: StationId,
    /// Desired time (None = server default "now")
    pub time: Option<DateTime<Utc>>,
    /// Whether `time` is the desired arrival instead of the departure.
    /// Only meaningful together with `time`.
    pub arrival: bool,
    /// Maximum walking time to the first station, in minutes.
    /// Zero is a valid cap, distinct from absent.
    pub max_walk_time_to_start: Option<u32>,
    /// Maximum walking time from the last station, in minutes
    pub max_walk_time_to_dest: Option<u32>,
    /// Maximum number of transfers; zero means a direct connection
    pub change_limit: Option<u32>,
    /// Include U-Bahn connections
    pub ubahn: bool,
    /// Include bus connections
    pub bus: bool,
    /// Include tram connections
    pub tram: bool,
    /// Include S-Bahn connections
    pub sbahn: bool,
}

impl RouteQuery {
    /// Create a new route query with all modes included and no constraints
    #[must_use]
    pub const fn new(start: StationId, dest: StationId) -> Self {
        Self {
            start,
            dest,
            time: None,
            arrival: false,
            max_walk_time_to_start: None,
            max_walk_time_to_dest: None,
            change_limit: None,
            ubahn: true,
            bus: true,
            tram: true,
            sbahn: true,
        }
    }

    /// Set the desired departure time
    #[must_use]
    pub const fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Treat the query time as the desired arrival time
    #[must_use]
    pub const fn for_arrival(mut self) -> Self {
        self.arrival = true;
        self
    }

    /// Cap the walking time to the first station, in minutes
    #[must_use]
    pub const fn with_max_walk_time_to_start(mut self, minutes: u32) -> Self {
        self.max_walk_time_to_start = Some(minutes);
        self
    }

    /// Cap the walking time from the last station, in minutes
    #[must_use]
    pub const fn with_max_walk_time_to_dest(mut self, minutes: u32) -> Self {
        self.max_walk_time_to_dest = Some(minutes);
        self
    }

    /// Cap the number of transfers
    #[must_use]
    pub const fn with_change_limit(mut self, limit: u32) -> Self {
        self.change_limit = Some(limit);
        self
    }

    /// Exclude U-Bahn connections
    #[must_use]
    pub const fn without_ubahn(mut self) -> Self {
        self.ubahn = false;
        self
    }

    /// Exclude bus connections
    #[must_use]
    pub const fn without_bus(mut self) -> Self {
        self.bus = false;
        self
    }

    /// Exclude tram connections
    #[must_use]
    pub const fn without_tram(mut self) -> Self {
        self.tram = false;
        self
    }

    /// Exclude S-Bahn connections
    #[must_use]
    pub const fn without_sbahn(mut self) -> Self {
        self.sbahn = false;
        self
    }

    /// Build the ordered query parameter list for the routing endpoint.
    ///
    /// Exactly one parameter shape is emitted per endpoint (coordinates or a
    /// composite station id). `arrival=true` is only emitted together with a
    /// time. Walking caps and the transfer cap are emitted whenever they were
    /// explicitly provided, including a value of zero. Mode flags only emit
    /// their exclusion parameter when explicitly false; included modes are
    /// the server default and are never serialized.
    pub fn to_query_params(&self) -> Result<Vec<(&'static str, String)>, MvgError> {
        let mut params = Vec::new();

        push_endpoint(&mut params, "start", &self.start, &FROM_KEYS)?;
        push_endpoint(&mut params, "destination", &self.dest, &TO_KEYS)?;

        if let Some(time) = self.time {
            params.push(("time", time::epoch_ms_from_datetime(time).to_string()));
            if self.arrival {
                params.push(("arrival", "true".to_string()));
            }
        }

        if let Some(minutes) = self.max_walk_time_to_start {
            params.push(("maxTravelTimeFootwayToStation", minutes.to_string()));
        }
        if let Some(minutes) = self.max_walk_time_to_dest {
            params.push(("maxTravelTimeFootwayToDestination", minutes.to_string()));
        }
        if let Some(limit) = self.change_limit {
            params.push(("changeLimit", limit.to_string()));
        }

        if !self.ubahn {
            params.push(("transportTypeUnderground", "false".to_string()));
        }
        if !self.bus {
            params.push(("transportTypeBus", "false".to_string()));
        }
        if !self.tram {
            params.push(("transportTypeTram", "false".to_string()));
        }
        if !self.sbahn {
            params.push(("transportTypeSBahn", "false".to_string()));
        }

        Ok(params)
    }
}

/// Emit the parameters for one route endpoint, coordinates or station id
fn push_endpoint(
    params: &mut Vec<(&'static str, String)>,
    side: &str,
    endpoint: &StationId,
    keys: &EndpointKeys,
) -> Result<(), MvgError> {
    match endpoint {
        StationId::Coordinates {
            latitude,
            longitude,
        } => {
            params.push((keys.latitude, latitude.to_string()));
            params.push((keys.longitude, longitude.to_string()));
        }
        station => {
            let id = station
                .composite_id()
                .map_err(|e| MvgError::InvalidRouteEndpoint {
                    side: side.to_string(),
                    reason: e.to_string(),
                })?;
            params.push((keys.station, id));
        }
    }
    Ok(())
}
