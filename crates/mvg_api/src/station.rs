//! Station facade
//!
//! Resolves a name or id once and keeps the result, so follow-up queries
//! skip the lookup round trip.

use std::fmt;

use crate::client::MvgClient;
use crate::error::MvgError;
use crate::models::{Departure, LineSummary};
use crate::station_id::StationId;

/// A station resolved to its canonical id and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    id: StationId,
    name: String,
    place: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl Station {
    /// Resolve a station by name or legacy id.
    ///
    /// Takes the first station the search returns.
    ///
    /// # Errors
    ///
    /// Returns [`MvgError::NoStationFound`] when nothing matches, or any
    /// error of the underlying search.
    pub async fn find(client: &MvgClient, query: &str) -> Result<Self, MvgError> {
        let station = client
            .search_stations(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MvgError::NoStationFound {
                query: query.to_string(),
            })?;

        Ok(Self {
            id: station.id,
            name: station.name,
            place: station.place,
            latitude: station.latitude,
            longitude: station.longitude,
        })
    }

    /// The canonical station id.
    pub const fn id(&self) -> &StationId {
        &self.id
    }

    /// The station name as the API reports it.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The place the station belongs to, usually a city or district.
    pub fn place(&self) -> Option<&str> {
        self.place.as_deref()
    }

    /// Station coordinates as `(latitude, longitude)`.
    pub const fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Upcoming departures from this station.
    ///
    /// # Errors
    ///
    /// Returns an error if the departure request fails.
    pub async fn departures(
        &self,
        client: &MvgClient,
        offset_minutes: u32,
    ) -> Result<Vec<Departure>, MvgError> {
        client.departures(&self.id, offset_minutes).await
    }

    /// Lines serving this station.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn lines(&self, client: &MvgClient) -> Result<Vec<LineSummary>, MvgError> {
        client.lines(&self.id).await
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
