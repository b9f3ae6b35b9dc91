//! MVG fahrinfo client
//!
//! Provides location search, departure boards, serving lines, route planning
//! and interruption notices via the public [MVG](https://www.mvg.de) web API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::MvgConfig;
use crate::error::MvgError;
use crate::models::{Connection, Departure, LineSummary, Location, LocationLines, Product};
use crate::route::RouteQuery;
use crate::station_id::StationId;
use crate::time;

/// Client for the MVG fahrinfo API.
///
/// Every operation issues exactly one GET request and awaits the full
/// response; there is no caching and no retrying. Results are normalized
/// into the typed models before being returned.
#[derive(Debug)]
pub struct MvgClient {
    client: Client,
    config: MvgConfig,
}

impl MvgClient {
    /// Create a new MVG client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &MvgConfig) -> Result<Self, MvgError> {
        config.validate().map_err(MvgError::Config)?;

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| MvgError::Config(format!("invalid API key: {e}")))?;
        headers.insert("X-MVG-Authorization-Key", api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| MvgError::Config(e.to_string()))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Search for locations (stations, streets, POIs) matching a query.
    ///
    /// A query that parses as a non-negative integer is treated as a legacy
    /// station id and sent to the by-id lookup endpoint in composite form;
    /// anything else goes to the by-name search endpoint as raw text.
    #[instrument(skip(self))]
    pub async fn search_locations(&self, query: &str) -> Result<Vec<Location>, MvgError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MvgError::InvalidStation(
                "search query must not be empty".to_string(),
            ));
        }

        let body = if let Ok(legacy) = query.parse::<u32>() {
            let id = StationId::Legacy(legacy).composite_id()?;
            let url = format!("{}/api/fahrinfo/location/query", self.config.base_url);
            self.fetch(&url, &[("q", id)]).await?
        } else {
            let url = format!("{}/api/fahrinfo/location/queryWeb", self.config.base_url);
            self.fetch(&url, &[("q", query.to_string())]).await?
        };

        let locations = Self::parse_locations_response(&body)?;
        debug!(count = locations.len(), "Locations found");
        Ok(locations)
    }

    /// Like [`search_locations`](Self::search_locations), but keeps only
    /// station results.
    #[instrument(skip(self))]
    pub async fn search_stations(&self, query: &str) -> Result<Vec<Location>, MvgError> {
        let locations = self.search_locations(query).await?;
        Ok(locations.into_iter().filter(Location::is_station).collect())
    }

    /// Resolve a station name or id to its composite station id.
    ///
    /// Returns the first station result, or `Ok(None)` when nothing matches;
    /// absence is not an error at this level.
    #[instrument(skip(self))]
    pub async fn resolve_station_id(&self, query: &str) -> Result<Option<StationId>, MvgError> {
        let stations = self.search_stations(query).await?;
        let resolved = stations.into_iter().next().map(|station| station.id);
        if resolved.is_none() {
            warn!("No station matched the query");
        }
        Ok(resolved)
    }

    /// Find locations near a coordinate pair.
    ///
    /// A zero latitude or longitude component is rejected before any request,
    /// since the API treats zero components as unset.
    #[allow(clippy::float_cmp)] // exact zero marks an unset component
    #[instrument(skip(self))]
    pub async fn nearby_stations(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<Location>, MvgError> {
        if latitude == 0.0 || longitude == 0.0 {
            return Err(MvgError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        let url = format!("{}/api/fahrinfo/location/nearby", self.config.base_url);
        let params = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
        ];

        let body = self.fetch(&url, &params).await?;
        let locations = Self::parse_locations_response(&body)?;
        debug!(count = locations.len(), "Nearby locations found");
        Ok(locations)
    }

    /// Fetch upcoming departures for a station.
    ///
    /// The station must be a legacy id (converted to composite form) or a
    /// valid composite id; coordinates are rejected before any request.
    /// `offset_minutes` suppresses departures sooner than the offset,
    /// server-side; `0` means no filtering. Departures are normalized against
    /// the current wall clock.
    #[instrument(skip(self), fields(station = %station))]
    pub async fn departures(
        &self,
        station: &StationId,
        offset_minutes: u32,
    ) -> Result<Vec<Departure>, MvgError> {
        let id = station.composite_id()?;
        let url = format!("{}/api/fahrinfo/departure/{id}", self.config.base_url);
        let params = [
            ("footway", "0".to_string()),
            ("timeoffset", offset_minutes.to_string()),
        ];

        let body = self.fetch(&url, &params).await?;
        let departures = Self::parse_departures_response(&body, Utc::now())?;
        if departures.is_empty() {
            warn!("No departures returned");
        }
        debug!(count = departures.len(), "Departures fetched");
        Ok(departures)
    }

    /// Fetch departures for a station given by name.
    ///
    /// Resolves the name first and escalates an empty resolution to
    /// [`MvgError::NoStationFound`], then fetches like
    /// [`departures`](Self::departures).
    #[instrument(skip(self))]
    pub async fn departures_by_name(
        &self,
        name: &str,
        offset_minutes: u32,
    ) -> Result<Vec<Departure>, MvgError> {
        let Some(station) = self.resolve_station_id(name).await? else {
            return Err(MvgError::NoStationFound {
                query: name.to_string(),
            });
        };
        self.departures(&station, offset_minutes).await
    }

    /// Fetch the lines serving a station.
    ///
    /// The line list comes from the same endpoint as the departure board.
    #[instrument(skip(self), fields(station = %station))]
    pub async fn lines(&self, station: &StationId) -> Result<Vec<LineSummary>, MvgError> {
        let id = station.composite_id()?;
        let url = format!("{}/api/fahrinfo/departure/{id}", self.config.base_url);
        let params = [("footway", "0".to_string())];

        let body = self.fetch(&url, &params).await?;
        let lines = Self::parse_lines_response(&body)?;
        debug!(count = lines.len(), "Serving lines fetched");
        Ok(lines)
    }

    /// Plan routes between two endpoints.
    ///
    /// Every returned connection carries derived structured timestamps next
    /// to the raw epoch-millisecond instants; the leg sequence is passed
    /// through unmodified.
    #[instrument(skip(self, query), fields(start = %query.start, dest = %query.dest))]
    pub async fn plan_route(&self, query: &RouteQuery) -> Result<Vec<Connection>, MvgError> {
        let params = query.to_query_params()?;
        let url = format!("{}/api/fahrinfo/routing/", self.config.base_url);

        let body = self.fetch(&url, &params).await?;
        let connections = Self::parse_connections_response(&body)?;
        if connections.is_empty() {
            warn!("No connections found");
        }
        debug!(count = connections.len(), "Connections found");
        Ok(connections)
    }

    /// Fetch current service interruption notices, passed through unmodified.
    #[instrument(skip(self))]
    pub async fn interruptions(&self) -> Result<serde_json::Value, MvgError> {
        let url = format!(
            "{}/.rest/betriebsaenderungen/api/interruptions",
            self.config.base_url
        );
        let body = self.fetch(&url, &[]).await?;
        serde_json::from_str(&body).map_err(|e| MvgError::Parse(e.to_string()))
    }

    /// Issue one GET request and return the response body.
    ///
    /// Non-2xx statuses become [`MvgError::Api`] carrying the numeric status
    /// code and the best-effort body text.
    async fn fetch(
        &self,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<String, MvgError> {
        debug!(?url, "Requesting");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MvgError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    }
                } else {
                    MvgError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default().trim().to_string();
            return Err(MvgError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .text()
            .await
            .map_err(|e| MvgError::Parse(e.to_string()))
    }

    /// Parse a raw locations response into typed locations
    fn parse_locations_response(body: &str) -> Result<Vec<Location>, MvgError> {
        let raw: RawLocationsResponse =
            serde_json::from_str(body).map_err(|e| MvgError::Parse(e.to_string()))?;

        Ok(raw
            .locations
            .into_iter()
            .map(Self::convert_location)
            .collect())
    }

    /// Parse a raw departure response into normalized departures
    fn parse_departures_response(
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Departure>, MvgError> {
        let raw: RawDeparturesResponse =
            serde_json::from_str(body).map_err(|e| MvgError::Parse(e.to_string()))?;

        raw.departures
            .into_iter()
            .map(|departure| Self::convert_departure(departure, now))
            .collect()
    }

    /// Parse the serving-lines half of a raw departure response
    fn parse_lines_response(body: &str) -> Result<Vec<LineSummary>, MvgError> {
        let raw: RawDeparturesResponse =
            serde_json::from_str(body).map_err(|e| MvgError::Parse(e.to_string()))?;

        Ok(raw
            .serving_lines
            .into_iter()
            .map(Self::convert_serving_line)
            .collect())
    }

    /// Parse a raw routing response into normalized connections
    fn parse_connections_response(body: &str) -> Result<Vec<Connection>, MvgError> {
        let raw: RawRoutingResponse =
            serde_json::from_str(body).map_err(|e| MvgError::Parse(e.to_string()))?;

        raw.connection_list
            .into_iter()
            .map(Self::convert_connection)
            .collect()
    }

    /// Convert a raw location to a typed location
    fn convert_location(raw: RawLocation) -> Location {
        Location {
            kind: raw.kind.unwrap_or_default(),
            id: StationId::Composite(raw.id.unwrap_or_default()),
            name: raw.name.unwrap_or_default(),
            place: raw.place,
            latitude: raw.latitude.unwrap_or_default(),
            longitude: raw.longitude.unwrap_or_default(),
            products: raw.products,
            distance: raw.distance,
            lines: raw.lines.map(Self::convert_location_lines).unwrap_or_default(),
        }
    }

    /// Convert a raw per-mode line listing
    fn convert_location_lines(raw: RawLocationLines) -> LocationLines {
        LocationLines {
            ubahn: raw.ubahn,
            bus: raw.bus,
            tram: raw.tram,
            sbahn: raw.sbahn,
            nachtbus: raw.nachtbus,
            nachttram: raw.nachttram,
            otherlines: raw.otherlines,
        }
    }

    /// Convert a raw departure, deriving the relative minutes.
    ///
    /// `departure_time_minutes` is the floored whole-minute distance from
    /// `now`, plus any reported delay; the raw epoch-millisecond instant is
    /// carried through untouched. Both the instant and its delay-shifted
    /// counterpart must fall inside the representable timestamp range.
    fn convert_departure(raw: RawDeparture, now: DateTime<Utc>) -> Result<Departure, MvgError> {
        time::datetime_from_epoch_ms(raw.departure_time)?;
        // The delay counts whole minutes; folding it into the instant puts
        // the delayed departure under the same range check.
        let delayed = raw
            .delay
            .unwrap_or(0)
            .checked_mul(60_000)
            .and_then(|delay_ms| raw.departure_time.checked_add(delay_ms))
            .ok_or(MvgError::TimestampOutOfRange(raw.departure_time))?;
        let minutes = time::minutes_between(now, delayed)?;

        Ok(Departure {
            product: Product::from_wire(raw.product.as_deref().unwrap_or_default()),
            label: raw.label.unwrap_or_default(),
            destination: raw.destination.unwrap_or_default(),
            departure_time: raw.departure_time,
            departure_time_minutes: minutes,
            line_background_color: raw.line_background_color.unwrap_or_default(),
            live: raw.live,
            sev: raw.sev,
        })
    }

    /// Convert a raw serving line to a typed line summary
    fn convert_serving_line(raw: RawServingLine) -> LineSummary {
        LineSummary {
            product: Product::from_wire(raw.product.as_deref().unwrap_or_default()),
            line_number: raw.line_number.unwrap_or_default(),
            destination: raw.destination.unwrap_or_default(),
            sev: raw.sev,
            partial_net: raw.partial_net,
            diva_id: raw.diva_id,
        }
    }

    /// Convert a raw connection, attaching structured timestamps
    fn convert_connection(raw: RawConnection) -> Result<Connection, MvgError> {
        Ok(Connection {
            departure: raw.departure,
            arrival: raw.arrival,
            departure_datetime: time::datetime_from_epoch_ms(raw.departure)?,
            arrival_datetime: time::datetime_from_epoch_ms(raw.arrival)?,
            connection_part_list: raw.connection_part_list,
        })
    }
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
struct RawLocationsResponse {
    #[serde(default)]
    locations: Vec<RawLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocation {
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<String>,
    name: Option<String>,
    place: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    products: Vec<String>,
    distance: Option<u32>,
    lines: Option<RawLocationLines>,
}

#[derive(Debug, Deserialize)]
struct RawLocationLines {
    #[serde(default)]
    ubahn: Vec<String>,
    #[serde(default)]
    bus: Vec<String>,
    #[serde(default)]
    tram: Vec<String>,
    #[serde(default)]
    sbahn: Vec<String>,
    #[serde(default)]
    nachtbus: Vec<String>,
    #[serde(default)]
    nachttram: Vec<String>,
    #[serde(default)]
    otherlines: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeparturesResponse {
    #[serde(default)]
    departures: Vec<RawDeparture>,
    #[serde(default)]
    serving_lines: Vec<RawServingLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeparture {
    departure_time: i64,
    product: Option<String>,
    label: Option<String>,
    destination: Option<String>,
    line_background_color: Option<String>,
    delay: Option<i64>,
    #[serde(default)]
    live: bool,
    #[serde(default)]
    sev: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServingLine {
    product: Option<String>,
    line_number: Option<String>,
    destination: Option<String>,
    #[serde(default)]
    sev: bool,
    partial_net: Option<String>,
    diva_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoutingResponse {
    #[serde(default)]
    connection_list: Vec<RawConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConnection {
    departure: i64,
    arrival: i64,
    #[serde(default)]
    connection_part_list: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_departures_derives_minutes() {
        let now = fixed_now();
        let in_five = now.timestamp_millis() + 5 * 60_000;
        let json = format!(
            r##"{{
                "departures": [{{
                    "departureTime": {in_five},
                    "product": "UBAHN",
                    "label": "U2",
                    "destination": "Messestadt Ost",
                    "lineBackgroundColor": "#dd3d4d",
                    "live": true,
                    "sev": false
                }}]
            }}"##
        );

        let departures = MvgClient::parse_departures_response(&json, now).unwrap();
        assert_eq!(departures.len(), 1);

        let departure = &departures[0];
        assert_eq!(departure.product, Product::Ubahn);
        assert_eq!(departure.label, "U2");
        assert_eq!(departure.destination, "Messestadt Ost");
        assert_eq!(departure.departure_time, in_five);
        assert_eq!(departure.departure_time_minutes, 5);
        assert_eq!(departure.line_background_color, "#dd3d4d");
        assert!(departure.live);
        assert!(!departure.sev);
    }

    #[test]
    fn test_parse_departures_adds_delay() {
        let now = fixed_now();
        let in_five = now.timestamp_millis() + 5 * 60_000;
        let json = format!(
            r#"{{ "departures": [{{ "departureTime": {in_five}, "delay": 2 }}] }}"#
        );

        let departures = MvgClient::parse_departures_response(&json, now).unwrap();
        assert_eq!(departures[0].departure_time_minutes, 7);
    }

    #[test]
    fn test_parse_departures_negative_after_departure() {
        let now = fixed_now();
        let gone = now.timestamp_millis() - 90_000;
        let json = format!(r#"{{ "departures": [{{ "departureTime": {gone} }}] }}"#);

        let departures = MvgClient::parse_departures_response(&json, now).unwrap();
        assert_eq!(departures[0].departure_time_minutes, -2);
    }

    #[test]
    fn test_parse_departures_tolerates_missing_optionals() {
        let now = fixed_now();
        let json = r#"{ "departures": [{ "departureTime": 1571923180000 }] }"#;

        let departures = MvgClient::parse_departures_response(json, now).unwrap();
        let departure = &departures[0];
        assert_eq!(departure.product, Product::Unknown);
        assert!(departure.label.is_empty());
        assert!(!departure.live);
        assert!(!departure.sev);
    }

    #[test]
    fn test_parse_departures_requires_departure_time() {
        let json = r#"{ "departures": [{ "label": "U2" }] }"#;
        let result = MvgClient::parse_departures_response(json, fixed_now());
        assert!(matches!(result, Err(MvgError::Parse(_))));
    }

    #[test]
    fn test_parse_departures_out_of_range_timestamp() {
        let json = format!(
            r#"{{ "departures": [{{ "departureTime": {} }}] }}"#,
            i64::MIN
        );
        let result = MvgClient::parse_departures_response(&json, fixed_now());
        assert!(matches!(result, Err(MvgError::TimestampOutOfRange(i64::MIN))));
    }

    #[test]
    fn test_parse_departures_rejects_absurd_delay() {
        let now = fixed_now();
        let in_five = now.timestamp_millis() + 5 * 60_000;
        let json = format!(
            r#"{{ "departures": [{{ "departureTime": {in_five}, "delay": {} }}] }}"#,
            i64::MAX
        );

        let result = MvgClient::parse_departures_response(&json, now);
        assert!(matches!(result, Err(MvgError::TimestampOutOfRange(_))));
    }

    #[test]
    fn test_parse_lines_response() {
        let json = r#"{
            "servingLines": [
                {
                    "product": "BUS",
                    "lineNumber": "53",
                    "destination": "Münchner Freiheit",
                    "sev": false,
                    "partialNet": "mvv",
                    "divaId": "03053"
                },
                {
                    "product": "UBAHN",
                    "lineNumber": "U2",
                    "destination": "Feldmoching",
                    "sev": true
                }
            ],
            "departures": []
        }"#;

        let lines = MvgClient::parse_lines_response(json).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product, Product::Bus);
        assert_eq!(lines[0].line_number, "53");
        assert_eq!(lines[0].partial_net.as_deref(), Some("mvv"));
        assert_eq!(lines[1].product, Product::Ubahn);
        assert!(lines[1].sev);
        assert!(lines[1].diva_id.is_none());
    }

    #[test]
    fn test_parse_locations_response() {
        let json = r#"{
            "locations": [
                {
                    "type": "station",
                    "id": "de:09162:1060",
                    "name": "Innsbrucker Ring",
                    "place": "München",
                    "latitude": 48.12046,
                    "longitude": 11.61869,
                    "products": ["UBAHN"],
                    "lines": { "ubahn": ["2", "5"] }
                },
                {
                    "type": "street",
                    "id": "de:09162:street:1",
                    "name": "Innsbrucker Straße",
                    "latitude": 48.1,
                    "longitude": 11.6
                }
            ]
        }"#;

        let locations = MvgClient::parse_locations_response(json).unwrap();
        assert_eq!(locations.len(), 2);

        let station = &locations[0];
        assert!(station.is_station());
        assert_eq!(station.id, StationId::composite("de:09162:1060"));
        assert_eq!(station.place.as_deref(), Some("München"));
        assert_eq!(station.lines.ubahn, vec!["2", "5"]);
        assert!(station.lines.bus.is_empty());

        assert!(!locations[1].is_station());
    }

    #[test]
    fn test_parse_nearby_location_with_distance() {
        let json = r#"{
            "locations": [{
                "type": "station",
                "id": "de:09162:1060",
                "name": "Innsbrucker Ring",
                "latitude": 48.12046,
                "longitude": 11.61869,
                "distance": 59
            }]
        }"#;

        let locations = MvgClient::parse_locations_response(json).unwrap();
        assert_eq!(locations[0].distance, Some(59));
    }

    #[test]
    fn test_parse_connections_attaches_datetimes() {
        let departure = fixed_now();
        let arrival = departure + chrono::Duration::minutes(25);
        let json = format!(
            r#"{{
                "connectionList": [{{
                    "departure": {},
                    "arrival": {},
                    "connectionPartList": [{{ "label": "U2" }}, {{ "connectionPartType": "FOOTWAY" }}]
                }}]
            }}"#,
            departure.timestamp_millis(),
            arrival.timestamp_millis()
        );

        let connections = MvgClient::parse_connections_response(&json).unwrap();
        assert_eq!(connections.len(), 1);

        let connection = &connections[0];
        assert_eq!(connection.departure_datetime, departure);
        assert_eq!(connection.arrival_datetime, arrival);
        assert_eq!(connection.duration_minutes(), 25);
        assert_eq!(connection.connection_part_list.len(), 2);
        assert_eq!(
            connection.connection_part_list[0]
                .get("label")
                .and_then(serde_json::Value::as_str),
            Some("U2")
        );
    }

    #[test]
    fn test_parse_connections_out_of_range_timestamp() {
        let json = format!(
            r#"{{ "connectionList": [{{ "departure": {}, "arrival": 0 }}] }}"#,
            i64::MAX
        );
        let result = MvgClient::parse_connections_response(&json);
        assert!(matches!(result, Err(MvgError::TimestampOutOfRange(_))));
    }

    #[test]
    fn test_parse_empty_payloads() {
        assert!(
            MvgClient::parse_departures_response(r#"{ "departures": [] }"#, fixed_now())
                .unwrap()
                .is_empty()
        );
        assert!(
            MvgClient::parse_connections_response(r#"{ "connectionList": [] }"#)
                .unwrap()
                .is_empty()
        );
        assert!(
            MvgClient::parse_locations_response(r#"{ "locations": [] }"#)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        let result = MvgClient::parse_locations_response("not json");
        assert!(matches!(result, Err(MvgError::Parse(_))));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = MvgConfig {
            base_url: String::new(),
            ..MvgConfig::default()
        };
        assert!(matches!(
            MvgClient::new(&config),
            Err(MvgError::Config(_))
        ));

        let config = MvgConfig {
            api_key: "line\nbreak".to_string(),
            ..MvgConfig::default()
        };
        assert!(matches!(
            MvgClient::new(&config),
            Err(MvgError::Config(_))
        ));
    }
}
