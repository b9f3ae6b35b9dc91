//! Client for the MVG public transit API
//!
//! Covers the Munich transit network: station and address lookup, live
//! departure boards, serving lines, door-to-door route planning and
//! service interruption notices. Raw API payloads are normalized into
//! typed models with derived fields such as minutes until departure.
//!
//! # Example
//!
//! ```rust,ignore
//! use mvg_api::{MvgClient, MvgConfig};
//!
//! let config = MvgConfig::default();
//! let client = MvgClient::new(&config)?;
//!
//! let departures = client.departures_by_name("Hauptbahnhof", 0).await?;
//! for departure in departures.iter().take(5) {
//!     println!("{departure}");
//! }
//! ```

mod client;
mod config;
mod error;
mod models;
mod route;
mod station;
mod station_id;
pub mod time;

pub use client::MvgClient;
pub use config::MvgConfig;
pub use error::MvgError;
pub use models::{Connection, Departure, LineSummary, Location, LocationLines, Product};
pub use route::RouteQuery;
pub use station::Station;
pub use station_id::{ID_PREFIX, StationId};
