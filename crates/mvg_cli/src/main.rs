//! Command-line interface for Munich public transit queries

#![allow(clippy::print_stdout)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use mvg_api::{Connection, MvgClient, MvgConfig, Product, RouteQuery, StationId};
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "mvg", version, about = "Munich public transit from the command line")]
struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the MVG API
    #[arg(long, env = "MVG_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show upcoming departures for a station
    Departures {
        /// Station name or id; omitted, the most recently used one is reused
        station: Option<String>,

        /// Hide departures leaving sooner than this many minutes
        #[arg(short, long, default_value_t = 0)]
        offset: u32,

        /// Maximum number of departures to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Only show these products: ubahn, sbahn, tram, bus (repeatable)
        #[arg(short, long, value_name = "MODE")]
        mode: Vec<String>,

        /// File remembering the last queried station
        #[arg(long, default_value = "recent.txt")]
        recent_file: PathBuf,
    },
    /// Search for stations, streets and points of interest
    Search {
        /// Free-text query or legacy station id
        query: String,
    },
    /// List stations near a coordinate
    Nearby {
        latitude: f64,
        longitude: f64,
    },
    /// List the lines serving a station
    Lines {
        /// Station name or id
        station: String,
    },
    /// Plan a route between two places
    Route(RouteArgs),
    /// Show current service interruptions
    Interruptions,
}

#[derive(Args)]
struct RouteArgs {
    /// Start: station name, station id, or "lat,lon"
    from: String,

    /// Destination: station name, station id, or "lat,lon"
    to: String,

    /// Trip time, RFC3339 ("2026-08-23T17:30:00+02:00") or local "2026-08-23 17:30"
    #[arg(short, long)]
    time: Option<String>,

    /// Treat --time as the arrival time instead of the departure time
    #[arg(short, long, requires = "time")]
    arrival: bool,

    /// Maximum number of changes; 0 means a direct connection
    #[arg(long)]
    change_limit: Option<u32>,

    /// Walking-time cap in minutes at the start
    #[arg(long)]
    max_walk_to_start: Option<u32>,

    /// Walking-time cap in minutes at the destination
    #[arg(long)]
    max_walk_to_dest: Option<u32>,

    /// Exclude U-Bahn connections
    #[arg(long)]
    no_ubahn: bool,

    /// Exclude bus connections
    #[arg(long)]
    no_bus: bool,

    /// Exclude tram connections
    #[arg(long)]
    no_tram: bool,

    /// Exclude S-Bahn connections
    #[arg(long)]
    no_sbahn: bool,

    /// Maximum number of connections to show
    #[arg(short, long, default_value_t = 3)]
    limit: usize,
}

/// Map the -v count to a log filter level
const fn log_filter_from_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = log_filter_from_verbosity(cli.verbose);
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer())
        .init();

    let mut config = MvgConfig::default();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    let client = MvgClient::new(&config)?;

    match cli.command {
        Command::Departures {
            station,
            offset,
            limit,
            mode,
            recent_file,
        } => run_departures(&client, station, offset, limit, &mode, &recent_file).await,
        Command::Search { query } => run_search(&client, &query).await,
        Command::Nearby {
            latitude,
            longitude,
        } => run_nearby(&client, latitude, longitude).await,
        Command::Lines { station } => run_lines(&client, &station).await,
        Command::Route(args) => run_route(&client, args).await,
        Command::Interruptions => run_interruptions(&client).await,
    }
}

async fn run_departures(
    client: &MvgClient,
    station: Option<String>,
    offset: u32,
    limit: usize,
    modes: &[String],
    recent_file: &Path,
) -> anyhow::Result<()> {
    let modes = modes
        .iter()
        .map(|mode| mode.parse::<Product>())
        .collect::<Result<Vec<_>, _>>()?;

    let explicit = station.is_some();
    let query = match station {
        Some(station) => station,
        None => recall_station(recent_file)?,
    };

    let departures = match parse_station_arg(&query) {
        StationArg::Id(id) => client.departures(&id, offset).await?,
        StationArg::Name(name) => client.departures_by_name(&name, offset).await?,
    };
    // A failed lookup must not clobber the previously remembered station.
    if explicit {
        remember_station(recent_file, &query);
    }
    let departures: Vec<_> = departures
        .into_iter()
        .filter(|departure| modes.is_empty() || modes.contains(&departure.product))
        .collect();

    if departures.is_empty() {
        println!("No departures found.");
        return Ok(());
    }

    println!("🚉 Departures for {query}:");
    for departure in departures.iter().take(limit) {
        let live = if departure.live { "" } else { " (scheduled)" };
        let sev = if departure.sev { " [SEV]" } else { "" };
        println!(
            "  {:>3} min  {:<5} {}{live}{sev}",
            departure.departure_time_minutes, departure.label, departure.destination,
        );
    }
    Ok(())
}

async fn run_search(client: &MvgClient, query: &str) -> anyhow::Result<()> {
    let locations = client.search_locations(query).await?;

    if locations.is_empty() {
        println!("No locations found.");
        return Ok(());
    }

    println!("🔍 {} result(s) for '{query}':", locations.len());
    for location in &locations {
        let place = location.place.as_deref().unwrap_or("-");
        println!(
            "  [{}] {} ({place}), id {}",
            location.kind, location.name, location.id
        );
    }
    Ok(())
}

async fn run_nearby(client: &MvgClient, latitude: f64, longitude: f64) -> anyhow::Result<()> {
    let locations = client.nearby_stations(latitude, longitude).await?;

    if locations.is_empty() {
        println!("No stations nearby.");
        return Ok(());
    }

    println!("📍 Stations near {latitude}, {longitude}:");
    for location in &locations {
        let distance = location
            .distance
            .map_or_else(|| "?".to_string(), |d| d.to_string());
        println!("  {distance:>5} m  {} ({})", location.name, location.id);
    }
    Ok(())
}

async fn run_lines(client: &MvgClient, station: &str) -> anyhow::Result<()> {
    let id = resolve_endpoint(client, station).await?;
    let lines = client.lines(&id).await?;

    if lines.is_empty() {
        println!("No lines found.");
        return Ok(());
    }

    println!("🚏 Lines serving {station}:");
    for line in &lines {
        println!("  {line}");
    }
    Ok(())
}

async fn run_route(client: &MvgClient, args: RouteArgs) -> anyhow::Result<()> {
    let start = resolve_endpoint(client, &args.from).await?;
    let dest = resolve_endpoint(client, &args.to).await?;

    let mut query = RouteQuery::new(start, dest);
    if let Some(time) = args.time.as_deref() {
        query = query.with_time(parse_time(time)?);
        if args.arrival {
            query = query.for_arrival();
        }
    }
    if let Some(cap) = args.max_walk_to_start {
        query = query.with_max_walk_time_to_start(cap);
    }
    if let Some(cap) = args.max_walk_to_dest {
        query = query.with_max_walk_time_to_dest(cap);
    }
    if let Some(limit) = args.change_limit {
        query = query.with_change_limit(limit);
    }
    if args.no_ubahn {
        query = query.without_ubahn();
    }
    if args.no_bus {
        query = query.without_bus();
    }
    if args.no_tram {
        query = query.without_tram();
    }
    if args.no_sbahn {
        query = query.without_sbahn();
    }

    let connections = client.plan_route(&query).await?;
    if connections.is_empty() {
        println!("No connections found.");
        return Ok(());
    }

    println!("🗺  {} → {}:", args.from, args.to);
    for (index, connection) in connections.iter().take(args.limit).enumerate() {
        println!("Connection {}:", index + 1);
        print_connection(connection);
    }
    Ok(())
}

async fn run_interruptions(client: &MvgClient) -> anyhow::Result<()> {
    let payload = client.interruptions().await?;

    let Some(items) = payload
        .get("interruption")
        .and_then(serde_json::Value::as_array)
    else {
        // unrecognized shape, dump it as-is
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    };
    if items.is_empty() {
        println!("No interruptions reported.");
        return Ok(());
    }

    println!("⚠️  {} interruption(s):", items.len());
    for item in items {
        let title = item
            .get("title")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("(untitled)");
        println!("  - {title}");
        if let Some(duration) = item
            .get("duration")
            .and_then(|v| v.get("text"))
            .and_then(serde_json::Value::as_str)
        {
            println!("    {duration}");
        }
    }
    Ok(())
}

fn print_connection(connection: &Connection) {
    let departure = connection.departure_datetime.with_timezone(&Local);
    let arrival = connection.arrival_datetime.with_timezone(&Local);
    println!(
        "  {} → {}  ({} min, {} leg(s))",
        departure.format("%H:%M"),
        arrival.format("%H:%M"),
        connection.duration_minutes(),
        connection.connection_part_list.len()
    );
    for leg in &connection.connection_part_list {
        println!("    {}", format_leg(leg));
    }
}

/// Render one routing leg from the untyped leg payload.
fn format_leg(leg: &serde_json::Value) -> String {
    let from = leg
        .get("from")
        .and_then(|v| v.get("name"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("?");
    let to = leg
        .get("to")
        .and_then(|v| v.get("name"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or("?");
    let kind = leg
        .get("connectionPartType")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("TRANSPORTATION");

    match leg.get("label").and_then(serde_json::Value::as_str) {
        Some(label) => format!("{label}: {from} → {to}"),
        None if kind == "FOOTWAY" => format!("walk: {from} → {to}"),
        None => format!("{kind}: {from} → {to}"),
    }
}

enum StationArg {
    Id(StationId),
    Name(String),
}

/// Classify a station argument without touching the network.
///
/// Plain integers are legacy ids and colon-separated values are composite
/// ids; everything else needs a name lookup.
fn parse_station_arg(text: &str) -> StationArg {
    let text = text.trim();
    if let Ok(legacy) = text.parse::<u32>() {
        StationArg::Id(StationId::from(legacy))
    } else if text.contains(':') {
        StationArg::Id(StationId::composite(text))
    } else {
        StationArg::Name(text.to_string())
    }
}

/// Resolve a route endpoint, which additionally accepts "lat,lon" pairs.
async fn resolve_endpoint(client: &MvgClient, text: &str) -> anyhow::Result<StationId> {
    if let Some((latitude, longitude)) = parse_coordinates(text) {
        return Ok(StationId::coordinates(latitude, longitude));
    }

    match parse_station_arg(text) {
        StationArg::Id(id) => Ok(id),
        StationArg::Name(name) => {
            let id = client
                .resolve_station_id(&name)
                .await?
                .with_context(|| format!("no station found matching '{name}'"))?;
            Ok(id)
        }
    }
}

fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let (latitude, longitude) = text.trim().split_once(',')?;
    let latitude = latitude.trim().parse().ok()?;
    let longitude = longitude.trim().parse().ok()?;
    Some((latitude, longitude))
}

/// Parse a trip time, RFC3339 or a local wall-clock "2026-08-23 17:30".
fn parse_time(text: &str) -> anyhow::Result<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .with_context(|| format!("invalid time '{text}', expected RFC3339 or YYYY-MM-DD HH:MM"))?;
    let local = Local
        .from_local_datetime(&naive)
        .single()
        .with_context(|| format!("ambiguous local time '{text}'"))?;
    Ok(local.with_timezone(&Utc))
}

fn remember_station(path: &Path, station: &str) {
    if let Err(e) = fs::write(path, station) {
        warn!(error = %e, "Could not update the recent-station file");
    }
}

fn recall_station(path: &Path) -> anyhow::Result<String> {
    let text = fs::read_to_string(path).with_context(|| {
        format!(
            "no station given and no recent station at {}",
            path.display()
        )
    })?;
    let station = text.trim();
    if station.is_empty() {
        bail!("recent-station file {} is empty", path.display());
    }
    Ok(station.to_string())
}
