mod input;
mod query;
mod track;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wayfinder_core::{GeoPoint, HotelSearch, TravelMode, DEFAULT_GEOCODE_LIMIT};
use wayfinder_nearby::BackendClient;

#[derive(Debug, Parser)]
#[command(name = "wayfinder")]
#[command(about = "Nearby places, routes and weather around a GPS fix")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// A point given as `--lat` / `--lng`.
#[derive(Debug, Clone, Copy, Args)]
pub(crate) struct PointArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,
}

impl PointArgs {
    pub(crate) fn point(self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Category/radius/limit overrides; unset values come from configuration.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct QueryArgs {
    /// Place category (e.g. catering.restaurant)
    #[arg(long)]
    pub category: Option<String>,
    /// Search radius in metres
    #[arg(long)]
    pub radius: Option<u32>,
    /// Maximum number of places
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub(crate) struct TrackArgs {
    #[command(flatten)]
    pub query: QueryArgs,
    /// Do not follow the location with smart suggestions
    #[arg(long)]
    pub no_suggestions: bool,
    /// Do not follow the location with weather
    #[arg(long)]
    pub no_weather: bool,
    /// How long to keep printing updates after stdin closes
    #[arg(long, default_value = "2000")]
    pub linger_ms: u64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List places near a point
    Nearby {
        #[command(flatten)]
        at: PointArgs,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// AI-ranked suggestions near a point, bucketed by rating
    Suggest {
        #[command(flatten)]
        at: PointArgs,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Route through two or more waypoints
    Route {
        /// Waypoint as "lat,lng"; repeat in travel order
        #[arg(
            long = "waypoint",
            value_parser = query::parse_point,
            allow_hyphen_values = true,
            num_args = 1
        )]
        waypoints: Vec<GeoPoint>,
        /// drive, walk, bicycle or transit
        #[arg(long, default_value = "drive")]
        mode: TravelMode,
    },
    /// Hotels near a point with a minimum rating
    Hotels {
        #[command(flatten)]
        at: PointArgs,
        /// Minimum rating (0-5)
        #[arg(long, default_value_t = HotelSearch::DEFAULT_MIN_RATING)]
        min_rating: f64,
        /// Search radius in metres
        #[arg(long, default_value_t = HotelSearch::DEFAULT_RADIUS_M)]
        radius: u32,
        /// Maximum number of hotels
        #[arg(long, default_value_t = HotelSearch::DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Destination candidates for free-text search
    Geocode {
        /// Search text; fewer than 2 characters yields no results
        text: String,
        #[arg(long, default_value_t = DEFAULT_GEOCODE_LIMIT)]
        limit: u32,
    },
    /// Current weather at a point
    Weather {
        #[command(flatten)]
        at: PointArgs,
    },
    /// Address for a point, falling back to its coordinates
    Reverse {
        #[command(flatten)]
        at: PointArgs,
    },
    /// Read one position event from stdin and resolve its address
    Whereami {
        /// Seconds to wait for the first position event
        #[arg(long, default_value = "10")]
        timeout_secs: u64,
    },
    /// Follow JSON-lines position events on stdin and print state changes
    Track(TrackArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = wayfinder_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = BackendClient::new(&config)?;
    tracing::debug!(backend = %client.base_url(), env = %config.env, "backend client ready");

    match cli.command {
        Commands::Nearby { at, query } => query::run_nearby(&client, &config, at, &query).await,
        Commands::Suggest { at, query } => query::run_suggest(&client, &config, at, &query).await,
        Commands::Route { waypoints, mode } => query::run_route(&client, waypoints, mode).await,
        Commands::Hotels {
            at,
            min_rating,
            radius,
            limit,
        } => query::run_hotels(&client, at, min_rating, radius, limit).await,
        Commands::Geocode { text, limit } => query::run_geocode(&client, &text, limit).await,
        Commands::Weather { at } => query::run_weather(&client, at).await,
        Commands::Reverse { at } => query::run_reverse(&client, at).await,
        Commands::Whereami { timeout_secs } => query::run_whereami(&client, timeout_secs).await,
        Commands::Track(args) => track::run_track(&config, client, args).await,
    }
}
