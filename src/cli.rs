use crate::application::{DEFAULT_ZOOM, Geolocator, SessionConfig};
use crate::domain::{BlobStorage, Coords, DomainResult};
use crate::infrastructure::{DEFAULT_GEO_URL, FileStorage, FixedPosition, IpGeolocator};
use crate::presentation::map_view::{MAX_ZOOM, MIN_ZOOM};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = ".trailmark";

#[derive(Parser, Debug)]
#[command(
    name = "trailmark",
    version,
    about = "Log running and cycling workouts on a terminal map"
)]
pub struct Cli {
    /// Directory holding the saved workouts, the log file and CSV exports
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Start at this latitude instead of looking the position up (needs --lon)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Start at this longitude instead of looking the position up (needs --lat)
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Map zoom for the initial view and when jumping to a workout
    #[arg(long, default_value_t = DEFAULT_ZOOM, value_parser = clap::value_parser!(u8).range(i64::from(MIN_ZOOM)..=i64::from(MAX_ZOOM)))]
    pub zoom: u8,

    /// IP geolocation endpoint answering with JSON lat/lon
    #[arg(long, default_value = DEFAULT_GEO_URL)]
    pub geo_url: String,

    /// Seconds to wait for each geolocation attempt
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub geo_timeout: u64,

    /// Extra geolocation attempts after the first failure
    #[arg(long, default_value_t = 2)]
    pub geo_retries: u32,

    /// Where `e` writes the CSV export. Default: <DATA_DIR>/workouts.csv
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Delete every saved workout before starting
    #[arg(long)]
    pub reset: bool,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            zoom: self.zoom,
            ..SessionConfig::default()
        }
    }

    /// Storage under the data directory, emptied first when `--reset`
    /// was given.
    pub fn open_storage(&self) -> DomainResult<FileStorage> {
        let mut storage = FileStorage::new(self.data_dir.clone());
        if self.reset {
            let key = self.session_config().storage_key;
            storage.remove(&key)?;
            tracing::info!(%key, dir = %self.data_dir.display(), "saved workouts reset");
        }
        Ok(storage)
    }

    pub fn export_path(&self) -> PathBuf {
        self.export
            .clone()
            .unwrap_or_else(|| self.data_dir.join("workouts.csv"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("trailmark.log")
    }

    /// A fixed position when both coordinates were given, otherwise an IP
    /// lookup.
    pub fn geolocator(&self) -> Box<dyn Geolocator + Send> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Box::new(FixedPosition(Coords::new(lat, lon))),
            _ => Box::new(IpGeolocator::new(
                self.geo_url.clone(),
                Duration::from_secs(self.geo_timeout),
                self.geo_retries,
            )),
        }
    }
}
