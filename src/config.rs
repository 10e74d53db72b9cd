//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use clap::Parser;

use crate::source::{ice, railjet, ArrivalField, DisplayZone};

#[derive(Parser, Debug, Clone)]
#[command(name = "railpanel")]
#[command(about = "Shows train, speed and next stop from the ICE portal or ÖBB railnet")]
pub struct Config {
    /// Delay between the end of one poll and the start of the next, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    /// Timetable field used for the ICE next-stop arrival time
    #[arg(long, value_enum, default_value_t = ArrivalField::Scheduled)]
    pub arrival: ArrivalField,

    /// Failed polls in a row that keep showing the last good reading
    #[arg(long, default_value_t = 0)]
    pub failure_tolerance: u32,

    /// IANA time zone for arrival times (e.g. Europe/Berlin); defaults to local time
    #[arg(long)]
    pub timezone: Option<String>,

    /// Base URL of the ICE portal API
    #[arg(long, default_value = ice::DEFAULT_BASE_URL)]
    pub ice_base_url: String,

    /// URL of the ÖBB railnet combined status document
    #[arg(long, default_value = railjet::DEFAULT_URL)]
    pub railjet_url: String,

    /// Directory for the log file
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Print one line per update instead of starting the terminal UI
    #[arg(long)]
    pub plain: bool,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve `--timezone` into a [`DisplayZone`].
    pub fn display_zone(&self) -> Result<DisplayZone> {
        match &self.timezone {
            None => Ok(DisplayZone::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(DisplayZone::Named)
                .map_err(|e| anyhow!("unknown time zone {name:?}: {e}")),
        }
    }
}
