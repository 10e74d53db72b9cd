//! DB ICE portal source.
//!
//! The on-board portal splits what we need over two endpoints: `status`
//! carries the current speed, `tripInfo/trip` carries the journey name and
//! the stop list.  Both are requested concurrently and both must succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::json::string_or_number;
use super::{DataSource, Snapshot, SourceError, SourceKind};
use crate::fetch::Fetcher;

/// Base URL of the ICE portal REST API.
pub const DEFAULT_BASE_URL: &str = "https://iceportal.de/api1/rs";

/// Browser-profile request headers (Firefox 146 on Linux).
///
/// The portal rejects requests that do not look like they come from a
/// browser, so this set is part of the upstream contract.  `Host` and
/// `Connection` are left to the HTTP client, which derives the same values
/// from the URL.
pub const ICE_BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Encoding", "gzip, deflate, br, zstd"),
    ("Accept-Language", "en-GB,en;q=0.5"),
    ("Priority", "u=0, i"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
    (
        "User-Agent",
        "Mozilla/5.0 (X11; Linux x86_64; rv:146.0) Gecko/20100101 Firefox/146.0",
    ),
];

/// Which timetable field provides the next-stop arrival time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ArrivalField {
    /// The timetabled arrival.
    #[default]
    Scheduled,
    /// The live arrival estimate, falling back to the timetable when the
    /// portal has none.
    Actual,
}

/// Time zone used to render arrival timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayZone {
    /// The zone of the machine running the panel.
    #[default]
    Local,
    Named(Tz),
}

impl DisplayZone {
    /// Render an epoch-milliseconds timestamp as `HH:MM`.
    pub fn format_hm(&self, millis: i64) -> Option<String> {
        let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
        let text = match self {
            DisplayZone::Local => utc.with_timezone(&chrono::Local).format("%H:%M").to_string(),
            DisplayZone::Named(tz) => utc.with_timezone(tz).format("%H:%M").to_string(),
        };
        Some(text)
    }
}

// -- upstream payloads -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StatusPayload {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct TripPayload {
    trip: Trip,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Trip {
    journey_display_value: String,
    stop_info: StopInfo,
    stops: Vec<Stop>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopInfo {
    #[serde(deserialize_with = "string_or_number")]
    actual_next: String,
}

#[derive(Debug, Deserialize)]
struct Stop {
    station: Station,
    #[serde(default)]
    timetable: Timetable,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Station {
    #[serde(deserialize_with = "string_or_number")]
    eva_nr: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Timetable {
    scheduled_arrival_time: Option<i64>,
    actual_arrival_time: Option<i64>,
}

impl Timetable {
    fn arrival(&self, field: ArrivalField) -> Option<i64> {
        match field {
            ArrivalField::Scheduled => self.scheduled_arrival_time,
            ArrivalField::Actual => self.actual_arrival_time.or(self.scheduled_arrival_time),
        }
    }
}

// -- source ------------------------------------------------------------------

/// Polls the ICE portal.
#[derive(Debug, Clone)]
pub struct IceSource {
    fetcher: Fetcher,
    status_url: String,
    trip_url: String,
    arrival: ArrivalField,
    zone: DisplayZone,
}

impl IceSource {
    /// Create a source against `base_url` (normally [`DEFAULT_BASE_URL`]).
    pub fn new(
        fetcher: Fetcher,
        base_url: &str,
        arrival: ArrivalField,
        zone: DisplayZone,
    ) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            fetcher,
            status_url: format!("{base}/status"),
            trip_url: format!("{base}/tripInfo/trip"),
            arrival,
            zone,
        }
    }

    /// Build a [`Snapshot`] from already-fetched status and trip payloads.
    ///
    /// Pure function (no I/O) so the extraction rules can be tested directly.
    pub fn parse(
        status: Value,
        trip: Value,
        arrival: ArrivalField,
        zone: &DisplayZone,
    ) -> Result<Snapshot, SourceError> {
        let status: StatusPayload = serde_json::from_value(status)?;
        let TripPayload { trip } = serde_json::from_value(trip)?;

        let next = trip
            .stops
            .iter()
            .find(|stop| stop.station.eva_nr == trip.stop_info.actual_next)
            .ok_or_else(|| {
                SourceError::DataShape(format!(
                    "no stop matches actualNext {}",
                    trip.stop_info.actual_next
                ))
            })?;

        let next_stop_time = match next.timetable.arrival(arrival) {
            Some(millis) => zone.format_hm(millis).ok_or_else(|| {
                SourceError::DataShape(format!("arrival timestamp {millis} out of range"))
            })?,
            None => String::new(),
        };

        Ok(Snapshot {
            source: SourceKind::Ice,
            train_label: trip.journey_display_value,
            speed_kmh: Snapshot::checked_speed(status.speed)?,
            next_stop_name: next.station.name.clone(),
            next_stop_time,
        })
    }
}

#[async_trait]
impl DataSource for IceSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Ice
    }

    async fn poll(&self) -> Result<Snapshot, SourceError> {
        let (status, trip) = tokio::join!(
            self.fetcher.fetch(&self.status_url, ICE_BROWSER_HEADERS),
            self.fetcher.fetch(&self.trip_url, ICE_BROWSER_HEADERS),
        );
        debug!(status_ok = status.is_ok(), trip_ok = trip.is_ok(), "ICE requests joined");
        Self::parse(status?, trip?, self.arrival, &self.zone)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
