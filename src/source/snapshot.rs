//! The normalized train status shared across all data sources.
//!
//! Every source converts its native JSON into a [`Snapshot`] so the selector
//! and the presenter can stay source-agnostic.

use std::fmt;

use super::SourceError;

/// Which upstream feed produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Deutsche Bahn ICE portal (`iceportal.de`).
    Ice,
    /// ÖBB railnet (`railnet.oebb.at`).
    Railjet,
}

impl SourceKind {
    /// Short operator badge shown next to the panel label.
    pub fn badge(self) -> &'static str {
        match self {
            SourceKind::Ice => "DB",
            SourceKind::Railjet => "ÖBB",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Ice => f.write_str("ICE"),
            SourceKind::Railjet => f.write_str("RailJet"),
        }
    }
}

/// The result of one successful poll.
///
/// Only ever built from a fully parsed response; sources return an error
/// instead of a partially filled snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub source: SourceKind,

    /// Display name or number of the train, e.g. `"ICE 123"` or `"RJ 60"`.
    pub train_label: String,

    /// Current speed, never negative.
    pub speed_kmh: f64,

    pub next_stop_name: String,

    /// Pre-formatted arrival time at the next stop.
    ///
    /// Empty when the upstream feed does not report one.
    pub next_stop_time: String,
}

impl Snapshot {
    /// Reject speeds a moving train cannot report.
    pub fn checked_speed(speed: f64) -> Result<f64, SourceError> {
        if speed.is_finite() && speed >= 0.0 {
            Ok(speed)
        } else {
            Err(SourceError::DataShape(format!("invalid speed {speed}")))
        }
    }

    /// The single-line panel text: `"{train} | {speed} km/h | {time} {stop}"`.
    pub fn panel_line(&self) -> String {
        let stop = if self.next_stop_time.is_empty() {
            self.next_stop_name.clone()
        } else {
            format!("{} {}", self.next_stop_time, self.next_stop_name)
        };
        format!("{} | {} km/h | {}", self.train_label, self.speed_kmh, stop)
    }
}
