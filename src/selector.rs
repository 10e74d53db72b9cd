//! Source selection state machine.
//!
//! Decides each tick which data source to query:
//!
//! ```text
//!             ICE ok                         RailJet ok
//!   ┌──────────────────┐            ┌───────────────────────┐
//!   ▼                  │            │                       ▼
//! ┌─────┐  ICE fails ┌──────────────┐  RailJet fails  ┌─────────┐
//! │ ICE │ ─────────► │ Disconnected │ ◄────────────── │ RailJet │
//! └─────┘            └──────────────┘                 └─────────┘
//! ```
//!
//! ICE is preferred whenever the machine is not already committed to
//! RailJet.  Once a source works, only that source is polled until it fails;
//! the other one is then probed in the same tick.  A tick failing both ends in
//! `Disconnected`, from which the next tick starts over with ICE.

use std::fmt;

use tracing::{info, warn};

use crate::source::{DataSource, Snapshot, SourceError, SourceKind};

/// Which feed is currently trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveSource {
    Ice,
    Railjet,
    #[default]
    Disconnected,
}

impl ActiveSource {
    pub fn badge(self) -> &'static str {
        match self {
            ActiveSource::Ice => SourceKind::Ice.badge(),
            ActiveSource::Railjet => SourceKind::Railjet.badge(),
            ActiveSource::Disconnected => "--",
        }
    }
}

impl fmt::Display for ActiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveSource::Ice => f.write_str("ICE"),
            ActiveSource::Railjet => f.write_str("RailJet"),
            ActiveSource::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// The most recent poll failure, as shown by "Show problem".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LastError {
    /// Nothing has failed since startup.
    #[default]
    NotYetObserved,
    /// A later poll succeeded.
    Cleared,
    Failed(String),
}

impl LastError {
    /// Text for the problem popup.
    pub fn describe(&self) -> &str {
        match self {
            LastError::NotYetObserved => "All fine",
            LastError::Cleared => "none since the last successful poll",
            LastError::Failed(description) => description,
        }
    }
}

/// Mutable state owned by exactly one [`Selector`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorState {
    pub active: ActiveSource,
    pub last_snapshot: Option<Snapshot>,
    pub last_error: LastError,
    /// Consecutive ticks that ended [`ActiveSource::Disconnected`].
    pub consecutive_failures: u32,
}

impl SelectorState {
    /// Whether `last_snapshot` predates the latest tick.
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }
}

/// What a tick hands to the presenter.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// A fresh snapshot from this tick.
    Snapshot(Snapshot),
    /// This tick failed but the failure is still within the configured
    /// tolerance, so the previous snapshot stays on screen.
    Stale { snapshot: Snapshot, error: String },
    /// This tick failed; show the error text.
    Error(String),
}

/// Outcome of one [`Selector::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub active: ActiveSource,
    /// Sources queried during this tick, in order.
    pub polled: Vec<SourceKind>,
    pub publication: Publication,
    pub last_error: LastError,
}

/// Applies the sticky-preferred-source policy across the two sources.
pub struct Selector {
    ice: Box<dyn DataSource>,
    railjet: Box<dyn DataSource>,
    failure_tolerance: u32,
    state: SelectorState,
}

impl Selector {
    /// `failure_tolerance` is how many consecutive failed ticks keep showing
    /// the last snapshot before the error replaces it (0 = replace at once).
    pub fn new(
        ice: Box<dyn DataSource>,
        railjet: Box<dyn DataSource>,
        failure_tolerance: u32,
    ) -> Self {
        Self {
            ice,
            railjet,
            failure_tolerance,
            state: SelectorState::default(),
        }
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// Run one poll-and-evaluate cycle.
    ///
    /// Never fails: every source error becomes a state transition plus an
    /// error description in the report.
    pub async fn tick(&mut self) -> TickReport {
        let previous = self.state.active;
        let mut state = previous;
        let mut polled = Vec::with_capacity(2);
        let mut fresh = None;
        let mut error = None;

        if matches!(state, ActiveSource::Ice | ActiveSource::Disconnected) {
            polled.push(self.ice.kind());
            state = match self.ice.poll().await {
                Ok(snapshot) => {
                    fresh = Some(snapshot);
                    ActiveSource::Ice
                }
                Err(e) => {
                    error = Some(Self::failure(self.ice.kind(), &e));
                    ActiveSource::Disconnected
                }
            };
        }

        if matches!(state, ActiveSource::Railjet | ActiveSource::Disconnected) {
            polled.push(self.railjet.kind());
            state = match self.railjet.poll().await {
                Ok(snapshot) => {
                    fresh = Some(snapshot);
                    ActiveSource::Railjet
                }
                Err(e) => {
                    error = Some(Self::failure(self.railjet.kind(), &e));
                    ActiveSource::Disconnected
                }
            };
        }

        if state != previous {
            info!(from = %previous, to = %state, "active source changed");
        }
        self.state.active = state;

        let publication = match fresh {
            Some(snapshot) => {
                self.state.last_snapshot = Some(snapshot.clone());
                self.state.last_error = LastError::Cleared;
                self.state.consecutive_failures = 0;
                Publication::Snapshot(snapshot)
            }
            None => {
                // Both polled sources failed, so `error` holds the last one.
                let description = error.unwrap_or_default();
                self.state.last_error = LastError::Failed(description.clone());
                self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
                match &self.state.last_snapshot {
                    Some(snapshot) if self.state.consecutive_failures <= self.failure_tolerance => {
                        Publication::Stale {
                            snapshot: snapshot.clone(),
                            error: description,
                        }
                    }
                    _ => Publication::Error(description),
                }
            }
        };

        TickReport {
            active: state,
            polled,
            publication,
            last_error: self.state.last_error.clone(),
        }
    }

    fn failure(kind: SourceKind, err: &SourceError) -> String {
        warn!(source = %kind, kind = err.kind(), error = %err, "poll failed");
        format!("{kind}: {err}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
