//! Presenter state.
//!
//! [`App`] turns [`PollMsg`]s from the poller into what the panel shows: a
//! source badge, a single label line and, on demand, the last problem.

use chrono::{DateTime, Local};
use tracing::debug;

use crate::poll::PollMsg;
use crate::selector::{ActiveSource, LastError, Publication, TickReport};

pub struct App {
    /// Source the last tick settled on.
    pub active: ActiveSource,
    /// Panel text.
    pub label: String,
    /// The label shows a snapshot kept through a tolerated failure.
    pub stale: bool,
    pub last_error: LastError,
    /// Whether the "Show problem" popup is open.
    pub show_problem: bool,
    /// Whether the user has requested to quit.
    pub quit: bool,
    pub ticks: u64,
    pub updated_at: Option<DateTime<Local>>,
}

impl App {
    pub fn new() -> Self {
        Self {
            active: ActiveSource::Disconnected,
            label: "starting...".into(),
            stale: false,
            last_error: LastError::NotYetObserved,
            show_problem: false,
            quit: false,
            ticks: 0,
            updated_at: None,
        }
    }

    /// Apply one message from the poller.
    pub fn handle(&mut self, msg: PollMsg) {
        match msg {
            PollMsg::Tick(report) => self.apply_report(report),
            PollMsg::Stopped(reason) => {
                self.active = ActiveSource::Disconnected;
                self.label = reason.clone();
                self.last_error = LastError::Failed(reason);
            }
        }
    }

    fn apply_report(&mut self, report: TickReport) {
        self.ticks += 1;
        self.updated_at = Some(Local::now());
        self.active = report.active;
        self.last_error = report.last_error;

        match report.publication {
            Publication::Snapshot(snapshot) => {
                self.label = snapshot.panel_line();
                self.stale = false;
            }
            Publication::Stale { snapshot, error } => {
                debug!(%error, "keeping last snapshot on screen");
                self.label = snapshot.panel_line();
                self.stale = true;
            }
            Publication::Error(description) => {
                self.label = description;
                self.stale = false;
            }
        }
    }

    /// Badge and label as one line, as printed in plain mode.
    pub fn panel_text(&self) -> String {
        let stale = if self.stale { " (stale)" } else { "" };
        format!("[{}] {}{}", self.active.badge(), self.label, stale)
    }

    /// Text of the "Show problem" popup.
    pub fn problem_text(&self) -> String {
        format!("Error: {}", self.last_error.describe())
    }

    pub fn toggle_problem(&mut self) {
        self.show_problem = !self.show_problem;
    }
}
