//! Background polling.
//!
//! Runs the [`Selector`] on a dedicated thread with its own single-threaded
//! Tokio runtime and sends every [`TickReport`] to the presenter over a
//! channel.
//!
//! The delay before the next tick is armed only after the current tick has
//! finished, so ticks never overlap and the selector state has exactly one
//! writer.  Slow upstreams are bounded by the fetcher's per-request timeout.
//!
//! ## For contributors
//!
//! The loop body is `sleep`, `tick`, `send`.  Keep it that order: the
//! `start_paused` tests expect the first report no earlier than one interval
//! after start, and a slow tick to push the next one back.  If you add a message variant to [`PollMsg`], handle it
//! in [`App::handle`](crate::app::App::handle) as well.

use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::selector::{Selector, TickReport};

/// Messages sent from the poller thread to the presenter.
#[derive(Debug)]
pub enum PollMsg {
    /// One tick finished.
    Tick(TickReport),
    /// The poller could not start and will not send anything else.
    Stopped(String),
}

/// Spawn the background polling thread.
///
/// Returns a receiver that the presenter should drain.  The thread stops once
/// the receiver is dropped.
pub fn spawn(selector: Selector, interval: Duration) -> mpsc::UnboundedReceiver<PollMsg> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "failed to start poller runtime");
                let _ = tx.send(PollMsg::Stopped(format!("poller failed to start: {e}")));
                return;
            }
        };
        runtime.block_on(run(selector, interval, tx));
    });

    rx
}

/// Tick forever, sleeping `interval` before each tick.
///
/// Returns when the receiving side of `tx` has gone away.
pub async fn run(mut selector: Selector, interval: Duration, tx: mpsc::UnboundedSender<PollMsg>) {
    loop {
        tokio::time::sleep(interval).await;

        let report = selector.tick().await;
        debug!(
            active = %report.active,
            polled = ?report.polled,
            stale = selector.state().is_stale(),
            "tick complete"
        );

        // If the receiver is gone the presenter has exited; stop polling.
        if tx.send(PollMsg::Tick(report)).is_err() {
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::tests::{down, ok, ScriptedSource};
    use crate::selector::ActiveSource;
    use crate::source::{DataSource, Snapshot, SourceError, SourceKind};
    use async_trait::async_trait;
    use tokio::time::Instant;

    const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    fn selector(
        ice: Vec<Result<Snapshot, SourceError>>,
        railjet: Vec<Result<Snapshot, SourceError>>,
    ) -> Selector {
        Selector::new(
            Box::new(ScriptedSource::new(SourceKind::Ice, ice)),
            Box::new(ScriptedSource::new(SourceKind::Railjet, railjet)),
            0,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();
        tokio::spawn(run(selector(vec![ok(SourceKind::Ice)], vec![]), DEFAULT_INTERVAL, tx));

        match rx.recv().await {
            Some(PollMsg::Tick(report)) => assert_eq!(report.active, ActiveSource::Ice),
            other => panic!("unexpected {other:?}"),
        }
        assert!(started.elapsed() >= DEFAULT_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_follow_state_transitions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(run(
            selector(vec![ok(SourceKind::Ice), down()], vec![ok(SourceKind::Railjet)]),
            DEFAULT_INTERVAL,
            tx,
        ));

        let mut actives = Vec::new();
        for _ in 0..3 {
            if let Some(PollMsg::Tick(report)) = rx.recv().await {
                actives.push(report.active);
            }
        }
        assert_eq!(
            actives,
            vec![ActiveSource::Ice, ActiveSource::Railjet, ActiveSource::Railjet]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(selector(vec![down()], vec![down()]), DEFAULT_INTERVAL, tx));
        drop(rx);
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("poller should stop")
            .unwrap();
    }

    /// A source whose poll takes longer than the tick interval.
    struct SlowSource;

    #[async_trait]
    impl DataSource for SlowSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Ice
        }

        async fn poll(&self) -> Result<Snapshot, SourceError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            ok(SourceKind::Ice)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_delay_the_next_one_instead_of_overlapping() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let selector = Selector::new(
            Box::new(SlowSource),
            Box::new(ScriptedSource::new(SourceKind::Railjet, vec![])),
            0,
        );
        tokio::spawn(run(selector, DEFAULT_INTERVAL, tx));

        rx.recv().await;
        let first = Instant::now();
        rx.recv().await;
        assert!(first.elapsed() >= Duration::from_secs(4), "{:?}", first.elapsed());
    }

    #[test]
    fn spawned_thread_delivers_reports() {
        let mut rx = spawn(
            selector(vec![ok(SourceKind::Ice)], vec![]),
            Duration::from_millis(10),
        );
        match rx.blocking_recv() {
            Some(PollMsg::Tick(report)) => assert_eq!(report.polled, vec![SourceKind::Ice]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
