//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait and the common [`Snapshot`]
//! type.  The two concrete sources live in sub-modules: [`ice`] for the DB
//! ICE portal and [`railjet`] for the ÖBB railnet feed.
//!
//! Each source splits its work into I/O (`poll`, which goes through the shared
//! [`Fetcher`](crate::fetch::Fetcher)) and a pure `parse_*` function, so the
//! extraction rules can be tested without a network.
//!
//! ## For contributors: adding a new source
//!
//! 1. Create a new file in this directory (e.g. `sbb.rs`).
//! 2. Define a struct holding a [`Fetcher`](crate::fetch::Fetcher) and its
//!    URL, and implement [`DataSource`] for it.
//! 3. Add a [`SourceKind`] variant with its badge.
//! 4. Teach the [`Selector`](crate::selector::Selector) where the new source
//!    sits in the fallback order.

mod error;
pub mod ice;
mod json;
pub mod railjet;
mod snapshot;

pub use error::SourceError;
pub use ice::{ArrivalField, DisplayZone, IceSource};
pub use railjet::RailjetSource;
pub use snapshot::{Snapshot, SourceKind};

use async_trait::async_trait;

/// Trait that every data source must implement.
///
/// The selector calls [`poll()`](DataSource::poll) at most once per tick from
/// the poller task, so implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Which feed this source reads.
    fn kind(&self) -> SourceKind;

    /// Query the upstream feed and normalize the answer.
    ///
    /// Errors cover transport, JSON decoding and missing fields alike; a
    /// returned [`Snapshot`] is always complete.
    async fn poll(&self) -> Result<Snapshot, SourceError>;
}
