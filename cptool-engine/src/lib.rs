#![warn(clippy::all)]

//! Session-bound extraction and submission tracking.
//!
//! A [`Session`] owns the transport and the authenticated identity. Listings
//! are read through [`PaginatedStreamer`] and submissions are followed with
//! [`SubmissionTracker`]; both hand results to the caller over a bounded
//! [`ListingStream`] that stops its producer when cancelled or dropped.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use cptool_util::{model, service, JudgeError};

mod act;
mod gate;
mod session;
mod site;
mod stream;
#[cfg(test)]
mod testing;
mod track;

pub use act::Act;
pub use gate::{Marker, Readiness, ReadinessGate};
pub use session::Session;
pub use site::Site;
pub use stream::{
    Extract, Extracted, ListingStream, PageBudget, PageEvent, PageFailure, PaginatedStreamer,
};
pub use track::{Source, SubmissionTracker, SubmitTarget, TrackMode};

pub type Error = anyhow::Error;
pub type Result<T> = anyhow::Result<T>;

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JudgeError::Cancelled.into()),
        result = fut => result,
    }
}
