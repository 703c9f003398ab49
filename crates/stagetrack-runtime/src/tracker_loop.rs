//! [`TrackerLoop`] – the pull-driven scan loop.
//!
//! Each iteration:
//!
//! 1. **Acquire** – await the next [`Scan`][stagetrack_types::Scan] from the
//!    [`ScanSource`].  A source error ends the session; an exhausted source
//!    ends it cleanly.
//! 2. **Track** – run the scan through the [`TrackingSession`] (filter →
//!    cluster → select → normalize → stabilize).
//! 3. **Publish** – hand the emitted position, if any, to the [`Publisher`].
//!    A failed datagram is logged and counted; the next scan carries a fresh
//!    report anyway.
//!
//! One scan is fully processed before the next is requested.  The stop flag
//! is checked between scans only.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::{Arc, atomic::AtomicBool};
//! use stagetrack_hal::SimLidar;
//! use stagetrack_middleware::UdpPublisher;
//! use stagetrack_perception::TrackerParams;
//! use stagetrack_runtime::{TrackerLoop, TrackingSession};
//!
//! # async fn demo() -> Result<(), stagetrack_types::TrackError> {
//! let session = TrackingSession::new(TrackerParams::default())?;
//! let mut tracker = TrackerLoop::new(session, Arc::new(AtomicBool::new(false)));
//! let mut lidar = SimLidar::new("sim-lidar").with_scan_rate(10.0);
//! let publisher = UdpPublisher::resolve("127.0.0.1", 8888).await?;
//! let stats = tracker.run(&mut lidar, &publisher).await?;
//! println!("{} scans processed", stats.scans);
//! # Ok(())
//! # }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use stagetrack_hal::ScanSource;
use stagetrack_middleware::Publisher;
use stagetrack_types::TrackError;
use tracing::{debug, info, instrument, warn};

use crate::session::TrackingSession;

/// Counters for one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Scans pulled from the source.
    pub scans: u64,
    /// Scans in which a subject was detected.
    pub detections: u64,
    /// Positions successfully handed to the publisher.
    pub emissions: u64,
    /// Positions the publisher failed to send.
    pub publish_failures: u64,
}

/// Drives a [`TrackingSession`] from a [`ScanSource`] into a [`Publisher`].
pub struct TrackerLoop {
    session: TrackingSession,
    stop: Arc<AtomicBool>,
    stats: RunStats,
}

impl TrackerLoop {
    /// `stop` is polled between scans; set it to end [`run`][Self::run].
    pub fn new(session: TrackingSession, stop: Arc<AtomicBool>) -> Self {
        Self {
            session,
            stop,
            stats: RunStats::default(),
        }
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    /// Counters accumulated over every call to [`run`][Self::run].
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Process scans until the source is exhausted or the stop flag is set.
    ///
    /// # Errors
    ///
    /// Propagates the source's error (normally
    /// [`TrackError::SensorConnection`]); the session is over at that point.
    #[instrument(skip_all, fields(source = %source.id()))]
    pub async fn run<S, P>(&mut self, source: &mut S, publisher: &P) -> Result<RunStats, TrackError>
    where
        S: ScanSource + ?Sized,
        P: Publisher + ?Sized,
    {
        info!("tracking started");
        while !self.stop.load(Ordering::SeqCst) {
            let Some(scan) = source.next_scan().await? else {
                info!("scan source exhausted");
                break;
            };
            self.stats.scans += 1;

            let step = self.session.step(&scan);
            if step.outcome.position.is_some() {
                self.stats.detections += 1;
            }
            let Some(position) = step.emitted else {
                continue;
            };

            match publisher.publish(position).await {
                Ok(()) => self.stats.emissions += 1,
                Err(e) => {
                    self.stats.publish_failures += 1;
                    warn!(error = %e, "position not published");
                }
            }
        }
        if self.stop.load(Ordering::SeqCst) {
            debug!("stop requested");
        }
        info!(
            scans = self.stats.scans,
            detections = self.stats.detections,
            emissions = self.stats.emissions,
            publish_failures = self.stats.publish_failures,
            "tracking stopped"
        );
        Ok(self.stats)
    }
}
