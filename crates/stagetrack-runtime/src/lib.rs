//! `stagetrack-runtime` – session ownership and the scan loop.
//!
//! # Modules
//!
//! - [`session`] – [`TrackingSession`][session::TrackingSession]: owns one
//!   [`ScanProcessor`][stagetrack_perception::ScanProcessor] and the
//!   [`MotionStabilizer`][stagetrack_perception::MotionStabilizer] holding
//!   that session's tracker state.  Independent sessions never share state.
//! - [`tracker_loop`] – [`TrackerLoop`][tracker_loop::TrackerLoop]: pulls a
//!   scan, runs it through the session, publishes the emission, repeats.
//!   Stops between scans when the shared stop flag is raised.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

pub mod session;
pub mod telemetry;
pub mod tracker_loop;

pub use session::{SessionStep, TrackingSession};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use tracker_loop::{RunStats, TrackerLoop};
