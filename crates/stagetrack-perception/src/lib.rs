//! `stagetrack-perception` – the per-scan tracking core.
//!
//! Turns one raw range scan into at most one stage-relative subject
//! position, and stabilises that position across scans.
//!
//! # Modules
//!
//! - [`geometry`] – [`StageGeometry`][geometry::StageGeometry] and
//!   [`filter_scan`][geometry::filter_scan]: polar → Cartesian conversion
//!   with range and stage-rectangle rejection.
//! - [`clustering`] – [`cluster`][clustering::cluster]: pure DBSCAN labelling
//!   of stage points into clusters and noise.
//! - [`selector`] – [`select_subject`][selector::select_subject]: picks the
//!   largest qualifying cluster and computes its centroid.
//! - [`normalize`] – [`normalize`][normalize::normalize]: maps a centroid to
//!   clamped `[0, 1] × [0, 1]` stage coordinates.
//! - [`stabilizer`] – [`MotionStabilizer`][stabilizer::MotionStabilizer]:
//!   movement-threshold hysteresis; the only cross-scan state.
//! - [`processor`] – [`ScanProcessor`][processor::ScanProcessor]: validated
//!   parameters plus the stateless filter → cluster → select → normalize
//!   chain.

pub mod clustering;
pub mod geometry;
pub mod normalize;
pub mod processor;
pub mod selector;
pub mod stabilizer;

pub use clustering::{ClusterLabel, cluster};
pub use geometry::{RangeWindow, StageGeometry, filter_scan};
pub use normalize::normalize;
pub use processor::{ClusterParams, ScanOutcome, ScanProcessor, TrackerParams};
pub use selector::{Subject, select_subject};
pub use stabilizer::{MotionStabilizer, TrackerState};
