//! `stagetrack-hal` – sensor-side collaborators.
//!
//! The tracking core never talks to hardware.  It pulls whole scans from a
//! [`ScanSource`], one at a time.
//!
//! # Modules
//!
//! - [`scan_source`] – the [`ScanSource`] trait every scan provider implements.
//! - [`sim`] – [`SimLidar`]: a deterministic ray-cast 2-D LiDAR with a walking
//!   subject, a thin pole and room walls, for headless runs and tests.
//! - [`replay`] – [`ReplaySource`]: plays back scans recorded as
//!   newline-delimited JSON.

pub mod replay;
pub mod scan_source;
pub mod sim;

pub use replay::ReplaySource;
pub use scan_source::ScanSource;
pub use sim::{SimLidar, SubjectPath};
