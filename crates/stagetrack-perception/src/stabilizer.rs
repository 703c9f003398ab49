//! Motion Stabilizer – movement-threshold hysteresis.
//!
//! The stabilizer is the only part of the pipeline that remembers anything
//! between scans.  It holds an *active* position that only moves when a new
//! detection lands more than `movement_threshold` (normalized units) away
//! from it, and it keeps re-emitting the last position when a scan produces
//! no detection.
//!
//! # States
//!
//! ```text
//!            detection p
//! Unarmed ─────────────────► Armed { active: p, sent: p }
//!    │                          │
//!    │ no detection             │ detection p:  |p − active| > threshold ⇒ active = p
//!    ▼                          │               sent = active, emit sent
//! (emit nothing)                │ no detection: emit sent
//! ```
//!
//! Once armed the stabilizer never reports "nobody there"; a subject that
//! leaves the stage is indistinguishable from one standing still.
//!
//! # Example
//!
//! ```rust
//! use stagetrack_perception::stabilizer::MotionStabilizer;
//! use stagetrack_types::NormalizedPosition;
//!
//! let mut stab = MotionStabilizer::new(0.02);
//! assert_eq!(stab.update(None), None);
//!
//! let p = NormalizedPosition::new(0.50, 0.50);
//! assert_eq!(stab.update(Some(p)), Some(p));
//!
//! // Jitter below the threshold is absorbed.
//! let jitter = NormalizedPosition::new(0.505, 0.505);
//! assert_eq!(stab.update(Some(jitter)), Some(p));
//!
//! // Dropouts hold the last position.
//! assert_eq!(stab.update(None), Some(p));
//! ```

use stagetrack_types::NormalizedPosition;
use tracing::debug;

/// Cross-scan tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TrackerState {
    /// No detection has been received yet.
    #[default]
    Unarmed,
    /// At least one detection has been received.
    Armed {
        /// Last position where real movement was observed.
        active: NormalizedPosition,
        /// Last position handed to the publisher; always equal to `active`.
        sent: NormalizedPosition,
    },
}

impl TrackerState {
    pub fn last_active_position(&self) -> Option<NormalizedPosition> {
        match self {
            TrackerState::Armed { active, .. } => Some(*active),
            TrackerState::Unarmed => None,
        }
    }

    pub fn last_sent_position(&self) -> Option<NormalizedPosition> {
        match self {
            TrackerState::Armed { sent, .. } => Some(*sent),
            TrackerState::Unarmed => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, TrackerState::Armed { .. })
    }
}

/// Hysteresis filter over normalized subject positions.
#[derive(Debug, Clone)]
pub struct MotionStabilizer {
    movement_threshold: f64,
    state: TrackerState,
}

impl MotionStabilizer {
    /// Create an unarmed stabilizer.
    ///
    /// A displacement must be strictly greater than `movement_threshold` to
    /// move the active position.
    pub fn new(movement_threshold: f64) -> Self {
        Self {
            movement_threshold,
            state: TrackerState::Unarmed,
        }
    }

    pub fn movement_threshold(&self) -> f64 {
        self.movement_threshold
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Feed this scan's detection (or its absence) and return the position to
    /// emit, if any.
    pub fn update(&mut self, detection: Option<NormalizedPosition>) -> Option<NormalizedPosition> {
        self.state = match (self.state, detection) {
            (TrackerState::Unarmed, None) => return None,
            (TrackerState::Unarmed, Some(p)) => {
                debug!(x = p.x, y = p.y, "stabilizer armed");
                TrackerState::Armed { active: p, sent: p }
            }
            (armed @ TrackerState::Armed { .. }, None) => armed,
            (TrackerState::Armed { active, .. }, Some(p)) => {
                let moved = p.distance(&active);
                let active = if moved > self.movement_threshold {
                    debug!(x = p.x, y = p.y, moved, "active position updated");
                    p
                } else {
                    active
                };
                TrackerState::Armed {
                    active,
                    sent: active,
                }
            }
        };
        self.state.last_sent_position()
    }
}
