//! Position Normalizer.

use stagetrack_types::{NormalizedPosition, StagePoint};

use crate::geometry::StageGeometry;

/// Map a stage-centred centroid to `[0, 1] × [0, 1]`.
///
/// `(-W/2, -H/2)` maps to `(0, 0)` and `(W/2, H/2)` to `(1, 1)`.  The result
/// is clamped, so centroids on or past the stage edge still produce a valid
/// position.
pub fn normalize(centroid: &StagePoint, stage: &StageGeometry) -> NormalizedPosition {
    let x = (centroid.x_m + stage.half_width()) / stage.width_m;
    let y = (centroid.y_m + stage.half_height()) / stage.height_m;
    NormalizedPosition::new(x.clamp(0.0, 1.0), y.clamp(0.0, 1.0))
}
