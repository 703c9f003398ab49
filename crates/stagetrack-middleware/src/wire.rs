//! Position datagram codec.
//!
//! A datagram is UTF-8 text holding two space-separated fixed-point numbers
//! with six decimals, `norm_x` then `norm_y`:
//!
//! ```text
//! 0.531200 0.784500
//! ```
//!
//! There is no framing, checksum or sequence number.  Every datagram is a
//! complete, idempotent state report.

use stagetrack_types::{NormalizedPosition, TrackError};

/// Render `position` as a datagram payload.
pub fn encode_position(position: &NormalizedPosition) -> String {
    format!("{:.6} {:.6}", position.x, position.y)
}

/// Parse a datagram payload back into a position.
///
/// # Errors
///
/// Returns [`TrackError::Wire`] unless the payload is exactly two finite
/// numbers in `[0, 1]` separated by whitespace.
pub fn decode_position(payload: &[u8]) -> Result<NormalizedPosition, TrackError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| TrackError::Wire(format!("payload is not UTF-8: {e}")))?;
    let mut fields = text.split_whitespace();
    let (Some(x), Some(y), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(TrackError::Wire(format!(
            "expected two fields, got {text:?}"
        )));
    };
    Ok(NormalizedPosition::new(parse_unit(x)?, parse_unit(y)?))
}

fn parse_unit(field: &str) -> Result<f64, TrackError> {
    let v: f64 = field
        .parse()
        .map_err(|e| TrackError::Wire(format!("bad number {field:?}: {e}")))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(TrackError::Wire(format!("{field} is outside [0, 1]")))
    }
}
