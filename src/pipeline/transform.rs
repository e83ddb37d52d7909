//! Physical → logical pointer transform.
//!
//! ```text
//! logical = (raw - offset) * logical_size / scaled_size - panel_origin
//! ```
//!
//! Integer arithmetic, truncating toward zero. Computed in 64 bits so large
//! window coordinates cannot overflow the intermediate product.

use crate::types::{DisplaySnapshot, LogicalPoint};

/// Map a raw pointer position into panel-relative logical coordinates.
pub fn to_logical(raw: (i32, i32), display: &DisplaySnapshot, origin: (i32, i32)) -> LogicalPoint {
    let (offset_x, offset_y) = display.display_offset();
    let (logical_w, logical_h) = display.logical_size();
    let (scaled_w, scaled_h) = display.scaled_size();

    LogicalPoint {
        x: axis(raw.0, offset_x, logical_w, scaled_w, origin.0),
        y: axis(raw.1, offset_y, logical_h, scaled_h, origin.1),
    }
}

fn axis(raw: i32, offset: i32, logical: i32, scaled: i32, origin: i32) -> i32 {
    let value = (raw as i64 - offset as i64) * logical as i64 / scaled as i64 - origin as i64;
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
