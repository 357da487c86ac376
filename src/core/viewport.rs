use crate::domain::geo::{LatLng, Rect};
use crate::domain::ports::Projection;

/// Margin kept between an open overlay and the edges of the map container.
pub const OVERLAY_PADDING_PX: f64 = 16.0;

/// Pixel offset to apply to the map center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Shift {
    pub dx: f64,
    pub dy: f64,
}

impl Shift {
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// How far the overlay sticks out of the padded container, per axis.
///
/// Negative values mean the overlay crosses the left/top edge, positive
/// values the right/bottom edge. An overlay larger than the padded area is
/// aligned by its left/top edge.
pub fn overflow_shift(container: Rect, overlay: Rect, padding: f64) -> Shift {
    Shift {
        dx: axis_overflow(
            overlay.left,
            overlay.right,
            container.left + padding,
            container.right - padding,
        ),
        dy: axis_overflow(
            overlay.top,
            overlay.bottom,
            container.top + padding,
            container.bottom - padding,
        ),
    }
}

fn axis_overflow(start: f64, end: f64, min: f64, max: f64) -> f64 {
    if start < min {
        start - min
    } else if end > max {
        end - max
    } else {
        0.0
    }
}

/// Moves `center` by `shift` screen pixels through the map projection.
pub fn shifted_center(projection: &dyn Projection, center: LatLng, shift: Shift) -> LatLng {
    let point = projection
        .container_point_from_coords(center)
        .offset(shift.dx, shift.dy);
    projection.coords_from_container_point(point)
}
