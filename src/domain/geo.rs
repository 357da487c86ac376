use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate from the string pair a geocoder returns
    /// (`y` is latitude, `x` is longitude). Rejects anything non-finite.
    pub fn from_geocoder_xy(x: &str, y: &str) -> Option<Self> {
        let lat = y.trim().parse::<f64>().ok()?;
        let lng = x.trim().parse::<f64>().ok()?;
        if lat.is_finite() && lng.is_finite() {
            Some(Self { lat, lng })
        } else {
            None
        }
    }
}

/// Running south-west / north-east box over every extended position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLngBounds {
    sw: Option<LatLng>,
    ne: Option<LatLng>,
}

impl LatLngBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, position: LatLng) {
        match (self.sw.as_mut(), self.ne.as_mut()) {
            (Some(sw), Some(ne)) => {
                sw.lat = sw.lat.min(position.lat);
                sw.lng = sw.lng.min(position.lng);
                ne.lat = ne.lat.max(position.lat);
                ne.lng = ne.lng.max(position.lng);
            }
            _ => {
                self.sw = Some(position);
                self.ne = Some(position);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sw.is_none()
    }

    pub fn contains(&self, position: LatLng) -> bool {
        match (self.sw, self.ne) {
            (Some(sw), Some(ne)) => {
                position.lat >= sw.lat
                    && position.lat <= ne.lat
                    && position.lng >= sw.lng
                    && position.lng <= ne.lng
            }
            _ => false,
        }
    }

    pub fn center(&self) -> Option<LatLng> {
        let (sw, ne) = (self.sw?, self.ne?);
        Some(LatLng::new((sw.lat + ne.lat) / 2.0, (sw.lng + ne.lng) / 2.0))
    }
}

/// Pixel position relative to the map container's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// On-screen rectangle in pixels, as reported by the hosting surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoder_xy_parsing() {
        let pos = LatLng::from_geocoder_xy("126.9333", "35.14224").unwrap();
        assert_eq!(pos, LatLng::new(35.14224, 126.9333));

        assert!(LatLng::from_geocoder_xy("abc", "35.1").is_none());
        assert!(LatLng::from_geocoder_xy("126.9", "NaN").is_none());
        assert!(LatLng::from_geocoder_xy("inf", "35.1").is_none());
        assert!(LatLng::from_geocoder_xy("", "").is_none());
    }

    #[test]
    fn test_bounds_extend_encloses_all_points() {
        let mut bounds = LatLngBounds::new();
        assert!(bounds.is_empty());

        let points = [
            LatLng::new(35.15, 126.92),
            LatLng::new(35.13, 126.95),
            LatLng::new(35.14, 126.93),
        ];
        for p in points {
            bounds.extend(p);
        }

        let center = bounds.center().unwrap();
        assert!((center.lat - 35.14).abs() < 1e-9);
        assert!((center.lng - 126.935).abs() < 1e-9);
        assert!(points.iter().all(|p| bounds.contains(*p)));
        assert!(!bounds.contains(LatLng::new(36.0, 127.0)));
    }
}
