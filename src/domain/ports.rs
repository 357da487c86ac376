use crate::domain::geo::{LatLng, LatLngBounds, Point, Rect};
use crate::domain::model::PlacesResponse;
use crate::presentation::overlay::OverlayContent;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only source of the places document.
pub trait PlaceSource: Send + Sync {
    fn load_places(&self) -> impl std::future::Future<Output = Result<PlacesResponse>> + Send;
}

pub type MapId = u64;
pub type MarkerId = u64;
pub type OverlayId = u64;

/// Callback fired by the SDK when its target is clicked.
pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// Work queued until the hosting surface has laid out the next frame.
pub type PaintTask = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTarget {
    Map(MapId),
    Marker(MarkerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SdkCapabilities {
    pub geocoding: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    pub position: LatLng,
    pub content: OverlayContent,
    /// Fraction of the overlay height above the anchor; values over 1.0
    /// lift the bottom edge clear of the marker tip.
    pub y_anchor: f64,
    pub clickable: bool,
}

/// Handle to a loaded map SDK. Everything the controller touches on the
/// map goes through this trait and the handles it returns.
///
/// Calls on the SDK and its handles must not run registered click handlers
/// synchronously; the controller makes them while holding its state lock.
/// Handlers fire only from user input.
pub trait MapSdk: Send + Sync {
    fn capabilities(&self) -> SdkCapabilities;

    fn create_map(&self, container: &str, center: LatLng) -> Arc<dyn MapHandle>;

    fn create_marker(&self, map: &Arc<dyn MapHandle>, options: MarkerOptions) -> Arc<dyn MarkerHandle>;

    /// Overlays are created detached; `OverlayHandle::attach` shows them.
    fn create_overlay(&self, options: OverlayOptions) -> Arc<dyn OverlayHandle>;

    fn geocoder(&self) -> Arc<dyn Geocoder>;

    fn add_listener(&self, target: EventTarget, handler: ClickHandler);

    /// Drops every handler registered for `target`.
    fn remove_listeners(&self, target: EventTarget);
}

pub trait MapHandle: Send + Sync {
    fn id(&self) -> MapId;
    fn set_center(&self, center: LatLng);
    fn set_level(&self, level: u8);
    fn set_bounds(&self, bounds: &LatLngBounds);
    /// Smooth pan; zoom level is left alone.
    fn pan_to(&self, center: LatLng);
    fn center(&self) -> LatLng;
    fn projection(&self) -> Option<Arc<dyn Projection>>;
}

pub trait MarkerHandle: Send + Sync {
    fn id(&self) -> MarkerId;
    fn position(&self) -> LatLng;
    fn detach(&self);
}

pub trait OverlayHandle: Send + Sync {
    fn id(&self) -> OverlayId;
    fn attach(&self, map: &Arc<dyn MapHandle>);
    fn detach(&self);
}

pub trait Projection: Send + Sync {
    fn container_point_from_coords(&self, coords: LatLng) -> Point;
    fn coords_from_container_point(&self, point: Point) -> LatLng;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeStatus {
    Ok,
    ZeroResult,
    Error,
}

/// One geocoder hit. Coordinates arrive as strings: `x` is longitude,
/// `y` is latitude.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub address_name: String,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: GeocodeStatus,
    pub results: Vec<GeocodeResult>,
}

impl GeocodeResponse {
    pub fn ok(results: Vec<GeocodeResult>) -> Self {
        Self {
            status: GeocodeStatus::Ok,
            results,
        }
    }

    pub fn zero_result() -> Self {
        Self {
            status: GeocodeStatus::ZeroResult,
            results: Vec::new(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: GeocodeStatus::Error,
            results: Vec::new(),
        }
    }

    /// Position of the first row, only for an `Ok` status with finite
    /// coordinates.
    pub fn first_position(&self) -> Option<LatLng> {
        if self.status != GeocodeStatus::Ok {
            return None;
        }
        let first = self.results.first()?;
        LatLng::from_geocoder_xy(&first.x, &first.y)
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn address_search(&self, query: &str) -> GeocodeResponse;
}

/// The surface the map is rendered into.
pub trait RenderHost: Send + Sync {
    fn after_next_paint(&self, task: PaintTask);
    fn container_rect(&self) -> Option<Rect>;
    fn overlay_rect(&self, overlay: OverlayId) -> Option<Rect>;
}
