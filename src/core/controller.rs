use crate::core::viewport::{self, OVERLAY_PADDING_PX};
use crate::domain::geo::{LatLng, LatLngBounds};
use crate::domain::model::{Place, PlaceList};
use crate::domain::ports::{
    ClickHandler, EventTarget, MapHandle, MapSdk, MarkerHandle, MarkerId, MarkerOptions,
    OverlayHandle, OverlayId, OverlayOptions, RenderHost,
};
use crate::presentation::overlay::OverlayContent;
use crate::sdk::loader::{SdkError, SdkLoader};
use futures_util::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use thiserror::Error;

/// Near Chosun University, Gwangju.
pub const DEFAULT_CENTER: LatLng = LatLng::new(35.14224, 126.9333);

/// Zoom level used when exactly one place resolves.
pub const CLOSE_ZOOM_LEVEL: u8 = 2;

/// Lifts the overlay's bottom edge just above the marker tip.
pub const OVERLAY_Y_ANCHOR: f64 = 1.1;

pub const SDK_ERROR_MESSAGE: &str =
    "카카오 지도를 불러오지 못했습니다. 잠시 후 다시 시도해 주세요.";

pub const GEOCODE_ERROR_MESSAGE: &str =
    "등록된 주소의 위치를 찾지 못했습니다. 주소 정보를 다시 확인해 주세요.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapViewError {
    #[error("map SDK unavailable: {0}")]
    SdkUnavailable(#[from] SdkError),

    #[error("none of the place addresses could be resolved")]
    NoLocationsFound,
}

impl MapViewError {
    pub fn user_message(&self) -> &'static str {
        match self {
            MapViewError::SdkUnavailable(_) => SDK_ERROR_MESSAGE,
            MapViewError::NoLocationsFound => GEOCODE_ERROR_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyKind {
    /// Nothing resolved; the map sits on the default center.
    NoMarkers,
    /// One marker, centered at the close zoom level.
    SingleMarker,
    /// Two or more markers, viewport fitted to their bounds.
    BoundsFit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    LoadingSdk,
    GeocodingAll,
    Ready(ReadyKind),
    Failed(MapViewError),
}

/// What a call to `set_places` ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Same list as the running cycle; nothing restarted.
    Unchanged,
    /// A newer cycle or an unmount took over before this one finished.
    Superseded,
    Ready { kind: ReadyKind, markers: usize },
    Failed(MapViewError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSnapshot {
    pub marker_id: MarkerId,
    pub place_id: i64,
    pub position: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySnapshot {
    pub overlay_id: OverlayId,
    pub marker_id: MarkerId,
    pub place_id: i64,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Identifier of the container element the map is bound to.
    pub container: String,
    pub default_center: LatLng,
    pub close_level: u8,
    pub overlay_padding: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            default_center: DEFAULT_CENTER,
            close_level: CLOSE_ZOOM_LEVEL,
            overlay_padding: OVERLAY_PADDING_PX,
        }
    }
}

struct PlacedMarker {
    place_id: i64,
    handle: Arc<dyn MarkerHandle>,
}

struct ActiveOverlay {
    handle: Arc<dyn OverlayHandle>,
    marker_id: MarkerId,
    place_id: i64,
}

struct CycleState {
    generation: u64,
    places: Option<PlaceList>,
    phase: CyclePhase,
    notice: Option<MapViewError>,
    sdk: Option<Arc<dyn MapSdk>>,
    map: Option<Arc<dyn MapHandle>>,
    markers: Vec<PlacedMarker>,
    overlay: Option<ActiveOverlay>,
}

impl CycleState {
    fn new() -> Self {
        Self {
            generation: 0,
            places: None,
            phase: CyclePhase::Idle,
            notice: None,
            sdk: None,
            map: None,
            markers: Vec::new(),
            overlay: None,
        }
    }

    fn close_overlay(&mut self) -> bool {
        match self.overlay.take() {
            Some(overlay) => {
                overlay.handle.detach();
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        for marker in self.markers.drain(..) {
            if let Some(sdk) = &self.sdk {
                sdk.remove_listeners(EventTarget::Marker(marker.handle.id()));
            }
            marker.handle.detach();
        }
        self.close_overlay();
        if let (Some(sdk), Some(map)) = (&self.sdk, &self.map) {
            sdk.remove_listeners(EventTarget::Map(map.id()));
        }
        self.map = None;
        self.sdk = None;
    }
}

struct Inner {
    loader: Arc<SdkLoader>,
    host: Arc<dyn RenderHost>,
    config: ControllerConfig,
    state: Mutex<CycleState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.get_mut().teardown();
    }
}

/// Owns the markers and the single detail overlay of one map view.
///
/// Each `set_places` with a new list starts a cycle: load the SDK, create
/// the map, geocode every place concurrently, place markers, fit the
/// viewport. Every cycle carries a generation number; continuations of a
/// superseded cycle see a newer generation and leave the state alone.
///
/// Clones share the same map view.
#[derive(Clone)]
pub struct MarkerController {
    inner: Arc<Inner>,
}

impl MarkerController {
    pub fn new(loader: Arc<SdkLoader>, host: Arc<dyn RenderHost>, config: ControllerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                host,
                config,
                state: Mutex::new(CycleState::new()),
            }),
        }
    }

    /// Feeds a places list to the view. The cycle restarts only when `places`
    /// is a different allocation than the current one; an equal list in a
    /// new `Arc` counts as a change.
    pub async fn set_places(&self, places: PlaceList) -> CycleOutcome {
        let Some(generation) = self.inner.begin_cycle(&places) else {
            return CycleOutcome::Unchanged;
        };
        self.run_cycle(generation, places).await
    }

    /// Tears the view down. Pending work from the running cycle is ignored
    /// when it completes.
    pub fn unmount(&self) {
        let mut state = self.inner.state.lock();
        state.generation += 1;
        state.teardown();
        state.places = None;
        state.phase = CyclePhase::Idle;
        state.notice = None;
        tracing::debug!("Map view unmounted (generation {})", state.generation);
    }

    pub fn phase(&self) -> CyclePhase {
        self.inner.state.lock().phase.clone()
    }

    /// Message the view should show instead of (or above) the map.
    pub fn user_message(&self) -> Option<&'static str> {
        self.inner
            .state
            .lock()
            .notice
            .as_ref()
            .map(MapViewError::user_message)
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.lock().generation
    }

    pub fn markers(&self) -> Vec<MarkerSnapshot> {
        self.inner
            .state
            .lock()
            .markers
            .iter()
            .map(|m| MarkerSnapshot {
                marker_id: m.handle.id(),
                place_id: m.place_id,
                position: m.handle.position(),
            })
            .collect()
    }

    pub fn open_overlay(&self) -> Option<OverlaySnapshot> {
        self.inner
            .state
            .lock()
            .overlay
            .as_ref()
            .map(|o| OverlaySnapshot {
                overlay_id: o.handle.id(),
                marker_id: o.marker_id,
                place_id: o.place_id,
            })
    }

    async fn run_cycle(&self, generation: u64, places: PlaceList) -> CycleOutcome {
        let sdk = match self.inner.loader.load().await {
            Ok(sdk) => sdk,
            Err(e) => return self.inner.fail(generation, e),
        };

        let Some(map) = self.inner.create_map(generation, &sdk) else {
            return CycleOutcome::Superseded;
        };

        let geocoder = sdk.geocoder();
        let mut lookups: FuturesUnordered<_> = places
            .iter()
            .map(|place| {
                let geocoder = Arc::clone(&geocoder);
                async move {
                    let response = geocoder.address_search(&place.address).await;
                    (place, response)
                }
            })
            .collect();

        let mut bounds = LatLngBounds::new();
        while let Some((place, response)) = lookups.next().await {
            let Some(position) = response.first_position() else {
                tracing::debug!(
                    "Dropping place {} ({}): geocoder returned {:?} with {} row(s)",
                    place.id,
                    place.address,
                    response.status,
                    response.results.len()
                );
                continue;
            };

            if !self.inner.place_marker(generation, &sdk, &map, place, position) {
                return CycleOutcome::Superseded;
            }
            bounds.extend(position);
        }

        self.inner.finish_cycle(generation, &sdk, &map, &bounds)
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.state.lock().generation == generation
    }

    fn begin_cycle(&self, places: &PlaceList) -> Option<u64> {
        let mut state = self.state.lock();
        if let Some(current) = &state.places {
            if Arc::ptr_eq(current, places) {
                return None;
            }
        }

        state.teardown();
        state.generation += 1;
        state.places = Some(Arc::clone(places));
        state.phase = CyclePhase::LoadingSdk;
        state.notice = None;
        tracing::info!(
            "Starting map cycle {} for {} place(s)",
            state.generation,
            places.len()
        );
        Some(state.generation)
    }

    fn fail(&self, generation: u64, error: SdkError) -> CycleOutcome {
        let mut state = self.state.lock();
        if state.generation != generation {
            return CycleOutcome::Superseded;
        }
        tracing::error!("Map cycle {} failed: {}", generation, error);
        let error = MapViewError::SdkUnavailable(error);
        state.phase = CyclePhase::Failed(error.clone());
        state.notice = Some(error.clone());
        CycleOutcome::Failed(error)
    }

    fn create_map(&self, generation: u64, sdk: &Arc<dyn MapSdk>) -> Option<Arc<dyn MapHandle>> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return None;
        }
        let map = sdk.create_map(&self.config.container, self.config.default_center);
        state.sdk = Some(Arc::clone(sdk));
        state.map = Some(Arc::clone(&map));
        state.phase = CyclePhase::GeocodingAll;
        Some(map)
    }

    /// Returns false when the cycle has been superseded.
    fn place_marker(
        self: &Arc<Self>,
        generation: u64,
        sdk: &Arc<dyn MapSdk>,
        map: &Arc<dyn MapHandle>,
        place: &Place,
        position: LatLng,
    ) -> bool {
        let mut state = self.state.lock();
        if state.generation != generation {
            return false;
        }

        let marker = sdk.create_marker(
            map,
            MarkerOptions {
                position,
                title: place.name.clone(),
            },
        );
        sdk.add_listener(
            EventTarget::Marker(marker.id()),
            self.marker_click_handler(generation, place.clone(), Arc::clone(&marker)),
        );
        state.markers.push(PlacedMarker {
            place_id: place.id,
            handle: marker,
        });
        true
    }

    fn finish_cycle(
        self: &Arc<Self>,
        generation: u64,
        sdk: &Arc<dyn MapSdk>,
        map: &Arc<dyn MapHandle>,
        bounds: &LatLngBounds,
    ) -> CycleOutcome {
        let mut state = self.state.lock();
        if state.generation != generation {
            return CycleOutcome::Superseded;
        }

        sdk.add_listener(EventTarget::Map(map.id()), self.background_click_handler(generation));

        let markers = state.markers.len();
        let kind = match markers {
            0 => {
                map.set_center(self.config.default_center);
                state.notice = Some(MapViewError::NoLocationsFound);
                tracing::warn!("Map cycle {}: no place could be located", generation);
                ReadyKind::NoMarkers
            }
            1 => {
                // A single point has no meaningful bounds to fit.
                map.set_center(state.markers[0].handle.position());
                map.set_level(self.config.close_level);
                ReadyKind::SingleMarker
            }
            _ => {
                map.set_bounds(bounds);
                ReadyKind::BoundsFit
            }
        };

        state.phase = CyclePhase::Ready(kind);
        tracing::info!(
            "Map cycle {} ready: {} marker(s), {:?}",
            generation,
            markers,
            kind
        );
        CycleOutcome::Ready { kind, markers }
    }

    fn marker_click_handler(
        self: &Arc<Self>,
        generation: u64,
        place: Place,
        marker: Arc<dyn MarkerHandle>,
    ) -> ClickHandler {
        let inner = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.show_overlay(generation, &place, &marker);
            }
        })
    }

    fn background_click_handler(self: &Arc<Self>, generation: u64) -> ClickHandler {
        let inner: Weak<Inner> = Arc::downgrade(self);
        Arc::new(move || {
            if let Some(inner) = inner.upgrade() {
                let mut state = inner.state.lock();
                if state.generation == generation && state.close_overlay() {
                    tracing::debug!("Overlay closed by map click");
                }
            }
        })
    }

    fn show_overlay(self: &Arc<Self>, generation: u64, place: &Place, marker: &Arc<dyn MarkerHandle>) {
        let (overlay_id, map) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            let (Some(sdk), Some(map)) = (state.sdk.clone(), state.map.clone()) else {
                return;
            };

            state.close_overlay();

            let overlay = sdk.create_overlay(OverlayOptions {
                position: marker.position(),
                content: OverlayContent::for_place(place),
                y_anchor: OVERLAY_Y_ANCHOR,
                clickable: true,
            });
            overlay.attach(&map);
            let overlay_id = overlay.id();
            state.overlay = Some(ActiveOverlay {
                handle: overlay,
                marker_id: marker.id(),
                place_id: place.id,
            });
            (overlay_id, map)
        };

        tracing::debug!("Opened overlay {} for place {}", overlay_id, place.id);

        // The host may run the task synchronously, so the state lock must be released here.
        let inner = Arc::downgrade(self);
        self.host.after_next_paint(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.keep_overlay_visible(generation, overlay_id, &map);
            }
        }));
    }

    fn keep_overlay_visible(&self, generation: u64, overlay_id: OverlayId, map: &Arc<dyn MapHandle>) {
        let still_open = {
            let state = self.state.lock();
            state.generation == generation
                && state.overlay.as_ref().map(|o| o.handle.id()) == Some(overlay_id)
        };
        if !still_open {
            return;
        }

        let (Some(container), Some(overlay)) =
            (self.host.container_rect(), self.host.overlay_rect(overlay_id))
        else {
            return;
        };

        let shift = viewport::overflow_shift(container, overlay, self.config.overlay_padding);
        if shift.is_zero() {
            return;
        }

        let Some(projection) = map.projection() else {
            return;
        };

        let next = viewport::shifted_center(projection.as_ref(), map.center(), shift);
        tracing::debug!(
            "Panning by ({:.1}, {:.1}) px to keep overlay {} visible",
            shift.dx,
            shift.dy,
            overlay_id
        );
        if self.is_current(generation) {
            map.pan_to(next);
        }
    }
}
