//! A map SDK without a screen.
//!
//! Maps record every viewport call, markers and overlays track whether they
//! are attached, and clicks are simulated through `HeadlessSdk`. Geocoding is
//! delegated to whichever `Geocoder` the SDK was built with. `preview` uses it
//! to lay out a places list from the command line, and the integration tests
//! drive the marker controller through it.

use crate::domain::geo::{LatLng, LatLngBounds, Point, Rect};
use crate::domain::ports::{
    ClickHandler, EventTarget, Geocoder, MapHandle, MapId, MapSdk, MarkerHandle, MarkerId,
    MarkerOptions, OverlayHandle, OverlayId, OverlayOptions, PaintTask, Projection, RenderHost,
    SdkCapabilities,
};
use crate::sdk::loader::{SdkBootstrap, SdkError, SdkScript};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_LEVEL: u8 = 3;
const DEFAULT_CONTAINER_SIZE: (f64, f64) = (800.0, 600.0);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum MapCall {
    SetCenter { center: LatLng },
    SetLevel { level: u8 },
    SetBounds { bounds: LatLngBounds },
    PanTo { center: LatLng },
}

#[derive(Debug, Clone, Copy)]
struct Viewport {
    center: LatLng,
    level: u8,
}

pub struct HeadlessMap {
    id: MapId,
    container: String,
    size: (f64, f64),
    viewport: Mutex<Viewport>,
    calls: Mutex<Vec<MapCall>>,
}

impl HeadlessMap {
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn level(&self) -> u8 {
        self.viewport.lock().level
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.calls.lock().clone()
    }

    pub fn bounds_fit_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, MapCall::SetBounds { .. }))
            .count()
    }

    pub fn last_bounds(&self) -> Option<LatLngBounds> {
        self.calls.lock().iter().rev().find_map(|c| match c {
            MapCall::SetBounds { bounds } => Some(*bounds),
            _ => None,
        })
    }

    fn record(&self, call: MapCall) {
        self.calls.lock().push(call);
    }
}

impl MapHandle for HeadlessMap {
    fn id(&self) -> MapId {
        self.id
    }

    fn set_center(&self, center: LatLng) {
        self.viewport.lock().center = center;
        self.record(MapCall::SetCenter { center });
    }

    fn set_level(&self, level: u8) {
        self.viewport.lock().level = level;
        self.record(MapCall::SetLevel { level });
    }

    fn set_bounds(&self, bounds: &LatLngBounds) {
        if let Some(center) = bounds.center() {
            self.viewport.lock().center = center;
        }
        self.record(MapCall::SetBounds { bounds: *bounds });
    }

    fn pan_to(&self, center: LatLng) {
        self.viewport.lock().center = center;
        self.record(MapCall::PanTo { center });
    }

    fn center(&self) -> LatLng {
        self.viewport.lock().center
    }

    fn projection(&self) -> Option<Arc<dyn Projection>> {
        let viewport = *self.viewport.lock();
        Some(Arc::new(FlatProjection::new(viewport.center, viewport.level, self.size)))
    }
}

/// Equirectangular projection around the current center. Each level step
/// halves the pixels per degree, like the tile pyramid it stands in for.
#[derive(Debug, Clone, Copy)]
pub struct FlatProjection {
    center: LatLng,
    px_per_degree: f64,
    size: (f64, f64),
}

impl FlatProjection {
    pub fn new(center: LatLng, level: u8, size: (f64, f64)) -> Self {
        let px_per_degree = 2f64.powi(20 - i32::from(level.clamp(1, 14)));
        Self {
            center,
            px_per_degree,
            size,
        }
    }
}

impl Projection for FlatProjection {
    fn container_point_from_coords(&self, coords: LatLng) -> Point {
        Point::new(
            (coords.lng - self.center.lng) * self.px_per_degree + self.size.0 / 2.0,
            (self.center.lat - coords.lat) * self.px_per_degree + self.size.1 / 2.0,
        )
    }

    fn coords_from_container_point(&self, point: Point) -> LatLng {
        LatLng::new(
            self.center.lat - (point.y - self.size.1 / 2.0) / self.px_per_degree,
            self.center.lng + (point.x - self.size.0 / 2.0) / self.px_per_degree,
        )
    }
}

pub struct HeadlessMarker {
    id: MarkerId,
    map: MapId,
    options: MarkerOptions,
    attached: AtomicBool,
}

impl HeadlessMarker {
    pub fn title(&self) -> &str {
        &self.options.title
    }

    pub fn map_id(&self) -> MapId {
        self.map
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl MarkerHandle for HeadlessMarker {
    fn id(&self) -> MarkerId {
        self.id
    }

    fn position(&self) -> LatLng {
        self.options.position
    }

    fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

pub struct HeadlessOverlay {
    id: OverlayId,
    options: OverlayOptions,
    attached_to: Mutex<Option<MapId>>,
}

impl HeadlessOverlay {
    pub fn options(&self) -> &OverlayOptions {
        &self.options
    }

    pub fn is_attached(&self) -> bool {
        self.attached_to.lock().is_some()
    }
}

impl OverlayHandle for HeadlessOverlay {
    fn id(&self) -> OverlayId {
        self.id
    }

    fn attach(&self, map: &Arc<dyn MapHandle>) {
        *self.attached_to.lock() = Some(map.id());
    }

    fn detach(&self) {
        *self.attached_to.lock() = None;
    }
}

/// In-memory map SDK. Maps, markers and overlays are kept after detach as a
/// record for inspection; click listeners are dropped when removed.
pub struct HeadlessSdk {
    geocoder: Arc<dyn Geocoder>,
    capabilities: SdkCapabilities,
    container_size: (f64, f64),
    next_id: AtomicU64,
    maps: Mutex<Vec<Arc<HeadlessMap>>>,
    markers: Mutex<Vec<Arc<HeadlessMarker>>>,
    overlays: Mutex<Vec<Arc<HeadlessOverlay>>>,
    listeners: Mutex<Vec<(EventTarget, ClickHandler)>>,
    navigations: Mutex<Vec<String>>,
}

impl HeadlessSdk {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            geocoder,
            capabilities: SdkCapabilities { geocoding: true },
            container_size: DEFAULT_CONTAINER_SIZE,
            next_id: AtomicU64::new(1),
            maps: Mutex::new(Vec::new()),
            markers: Mutex::new(Vec::new()),
            overlays: Mutex::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    /// An SDK that came up without its geocoding library.
    pub fn without_geocoding(mut self) -> Self {
        self.capabilities.geocoding = false;
        self
    }

    pub fn with_container_size(mut self, width: f64, height: f64) -> Self {
        self.container_size = (width, height);
        self
    }

    /// Click handlers currently registered across every target.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn latest_map(&self) -> Option<Arc<HeadlessMap>> {
        self.maps.lock().last().cloned()
    }

    pub fn map_count(&self) -> usize {
        self.maps.lock().len()
    }

    pub fn attached_markers(&self) -> Vec<Arc<HeadlessMarker>> {
        self.markers
            .lock()
            .iter()
            .filter(|m| m.is_attached())
            .cloned()
            .collect()
    }

    pub fn markers_created(&self) -> usize {
        self.markers.lock().len()
    }

    pub fn open_overlays(&self) -> Vec<Arc<HeadlessOverlay>> {
        self.overlays
            .lock()
            .iter()
            .filter(|o| o.is_attached())
            .cloned()
            .collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }

    /// Clicks an attached marker. Returns false when there was nothing to click.
    pub fn click_marker(&self, id: MarkerId) -> bool {
        let attached = self
            .markers
            .lock()
            .iter()
            .any(|m| m.id == id && m.is_attached());
        if !attached {
            return false;
        }
        self.fire(EventTarget::Marker(id))
    }

    /// Clicks the background of the most recently created map.
    pub fn click_map(&self) -> bool {
        match self.latest_map() {
            Some(map) => self.fire(EventTarget::Map(map.id)),
            None => false,
        }
    }

    /// Activates the detail link of an open overlay and returns its target.
    /// The click reaches the map background unless the link stops propagation.
    pub fn click_overlay_link(&self, id: OverlayId) -> Option<String> {
        let overlay = self
            .overlays
            .lock()
            .iter()
            .find(|o| o.id == id && o.is_attached())
            .cloned()?;

        let link = &overlay.options.content.detail_link;
        self.navigations.lock().push(link.href.clone());
        if !link.stop_propagation {
            self.click_map();
        }
        Some(link.href.clone())
    }

    fn fire(&self, target: EventTarget) -> bool {
        // Handlers run outside the registry lock; they call back into the SDK.
        let handlers: Vec<ClickHandler> = self
            .listeners
            .lock()
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, h)| Arc::clone(h))
            .collect();

        for handler in &handlers {
            handler();
        }
        !handlers.is_empty()
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl MapSdk for HeadlessSdk {
    fn capabilities(&self) -> SdkCapabilities {
        self.capabilities
    }

    fn create_map(&self, container: &str, center: LatLng) -> Arc<dyn MapHandle> {
        let map = Arc::new(HeadlessMap {
            id: self.next_id(),
            container: container.to_string(),
            size: self.container_size,
            viewport: Mutex::new(Viewport {
                center,
                level: DEFAULT_LEVEL,
            }),
            calls: Mutex::new(Vec::new()),
        });
        self.maps.lock().push(Arc::clone(&map));
        map
    }

    fn create_marker(&self, map: &Arc<dyn MapHandle>, options: MarkerOptions) -> Arc<dyn MarkerHandle> {
        let marker = Arc::new(HeadlessMarker {
            id: self.next_id(),
            map: map.id(),
            options,
            attached: AtomicBool::new(true),
        });
        self.markers.lock().push(Arc::clone(&marker));
        marker
    }

    fn create_overlay(&self, options: OverlayOptions) -> Arc<dyn OverlayHandle> {
        let overlay = Arc::new(HeadlessOverlay {
            id: self.next_id(),
            options,
            attached_to: Mutex::new(None),
        });
        self.overlays.lock().push(Arc::clone(&overlay));
        overlay
    }

    fn geocoder(&self) -> Arc<dyn Geocoder> {
        Arc::clone(&self.geocoder)
    }

    fn add_listener(&self, target: EventTarget, handler: ClickHandler) {
        self.listeners.lock().push((target, handler));
    }

    fn remove_listeners(&self, target: EventTarget) {
        self.listeners.lock().retain(|(t, _)| *t != target);
    }
}

/// Hands out a prepared `HeadlessSdk` as the result of a script load.
pub struct HeadlessBootstrap {
    sdk: Arc<HeadlessSdk>,
    calls: AtomicUsize,
}

impl HeadlessBootstrap {
    pub fn new(sdk: Arc<HeadlessSdk>) -> Self {
        Self {
            sdk,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkBootstrap for HeadlessBootstrap {
    async fn bootstrap(&self, script: &SdkScript) -> Result<Arc<dyn MapSdk>, SdkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Headless SDK standing in for {}", script.url());
        let sdk: Arc<dyn MapSdk> = self.sdk.clone();
        Ok(sdk)
    }
}

/// Rendering surface with caller-supplied layout.
///
/// Paint tasks queue until `flush_frame`, unless the host was built with
/// `immediate()`, in which case they run as soon as they are scheduled.
pub struct HeadlessHost {
    immediate: bool,
    container: Mutex<Option<Rect>>,
    overlay_rects: Mutex<HashMap<OverlayId, Rect>>,
    default_overlay_rect: Mutex<Option<Rect>>,
    pending: Mutex<Vec<PaintTask>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            immediate: false,
            container: Mutex::new(None),
            overlay_rects: Mutex::new(HashMap::new()),
            default_overlay_rect: Mutex::new(None),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn immediate() -> Self {
        Self {
            immediate: true,
            ..Self::new()
        }
    }

    pub fn set_container_rect(&self, rect: Option<Rect>) {
        *self.container.lock() = rect;
    }

    pub fn set_overlay_rect(&self, overlay: OverlayId, rect: Rect) {
        self.overlay_rects.lock().insert(overlay, rect);
    }

    /// Layout reported for overlays without an explicit rectangle.
    pub fn set_default_overlay_rect(&self, rect: Option<Rect>) {
        *self.default_overlay_rect.lock() = rect;
    }

    pub fn pending_frames(&self) -> usize {
        self.pending.lock().len()
    }

    /// Runs every task queued before this call. Returns how many ran.
    pub fn flush_frame(&self) -> usize {
        let tasks: Vec<PaintTask> = std::mem::take(&mut *self.pending.lock());
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderHost for HeadlessHost {
    fn after_next_paint(&self, task: PaintTask) {
        if self.immediate {
            task();
        } else {
            self.pending.lock().push(task);
        }
    }

    fn container_rect(&self) -> Option<Rect> {
        *self.container.lock()
    }

    fn overlay_rect(&self, overlay: OverlayId) -> Option<Rect> {
        self.overlay_rects
            .lock()
            .get(&overlay)
            .copied()
            .or(*self.default_overlay_rect.lock())
    }
}
