use crate::core::controller::{ControllerConfig, CycleOutcome, MapViewError, MarkerController, ReadyKind};
use crate::domain::geo::LatLng;
use crate::domain::model::{Category, PlaceList};
use crate::domain::ports::{Geocoder, MapHandle, PlaceSource};
use crate::presentation::filter::{
    filter_by_category, filter_by_neighborhood, EMPTY_SELECTION_MESSAGE,
};
use crate::sdk::headless::{HeadlessBootstrap, HeadlessHost, HeadlessSdk, MapCall};
use crate::sdk::loader::{SdkConfig, SdkLoader};
use crate::utils::error::{PlaceMapError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    pub category: Category,
    pub neighborhood: Option<String>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            category: Category::All,
            neighborhood: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewMarker {
    pub place_id: i64,
    pub name: String,
    pub position: LatLng,
}

/// Map layout produced for a places list, as a browser would end up showing it.
#[derive(Debug, Clone, Serialize)]
pub struct PreviewReport {
    pub generated_at: DateTime<Utc>,
    pub input_places: usize,
    pub filtered_places: usize,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub markers: Vec<PreviewMarker>,
    pub center: Option<LatLng>,
    pub level: Option<u8>,
    pub map_calls: Vec<MapCall>,
}

/// Loads, filters and lays out the places through the marker controller
/// backed by the headless SDK.
pub async fn run_preview<S: PlaceSource>(
    source: &S,
    sdk_config: SdkConfig,
    controller_config: ControllerConfig,
    geocoder: Arc<dyn Geocoder>,
    options: &PreviewOptions,
) -> Result<PreviewReport> {
    let response = source.load_places().await?;
    let input_places = response.places.len();

    let mut places = filter_by_category(&response.places, options.category);
    if let Some(neighborhood) = &options.neighborhood {
        places = filter_by_neighborhood(&places, neighborhood);
    }
    tracing::info!(
        "Previewing {} of {} place(s) (category {}, neighborhood {})",
        places.len(),
        input_places,
        options.category,
        options.neighborhood.as_deref().unwrap_or("any")
    );

    if places.is_empty() {
        // No map is mounted for an empty selection.
        return Ok(PreviewReport {
            generated_at: Utc::now(),
            input_places,
            filtered_places: 0,
            outcome: "empty",
            message: Some(EMPTY_SELECTION_MESSAGE),
            markers: Vec::new(),
            center: None,
            level: None,
            map_calls: Vec::new(),
        });
    }

    let names: HashMap<i64, String> = places.iter().map(|p| (p.id, p.name.clone())).collect();
    let places: PlaceList = places.into();
    let filtered_places = places.len();

    let sdk = Arc::new(HeadlessSdk::new(geocoder));
    let loader = Arc::new(SdkLoader::new(
        sdk_config,
        Arc::new(HeadlessBootstrap::new(Arc::clone(&sdk))),
    ));
    let controller = MarkerController::new(loader, Arc::new(HeadlessHost::immediate()), controller_config);

    let outcome = controller.set_places(places).await;
    if let CycleOutcome::Failed(MapViewError::SdkUnavailable(e)) = &outcome {
        if e.is_configuration() {
            return Err(PlaceMapError::ConfigError {
                message: e.to_string(),
            });
        }
    }

    let markers = controller
        .markers()
        .into_iter()
        .map(|m| PreviewMarker {
            place_id: m.place_id,
            name: names.get(&m.place_id).cloned().unwrap_or_default(),
            position: m.position,
        })
        .collect();

    let map = sdk.latest_map();
    let report = PreviewReport {
        generated_at: Utc::now(),
        input_places,
        filtered_places,
        outcome: describe(&outcome),
        message: controller.user_message(),
        markers,
        center: map.as_ref().map(|m| m.center()),
        level: map.as_ref().map(|m| m.level()),
        map_calls: map.map(|m| m.calls()).unwrap_or_default(),
    };

    controller.unmount();
    Ok(report)
}

fn describe(outcome: &CycleOutcome) -> &'static str {
    match outcome {
        CycleOutcome::Ready {
            kind: ReadyKind::BoundsFit,
            ..
        } => "bounds_fit",
        CycleOutcome::Ready {
            kind: ReadyKind::SingleMarker,
            ..
        } => "single_marker",
        CycleOutcome::Ready {
            kind: ReadyKind::NoMarkers,
            ..
        } => "no_markers",
        CycleOutcome::Failed(_) => "failed",
        CycleOutcome::Superseded | CycleOutcome::Unchanged => "superseded",
    }
}
