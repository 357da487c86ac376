#![allow(dead_code)]

use async_trait::async_trait;
use placemap::core::ControllerConfig;
use placemap::domain::model::{Place, PlaceList};
use placemap::domain::ports::{GeocodeResponse, GeocodeResult, Geocoder};
use placemap::sdk::headless::{HeadlessBootstrap, HeadlessHost, HeadlessSdk};
use placemap::{MarkerController, SdkConfig, SdkLoader};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Holds lookups back until opened.
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn closed() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

/// Geocoder with canned answers per address. Unknown addresses get `ZERO_RESULT`.
#[derive(Default)]
pub struct ScriptedGeocoder {
    answers: HashMap<String, GeocodeResponse>,
    gates: HashMap<String, Gate>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(mut self, address: &str, lat: f64, lng: f64) -> Self {
        self.answers.insert(
            address.to_string(),
            GeocodeResponse::ok(vec![GeocodeResult {
                address_name: address.to_string(),
                x: lng.to_string(),
                y: lat.to_string(),
            }]),
        );
        self
    }

    pub fn respond(mut self, address: &str, response: GeocodeResponse) -> Self {
        self.answers.insert(address.to_string(), response);
        self
    }

    pub fn gated(mut self, address: &str, gate: &Gate) -> Self {
        self.gates.insert(address.to_string(), gate.clone());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn address_search(&self, query: &str) -> GeocodeResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = self.gates.get(query) {
            gate.wait().await;
        }
        self.answers
            .get(query)
            .cloned()
            .unwrap_or_else(GeocodeResponse::zero_result)
    }
}

pub struct Harness {
    pub sdk: Arc<HeadlessSdk>,
    pub bootstrap: Arc<HeadlessBootstrap>,
    pub loader: Arc<SdkLoader>,
    pub host: Arc<HeadlessHost>,
    pub controller: MarkerController,
}

impl Harness {
    pub fn new(geocoder: ScriptedGeocoder) -> Self {
        Self::with_sdk(HeadlessSdk::new(Arc::new(geocoder)), Some("test-js-key"))
    }

    pub fn with_sdk(sdk: HeadlessSdk, app_key: Option<&str>) -> Self {
        let sdk = Arc::new(sdk);
        let bootstrap = Arc::new(HeadlessBootstrap::new(Arc::clone(&sdk)));
        let loader = Arc::new(SdkLoader::new(
            SdkConfig::new(app_key.map(str::to_string)),
            bootstrap.clone(),
        ));
        let host = Arc::new(HeadlessHost::new());
        let controller =
            MarkerController::new(Arc::clone(&loader), host.clone(), ControllerConfig::default());

        Self {
            sdk,
            bootstrap,
            loader,
            host,
            controller,
        }
    }
}

pub fn place(id: i64, address: &str) -> Place {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("place {id}"),
        "address": address,
        "hours": "10:00 - 18:00",
    }))
    .unwrap()
}

pub fn places(list: Vec<Place>) -> PlaceList {
    list.into()
}
