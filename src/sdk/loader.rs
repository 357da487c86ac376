use crate::domain::ports::MapSdk;
use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub const DEFAULT_SDK_URL: &str = "https://dapi.kakao.com/v2/maps/sdk.js";

/// Geocoding lives in this optional SDK library; the controller cannot run without it.
pub const SERVICES_LIBRARY: &str = "services";

/// Failures while bringing up the map SDK. Clonable so every caller
/// waiting on the same load receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SdkError {
    #[error("Kakao Maps JavaScript key (KAKAO_JAVASCRIPT_KEY) is missing")]
    MissingAppKey,

    #[error("invalid SDK script URL: {0}")]
    InvalidScriptUrl(String),

    #[error("failed to load map SDK: {0}")]
    ScriptLoad(String),

    #[error("map SDK loaded without required {0} library")]
    MissingCapability(&'static str),
}

impl SdkError {
    /// Configuration problems will not fix themselves on retry.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SdkError::MissingAppKey | SdkError::InvalidScriptUrl(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    pub script_base: String,
    pub app_key: Option<String>,
}

impl SdkConfig {
    pub fn new(app_key: Option<String>) -> Self {
        Self {
            script_base: DEFAULT_SDK_URL.to_string(),
            app_key,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("KAKAO_JAVASCRIPT_KEY").ok())
    }
}

/// Resolved script resource for the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkScript {
    url: Url,
}

impl SdkScript {
    pub fn from_config(config: &SdkConfig) -> Result<Self, SdkError> {
        let app_key = config
            .app_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SdkError::MissingAppKey)?;

        let mut url = Url::parse(&config.script_base)
            .map_err(|e| SdkError::InvalidScriptUrl(format!("{}: {}", config.script_base, e)))?;
        url.query_pairs_mut()
            .append_pair("appkey", app_key)
            .append_pair("autoload", "false")
            .append_pair("libraries", SERVICES_LIBRARY);

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn requests_library(&self, library: &str) -> bool {
        self.url
            .query_pairs()
            .any(|(key, value)| key == "libraries" && value.split(',').any(|l| l == library))
    }
}

/// Performs the actual script load and SDK initialization.
#[async_trait]
pub trait SdkBootstrap: Send + Sync {
    async fn bootstrap(&self, script: &SdkScript) -> Result<Arc<dyn MapSdk>, SdkError>;
}

type SharedLoad = Shared<BoxFuture<'static, Result<Arc<dyn MapSdk>, SdkError>>>;

enum LoaderState {
    Uninitialized,
    Loading(SharedLoad),
    Ready(Arc<dyn MapSdk>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderStatus {
    Uninitialized,
    Loading,
    Ready,
}

/// Process-wide SDK loader. Share one instance (behind an `Arc`) between
/// every map view.
///
/// The first `load` starts the bootstrap; callers arriving while it is in
/// flight await the same future. Success is cached for the life of the
/// loader. Failure resets the loader so a later `load` retries.
pub struct SdkLoader {
    config: SdkConfig,
    bootstrap: Arc<dyn SdkBootstrap>,
    state: Mutex<LoaderState>,
}

impl SdkLoader {
    pub fn new(config: SdkConfig, bootstrap: Arc<dyn SdkBootstrap>) -> Self {
        Self {
            config,
            bootstrap,
            state: Mutex::new(LoaderState::Uninitialized),
        }
    }

    pub fn status(&self) -> LoaderStatus {
        match &*self.state.lock() {
            LoaderState::Uninitialized => LoaderStatus::Uninitialized,
            LoaderState::Loading(_) => LoaderStatus::Loading,
            LoaderState::Ready(_) => LoaderStatus::Ready,
        }
    }

    pub async fn load(&self) -> Result<Arc<dyn MapSdk>, SdkError> {
        let pending = {
            let mut state = self.state.lock();
            let in_flight = match &*state {
                LoaderState::Ready(sdk) => return Ok(Arc::clone(sdk)),
                LoaderState::Loading(pending) => Some(pending.clone()),
                LoaderState::Uninitialized => None,
            };
            match in_flight {
                Some(pending) => pending,
                None => {
                    let script = SdkScript::from_config(&self.config)?;
                    tracing::info!("Loading map SDK from {}", self.config.script_base);
                    let pending = Self::start(Arc::clone(&self.bootstrap), script);
                    *state = LoaderState::Loading(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;

        let mut state = self.state.lock();
        // Only the load we awaited may settle the state; a retry might already be running.
        let settles = matches!(&*state, LoaderState::Loading(current) if current.ptr_eq(&pending));
        if settles {
            *state = match &outcome {
                Ok(sdk) => LoaderState::Ready(Arc::clone(sdk)),
                Err(e) => {
                    tracing::error!("Map SDK load failed: {}", e);
                    LoaderState::Uninitialized
                }
            };
        }

        outcome
    }

    fn start(bootstrap: Arc<dyn SdkBootstrap>, script: SdkScript) -> SharedLoad {
        async move {
            if !script.requests_library(SERVICES_LIBRARY) {
                return Err(SdkError::MissingCapability(SERVICES_LIBRARY));
            }
            let sdk = bootstrap.bootstrap(&script).await?;
            if !sdk.capabilities().geocoding {
                return Err(SdkError::MissingCapability(SERVICES_LIBRARY));
            }
            Ok(sdk)
        }
        .boxed()
        .shared()
    }
}
