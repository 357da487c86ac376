pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod presentation;
pub mod sdk;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;
pub use crate::config::AppConfig;

pub use crate::core::{ControllerConfig, CycleOutcome, CyclePhase, MapViewError, MarkerController, ReadyKind};
pub use domain::model::{Category, Place, PlaceList, PlacesResponse};
pub use sdk::{SdkConfig, SdkLoader};
pub use utils::error::{PlaceMapError, Result};
