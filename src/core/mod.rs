pub mod controller;
pub mod viewport;

pub use controller::{
    ControllerConfig, CycleOutcome, CyclePhase, MapViewError, MarkerController, ReadyKind,
};
