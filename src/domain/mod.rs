// Domain layer: place records, geometry, and the ports the map core talks through.

pub mod geo;
pub mod model;
pub mod ports;
