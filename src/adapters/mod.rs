// Adapters layer: concrete implementations of the domain ports (files, http, geocoding).

pub mod kakao_geocoder;
pub mod place_file;
pub mod places_client;

pub use kakao_geocoder::KakaoRestGeocoder;
pub use place_file::FilePlaceSource;
pub use places_client::PlacesClient;
