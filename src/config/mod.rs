#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::kakao_geocoder::DEFAULT_LOCAL_API_URL;
use crate::adapters::place_file::DEFAULT_DATA_PATH;
use crate::core::controller::{ControllerConfig, CLOSE_ZOOM_LEVEL, DEFAULT_CENTER};
use crate::core::viewport::OVERLAY_PADDING_PX;
use crate::domain::geo::LatLng;
use crate::sdk::loader::{SdkConfig, DEFAULT_SDK_URL};
use crate::utils::error::{PlaceMapError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_range, validate_url, Validate,
};
use std::net::SocketAddr;
use toml_config::TomlConfig;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: String,
    pub json_logs: bool,
}

#[derive(Debug, Clone)]
pub struct DataSettings {
    pub path: String,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MapSettings {
    pub sdk_url: String,
    pub app_key: Option<String>,
    pub rest_api_key: Option<String>,
    pub local_api_url: String,
    pub container: String,
    pub default_center: LatLng,
    pub close_level: u8,
    pub overlay_padding: f64,
}

/// Effective settings: file values, then environment, then built-in defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub map: MapSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

impl AppConfig {
    pub fn from_toml(file: TomlConfig) -> Self {
        let server = file.server.unwrap_or_default();
        let data = file.data.unwrap_or_default();
        let map = file.map.unwrap_or_default();
        let defaults = ControllerConfig::default();

        Self {
            server: ServerSettings {
                addr: server
                    .addr
                    .or_else(|| std::env::var("PLACEMAP_ADDR").ok())
                    .unwrap_or_else(|| DEFAULT_ADDR.to_string()),
                json_logs: server.json_logs.unwrap_or(false),
            },
            data: DataSettings {
                path: data.path.unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
                api_url: data.api_url,
            },
            map: MapSettings {
                sdk_url: map.sdk_url.unwrap_or_else(|| DEFAULT_SDK_URL.to_string()),
                app_key: map
                    .app_key
                    .or_else(|| std::env::var("KAKAO_JAVASCRIPT_KEY").ok()),
                rest_api_key: map
                    .rest_api_key
                    .or_else(|| std::env::var("KAKAO_REST_API_KEY").ok()),
                local_api_url: map
                    .local_api_url
                    .unwrap_or_else(|| DEFAULT_LOCAL_API_URL.to_string()),
                container: map.container.unwrap_or(defaults.container),
                default_center: LatLng::new(
                    map.default_lat.unwrap_or(DEFAULT_CENTER.lat),
                    map.default_lng.unwrap_or(DEFAULT_CENTER.lng),
                ),
                close_level: map.close_level.unwrap_or(CLOSE_ZOOM_LEVEL),
                overlay_padding: map.overlay_padding.unwrap_or(OVERLAY_PADDING_PX),
            },
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.server
            .addr
            .parse()
            .map_err(|e| PlaceMapError::InvalidConfigValueError {
                field: "server.addr".to_string(),
                value: self.server.addr.clone(),
                reason: format!("{}", e),
            })
    }

    pub fn sdk_config(&self) -> SdkConfig {
        SdkConfig {
            script_base: self.map.sdk_url.clone(),
            app_key: self.map.app_key.clone(),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            container: self.map.container.clone(),
            default_center: self.map.default_center,
            close_level: self.map.close_level,
            overlay_padding: self.map.overlay_padding,
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        validate_path("data.path", &self.data.path)?;
        if let Some(api_url) = &self.data.api_url {
            validate_url("data.api_url", api_url)?;
        }
        validate_url("map.sdk_url", &self.map.sdk_url)?;
        validate_url("map.local_api_url", &self.map.local_api_url)?;
        validate_non_empty_string("map.container", &self.map.container)?;
        validate_range("map.default_lat", self.map.default_center.lat, -90.0, 90.0)?;
        validate_range("map.default_lng", self.map.default_center.lng, -180.0, 180.0)?;
        validate_range("map.close_level", self.map.close_level, 1, 14)?;
        validate_range("map.overlay_padding", self.map.overlay_padding, 0.0, 200.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_map_view() {
        let config = AppConfig::from_toml(TomlConfig::default());
        assert_eq!(config.map.default_center, DEFAULT_CENTER);
        assert_eq!(config.map.close_level, 2);
        assert_eq!(config.map.overlay_padding, 16.0);
        assert_eq!(config.data.path, DEFAULT_DATA_PATH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let file = TomlConfig::from_toml_str(
            r#"
[server]
addr = "0.0.0.0:9000"

[map]
close_level = 4
container = "place-map"
"#,
        )
        .unwrap();

        let config = AppConfig::from_toml(file);
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.controller_config().close_level, 4);
        assert_eq!(config.controller_config().container, "place-map");
    }

    #[test]
    fn test_validation_catches_bad_values() {
        let mut config = AppConfig::default();
        config.map.close_level = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.addr = "nowhere".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.data.api_url = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());
    }
}
