use crate::utils::error::{PlaceMapError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk configuration. Every field is optional; `AppConfig` fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerSection>,
    pub data: Option<DataSection>,
    pub map: Option<MapSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub addr: Option<String>,
    pub json_logs: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSection {
    pub path: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapSection {
    pub sdk_url: Option<String>,
    pub app_key: Option<String>,
    pub rest_api_key: Option<String>,
    pub local_api_url: Option<String>,
    pub container: Option<String>,
    pub default_lat: Option<f64>,
    pub default_lng: Option<f64>,
    pub close_level: Option<u8>,
    pub overlay_padding: Option<f64>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| PlaceMapError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Replaces `${VAR}` with the environment value. Unset variables are left
/// as written so validation can point at them.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    use std::sync::OnceLock;

    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::from_toml_str(
            r#"
[server]
addr = "0.0.0.0:8080"
json_logs = true

[data]
path = "./data/places.json"

[map]
default_lat = 35.1
default_lng = 126.9
close_level = 3
"#,
        )
        .unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.addr.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(server.json_logs, Some(true));
        let map = config.map.unwrap();
        assert_eq!(map.close_level, Some(3));
        assert!(map.app_key.is_none());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.server.is_none());
        assert!(config.map.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PLACEMAP_TEST_JS_KEY", "js-key-123");

        let config = TomlConfig::from_toml_str(
            r#"
[map]
app_key = "${PLACEMAP_TEST_JS_KEY}"
rest_api_key = "${PLACEMAP_TEST_UNSET_KEY}"
"#,
        )
        .unwrap();

        let map = config.map.unwrap();
        assert_eq!(map.app_key.as_deref(), Some("js-key-123"));
        assert_eq!(map.rest_api_key.as_deref(), Some("${PLACEMAP_TEST_UNSET_KEY}"));

        std::env::remove_var("PLACEMAP_TEST_JS_KEY");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            TomlConfig::from_toml_str("[map\nclose_level = 2"),
            Err(PlaceMapError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[data]\napi_url = \"http://localhost:3000\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.data.unwrap().api_url.as_deref(),
            Some("http://localhost:3000")
        );
    }
}
