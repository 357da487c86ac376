use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaceMapError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid places data format: {message}")]
    DataFormatError { message: String },

    #[error("Place not found: {id}")]
    PlaceNotFound { id: String },

    #[error("Invalid place id: {raw}")]
    InvalidPlaceId { raw: String },

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl PlaceMapError {
    /// Short text safe to return to an API client or print for a CLI user.
    /// The detail stays in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            PlaceMapError::ConfigError { .. }
            | PlaceMapError::MissingConfigError { .. }
            | PlaceMapError::InvalidConfigValueError { .. } => "Invalid configuration",
            PlaceMapError::PlaceNotFound { .. } => "Place not found",
            PlaceMapError::InvalidPlaceId { .. } => "Invalid place id",
            PlaceMapError::IoError(_)
            | PlaceMapError::SerializationError(_)
            | PlaceMapError::DataFormatError { .. } => "Failed to load places",
            PlaceMapError::HttpError(_) | PlaceMapError::ApiError { .. } => {
                "Places API request failed"
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlaceMapError::IoError(_) => "Check that the data file exists and is readable",
            PlaceMapError::SerializationError(_) | PlaceMapError::DataFormatError { .. } => {
                "Check that the data file is a JSON object with a `places` array"
            }
            PlaceMapError::HttpError(_) => "Check the network connection and the API URL",
            PlaceMapError::ConfigError { .. } => "Check the configuration file syntax",
            PlaceMapError::MissingConfigError { .. } => {
                "Set the missing value in the configuration file or the environment"
            }
            PlaceMapError::InvalidConfigValueError { .. } => "Fix the reported configuration value",
            PlaceMapError::PlaceNotFound { .. } | PlaceMapError::InvalidPlaceId { .. } => {
                "Use an id listed by GET /api/places"
            }
            PlaceMapError::ApiError { status, .. } if *status >= 500 => {
                "The places API failed; try again later"
            }
            PlaceMapError::ApiError { .. } => "Check the request against the places API",
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            PlaceMapError::ConfigError { .. }
            | PlaceMapError::MissingConfigError { .. }
            | PlaceMapError::InvalidConfigValueError { .. } => 2,
            PlaceMapError::HttpError(_) | PlaceMapError::ApiError { .. } => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaceMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_match_api_envelopes() {
        let not_found = PlaceMapError::PlaceNotFound {
            id: "1e21".to_string(),
        };
        assert_eq!(not_found.user_message(), "Place not found");
        assert_eq!(not_found.to_string(), "Place not found: 1e21");

        let invalid = PlaceMapError::InvalidPlaceId {
            raw: "abc".to_string(),
        };
        assert_eq!(invalid.user_message(), "Invalid place id");
    }

    #[test]
    fn test_exit_codes_by_category() {
        let config = PlaceMapError::MissingConfigError {
            field: "map.rest_api_key".to_string(),
        };
        assert_eq!(config.exit_code(), 2);

        let api = PlaceMapError::ApiError {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(api.exit_code(), 3);
        assert_eq!(api.recovery_suggestion(), "The places API failed; try again later");

        let data = PlaceMapError::DataFormatError {
            message: "missing `places` array".to_string(),
        };
        assert_eq!(data.exit_code(), 1);
    }
}
