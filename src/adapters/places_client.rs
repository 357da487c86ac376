use crate::domain::model::{Place, PlacesResponse};
use crate::domain::ports::PlaceSource;
use crate::utils::error::{PlaceMapError, Result};
use crate::utils::validation::validate_url;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;

/// Client for the read-only places API.
#[derive(Debug, Clone)]
pub struct PlacesClient {
    base_url: String,
    client: Client,
}

impl PlacesClient {
    pub fn new(base_url: &str) -> Result<Self> {
        validate_url("api_url", base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        })
    }

    pub async fn get_places(&self) -> Result<PlacesResponse> {
        self.get_json("/api/places").await
    }

    pub async fn get_place(&self, id: i64) -> Result<Place> {
        self.get_json(&format!("/api/places/{}", id)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PlaceMapError::ApiError {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| PlaceMapError::ApiError {
            status: status.as_u16(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            // Prefer the server's own `message`, fall back to the reason phrase.
            let message = serde_json::from_slice::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            return Err(PlaceMapError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

impl PlaceSource for PlacesClient {
    async fn load_places(&self) -> Result<PlacesResponse> {
        self.get_places().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_get_places_sends_accept_header() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/places")
                .header("accept", "application/json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "places": [{"id": 1, "name": "Cafe", "address": "addr"}]
                }));
        });

        let client = PlacesClient::new(&server.base_url()).unwrap();
        let response = client.get_places().await.unwrap();

        api_mock.assert();
        assert_eq!(response.places.len(), 1);
        assert!(response.places[0].tags.is_empty());
    }

    #[tokio::test]
    async fn test_error_message_comes_from_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/places/9");
            then.status(404)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"message": "Place not found"}));
        });

        let client = PlacesClient::new(&format!("{}/", server.base_url())).unwrap();
        let err = client.get_place(9).await.unwrap_err();

        match &err {
            PlaceMapError::ApiError { status, message } => {
                assert_eq!(*status, 404);
                assert_eq!(message, "Place not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_error_without_json_uses_reason_phrase() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/places");
            then.status(500).body("boom");
        });

        let client = PlacesClient::new(&server.base_url()).unwrap();
        let err = client.get_places().await.unwrap_err();
        assert!(matches!(
            err,
            PlaceMapError::ApiError { status: 500, ref message } if message == "Internal Server Error"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_status_zero() {
        let client = PlacesClient::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(
            client.get_places().await,
            Err(PlaceMapError::ApiError { status: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(PlacesClient::new("not-a-url").is_err());
    }
}
