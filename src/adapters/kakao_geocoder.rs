use crate::domain::ports::{GeocodeResponse, GeocodeResult, Geocoder};
use crate::utils::error::{PlaceMapError, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_LOCAL_API_URL: &str = "https://dapi.kakao.com";

#[derive(Debug, Deserialize)]
struct AddressSearchBody {
    #[serde(default)]
    documents: Vec<AddressDocument>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    address_name: String,
    x: String,
    y: String,
}

/// Address lookup through the Kakao Local REST API.
#[derive(Debug, Clone)]
pub struct KakaoRestGeocoder {
    client: Client,
    base_url: String,
    rest_api_key: String,
}

impl KakaoRestGeocoder {
    pub fn new(base_url: &str, rest_api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            rest_api_key: rest_api_key.into(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<AddressDocument>> {
        let endpoint = format!("{}/v2/local/search/address.json", self.base_url);
        let url = Url::parse_with_params(&endpoint, &[("query", query)]).map_err(|e| {
            PlaceMapError::ConfigError {
                message: format!("invalid geocoder URL {}: {}", endpoint, e),
            }
        })?;

        let body: AddressSearchBody = self
            .client
            .get(url)
            .header(AUTHORIZATION, format!("KakaoAK {}", self.rest_api_key))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body.documents)
    }
}

#[async_trait]
impl Geocoder for KakaoRestGeocoder {
    async fn address_search(&self, query: &str) -> GeocodeResponse {
        match self.search(query).await {
            Ok(documents) if documents.is_empty() => GeocodeResponse::zero_result(),
            Ok(documents) => GeocodeResponse::ok(
                documents
                    .into_iter()
                    .map(|d| GeocodeResult {
                        address_name: d.address_name,
                        x: d.x,
                        y: d.y,
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::debug!("Address lookup for {:?} failed: {}", query, e);
                GeocodeResponse::error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::LatLng;
    use crate::domain::ports::GeocodeStatus;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_documents_map_to_ok_rows() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/local/search/address.json")
                .query_param("query", "광주 동구 동명로 1")
                .header("authorization", "KakaoAK rest-key");
            then.status(200).json_body(serde_json::json!({
                "documents": [
                    {"address_name": "광주 동구 동명동 1", "x": "126.9333", "y": "35.14224"}
                ],
                "meta": {"total_count": 1}
            }));
        });

        let geocoder = KakaoRestGeocoder::new(&server.base_url(), "rest-key");
        let response = geocoder.address_search("광주 동구 동명로 1").await;

        api_mock.assert();
        assert_eq!(response.status, GeocodeStatus::Ok);
        assert_eq!(response.first_position(), Some(LatLng::new(35.14224, 126.9333)));
    }

    #[tokio::test]
    async fn test_no_documents_is_zero_result() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/local/search/address.json");
            then.status(200).json_body(serde_json::json!({"documents": []}));
        });

        let geocoder = KakaoRestGeocoder::new(&server.base_url(), "k");
        let response = geocoder.address_search("nowhere").await;
        assert_eq!(response.status, GeocodeStatus::ZeroResult);
        assert!(response.first_position().is_none());
    }

    #[tokio::test]
    async fn test_http_failure_is_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/local/search/address.json");
            then.status(401).json_body(serde_json::json!({"errorType": "AccessDeniedError"}));
        });

        let geocoder = KakaoRestGeocoder::new(&server.base_url(), "bad");
        assert_eq!(
            geocoder.address_search("anything").await.status,
            GeocodeStatus::Error
        );
    }
}
