use crate::domain::model::{Place, PlacesResponse};
use crate::domain::ports::PlaceSource;
use crate::utils::error::{PlaceMapError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_PATH: &str = "data/places.json";

/// Places document on local disk, re-read on every load.
#[derive(Debug, Clone)]
pub struct FilePlaceSource {
    path: PathBuf,
}

impl FilePlaceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlaceSource for FilePlaceSource {
    async fn load_places(&self) -> Result<PlacesResponse> {
        tracing::debug!("Reading places from {}", self.path.display());
        let contents = tokio::fs::read_to_string(&self.path).await?;
        parse_places_document(&contents)
    }
}

/// Parses `{ "places": [...] }`. Absent optional lists come back empty.
pub fn parse_places_document(contents: &str) -> Result<PlacesResponse> {
    let mut document: serde_json::Value = serde_json::from_str(contents)?;

    let places = match document.get_mut("places") {
        Some(value) if value.is_array() => value.take(),
        Some(_) => {
            return Err(PlaceMapError::DataFormatError {
                message: "`places` is not an array".to_string(),
            })
        }
        None => {
            return Err(PlaceMapError::DataFormatError {
                message: "missing `places` array".to_string(),
            })
        }
    };

    let places: Vec<Place> = serde_json::from_value(places)?;
    Ok(PlacesResponse { places })
}

/// Ids must be unique for detail lookups to be meaningful.
pub fn ensure_unique_ids(places: &[Place]) -> Result<()> {
    let mut seen = HashSet::new();
    for place in places {
        if !seen.insert(place.id) {
            return Err(PlaceMapError::DataFormatError {
                message: format!("duplicate place id {}", place.id),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_normalizes_optional_lists() {
        let doc = r#"{"places": [
            {"id": 1, "name": "A", "address": "addr A", "tags": ["quiet"]},
            {"id": 2, "name": "B", "address": "addr B", "links": null}
        ]}"#;

        let response = parse_places_document(doc).unwrap();
        assert_eq!(response.places.len(), 2);
        assert_eq!(response.places[0].tags, vec!["quiet".to_string()]);
        assert!(response.places[0].nearby_stops.is_empty());
        assert!(response.places[1].links.is_empty());
    }

    #[test]
    fn test_missing_or_wrong_places_field_is_format_error() {
        for doc in [r#"{}"#, r#"{"places": {"id": 1}}"#, r#"[]"#] {
            assert!(matches!(
                parse_places_document(doc),
                Err(PlaceMapError::DataFormatError { .. })
            ));
        }
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        assert!(matches!(
            parse_places_document("{\"places\": ["),
            Err(PlaceMapError::SerializationError(_))
        ));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let response = parse_places_document(
            r#"{"places": [{"id": 1, "name": "A", "address": "a"}, {"id": 1, "name": "B", "address": "b"}]}"#,
        )
        .unwrap();
        assert!(ensure_unique_ids(&response.places).is_err());
        assert!(ensure_unique_ids(&response.places[..1]).is_ok());
    }

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"places": [{"id": 7, "name": "Park", "address": "somewhere"}]}"#)
            .unwrap();

        let source = FilePlaceSource::new(file.path());
        let response = source.load_places().await.unwrap();
        assert_eq!(response.places[0].id, 7);
    }

    #[tokio::test]
    async fn test_file_source_missing_file_is_io_error() {
        let source = FilePlaceSource::new("/nonexistent/places.json");
        assert!(matches!(
            source.load_places().await,
            Err(PlaceMapError::IoError(_))
        ));
    }
}
