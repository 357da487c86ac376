use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    All,
    Cafe,
    Library,
    Outdoor,
    Etc,
}

impl Category {
    /// Order in which the category selector lists its buttons.
    pub const SELECTOR_ORDER: [Category; 5] = [
        Category::All,
        Category::Library,
        Category::Cafe,
        Category::Outdoor,
        Category::Etc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::All => "전체",
            Category::Cafe => "북카페·카페",
            Category::Library => "도서관",
            Category::Outdoor => "야외",
            Category::Etc => "기타",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "ALL",
            Category::Cafe => "CAFE",
            Category::Library => "LIBRARY",
            Category::Outdoor => "OUTDOOR",
            Category::Etc => "ETC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(Category::All),
            "CAFE" => Ok(Category::Cafe),
            "LIBRARY" => Ok(Category::Library),
            "OUTDOOR" => Ok(Category::Outdoor),
            "ETC" => Ok(Category::Etc),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Free-text description; older data files carry a single string, newer
/// ones a list of paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceInfo {
    Text(String),
    Paragraphs(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_days: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nearby_stops: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<PlaceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbidden: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub links: Vec<PlaceLink>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,
}

impl Place {
    /// Absent category counts as ETC.
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or(Category::Etc)
    }

    pub fn detail_path(&self) -> String {
        format!("/places/{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
}

/// Shared, immutable places list handed to the marker controller.
/// A new cycle starts only when a different allocation is passed in.
pub type PlaceList = Arc<[Place]>;

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
