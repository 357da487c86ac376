use crate::domain::model::Place;
use serde::Serialize;

pub const DETAIL_LINK_LABEL: &str = "자세히 보기";

/// The one interactive element inside a marker overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailLink {
    pub href: String,
    pub label: String,
    /// The host must keep activation of this link from reaching the map's
    /// background-click handler, or the overlay would close under it.
    pub stop_propagation: bool,
}

/// Description of a marker overlay. The hosting surface turns it into UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayContent {
    pub place_id: i64,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    pub detail_link: DetailLink,
}

impl OverlayContent {
    pub fn for_place(place: &Place) -> Self {
        Self {
            place_id: place.id,
            title: place.name.clone(),
            address: place.address.clone(),
            hours: place.hours.clone().filter(|h| !h.trim().is_empty()),
            detail_link: DetailLink {
                href: place.detail_path(),
                label: DETAIL_LINK_LABEL.to_string(),
                stop_propagation: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(hours: Option<&str>) -> Place {
        serde_json::from_value(serde_json::json!({
            "id": 12,
            "name": "계림동 작은도서관",
            "address": "광주 동구 계림로 10",
            "hours": hours,
        }))
        .unwrap()
    }

    #[test]
    fn test_content_links_to_detail_page() {
        let content = OverlayContent::for_place(&place(Some("10:00 - 18:00")));

        assert_eq!(content.title, "계림동 작은도서관");
        assert_eq!(content.hours.as_deref(), Some("10:00 - 18:00"));
        assert_eq!(content.detail_link.href, "/places/12");
        assert_eq!(content.detail_link.label, DETAIL_LINK_LABEL);
        assert!(content.detail_link.stop_propagation);
    }

    #[test]
    fn test_hours_row_omitted_when_missing_or_blank() {
        assert!(OverlayContent::for_place(&place(None)).hours.is_none());
        assert!(OverlayContent::for_place(&place(Some("  "))).hours.is_none());

        let json = serde_json::to_value(OverlayContent::for_place(&place(None))).unwrap();
        assert!(json.get("hours").is_none());
        assert_eq!(json["detailLink"]["stopPropagation"], true);
    }
}
