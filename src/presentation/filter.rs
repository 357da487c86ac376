use crate::domain::model::{Category, Place};

/// Selector entry that matches every neighborhood.
pub const ALL_NEIGHBORHOODS: &str = "전체";

/// Shown instead of the map when the selection leaves no places.
pub const EMPTY_SELECTION_MESSAGE: &str = "선택한 카테고리에 해당하는 장소가 없습니다.";

pub const NEIGHBORHOODS: [&str; 10] = [
    ALL_NEIGHBORHOODS,
    "동명동",
    "학동",
    "계림동",
    "지산동",
    "학운동",
    "충장동",
    "서남동",
    "산수동",
    "지원동",
];

pub fn filter_by_category(places: &[Place], category: Category) -> Vec<Place> {
    if category == Category::All {
        return places.to_vec();
    }

    places
        .iter()
        .filter(|place| place.effective_category() == category)
        .cloned()
        .collect()
}

/// Places carry no neighborhood field, so the match is on the address text.
pub fn filter_by_neighborhood(places: &[Place], neighborhood: &str) -> Vec<Place> {
    let neighborhood = neighborhood.trim();
    if neighborhood.is_empty() || neighborhood == ALL_NEIGHBORHOODS {
        return places.to_vec();
    }

    places
        .iter()
        .filter(|place| place.address.contains(neighborhood))
        .cloned()
        .collect()
}

/// First listed neighborhood named in the place's address.
pub fn neighborhood_of(place: &Place) -> Option<&'static str> {
    NEIGHBORHOODS
        .iter()
        .skip(1)
        .find(|name| place.address.contains(*name))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: i64, address: &str, category: Option<&str>) -> Place {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("place {}", id),
            "address": address,
            "category": category,
        }))
        .unwrap()
    }

    fn sample() -> Vec<Place> {
        vec![
            place(1, "광주 동구 동명동 200-1", Some("CAFE")),
            place(2, "광주 동구 계림동 55", Some("LIBRARY")),
            place(3, "광주 동구 동명동 12", None),
            place(4, "광주 동구 지산동 7", Some("ETC")),
        ]
    }

    #[test]
    fn test_all_category_keeps_everything() {
        assert_eq!(filter_by_category(&sample(), Category::All).len(), 4);
    }

    #[test]
    fn test_missing_category_counts_as_etc() {
        let ids: Vec<i64> = filter_by_category(&sample(), Category::Etc)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![3, 4]);
        assert!(filter_by_category(&sample(), Category::Outdoor).is_empty());
    }

    #[test]
    fn test_neighborhood_matches_address() {
        let ids: Vec<i64> = filter_by_neighborhood(&sample(), "동명동")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(filter_by_neighborhood(&sample(), ALL_NEIGHBORHOODS).len(), 4);
    }

    #[test]
    fn test_neighborhood_of_uses_selector_list() {
        let places = sample();
        assert_eq!(neighborhood_of(&places[0]), Some("동명동"));
        assert_eq!(neighborhood_of(&places[1]), Some("계림동"));
        assert_eq!(neighborhood_of(&place(9, "광주 북구 우치로 43", None)), None);
    }
}
