use serde::{Deserialize, Serialize};

use super::{merge, Patch};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotelAddress {
    pub country: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotelAmenities {
    pub pool: bool,
    pub gym: bool,
    pub airport_shuttle: bool,
    pub pets: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotelDescription {
    pub images: Vec<String>,
    pub description: String,
}

/// Distances in kilometres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotelDetails {
    pub airport_distance: Option<f64>,
    pub downtown_distance: Option<f64>,
    pub sea_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub rating: f64,
    pub review_text: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub user_id: String,
    pub rating: f64,
    #[serde(default)]
    pub review_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hotel {
    #[serde(rename = "_id")]
    pub id: String,
    pub hotel_name: String,
    pub hotel_address: HotelAddress,
    pub hotel_rating: Option<f64>,
    pub hotel_amenities: HotelAmenities,
    pub hotel_description: HotelDescription,
    pub hotel_reviews: Vec<Review>,
    pub hotel_details: HotelDetails,
    pub rooms: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NewHotel {
    pub hotel_name: String,
    pub hotel_address: HotelAddress,
    pub hotel_rating: Option<f64>,
    pub hotel_amenities: HotelAmenities,
    pub hotel_description: HotelDescription,
    pub hotel_details: HotelDetails,
    pub rooms: Vec<String>,
}

/// Sub-documents are replaced whole when present. Reviews are append-only and
/// not part of the patch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HotelPatch {
    pub hotel_name: Option<String>,
    pub hotel_address: Option<HotelAddress>,
    pub hotel_rating: Option<f64>,
    pub hotel_amenities: Option<HotelAmenities>,
    pub hotel_description: Option<HotelDescription>,
    pub hotel_details: Option<HotelDetails>,
    pub rooms: Option<Vec<String>>,
}

impl Patch<Hotel> for HotelPatch {
    fn apply_to(self, hotel: &mut Hotel) {
        merge(&mut hotel.hotel_name, self.hotel_name);
        merge(&mut hotel.hotel_address, self.hotel_address);
        merge(&mut hotel.hotel_rating, self.hotel_rating.map(Some));
        merge(&mut hotel.hotel_amenities, self.hotel_amenities);
        merge(&mut hotel.hotel_description, self.hotel_description);
        merge(&mut hotel.hotel_details, self.hotel_details);
        merge(&mut hotel.rooms, self.rooms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grand_palace() -> Hotel {
        Hotel {
            id: "h1".into(),
            hotel_name: "Grand Palace".into(),
            hotel_address: HotelAddress {
                country: "Canada".into(),
                city: "Toronto".into(),
                province: "Ontario".into(),
                postal_code: "M5V 2T6".into(),
            },
            hotel_rating: Some(3.5),
            hotel_amenities: HotelAmenities {
                pool: true,
                gym: false,
                airport_shuttle: true,
                pets: false,
            },
            hotel_description: HotelDescription {
                images: vec!["lobby.jpg".into()],
                description: "Old-world charm".into(),
            },
            hotel_reviews: vec![],
            hotel_details: HotelDetails {
                airport_distance: Some(22.0),
                downtown_distance: Some(0.5),
                sea_distance: None,
            },
            rooms: vec!["r1".into()],
            created_at: "2024-01-01T00:00:00.000Z".into(),
            updated_at: "2024-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn test_rating_only_patch_keeps_other_fields() {
        let original = grand_palace();
        let patch: HotelPatch = serde_json::from_str(r#"{"HotelRating": 4}"#).unwrap();

        let mut patched = original.clone();
        patch.apply_to(&mut patched);

        assert_eq!(patched.hotel_rating, Some(4.0));
        patched.hotel_rating = original.hotel_rating;
        assert_eq!(patched, original);
    }

    #[test]
    fn test_nested_document_is_replaced_whole() {
        let mut hotel = grand_palace();
        let patch: HotelPatch =
            serde_json::from_str(r#"{"HotelAddress": {"Country": "France", "City": "Paris"}}"#)
                .unwrap();
        patch.apply_to(&mut hotel);

        assert_eq!(hotel.hotel_address.country, "France");
        assert_eq!(hotel.hotel_address.city, "Paris");
        assert_eq!(hotel.hotel_address.province, "");
        assert_eq!(hotel.hotel_name, "Grand Palace");
    }

    #[test]
    fn test_null_field_is_treated_as_absent() {
        let mut hotel = grand_palace();
        let patch: HotelPatch = serde_json::from_str(r#"{"HotelName": null}"#).unwrap();
        patch.apply_to(&mut hotel);
        assert_eq!(hotel.hotel_name, "Grand Palace");
    }
}
