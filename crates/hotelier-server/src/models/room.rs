use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoomMeals {
    pub breakfast: bool,
    pub dinner: bool,
    pub breakfast_and_dinner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoomAmenities {
    pub wifi: bool,
    pub cable_tv: bool,
    pub air_condition: bool,
    pub free_cancellation: bool,
    pub non_smoking: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BedType {
    pub single_bed: bool,
    pub twin_bed: bool,
    pub queen_bed: bool,
    pub king_bed: bool,
}

/// The bookable configuration of a room option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoomOptionSpec {
    pub room_name: String,
    pub square_feet: Option<f64>,
    pub room_meals: RoomMeals,
    pub room_amenities: RoomAmenities,
    pub room_images: Vec<String>,
    pub number_of_beds: u32,
    /// How many identical units of this option can be booked for the same night.
    pub num_of_empty_rooms: u32,
    pub price: f64,
    pub number_of_guests: u32,
    pub bed_type: BedType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomOption {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub spec: RoomOptionSpec,
}

/// An option as sent by clients: with `_id` it updates that option, without
/// one it creates a new option.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomOptionInput {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub spec: RoomOptionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: String,
    pub room_options: Vec<RoomOption>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NewRoom {
    pub room_options: Vec<RoomOptionInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RoomPatch {
    pub room_options: Option<Vec<RoomOptionInput>>,
}

/// Boolean attributes of a room option that searches can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFlag {
    Wifi,
    CableTv,
    AirCondition,
    FreeCancellation,
    NonSmoking,
    SingleBed,
    TwinBed,
    QueenBed,
    KingBed,
}

impl OptionFlag {
    pub fn amenity(name: &str) -> Option<Self> {
        match name {
            "Wifi" => Some(OptionFlag::Wifi),
            "CableTv" => Some(OptionFlag::CableTv),
            "AirCondition" => Some(OptionFlag::AirCondition),
            "FreeCancellation" => Some(OptionFlag::FreeCancellation),
            "NonSmoking" => Some(OptionFlag::NonSmoking),
            _ => None,
        }
    }

    pub fn bed_type(name: &str) -> Option<Self> {
        match name {
            "SingleBed" => Some(OptionFlag::SingleBed),
            "TwinBed" => Some(OptionFlag::TwinBed),
            "QueenBed" => Some(OptionFlag::QueenBed),
            "KingBed" => Some(OptionFlag::KingBed),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            OptionFlag::Wifi => "wifi",
            OptionFlag::CableTv => "cable_tv",
            OptionFlag::AirCondition => "air_condition",
            OptionFlag::FreeCancellation => "free_cancellation",
            OptionFlag::NonSmoking => "non_smoking",
            OptionFlag::SingleBed => "single_bed",
            OptionFlag::TwinBed => "twin_bed",
            OptionFlag::QueenBed => "queen_bed",
            OptionFlag::KingBed => "king_bed",
        }
    }
}

/// Predicates over room options. Every present predicate must hold for the
/// same option; a room matches when any of its options does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    pub name_contains: Option<String>,
    pub price: Option<f64>,
    pub flags: Vec<(OptionFlag, bool)>,
}

impl RoomFilter {
    pub fn is_empty(&self) -> bool {
        self.name_contains.is_none() && self.price.is_none() && self.flags.is_empty()
    }

    /// Builds a filter from `roomAmenities.<Name>=true|false` query pairs.
    /// Unrecognised keys are ignored.
    pub fn from_amenity_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let flags = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix("roomAmenities.")?;
                OptionFlag::amenity(name).map(|flag| (flag, value == "true"))
            })
            .collect();
        Self { flags, ..Self::default() }
    }

    /// Builds a filter from `<BedType>=true` query pairs. Only `true` values count.
    pub fn from_bed_type_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let flags = pairs
            .into_iter()
            .filter(|(_, value)| *value == "true")
            .filter_map(|(key, _)| OptionFlag::bed_type(key).map(|flag| (flag, true)))
            .collect();
        Self { flags, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_amenity_query_ignores_unknown_keys() {
        let filter = RoomFilter::from_amenity_query([
            ("roomAmenities.Wifi", "true"),
            ("roomAmenities.NonSmoking", "false"),
            ("roomAmenities.Jacuzzi", "true"),
            ("Wifi", "true"),
        ]);
        assert_eq!(
            filter.flags,
            vec![(OptionFlag::Wifi, true), (OptionFlag::NonSmoking, false)]
        );
    }

    #[test]
    fn test_bed_type_query_only_counts_true() {
        let filter = RoomFilter::from_bed_type_query([
            ("KingBed", "true"),
            ("TwinBed", "false"),
            ("BunkBed", "true"),
        ]);
        assert_eq!(filter.flags, vec![(OptionFlag::KingBed, true)]);
        assert!(RoomFilter::from_bed_type_query([("TwinBed", "yes")]).is_empty());
    }

    #[test]
    fn test_option_input_id_is_optional() {
        let input: RoomOptionInput =
            serde_json::from_str(r#"{"RoomName": "Deluxe King", "Price": 180.0}"#).unwrap();
        assert_eq!(input.id, None);
        assert_eq!(input.spec.room_name, "Deluxe King");
        assert_eq!(input.spec.num_of_empty_rooms, 0);

        let input: RoomOptionInput =
            serde_json::from_str(r#"{"_id": "opt-1", "NumOfEmptyRooms": 3}"#).unwrap();
        assert_eq!(input.id.as_deref(), Some("opt-1"));
        assert_eq!(input.spec.num_of_empty_rooms, 3);
    }
}
