use regex::Regex;
use std::sync::LazyLock;

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// Equipment markers this pipeline never accepts (flatbeds and reefers).
const DISALLOWED_EQUIPMENT: [&str; 3] = ["FLAT", "REF", "REEFER"];

/// Longest item, in feet, that still fits the largest supported truck.
pub const MAX_SUPPORTED_LENGTH_FT: f64 = 26.0;

/// Equipment class a shipment is booked on. The discriminant is the
/// persisted `truck_type_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruckClass {
    SmallStraight = 1,
    LargeStraight = 2,
    Sprinter = 3,
}

impl TruckClass {
    /// Maps an item length in feet to a truck class.
    ///
    /// `(0, 14]` is a Sprinter, `(14, 18]` a Small Straight and `(18, 26]`
    /// a Large Straight. Anything else has no class and must be rejected.
    pub fn classify(length_ft: f64) -> Option<Self> {
        if !length_ft.is_finite() || length_ft <= 0.0 {
            None
        } else if length_ft <= 14.0 {
            Some(Self::Sprinter)
        } else if length_ft <= 18.0 {
            Some(Self::SmallStraight)
        } else if length_ft <= MAX_SUPPORTED_LENGTH_FT {
            Some(Self::LargeStraight)
        } else {
            None
        }
    }

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::SmallStraight => "Small Straight",
            Self::LargeStraight => "Large Straight",
            Self::Sprinter => "Sprinter",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            1 => Some(Self::SmallStraight),
            2 => Some(Self::LargeStraight),
            3 => Some(Self::Sprinter),
            _ => None,
        }
    }
}

/// True when the raw trailer type names refrigerated or flatbed equipment.
pub fn is_disallowed_equipment(trailer_type: &str) -> bool {
    let upper = trailer_type.to_uppercase();
    DISALLOWED_EQUIPMENT
        .iter()
        .any(|marker| upper.contains(marker))
}

/// Recovers a length from a trailer description such as `"53 FT Dry Van"`.
pub fn recover_length(trailer_type: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(trailer_type.trim())
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_band_edges() {
        assert_eq!(TruckClass::classify(0.5), Some(TruckClass::Sprinter));
        assert_eq!(TruckClass::classify(14.0), Some(TruckClass::Sprinter));
        assert_eq!(TruckClass::classify(14.01), Some(TruckClass::SmallStraight));
        assert_eq!(TruckClass::classify(18.0), Some(TruckClass::SmallStraight));
        assert_eq!(TruckClass::classify(18.5), Some(TruckClass::LargeStraight));
        assert_eq!(TruckClass::classify(26.0), Some(TruckClass::LargeStraight));
    }

    #[test]
    fn rejects_lengths_outside_supported_range() {
        for length in [0.0, -3.0, 26.01, 53.0, f64::NAN] {
            assert_eq!(TruckClass::classify(length), None, "length {length}");
        }
    }

    #[test]
    fn every_class_in_range_has_a_known_id() {
        let mut length = 0.25;
        while length <= MAX_SUPPORTED_LENGTH_FT {
            let class = TruckClass::classify(length).unwrap();
            assert_eq!(TruckClass::from_id(class.id()), Some(class));
            length += 0.25;
        }
    }

    #[test]
    fn ids_match_persisted_truck_types() {
        assert_eq!(TruckClass::SmallStraight.id(), 1);
        assert_eq!(TruckClass::LargeStraight.id(), 2);
        assert_eq!(TruckClass::Sprinter.id(), 3);
        assert_eq!(TruckClass::LargeStraight.display_name(), "Large Straight");
    }

    #[test]
    fn detects_flatbed_and_reefer_markers() {
        assert!(is_disallowed_equipment("48 FT FLATBED"));
        assert!(is_disallowed_equipment("Reefer"));
        assert!(is_disallowed_equipment("53' refrigerated"));
        assert!(!is_disallowed_equipment("53 FT Dry Van"));
        assert!(!is_disallowed_equipment(""));
    }

    #[test]
    fn recovers_first_number_from_trailer_type() {
        assert_eq!(recover_length("26 FT STRAIGHT TRUCK"), Some(26.0));
        assert_eq!(recover_length(" van 53 ft"), Some(53.0));
        assert_eq!(recover_length("Dry Van"), None);
    }
}
