//! Pure, side-effect-free normalization and classification helpers.

pub mod dates;
pub mod location;
pub mod reply_to;
pub mod states;
pub mod truck_size;
pub mod units;

pub use dates::parse_date_time;
pub use location::{format_location_label, location_label, parse_city_state_zip};
pub use reply_to::extract_reply_to;
pub use states::{resolve_country, resolve_state};
pub use truck_size::{is_disallowed_equipment, recover_length, TruckClass};
pub use units::{parse_feet, parse_miles, parse_weight, parse_yes_no};
