use regex::Regex;
use std::sync::LazyLock;

use super::states::{resolve_state, DEFAULT_COUNTRY_CODE, DEFAULT_COUNTRY_NAME};
use super::units::clean_text;
use crate::model::LocationDraft;

static STATE_WITH_ZIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<state>[A-Za-z][A-Za-z .]*?)\s+(?P<zip>\d{5}(?:-\d{4})?)$").unwrap()
});

/// Splits `"City, ST"`, `"City, State, 12345"` or `"City, ST 12345"` into a
/// location with the default country.
pub fn parse_city_state_zip(text: &str) -> LocationDraft {
    let parts: Vec<String> = text
        .split(',')
        .map(clean_text)
        .filter(|part| !part.is_empty())
        .collect();

    let mut location = LocationDraft {
        country_code: DEFAULT_COUNTRY_CODE.to_string(),
        country_name: DEFAULT_COUNTRY_NAME.to_string(),
        ..LocationDraft::default()
    };

    let Some(city) = parts.first() else {
        return LocationDraft::default();
    };
    location.city = city.clone();

    if let Some(state_part) = parts.get(1) {
        let (state, zip) = match STATE_WITH_ZIP.captures(state_part) {
            Some(caps) => (caps["state"].to_string(), caps["zip"].to_string()),
            None => (state_part.clone(), String::new()),
        };
        let resolved = resolve_state(&state);
        location.state = resolved.name;
        location.state_code = resolved.code;
        location.postal_code = parts.get(2).cloned().unwrap_or(zip);
    }

    location
}

/// Joins the non-empty components with `", "`.
///
/// Invisible characters (NBSP, zero-width space, BOM, soft hyphen) are
/// stripped first so they cannot produce empty-looking components.
pub fn format_location_label(postal_code: &str, city: &str, state: &str, country: &str) -> String {
    [postal_code, city, state, country]
        .iter()
        .map(|component| clean_text(component))
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Label for a location: the state code is preferred over the full name.
pub fn location_label(location: &LocationDraft) -> String {
    let state = if location.state_code.is_empty() {
        &location.state
    } else {
        &location.state_code
    };
    format_location_label(
        &location.postal_code,
        &location.city,
        state,
        &location.country_name,
    )
}
