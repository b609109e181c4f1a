//! US state and country lookups.

const STATES: [(&str, &str); 51] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

const COUNTRIES: [(&[&str], &str, &str); 3] = [
    (&["US", "USA", "UNITED STATES"], "US", "United States"),
    (&["CA", "CAN", "CANADA"], "CA", "Canada"),
    (&["MX", "MEX", "MEXICO"], "MX", "Mexico"),
];

pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const DEFAULT_COUNTRY_NAME: &str = "United States";

/// Resolved `(state name, state code)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateName {
    pub name: String,
    pub code: String,
}

pub fn state_name_for_code(code: &str) -> Option<&'static str> {
    let code = code.trim();
    STATES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

pub fn state_code_for_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    STATES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Accepts either a two-letter code or a full state name.
///
/// Unknown values are kept verbatim as the name with an empty code.
pub fn resolve_state(value: &str) -> StateName {
    let value = value.trim();
    if let Some(code) = state_code_for_name(value) {
        return StateName {
            name: value.to_string(),
            code: code.to_string(),
        };
    }
    if let Some(name) = state_name_for_code(value) {
        return StateName {
            name: name.to_string(),
            code: value.to_uppercase(),
        };
    }
    StateName {
        name: value.to_string(),
        code: String::new(),
    }
}

/// Returns `(country code, country name)` for a code or name, falling back
/// to the raw value as the name when it is not recognised.
pub fn resolve_country(value: &str) -> (String, String) {
    let upper = value.trim().to_uppercase();
    if upper.is_empty() {
        return (
            DEFAULT_COUNTRY_CODE.to_string(),
            DEFAULT_COUNTRY_NAME.to_string(),
        );
    }
    COUNTRIES
        .iter()
        .find(|(aliases, _, _)| aliases.contains(&upper.as_str()))
        .map(|(_, code, name)| (code.to_string(), name.to_string()))
        .unwrap_or_else(|| (String::new(), value.trim().to_string()))
}
