use regex::Regex;
use std::sync::LazyLock;

static FEET_AND_INCHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<feet>\d+(?:\.\d+)?)\s*(?:'|ft\.?|feet|foot)\s*(?:(?P<inches>\d+(?:\.\d+)?)\s*(?:"|''|in\.?|inches|inch)?)?$"#,
    )
    .unwrap()
});

static INCHES_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<inches>\d+(?:\.\d+)?)\s*(?:"|''|in\.?|inches|inch)$"#).unwrap()
});

static BARE_NUMBERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<feet>\d+(?:\.\d+)?)(?:\s+(?P<inches>\d+(?:\.\d+)?))?$").unwrap()
});

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<value>\d+(?:\.\d+)?)\s*(?P<unit>lbs?|pounds?|#|kgs?|kilograms?)?\.?$")
        .unwrap()
});

const POUNDS_PER_KILOGRAM: f64 = 2.204_62;

/// Collapses whitespace, including non-breaking spaces, to single spaces.
pub fn clean_text(text: &str) -> String {
    text.replace(['\u{a0}', '\u{200b}', '\u{feff}', '\u{ad}'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses a dimension into decimal feet.
///
/// Accepts `20' 6"`, `20 ft`, `48 in`, `53 6` (feet then inches) and a bare
/// number of feet. Returns `None` for anything else.
pub fn parse_feet(text: &str) -> Option<f64> {
    let cleaned = clean_text(text).to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    let number = |caps: &regex::Captures<'_>, name: &str| -> f64 {
        caps.name(name)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let feet = if let Some(caps) = FEET_AND_INCHES.captures(&cleaned) {
        number(&caps, "feet") + number(&caps, "inches") / 12.0
    } else if let Some(caps) = INCHES_ONLY.captures(&cleaned) {
        number(&caps, "inches") / 12.0
    } else if let Some(caps) = BARE_NUMBERS.captures(&cleaned) {
        number(&caps, "feet") + number(&caps, "inches") / 12.0
    } else {
        return None;
    };

    Some(round_hundredths(feet))
}

/// Parses a weight into pounds, dropping thousands separators and unit
/// suffixes. Kilograms are converted.
pub fn parse_weight(text: &str) -> Option<f64> {
    let cleaned = clean_text(text).to_lowercase().replace(',', "");
    let caps = WEIGHT.captures(cleaned.trim())?;
    let value: f64 = caps["value"].parse().ok()?;
    let is_metric = caps
        .name("unit")
        .is_some_and(|unit| unit.as_str().starts_with('k'));

    Some(if is_metric {
        round_hundredths(value * POUNDS_PER_KILOGRAM)
    } else {
        value
    })
}

/// Interprets Yes/No style tokens. Anything unclear is `false`.
pub fn parse_yes_no(token: &str) -> bool {
    matches!(
        clean_text(token).to_lowercase().as_str(),
        "y" | "yes" | "true" | "1" | "x"
    )
}

/// Parses a mileage such as `"1,200"` or `"1200 mi"`.
pub fn parse_miles(text: &str) -> Option<i32> {
    let digits: String = clean_text(text)
        .replace(',', "")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
