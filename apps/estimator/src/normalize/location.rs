//! Location normalizer: maps a free-text location to a coarse US region bucket.
//!
//! Output vocabulary: `remote`, `metro_<name>`, `state_<XX>`, `other_us`, `unknown`.

use std::sync::LazyLock;

use regex::Regex;

pub const REMOTE: &str = "remote";
pub const OTHER_US: &str = "other_us";
pub const UNKNOWN: &str = "unknown";

/// Metro keywords, checked in order with substring matching. The first hit wins,
/// so overlapping names resolve by position (e.g. "new york" before "albany, ny").
const METRO_KEYWORDS: &[(&str, &str)] = &[
    ("new york", "metro_nyc"),
    ("nyc", "metro_nyc"),
    ("jersey city", "metro_nyc"),
    ("stamford", "metro_nyc"),
    ("brooklyn", "metro_nyc"),
    ("queens", "metro_nyc"),
    ("newark", "metro_nyc"),
    ("albany, ny", "metro_albany"),
    ("sf", "metro_sf_bay"),
    ("san francisco", "metro_sf_bay"),
    ("bay area", "metro_sf_bay"),
    ("cupertino", "metro_sf_bay"),
    ("palo alto", "metro_sf_bay"),
    ("sunnyvale", "metro_sf_bay"),
    ("mountain view", "metro_sf_bay"),
    ("santa clara", "metro_sf_bay"),
    ("redwood city", "metro_sf_bay"),
    ("livermore", "metro_sf_bay"),
    ("los angeles", "metro_la"),
    ("burbank", "metro_la"),
    ("anaheim", "metro_la"),
    ("malibu", "metro_la"),
    ("culver city", "metro_la"),
    ("glendale", "metro_la"),
    ("pasadena", "metro_la"),
    ("downey", "metro_la"),
    ("orange county", "metro_la"),
    ("boston", "metro_boston"),
    ("cambridge", "metro_boston"),
    ("seattle", "metro_seattle"),
    ("issaquah", "metro_seattle"),
    ("chicago", "metro_chicago"),
    ("austin", "metro_austin"),
    ("dallas", "metro_dfw"),
    ("fort worth", "metro_dfw"),
    ("plano", "metro_dfw"),
    ("dfw", "metro_dfw"),
    ("washington, dc", "metro_dc"),
    ("ashburn", "metro_dc"),
    ("falls church", "metro_dc"),
    ("san diego", "metro_san_diego"),
    ("la jolla", "metro_san_diego"),
    ("coronado", "metro_san_diego"),
    ("denver", "metro_denver"),
    ("aurora", "metro_denver"),
    ("atlanta", "metro_atlanta"),
    ("alpharetta", "metro_atlanta"),
    ("miami", "metro_miami"),
    ("boca raton", "metro_miami"),
    ("phoenix", "metro_phoenix"),
    ("gilbert", "metro_phoenix"),
    ("raleigh", "metro_raleigh_durham"),
    ("durham", "metro_raleigh_durham"),
    ("chapel hill", "metro_raleigh_durham"),
    ("houston", "metro_houston"),
    ("philadelphia", "metro_philly"),
    ("king of prussia", "metro_philly"),
];

const STATES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
    ("district of columbia", "DC"),
];

static STATE_ABBR_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = STATES
        .iter()
        .map(|(_, abbr)| *abbr)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("state abbreviation regex")
});

static STATE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = STATES
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b({alternation})\b")).expect("state name regex")
});

/// True when `location` is already one of the normalizer's own outputs.
pub fn is_canonical(location: &str) -> bool {
    location.starts_with("metro_")
        || location.starts_with("state_")
        || matches!(location, REMOTE | OTHER_US | UNKNOWN)
}

/// Maps a raw location to a region bucket. Safe to re-apply to its own output.
///
/// Precedence: canonical passthrough, `remote`, metro keyword table,
/// state abbreviation, full state name, then `other_us` (the postings are US-only).
pub fn normalize_location(location: Option<&str>) -> String {
    let Some(location) = location else {
        return UNKNOWN.to_string();
    };

    if is_canonical(location) {
        return location.to_string();
    }

    let loc_lower = location.to_lowercase();

    if loc_lower.contains(REMOTE) {
        return REMOTE.to_string();
    }

    if let Some((_, metro)) = METRO_KEYWORDS
        .iter()
        .find(|(keyword, _)| loc_lower.contains(keyword))
    {
        return (*metro).to_string();
    }

    if let Some(m) = STATE_ABBR_RE.captures(location).and_then(|c| c.get(1)) {
        return format!("state_{}", m.as_str().to_uppercase());
    }

    if let Some(m) = STATE_NAME_RE.captures(&loc_lower).and_then(|c| c.get(1)) {
        if let Some((_, abbr)) = STATES.iter().find(|(name, _)| *name == m.as_str()) {
            return format!("state_{abbr}");
        }
    }

    OTHER_US.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_location_is_unknown() {
        assert_eq!(normalize_location(None), "unknown");
    }

    #[test]
    fn test_remote_wins_over_metro() {
        assert_eq!(normalize_location(Some("Remote - New York")), "remote");
    }

    #[test]
    fn test_new_york_maps_to_nyc_metro() {
        assert_eq!(normalize_location(Some("New York, NY")), "metro_nyc");
    }

    #[test]
    fn test_metro_table_order_decides_overlaps() {
        // "albany, ny" sits after the NYC keywords but nothing earlier matches it.
        assert_eq!(normalize_location(Some("Albany, NY")), "metro_albany");
        // "sf" is an early, short keyword and absorbs any location containing it.
        assert_eq!(normalize_location(Some("Kingsford, MI")), "metro_sf_bay");
    }

    #[test]
    fn test_state_abbreviation_beats_state_name() {
        // "Washington" would map to WA, but the abbreviation is checked first.
        assert_eq!(normalize_location(Some("Spokane, Washington OR")), "state_OR");
    }

    #[test]
    fn test_state_abbreviation_is_whole_word() {
        assert_eq!(normalize_location(Some("Tulsa, OK")), "state_OK");
        assert_eq!(normalize_location(Some("Toledo, Ohio")), "state_OH");
    }

    #[test]
    fn test_unrecognised_location_is_other_us() {
        assert_eq!(normalize_location(Some("United States")), "other_us");
        assert_eq!(normalize_location(Some("")), "other_us");
    }

    #[test]
    fn test_canonical_values_pass_through() {
        for value in ["metro_nyc", "state_TX", "remote", "other_us", "unknown"] {
            assert_eq!(normalize_location(Some(value)), value);
        }
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let inputs = [
            "New York, NY",
            "Austin, TX",
            "Springfield, Illinois",
            "Anywhere",
            "Remote",
            "",
            "Boise, ID",
            "United States",
            "washington, dc",
        ];
        for input in inputs {
            let once = normalize_location(Some(input));
            let twice = normalize_location(Some(&once));
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }
}
