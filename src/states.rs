// 🗺️ State Codes - FIPS prefix → postal abbreviation, Census region/division
// Source: https://www2.census.gov/geo/pdfs/maps-data/maps/reference/us_regdiv.pdf

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    pub fips: &'static str,
    pub abbr: &'static str,
    pub name: &'static str,
    /// Census Bureau region (None for territories)
    pub region: Option<&'static str>,
    /// Census Bureau division (None for territories)
    pub division: Option<&'static str>,
}

const fn state(
    fips: &'static str,
    abbr: &'static str,
    name: &'static str,
    region: &'static str,
    division: &'static str,
) -> StateInfo {
    StateInfo {
        fips,
        abbr,
        name,
        region: Some(region),
        division: Some(division),
    }
}

const NE: &str = "Northeast";
const MW: &str = "Midwest";
const SO: &str = "South";
const WE: &str = "West";

pub const STATES: &[StateInfo] = &[
    state("01", "AL", "Alabama", SO, "East South Central"),
    state("02", "AK", "Alaska", WE, "Pacific"),
    state("04", "AZ", "Arizona", WE, "Mountain"),
    state("05", "AR", "Arkansas", SO, "West South Central"),
    state("06", "CA", "California", WE, "Pacific"),
    state("08", "CO", "Colorado", WE, "Mountain"),
    state("09", "CT", "Connecticut", NE, "New England"),
    state("10", "DE", "Delaware", SO, "South Atlantic"),
    state("11", "DC", "District of Columbia", SO, "South Atlantic"),
    state("12", "FL", "Florida", SO, "South Atlantic"),
    state("13", "GA", "Georgia", SO, "South Atlantic"),
    state("15", "HI", "Hawaii", WE, "Pacific"),
    state("16", "ID", "Idaho", WE, "Mountain"),
    state("17", "IL", "Illinois", MW, "East North Central"),
    state("18", "IN", "Indiana", MW, "East North Central"),
    state("19", "IA", "Iowa", MW, "West North Central"),
    state("20", "KS", "Kansas", MW, "West North Central"),
    state("21", "KY", "Kentucky", SO, "East South Central"),
    state("22", "LA", "Louisiana", SO, "West South Central"),
    state("23", "ME", "Maine", NE, "New England"),
    state("24", "MD", "Maryland", SO, "South Atlantic"),
    state("25", "MA", "Massachusetts", NE, "New England"),
    state("26", "MI", "Michigan", MW, "East North Central"),
    state("27", "MN", "Minnesota", MW, "West North Central"),
    state("28", "MS", "Mississippi", SO, "East South Central"),
    state("29", "MO", "Missouri", MW, "West North Central"),
    state("30", "MT", "Montana", WE, "Mountain"),
    state("31", "NE", "Nebraska", MW, "West North Central"),
    state("32", "NV", "Nevada", WE, "Mountain"),
    state("33", "NH", "New Hampshire", NE, "New England"),
    state("34", "NJ", "New Jersey", NE, "Middle Atlantic"),
    state("35", "NM", "New Mexico", WE, "Mountain"),
    state("36", "NY", "New York", NE, "Middle Atlantic"),
    state("37", "NC", "North Carolina", SO, "South Atlantic"),
    state("38", "ND", "North Dakota", MW, "West North Central"),
    state("39", "OH", "Ohio", MW, "East North Central"),
    state("40", "OK", "Oklahoma", SO, "West South Central"),
    state("41", "OR", "Oregon", WE, "Pacific"),
    state("42", "PA", "Pennsylvania", NE, "Middle Atlantic"),
    state("44", "RI", "Rhode Island", NE, "New England"),
    state("45", "SC", "South Carolina", SO, "South Atlantic"),
    state("46", "SD", "South Dakota", MW, "West North Central"),
    state("47", "TN", "Tennessee", SO, "East South Central"),
    state("48", "TX", "Texas", SO, "West South Central"),
    state("49", "UT", "Utah", WE, "Mountain"),
    state("50", "VT", "Vermont", NE, "New England"),
    state("51", "VA", "Virginia", SO, "South Atlantic"),
    state("53", "WA", "Washington", WE, "Pacific"),
    state("54", "WV", "West Virginia", SO, "South Atlantic"),
    state("55", "WI", "Wisconsin", MW, "East North Central"),
    state("56", "WY", "Wyoming", WE, "Mountain"),
    StateInfo {
        fips: "72",
        abbr: "PR",
        name: "Puerto Rico",
        region: None,
        division: None,
    },
];

/// Look up a state by its 2-digit FIPS code
pub fn by_fips(fips: &str) -> Option<&'static StateInfo> {
    STATES.iter().find(|s| s.fips == fips)
}

/// Postal abbreviation for a 2-digit FIPS code
pub fn abbreviation(fips: &str) -> Option<&'static str> {
    by_fips(fips).map(|s| s.abbr)
}
