//! Static location resolution.
//!
//! A built-in table of major cities and airport codes. Lookup order: exact
//! code, exact city name, then partial city-name match. A city that maps to
//! several airports returns them all so the conversation can disambiguate.

use std::collections::{HashMap, HashSet};

use crate::domain::search::LocationCode;
use crate::ports::LocationResolver;

/// City-name table entries: (name, codes).
const CITIES: &[(&str, &[&str])] = &[
    ("new york", &["NYC"]),
    ("new york city", &["NYC"]),
    ("london", &["LON"]),
    ("paris", &["PAR"]),
    ("tokyo", &["TYO"]),
    ("rome", &["ROM"]),
    ("madrid", &["MAD"]),
    ("berlin", &["BER"]),
    ("amsterdam", &["AMS"]),
    ("boston", &["BOS"]),
    ("chicago", &["CHI"]),
    ("miami", &["MIA"]),
    ("los angeles", &["LAX"]),
    ("san francisco", &["SFO"]),
    ("seattle", &["SEA"]),
    ("denver", &["DEN"]),
    ("dallas", &["DFW"]),
    ("atlanta", &["ATL"]),
    ("toronto", &["YTO"]),
    ("sydney", &["SYD"]),
    ("dubai", &["DXB"]),
    ("singapore", &["SIN"]),
    ("hong kong", &["HKG"]),
    ("sao paulo", &["SAO"]),
    ("mexico city", &["MEX"]),
    // Genuinely ambiguous names stay ambiguous.
    ("san jose", &["SJC", "SJO"]),
    ("birmingham", &["BHM", "BHX"]),
];

/// Known codes beyond those in the city table.
const EXTRA_CODES: &[&str] = &[
    "JFK", "EWR", "LGA", "LHR", "LGW", "CDG", "ORY", "HND", "NRT", "FCO", "ORD", "MDW",
];

const PARTIAL_MATCH_CAP: usize = 5;

pub struct StaticLocationResolver {
    cities: HashMap<&'static str, &'static [&'static str]>,
    codes: HashSet<&'static str>,
}

impl Default for StaticLocationResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticLocationResolver {
    pub fn new() -> Self {
        let cities: HashMap<_, _> = CITIES.iter().copied().collect();
        let mut codes: HashSet<&'static str> = EXTRA_CODES.iter().copied().collect();
        for codes_for_city in cities.values() {
            codes.extend(codes_for_city.iter().copied());
        }
        Self { cities, codes }
    }
}

impl LocationResolver for StaticLocationResolver {
    fn resolve(&self, name: &str) -> Vec<LocationCode> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        // Exact code, e.g. "JFK".
        let upper = query.to_uppercase();
        if self.codes.contains(upper.as_str()) {
            return vec![LocationCode::new(upper)];
        }

        // Exact city name.
        if let Some(codes) = self.cities.get(query.as_str()) {
            return codes.iter().map(|c| LocationCode::new(*c)).collect();
        }

        // Partial city name, capped so "san" does not flood the reply.
        let mut matches: Vec<LocationCode> = self
            .cities
            .iter()
            .filter(|(city, _)| city.contains(query.as_str()))
            .flat_map(|(_, codes)| codes.iter().map(|c| LocationCode::new(*c)))
            .collect();
        matches.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        matches.dedup();
        if matches.len() > PARTIAL_MATCH_CAP {
            matches.truncate(PARTIAL_MATCH_CAP);
        }
        matches
    }
}
