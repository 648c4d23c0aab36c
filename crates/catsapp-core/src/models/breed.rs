//! Cat breed models and client-side breed summaries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Origin reported when no breed carries one.
const UNKNOWN_ORIGIN: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreedWeight {
    pub imperial: String,
    pub metric: String,
}

/// A cat breed. Characteristic scores run from 1 to 5, flags are 0 or 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatBreed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub temperament: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub life_span: Option<String>,
    #[serde(default)]
    pub adaptability: Option<u8>,
    #[serde(default)]
    pub affection_level: Option<u8>,
    #[serde(default)]
    pub child_friendly: Option<u8>,
    #[serde(default)]
    pub dog_friendly: Option<u8>,
    #[serde(default)]
    pub energy_level: Option<u8>,
    #[serde(default)]
    pub grooming: Option<u8>,
    #[serde(default)]
    pub health_issues: Option<u8>,
    #[serde(default)]
    pub intelligence: Option<u8>,
    #[serde(default)]
    pub shedding_level: Option<u8>,
    #[serde(default)]
    pub social_needs: Option<u8>,
    #[serde(default)]
    pub stranger_friendly: Option<u8>,
    #[serde(default)]
    pub vocalisation: Option<u8>,
    #[serde(default)]
    pub experimental: Option<u8>,
    #[serde(default)]
    pub hairless: Option<u8>,
    #[serde(default)]
    pub natural: Option<u8>,
    #[serde(default)]
    pub rare: Option<u8>,
    #[serde(default)]
    pub rex: Option<u8>,
    #[serde(default)]
    pub suppressed_tail: Option<u8>,
    #[serde(default)]
    pub short_legs: Option<u8>,
    #[serde(default)]
    pub hypoallergenic: Option<u8>,
    #[serde(default)]
    pub weight: Option<BreedWeight>,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
    #[serde(default)]
    pub cfa_url: Option<String>,
    #[serde(default)]
    pub vcahospitals_url: Option<String>,
    #[serde(default)]
    pub vetstreet_url: Option<String>,
}

impl CatBreed {
    pub fn is_hypoallergenic(&self) -> bool {
        self.hypoallergenic.map_or(false, |flag| flag > 0)
    }

    /// Lower bound of the metric weight range in kilograms ("3 - 5" gives 3.0).
    pub fn metric_weight(&self) -> Option<f64> {
        self.weight
            .as_ref()
            .and_then(|w| leading_number(&w.metric))
            .filter(|kg| *kg > 0.0)
    }

    pub fn origin_display(&self) -> &str {
        self.origin.as_deref().filter(|o| !o.is_empty()).unwrap_or(UNKNOWN_ORIGIN)
    }
}

/// First decimal number appearing in `text`, if any.
fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    // Only take the fraction when a digit follows the dot
    if rest[end..].starts_with('.') {
        let fraction = &rest[end + 1..];
        let digits = fraction.find(|c: char| !c.is_ascii_digit()).unwrap_or(fraction.len());
        if digits > 0 {
            end += 1 + digits;
        }
    }
    rest[..end].parse().ok()
}

/// Query parameters for the breed listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreedQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BreedQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref q) = self.q {
            if !q.is_empty() {
                params.push(("q", q.clone()));
            }
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

/// Client-side narrowing of a breed listing.
///
/// Levels must match exactly; a set flag keeps only breeds that carry the
/// trait. Unset criteria match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreedFilter {
    pub affection_level: Option<u8>,
    pub energy_level: Option<u8>,
    pub child_friendly: Option<u8>,
    pub hypoallergenic: bool,
    pub hairless: bool,
    pub natural: bool,
    pub rare: bool,
}

impl BreedFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, breed: &CatBreed) -> bool {
        let level_ok = |wanted: Option<u8>, actual: Option<u8>| wanted.map_or(true, |w| actual == Some(w));
        let flag_ok = |wanted: bool, actual: Option<u8>| !wanted || actual.map_or(false, |f| f > 0);

        level_ok(self.affection_level, breed.affection_level)
            && level_ok(self.energy_level, breed.energy_level)
            && level_ok(self.child_friendly, breed.child_friendly)
            && flag_ok(self.hypoallergenic, breed.hypoallergenic)
            && flag_ok(self.hairless, breed.hairless)
            && flag_ok(self.natural, breed.natural)
            && flag_ok(self.rare, breed.rare)
    }

    pub fn apply(&self, breeds: Vec<CatBreed>) -> Vec<CatBreed> {
        breeds.into_iter().filter(|b| self.matches(b)).collect()
    }
}

/// Summary figures over a breed listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreedStatistics {
    pub total_breeds: usize,
    pub hypoallergenic_breeds: usize,
    /// Mean of the lower metric weight bound, rounded to one decimal.
    pub average_weight: f64,
    pub most_common_origin: String,
}

impl BreedStatistics {
    pub fn from_breeds(breeds: &[CatBreed]) -> Self {
        let weights: Vec<f64> = breeds.iter().filter_map(CatBreed::metric_weight).collect();
        let average_weight = if weights.is_empty() {
            0.0
        } else {
            let mean = weights.iter().sum::<f64>() / weights.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        Self {
            total_breeds: breeds.len(),
            hypoallergenic_breeds: breeds.iter().filter(|b| b.is_hypoallergenic()).count(),
            average_weight,
            most_common_origin: most_common_origin(breeds),
        }
    }
}

/// Ties go to the origin seen last among the first appearances.
fn most_common_origin(breeds: &[CatBreed]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for origin in breeds.iter().filter_map(|b| b.origin.as_deref()) {
        if origin.is_empty() {
            continue;
        }
        let count = counts.entry(origin).or_insert(0);
        if *count == 0 {
            order.push(origin);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for origin in order {
        let count = counts[origin];
        if best.map_or(true, |(_, top)| count >= top) {
            best = Some((origin, count));
        }
    }
    best.map_or_else(|| UNKNOWN_ORIGIN.to_string(), |(origin, _)| origin.to_string())
}
