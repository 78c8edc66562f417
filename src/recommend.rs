//! Maize variety catalog and per-location ranking.

use crate::environment::EnvironmentalReading;

/// A certified maize seed variety
#[derive(Clone, Debug, PartialEq)]
pub struct SeedVariety {
    pub id: &'static str,
    pub name: &'static str,
    pub company: &'static str,
    /// Catalog score before local adjustment
    pub base_score: u32,
    pub maturity: &'static str,
    pub yield_range: &'static str,
    /// Rainfall band the variety is bred for, mm
    pub rainfall_mm: (u32, u32),
    /// Altitude band, m
    pub altitude_m: (u32, u32),
    pub traits: &'static [&'static str],
    pub description: &'static str,
}

pub static CATALOG: [SeedVariety; 5] = [
    SeedVariety {
        id: "dh04",
        name: "DH04",
        company: "Western Seed Company",
        base_score: 92,
        maturity: "115-125 days",
        yield_range: "30-35 bags/acre",
        rainfall_mm: (800, 1200),
        altitude_m: (1500, 2400),
        traits: &["High Yield", "Medium Maturity", "Disease Resistant"],
        description: "Excellent performer in high-altitude areas with good rainfall.",
    },
    SeedVariety {
        id: "h614",
        name: "H614",
        company: "Kenya Seed Company",
        base_score: 88,
        maturity: "120-130 days",
        yield_range: "28-32 bags/acre",
        rainfall_mm: (600, 1000),
        altitude_m: (1200, 2200),
        traits: &["Drought Resistant", "Long Maturity", "High Quality Grain"],
        description: "Ideal for areas with variable rainfall patterns.",
    },
    SeedVariety {
        id: "kh500",
        name: "KH500",
        company: "Kenya Highlands Seed",
        base_score: 85,
        maturity: "90-100 days",
        yield_range: "25-30 bags/acre",
        rainfall_mm: (700, 1100),
        altitude_m: (1000, 2400),
        traits: &["Early Maturity", "Fast Growing", "Good Adaptability"],
        description: "Short season planting and early harvest.",
    },
    SeedVariety {
        id: "ph3253",
        name: "PH3253",
        company: "Pioneer Seeds",
        base_score: 83,
        maturity: "110-120 days",
        yield_range: "27-33 bags/acre",
        rainfall_mm: (750, 1150),
        altitude_m: (1300, 2300),
        traits: &["Disease Resistant", "Strong Stalks", "Good Grain Fill"],
        description: "Robust variety for areas with disease pressure.",
    },
    SeedVariety {
        id: "sc627",
        name: "SC627",
        company: "Seed Co Kenya",
        base_score: 80,
        maturity: "105-115 days",
        yield_range: "26-31 bags/acre",
        rainfall_mm: (700, 1100),
        altitude_m: (1200, 2300),
        traits: &["All-round", "Balanced Performance", "Good Recovery"],
        description: "Well-balanced variety with reliable performance across seasons.",
    },
];

/// Which varieties the map and recommendations list show
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VarietyFilter {
    #[default]
    All,
    Only(&'static str),
}

impl VarietyFilter {
    pub fn matches(self, variety: &SeedVariety) -> bool {
        match self {
            VarietyFilter::All => true,
            VarietyFilter::Only(id) => variety.id == id,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VarietyFilter::All => "All Varieties",
            VarietyFilter::Only(id) => CATALOG
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.name)
                .unwrap_or(id),
        }
    }

    /// All -> each catalog entry -> All
    pub fn cycle(self) -> Self {
        match self {
            VarietyFilter::All => VarietyFilter::Only(CATALOG[0].id),
            VarietyFilter::Only(id) => {
                let idx = CATALOG.iter().position(|v| v.id == id);
                match idx.and_then(|i| CATALOG.get(i + 1)) {
                    Some(next) => VarietyFilter::Only(next.id),
                    None => VarietyFilter::All,
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub variety: &'static SeedVariety,
    /// Adjusted score, 0-100
    pub score: u32,
}

fn band_penalty(value: u32, (low, high): (u32, u32), per_unit: f64) -> f64 {
    if value < low {
        (low - value) as f64 * per_unit
    } else if value > high {
        (value - high) as f64 * per_unit
    } else {
        0.0
    }
}

/// Score one variety against local conditions
pub fn score(variety: &SeedVariety, reading: &EnvironmentalReading) -> u32 {
    let mut s = variety.base_score as f64;
    s -= band_penalty(reading.rainfall_mm, variety.rainfall_mm, 0.05);
    s -= band_penalty(reading.elevation_m, variety.altitude_m, 0.02);
    // Nudge towards the location's overall suitability
    s += (reading.suitability as f64 - 80.0) * 0.2;
    s.round().clamp(0.0, 100.0) as u32
}

/// Rank the filtered catalog for a location, best first
pub fn recommend(reading: &EnvironmentalReading, filter: VarietyFilter) -> Vec<Recommendation> {
    let mut ranked: Vec<Recommendation> = CATALOG
        .iter()
        .filter(|v| filter.matches(v))
        .map(|variety| Recommendation {
            variety,
            score: score(variety, reading),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.variety.name.cmp(b.variety.name)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(rainfall_mm: u32, elevation_m: u32, suitability: u32) -> EnvironmentalReading {
        EnvironmentalReading {
            suitability,
            rainfall_mm,
            temperature_c: 22,
            ndvi: 0.7,
            soil_type: "Clay Loam",
            elevation_m,
        }
    }

    #[test]
    fn test_recommend_sorted_descending() {
        let ranked = recommend(&reading(1000, 1900, 80), VarietyFilter::All);
        assert_eq!(ranked.len(), CATALOG.len());
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].variety.id, "dh04");
    }

    #[test]
    fn test_out_of_band_rainfall_penalized() {
        let dh04 = &CATALOG[0];
        let inside = score(dh04, &reading(1000, 1900, 80));
        let wet = score(dh04, &reading(1290, 1900, 80));
        assert!(wet < inside);
    }

    #[test]
    fn test_filter_narrows_list() {
        let ranked = recommend(&reading(1000, 1900, 80), VarietyFilter::Only("h614"));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].variety.name, "H614");
    }

    #[test]
    fn test_filter_cycle_visits_every_variety() {
        let mut filter = VarietyFilter::All;
        let mut seen = Vec::new();
        loop {
            filter = filter.cycle();
            match filter {
                VarietyFilter::All => break,
                VarietyFilter::Only(id) => seen.push(id),
            }
        }
        assert_eq!(seen, ["dh04", "h614", "kh500", "ph3253", "sc627"]);
        assert_eq!(VarietyFilter::Only("kh500").label(), "KH500");
    }
}
