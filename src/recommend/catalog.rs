//! Crop requirement catalog used by the expert recommender.
//!
//! Declaration order is the tie-break order: when two crops reach the same
//! score the one listed first wins.

use crate::soil::{Parameter, SoilMetrics};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Whether `value` lies within `tolerance` of either bound.
    pub fn near(&self, value: f64, tolerance: f64) -> bool {
        (value - self.min).abs() <= tolerance || (value - self.max).abs() <= tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropProfile {
    pub name: &'static str,
    pub nitrogen: Range,
    pub phosphorus: Range,
    pub potassium: Range,
    pub ph: Range,
    pub humidity: Range,
}

impl CropProfile {
    const fn new(
        name: &'static str,
        nitrogen: (f64, f64),
        phosphorus: (f64, f64),
        potassium: (f64, f64),
        ph: (f64, f64),
        humidity: (f64, f64),
    ) -> Self {
        Self {
            name,
            nitrogen: Range::new(nitrogen.0, nitrogen.1),
            phosphorus: Range::new(phosphorus.0, phosphorus.1),
            potassium: Range::new(potassium.0, potassium.1),
            ph: Range::new(ph.0, ph.1),
            humidity: Range::new(humidity.0, humidity.1),
        }
    }

    pub fn requirement(&self, parameter: Parameter) -> &Range {
        match parameter {
            Parameter::Nitrogen => &self.nitrogen,
            Parameter::Phosphorus => &self.phosphorus,
            Parameter::Potassium => &self.potassium,
            Parameter::Ph => &self.ph,
            Parameter::Humidity => &self.humidity,
        }
    }

    pub fn matches(&self, metrics: &SoilMetrics) -> bool {
        Parameter::ALL
            .iter()
            .all(|parameter| self.requirement(*parameter).contains(metrics.value(*parameter)))
    }
}

pub const CROP_CATALOG: [CropProfile; 23] = [
    CropProfile::new("Sweet Potatoes", (40.0, 80.0), (15.0, 30.0), (80.0, 120.0), (5.5, 6.5), (60.0, 75.0)),
    CropProfile::new("Munggo", (20.0, 60.0), (15.0, 25.0), (40.0, 80.0), (6.0, 7.5), (60.0, 80.0)),
    CropProfile::new("Peanuts", (20.0, 50.0), (20.0, 35.0), (60.0, 100.0), (6.0, 7.0), (50.0, 70.0)),
    CropProfile::new("Sitaw", (30.0, 70.0), (20.0, 35.0), (60.0, 100.0), (6.0, 7.5), (65.0, 85.0)),
    CropProfile::new("Tomatoes", (120.0, 180.0), (30.0, 50.0), (150.0, 200.0), (6.0, 7.0), (60.0, 80.0)),
    CropProfile::new("Lettuce", (80.0, 120.0), (20.0, 35.0), (100.0, 140.0), (6.0, 7.0), (70.0, 85.0)),
    CropProfile::new("Eggplant", (100.0, 150.0), (25.0, 45.0), (120.0, 180.0), (6.0, 7.0), (60.0, 80.0)),
    CropProfile::new("Chili", (80.0, 120.0), (25.0, 40.0), (100.0, 150.0), (6.0, 7.0), (50.0, 70.0)),
    CropProfile::new("Cabbage", (100.0, 140.0), (25.0, 40.0), (120.0, 160.0), (6.0, 7.0), (65.0, 85.0)),
    CropProfile::new("Bell Peppers", (100.0, 140.0), (25.0, 45.0), (120.0, 180.0), (6.0, 7.0), (60.0, 80.0)),
    CropProfile::new("Broccoli", (120.0, 160.0), (30.0, 50.0), (140.0, 180.0), (6.0, 7.0), (65.0, 85.0)),
    CropProfile::new("Corn", (100.0, 150.0), (25.0, 45.0), (100.0, 140.0), (6.0, 7.5), (50.0, 70.0)),
    CropProfile::new("Kangkong", (80.0, 120.0), (15.0, 30.0), (60.0, 100.0), (5.0, 7.0), (75.0, 95.0)),
    CropProfile::new("Mustasa", (80.0, 120.0), (20.0, 35.0), (100.0, 140.0), (6.0, 7.0), (70.0, 85.0)),
    CropProfile::new("Garlic", (60.0, 100.0), (20.0, 35.0), (80.0, 120.0), (6.0, 7.5), (60.0, 75.0)),
    CropProfile::new("Radish", (60.0, 100.0), (15.0, 30.0), (80.0, 120.0), (6.0, 7.0), (65.0, 80.0)),
    CropProfile::new("Carrots", (80.0, 120.0), (20.0, 40.0), (100.0, 140.0), (6.0, 7.0), (65.0, 80.0)),
    CropProfile::new("Potatoes", (100.0, 140.0), (25.0, 45.0), (120.0, 180.0), (5.5, 6.5), (60.0, 80.0)),
    CropProfile::new("Banana", (200.0, 300.0), (30.0, 50.0), (400.0, 600.0), (5.5, 7.0), (75.0, 85.0)),
    CropProfile::new("Onion", (80.0, 120.0), (20.0, 40.0), (100.0, 150.0), (6.0, 7.5), (60.0, 75.0)),
    CropProfile::new("Okra", (60.0, 100.0), (20.0, 35.0), (80.0, 120.0), (6.0, 7.5), (50.0, 70.0)),
    CropProfile::new("Bokchoy", (80.0, 120.0), (20.0, 35.0), (100.0, 140.0), (6.0, 7.0), (70.0, 85.0)),
    CropProfile::new("Rice", (80.0, 120.0), (20.0, 40.0), (80.0, 120.0), (5.5, 7.0), (70.0, 90.0)),
];

pub fn find_crop(name: &str) -> Option<&'static CropProfile> {
    CROP_CATALOG
        .iter()
        .find(|profile| profile.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ranges_are_ordered() {
        for profile in &CROP_CATALOG {
            for parameter in Parameter::ALL {
                let range = profile.requirement(parameter);
                assert!(range.min <= range.max, "{} {parameter:?}", profile.name);
            }
        }
    }

    #[test]
    fn catalog_names_are_unique() {
        for (index, profile) in CROP_CATALOG.iter().enumerate() {
            assert!(
                CROP_CATALOG[index + 1..]
                    .iter()
                    .all(|other| other.name != profile.name),
                "duplicate {}",
                profile.name
            );
        }
    }

    #[test]
    fn find_crop_is_case_insensitive() {
        assert_eq!(find_crop("bell peppers").map(|p| p.name), Some("Bell Peppers"));
        assert!(find_crop("Durian").is_none());
    }

    #[test]
    fn near_uses_either_bound() {
        let range = Range::new(60.0, 80.0);

        assert!(range.near(40.0, 20.0));
        assert!(range.near(100.0, 20.0));
        assert!(!range.near(39.9, 20.0));
        assert!(!range.near(100.1, 20.0));
    }
}
