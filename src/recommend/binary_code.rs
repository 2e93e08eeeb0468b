//! Discretized NPK lookup recommender.
//!
//! N, P and K are reduced to a 5-character code against fixed breakpoints and
//! the code selects an ordered crop list from a 32-entry table. pH and
//! humidity play no part.
//!
//! Bit layout, most significant first:
//!
//! | bit | set when |
//! |-----|----------|
//! | 0 | `n > N_HIGH` |
//! | 1 | `n >= N_LOW` |
//! | 2 | `p > P_HIGH` |
//! | 3 | `p >= P_LOW` |
//! | 4 | `k > K_HIGH` |

use crate::recommend::{Recommendation, RecommendationSource, Recommender};
use crate::soil::SoilMetrics;
use serde::Serialize;

pub const N_LOW: f64 = 88.9;
pub const N_HIGH: f64 = 177.8;
pub const P_LOW: f64 = 4.1;
pub const P_HIGH: f64 = 8.1;
pub const K_LOW: f64 = 40.7;
pub const K_HIGH: f64 = 103.7;

pub const MATCH_CONFIDENCE: f64 = 95.0;

const CROP_TABLE: [&[&str]; 32] = [
    /* 00000 */ &[],
    /* 00001 */ &["OKRA", "GARLIC"],
    /* 00010 */ &["ONION"],
    /* 00011 */ &["SWEET POTATOES", "SITAW"],
    /* 00100 */ &[],
    /* 00101 */ &[],
    /* 00110 */ &["BANANA", "ONION"],
    /* 00111 */ &["LETTUCE", "RADISH", "SITAW"],
    /* 01000 */ &[],
    /* 01001 */ &["LETTUCE", "GARLIC"],
    /* 01010 */ &["ONION"],
    /* 01011 */ &["SITAW"],
    /* 01100 */ &[],
    /* 01101 */ &[],
    /* 01110 */ &[],
    /* 01111 */ &["LETTUCE", "CHILI", "BELL PEPPERS", "BROCCOLI", "CORN", "TOMATOES", "EGGPLANT"],
    /* 10000 */ &["CABBAGE", "CORN", "MUSTASA"],
    /* 10001 */ &["LETTUCE", "GARLIC"],
    /* 10010 */ &["LETTUCE", "CABBAGE", "MUSTASA"],
    /* 10011 */ &["TOMATOES", "CHILI", "BELL PEPPERS", "BROCCOLI", "CORN"],
    /* 10100 */ &["TOMATOES", "CABBAGE", "KANGKONG", "MUSTASA"],
    /* 10101 */ &["CHILI", "BELL PEPPERS"],
    /* 10110 */ &["BANANA", "ONION", "KANGKONG", "MUSTASA"],
    /* 10111 */ &["EGGPLANT", "CORN", "TOMATOES"],
    /* 11000 */ &["CABBAGE", "CORN", "MUSTASA"],
    /* 11001 */ &["EGGPLANT", "LETTUCE"],
    /* 11010 */ &["CABBAGE", "ONION", "MUSTASA"],
    /* 11011 */ &["TOMATOES", "EGGPLANT", "CABBAGE", "BROCCOLI", "CORN", "CHILI", "BELL PEPPERS"],
    /* 11100 */ &["TOMATOES", "CABBAGE", "KANGKONG", "MUSTASA"],
    /* 11101 */ &["CABBAGE"],
    /* 11110 */ &["CABBAGE", "ONION", "KANGKONG", "MUSTASA"],
    /* 11111 */ &["TOMATOES", "EGGPLANT", "CABBAGE", "BROCCOLI", "CORN", "CHILI", "BELL PEPPERS", "LETTUCE"],
];

/// A 5-bit NPK code, stored in the low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryCode(u8);

impl BinaryCode {
    pub fn from_npk(n: f64, p: f64, k: f64) -> Self {
        let bits = [n > N_HIGH, n >= N_LOW, p > P_HIGH, p >= P_LOW, k > K_HIGH];
        let value = bits
            .iter()
            .fold(0u8, |acc, bit| (acc << 1) | u8::from(*bit));
        Self(value)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn crops(self) -> &'static [&'static str] {
        CROP_TABLE.get(usize::from(self.0)).copied().unwrap_or(&[])
    }
}

impl std::fmt::Display for BinaryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:05b}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryRecommendation {
    pub crops: Vec<String>,
    pub code: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NutrientLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NpkStatus {
    #[serde(rename = "N")]
    pub nitrogen: NutrientLevel,
    #[serde(rename = "P")]
    pub phosphorus: NutrientLevel,
    #[serde(rename = "K")]
    pub potassium: NutrientLevel,
}

fn level(value: f64, low: f64, high: f64) -> NutrientLevel {
    if value > high {
        NutrientLevel::High
    } else if value < low {
        NutrientLevel::Low
    } else {
        NutrientLevel::Medium
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodeRecommender;

impl BinaryCodeRecommender {
    pub fn recommend_npk(&self, n: f64, p: f64, k: f64) -> BinaryRecommendation {
        let code = BinaryCode::from_npk(n, p, k);
        let crops: Vec<String> = code.crops().iter().map(|crop| crop.to_string()).collect();
        let confidence = if crops.is_empty() { 0.0 } else { MATCH_CONFIDENCE };
        BinaryRecommendation {
            crops,
            code: code.to_string(),
            confidence,
        }
    }

    pub fn npk_status(&self, n: f64, p: f64, k: f64) -> NpkStatus {
        NpkStatus {
            nitrogen: level(n, N_LOW, N_HIGH),
            phosphorus: level(p, P_LOW, P_HIGH),
            potassium: level(k, K_LOW, K_HIGH),
        }
    }
}

impl Recommender for BinaryCodeRecommender {
    fn source(&self) -> RecommendationSource {
        RecommendationSource::BinaryCode
    }

    /// First listed crop for the code; `None` when the code maps to nothing.
    fn recommend(&self, metrics: &SoilMetrics) -> Option<Recommendation> {
        let result = self.recommend_npk(metrics.n, metrics.p, metrics.k);
        let crop = result.crops.into_iter().next()?;
        Some(Recommendation {
            crop,
            confidence: result.confidence,
            source: RecommendationSource::BinaryCode,
        })
    }
}
