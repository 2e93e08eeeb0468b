use crate::advice::AlertReport;
use crate::recommend::binary_code::{BinaryRecommendation, NpkStatus};
use crate::recommend::{Recommendation, StrategyOutcome};
use crate::soil::condition::Tier;
use crate::soil::{Parameter, SoilMetrics};
use crate::trends::{NutrientTrends, SensorForecast, SummaryStatistics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InternalError,
    NoData,
    InvalidInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ConditionResponse {
    pub parameter: Parameter,
    pub value: f64,
    pub tier: Tier,
    pub label: &'static str,
    pub severity: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metrics: SoilMetrics,
    pub health_score: f64,
    pub conditions: Vec<ConditionResponse>,
    /// Readings outside their physically declared range.
    pub out_of_range: Vec<Parameter>,
    pub recommendation: Recommendation,
    #[serde(flatten)]
    pub alerts: AlertReport,
    pub fertilizer: Vec<String>,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct RecommendRequest {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub humidity: f64,
}

impl RecommendRequest {
    pub fn metrics(&self) -> SoilMetrics {
        SoilMetrics::new(
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.ph,
            self.humidity,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub input: RecommendRequest,
    pub recommendation: Recommendation,
    pub fertilizer: Vec<String>,
    pub ph_condition: ConditionResponse,
    pub humidity_condition: ConditionResponse,
    pub health_score: f64,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub input: RecommendRequest,
    pub strategies: Vec<StrategyOutcome>,
    /// Full ordered crop list behind the binary-code strategy.
    pub binary_code: BinaryRecommendation,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BinaryQuery {
    pub n: f64,
    pub p: f64,
    pub k: f64,
}

#[derive(Debug, Serialize)]
pub struct BinaryResponse {
    #[serde(flatten)]
    pub recommendation: BinaryRecommendation,
    pub npk_status: NpkStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SoilMetrics>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub trends: NutrientTrends,
    pub statistics: SummaryStatistics,
    pub has_data: bool,
    pub data_count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub horizons_hours: Vec<u32>,
    pub forecasts: Vec<SensorForecast>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<String>,
    pub timestamp: String,
}
