use crate::advice::{AlertEvaluator, FertilizerAdvisor};
use crate::api::responses::{
    BinaryQuery, BinaryResponse, CompareResponse, ConditionResponse, ConnectionResponse,
    DashboardResponse, ErrorCode, ErrorResponse, ForecastResponse, HealthStatus,
    HealthSuccessResponse, RecommendRequest, RecommendResponse, RefreshResponse, TrendsResponse,
};
use crate::provider::{SensorProvider, run_refresh_cycle};
use crate::recommend::RecommendationEngine;
use crate::recommend::binary_code::BinaryCodeRecommender;
use crate::soil::condition::ConditionClassifier;
use crate::soil::health::HealthScorer;
use crate::soil::Parameter;
use crate::state::AppState;
use crate::trends::{TrendAnalyzer, forecast_all, summarize};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
const FALLBACK_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

/// Body of every endpoint: a success payload or a coded error.
pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_dashboard(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    run_blocking("/api/dashboard", move || {
        build_dashboard_response(&state, OffsetDateTime::now_utc())
    })
    .await
}

pub async fn post_recommend(
    State(state): State<Arc<RwLock<AppState>>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> impl IntoResponse {
    let now = OffsetDateTime::now_utc();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_input::<RecommendResponse>(rejection.body_text(), now),
    };
    let engine = match read_engine(&state, "/api/recommend") {
        Ok(engine) => engine,
        Err(response) => return response,
    };
    run_blocking("/api/recommend", move || {
        build_recommend_response(&engine, &request, now)
    })
    .await
}

pub async fn post_compare(
    State(state): State<Arc<RwLock<AppState>>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> impl IntoResponse {
    let now = OffsetDateTime::now_utc();
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_input::<CompareResponse>(rejection.body_text(), now),
    };
    let engine = match read_engine(&state, "/api/recommend/compare") {
        Ok(engine) => engine,
        Err(response) => return response,
    };
    run_blocking("/api/recommend/compare", move || {
        build_compare_response(&engine, &request, now)
    })
    .await
}

pub async fn get_binary(query: Result<Query<BinaryQuery>, QueryRejection>) -> impl IntoResponse {
    let now = OffsetDateTime::now_utc();
    match query {
        Ok(Query(query)) => build_binary_response(query, now),
        Err(rejection) => invalid_input(rejection.body_text(), now),
    }
}

pub async fn get_refresh(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    run_blocking("/api/refresh", move || {
        build_refresh_response(&state, OffsetDateTime::now_utc())
    })
    .await
}

pub async fn get_trends(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_trends_response(&state, OffsetDateTime::now_utc())
}

pub async fn get_forecast(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_forecast_response(&state, OffsetDateTime::now_utc())
}

pub async fn get_test_connection(
    State(state): State<Arc<RwLock<AppState>>>,
) -> impl IntoResponse {
    let provider = match state.read() {
        Ok(guard) => guard.provider(),
        Err(_) => {
            return internal_error::<ConnectionResponse>(
                "/api/test_connection",
                "state lock poisoned while reading provider",
            );
        }
    };
    run_blocking("/api/test_connection", move || {
        build_connection_response(provider.as_deref(), OffsetDateTime::now_utc())
    })
    .await
}

pub async fn get_health(State(state): State<Arc<RwLock<AppState>>>) -> impl IntoResponse {
    build_health_response(&state, OffsetDateTime::now_utc())
}

/// Classifier and datastore calls block on HTTP, so they leave the runtime.
async fn run_blocking<T, F>(endpoint: &'static str, build: F) -> ApiResponse<T>
where
    T: Send + 'static,
    F: FnOnce() -> ApiResponse<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(build).await {
        Ok(response) => response,
        Err(err) => {
            error!(error = %err, endpoint, "Blocking task failed");
            internal_error(endpoint, "blocking task failed")
        }
    }
}

fn read_engine<T>(
    state: &Arc<RwLock<AppState>>,
    endpoint: &str,
) -> Result<Arc<RecommendationEngine>, ApiResponse<T>> {
    match state.read() {
        Ok(guard) => Ok(guard.engine()),
        Err(_) => Err(internal_error(
            endpoint,
            "state lock poisoned while reading engine",
        )),
    }
}

fn build_dashboard_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<DashboardResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error(
                "/api/dashboard",
                "state lock poisoned while reading latest snapshot",
            );
        }
    };
    let metrics = guard.latest().cloned();
    let refreshed_at = guard.refreshed_at();
    let engine = guard.engine();
    drop(guard);

    let Some(metrics) = metrics else {
        return no_data("No sensor snapshot available yet", now);
    };

    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/dashboard", "timestamp formatting failure"),
    };
    let refreshed_at = match refreshed_at.map(format_timestamp).transpose() {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/dashboard", "refresh timestamp formatting failure"),
    };

    let classifier = ConditionClassifier::default();
    let conditions = Parameter::ALL
        .iter()
        .map(|parameter| condition(&classifier, *parameter, metrics.value(*parameter)))
        .collect();

    ApiResponse::Success(DashboardResponse {
        health_score: HealthScorer::default().score(&metrics),
        conditions,
        out_of_range: metrics.out_of_range(),
        recommendation: engine.recommend(&metrics),
        alerts: AlertEvaluator::default().evaluate(&metrics),
        fertilizer: FertilizerAdvisor::default().advise(metrics.n, metrics.p, metrics.k),
        model_loaded: engine.model_loaded(),
        refreshed_at,
        metrics,
        timestamp,
    })
}

fn build_recommend_response(
    engine: &RecommendationEngine,
    request: &RecommendRequest,
    now: OffsetDateTime,
) -> ApiResponse<RecommendResponse> {
    let metrics = request.metrics();
    if !metrics.is_finite() {
        return invalid_input("All soil values must be finite numbers", now);
    }
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/recommend", "timestamp formatting failure"),
    };

    let classifier = ConditionClassifier::default();
    ApiResponse::Success(RecommendResponse {
        input: *request,
        recommendation: engine.recommend(&metrics),
        fertilizer: FertilizerAdvisor::default().advise(metrics.n, metrics.p, metrics.k),
        ph_condition: condition(&classifier, Parameter::Ph, metrics.ph),
        humidity_condition: condition(&classifier, Parameter::Humidity, metrics.humidity),
        health_score: HealthScorer::default().score(&metrics),
        timestamp,
    })
}

fn build_compare_response(
    engine: &RecommendationEngine,
    request: &RecommendRequest,
    now: OffsetDateTime,
) -> ApiResponse<CompareResponse> {
    let metrics = request.metrics();
    if !metrics.is_finite() {
        return invalid_input("All soil values must be finite numbers", now);
    }
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/recommend/compare", "timestamp formatting failure"),
    };

    ApiResponse::Success(CompareResponse {
        input: *request,
        strategies: engine.compare(&metrics),
        binary_code: BinaryCodeRecommender.recommend_npk(metrics.n, metrics.p, metrics.k),
        timestamp,
    })
}

fn build_binary_response(query: BinaryQuery, now: OffsetDateTime) -> ApiResponse<BinaryResponse> {
    if ![query.n, query.p, query.k].iter().all(|value| value.is_finite()) {
        return invalid_input("n, p and k must be finite numbers", now);
    }
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/binary", "timestamp formatting failure"),
    };

    let recommender = BinaryCodeRecommender;
    ApiResponse::Success(BinaryResponse {
        recommendation: recommender.recommend_npk(query.n, query.p, query.k),
        npk_status: recommender.npk_status(query.n, query.p, query.k),
        timestamp,
    })
}

fn build_refresh_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<RefreshResponse> {
    let metrics = match run_refresh_cycle(state) {
        Ok(metrics) => metrics,
        Err(err) => {
            return internal_error("/api/refresh", &format!("refresh cycle failed: {err}"));
        }
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/refresh", "timestamp formatting failure"),
    };

    let connected = metrics.connected;
    ApiResponse::Success(RefreshResponse {
        connected,
        metrics: connected.then_some(metrics),
        timestamp,
    })
}

fn build_trends_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<TrendsResponse> {
    let history = match state.read() {
        Ok(guard) => guard.history().to_vec(),
        Err(_) => {
            return internal_error("/api/trends", "state lock poisoned while reading history");
        }
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/trends", "timestamp formatting failure"),
    };

    ApiResponse::Success(TrendsResponse {
        trends: TrendAnalyzer.classify(&history),
        statistics: summarize(&history),
        has_data: !history.is_empty(),
        data_count: history.len(),
        timestamp,
    })
}

fn build_forecast_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<ForecastResponse> {
    let (history, horizons) = match state.read() {
        Ok(guard) => (guard.history().to_vec(), guard.forecast_horizons().to_vec()),
        Err(_) => {
            return internal_error("/api/forecast", "state lock poisoned while reading history");
        }
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/forecast", "timestamp formatting failure"),
    };

    ApiResponse::Success(ForecastResponse {
        forecasts: forecast_all(&history, &horizons),
        horizons_hours: horizons,
        timestamp,
    })
}

fn build_connection_response(
    provider: Option<&dyn SensorProvider>,
    now: OffsetDateTime,
) -> ApiResponse<ConnectionResponse> {
    let (success, count) = match provider.map(|provider| provider.all()) {
        Some(Ok(Some(records))) if !records.is_empty() => (true, records.len()),
        Some(Ok(_)) => (false, 0),
        Some(Err(err)) => {
            warn!(error = %err, "Datastore connection test failed");
            (false, 0)
        }
        None => (false, 0),
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/test_connection", "timestamp formatting failure"),
    };

    ApiResponse::Success(ConnectionResponse {
        success,
        count,
        timestamp,
    })
}

fn build_health_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<HealthSuccessResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/health", "state lock poisoned while reading snapshot");
        }
    };
    let connected = guard.latest().is_some_and(|metrics| metrics.connected);
    let model_loaded = guard.engine().model_loaded();
    let refreshed_at = guard.refreshed_at();
    drop(guard);

    let (timestamp, last_refresh) =
        match (format_timestamp(now), refreshed_at.map(format_timestamp).transpose()) {
            (Ok(timestamp), Ok(last_refresh)) => (timestamp, last_refresh),
            _ => return internal_error("/api/health", "timestamp formatting failure"),
        };

    let status = if connected {
        HealthStatus::Ok
    } else {
        HealthStatus::Degraded
    };

    ApiResponse::Success(HealthSuccessResponse {
        status,
        model_loaded,
        connected,
        last_refresh,
        timestamp,
    })
}

fn condition(classifier: &ConditionClassifier, parameter: Parameter, value: f64) -> ConditionResponse {
    let tier = classifier.classify(value, parameter);
    ConditionResponse {
        parameter,
        value,
        tier,
        label: tier.label(),
        severity: tier.severity(),
    }
}

fn no_data<T>(message: &str, now: OffsetDateTime) -> ApiResponse<T> {
    coded_error(StatusCode::SERVICE_UNAVAILABLE, ErrorCode::NoData, message.to_string(), now)
}

fn invalid_input<T>(message: impl Into<String>, now: OffsetDateTime) -> ApiResponse<T> {
    let message = message.into();
    warn!(message = %message, "Rejected invalid input");
    coded_error(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, message, now)
}

fn coded_error<T>(
    status: StatusCode,
    error_code: ErrorCode,
    error_message: String,
    now: OffsetDateTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ErrorResponse {
                error_code,
                error_message,
                timestamp,
            },
        },
        Err(_) => internal_error("error response", "timestamp formatting failure"),
    }
}

fn internal_error<T>(endpoint: &str, message: &str) -> ApiResponse<T> {
    error!(message = message, "Internal error while handling {}", endpoint);
    let formatted = format_timestamp(OffsetDateTime::now_utc()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        FALLBACK_TIMESTAMP.to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, TimestampError> {
    timestamp.format(&Rfc3339).map_err(TimestampError::Format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::fertilizer::OPTIMAL_MESSAGE;
    use crate::provider::mock::MockProvider;
    use crate::recommend::RecommendationSource;
    use crate::recommend::binary_code::NutrientLevel;
    use crate::soil::SoilMetrics;
    use crate::soil::condition::Tier;
    use crate::trends::Trend;
    use crate::trends::fixtures::daily_npk;
    use serde_json::json;
    use std::collections::BTreeMap;
    use time::Duration;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    fn shared(app_state: AppState) -> Arc<RwLock<AppState>> {
        Arc::new(RwLock::new(app_state))
    }

    fn poisoned() -> Arc<RwLock<AppState>> {
        let state = shared(AppState::new());
        let state_for_thread = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = state_for_thread.write().expect("lock for poison");
            panic!("poison lock");
        })
        .join();
        state
    }

    fn request(nitrogen: f64, phosphorus: f64, potassium: f64, ph: f64, humidity: f64) -> RecommendRequest {
        RecommendRequest {
            nitrogen,
            phosphorus,
            potassium,
            ph,
            humidity,
        }
    }

    fn expect_error<T>(response: ApiResponse<T>) -> (StatusCode, ErrorResponse) {
        match response {
            ApiResponse::Error { status, body } => (status, body),
            ApiResponse::Success(_) => panic!("expected error response"),
        }
    }

    fn expect_success<T>(response: ApiResponse<T>) -> T {
        match response {
            ApiResponse::Success(body) => body,
            ApiResponse::Error { status, body } => {
                panic!("expected success response, got {status}: {}", body.error_message)
            }
        }
    }

    #[test]
    fn dashboard_returns_no_data_before_first_refresh() {
        let state = shared(AppState::new());

        let (status, body) = expect_error(build_dashboard_response(&state, at(1)));

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error_code, ErrorCode::NoData);
        assert_eq!(body.timestamp, "1970-01-01T00:00:01Z");
    }

    #[test]
    fn dashboard_scores_latest_snapshot() {
        let mut app_state = AppState::new();
        app_state.set_latest(
            SoilMetrics::new(100.0, 30.0, 120.0, 6.5, 60.0).with_timestamp("2024-01-15T10:00:00"),
        );
        let state = shared(app_state);

        let body = expect_success(build_dashboard_response(&state, at(2)));

        assert_eq!(body.health_score, 100.0);
        assert_eq!(body.conditions.len(), 5);
        assert!(body.conditions.iter().all(|c| c.tier == Tier::Optimal));
        assert!(body.out_of_range.is_empty());
        assert_eq!(body.alerts.danger_count, 0);
        assert_eq!(body.fertilizer, vec![OPTIMAL_MESSAGE.to_string()]);
        assert_eq!(body.recommendation.source, RecommendationSource::Expert);
        assert_eq!(body.recommendation.confidence, 0.0);
        assert!(!body.model_loaded);
        assert!(body.refreshed_at.is_some());
        assert_eq!(body.timestamp, "1970-01-01T00:00:02Z");
    }

    #[test]
    fn dashboard_reports_danger_alerts() {
        let mut app_state = AppState::new();
        app_state.set_latest(SoilMetrics::new(10.0, 30.0, 120.0, 4.0, 60.0));
        let state = shared(app_state);

        let body = expect_success(build_dashboard_response(&state, at(3)));

        assert_eq!(body.alerts.danger_count, 2);
        assert_eq!(body.conditions[0].tier, Tier::CriticalLow);
        assert_eq!(body.conditions[0].label, "Critical: Too Low");
        assert_eq!(body.conditions[3].severity, "critical");
    }

    #[test]
    fn dashboard_returns_internal_error_when_lock_poisoned() {
        let (status, body) = expect_error(build_dashboard_response(&poisoned(), at(4)));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_code, ErrorCode::InternalError);
        assert_eq!(body.error_message, "Internal server error");
    }

    #[test]
    fn recommend_returns_conditions_and_advice() {
        let engine = RecommendationEngine::expert_only();

        let body = expect_success(build_recommend_response(
            &engine,
            &request(50.0, 30.0, 170.0, 5.5, 60.0),
            at(5),
        ));

        assert_eq!(body.recommendation.source, RecommendationSource::Expert);
        assert_eq!(
            body.fertilizer,
            vec![
                "Apply Nitrogen fertilizer (Urea 46-0-0): 50-100 kg/ha".to_string(),
                "Reduce Potassium application".to_string(),
            ]
        );
        assert_eq!(body.ph_condition.parameter, Parameter::Ph);
        assert_eq!(body.ph_condition.tier, Tier::Warning);
        assert_eq!(body.humidity_condition.tier, Tier::Optimal);
        assert_eq!(body.timestamp, "1970-01-01T00:00:05Z");
    }

    #[test]
    fn recommend_rejects_non_finite_input() {
        let engine = RecommendationEngine::expert_only();

        let (status, body) = expect_error(build_recommend_response(
            &engine,
            &request(f64::NAN, 30.0, 120.0, 6.5, 60.0),
            at(6),
        ));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
    }

    #[test]
    fn compare_runs_every_strategy_in_order() {
        let engine = RecommendationEngine::expert_only();

        let body = expect_success(build_compare_response(
            &engine,
            &request(200.0, 10.0, 120.0, 6.5, 80.0),
            at(7),
        ));

        let sources: Vec<_> = body.strategies.iter().map(|s| s.source).collect();
        assert_eq!(
            sources,
            vec![
                RecommendationSource::Model,
                RecommendationSource::Expert,
                RecommendationSource::BinaryCode,
                RecommendationSource::SimpleRule,
            ]
        );
        assert!(body.strategies[0].recommendation.is_none());
        assert_eq!(body.binary_code.code, "11111");
        assert_eq!(body.binary_code.crops.len(), 8);
    }

    #[test]
    fn binary_reports_code_and_npk_status() -> Result<(), Box<dyn std::error::Error>> {
        let body = expect_success(build_binary_response(
            BinaryQuery {
                n: 200.0,
                p: 5.0,
                k: 20.0,
            },
            at(8),
        ));

        assert_eq!(body.recommendation.code, "11010");
        assert_eq!(body.npk_status.nitrogen, NutrientLevel::High);
        assert_eq!(body.npk_status.phosphorus, NutrientLevel::Medium);
        assert_eq!(body.npk_status.potassium, NutrientLevel::Low);

        let json = serde_json::to_value(&body)?;
        assert_eq!(json["code"], "11010");
        assert_eq!(json["npk_status"]["N"], "HIGH");
        Ok(())
    }

    #[test]
    fn binary_rejects_non_finite_query() {
        let (status, body) = expect_error(build_binary_response(
            BinaryQuery {
                n: f64::INFINITY,
                p: 5.0,
                k: 20.0,
            },
            at(9),
        ));

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_code, ErrorCode::InvalidInput);
    }

    #[test]
    fn refresh_publishes_live_snapshot() {
        let mut records = BTreeMap::new();
        records.insert(
            "-Nb1".to_string(),
            json!({"N": 90, "P": 25, "K": 110, "ph": 6.4, "humidity": 60, "timestamp": "2024-01-15T10:00:00"}),
        );
        let mut app_state = AppState::new();
        app_state.set_provider(Arc::new(MockProvider::with_records(records)));
        let state = shared(app_state);

        let body = expect_success(build_refresh_response(&state, at(10)));

        assert!(body.connected);
        let metrics = body.metrics.expect("connected refresh carries metrics");
        assert_eq!(metrics.n, 90.0);
        assert_eq!(metrics.timestamp, "2024-01-15T10:00:00");
        let guard = state.read().expect("state lock");
        assert_eq!(guard.latest().map(|m| m.connected), Some(true));
        assert_eq!(guard.history().len(), 1);
    }

    #[test]
    fn refresh_without_provider_reports_disconnected() {
        let state = shared(AppState::new());

        let body = expect_success(build_refresh_response(&state, at(11)));

        assert!(!body.connected);
        assert!(body.metrics.is_none());
    }

    #[test]
    fn trends_without_history_are_stable() {
        let state = shared(AppState::new());

        let body = expect_success(build_trends_response(&state, at(12)));

        assert!(!body.has_data);
        assert_eq!(body.data_count, 0);
        assert_eq!(body.trends.nitrogen, Trend::Stable);
    }

    #[test]
    fn trends_classify_history() {
        let mut app_state = AppState::new();
        app_state.set_history(daily_npk(&[
            (50.0, 30.0, 100.0),
            (50.0, 30.0, 100.0),
            (50.0, 30.0, 100.0),
            (80.0, 30.0, 60.0),
            (80.0, 30.0, 60.0),
            (80.0, 30.0, 60.0),
        ]));
        let state = shared(app_state);

        let body = expect_success(build_trends_response(&state, at(13)));

        assert!(body.has_data);
        assert_eq!(body.data_count, 6);
        assert_eq!(body.trends.nitrogen, Trend::Increasing);
        assert_eq!(body.trends.phosphorus, Trend::Stable);
        assert_eq!(body.trends.potassium, Trend::Decreasing);
        assert_eq!(body.statistics.sample_count, 6);
    }

    #[test]
    fn forecast_uses_configured_horizons() {
        let mut app_state = AppState::new();
        app_state.set_history(daily_npk(&[(10.0, 20.0, 100.0), (20.0, 20.0, 100.0), (30.0, 20.0, 100.0)]));
        app_state.set_forecast_horizons(vec![24]);
        let state = shared(app_state);

        let body = expect_success(build_forecast_response(&state, at(14)));

        assert_eq!(body.horizons_hours, vec![24]);
        // Temperature is never recorded by the fixture.
        assert_eq!(body.forecasts.len(), 5);
        assert!(body.forecasts.iter().all(|f| f.forecasts.len() == 1));
        assert_eq!(body.forecasts[0].forecasts[0].predicted, 50.0);
    }

    #[test]
    fn forecast_without_history_is_empty() {
        let state = shared(AppState::new());

        let body = expect_success(build_forecast_response(&state, at(15)));

        assert!(body.forecasts.is_empty());
    }

    #[test]
    fn connection_test_counts_records() {
        let mut records = BTreeMap::new();
        records.insert("a".to_string(), json!({"N": 1}));
        records.insert("b".to_string(), json!({"N": 2}));
        let provider = MockProvider::with_records(records);

        let body = expect_success(build_connection_response(Some(&provider), at(16)));

        assert!(body.success);
        assert_eq!(body.count, 2);
    }

    #[test]
    fn connection_test_reports_failure() {
        let provider = MockProvider::failing("connection refused");

        let failed = expect_success(build_connection_response(Some(&provider), at(17)));
        let missing = expect_success(build_connection_response(None, at(17)));

        assert!(!failed.success);
        assert!(!missing.success);
    }

    #[test]
    fn connection_test_fails_on_empty_datastore() {
        let body = expect_success(build_connection_response(Some(&MockProvider::empty()), at(17)));

        assert!(!body.success);
        assert_eq!(body.count, 0);
    }

    #[test]
    fn health_is_degraded_before_first_refresh() {
        let state = shared(AppState::new());

        let body = expect_success(build_health_response(&state, at(18)));

        assert_eq!(body.status, HealthStatus::Degraded);
        assert!(!body.connected);
        assert!(body.last_refresh.is_none());
        assert_eq!(body.timestamp, "1970-01-01T00:00:18Z");
    }

    #[test]
    fn health_is_ok_when_connected() {
        let mut app_state = AppState::new();
        app_state.set_latest(SoilMetrics::new(90.0, 25.0, 110.0, 6.4, 60.0));
        let state = shared(app_state);

        let body = expect_success(build_health_response(&state, at(19)));

        assert_eq!(body.status, HealthStatus::Ok);
        assert!(body.last_refresh.is_some());
        assert!(!body.model_loaded);
    }

    #[test]
    fn health_is_degraded_when_disconnected() {
        let mut app_state = AppState::new();
        app_state.set_latest(SoilMetrics::disconnected());
        let state = shared(app_state);

        let body = expect_success(build_health_response(&state, at(20)));

        assert_eq!(body.status, HealthStatus::Degraded);
    }

    #[test]
    fn health_returns_internal_error_when_lock_poisoned() {
        let (status, body) = expect_error(build_health_response(&poisoned(), at(21)));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_code, ErrorCode::InternalError);
    }

    #[test]
    fn error_body_serializes_screaming_codes() -> Result<(), Box<dyn std::error::Error>> {
        let (_, body) = expect_error::<()>(no_data("nothing yet", at(22)));

        let json = serde_json::to_value(&body)?;

        assert_eq!(json["error_code"], "NO_DATA");
        assert_eq!(json["timestamp"], "1970-01-01T00:00:22Z");
        Ok(())
    }
}
