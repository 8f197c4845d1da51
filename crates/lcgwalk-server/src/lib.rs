//! HTTP validation server.
//!
//! Generates LCG samples and runs the statistical battery over JSON, so a
//! simulation driver written in any language can fetch a validated sequence.

use axum::{
    Router,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use lcgwalk_core::{Error, GeneratorParams, Sample};
use lcgwalk_tests::{BatteryReport, DEFAULT_ALPHA, TestConfig, run_battery};

/// Largest sample a single request may generate.
pub const MAX_COUNT: usize = 1_000_000;

#[derive(Debug, Clone, Copy, Deserialize)]
struct GenerateParams {
    seed: u64,
    k: i64,
    c: i64,
    exponent: u32,
    count: usize,
}

impl GenerateParams {
    fn validate(self) -> Result<GeneratorParams, Error> {
        if self.count > MAX_COUNT {
            return Err(Error::invalid(format!(
                "count must be <= {MAX_COUNT}, got {}",
                self.count
            )));
        }
        GeneratorParams::new(self.seed, self.k, self.c, self.exponent, self.count)
    }
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    success: bool,
    count: usize,
    values: Vec<f64>,
    states: Vec<u64>,
}

#[derive(Deserialize)]
struct BatteryRequest {
    /// Generate the sample from these parameters...
    generator: Option<GenerateParams>,
    /// ...or validate caller-supplied values in [0, 1).
    data: Option<Vec<f64>>,
    alpha: Option<f64>,
    /// Test selection in the `{"means": true, "chi": {"k": 10}}` form.
    tests: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct BatteryResponse {
    success: bool,
    #[serde(flatten)]
    report: BatteryReport,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Every core error is a client error: the request carried bad input.
#[derive(Debug)]
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("rejected request: {}", self.0);
        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

async fn handle_generate(
    Query(params): Query<GenerateParams>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let sample = params.validate()?.generate();
    let states = sample.states().map(<[u64]>::to_vec).unwrap_or_default();
    Ok(Json(GenerateResponse {
        success: true,
        count: sample.len(),
        values: sample.into_values(),
        states,
    }))
}

async fn handle_battery(
    Json(req): Json<BatteryRequest>,
) -> Result<Json<BatteryResponse>, ApiError> {
    let sample = match (req.generator, req.data) {
        (Some(params), None) => params.validate()?.generate(),
        (None, Some(values)) => Sample::from_values(values)?,
        (Some(_), Some(_)) => {
            return Err(Error::invalid("send either `generator` or `data`, not both").into());
        }
        (None, None) => {
            return Err(Error::invalid("one of `generator` or `data` is required").into());
        }
    };
    let tests = req
        .tests
        .ok_or_else(|| Error::invalid("`tests` is required"))?;
    let config = TestConfig::from_json_value(&tests)?;
    if config.enabled_count() == 0 {
        return Err(Error::invalid("no tests enabled").into());
    }
    let alpha = req.alpha.unwrap_or(DEFAULT_ALPHA);

    let results = run_battery(&sample, &config, alpha)?;
    Ok(Json(BatteryResponse {
        success: true,
        report: BatteryReport::new(alpha, results),
    }))
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: lcgwalk_core::VERSION.to_string(),
    })
}

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "lcgwalk server",
        "version": lcgwalk_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/health": "Health check",
            "/api/v1/generate": {
                "method": "GET",
                "description": "Generate an LCG sample",
                "params": {
                    "seed": "Initial state x0 (>= 0)",
                    "k": "Multiplier parameter, a = 1 + 2k",
                    "c": "Additive constant",
                    "exponent": "Modulus exponent g, m = 2^g (1-64)",
                    "count": format!("Number of values (1-{MAX_COUNT})"),
                }
            },
            "/api/v1/battery": {
                "method": "POST",
                "description": "Run the statistical test battery",
                "body": {
                    "generator": "{seed, k, c, exponent, count} (or use `data`)",
                    "data": "Values in [0, 1) to validate (or use `generator`)",
                    "alpha": format!("Significance level (default: {DEFAULT_ALPHA})"),
                    "tests": r#"{"means": true, "chi_square": {"k": 10}, "poker": false, ...}"#,
                }
            },
        },
        "examples": {
            "generate": "/api/v1/generate?seed=1&k=1&c=1&exponent=4&count=5",
        }
    }))
}

/// Build the axum router.
fn build_router() -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/api/v1/generate", get(handle_generate))
        .route("/api/v1/battery", post(handle_battery))
}

/// Run the HTTP server until the listener fails.
pub async fn run_server(host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router();
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(count: usize) -> GenerateParams {
        GenerateParams {
            seed: 1,
            k: 1,
            c: 1,
            exponent: 4,
            count,
        }
    }

    #[tokio::test]
    async fn generate_returns_values_and_states() {
        let Json(resp) = handle_generate(Query(params(5))).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.count, 5);
        assert_eq!(resp.states, vec![4, 13, 8, 9, 12]);
        assert_eq!(resp.values, vec![0.25, 0.8125, 0.5, 0.5625, 0.75]);
    }

    #[tokio::test]
    async fn generate_rejects_zero_count() {
        let err = handle_generate(Query(params(0))).await.unwrap_err();
        assert!(matches!(err.0, Error::InvalidParameter(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_rejects_oversized_count() {
        let err = handle_generate(Query(params(1 << 42))).await.unwrap_err();
        assert!(matches!(err.0, Error::InvalidParameter(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        assert!(handle_generate(Query(params(MAX_COUNT))).await.is_ok());
    }

    #[tokio::test]
    async fn battery_rejects_oversized_count() {
        let req = BatteryRequest {
            generator: Some(params(MAX_COUNT + 1)),
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"means": true})),
        };
        let err = handle_battery(Json(req)).await.unwrap_err();
        assert!(matches!(err.0, Error::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn battery_from_generator() {
        let req = BatteryRequest {
            generator: Some(GenerateParams {
                seed: 7,
                k: 2,
                c: 3,
                exponent: 16,
                count: 500,
            }),
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"medias": true, "chi": {"k": 10}, "poker": false})),
        };
        let Json(resp) = handle_battery(Json(req)).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.report.total, 2);
        assert_eq!(resp.report.alpha, DEFAULT_ALPHA);

        let body = serde_json::to_value(&resp).unwrap();
        assert!(body["results"]["means"]["is_approved"].is_string());
        assert!(body["results"]["chi_square"]["statistics"]["chi2_critical"].is_number());
    }

    #[tokio::test]
    async fn battery_from_data() {
        let req = BatteryRequest {
            generator: None,
            data: Some((1..=9).map(|i| i as f64 / 10.0).collect()),
            alpha: Some(0.05),
            tests: Some(serde_json::json!({"means": true})),
        };
        let Json(resp) = handle_battery(Json(req)).await.unwrap();
        assert!(resp.report.all_approved);
        assert_eq!(resp.report.approved, 1);
    }

    #[tokio::test]
    async fn battery_errors_are_client_errors() {
        let unknown = BatteryRequest {
            generator: Some(params(20)),
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"serial": true})),
        };
        let err = handle_battery(Json(unknown)).await.unwrap_err();
        assert!(matches!(err.0, Error::UnknownTest(_)));

        let too_many_bins = BatteryRequest {
            generator: Some(params(5)),
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"chi": {"k": 10}})),
        };
        let err = handle_battery(Json(too_many_bins)).await.unwrap_err();
        assert!(matches!(err.0, Error::InvalidParameter(_)));

        let nothing_enabled = BatteryRequest {
            generator: Some(params(20)),
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"means": false})),
        };
        assert!(handle_battery(Json(nothing_enabled)).await.is_err());

        let no_source = BatteryRequest {
            generator: None,
            data: None,
            alpha: None,
            tests: Some(serde_json::json!({"means": true})),
        };
        assert!(handle_battery(Json(no_source)).await.is_err());
    }

    #[tokio::test]
    async fn health_reports_version() {
        let Json(resp) = handle_health().await;
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.version, lcgwalk_core::VERSION);
    }
}
