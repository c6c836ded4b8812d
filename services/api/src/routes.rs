use crate::infra::{load_dataset_from_reader, AppState, DataSource};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use sales_insight::error::AppError;
use sales_insight::sales::{AnalysisRequest, Hypothesis, SummaryEngine, SummaryResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryRequest {
    #[serde(default)]
    pub(crate) csv: Option<String>,
    #[serde(default = "default_field")]
    pub(crate) field: String,
    #[serde(default)]
    pub(crate) confidence_level: Option<f64>,
    #[serde(default)]
    pub(crate) alpha: Option<f64>,
    #[serde(default)]
    pub(crate) categories: Vec<String>,
    #[serde(default)]
    pub(crate) histogram_bins: Option<usize>,
    #[serde(default)]
    pub(crate) hypothesis: Option<Hypothesis>,
}

fn default_field() -> String {
    "quantity".to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    pub(crate) data_source: DataSource,
    #[serde(flatten)]
    pub(crate) summary: SummaryResult,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/sales/summary", post(summary_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn summary_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let SummaryRequest {
        csv,
        field,
        confidence_level,
        alpha,
        categories,
        histogram_bins,
        hypothesis,
    } = payload;

    let reader = csv.map(|csv| Cursor::new(csv.into_bytes()));
    let (dataset, data_source) = load_dataset_from_reader(reader)?;

    let defaults = state.analysis;
    let request = AnalysisRequest {
        field,
        confidence_level: confidence_level.unwrap_or(defaults.confidence_level),
        alpha: alpha.unwrap_or(defaults.alpha),
        categories,
        histogram_bins: histogram_bins.unwrap_or(defaults.histogram_bins),
        hypothesis,
    };

    let summary = SummaryEngine::summarize(&dataset, &request)?;
    info!(
        ?data_source,
        field = %request.field,
        records = summary.record_count,
        "sales summary served"
    );

    Ok(Json(SummaryResponse {
        data_source,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use sales_insight::config::AnalysisDefaults;
    use sales_insight::sales::{Decision, TestKind};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            analysis: AnalysisDefaults::default(),
        }
    }

    fn request(body: serde_json::Value) -> SummaryRequest {
        serde_json::from_value(body).expect("request deserializes")
    }

    #[tokio::test]
    async fn summary_endpoint_uses_sample_data_by_default() {
        let Json(body) = summary_endpoint(Extension(test_state(true)), Json(request(json!({}))))
            .await
            .expect("summary builds");

        assert_eq!(body.data_source, DataSource::Sample);
        assert_eq!(body.summary.record_count, 20);
        assert_eq!(body.summary.descriptive.mode, vec![20.0]);
        assert_eq!(body.summary.category_breakdown.len(), 4);
        assert_eq!(body.summary.histogram.len(), 10);
        assert!(body.summary.hypothesis_test.is_none());
    }

    #[tokio::test]
    async fn summary_endpoint_runs_requested_comparison() {
        let payload = request(json!({
            "csv": "date,category,units_sold\n\
                    2024-03-01,North,1\n2024-03-02,North,2\n2024-03-03,North,3\n\
                    2024-03-01,South,100\n2024-03-02,South,101\n2024-03-03,South,102\n",
            "hypothesis": { "kind": "two_sample", "group_a": "North", "group_b": "South" }
        }));

        let Json(body) = summary_endpoint(Extension(test_state(true)), Json(payload))
            .await
            .expect("summary builds");

        assert_eq!(body.data_source, DataSource::Uploaded);
        let test = body.summary.hypothesis_test.expect("test requested");
        assert_eq!(test.kind, TestKind::Welch);
        assert_eq!(test.decision, Decision::RejectNull);
    }

    #[tokio::test]
    async fn unknown_field_is_a_bad_request() {
        let app = router().layer(Extension(test_state(true)));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/sales/summary")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"field":"discount"}"#))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("discount"));
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let app = router().layer(Extension(test_state(false)));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
