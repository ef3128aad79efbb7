use crate::infra::{AppState, Backoffice};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use civic_desk::catalog::catalog_router;
use civic_desk::config::OfficeConfig;
use civic_desk::orders::order_router;
use civic_desk::pricing::{
    compute_total, DeliveryType, FineCatalogEntry, FineSelection, PhotographyLocation,
    PricingBreakdown, PricingError, PricingInput,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Raw pricing input for the stateless quote endpoint; the delivery fee comes from config.
#[derive(Debug, Deserialize)]
pub(crate) struct QuoteRequest {
    pub(crate) variant_price_cents: i64,
    #[serde(default = "default_quantity")]
    pub(crate) quantity: u32,
    #[serde(default)]
    pub(crate) photography_location: Option<String>,
    #[serde(default)]
    pub(crate) delivery_type: DeliveryType,
    #[serde(default)]
    pub(crate) fines: Vec<String>,
    #[serde(default)]
    pub(crate) fine_overrides: BTreeMap<String, i64>,
    #[serde(default)]
    pub(crate) other_fees_cents: i64,
    #[serde(default)]
    pub(crate) discount_cents: i64,
}

fn default_quantity() -> u32 {
    1
}

pub(crate) fn with_app_routes(backoffice: &Backoffice, office: OfficeConfig) -> axum::Router {
    catalog_router(backoffice.catalog.clone())
        .merge(order_router(backoffice.orders.clone(), office))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/api/v1/fines", axum::routing::get(fines_endpoint))
        .route("/api/v1/quote", axum::routing::post(quote_endpoint))
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

pub(crate) async fn fines_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<FineCatalogEntry>> {
    Json(state.fines.entries().to_vec())
}

pub(crate) async fn quote_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Response {
    match quote(&state, payload) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

fn quote(state: &AppState, payload: QuoteRequest) -> Result<PricingBreakdown, PricingError> {
    let selection = FineSelection::from_ids(payload.fines, &state.fines)?;
    let input = PricingInput {
        photography_location: PhotographyLocation::parse(payload.photography_location.as_deref()),
        delivery_type: payload.delivery_type,
        delivery_fee_cents: state.pricing.delivery_fee_cents,
        selection,
        overrides: payload.fine_overrides,
        other_fees_cents: payload.other_fees_cents,
        discount_cents: payload.discount_cents,
        ..PricingInput::new(payload.variant_price_cents, payload.quantity)
    };
    compute_total(&input, &state.fines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use civic_desk::config::PricingConfig;
    use civic_desk::pricing::FineCatalog;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn office() -> OfficeConfig {
        OfficeConfig {
            name: "Civil Documents Office".to_string(),
            currency: "EGP".to_string(),
        }
    }

    fn app(ready: bool) -> (axum::Router, AppState) {
        let pricing = PricingConfig::default();
        let backoffice = Backoffice::in_memory(&pricing);
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            fines: Arc::new(FineCatalog::standard()),
            pricing,
        };
        let router = with_app_routes(&backoffice, office()).layer(Extension(state.clone()));
        (router, state)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let (router, state) = app(false);
        let response = router
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.readiness.store(true, Ordering::Release);
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn quote_links_expenses_and_charges_delivery() {
        let (router, _) = app(true);
        let payload = json!({
            "variant_price_cents": 12_500,
            "quantity": 2,
            "photography_location": "home",
            "delivery_type": "ADDRESS",
            "fines": ["fine_002"],
            "discount_cents": 1_000
        });
        let response = router
            .oneshot(
                Request::post("/api/v1/quote")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        // 25000 + 15000 + 5000 + 20000 + 2500 - 1000
        assert_eq!(body["total_cents"], 66_500);
        let ids: Vec<&str> = body["fine_lines"]
            .as_array()
            .expect("fine lines")
            .iter()
            .filter_map(|line| line["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["fine_002", "service_001"]);
    }

    #[tokio::test]
    async fn quote_rejects_unknown_fines() {
        let (router, _) = app(true);
        let payload = json!({ "variant_price_cents": 100, "fines": ["fine_999"] });
        let response = router
            .oneshot(
                Request::post("/api/v1/quote")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .is_some_and(|message| message.contains("fine_999")));
    }

    #[tokio::test]
    async fn merged_router_serves_fines_and_catalog() {
        let (router, _) = app(true);
        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/fines")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(8));

        let response = router
            .oneshot(
                Request::get("/api/v1/catalog/services/passport")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
