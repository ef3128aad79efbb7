use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::{Service, ServiceField};
use super::store::{CatalogError, ServiceCatalog};
use crate::orders::domain::SubjectProfile;
use crate::rules::EvaluationContext;

/// Router exposing catalog browsing and configuration endpoints.
pub fn catalog_router(catalog: Arc<ServiceCatalog>) -> Router {
    Router::new()
        .route("/api/v1/catalog/categories", get(categories_handler))
        .route("/api/v1/catalog/services", get(list_handler))
        .route(
            "/api/v1/catalog/services/:slug",
            get(get_handler).put(upsert_handler).delete(remove_handler),
        )
        .route(
            "/api/v1/catalog/services/:slug/requirements",
            post(requirements_handler),
        )
        .with_state(catalog)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    category: Option<String>,
}

/// Person and answers to evaluate a service's visibility rules against.
#[derive(Debug, Deserialize)]
pub struct RequirementsRequest {
    #[serde(flatten)]
    pub subject: SubjectProfile,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct RequiredDocumentView {
    pub id: String,
    pub name: String,
    pub required: bool,
}

#[derive(Debug, Serialize)]
pub struct RequirementsView {
    pub service: String,
    pub documents: Vec<RequiredDocumentView>,
    pub fields: Vec<ServiceField>,
    pub problems: Vec<String>,
}

pub(crate) async fn categories_handler(State(catalog): State<Arc<ServiceCatalog>>) -> Response {
    (StatusCode::OK, Json(catalog.categories().to_vec())).into_response()
}

pub(crate) async fn list_handler(
    State(catalog): State<Arc<ServiceCatalog>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let services = catalog.list(query.category.as_deref());
    (StatusCode::OK, Json(services)).into_response()
}

pub(crate) async fn get_handler(
    State(catalog): State<Arc<ServiceCatalog>>,
    Path(slug): Path<String>,
) -> Response {
    match catalog.get(&slug) {
        Ok(service) => (StatusCode::OK, Json(service)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn upsert_handler(
    State(catalog): State<Arc<ServiceCatalog>>,
    Path(slug): Path<String>,
    Json(definition): Json<Value>,
) -> Response {
    let service = match Service::from_definition(definition) {
        Ok(service) => service,
        Err(err) => return catalog_error_response(CatalogError::Definition(err)),
    };
    if service.slug != slug {
        let payload = json!({
            "error": format!("path slug '{slug}' does not match body slug '{}'", service.slug),
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match catalog.upsert(service.clone()) {
        Ok(true) => (StatusCode::OK, Json(service)).into_response(),
        Ok(false) => (StatusCode::CREATED, Json(service)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn remove_handler(
    State(catalog): State<Arc<ServiceCatalog>>,
    Path(slug): Path<String>,
) -> Response {
    match catalog.remove(&slug) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => catalog_error_response(err),
    }
}

pub(crate) async fn requirements_handler(
    State(catalog): State<Arc<ServiceCatalog>>,
    Path(slug): Path<String>,
    Json(request): Json<RequirementsRequest>,
) -> Response {
    let service = match catalog.get(&slug) {
        Ok(service) => service,
        Err(err) => return catalog_error_response(err),
    };

    let today = request
        .today
        .unwrap_or_else(|| Local::now().date_naive());
    let context =
        EvaluationContext::for_subject(&request.subject, today).with_answers(&request.answers);

    let documents = service
        .visible_documents(&context)
        .into_iter()
        .map(|document| RequiredDocumentView {
            id: document.id.clone(),
            name: document.name.clone(),
            required: document.required,
        })
        .collect();
    let fields = service
        .visible_fields(&context)
        .into_iter()
        .cloned()
        .collect();
    let problems = match service.validate_answers(&context, &request.answers) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    let view = RequirementsView {
        service: service.slug,
        documents,
        fields,
        problems,
    };
    (StatusCode::OK, Json(view)).into_response()
}

fn catalog_error_response(err: CatalogError) -> Response {
    let status = match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::UnknownCategory(_) | CatalogError::Definition(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
