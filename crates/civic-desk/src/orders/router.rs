use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CustomerId, NewCustomer, NewOrderRequest, OrderId, OrderStatus};
use super::export::orders_csv;
use super::query::{OrderFilter, PageRequest};
use super::repository::{CustomerDirectory, OrderRepository, RepositoryError};
use super::service::{OrderService, OrderServiceError, CUSTOMER_SEARCH_LIMIT};
use crate::catalog::CatalogError;
use crate::config::OfficeConfig;
use crate::report::{render_orders_report, render_receipt, ReportError, ReportOptions};

/// Shared state for the order endpoints.
pub struct OrdersState<R, C> {
    pub service: Arc<OrderService<R, C>>,
    pub office: OfficeConfig,
}

impl<R, C> Clone for OrdersState<R, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            office: self.office.clone(),
        }
    }
}

/// Router builder exposing customer, order, status and print endpoints.
pub fn order_router<R, C>(service: Arc<OrderService<R, C>>, office: OfficeConfig) -> Router
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/customers",
            get(search_customers_handler::<R, C>).post(register_customer_handler::<R, C>),
        )
        .route(
            "/api/v1/customers/:customer_id",
            get(customer_handler::<R, C>),
        )
        .route(
            "/api/v1/orders",
            get(list_handler::<R, C>).post(create_handler::<R, C>),
        )
        .route("/api/v1/orders/:order_id", get(order_handler::<R, C>))
        .route(
            "/api/v1/orders/:order_id/cancel",
            post(cancel_handler::<R, C>),
        )
        .route("/api/v1/order-quotes", post(quote_handler::<R, C>))
        .route("/api/v1/order-status", post(bulk_status_handler::<R, C>))
        .route("/api/v1/order-exports/csv", get(export_handler::<R, C>))
        .route("/api/v1/print/report", post(print_report_handler::<R, C>))
        .route("/api/v1/print/receipt", post(print_receipt_handler::<R, C>))
        .with_state(OrdersState { service, office })
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerSearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    limit: Option<usize>,
}

/// Query-string form of [`OrderFilter`] plus paging.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    status: Option<OrderStatus>,
    #[serde(default)]
    service: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    created_from: Option<NaiveDate>,
    #[serde(default)]
    created_to: Option<NaiveDate>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    per_page: Option<usize>,
}

impl ListQuery {
    fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status,
            service: self.service.clone().filter(|value| !value.is_empty()),
            category: self.category.clone().filter(|value| !value.is_empty()),
            search: self.search.clone().filter(|value| !value.trim().is_empty()),
            created_from: self.created_from,
            created_to: self.created_to,
        }
    }

    fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<OrderId>,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct PrintRequest {
    pub ids: Vec<OrderId>,
    #[serde(default)]
    pub title: Option<String>,
}

pub(crate) async fn search_customers_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Query(query): Query<CustomerSearchQuery>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    let limit = query.limit.unwrap_or(CUSTOMER_SEARCH_LIMIT);
    match state.service.search_customers(&query.q, limit) {
        Ok(customers) => (StatusCode::OK, Json(customers)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn register_customer_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(customer): Json<NewCustomer>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.register_customer(customer) {
        Ok(customer) => (StatusCode::CREATED, Json(customer)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn customer_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Path(customer_id): Path<String>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.customer(&CustomerId(customer_id)) {
        Ok(customer) => (StatusCode::OK, Json(customer)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn list_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.list(&query.filter(), query.page()) {
        Ok(page) => {
            let page = page.map(|order| order.summary());
            (StatusCode::OK, Json(page)).into_response()
        }
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn create_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(request): Json<NewOrderRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.create(request) {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn order_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Path(order_id): Path<String>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.get(&OrderId(order_id)) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn cancel_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Path(order_id): Path<String>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.cancel(&OrderId(order_id), Utc::now()) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn quote_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(request): Json<NewOrderRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state.service.quote(&request) {
        Ok(breakdown) => (StatusCode::OK, Json(breakdown)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn bulk_status_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(request): Json<BulkStatusRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    match state
        .service
        .update_status(&request.ids, request.status, Utc::now())
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => order_error_response(err),
    }
}

pub(crate) async fn export_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    let orders = match state.service.filtered(&query.filter()) {
        Ok(orders) => orders,
        Err(err) => return order_error_response(err),
    };
    match orders_csv(&orders) {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"orders.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn print_report_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(request): Json<PrintRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    let orders = match state.service.orders_for_print(&request.ids) {
        Ok(orders) => orders,
        Err(err) => return order_error_response(err),
    };
    let options = ReportOptions::new(
        &state.office,
        request.title.as_deref(),
        Local::now().date_naive(),
    );
    match render_orders_report(&orders, &options) {
        Ok(html) => Html(html).into_response(),
        Err(err) => report_error_response(err),
    }
}

pub(crate) async fn print_receipt_handler<R, C>(
    State(state): State<OrdersState<R, C>>,
    Json(request): Json<PrintRequest>,
) -> Response
where
    R: OrderRepository + 'static,
    C: CustomerDirectory + 'static,
{
    let orders = match state.service.orders_for_print(&request.ids) {
        Ok(orders) => orders,
        Err(err) => return order_error_response(err),
    };
    let options = ReportOptions::new(
        &state.office,
        request.title.as_deref().or(Some("إيصال")),
        Local::now().date_naive(),
    );
    match render_receipt(&orders, &options) {
        Ok(html) => Html(html).into_response(),
        Err(err) => report_error_response(err),
    }
}

fn report_error_response(err: ReportError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

pub(crate) fn order_error_response(err: OrderServiceError) -> Response {
    let status = match &err {
        OrderServiceError::NotFound(_)
        | OrderServiceError::UnknownCustomer(_)
        | OrderServiceError::Catalog(CatalogError::NotFound(_))
        | OrderServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        OrderServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        OrderServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = match &err {
        OrderServiceError::InvalidAnswers(problems) => json!({
            "error": "invalid answers",
            "problems": problems.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }),
        OrderServiceError::Repository(RepositoryError::Conflict) => json!({
            "error": "record already exists",
        }),
        other => json!({ "error": other.to_string() }),
    };
    (status, Json(payload)).into_response()
}
