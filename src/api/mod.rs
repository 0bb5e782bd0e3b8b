pub mod handlers;

use crate::db::RecordStore;
use crate::service::InventoryService;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;

/// Response envelope shared by every JSON endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Logs method, path, status and latency of every request
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    tracing::info!("{} {} -> {} ({:?})", method, path, response.status(), started.elapsed());
    response
}

/// Routes for the presentation layer
pub fn router<S: RecordStore>(service: Arc<InventoryService<S>>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/settings",
            get(handlers::get_settings::<S>).put(handlers::save_settings::<S>),
        )
        .route(
            "/api/invoices",
            get(handlers::search_invoices::<S>).post(handlers::create_invoice::<S>),
        )
        .route(
            "/api/invoices/:id",
            get(handlers::invoice_detail::<S>).delete(handlers::delete_invoice::<S>),
        )
        .route("/api/serials", get(handlers::serial_statuses::<S>))
        .route("/api/serials/available", get(handlers::available_serials::<S>))
        .route("/api/serials/preview", post(handlers::preview_serial::<S>))
        .route(
            "/api/allocations",
            get(handlers::list_allocations::<S>).post(handlers::allocate::<S>),
        )
        .route("/api/allocations/:id", delete(handlers::unallocate::<S>))
        .route(
            "/api/scrapped",
            get(handlers::list_scrapped::<S>).post(handlers::scrap::<S>),
        )
        .route("/api/payments", get(handlers::list_payments::<S>))
        .route("/api/payments/:id/status", put(handlers::set_payment_stage::<S>))
        .route("/api/suggestions", get(handlers::suggestions::<S>))
        .route("/api/integrity", get(handlers::integrity_report::<S>))
        .route("/api/export/serials.csv", get(handlers::export_serials::<S>))
        .route("/api/export/allocations.csv", get(handlers::export_allocations::<S>))
        .route("/api/export/payments.csv", get(handlers::export_payments::<S>))
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)))
        .with_state(service)
}
