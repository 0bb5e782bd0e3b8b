use super::ApiResponse;
use crate::db::RecordStore;
use crate::error::ServiceError;
use crate::models::{
    Allocation, AllocationRequest, DeletedInvoice, IntegrityReport, Invoice, InvoiceDetail, NewInvoice,
    Payment, PaymentView, ScrapRequest, ScrappedRecord, SerialStatusRow, Settings, StageUpdate,
    Suggestions,
};
use crate::service::{report, InventoryService, SerialContext};
use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

type Service<S> = State<Arc<InventoryService<S>>>;
type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SerialParams {
    pub invoice_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableParams {
    pub item: String,
    pub model: String,
}

/// Template preview: optional pattern plus placeholder values (`PO`, `INV`, `SEQ`, ...)
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(flatten)]
    pub context: SerialContext,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub serial: String,
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn get_settings<S: RecordStore>(State(service): Service<S>) -> ApiResult<Settings> {
    let settings = service.settings().await?;
    Ok(Json(ApiResponse::ok("Settings loaded", settings)))
}

pub async fn save_settings<S: RecordStore>(
    State(service): Service<S>,
    Json(settings): Json<Settings>,
) -> ApiResult<Settings> {
    let saved = service.save_settings(settings).await?;
    Ok(Json(ApiResponse::ok("Settings saved", saved)))
}

pub async fn search_invoices<S: RecordStore>(
    State(service): Service<S>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<Invoice>> {
    let invoices = service.search_invoices(&params.q).await?;
    Ok(Json(ApiResponse::ok(format!("{} invoices", invoices.len()), invoices)))
}

pub async fn create_invoice<S: RecordStore>(
    State(service): Service<S>,
    Json(new_invoice): Json<NewInvoice>,
) -> Result<(StatusCode, Json<ApiResponse<InvoiceDetail>>), ServiceError> {
    let detail = service.create_invoice(new_invoice).await?;
    let message = format!(
        "Invoice {} saved with {} serials",
        detail.invoice.invoice_number,
        detail.serials.len()
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, detail))))
}

pub async fn invoice_detail<S: RecordStore>(
    State(service): Service<S>,
    Path(id): Path<String>,
) -> ApiResult<InvoiceDetail> {
    let detail = service.invoice_detail(&id).await?;
    Ok(Json(ApiResponse::ok("Invoice loaded", detail)))
}

pub async fn delete_invoice<S: RecordStore>(
    State(service): Service<S>,
    Path(id): Path<String>,
) -> ApiResult<DeletedInvoice> {
    let deleted = service.delete_invoice(&id).await?;
    Ok(Json(ApiResponse::ok("Invoice deleted", deleted)))
}

pub async fn serial_statuses<S: RecordStore>(
    State(service): Service<S>,
    Query(params): Query<SerialParams>,
) -> ApiResult<Vec<SerialStatusRow>> {
    let rows = service.serial_statuses(params.invoice_id.as_deref()).await?;
    Ok(Json(ApiResponse::ok(format!("{} serials", rows.len()), rows)))
}

pub async fn available_serials<S: RecordStore>(
    State(service): Service<S>,
    Query(params): Query<AvailableParams>,
) -> ApiResult<Vec<String>> {
    let serials = service.available_serials(&params.item, &params.model).await?;
    Ok(Json(ApiResponse::ok(format!("{} available", serials.len()), serials)))
}

pub async fn preview_serial<S: RecordStore>(
    State(service): Service<S>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<PreviewResponse> {
    let serial = service.preview_serial(req.pattern.as_deref(), &req.context).await?;
    Ok(Json(ApiResponse::ok("Preview", PreviewResponse { serial })))
}

pub async fn list_allocations<S: RecordStore>(State(service): Service<S>) -> ApiResult<Vec<Allocation>> {
    let allocations = service.list_allocations().await?;
    Ok(Json(ApiResponse::ok(format!("{} allocations", allocations.len()), allocations)))
}

pub async fn allocate<S: RecordStore>(
    State(service): Service<S>,
    Json(req): Json<AllocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Allocation>>), ServiceError> {
    let allocation = service.allocate(req).await?;
    let message = format!("{} allocated to {}", allocation.serial, allocation.user_name);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, allocation))))
}

pub async fn unallocate<S: RecordStore>(
    State(service): Service<S>,
    Path(id): Path<String>,
) -> ApiResult<Allocation> {
    let allocation = service.unallocate(&id).await?;
    Ok(Json(ApiResponse::ok("Unallocated", allocation)))
}

pub async fn list_scrapped<S: RecordStore>(State(service): Service<S>) -> ApiResult<Vec<ScrappedRecord>> {
    let scrapped = service.list_scrapped().await?;
    Ok(Json(ApiResponse::ok(format!("{} scrapped", scrapped.len()), scrapped)))
}

pub async fn scrap<S: RecordStore>(
    State(service): Service<S>,
    Json(req): Json<ScrapRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScrappedRecord>>), ServiceError> {
    let record = service.scrap(req).await?;
    let message = format!("{} scrapped", record.serial);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, record))))
}

pub async fn list_payments<S: RecordStore>(
    State(service): Service<S>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<PaymentView>> {
    let payments = service.list_payments(&params.q, Local::now().date_naive()).await?;
    Ok(Json(ApiResponse::ok(format!("{} payments", payments.len()), payments)))
}

pub async fn set_payment_stage<S: RecordStore>(
    State(service): Service<S>,
    Path(id): Path<String>,
    Json(update): Json<StageUpdate>,
) -> ApiResult<Payment> {
    let payment = service.set_payment_stage(&id, update.stage, update.done).await?;
    Ok(Json(ApiResponse::ok("Payment status updated", payment)))
}

pub async fn suggestions<S: RecordStore>(State(service): Service<S>) -> ApiResult<Suggestions> {
    let suggestions = service.suggestions().await?;
    Ok(Json(ApiResponse::ok("Suggestions", suggestions)))
}

pub async fn integrity_report<S: RecordStore>(State(service): Service<S>) -> ApiResult<IntegrityReport> {
    let report = service.integrity_report().await?;
    let message = if report.is_clean() {
        "No integrity issues"
    } else {
        "Integrity issues found"
    };
    Ok(Json(ApiResponse::ok(message, report)))
}

fn csv_response(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn export_serials<S: RecordStore>(State(service): Service<S>) -> Result<Response, ServiceError> {
    let rows = service.serial_statuses(None).await?;
    let mut body = Vec::new();
    report::write_serials(&mut body, &rows)?;
    Ok(csv_response("serials.csv", body))
}

pub async fn export_allocations<S: RecordStore>(State(service): Service<S>) -> Result<Response, ServiceError> {
    let allocations = service.list_allocations().await?;
    let mut body = Vec::new();
    report::write_allocations(&mut body, &allocations)?;
    Ok(csv_response("allocations.csv", body))
}

pub async fn export_payments<S: RecordStore>(State(service): Service<S>) -> Result<Response, ServiceError> {
    let payments = service.list_payments("", Local::now().date_naive()).await?;
    let mut body = Vec::new();
    report::write_payments(&mut body, &payments)?;
    Ok(csv_response("payments.csv", body))
}
