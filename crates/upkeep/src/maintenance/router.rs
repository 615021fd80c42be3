use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::audit::DEFAULT_RECENT_LIMIT;
use super::classifier::CompletionBackend;
use super::domain::{
    MaintenanceCategory, NewMaintenanceRequest, NewVendor, Page, PageParams, Priority,
    RequestFilters, RequestId, RequestStatus, RequestUpdate, VendorFilters, VendorId, VendorUpdate,
};
use super::repository::{RepositoryError, RequestRepository, VendorRepository};
use super::service::{MaintenanceService, MaintenanceServiceError};

/// Router builder exposing the maintenance and vendor endpoints.
pub fn maintenance_router<R, V, B>(service: Arc<MaintenanceService<R, V, B>>) -> Router
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/maintenance/requests",
            post(create_request_handler::<R, V, B>).get(list_requests_handler::<R, V, B>),
        )
        .route(
            "/api/v1/maintenance/requests/:request_id",
            get(get_request_handler::<R, V, B>)
                .put(update_request_handler::<R, V, B>)
                .delete(delete_request_handler::<R, V, B>),
        )
        .route(
            "/api/v1/maintenance/ai-logs",
            get(audit_log_handler::<R, V, B>),
        )
        .route(
            "/api/v1/vendors",
            post(create_vendor_handler::<R, V, B>).get(list_vendors_handler::<R, V, B>),
        )
        .route(
            "/api/v1/vendors/:vendor_id",
            get(get_vendor_handler::<R, V, B>)
                .put(update_vendor_handler::<R, V, B>)
                .delete(delete_vendor_handler::<R, V, B>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListRequestsQuery {
    #[serde(default)]
    status: Option<RequestStatus>,
    #[serde(default)]
    category: Option<MaintenanceCategory>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    vendor_id: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListVendorsQuery {
    #[serde(default)]
    category: Option<MaintenanceCategory>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditLogQuery {
    #[serde(default = "default_audit_limit")]
    limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

fn default_audit_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

pub(crate) async fn create_request_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Json(input): Json<NewMaintenanceRequest>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    if input.title.trim().is_empty()
        || input.description.trim().is_empty()
        || input.property_address.trim().is_empty()
    {
        let payload = json!({
            "error": "Bad Request",
            "message": "Title, description, and property address are required",
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match service.create_request(input).await {
        Ok(outcome) => {
            let payload = json!({
                "success": true,
                "data": outcome.request,
                "aiClassification": outcome.ai_classification,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_requests_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Query(query): Query<ListRequestsQuery>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    let filters = RequestFilters {
        status: query.status,
        category: query.category,
        priority: query.priority,
        assigned_vendor_id: query.vendor_id.map(VendorId),
    };
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    match service.list_requests(&filters, params) {
        Ok(page) => paged_response(page),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_request_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.get_request(&RequestId(request_id)) {
        Ok(request) => data_response(StatusCode::OK, json!(request)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_request_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(request_id): Path<String>,
    Json(update): Json<RequestUpdate>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.update_request(&RequestId(request_id), update) {
        Ok(request) => data_response(StatusCode::OK, json!(request)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_request_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.delete_request(&RequestId(request_id)) {
        Ok(()) => {
            let payload = json!({
                "success": true,
                "message": "Maintenance request deleted successfully",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_log_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Query(query): Query<AuditLogQuery>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    let logs = service.audit_log(query.limit);
    data_response(StatusCode::OK, json!(logs))
}

pub(crate) async fn create_vendor_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Json(input): Json<NewVendor>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    if input.name.trim().is_empty() || input.phone.trim().is_empty() {
        let payload = json!({
            "error": "Bad Request",
            "message": "Name, category, and phone are required",
        });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match service.create_vendor(input) {
        Ok(vendor) => data_response(StatusCode::CREATED, json!(vendor)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_vendors_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Query(query): Query<ListVendorsQuery>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    let filters = VendorFilters {
        category: query.category,
        is_active: query.is_active,
        search: query.search,
    };
    let params = PageParams {
        page: query.page,
        limit: query.limit,
    };

    match service.list_vendors(&filters, params) {
        Ok(page) => paged_response(page),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_vendor_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(vendor_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.get_vendor(&VendorId(vendor_id)) {
        Ok(vendor) => data_response(StatusCode::OK, json!(vendor)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_vendor_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(vendor_id): Path<String>,
    Json(update): Json<VendorUpdate>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.update_vendor(&VendorId(vendor_id), update) {
        Ok(vendor) => data_response(StatusCode::OK, json!(vendor)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_vendor_handler<R, V, B>(
    State(service): State<Arc<MaintenanceService<R, V, B>>>,
    Path(vendor_id): Path<String>,
) -> Response
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    match service.delete_vendor(&VendorId(vendor_id)) {
        Ok(()) => {
            let payload = json!({
                "success": true,
                "message": "Vendor deleted successfully",
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn data_response(status: StatusCode, data: serde_json::Value) -> Response {
    let payload = json!({
        "success": true,
        "data": data,
    });
    (status, Json(payload)).into_response()
}

fn paged_response<T: serde::Serialize>(page: Page<T>) -> Response {
    let payload = json!({
        "success": true,
        "data": page.items,
        "pagination": {
            "page": page.page,
            "limit": page.limit,
            "total": page.total,
            "totalPages": page.total_pages,
        },
    });
    (StatusCode::OK, Json(payload)).into_response()
}

fn error_response(err: MaintenanceServiceError) -> Response {
    let MaintenanceServiceError::Repository(repository_err) = &err;
    let (status, label) = match repository_err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
        RepositoryError::Conflict => (StatusCode::CONFLICT, "Conflict"),
        RepositoryError::Unavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    };

    let payload = json!({
        "error": label,
        "message": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
