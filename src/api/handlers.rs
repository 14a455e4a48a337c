use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AppState, OPERATION_ID_HEADER};
use crate::pdf::GenerationResult;
use crate::receipt::{Receipt, Validator};
use crate::ErrorResponse;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub renderer: String,
}

fn operation_id(req: &HttpRequest) -> String {
    req.headers()
        .get(OPERATION_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[utoipa::path(
    context_path = "/api",
    tag = "Receipts",
    post,
    path = "/receipts/pdf",
    request_body = Receipt,
    params(
        ("X-Operation-Id" = Option<String>, Header, description = "Correlation id used in log lines")
    ),
    responses(
        (status = 200, description = "PDF written", body = GenerationResult),
        (status = 400, description = "Invalid receipt", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = GenerationResult)
    )
)]
pub async fn generate_receipt_pdf(
    req: HttpRequest,
    body: web::Json<Receipt>,
    state: web::Data<AppState>,
) -> impl Responder {
    let receipt = body.into_inner();
    let operation_id = operation_id(&req);
    info!(
        "[{}][receipt {}] Executing generate_receipt_pdf with {} renderer",
        operation_id,
        receipt.receipt_id,
        state.renderer.name()
    );

    if let Err(message) = receipt.validate() {
        warn!("[{}][receipt {}] {}", operation_id, receipt.receipt_id, message);
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message));
    }

    let result = state.renderer.render(&receipt, &operation_id).await;
    if result.success {
        HttpResponse::Ok().json(result)
    } else {
        HttpResponse::InternalServerError().json(result)
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Receipts",
    get,
    path = "/receipts/{id}/pdf",
    params(
        ("id" = i64, Path, description = "Receipt id")
    ),
    responses(
        (status = 200, description = "Stored receipt PDF (application/pdf)"),
        (status = 404, description = "No PDF for this receipt", body = ErrorResponse)
    )
)]
pub async fn download_receipt_pdf(
    req: HttpRequest,
    id: web::Path<i64>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let receipt_id = id.into_inner();
    let path = state.renderer.output_path(receipt_id);

    match NamedFile::open_async(&path).await {
        Ok(file) => file.into_response(&req),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HttpResponse::NotFound().json(
            ErrorResponse::not_found(&format!("No PDF found for receipt {}", receipt_id)),
        ),
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to read receipt PDF"))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Receipts",
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        renderer: state.renderer.name().to_string(),
    })
}
