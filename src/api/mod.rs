//! HTTP surface for receipt generation.

pub mod handlers;

use std::sync::Arc;

use actix_web::web;

use crate::pdf::Renderer;

pub const OPERATION_ID_HEADER: &str = "X-Operation-Id";

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/receipts/pdf").route(web::post().to(handlers::generate_receipt_pdf)))
        .service(
            web::resource("/receipts/{id}/pdf")
                .route(web::get().to(handlers::download_receipt_pdf)),
        )
        .service(web::resource("/health").route(web::get().to(handlers::health)));
}
