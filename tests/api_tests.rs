mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use bakery_receipts::api::{self, AppState};
use bakery_receipts::pdf::{GenerationResult, GeneratorConfig, PdfGenerator};
use serde_json::Value;

fn state(dir: &std::path::Path) -> web::Data<AppState> {
    web::Data::new(AppState::new(Arc::new(PdfGenerator::new(GeneratorConfig::new(dir)))))
}

#[actix_web::test]
async fn test_generate_then_download() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path()))
            .service(web::scope("/api").configure(api::config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/receipts/pdf")
        .insert_header((api::OPERATION_ID_HEADER, "op-http-1"))
        .set_json(common::tax_receipt(601))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let result: GenerationResult = test::read_body_json(resp).await;
    assert!(result.success);
    assert!(result.file_path.unwrap().ends_with("601.pdf"));

    let req = test::TestRequest::get().uri("/api/receipts/601/pdf").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn test_zero_quantity_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path()))
            .service(web::scope("/api").configure(api::config)),
    )
    .await;

    let mut receipt = common::plain_receipt(602);
    receipt.line_items[0].quantity = 0;
    let req = test::TestRequest::post()
        .uri("/api/receipts/pdf")
        .set_json(&receipt)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "BadRequest");
    assert!(body["message"].as_str().unwrap().contains("line_items[0].quantity"));
    assert!(!dir.path().join("602.pdf").exists());
}

#[actix_web::test]
async fn test_generation_failure_returns_500() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(&blocker.join("out")))
            .service(web::scope("/api").configure(api::config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/receipts/pdf")
        .set_json(common::plain_receipt(603))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body.get("filePath").is_none());
}

#[actix_web::test]
async fn test_unknown_receipt_download_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path()))
            .service(web::scope("/api").configure(api::config)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/receipts/999/pdf").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotFound");
}

#[actix_web::test]
async fn test_health_names_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path()))
            .service(web::scope("/api").configure(api::config)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["renderer"], "canvas");
}
