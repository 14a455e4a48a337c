use actix_web::middleware::Compress;
use actix_web::{web, App, HttpServer};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod pdf;
pub mod receipt;

pub use crate::api::AppState;
pub use crate::config::AppConfig;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::generate_receipt_pdf,
        crate::api::handlers::download_receipt_pdf,
        crate::api::handlers::health
    ),
    components(
        schemas(
            receipt::Receipt,
            receipt::LineItem,
            receipt::SellerSnapshot,
            receipt::CustomerSnapshot,
            receipt::CustomerType,
            pdf::GenerationResult,
            api::handlers::HealthResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Receipts", description = "Receipt PDF generation endpoints.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let renderer = pdf::build_renderer(&config);
    let app_state = web::Data::new(AppState::new(renderer));

    log::info!(
        "Starting server at http://{} ({} renderer, output to {})",
        config.bind_addr,
        app_state.renderer.name(),
        config.pdf_output_dir.display()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .app_data(app_state.clone())
            .service(web::scope("/api").configure(api::config))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(config.bind_addr.as_str())?
    .run()
    .await
}
