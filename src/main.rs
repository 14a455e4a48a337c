#[actix_web::main]
async fn main() -> std::io::Result<()> {
    bakery_receipts::run().await
}
