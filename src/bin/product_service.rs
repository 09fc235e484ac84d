use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use rust_inventario::config::ProductServiceConfig;
use rust_inventario::product_service::{self, entities::setup_schema};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let config = Arc::new(ProductServiceConfig::from_env());
    let db: DatabaseConnection = Database::connect(&config.database_url).await.unwrap();
    setup_schema(&db).await;

    let shared_db = Arc::new(db);

    let app = product_service::create_router(shared_db, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    tracing::info!("Product API listening on {}", config.bind_addr);
    axum::serve(listener, app).await.unwrap();
}
