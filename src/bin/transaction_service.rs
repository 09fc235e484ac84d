use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

use rust_inventario::config::TransactionServiceConfig;
use rust_inventario::transaction_service::{
    self,
    entities::{seed_transaction_types, setup_schema},
    product_client::ProductClient,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let config = Arc::new(TransactionServiceConfig::from_env());
    let db: DatabaseConnection = Database::connect(&config.database_url).await.unwrap();
    setup_schema(&db).await;

    let shared_db = Arc::new(db);

    seed_transaction_types(&shared_db).await;

    let client = Arc::new(ProductClient::new(config.product_service_url.clone()));
    let app = transaction_service::create_router(shared_db, client, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.unwrap();
    tracing::info!("Transaction API listening on {}", config.bind_addr);
    axum::serve(listener, app).await.unwrap();
}
