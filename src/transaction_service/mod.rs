pub mod entities;
pub mod product_client;
pub mod routes;

use axum::{middleware, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::TransactionServiceConfig;
use crate::middleware::{cors_layer, logging::logging_middleware, panic_layer};
use product_client::ProductClient;
use routes::{
    transaction_routes::transaction_routes, transaction_type_routes::transaction_type_routes,
};

pub fn create_router(
    db: Arc<DatabaseConnection>,
    client: Arc<ProductClient>,
    config: Arc<TransactionServiceConfig>,
) -> Router {
    let cors = cors_layer(&config.allowed_origins);

    Router::new()
        .route("/", get(root))
        .nest("/api", transaction_routes())
        .nest("/api", transaction_type_routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(panic_layer())
        .layer(cors)
        .layer(Extension(db))
        .layer(Extension(client))
}

async fn root() -> &'static str {
    "Transaction API up and running!"
}
