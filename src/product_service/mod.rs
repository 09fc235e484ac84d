pub mod entities;
pub mod routes;

use axum::{middleware, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::ProductServiceConfig;
use crate::middleware::{cors_layer, logging::logging_middleware, panic_layer};
use routes::{
    category_routes::category_routes, image_routes::public_image_routes,
    product_routes::product_routes,
};

pub fn create_router(db: Arc<DatabaseConnection>, config: Arc<ProductServiceConfig>) -> Router {
    let cors = cors_layer(&config.allowed_origins);

    Router::new()
        .route("/", get(root))
        .nest("/api", product_routes())
        .nest("/api", category_routes())
        .merge(public_image_routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(panic_layer())
        .layer(cors)
        .layer(Extension(db))
        .layer(Extension(config))
}

async fn root() -> &'static str {
    "Product API up and running!"
}
