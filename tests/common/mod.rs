#![allow(dead_code)]

use reqwest::{Client, StatusCode};
use sea_orm::Database;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

use rust_inventario::config::{ProductServiceConfig, TransactionServiceConfig};
use rust_inventario::product_service;
use rust_inventario::transaction_service::{self, product_client::ProductClient};

pub struct TestService {
    pub base_url: String,
    _tmp: TempDir,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn spawn_product_service() -> TestService {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = tmp.path().join("products.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    product_service::entities::setup_schema(&db).await;

    let config = Arc::new(ProductServiceConfig {
        database_url,
        bind_addr: "127.0.0.1:0".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        web_root: tmp.path().join("wwwroot").display().to_string(),
        file_size_limit: 5 * 1024 * 1024,
    });

    let app = product_service::create_router(Arc::new(db), config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server crashed");
    });

    TestService {
        base_url: format!("http://{}", addr),
        _tmp: tmp,
    }
}

/// `product_api_base` is the product collection URL of a (possibly dead)
/// Product API, e.g. `http://127.0.0.1:37155/api/products`.
pub async fn spawn_transaction_service(product_api_base: &str) -> TestService {
    let tmp = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = tmp.path().join("transactions.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    transaction_service::entities::setup_schema(&db).await;
    transaction_service::entities::seed_transaction_types(&db).await;

    let config = Arc::new(TransactionServiceConfig {
        database_url,
        bind_addr: "127.0.0.1:0".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        product_service_url: product_api_base.to_string(),
    });

    let client = Arc::new(ProductClient::new(config.product_service_url.clone()));
    let app = transaction_service::create_router(Arc::new(db), client, config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server crashed");
    });

    TestService {
        base_url: format!("http://{}", addr),
        _tmp: tmp,
    }
}

/// Spawns both services, with the transaction service wired to the product
/// service's collection URL.
pub async fn spawn_service_pair() -> (TestService, TestService) {
    let products = spawn_product_service().await;
    let transactions =
        spawn_transaction_service(&format!("{}/api/products", products.base_url)).await;
    (products, transactions)
}

pub async fn create_category(client: &Client, products: &TestService) -> i64 {
    let response = client
        .post(products.url("/api/categories"))
        .json(&json!({
            "name": "General",
            "description": "Catch-all category"
        }))
        .send()
        .await
        .expect("Failed to send create category request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create category response JSON");
    body["categoryId"].as_i64().expect("categoryId missing")
}

pub async fn create_product(
    client: &Client,
    products: &TestService,
    name: &str,
    price: f64,
    stock: i64,
    category_id: i64,
) -> i64 {
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": name,
            "description": "Test product",
            "categoryId": category_id,
            "price": price,
            "stock": stock
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create product response JSON");
    body["productId"].as_i64().expect("productId missing")
}

pub async fn fetch_stock(client: &Client, products: &TestService, product_id: i64) -> i64 {
    let response = client
        .get(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send get product request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse get product response JSON");
    body["stock"].as_i64().expect("stock missing")
}
