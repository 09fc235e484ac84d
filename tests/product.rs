mod common;

use reqwest::{Client, StatusCode};
use serde_json::json;

use common::{create_category, create_product, spawn_product_service};

#[tokio::test]
async fn test_create_and_get_product() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;

    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "Widget",
            "description": "A widget",
            "categoryId": category_id,
            "price": 10.0,
            "stock": 5
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Location header missing")
        .to_str()
        .expect("Location header unreadable")
        .to_string();
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");

    let product_id = body["productId"].as_i64().expect("productId missing");
    assert_eq!(location, format!("/api/products/{}", product_id));
    assert_eq!(body["name"], "Widget");
    assert_eq!(body["categoryName"], "General");
    assert_eq!(body["price"].as_f64(), Some(10.0));
    assert_eq!(body["stock"].as_i64(), Some(5));
    assert!(body["createdAt"].is_string());
    assert!(body["updatedAt"].is_string());

    let response = client
        .get(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send get product request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["productId"].as_i64(), Some(product_id));
    assert_eq!(body["categoryName"], "General");

    let response = client
        .get(products.url("/api/products"))
        .send()
        .await
        .expect("Failed to send list products request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    let listed = body.as_array().expect("Expected an array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["productId"].as_i64(), Some(product_id));
}

#[tokio::test]
async fn test_get_missing_product() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let response = client
        .get(products.url("/api/products/999"))
        .send()
        .await
        .expect("Failed to send get product request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert!(body["message"].as_str().expect("message missing").contains("999"));
}

#[tokio::test]
async fn test_create_product_validation() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;

    //Name below the 3 character minimum
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "ab",
            "categoryId": category_id,
            "price": 10.0,
            "stock": 5
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //Price must be strictly positive
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "Widget",
            "categoryId": category_id,
            "price": 0.0,
            "stock": 5
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //Negative stock is rejected on the catalog path
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "Widget",
            "categoryId": category_id,
            "price": 10.0,
            "stock": -1
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //Image URL outside the allowed shapes
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "Widget",
            "categoryId": category_id,
            "imageUrl": "ftp://example.com/widget.png",
            "price": 10.0,
            "stock": 5
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //Unknown category
    let response = client
        .post(products.url("/api/products"))
        .json(&json!({
            "name": "Widget",
            "categoryId": 9999,
            "price": 10.0,
            "stock": 5
        }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_product() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .put(products.url(&format!("/api/products/{}", product_id)))
        .json(&json!({
            "productId": product_id,
            "name": "Widget Mk2",
            "description": "Improved widget",
            "categoryId": category_id,
            "price": 12.5,
            "stock": 7
        }))
        .send()
        .await
        .expect("Failed to send update product request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["name"], "Widget Mk2");
    assert_eq!(body["price"].as_f64(), Some(12.5));
    assert_eq!(body["stock"].as_i64(), Some(7));

    let created_at =
        chrono::DateTime::parse_from_rfc3339(body["createdAt"].as_str().expect("createdAt missing"))
            .expect("createdAt unparsable");
    let updated_at =
        chrono::DateTime::parse_from_rfc3339(body["updatedAt"].as_str().expect("updatedAt missing"))
            .expect("updatedAt unparsable");
    assert!(updated_at >= created_at);
}

#[tokio::test]
async fn test_update_product_id_mismatch() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .put(products.url(&format!("/api/products/{}", product_id)))
        .json(&json!({
            "productId": product_id + 1,
            "name": "Widget Mk2",
            "categoryId": category_id,
            "price": 12.5,
            "stock": 7
        }))
        .send()
        .await
        .expect("Failed to send update product request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_endpoint_overwrites_blindly() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .put(products.url(&format!("/api/products/{}/stock", product_id)))
        .json(&json!({ "stock": 42 }))
        .send()
        .await
        .expect("Failed to send update stock request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["stock"].as_i64(), Some(42));
    assert_eq!(body["categoryName"], "General");

    //The setter applies no range check of its own; the caller owns the math.
    let response = client
        .put(products.url(&format!("/api/products/{}/stock", product_id)))
        .json(&json!({ "stock": -3 }))
        .send()
        .await
        .expect("Failed to send update stock request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["stock"].as_i64(), Some(-3));

    let response = client
        .put(products.url("/api/products/999/stock"))
        .json(&json!({ "stock": 1 }))
        .send()
        .await
        .expect("Failed to send update stock request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_product() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .delete(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send delete product request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send get product request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send delete product request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
