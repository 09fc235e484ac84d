mod common;

use reqwest::{multipart, Client, StatusCode};

use common::{create_category, create_product, spawn_product_service};

//1x1 transparent PNG
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn png_form(file_name: &str) -> multipart::Form {
    let part = multipart::Part::bytes(PNG_BYTES.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to build multipart part");
    multipart::Form::new().part("image", part)
}

#[tokio::test]
async fn test_upload_and_serve_image() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .post(products.url(&format!("/api/products/{}/image", product_id)))
        .multipart(png_form("widget.png"))
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    let image_url = body["imageUrl"].as_str().expect("imageUrl missing").to_string();
    assert!(image_url.starts_with("/images/products/"));
    assert!(image_url.ends_with("widget.png"));

    //The product now carries the recorded URL
    let response = client
        .get(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send get product request");
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert_eq!(body["imageUrl"].as_str(), Some(image_url.as_str()));

    //And the file is served back with its content type
    let response = client
        .get(products.url(&image_url))
        .send()
        .await
        .expect("Failed to send image request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .expect("Content type missing"),
        "image/png"
    );
    let served = response.bytes().await.expect("Failed to read image bytes");
    assert_eq!(served.as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn test_upload_replaces_previous_image() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    let response = client
        .post(products.url(&format!("/api/products/{}/image", product_id)))
        .multipart(png_form("first.png"))
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    let first_url = body["imageUrl"].as_str().expect("imageUrl missing").to_string();

    let response = client
        .post(products.url(&format!("/api/products/{}/image", product_id)))
        .multipart(png_form("second.png"))
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    let second_url = body["imageUrl"].as_str().expect("imageUrl missing").to_string();
    assert_ne!(first_url, second_url);

    //The replaced file is gone, the new one serves
    let response = client
        .get(products.url(&first_url))
        .send()
        .await
        .expect("Failed to send image request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .get(products.url(&second_url))
        .send()
        .await
        .expect("Failed to send image request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_rejections() {
    let products = spawn_product_service().await;
    let client = Client::new();

    let category_id = create_category(&client, &products).await;
    let product_id = create_product(&client, &products, "Widget", 10.0, 5, category_id).await;

    //Unknown product
    let response = client
        .post(products.url("/api/products/999/image"))
        .multipart(png_form("widget.png"))
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    //Unsupported content type
    let part = multipart::Part::bytes(b"not an image".to_vec())
        .file_name("widget.txt")
        .mime_str("text/plain")
        .expect("Failed to build multipart part");
    let response = client
        .post(products.url(&format!("/api/products/{}/image", product_id)))
        .multipart(multipart::Form::new().part("image", part))
        .send()
        .await
        .expect("Failed to send upload request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    //The rejected uploads never touched the product
    let response = client
        .get(products.url(&format!("/api/products/{}", product_id)))
        .send()
        .await
        .expect("Failed to send get product request");
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse response JSON");
    assert!(body["imageUrl"].is_null());
}
