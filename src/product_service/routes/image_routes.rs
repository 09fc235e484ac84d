use axum::{
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::config::ProductServiceConfig;
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn public_image_routes() -> Router {
    Router::new().route("/images/products/:file_name", get(print_image))
}

//ROUTES
async fn print_image(
    Path(file_name): Path<String>,
    Extension(config): Extension<Arc<ProductServiceConfig>>,
) -> Response {
    if file_name.contains("..") || file_name.contains('/') {
        let tmp = "Not found".to_string();
        return to_response(
            (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
            Err(ApiError::General("Rejected image path".to_string())),
        );
    }

    let path = std::path::Path::new(&config.web_root)
        .join("images/products")
        .join(&file_name);

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            return to_response(
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "message": "Not found"
                    })),
                ),
                Err(ApiError::General(err.to_string())),
            );
        }
    };

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let stream = ReaderStream::new(file);
    let body = axum::body::Body::from_stream(stream);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    to_response((headers, body), Ok(()))
}
