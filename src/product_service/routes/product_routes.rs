use axum::{
    extract::{Extension, Multipart, Path},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::fs as tokio_fs;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::ProductServiceConfig;
use crate::middleware::logging::{to_response, ApiError};
use crate::product_service::entities::{
    category,
    product::{self, Entity as ProductEntity},
};

pub const MISSING_CATEGORY_LABEL: &str = "Sin categoría";

//ROUTERS
pub fn product_routes() -> Router {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/:id/stock", put(update_stock))
        .route("/products/:id/image", post(upload_image))
}

//ROUTES
async fn get_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let result = products_with_category()
        .into_model::<ProductRow>()
        .all(&txn)
        .await;
    match result {
        Ok(rows) => {
            let response: Vec<ProductResponse> =
                rows.into_iter().map(ProductResponse::new).collect();
            tracing::info!(count = response.len(), "Fetched products");
            for item in response.iter().filter(|p| p.category_name == MISSING_CATEGORY_LABEL) {
                tracing::warn!(
                    product_id = item.product_id,
                    name = %item.name,
                    category_id = item.category_id,
                    "Product with unresolvable category"
                );
            }
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fetch products",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    match find_product_response(&txn, id).await {
        Ok(Some(prod)) => to_response((StatusCode::OK, Json(prod)), Ok(())),
        Ok(None) => {
            let tmp = format!("No product with id {} was found", id);
            to_response(
                (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            )
        }
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Internal server error"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateProductPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Validation failed",
                    "details": err.to_string()
                })),
            ),
            Err(ApiError::ValidationFail(err.to_string())),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    match category::Entity::find_by_id(payload.category_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let tmp = format!("No category with id {} was found", payload.category_id);
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    }

    let now = Utc::now();
    let new_product = product::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        category_id: Set(payload.category_id),
        image_url: Set(payload.image_url),
        price: Set(payload.price),
        stock: Set(payload.stock),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted_id = match ProductEntity::insert(new_product).exec(&txn).await {
        Ok(insertion) => insertion.last_insert_id,
        Err(err) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create product",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let created = match find_product_response(&txn, inserted_id).await {
        Ok(Some(created)) => created,
        Ok(None) | Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create product"
                    })),
                ),
                Err(ApiError::DbError("Created product went missing".to_string())),
            );
        }
    };

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                [(header::LOCATION, format!("/api/products/{}", inserted_id))],
                Json(created),
            ),
            Ok(()),
        ),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Internal server error"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateProductPayload>,
) -> Response {
    if payload.product_id != id {
        let tmp = "Product id mismatch".to_string();
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    if let Err(err) = payload.fields.validate() {
        return to_response(
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Validation failed",
                    "details": err.to_string()
                })),
            ),
            Err(ApiError::ValidationFail(err.to_string())),
        );
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            let tmp = format!("No product with id {} was found", id);
            return to_response(
                (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    match category::Entity::find_by_id(payload.fields.category_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let tmp = format!("No category with id {} was found", payload.fields.category_id);
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    }

    let mut existing: product::ActiveModel = existing.into();
    existing.name = Set(payload.fields.name);
    existing.description = Set(payload.fields.description);
    existing.category_id = Set(payload.fields.category_id);
    existing.image_url = Set(payload.fields.image_url);
    existing.price = Set(payload.fields.price);
    existing.stock = Set(payload.fields.stock);
    existing.updated_at = Set(Utc::now());

    if let Err(err) = existing.update(&txn).await {
        let _ = txn.rollback().await;
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to update product",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        );
    }

    respond_with_product(txn, id, StatusCode::OK).await
}

async fn update_stock(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateStockPayload>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            let tmp = format!("No product with id {} was found", id);
            return to_response(
                (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    //Blind absolute overwrite: all delta math belongs to the caller.
    let mut existing: product::ActiveModel = existing.into();
    existing.stock = Set(payload.stock);
    existing.updated_at = Set(Utc::now());

    if let Err(err) = existing.update(&txn).await {
        let _ = txn.rollback().await;
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to update stock",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        );
    }

    respond_with_product(txn, id, StatusCode::OK).await
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => {
            let existing: product::ActiveModel = existing.into();
            match existing.delete(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response(
                        (
                            StatusCode::OK,
                            Json(json!({
                                "message": "Product deleted successfully"
                            })),
                        ),
                        Ok(()),
                    ),
                    Err(err) => to_response(
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({
                                "message": "Internal server error"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    ),
                },
                Err(err) => {
                    let _ = txn.rollback().await;
                    to_response(
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "message": "Failed to delete this product"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => {
            let tmp = format!("No product with id {} was found", id);
            to_response(
                (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            )
        }
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Internal server error"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn upload_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<ProductServiceConfig>>,
    mut multipart: Multipart,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::TransactionCreationFailed),
            );
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            let tmp = "Product not found".to_string();
            return to_response(
                (StatusCode::NOT_FOUND, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let field = match multipart.next_field().await.unwrap_or(None) {
        Some(field) => field,
        None => {
            let tmp = "No image file provided".to_string();
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
    };

    let content_type = match field.content_type() {
        Some(content_type) => content_type.to_owned(),
        None => {
            let tmp = "Content type is not set".to_string();
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }
    };

    if !allowed_content_types().contains_key(content_type.as_str()) {
        let tmp = "Unsupported content type".to_string();
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    let file_name = field
        .file_name()
        .map(|name| name.to_owned())
        .unwrap_or_else(|| "upload".to_string());
    if !FILE_NAME_REGEX.is_match(&file_name) {
        let tmp = "Invalid file name. It should contain only Latin letters, numbers, '.', '-', or '_'".to_string();
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(err) => {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to read file bytes"
                    })),
                ),
                Err(ApiError::General(format!("Multipart error: {err}"))),
            );
        }
    };
    if data.len() > config.file_size_limit {
        let tmp = "Payload too large".to_string();
        return to_response(
            (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    let images_dir = std::path::Path::new(&config.web_root).join("images/products");
    if let Err(err) = tokio_fs::create_dir_all(&images_dir).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to store the image",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::General(err.to_string())),
        );
    }

    //Best effort: a leftover file must not block the new upload.
    if let Some(old_url) = existing.image_url.clone() {
        if let Some(old_name) = old_url.strip_prefix("/images/products/") {
            if let Err(err) = tokio_fs::remove_file(images_dir.join(old_name)).await {
                tracing::warn!(
                    product_id = id,
                    old_url = %old_url,
                    error = %err,
                    "Could not delete previous product image"
                );
            }
        }
    }

    let unique_name = format!("{}_{}", Uuid::new_v4(), file_name);
    if let Err(err) = tokio_fs::write(images_dir.join(&unique_name), &data).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to store the image",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::General(err.to_string())),
        );
    }

    let image_url = format!("/images/products/{}", unique_name);
    let mut existing: product::ActiveModel = existing.into();
    existing.image_url = Set(Some(image_url.clone()));
    existing.updated_at = Set(Utc::now());

    match existing.update(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (StatusCode::OK, Json(json!({ "imageUrl": image_url }))),
                Ok(()),
            ),
            Err(err) => to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            ),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to record the image",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            )
        }
    }
}

//Structs
#[derive(Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateProductPayload {
    #[validate(length(min = 3, max = 200, message = "Name must be between 3 and 200 characters"))]
    name: String,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    description: Option<String>,
    #[validate(range(min = 1, message = "A valid category must be selected"))]
    category_id: i32,
    #[validate(
        length(max = 500, message = "Image URL cannot exceed 500 characters"),
        regex(
            path = *IMAGE_URL_REGEX,
            message = "Image URL must start with /images/products/ or be an http(s) URL"
        )
    )]
    image_url: Option<String>,
    #[validate(custom(function = validate_price))]
    price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    stock: i32,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateProductPayload {
    product_id: i32,
    #[serde(flatten)]
    fields: CreateProductPayload,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateStockPayload {
    stock: i32,
}

#[derive(FromQueryResult)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    category_id: i32,
    category_name: Option<String>,
    image_url: Option<String>,
    price: Decimal,
    stock: i32,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    product_id: i32,
    name: String,
    description: Option<String>,
    category_id: i32,
    category_name: String,
    image_url: Option<String>,
    price: Decimal,
    stock: i32,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl ProductResponse {
    fn new(value: ProductRow) -> ProductResponse {
        ProductResponse {
            product_id: value.id,
            name: value.name,
            description: value.description,
            category_id: value.category_id,
            category_name: value
                .category_name
                .unwrap_or_else(|| MISSING_CATEGORY_LABEL.to_string()),
            image_url: value.image_url,
            price: value.price,
            stock: value.stock,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

//utils
fn products_with_category() -> sea_orm::Select<ProductEntity> {
    ProductEntity::find()
        .join(JoinType::LeftJoin, product::Relation::Category.def())
        .column_as(category::Column::Name, "category_name")
}

async fn find_product_response<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<ProductResponse>, sea_orm::DbErr> {
    use sea_orm::QueryFilter;

    let row = products_with_category()
        .filter(product::Column::Id.eq(id))
        .into_model::<ProductRow>()
        .one(conn)
        .await?;
    Ok(row.map(ProductResponse::new))
}

async fn respond_with_product(
    txn: sea_orm::DatabaseTransaction,
    id: i32,
    status: StatusCode,
) -> Response {
    let updated = match find_product_response(&txn, id).await {
        Ok(Some(updated)) => updated,
        Ok(None) | Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                ),
                Err(ApiError::DbError("Updated product went missing".to_string())),
            );
        }
    };

    match txn.commit().await {
        Ok(_) => to_response((status, Json(updated)), Ok(())),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Internal server error"
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must be greater than 0".into());
        Err(err)
    }
}

fn allowed_content_types() -> HashMap<&'static str, &'static str> {
    HashMap::from([("image/jpeg", "jpg"), ("image/png", "png")])
}

static IMAGE_URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(/images/products/.*|https?://.*|)$").unwrap());

static FILE_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]{1,100}$").unwrap());
