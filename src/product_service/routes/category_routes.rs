use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::middleware::logging::{to_response, ApiError};
use crate::product_service::entities::category::{self, Entity as CategoryEntity};

//ROUTERS
pub fn category_routes() -> Router {
    Router::new()
        .route("/categories", get(get_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

//ROUTES
async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
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

    match CategoryEntity::find().all(&txn).await {
        Ok(categories) => to_response((StatusCode::OK, Json(categories)), Ok(())),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fetch categories",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn get_category(
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

    match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => to_response((StatusCode::OK, Json(found)), Ok(())),
        Ok(None) => {
            let tmp = format!("No category with id {} was found", id);
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

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCategoryPayload>,
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

    let new_category = category::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        ..Default::default()
    };

    let inserted_id = match CategoryEntity::insert(new_category).exec(&txn).await {
        Ok(insertion) => insertion.last_insert_id,
        Err(err) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create category",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let created = match CategoryEntity::find_by_id(inserted_id).one(&txn).await {
        Ok(Some(created)) => created,
        Ok(None) | Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create category"
                    })),
                ),
                Err(ApiError::DbError("Created category went missing".to_string())),
            );
        }
    };

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                [(header::LOCATION, format!("/api/categories/{}", inserted_id))],
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

async fn update_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Response {
    if payload.category_id != id {
        let tmp = "Category id mismatch".to_string();
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

    match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => {
            let mut existing: category::ActiveModel = existing.into();
            existing.name = Set(payload.fields.name);
            existing.description = Set(payload.fields.description);

            match existing.update(&txn).await {
                Ok(updated) => match txn.commit().await {
                    Ok(_) => to_response((StatusCode::OK, Json(updated)), Ok(())),
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
                                "message": "Failed to update category",
                                "error": err.to_string()
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => {
            let tmp = format!("No category with id {} was found", id);
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

async fn delete_category(
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

    match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => {
            let existing: category::ActiveModel = existing.into();
            match existing.delete(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response(
                        (
                            StatusCode::OK,
                            Json(json!({
                                "message": "Category deleted successfully"
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
                    //Restrictive FK: categories still referenced by products land here.
                    let _ = txn.rollback().await;
                    to_response(
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "message": "Failed to delete this category"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => {
            let tmp = format!("No category with id {} was found", id);
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

//Structs
#[derive(Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateCategoryPayload {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    description: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateCategoryPayload {
    category_id: i32,
    #[serde(flatten)]
    fields: CreateCategoryPayload,
}
