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
use crate::transaction_service::entities::transaction_type::{
    self, Entity as TransactionTypeEntity, StockDirection,
};

//ROUTERS
pub fn transaction_type_routes() -> Router {
    Router::new()
        .route(
            "/transactiontypes",
            get(get_transaction_types).post(create_transaction_type),
        )
        .route(
            "/transactiontypes/:id",
            get(get_transaction_type)
                .put(update_transaction_type)
                .delete(delete_transaction_type),
        )
}

//ROUTES
async fn get_transaction_types(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
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

    match TransactionTypeEntity::find().all(&txn).await {
        Ok(kinds) => to_response((StatusCode::OK, Json(kinds)), Ok(())),
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fetch transaction types",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn get_transaction_type(
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

    match TransactionTypeEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => to_response((StatusCode::OK, Json(found)), Ok(())),
        Ok(None) => {
            let tmp = format!("No transaction type with id {} was found", id);
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

async fn create_transaction_type(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateTransactionTypePayload>,
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

    let new_kind = transaction_type::ActiveModel {
        name: Set(payload.name),
        kind: Set(payload.kind),
        ..Default::default()
    };

    let inserted_id = match TransactionTypeEntity::insert(new_kind).exec(&txn).await {
        Ok(insertion) => insertion.last_insert_id,
        Err(err) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create transaction type",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let created = match TransactionTypeEntity::find_by_id(inserted_id).one(&txn).await {
        Ok(Some(created)) => created,
        Ok(None) | Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create transaction type"
                    })),
                ),
                Err(ApiError::DbError(
                    "Created transaction type went missing".to_string(),
                )),
            );
        }
    };

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                [(
                    header::LOCATION,
                    format!("/api/transactiontypes/{}", inserted_id),
                )],
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

async fn update_transaction_type(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<UpdateTransactionTypePayload>,
) -> Response {
    if payload.transaction_type_id != id {
        let tmp = "Transaction type id mismatch".to_string();
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

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

    match TransactionTypeEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => {
            //Renames only: flipping a direction would retroactively invert
            //the reversal math of every recorded transaction.
            let mut existing: transaction_type::ActiveModel = existing.into();
            existing.name = Set(payload.name);

            match existing.update(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response((StatusCode::NO_CONTENT, ()), Ok(())),
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
                                "message": "Failed to update transaction type",
                                "error": err.to_string()
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => {
            let tmp = format!("No transaction type with id {} was found", id);
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

async fn delete_transaction_type(
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

    match TransactionTypeEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => {
            let existing: transaction_type::ActiveModel = existing.into();
            match existing.delete(&txn).await {
                Ok(_) => match txn.commit().await {
                    Ok(_) => to_response((StatusCode::NO_CONTENT, ()), Ok(())),
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
                    //Restrictive FK: types still referenced by transactions land here.
                    let _ = txn.rollback().await;
                    to_response(
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({
                                "message": "Failed to delete this transaction type"
                            })),
                        ),
                        Err(ApiError::DbError(err.to_string())),
                    )
                }
            }
        }
        Ok(None) => {
            let tmp = format!("No transaction type with id {} was found", id);
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
struct CreateTransactionTypePayload {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    name: String,
    #[serde(rename = "type")]
    kind: StockDirection,
}

#[derive(Deserialize, Validate, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateTransactionTypePayload {
    transaction_type_id: i32,
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    name: String,
}
