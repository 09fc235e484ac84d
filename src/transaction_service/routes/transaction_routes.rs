use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::middleware::logging::{to_response, ApiError};
use crate::transaction_service::entities::{
    transaction::{self, Entity as TransactionEntity},
    transaction_type::{self, Entity as TransactionTypeEntity, StockDirection},
};
use crate::transaction_service::product_client::{ProductClient, ProductClientError};

//ROUTERS
pub fn transaction_routes() -> Router {
    Router::new()
        .route("/transactions", get(get_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route(
            "/transactions/product/:product_id",
            get(get_transactions_by_product),
        )
}

//ROUTES
async fn get_transactions(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
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

    let result = TransactionEntity::find()
        .find_also_related(TransactionTypeEntity)
        .order_by_desc(transaction::Column::TransactionDate)
        .all(&txn)
        .await;
    match result {
        Ok(rows) => {
            let response: Vec<TransactionResponse> = rows
                .into_iter()
                .map(|(row, kind)| TransactionResponse::new(row, kind))
                .collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fetch transactions",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn get_transaction(
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

    let result = TransactionEntity::find_by_id(id)
        .find_also_related(TransactionTypeEntity)
        .one(&txn)
        .await;
    match result {
        Ok(Some((row, kind))) => to_response(
            (StatusCode::OK, Json(TransactionResponse::new(row, kind))),
            Ok(()),
        ),
        Ok(None) => {
            let tmp = format!("No transaction with id {} was found", id);
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

async fn get_transactions_by_product(
    Path(product_id): Path<i32>,
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

    let result = TransactionEntity::find()
        .filter(transaction::Column::ProductId.eq(product_id))
        .find_also_related(TransactionTypeEntity)
        .order_by_desc(transaction::Column::TransactionDate)
        .all(&txn)
        .await;
    match result {
        Ok(rows) => {
            let response: Vec<TransactionResponse> = rows
                .into_iter()
                .map(|(row, kind)| TransactionResponse::new(row, kind))
                .collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to fetch the product's transactions",
                    "error": err.to_string()
                })),
            ),
            Err(ApiError::DbError(err.to_string())),
        ),
    }
}

async fn create_transaction(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(client): Extension<Arc<ProductClient>>,
    Json(payload): Json<CreateTransactionPayload>,
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

    let kind = match TransactionTypeEntity::find_by_id(payload.transaction_type_id)
        .one(&txn)
        .await
    {
        Ok(Some(kind)) => kind,
        Ok(None) => {
            let tmp = "Invalid transaction type".to_string();
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
    };

    //Hard dependency: no live Product API, no transaction.
    let product = match client.fetch_product(payload.product_id).await {
        Ok(product) => product,
        Err(err) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Could not fetch product information",
                        "details": err.to_string()
                    })),
                ),
                Err(ApiError::Upstream(err.to_string())),
            );
        }
    };

    if kind.kind == StockDirection::Outbound && product.stock < payload.quantity {
        let tmp = format!("Insufficient stock. Current stock: {}", product.stock);
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    let new_stock = product.stock + kind.kind.applied_delta(payload.quantity);
    tracing::info!(
        product_id = product.product_id,
        product_name = %product.name,
        current_stock = product.stock,
        new_stock,
        "Pushing stock adjustment"
    );

    //Stock moves first; a failure here leaves no orphan transaction row.
    if let Err(err) = client.update_stock(payload.product_id, new_stock).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to update product stock",
                    "error": upstream_detail(&err)
                })),
            ),
            Err(ApiError::Upstream(err.to_string())),
        );
    }

    let now = Utc::now();
    let new_transaction = transaction::ActiveModel {
        transaction_date: Set(now),
        transaction_type_id: Set(payload.transaction_type_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        unit_price: Set(payload.unit_price),
        total_price: Set(payload.unit_price * Decimal::from(payload.quantity)),
        details: Set(payload.details),
        created_at: Set(now),
        ..Default::default()
    };

    let inserted_id = match TransactionEntity::insert(new_transaction).exec(&txn).await {
        Ok(insertion) => insertion.last_insert_id,
        Err(err) => {
            //Stock is already pushed; the drift is reported, not repaired.
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create transaction",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let created = match TransactionEntity::find_by_id(inserted_id).one(&txn).await {
        Ok(Some(created)) => created,
        Ok(None) | Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to create transaction"
                    })),
                ),
                Err(ApiError::DbError(
                    "Created transaction went missing".to_string(),
                )),
            );
        }
    };

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                [(header::LOCATION, format!("/api/transactions/{}", inserted_id))],
                Json(TransactionResponse::new(created, Some(kind))),
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

async fn update_transaction(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(client): Extension<Arc<ProductClient>>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Response {
    if payload.transaction_id != id {
        let tmp = "Transaction id mismatch".to_string();
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

    let (existing, existing_kind) = match TransactionEntity::find_by_id(id)
        .find_also_related(TransactionTypeEntity)
        .one(&txn)
        .await
    {
        Ok(Some((existing, Some(existing_kind)))) => (existing, existing_kind),
        Ok(Some((_, None))) => {
            let tmp = format!("Transaction {} has no transaction type", id);
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": tmp })),
                ),
                Err(ApiError::DbError(tmp)),
            );
        }
        Ok(None) => {
            let tmp = format!("No transaction with id {} was found", id);
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

    let quantity_diff = payload.fields.quantity - existing.quantity;

    if quantity_diff != 0 {
        let product = match client.fetch_product(payload.fields.product_id).await {
            Ok(product) => product,
            Err(err) => {
                return to_response(
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "message": "Could not fetch product information",
                            "details": err.to_string()
                        })),
                    ),
                    Err(ApiError::Upstream(err.to_string())),
                );
            }
        };

        //Adjustment sign comes from the movement type already on record.
        let new_stock = product.stock + existing_kind.kind.reversal_delta(quantity_diff);
        if new_stock < 0 {
            let tmp = "The update would result in negative stock".to_string();
            return to_response(
                (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
                Err(ApiError::General(tmp)),
            );
        }

        if let Err(err) = client
            .update_stock(payload.fields.product_id, new_stock)
            .await
        {
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to update product stock",
                        "error": upstream_detail(&err)
                    })),
                ),
                Err(ApiError::Upstream(err.to_string())),
            );
        }
    }

    let mut existing: transaction::ActiveModel = existing.into();
    existing.transaction_date = Set(payload.transaction_date);
    existing.transaction_type_id = Set(payload.fields.transaction_type_id);
    existing.product_id = Set(payload.fields.product_id);
    existing.quantity = Set(payload.fields.quantity);
    existing.unit_price = Set(payload.fields.unit_price);
    existing.total_price =
        Set(payload.fields.unit_price * Decimal::from(payload.fields.quantity));
    existing.details = Set(payload.fields.details);

    let updated = match existing.update(&txn).await {
        Ok(updated) => updated,
        Err(err) => {
            //Stock may already be pushed; the drift is reported, not repaired.
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to update transaction",
                        "error": err.to_string()
                    })),
                ),
                Err(ApiError::DbError(err.to_string())),
            );
        }
    };

    let kind = match TransactionTypeEntity::find_by_id(updated.transaction_type_id)
        .one(&txn)
        .await
    {
        Ok(kind) => kind,
        Err(err) => {
            let _ = txn.rollback().await;
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

    match txn.commit().await {
        Ok(_) => to_response(
            (StatusCode::OK, Json(TransactionResponse::new(updated, kind))),
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

async fn delete_transaction(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(client): Extension<Arc<ProductClient>>,
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

    let (existing, existing_kind) = match TransactionEntity::find_by_id(id)
        .find_also_related(TransactionTypeEntity)
        .one(&txn)
        .await
    {
        Ok(Some((existing, Some(existing_kind)))) => (existing, existing_kind),
        Ok(Some((_, None))) => {
            let tmp = format!("Transaction {} has no transaction type", id);
            return to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": tmp })),
                ),
                Err(ApiError::DbError(tmp)),
            );
        }
        Ok(None) => {
            let tmp = format!("No transaction with id {} was found", id);
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

    let product = match client.fetch_product(existing.product_id).await {
        Ok(product) => product,
        Err(err) => {
            return to_response(
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Could not fetch product information",
                        "details": err.to_string()
                    })),
                ),
                Err(ApiError::Upstream(err.to_string())),
            );
        }
    };

    let new_stock = product.stock + existing_kind.kind.reversal_delta(existing.quantity);
    if new_stock < 0 {
        let tmp = "Deleting this transaction would result in negative stock".to_string();
        return to_response(
            (StatusCode::BAD_REQUEST, Json(json!({ "message": tmp }))),
            Err(ApiError::General(tmp)),
        );
    }

    if let Err(err) = client.update_stock(existing.product_id, new_stock).await {
        return to_response(
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to update product stock",
                    "error": upstream_detail(&err)
                })),
            ),
            Err(ApiError::Upstream(err.to_string())),
        );
    }

    let existing: transaction::ActiveModel = existing.into();
    match existing.delete(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Transaction deleted successfully"
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
            //Stock is already restored; the drift is reported, not repaired.
            let _ = txn.rollback().await;
            to_response(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Failed to delete transaction",
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
struct CreateTransactionPayload {
    #[validate(range(min = 1, message = "A valid transaction type must be selected"))]
    transaction_type_id: i32,
    #[validate(range(min = 1, message = "A valid product must be selected"))]
    product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    quantity: i32,
    #[validate(custom(function = validate_unit_price))]
    unit_price: Decimal,
    #[validate(length(max = 500, message = "Details cannot exceed 500 characters"))]
    details: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateTransactionPayload {
    transaction_id: i32,
    transaction_date: DateTime<Utc>,
    #[serde(flatten)]
    fields: CreateTransactionPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionResponse {
    transaction_id: i32,
    transaction_date: DateTime<Utc>,
    transaction_type_id: i32,
    transaction_type: Option<transaction_type::Model>,
    product_id: i32,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl TransactionResponse {
    fn new(value: transaction::Model, kind: Option<transaction_type::Model>) -> TransactionResponse {
        TransactionResponse {
            transaction_id: value.id,
            transaction_date: value.transaction_date,
            transaction_type_id: value.transaction_type_id,
            transaction_type: kind,
            product_id: value.product_id,
            quantity: value.quantity,
            unit_price: value.unit_price,
            total_price: value.total_price,
            details: value.details,
            created_at: value.created_at,
        }
    }
}

//utils
fn validate_unit_price(unit_price: &Decimal) -> Result<(), ValidationError> {
    if *unit_price > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("unit_price");
        err.message = Some("Unit price must be greater than 0".into());
        Err(err)
    }
}

fn upstream_detail(err: &ProductClientError) -> String {
    err.upstream_body()
        .map(|body| body.to_string())
        .unwrap_or_else(|| err.to_string())
}
