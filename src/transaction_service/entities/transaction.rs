use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::transaction_service::entities::transaction_type::Entity as TransactionType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(rename = "transactionId")]
    pub id: i32,
    pub transaction_date: DateTimeUtc,
    pub transaction_type_id: i32,
    /// References a product owned by the Product API; no enforceable FK.
    pub product_id: i32,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub total_price: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "TransactionType",
        from = "crate::transaction_service::entities::transaction::Column::TransactionTypeId",
        to = "crate::transaction_service::entities::transaction_type::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict",
    )]
    TransactionType,
}

impl Related<TransactionType> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
