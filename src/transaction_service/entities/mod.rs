pub mod transaction;
pub mod transaction_type;

use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
    TransactionTrait,
};

use crate::transaction_service::entities::{
    transaction::Entity as Transaction,
    transaction_type::{Entity as TransactionType, StockDirection},
};

pub async fn setup_schema(db: &DatabaseConnection) {
    let schema = Schema::new(db.get_database_backend());
    let mut create_transaction_type_table = schema.create_table_from_entity(TransactionType);
    create_transaction_type_table.if_not_exists();
    let mut create_transaction_table = schema.create_table_from_entity(Transaction);
    create_transaction_table.if_not_exists();

    db.execute(db.get_database_backend().build(&create_transaction_type_table))
        .await
        .expect("Failed to create transaction type schema");
    db.execute(db.get_database_backend().build(&create_transaction_table))
        .await
        .expect("Failed to create transaction schema");
}

/// Inserts the two conventional movement types on first boot.
pub async fn seed_transaction_types(db: &DatabaseConnection) {
    let existing = TransactionType::find()
        .count(db)
        .await
        .expect("Failed to count transaction types");
    if existing > 0 {
        return;
    }

    let purchase = transaction_type::ActiveModel {
        id: Set(1),
        name: Set("Compra".to_owned()),
        kind: Set(StockDirection::Inbound),
    };
    let sale = transaction_type::ActiveModel {
        id: Set(2),
        name: Set("Venta".to_owned()),
        kind: Set(StockDirection::Outbound),
    };

    let txn = db
        .begin()
        .await
        .expect("Failed to seed transaction types, but seeding was requested");
    TransactionType::insert_many([purchase, sale])
        .exec(&txn)
        .await
        .expect("Failed to seed transaction types, but seeding was requested");
    txn.commit()
        .await
        .expect("Failed to seed transaction types, but seeding was requested");
}
