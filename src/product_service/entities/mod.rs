pub mod category;
pub mod product;

use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

use crate::product_service::entities::{category::Entity as Category, product::Entity as Product};

pub async fn setup_schema(db: &DatabaseConnection) {
    let schema = Schema::new(db.get_database_backend());
    let mut create_category_table = schema.create_table_from_entity(Category);
    create_category_table.if_not_exists();
    let mut create_product_table = schema.create_table_from_entity(Product);
    create_product_table.if_not_exists();

    db.execute(db.get_database_backend().build(&create_category_table))
        .await
        .expect("Failed to create category schema");
    db.execute(db.get_database_backend().build(&create_product_table))
        .await
        .expect("Failed to create product schema");
}
