pub mod transaction_routes;
pub mod transaction_type_routes;
