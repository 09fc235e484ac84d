pub mod config;
pub mod middleware;
pub mod product_service;
pub mod transaction_service;
