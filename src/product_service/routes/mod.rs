pub mod category_routes;
pub mod image_routes;
pub mod product_routes;
