use std::env;

fn allowed_origins(fallback: &str) -> Vec<String> {
    env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| fallback.to_string())
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[derive(Clone, Debug)]
pub struct ProductServiceConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    /// Directory that backs the public `/images/products/` path.
    pub web_root: String,
    pub file_size_limit: usize,
}

impl ProductServiceConfig {
    pub fn from_env() -> Self {
        ProductServiceConfig {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://products.db?mode=rwc".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5007".to_string()),
            allowed_origins: allowed_origins("http://localhost:3000,http://localhost:5008"),
            web_root: env::var("WEB_ROOT").unwrap_or_else(|_| "./wwwroot".to_string()),
            file_size_limit: env::var("FILE_SIZE_LIMIT")
                .ok()
                .and_then(|limit| limit.parse::<usize>().ok())
                .unwrap_or(5 * 1024 * 1024),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransactionServiceConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    /// Base URL of the product collection on the Product API,
    /// e.g. `http://localhost:5007/api/products`.
    pub product_service_url: String,
}

impl TransactionServiceConfig {
    pub fn from_env() -> Self {
        TransactionServiceConfig {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://transactions.db?mode=rwc".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5008".to_string()),
            allowed_origins: allowed_origins("http://localhost:3000,http://localhost:5007"),
            product_service_url: env::var("PRODUCT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:5007/api/products".to_string()),
        }
    }
}
