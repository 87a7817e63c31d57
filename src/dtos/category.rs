use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::category::Category> for CategoryResponse {
    fn from(category: crate::models::category::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            product_count: category.product_count,
            created_at: category.created_at,
        }
    }
}
