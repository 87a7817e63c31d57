// Fixtures for the database backed handler tests.
use sqlx::PgPool;

use crate::config::Config;
use crate::middleware::auth::AuthContext;
use crate::state::AppState;

pub fn state(pool: PgPool) -> AppState {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/unused".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap();
    AppState::new(pool, config)
}

pub async fn seed_user(pool: &PgPool, email: &str, role: &str) -> AuthContext {
    let user_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (first_name, last_name, email, password_hash, role_id)
         SELECT 'Test', 'User', $1, 'not-a-hash', id FROM roles WHERE name = $2
         RETURNING id",
    )
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();
    AuthContext { user_id, role: role.to_string() }
}

pub async fn seed_category(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn seed_product(pool: &PgPool, category_id: i64, sku: &str, stock: i32) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (name, sku, category_id, cost_price, stock)
         VALUES ($1, $1, $2, 4.00, $3) RETURNING id",
    )
    .bind(sku)
    .bind(category_id)
    .bind(stock)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn stock_of(pool: &PgPool, product_id: i64) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
