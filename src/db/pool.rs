use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(database_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await
        .expect("Failed to connect to Postgres")
}

/// Postgres SQLSTATE for an exclusion-constraint violation.
pub const EXCLUSION_VIOLATION: &str = "23P01";
/// Postgres SQLSTATE for a foreign-key violation.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
/// Postgres SQLSTATE for a unique-constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Returns the SQLSTATE code carried by a database error, if any.
pub fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}
