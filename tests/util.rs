use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use surveysync::{migrate, Store};

#[allow(dead_code)]
pub async fn memory_store() -> Result<Store> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    migrate::apply_migrations(&pool).await?;
    Ok(Store::from_pool(pool))
}

/// Insert a surveyor row with a controlled creation timestamp, bypassing
/// the store's own clock.
#[allow(dead_code)]
pub async fn seed_surveyor_at(store: &Store, created_at: i64, status: &str) -> Result<i64> {
    let res = sqlx::query(
        "INSERT INTO surveyors (full_name, email, phone_number, region, id_number, created_at, status) \
         VALUES ('Seeded Surveyor', 'seed@example.com', '+1000000', 'North', 'S-1', ?, ?)",
    )
    .bind(created_at)
    .bind(status)
    .execute(store.pool())
    .await?;
    Ok(res.last_insert_rowid())
}

#[allow(dead_code)]
pub async fn seed_regular_at(store: &Store, created_at: i64, status: &str) -> Result<i64> {
    let res = sqlx::query(
        "INSERT INTO survey_regular_responses (step1, step2, step3, step4, created_at, status) \
         VALUES ('{}', '{}', '{}', '{}', ?, ?)",
    )
    .bind(created_at)
    .bind(status)
    .execute(store.pool())
    .await?;
    Ok(res.last_insert_rowid())
}

#[allow(dead_code)]
pub async fn seed_event_at(store: &Store, created_at: i64, status: &str) -> Result<i64> {
    let res = sqlx::query(
        "INSERT INTO survey_event_responses (event_date, location, step1, step2, step3, created_at, status) \
         VALUES ('2024-06-01', 'Community hall', '{}', '{}', '{}', ?, ?)",
    )
    .bind(created_at)
    .bind(status)
    .execute(store.pool())
    .await?;
    Ok(res.last_insert_rowid())
}
