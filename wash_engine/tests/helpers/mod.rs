//! Shared helpers for the engine integration tests: a throwaway SQLite database per test and
//! direct seeding of the catalog/user records the engine itself only reads.
#![allow(dead_code)]
use tempfile::TempDir;
use wash_engine::{db_types::Role, SqliteDatabase};

pub async fn new_test_db() -> (SqliteDatabase, TempDir) {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().expect("Could not create temporary directory");
    let path = dir.path().join("wash_test.db");
    let url = format!("sqlite://{}", path.display());
    let db = SqliteDatabase::new_with_url(&url, 16).await.expect("Error creating test database");
    (db, dir)
}

pub async fn seed_user(db: &SqliteDatabase, name: &str, role: Role) -> i64 {
    sqlx::query("INSERT INTO users (name, role) VALUES ($1, $2)")
        .bind(name)
        .bind(role.to_string())
        .execute(db.pool())
        .await
        .expect("Error seeding user")
        .last_insert_rowid()
}

pub async fn seed_service(db: &SqliteDatabase, name: &str, price_cents: i64, active: bool) -> i64 {
    sqlx::query("INSERT INTO services (name, price, active) VALUES ($1, $2, $3)")
        .bind(name)
        .bind(price_cents)
        .bind(active)
        .execute(db.pool())
        .await
        .expect("Error seeding service")
        .last_insert_rowid()
}

pub async fn seed_vehicle(db: &SqliteDatabase, owner_id: i64, make: &str, model: &str, plate: &str) -> i64 {
    sqlx::query("INSERT INTO vehicles (owner_id, make, model, plate) VALUES ($1, $2, $3, $4)")
        .bind(owner_id)
        .bind(make)
        .bind(model)
        .bind(plate)
        .execute(db.pool())
        .await
        .expect("Error seeding vehicle")
        .last_insert_rowid()
}

/// Seed one customer with a sedan and a $20 wash service, returning
/// (customer, vehicle, service) ids.
pub async fn seed_basic_booking_world(db: &SqliteDatabase) -> (i64, i64, i64) {
    let customer = seed_user(db, "Alice", Role::Customer).await;
    let vehicle = seed_vehicle(db, customer, "Toyota", "Corolla", "ABC-123").await;
    let service = seed_service(db, "Exterior wash", 2000, true).await;
    (customer, vehicle, service)
}
