use sqlx::SqliteConnection;

use crate::db_types::{Service, Vehicle};

pub async fn fetch_service(id: i64, conn: &mut SqliteConnection) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM services WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_vehicle(id: i64, conn: &mut SqliteConnection) -> Result<Option<Vehicle>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vehicles WHERE id = $1").bind(id).fetch_optional(conn).await
}
