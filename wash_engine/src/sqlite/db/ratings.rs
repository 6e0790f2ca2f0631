use sqlx::SqliteConnection;

use crate::db_types::Rating;

/// Insert the one-and-only rating for a reservation. The UNIQUE constraint on `reservation_id`
/// is the guard: `ON CONFLICT DO NOTHING` turns a duplicate into a zero-row result instead of an
/// error, which the caller reports as "already rated".
pub async fn insert_rating(
    reservation_id: i64,
    customer_id: i64,
    washer_id: i64,
    stars: i64,
    comment: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Rating>, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO ratings (reservation_id, customer_id, washer_id, stars, comment)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (reservation_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(reservation_id)
    .bind(customer_id)
    .bind(washer_id)
    .bind(stars)
    .bind(comment)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_rating_for_reservation(
    reservation_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Rating>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ratings WHERE reservation_id = $1").bind(reservation_id).fetch_optional(conn).await
}
