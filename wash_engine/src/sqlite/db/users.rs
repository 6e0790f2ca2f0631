use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::UserProfile;

pub async fn fetch_user_profile(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as("SELECT id, name, role, available, rating_avg, rating_count, completed_jobs FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn user_exists(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(row.is_some())
}

/// Increment the washer's completed-jobs counter by exactly one.
pub async fn incr_completed_jobs(washer_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET completed_jobs = completed_jobs + 1 WHERE id = $1")
        .bind(washer_id)
        .execute(conn)
        .await?;
    trace!("🧽️ Washer #{washer_id} completed-jobs counter incremented");
    Ok(())
}

/// Fold one new star rating into the washer's running average. The whole recalculation is one
/// statement so it composes into the rating-insert transaction.
pub async fn apply_rating(washer_id: i64, stars: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            UPDATE users
            SET rating_avg = (rating_avg * rating_count + $1) / (rating_count + 1.0),
                rating_count = rating_count + 1
            WHERE id = $2
        "#,
    )
    .bind(stars)
    .bind(washer_id)
    .execute(conn)
    .await?;
    trace!("⭐️ Washer #{washer_id} running rating updated with a {stars}-star review");
    Ok(())
}

pub async fn set_availability(
    washer_id: i64,
    available: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE users SET available = $1
            WHERE id = $2
            RETURNING id, name, role, available, rating_avg, rating_count, completed_jobs;
        "#,
    )
    .bind(available)
    .bind(washer_id)
    .fetch_optional(conn)
    .await
}
