use sqlx::PgPool;

use super::dto::{Dashboard, RecentListing, RecentUser};

const RECENT_LIMIT: i64 = 5;

pub async fn dashboard(db: &PgPool) -> Result<Dashboard, sqlx::Error> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;

    let (total_listings, monthly_count, daily_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COUNT(*) FILTER (WHERE listing_type = 'monthly'),
               COUNT(*) FILTER (WHERE listing_type = 'daily')
          FROM listings
        "#,
    )
    .fetch_one(db)
    .await?;

    let recent_users = sqlx::query_as::<_, RecentUser>(
        "SELECT name, email FROM users ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(db)
    .await?;

    let recent_listings = sqlx::query_as::<_, RecentListing>(
        "SELECT title, city, price FROM listings ORDER BY created_at DESC LIMIT $1",
    )
    .bind(RECENT_LIMIT)
    .fetch_all(db)
    .await?;

    Ok(Dashboard {
        total_users,
        total_listings,
        monthly_count,
        daily_count,
        recent_users,
        recent_listings,
    })
}
