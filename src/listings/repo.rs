use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    dto::UpdateListingRequest,
    repo_types::{Listing, ListingRow, ListingStatus, ListingType, Review},
    services::{NewListing, PageWindow},
};

pub(crate) const LISTING_COLUMNS: &str = "id, user_id, title, address, city, commune, \
     listing_type, price, description, images, phone, is_test, reviews, contact_clicks, \
     status, created_at, updated_at";

fn into_listings(rows: Vec<ListingRow>) -> Vec<Listing> {
    rows.into_iter().map(Listing::from).collect()
}

/// Inserts a listing owned by `owner`. Status is always `pending`.
pub async fn insert(db: &PgPool, owner: Uuid, l: &NewListing) -> Result<Listing, sqlx::Error> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        r#"
        INSERT INTO listings (user_id, title, address, city, commune, listing_type, price,
                              description, images, phone, is_test, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
        RETURNING {LISTING_COLUMNS}
        "#
    ))
    .bind(owner)
    .bind(&l.title)
    .bind(&l.address)
    .bind(&l.city)
    .bind(&l.commune)
    .bind(l.listing_type)
    .bind(l.price)
    .bind(&l.description)
    .bind(&l.images)
    .bind(&l.phone)
    .bind(l.is_test)
    .fetch_one(db)
    .await?;
    Ok(row.into())
}

/// Published listings, newest first, plus the total number of matches.
pub async fn search_published(
    db: &PgPool,
    listing_type: Option<ListingType>,
    search: Option<&str>,
    window: PageWindow,
) -> Result<(Vec<Listing>, i64), sqlx::Error> {
    const FILTER: &str = r#"
        status = 'published'
        AND ($1::listing_type IS NULL OR listing_type = $1)
        AND ($2::text IS NULL OR search_vector @@ websearch_to_tsquery('english', $2))
    "#;

    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE {FILTER} \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(listing_type)
    .bind(search)
    .bind(window.limit)
    .bind(window.skip)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM listings WHERE {FILTER}"))
        .bind(listing_type)
        .bind(search)
        .fetch_one(db)
        .await?;

    Ok((into_listings(rows), total))
}

pub async fn list_by_owner(db: &PgPool, owner: Uuid) -> Result<Vec<Listing>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(owner)
    .fetch_all(db)
    .await?;
    Ok(into_listings(rows))
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Listing>, sqlx::Error> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Listing::from))
}

pub async fn find_published(db: &PgPool, id: Uuid) -> Result<Option<Listing>, sqlx::Error> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE id = $1 AND status = 'published'"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Listing::from))
}

/// Applies the owner-editable fields. Matches on id and owner together, so a
/// foreign or missing listing both yield `None`.
pub async fn update_owned(
    db: &PgPool,
    owner: Uuid,
    id: Uuid,
    u: &UpdateListingRequest,
) -> Result<Option<Listing>, sqlx::Error> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        r#"
        UPDATE listings
           SET title        = COALESCE($3, title),
               address      = COALESCE($4, address),
               city         = COALESCE($5, city),
               commune      = COALESCE($6, commune),
               listing_type = COALESCE($7, listing_type),
               price        = COALESCE($8, price),
               description  = COALESCE($9, description),
               images       = COALESCE($10, images),
               phone        = COALESCE($11, phone),
               is_test      = COALESCE($12, is_test),
               updated_at   = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {LISTING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(owner)
    .bind(&u.title)
    .bind(&u.address)
    .bind(&u.city)
    .bind(&u.commune)
    .bind(u.listing_type)
    .bind(u.price)
    .bind(&u.description)
    .bind(&u.images)
    .bind(&u.phone)
    .bind(u.is_test)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Listing::from))
}

pub async fn delete_owned(db: &PgPool, owner: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM listings WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(owner)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn delete_any(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM listings WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Single-statement increment; returns the new count.
pub async fn increment_contact_clicks(db: &PgPool, id: Uuid) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE listings
           SET contact_clicks = contact_clicks + 1
         WHERE id = $1
        RETURNING contact_clicks
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Appends a review to the embedded array in one statement.
pub async fn append_review(
    db: &PgPool,
    id: Uuid,
    reviewer: Uuid,
    rating: i32,
) -> Result<Option<Listing>, sqlx::Error> {
    let review = Review {
        rating,
        user: reviewer,
        created_at: OffsetDateTime::now_utc(),
    };
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        r#"
        UPDATE listings
           SET reviews = reviews || $2::jsonb,
               updated_at = now()
         WHERE id = $1
        RETURNING {LISTING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(Json(vec![review]))
    .fetch_optional(db)
    .await?;
    Ok(row.map(Listing::from))
}

pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: ListingStatus,
) -> Result<Option<Listing>, sqlx::Error> {
    let row = sqlx::query_as::<_, ListingRow>(&format!(
        r#"
        UPDATE listings
           SET status = $2,
               updated_at = now()
         WHERE id = $1
        RETURNING {LISTING_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(db)
    .await?;
    Ok(row.map(Listing::from))
}

pub async fn list_all(db: &PgPool) -> Result<Vec<Listing>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC"
    ))
    .fetch_all(db)
    .await?;
    Ok(into_listings(rows))
}

pub async fn list_by_status(
    db: &PgPool,
    status: ListingStatus,
) -> Result<Vec<Listing>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings WHERE status = $1 ORDER BY created_at DESC"
    ))
    .bind(status)
    .fetch_all(db)
    .await?;
    Ok(into_listings(rows))
}

/// Most-contacted listings first.
pub async fn list_popular(db: &PgPool, limit: i64) -> Result<Vec<Listing>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ListingRow>(&format!(
        "SELECT {LISTING_COLUMNS} FROM listings \
         ORDER BY contact_clicks DESC, created_at DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(into_listings(rows))
}
