use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Monthly,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Pending,
    Published,
}

/// One rating left on a listing. Stored inside the listing's `reviews` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: i32,
    pub user: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub address: Option<String>,
    pub city: String,
    pub commune: Option<String>,
    pub listing_type: ListingType,
    pub price: f64,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub phone: String,
    pub is_test: bool,
    pub reviews: Json<Vec<Review>>,
    pub contact_clicks: i64,
    pub status: ListingStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub address: Option<String>,
    pub city: String,
    pub commune: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub price: f64,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub phone: String,
    pub is_test: bool,
    pub reviews: Vec<Review>,
    pub contact_clicks: i64,
    pub status: ListingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ListingRow> for Listing {
    fn from(r: ListingRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            address: r.address,
            city: r.city,
            commune: r.commune,
            listing_type: r.listing_type,
            price: r.price,
            description: r.description,
            images: r.images,
            phone: r.phone,
            is_test: r.is_test,
            reviews: r.reviews.0,
            contact_clicks: r.contact_clicks,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
