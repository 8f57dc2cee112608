use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::listings::repo_types::ListingStatus;

#[derive(Debug, Serialize, FromRow)]
pub struct RecentUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RecentListing {
    pub title: String,
    pub city: String,
    pub price: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_users: i64,
    pub total_listings: i64,
    pub monthly_count: i64,
    pub daily_count: i64,
    pub recent_users: Vec<RecentUser>,
    pub recent_listings: Vec<RecentListing>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ListingStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct PopularParams {
    pub limit: Option<i64>,
}
