use serde::{Deserialize, Serialize};

use super::repo_types::{Listing, ListingType};

/// Body of `POST /listings`. Anything not named here (status, contactClicks,
/// reviews, userId) is dropped during deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub commune: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_test: bool,
}

/// Owner-editable fields. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub commune: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub phone: Option<String>,
    pub is_test: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub has_more: bool,
}

/// `rating` stays untyped so non-integers can be reported as a 400 with a
/// readable message instead of a generic body rejection.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub rating: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactClickResponse {
    pub message: String,
    pub contact_clicks: i64,
}
