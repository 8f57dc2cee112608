use serde_json::Value;

use super::{dto::CreateListingRequest, repo_types::ListingType};
use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 50;

/// A create request that passed validation.
#[derive(Debug, Clone)]
pub struct NewListing {
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
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("{field} is required"))),
    }
}

pub fn validate_new_listing(req: CreateListingRequest) -> Result<NewListing, ApiError> {
    let title = required(req.title, "title")?;
    let city = required(req.city, "city")?;
    let listing_type = req
        .listing_type
        .ok_or_else(|| ApiError::bad_request("type is required"))?;
    let price = req
        .price
        .ok_or_else(|| ApiError::bad_request("price is required"))?;
    validate_price(price)?;
    let phone = required(req.phone, "phone")?;

    Ok(NewListing {
        title,
        address: req.address,
        city,
        commune: req.commune,
        listing_type,
        price,
        description: req.description,
        images: req.images,
        phone,
        is_test: req.is_test,
    })
}

pub fn validate_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::bad_request("price must be a non-negative number"));
    }
    Ok(())
}

/// Accepts only JSON integers in 1..=5.
pub fn parse_rating(value: &Value) -> Result<i32, ApiError> {
    match value.as_i64() {
        Some(r @ 1..=5) => Ok(r as i32),
        _ => Err(ApiError::bad_request("Invalid rating value")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: i64,
    pub skip: i64,
}

impl PageWindow {
    /// Page numbers start at 1; the size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self {
            limit,
            skip: (page - 1).saturating_mul(limit),
        }
    }

    pub fn has_more(&self, returned: usize, total: i64) -> bool {
        self.skip.saturating_add(returned as i64) < total
    }
}

/// Turns free text into a web-search query matching any of its words.
/// Punctuation is dropped so user input never reaches the query syntax.
/// Blank search text means "no text filter".
pub fn normalize_search(search: Option<String>) -> Option<String> {
    let terms: Vec<&str> = search
        .as_deref()
        .unwrap_or_default()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("or"))
        .collect();
    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" or "))
}
