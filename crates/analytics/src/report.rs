use chrono::{DateTime, Utc};
use core_types::PropertyStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::insights::Insight;

/// The result of a comparable-based price estimation.
///
/// `min` and `max` bound the outlier-trimmed price-per-hectare range;
/// `weighted_average` is the recency-weighted mean over the same comparables.
/// All three are zero when no comparables matched, and `message` explains why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    pub min: Decimal,
    pub max: Decimal,
    pub count: usize,
    pub weighted_average: Decimal,
    pub message: String,
}

impl PriceEstimate {
    /// The zero-comparable outcome. Not an error: the caller still gets a
    /// well-formed response with an explanatory message.
    pub fn empty(message: String) -> Self {
        Self {
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            count: 0,
            weighted_average: Decimal::ZERO,
            message,
        }
    }
}

/// Price-per-hectare statistics and listing counts for a location's most
/// recent listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOverview {
    pub avg_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub total_listings: usize,
    pub active_listings: usize,
    pub sold_listings: usize,
}

/// Trend figures for a location over the trailing sales window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    /// Percentage change in price-per-hectare between the earliest and the
    /// latest completed sale of the window. Zero with fewer than two sales.
    pub price_trend: i64,
    /// Mean days from posting to sale across the window's completed sales.
    pub avg_time_to_sale: i64,
    pub avg_views_per_property: Decimal,
    pub avg_inquiries_per_property: Decimal,
}

/// Trimmed projection of a recent listing, as returned to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProperty {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub area: Decimal,
    /// `None` for records with a non-positive area.
    pub price_per_area: Option<Decimal>,
    pub status: PropertyStatus,
    pub posted_at: DateTime<Utc>,
}

/// The full market-analysis response for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub overview: MarketOverview,
    pub trends: MarketTrends,
    /// Ordered insight list. The order is part of the contract and must not
    /// be re-sorted by callers.
    pub insights: Vec<Insight>,
    pub recent: Vec<RecentProperty>,
}
