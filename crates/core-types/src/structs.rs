use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{PropertyStatus, SaleStatus};

/// A listed plot of agricultural land.
///
/// Owned by the property store; the analytics engine treats it as read-only
/// apart from the view/inquiry counters, which are incremented store-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub location: String,
    pub price: Decimal,
    /// Land area in hectares. Must be positive for the record to be usable
    /// as a comparable; records violating this are filtered before ranking.
    pub area: Decimal,
    pub status: PropertyStatus,
    pub water_source: Option<String>,
    pub soil_quality: Option<String>,
    pub classification: Option<String>,
    pub suitable_crops: Vec<String>,
    pub image_urls: Vec<String>,
    pub posted_at: DateTime<Utc>,
    pub view_count: i64,
    pub inquiry_count: i64,
}

impl PropertyRecord {
    /// Price per hectare, or `None` when the area is not positive.
    /// Division by a zero or negative area must never happen downstream.
    pub fn price_per_area(&self) -> Option<Decimal> {
        if self.area > Decimal::ZERO {
            Some(self.price / self.area)
        } else {
            None
        }
    }

    /// Whether the record may participate in price aggregation.
    pub fn is_valid_comparable(&self) -> bool {
        self.area > Decimal::ZERO && self.price >= Decimal::ZERO
    }
}

/// A sale contract. Created when a sale closes; immutable once completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: Uuid,
    pub property_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub sale_price: Decimal,
    pub sale_date: DateTime<Utc>,
    /// Whole days between the property's posting and the sale date.
    pub days_to_sale: i64,
    pub status: SaleStatus,
}

/// Projection of a completed sale joined with its property, as consumed by
/// the trend analyzer. The repository produces these; pure analytics code
/// never re-fetches the property side of the join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedSale {
    pub property_id: Uuid,
    pub sale_price: Decimal,
    pub sale_date: DateTime<Utc>,
    /// Area of the sold property, in hectares.
    pub area: Decimal,
    /// When the sold property was originally posted.
    pub posted_at: DateTime<Utc>,
}

impl ClosedSale {
    pub fn price_per_area(&self) -> Option<Decimal> {
        if self.area > Decimal::ZERO {
            Some(self.sale_price / self.area)
        } else {
            None
        }
    }

    /// Whole days the property spent on the market.
    pub fn days_on_market(&self) -> i64 {
        (self.sale_date - self.posted_at).num_days().max(0)
    }
}

/// Per-seller engagement counters. Created lazily with zeros on the first
/// event for a seller and never deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerMetricsRecord {
    pub seller_id: Uuid,
    pub total_views: i64,
    pub total_inquiries: i64,
    /// Average of the last two sale durations, in whole days. This is a
    /// deliberate two-sample fold, not a cumulative mean over all sales.
    pub avg_time_to_sale: i64,
    pub last_updated: DateTime<Utc>,
}

impl SellerMetricsRecord {
    /// A zeroed record for a seller with no recorded events yet.
    pub fn empty(seller_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            seller_id,
            total_views: 0,
            total_inquiries: 0,
            avg_time_to_sale: 0,
            last_updated: now,
        }
    }
}

/// Aggregate of a seller's metric events inside one trailing window.
/// The store computes these; unbounded event lists never cross the
/// repository boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerWindowStats {
    pub views: i64,
    pub inquiries: i64,
    pub sales: i64,
    /// Sum of `days_to_sale` over the window's sale events.
    pub total_sale_days: i64,
}

impl SellerWindowStats {
    /// Mean sale duration over the window, in days. Zero when no sales fell
    /// inside the window.
    pub fn avg_sale_days(&self) -> Decimal {
        if self.sales > 0 {
            Decimal::from(self.total_sale_days) / Decimal::from(self.sales)
        } else {
            Decimal::ZERO
        }
    }
}

/// A marketplace account as resolved by the identity layer. Seller-facing
/// operations address accounts by `account_id`, never by the internal key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerAccount {
    pub id: Uuid,
    pub account_id: String,
    pub role: String,
    pub active: bool,
}

impl SellerAccount {
    /// Whether this account may own listings and accrue seller metrics.
    pub fn is_active_seller(&self) -> bool {
        self.active && self.role == "seller"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn property(price: Decimal, area: Decimal) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "River pasture".to_string(),
            location: "Eldoret".to_string(),
            price,
            area,
            status: PropertyStatus::Sold,
            water_source: None,
            soil_quality: None,
            classification: None,
            suitable_crops: vec![],
            image_urls: vec![],
            posted_at: Utc::now(),
            view_count: 0,
            inquiry_count: 0,
        }
    }

    #[test]
    fn price_per_area_guards_zero_area() {
        assert_eq!(property(dec!(100), Decimal::ZERO).price_per_area(), None);
        assert_eq!(
            property(dec!(1000000), dec!(5)).price_per_area(),
            Some(dec!(200000))
        );
    }

    #[test]
    fn zero_area_records_are_not_comparables() {
        assert!(!property(dec!(100), Decimal::ZERO).is_valid_comparable());
        assert!(!property(dec!(-1), dec!(2)).is_valid_comparable());
        assert!(property(Decimal::ZERO, dec!(2)).is_valid_comparable());
    }

    #[test]
    fn window_stats_average_is_zero_without_sales() {
        assert_eq!(SellerWindowStats::default().avg_sale_days(), Decimal::ZERO);
        let window = SellerWindowStats {
            sales: 2,
            total_sale_days: 90,
            ..Default::default()
        };
        assert_eq!(window.avg_sale_days(), dec!(45));
    }
}
