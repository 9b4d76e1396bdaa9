use core_types::{ClosedSale, PropertyRecord, PropertyStatus};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::report::{MarketAnalysis, MarketOverview, MarketTrends, RecentProperty};

/// How many of a location's newest listings feed the overview and demand
/// metrics.
pub const RECENT_PROPERTY_LIMIT: i64 = 20;

/// Completed sales are considered within this trailing window.
pub const SALES_WINDOW_DAYS: i64 = 90;

/// Hard cap on the sales fetched for one analysis request.
pub const RECENT_SALES_LIMIT: i64 = 100;

/// A stateless calculator for location-level market statistics.
///
/// Takes the repository's pre-filtered slices (recent listings, completed
/// sales inside the trailing window) and derives the overview, trend, and
/// insight blocks of a market-analysis response.
#[derive(Debug, Default)]
pub struct MarketAnalyzer {}

impl MarketAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for computing a location's market analysis.
    ///
    /// `properties` must be the location's newest listings (any status,
    /// newest first); `sales` the completed sales of the trailing window.
    /// Empty inputs produce zeroed statistics, never errors.
    pub fn analyze(
        &self,
        location: &str,
        properties: &[PropertyRecord],
        sales: &[ClosedSale],
    ) -> MarketAnalysis {
        let overview = self.overview(properties);
        let trends = self.trends(properties, sales);
        let insights = crate::insights::market_insights(&trends, sales.len(), properties.len());
        let recent = properties.iter().map(project_recent).collect();

        tracing::debug!(
            location,
            listings = properties.len(),
            sales = sales.len(),
            "computed market analysis"
        );

        MarketAnalysis {
            overview,
            trends,
            insights,
            recent,
        }
    }

    /// Price-per-hectare statistics and status counts over recent listings.
    fn overview(&self, properties: &[PropertyRecord]) -> MarketOverview {
        let prices_per_area: Vec<Decimal> =
            properties.iter().filter_map(|p| p.price_per_area()).collect();

        let (avg_price, min_price, max_price) = if prices_per_area.is_empty() {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else {
            let sum: Decimal = prices_per_area.iter().sum();
            let avg = sum / Decimal::from(prices_per_area.len());
            let min = prices_per_area.iter().copied().min().unwrap_or(Decimal::ZERO);
            let max = prices_per_area.iter().copied().max().unwrap_or(Decimal::ZERO);
            (avg, min, max)
        };

        MarketOverview {
            avg_price,
            min_price,
            max_price,
            total_listings: properties.len(),
            active_listings: properties
                .iter()
                .filter(|p| p.status == PropertyStatus::Active)
                .count(),
            sold_listings: properties
                .iter()
                .filter(|p| p.status == PropertyStatus::Sold)
                .count(),
        }
    }

    fn trends(&self, properties: &[PropertyRecord], sales: &[ClosedSale]) -> MarketTrends {
        MarketTrends {
            price_trend: price_trend(sales),
            avg_time_to_sale: average_time_to_sale(sales),
            avg_views_per_property: average_views(properties),
            avg_inquiries_per_property: average_inquiries(properties),
        }
    }
}

/// Percentage change in price-per-hectare between the earliest and the latest
/// completed sale of the window.
///
/// Returns zero with fewer than two usable sales or when the earliest
/// price-per-hectare is zero (the ratio would be undefined). Sales with a
/// non-positive area are skipped rather than aborting the computation.
pub fn price_trend(sales: &[ClosedSale]) -> i64 {
    let mut usable: Vec<&ClosedSale> = sales
        .iter()
        .filter(|s| s.area > Decimal::ZERO)
        .collect();
    if usable.len() < 2 {
        return 0;
    }
    usable.sort_by_key(|s| s.sale_date);

    let first = usable[0];
    let last = usable[usable.len() - 1];
    let first_ppa = first.sale_price / first.area;
    if first_ppa.is_zero() {
        return 0;
    }
    let last_ppa = last.sale_price / last.area;

    round_whole((last_ppa - first_ppa) / first_ppa * Decimal::from(100))
}

/// Mean days from posting to sale over the window's completed sales.
pub fn average_time_to_sale(sales: &[ClosedSale]) -> i64 {
    if sales.is_empty() {
        return 0;
    }
    let total: i64 = sales.iter().map(|s| s.days_on_market()).sum();
    round_whole(Decimal::from(total) / Decimal::from(sales.len()))
}

/// Mean view count per listing, to one decimal place.
pub fn average_views(properties: &[PropertyRecord]) -> Decimal {
    average_count(properties.iter().map(|p| p.view_count).sum(), properties.len())
}

/// Mean inquiry count per listing, to one decimal place.
pub fn average_inquiries(properties: &[PropertyRecord]) -> Decimal {
    average_count(
        properties.iter().map(|p| p.inquiry_count).sum(),
        properties.len(),
    )
}

fn average_count(total: i64, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(total) / Decimal::from(count))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn project_recent(property: &PropertyRecord) -> RecentProperty {
    RecentProperty {
        id: property.id,
        title: property.title.clone(),
        price: property.price,
        area: property.area,
        price_per_area: property.price_per_area(),
        status: property.status,
        posted_at: property.posted_at,
    }
}

/// Rounds to a whole number, midpoints away from zero.
pub(crate) fn round_whole(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn listing(price: Decimal, area: Decimal, status: PropertyStatus) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Irrigated cropland".to_string(),
            location: "Kitale".to_string(),
            price,
            area,
            status,
            water_source: None,
            soil_quality: None,
            classification: None,
            suitable_crops: vec![],
            image_urls: vec![],
            posted_at: Utc::now(),
            view_count: 10,
            inquiry_count: 2,
        }
    }

    fn sale(ppa: Decimal, days_ago: i64, days_on_market: i64) -> ClosedSale {
        let sale_date = Utc::now() - Duration::days(days_ago);
        ClosedSale {
            property_id: Uuid::new_v4(),
            sale_price: ppa,
            sale_date,
            area: dec!(1),
            posted_at: sale_date - Duration::days(days_on_market),
        }
    }

    #[test]
    fn trend_is_positive_when_prices_rise() {
        // Earliest sale at 100/ha, latest at 150/ha.
        let sales = vec![sale(dec!(150), 1, 30), sale(dec!(100), 60, 30)];
        assert_eq!(price_trend(&sales), 50);
    }

    #[test]
    fn trend_is_negative_when_prices_fall() {
        let sales = vec![sale(dec!(100), 1, 30), sale(dec!(150), 60, 30)];
        assert_eq!(price_trend(&sales), -33);
    }

    #[test]
    fn trend_needs_two_sales() {
        assert_eq!(price_trend(&[]), 0);
        assert_eq!(price_trend(&[sale(dec!(100), 1, 30)]), 0);
    }

    #[test]
    fn trend_guards_zero_baseline() {
        let sales = vec![sale(dec!(150), 1, 30), sale(dec!(0), 60, 30)];
        assert_eq!(price_trend(&sales), 0);
    }

    #[test]
    fn average_time_to_sale_is_a_whole_day_mean() {
        let sales = vec![sale(dec!(100), 1, 20), sale(dec!(100), 5, 41)];
        assert_eq!(average_time_to_sale(&sales), 31);
        assert_eq!(average_time_to_sale(&[]), 0);
    }

    #[test]
    fn overview_counts_statuses_and_guards_empty() {
        let analyzer = MarketAnalyzer::new();
        let empty = analyzer.analyze("Kitale", &[], &[]);
        assert_eq!(empty.overview.avg_price, Decimal::ZERO);
        assert_eq!(empty.overview.total_listings, 0);
        assert_eq!(empty.trends.avg_views_per_property, Decimal::ZERO);

        let listings = vec![
            listing(dec!(100), dec!(1), PropertyStatus::Active),
            listing(dec!(300), dec!(1), PropertyStatus::Sold),
            listing(dec!(100), Decimal::ZERO, PropertyStatus::Pending),
        ];
        let analysis = analyzer.analyze("Kitale", &listings, &[]);
        assert_eq!(analysis.overview.total_listings, 3);
        assert_eq!(analysis.overview.active_listings, 1);
        assert_eq!(analysis.overview.sold_listings, 1);
        // The zero-area listing is excluded from the price stats.
        assert_eq!(analysis.overview.avg_price, dec!(200));
        assert_eq!(analysis.overview.min_price, dec!(100));
        assert_eq!(analysis.overview.max_price, dec!(300));
        assert_eq!(analysis.trends.avg_views_per_property, dec!(10.0));
        assert_eq!(analysis.recent.len(), 3);
        assert_eq!(analysis.recent[2].price_per_area, None);
    }
}
