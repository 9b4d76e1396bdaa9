use core_types::{ClosedSale, PropertyRecord};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::report::MarketTrends;
use crate::trends;

/// Sales averaging fewer days than this on the market are highlighted green.
pub const FAST_SALE_DAYS: i64 = 45;

/// Listing price above which the pricing tip is raised.
pub const HIGH_PRICE_THRESHOLD: Decimal = dec!(10_000_000);

/// Titles shorter than this many characters trigger the title tip.
pub const SHORT_TITLE_CHARS: usize = 20;

/// Advisory display hint attached to each insight. Not business logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccentColor {
    Green,
    Red,
    Grey,
    Orange,
    Blue,
}

/// The closed set of insight kinds. Rendering dispatches on this exhaustively
/// rather than comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    PriceTrend,
    TimeToSale,
    Demand,
    Optimization,
    Welcome,
}

/// A templated, threshold-driven textual summary. Computed per request and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub text: String,
    pub accent_color: AccentColor,
}

impl Insight {
    fn new(kind: InsightKind, title: &str, text: String, accent_color: AccentColor) -> Self {
        Self {
            kind,
            title: title.to_string(),
            text,
            accent_color,
        }
    }
}

/// Market-level insights in their fixed order: price trend, time to sale,
/// then demand. The demand insight is only present when at least one recent
/// listing exists; the other two degrade to neutral insufficient-data texts.
pub fn market_insights(
    market: &MarketTrends,
    sale_count: usize,
    listing_count: usize,
) -> Vec<Insight> {
    let mut insights = vec![
        price_trend_insight(market.price_trend, sale_count),
        time_to_sale_insight(market.avg_time_to_sale, sale_count),
    ];
    if listing_count > 0 {
        insights.push(demand_insight(
            market.avg_views_per_property,
            market.avg_inquiries_per_property,
        ));
    }
    insights
}

/// Insights for one seller: the market-style summaries computed over the
/// seller's own sales and listings, followed by optimization tips.
///
/// A seller with no listings at all gets exactly one welcome insight and
/// nothing else.
pub fn seller_insights(properties: &[PropertyRecord], sales: &[ClosedSale]) -> Vec<Insight> {
    if properties.is_empty() {
        return vec![Insight::new(
            InsightKind::Welcome,
            "Welcome to Acrelot",
            "Post your first listing to start reaching buyers and collecting \
             market insights."
                .to_string(),
            AccentColor::Blue,
        )];
    }

    let mut insights = vec![
        price_trend_insight(trends::price_trend(sales), sales.len()),
        time_to_sale_insight(trends::average_time_to_sale(sales), sales.len()),
        demand_insight(
            trends::average_views(properties),
            trends::average_inquiries(properties),
        ),
    ];
    insights.extend(optimization_tips(properties));
    insights
}

fn price_trend_insight(trend: i64, sale_count: usize) -> Insight {
    if sale_count >= 2 {
        let direction = if trend >= 0 { "risen" } else { "fallen" };
        let accent = if trend > 0 {
            AccentColor::Green
        } else {
            AccentColor::Red
        };
        Insight::new(
            InsightKind::PriceTrend,
            "Price trend",
            format!(
                "Sale prices per hectare have {direction} {}% across recent sales.",
                trend.abs()
            ),
            accent,
        )
    } else {
        Insight::new(
            InsightKind::PriceTrend,
            "Price trend",
            "Not enough recent sales to establish a price trend yet.".to_string(),
            AccentColor::Grey,
        )
    }
}

fn time_to_sale_insight(avg_days: i64, sale_count: usize) -> Insight {
    if sale_count >= 1 {
        let accent = if avg_days < FAST_SALE_DAYS {
            AccentColor::Green
        } else {
            AccentColor::Orange
        };
        Insight::new(
            InsightKind::TimeToSale,
            "Time to sale",
            format!("Properties here sell in about {avg_days} days on average."),
            accent,
        )
    } else {
        Insight::new(
            InsightKind::TimeToSale,
            "Time to sale",
            "No completed sales in the recent window yet.".to_string(),
            AccentColor::Grey,
        )
    }
}

fn demand_insight(avg_views: Decimal, avg_inquiries: Decimal) -> Insight {
    Insight::new(
        InsightKind::Demand,
        "Buyer demand",
        format!("Listings average {avg_views} views and {avg_inquiries} inquiries each."),
        AccentColor::Blue,
    )
}

/// Listing-quality tips, evaluated in fixed order. Every satisfied condition
/// contributes one tip; with nothing to improve, a single "well optimized"
/// message is returned instead.
pub fn optimization_tips(properties: &[PropertyRecord]) -> Vec<Insight> {
    let mut tips = Vec::new();

    if properties.iter().any(|p| p.image_urls.is_empty()) {
        tips.push(tip(
            "Add photos",
            "Some of your listings have no photos. Listings with images get \
             far more attention from buyers.",
        ));
    }
    if properties
        .iter()
        .any(|p| p.title.chars().count() < SHORT_TITLE_CHARS)
    {
        tips.push(tip(
            "Write descriptive titles",
            "Short titles are easy to overlook. Describe the land, its size, \
             and its strengths in the title.",
        ));
    }
    if properties.iter().any(|p| p.price > HIGH_PRICE_THRESHOLD) {
        tips.push(tip(
            "Review your pricing",
            "At least one listing is priced far above the local market. \
             Consider revising the asking price.",
        ));
    }
    if properties.iter().any(|p| p.location.trim().is_empty()) {
        tips.push(tip(
            "Add a location",
            "Buyers search by location. Listings without one rarely appear \
             in search results.",
        ));
    }
    if properties.iter().any(|p| p.suitable_crops.is_empty()) {
        tips.push(tip(
            "List suitable crops",
            "Stating which crops the land supports helps buyers evaluate a \
             listing quickly.",
        ));
    }

    if tips.is_empty() {
        tips.push(Insight::new(
            InsightKind::Optimization,
            "Listings look good",
            "Your listings are well optimized.".to_string(),
            AccentColor::Green,
        ));
    }
    tips
}

fn tip(title: &str, text: &str) -> Insight {
    Insight::new(
        InsightKind::Optimization,
        title,
        text.to_string(),
        AccentColor::Orange,
    )
}
