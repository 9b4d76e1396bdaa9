//! # Acrelot Market Analytics
//!
//! This crate provides the statistical core of the marketplace: comparable
//! price estimation, location-level market trends, seller trend percentages,
//! and the threshold-driven insight texts derived from them.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** `PriceEstimator` and `MarketAnalyzer` are
//!   stateless calculators. They take slices of records as input and produce
//!   report structs as output, which makes them reliable and easy to test.
//! - **Guarded Arithmetic:** Empty inputs and zero denominators are handled
//!   locally with safe fallbacks (zeroed reports, untrimmed ranges). None of
//!   the calculators return errors.
//!
//! ## Public API
//!
//! - `PriceEstimator` / `PriceEstimate`: weighted, outlier-trimmed estimates.
//! - `MarketAnalyzer` / `MarketAnalysis`: location-level overview and trends.
//! - `seller`: trailing-window trend percentages for seller metrics.
//! - `insights`: templated insight and optimization-tip generation.

pub mod estimator;
pub mod insights;
pub mod report;
pub mod seller;
pub mod trends;

// Re-export the key components to create a clean, public-facing API.
pub use estimator::{PriceEstimator, SizeBand, COMPARABLE_LIMIT};
pub use insights::{AccentColor, Insight, InsightKind};
pub use report::{MarketAnalysis, MarketOverview, MarketTrends, PriceEstimate, RecentProperty};
pub use seller::{SellerTrends, TREND_WINDOW_DAYS};
pub use trends::{MarketAnalyzer, RECENT_PROPERTY_LIMIT, RECENT_SALES_LIMIT, SALES_WINDOW_DAYS};
