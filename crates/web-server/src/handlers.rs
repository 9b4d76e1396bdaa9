use crate::{error::AppError, AppState};
use analytics::{
    insights::Insight, seller::SellerTrends, trends, MarketAnalysis, MarketAnalyzer,
    PriceEstimate, PriceEstimator, SizeBand, COMPARABLE_LIMIT, TREND_WINDOW_DAYS,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use core_types::SellerMetricsRecord;
use database::ComparableQuery;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimateParams {
    pub location: Option<String>,
    pub size: Option<String>,
    pub water_source: Option<String>,
    pub quality: Option<String>,
    pub classification: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisParams {
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleBody {
    pub days_to_sale: Option<i64>,
}

/// Stored counters plus the trailing-window trend strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerMetricsResponse {
    pub seller_id: String,
    pub total_views: i64,
    pub total_inquiries: i64,
    pub avg_time_to_sale: i64,
    pub last_updated: DateTime<Utc>,
    #[serde(flatten)]
    pub trends: SellerTrends,
}

/// The updated counters returned by the increment endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecordResponse {
    pub seller_id: String,
    pub total_views: i64,
    pub total_inquiries: i64,
    pub avg_time_to_sale: i64,
    pub last_updated: DateTime<Utc>,
}

impl MetricsRecordResponse {
    fn new(account_id: &str, record: SellerMetricsRecord) -> Self {
        Self {
            seller_id: account_id.to_string(),
            total_views: record.total_views,
            total_inquiries: record.total_inquiries,
            avg_time_to_sale: record.avg_time_to_sale,
            last_updated: record.last_updated,
        }
    }
}

/// # GET /market/price-estimate
///
/// Estimates a price-per-hectare range for a target plot from comparable
/// sold properties in the same location and size band.
pub async fn price_estimate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceEstimateParams>,
) -> Result<Json<PriceEstimate>, AppError> {
    let location = require_location(params.location.as_deref())?;
    let target_area = parse_size(params.size.as_deref())?;

    let band = SizeBand::around(target_area);
    let query = ComparableQuery {
        location: location.to_string(),
        min_area: band.min_area,
        max_area: band.max_area,
        water_source: non_empty(params.water_source),
        soil_quality: non_empty(params.quality),
        classification: non_empty(params.classification),
        limit: COMPARABLE_LIMIT,
    };
    let comparables = state.repo.comparable_sold_properties(&query).await?;
    let estimate = PriceEstimator::new().estimate(&comparables, location);
    Ok(Json(estimate))
}

/// # GET /market/analysis
///
/// Overview, trends, insights, and the recent-listings projection for one
/// location.
pub async fn market_analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalysisParams>,
) -> Result<Json<MarketAnalysis>, AppError> {
    let location = require_location(params.location.as_deref())?;

    let since = Utc::now() - Duration::days(trends::SALES_WINDOW_DAYS);
    let properties = state
        .repo
        .recent_properties(location, trends::RECENT_PROPERTY_LIMIT)
        .await?;
    let sales = state
        .repo
        .completed_sales_since(location, since, trends::RECENT_SALES_LIMIT)
        .await?;

    let analysis = MarketAnalyzer::new().analyze(location, &properties, &sales);
    Ok(Json(analysis))
}

/// # GET /seller/metrics/:seller_id
pub async fn seller_metrics(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
) -> Result<Json<SellerMetricsResponse>, AppError> {
    let seller = resolve_active_seller(&state, &seller_id).await?;

    let now = Utc::now();
    let window = Duration::days(TREND_WINDOW_DAYS);
    let recent = state
        .repo
        .seller_window_stats(seller, now - window, now)
        .await?;
    let previous = state
        .repo
        .seller_window_stats(seller, now - window - window, now - window)
        .await?;
    let record = state
        .repo
        .seller_metrics(seller)
        .await?
        .unwrap_or_else(|| SellerMetricsRecord::empty(seller, now));

    Ok(Json(SellerMetricsResponse {
        seller_id,
        total_views: record.total_views,
        total_inquiries: record.total_inquiries,
        avg_time_to_sale: record.avg_time_to_sale,
        last_updated: record.last_updated,
        trends: SellerTrends::from_windows(&recent, &previous),
    }))
}

/// # POST /seller/metrics/:seller_id/view
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
) -> Result<Json<MetricsRecordResponse>, AppError> {
    let seller = resolve_active_seller(&state, &seller_id).await?;
    let record = state.repo.record_view(seller).await?;
    Ok(Json(MetricsRecordResponse::new(&seller_id, record)))
}

/// # POST /seller/metrics/:seller_id/inquiry
pub async fn record_inquiry(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
) -> Result<Json<MetricsRecordResponse>, AppError> {
    let seller = resolve_active_seller(&state, &seller_id).await?;
    let record = state.repo.record_inquiry(seller).await?;
    Ok(Json(MetricsRecordResponse::new(&seller_id, record)))
}

/// # POST /seller/metrics/:seller_id/sale
pub async fn record_sale(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
    Json(body): Json<SaleBody>,
) -> Result<Json<MetricsRecordResponse>, AppError> {
    let days_to_sale = match body.days_to_sale {
        Some(days) if days >= 0 => days,
        Some(_) => {
            return Err(AppError::validation(
                "daysToSale",
                "daysToSale must not be negative",
            ))
        }
        None => {
            return Err(AppError::validation(
                "daysToSale",
                "daysToSale is required",
            ))
        }
    };
    let seller = resolve_active_seller(&state, &seller_id).await?;
    let record = state.repo.record_sale(seller, days_to_sale).await?;
    Ok(Json(MetricsRecordResponse::new(&seller_id, record)))
}

/// # GET /seller/:seller_id/insights
///
/// The ordered insight list for a seller's own listings and recent sales.
pub async fn seller_insights(
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<String>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let seller = resolve_active_seller(&state, &seller_id).await?;

    let properties = state.repo.properties_for_seller(seller).await?;
    let since = Utc::now() - Duration::days(trends::SALES_WINDOW_DAYS);
    let sales = state
        .repo
        .seller_sales_since(seller, since, trends::RECENT_SALES_LIMIT)
        .await?;

    Ok(Json(analytics::insights::seller_insights(
        &properties,
        &sales,
    )))
}

/// Maps an external account identifier to the internal seller id, rejecting
/// unknown, inactive, or non-seller accounts with a 404.
async fn resolve_active_seller(state: &AppState, account_id: &str) -> Result<Uuid, AppError> {
    state
        .directory
        .resolve_seller(account_id)
        .await?
        .filter(|account| account.is_active_seller())
        .map(|account| account.id)
        .ok_or_else(|| AppError::NotFound("seller not found".to_string()))
}

fn require_location(value: Option<&str>) -> Result<&str, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation("location", "location is required")),
    }
}

/// Fails closed: a missing, non-numeric, or non-positive size is rejected.
fn parse_size(value: Option<&str>) -> Result<Decimal, AppError> {
    let raw = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => return Err(AppError::validation("size", "size is required")),
    };
    let size: Decimal = raw
        .parse()
        .map_err(|_| AppError::validation("size", "size must be a number"))?;
    if size <= Decimal::ZERO {
        return Err(AppError::validation("size", "size must be positive"));
    }
    Ok(size)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
