use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    ClosedSale, MetricEventKind, PropertyRecord, SellerAccount, SellerMetricsRecord,
    SellerWindowStats,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

/// Validated query for comparable sold properties. The area bounds arrive
/// pre-computed (the ±20% band around the target size); optional attribute
/// filters are exact matches.
#[derive(Debug, Clone)]
pub struct ComparableQuery {
    pub location: String,
    pub min_area: Decimal,
    pub max_area: Decimal,
    pub water_source: Option<String>,
    pub soil_quality: Option<String>,
    pub classification: Option<String>,
    pub limit: i64,
}

/// The read/write port the analytics handlers are written against.
///
/// Every read is filtered, ordered, and limited by the store; every counter
/// write is an atomic read-modify-write. Implementations: [`PgRepository`]
/// for PostgreSQL, [`crate::InMemoryRepository`] for tests and fixtures.
#[async_trait]
pub trait MarketRepository: Send + Sync {
    /// Sold properties matching a comparable query, newest first.
    async fn comparable_sold_properties(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<PropertyRecord>, DbError>;

    /// A location's newest listings, any status, newest first.
    async fn recent_properties(
        &self,
        location: &str,
        limit: i64,
    ) -> Result<Vec<PropertyRecord>, DbError>;

    /// Completed sales for a location with `sale_date >= since`, newest first.
    async fn completed_sales_since(
        &self,
        location: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError>;

    /// All of a seller's listings, newest first.
    async fn properties_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<PropertyRecord>, DbError>;

    /// A seller's completed sales with `sale_date >= since`, newest first.
    async fn seller_sales_since(
        &self,
        seller_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError>;

    /// The stored counters for a seller, if any event was ever recorded.
    async fn seller_metrics(
        &self,
        seller_id: Uuid,
    ) -> Result<Option<SellerMetricsRecord>, DbError>;

    /// Atomically increments the view counter, creating the record if
    /// missing, and appends the event to the log. Returns the updated row.
    async fn record_view(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError>;

    /// Atomically increments the inquiry counter. See [`Self::record_view`].
    async fn record_inquiry(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError>;

    /// Atomically folds a sale duration into the stored average: the first
    /// sale sets it outright, later sales average against the previous value
    /// only. Appends the sale event to the log.
    async fn record_sale(
        &self,
        seller_id: Uuid,
        days_to_sale: i64,
    ) -> Result<SellerMetricsRecord, DbError>;

    /// Aggregated event counts for one trailing window
    /// (`from < occurred_at <= to`).
    async fn seller_window_stats(
        &self,
        seller_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SellerWindowStats, DbError>;
}

/// The identity port. Seller-facing endpoints carry external account
/// identifiers; this resolves them to marketplace accounts so callers can
/// apply the active/role checks.
#[async_trait]
pub trait SellerDirectory: Send + Sync {
    async fn resolve_seller(&self, account_id: &str) -> Result<Option<SellerAccount>, DbError>;
}

/// The `PgRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Creates a new `PgRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn bump_counter(
        &self,
        seller_id: Uuid,
        kind: MetricEventKind,
    ) -> Result<SellerMetricsRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MetricsRow>(
            r#"
            INSERT INTO seller_metrics (seller_id, total_views, total_inquiries, avg_time_to_sale, last_updated)
            VALUES (
                $1,
                CASE WHEN $2 = 'view' THEN 1 ELSE 0 END,
                CASE WHEN $2 = 'inquiry' THEN 1 ELSE 0 END,
                0,
                now()
            )
            ON CONFLICT (seller_id) DO UPDATE SET
                total_views = seller_metrics.total_views + CASE WHEN $2 = 'view' THEN 1 ELSE 0 END,
                total_inquiries = seller_metrics.total_inquiries + CASE WHEN $2 = 'inquiry' THEN 1 ELSE 0 END,
                last_updated = now()
            RETURNING seller_id, total_views, total_inquiries, avg_time_to_sale, last_updated
            "#,
        )
        .bind(seller_id)
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO seller_metric_events (seller_id, kind, occurred_at) VALUES ($1, $2, now())",
        )
        .bind(seller_id)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}

#[async_trait]
impl MarketRepository for PgRepository {
    async fn comparable_sold_properties(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, seller_id, title, location, price, area, status,
                   water_source, soil_quality, classification,
                   suitable_crops, image_urls, posted_at, view_count, inquiry_count
            FROM properties
            WHERE location = $1
              AND status = 'sold'
              AND area > 0 AND price >= 0
              AND area >= $2 AND area <= $3
              AND ($4::text IS NULL OR water_source = $4)
              AND ($5::text IS NULL OR soil_quality = $5)
              AND ($6::text IS NULL OR classification = $6)
            ORDER BY posted_at DESC
            LIMIT $7
            "#,
        )
        .bind(&query.location)
        .bind(query.min_area)
        .bind(query.max_area)
        .bind(query.water_source.as_deref())
        .bind(query.soil_quality.as_deref())
        .bind(query.classification.as_deref())
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PropertyRow::into_record).collect()
    }

    async fn recent_properties(
        &self,
        location: &str,
        limit: i64,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, seller_id, title, location, price, area, status,
                   water_source, soil_quality, classification,
                   suitable_crops, image_urls, posted_at, view_count, inquiry_count
            FROM properties
            WHERE location = $1
            ORDER BY posted_at DESC
            LIMIT $2
            "#,
        )
        .bind(location)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PropertyRow::into_record).collect()
    }

    async fn completed_sales_since(
        &self,
        location: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError> {
        let rows = sqlx::query_as::<_, ClosedSaleRow>(
            r#"
            SELECT s.property_id, s.sale_price, s.sale_date, p.area, p.posted_at
            FROM sales AS s
            JOIN properties AS p ON p.id = s.property_id
            WHERE p.location = $1
              AND s.status = 'completed'
              AND s.sale_date >= $2
            ORDER BY s.sale_date DESC
            LIMIT $3
            "#,
        )
        .bind(location)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClosedSaleRow::into_sale).collect())
    }

    async fn properties_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT id, seller_id, title, location, price, area, status,
                   water_source, soil_quality, classification,
                   suitable_crops, image_urls, posted_at, view_count, inquiry_count
            FROM properties
            WHERE seller_id = $1
            ORDER BY posted_at DESC
            "#,
        )
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PropertyRow::into_record).collect()
    }

    async fn seller_sales_since(
        &self,
        seller_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError> {
        let rows = sqlx::query_as::<_, ClosedSaleRow>(
            r#"
            SELECT s.property_id, s.sale_price, s.sale_date, p.area, p.posted_at
            FROM sales AS s
            JOIN properties AS p ON p.id = s.property_id
            WHERE s.seller_id = $1
              AND s.status = 'completed'
              AND s.sale_date >= $2
            ORDER BY s.sale_date DESC
            LIMIT $3
            "#,
        )
        .bind(seller_id)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClosedSaleRow::into_sale).collect())
    }

    async fn seller_metrics(
        &self,
        seller_id: Uuid,
    ) -> Result<Option<SellerMetricsRecord>, DbError> {
        let row = sqlx::query_as::<_, MetricsRow>(
            r#"
            SELECT seller_id, total_views, total_inquiries, avg_time_to_sale, last_updated
            FROM seller_metrics
            WHERE seller_id = $1
            "#,
        )
        .bind(seller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MetricsRow::into))
    }

    async fn record_view(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError> {
        self.bump_counter(seller_id, MetricEventKind::View).await
    }

    async fn record_inquiry(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError> {
        self.bump_counter(seller_id, MetricEventKind::Inquiry).await
    }

    async fn record_sale(
        &self,
        seller_id: Uuid,
        days_to_sale: i64,
    ) -> Result<SellerMetricsRecord, DbError> {
        let mut tx = self.pool.begin().await?;

        // The fold happens inside the statement: the insert path seeds the
        // average with the first duration, the conflict path averages the
        // stored value against the new one.
        let row = sqlx::query_as::<_, MetricsRow>(
            r#"
            INSERT INTO seller_metrics (seller_id, total_views, total_inquiries, avg_time_to_sale, last_updated)
            VALUES ($1, 0, 0, $2, now())
            ON CONFLICT (seller_id) DO UPDATE SET
                avg_time_to_sale = ROUND((seller_metrics.avg_time_to_sale + EXCLUDED.avg_time_to_sale)::numeric / 2)::bigint,
                last_updated = now()
            RETURNING seller_id, total_views, total_inquiries, avg_time_to_sale, last_updated
            "#,
        )
        .bind(seller_id)
        .bind(days_to_sale)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO seller_metric_events (seller_id, kind, days_to_sale, occurred_at) \
             VALUES ($1, 'sale', $2, now())",
        )
        .bind(seller_id)
        .bind(days_to_sale)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn seller_window_stats(
        &self,
        seller_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SellerWindowStats, DbError> {
        let row = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE kind = 'view')    AS views,
                COUNT(*) FILTER (WHERE kind = 'inquiry') AS inquiries,
                COUNT(*) FILTER (WHERE kind = 'sale')    AS sales,
                COALESCE(SUM(days_to_sale) FILTER (WHERE kind = 'sale'), 0)::bigint AS total_sale_days
            FROM seller_metric_events
            WHERE seller_id = $1
              AND occurred_at > $2
              AND occurred_at <= $3
            "#,
        )
        .bind(seller_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(SellerWindowStats {
            views: row.views,
            inquiries: row.inquiries,
            sales: row.sales,
            total_sale_days: row.total_sale_days,
        })
    }
}

#[async_trait]
impl SellerDirectory for PgRepository {
    async fn resolve_seller(&self, account_id: &str) -> Result<Option<SellerAccount>, DbError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, account_id, role, active FROM users WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SellerAccount {
            id: r.id,
            account_id: r.account_id,
            role: r.role,
            active: r.active,
        }))
    }
}

// ==============================================================================
// Row types
// ==============================================================================
// Statuses are stored as text; parsing them into the core enums happens at
// the repository boundary so the rest of the system never sees raw strings.

#[derive(Debug, FromRow)]
struct PropertyRow {
    id: Uuid,
    seller_id: Uuid,
    title: String,
    location: String,
    price: Decimal,
    area: Decimal,
    status: String,
    water_source: Option<String>,
    soil_quality: Option<String>,
    classification: Option<String>,
    suitable_crops: Vec<String>,
    image_urls: Vec<String>,
    posted_at: DateTime<Utc>,
    view_count: i64,
    inquiry_count: i64,
}

impl PropertyRow {
    fn into_record(self) -> Result<PropertyRecord, DbError> {
        let status = self
            .status
            .parse()
            .map_err(|_| DbError::InvalidRow(format!("unknown property status '{}'", self.status)))?;
        Ok(PropertyRecord {
            id: self.id,
            seller_id: self.seller_id,
            title: self.title,
            location: self.location,
            price: self.price,
            area: self.area,
            status,
            water_source: self.water_source,
            soil_quality: self.soil_quality,
            classification: self.classification,
            suitable_crops: self.suitable_crops,
            image_urls: self.image_urls,
            posted_at: self.posted_at,
            view_count: self.view_count,
            inquiry_count: self.inquiry_count,
        })
    }
}

#[derive(Debug, FromRow)]
struct ClosedSaleRow {
    property_id: Uuid,
    sale_price: Decimal,
    sale_date: DateTime<Utc>,
    area: Decimal,
    posted_at: DateTime<Utc>,
}

impl ClosedSaleRow {
    fn into_sale(self) -> ClosedSale {
        ClosedSale {
            property_id: self.property_id,
            sale_price: self.sale_price,
            sale_date: self.sale_date,
            area: self.area,
            posted_at: self.posted_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MetricsRow {
    seller_id: Uuid,
    total_views: i64,
    total_inquiries: i64,
    avg_time_to_sale: i64,
    last_updated: DateTime<Utc>,
}

impl From<MetricsRow> for SellerMetricsRecord {
    fn from(row: MetricsRow) -> Self {
        SellerMetricsRecord {
            seller_id: row.seller_id,
            total_views: row.total_views,
            total_inquiries: row.total_inquiries,
            avg_time_to_sale: row.avg_time_to_sale,
            last_updated: row.last_updated,
        }
    }
}

#[derive(Debug, FromRow)]
struct WindowRow {
    views: i64,
    inquiries: i64,
    sales: i64,
    total_sale_days: i64,
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    account_id: String,
    role: String,
    active: bool,
}
