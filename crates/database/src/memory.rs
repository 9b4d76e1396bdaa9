use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    ClosedSale, MetricEventKind, PropertyRecord, SaleRecord, SaleStatus, SellerAccount,
    SellerMetricsRecord, SellerWindowStats,
};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::repository::{ComparableQuery, MarketRepository, SellerDirectory};
use crate::DbError;

/// An in-memory implementation of the repository ports.
///
/// Backs unit and endpoint tests with plain fixtures; the single mutex gives
/// the same per-seller linearizability the database-level upserts provide.
/// The lock is never held across an await point.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    properties: Vec<PropertyRecord>,
    sales: Vec<SaleRecord>,
    metrics: HashMap<Uuid, SellerMetricsRecord>,
    events: Vec<StoredEvent>,
    accounts: Vec<SellerAccount>,
}

#[derive(Debug, Clone)]
struct StoredEvent {
    seller_id: Uuid,
    kind: MetricEventKind,
    days_to_sale: Option<i64>,
    occurred_at: DateTime<Utc>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_property(&self, property: PropertyRecord) {
        self.lock().properties.push(property);
    }

    pub fn insert_sale(&self, sale: SaleRecord) {
        self.lock().sales.push(sale);
    }

    pub fn insert_account(&self, account: SellerAccount) {
        self.lock().accounts.push(account);
    }

    /// Backdates a metric event, for exercising the trailing windows.
    pub fn insert_event(
        &self,
        seller_id: Uuid,
        kind: MetricEventKind,
        days_to_sale: Option<i64>,
        occurred_at: DateTime<Utc>,
    ) {
        self.lock().events.push(StoredEvent {
            seller_id,
            kind,
            days_to_sale,
            occurred_at,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn closed_sale(inner: &Inner, sale: &SaleRecord) -> Option<ClosedSale> {
        let property = inner.properties.iter().find(|p| p.id == sale.property_id)?;
        Some(ClosedSale {
            property_id: sale.property_id,
            sale_price: sale.sale_price,
            sale_date: sale.sale_date,
            area: property.area,
            posted_at: property.posted_at,
        })
    }
}

#[async_trait]
impl MarketRepository for InMemoryRepository {
    async fn comparable_sold_properties(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let inner = self.lock();
        let mut matches: Vec<PropertyRecord> = inner
            .properties
            .iter()
            .filter(|p| p.location == query.location)
            .filter(|p| p.status == core_types::PropertyStatus::Sold)
            .filter(|p| p.is_valid_comparable())
            .filter(|p| p.area >= query.min_area && p.area <= query.max_area)
            .filter(|p| matches_attr(&query.water_source, &p.water_source))
            .filter(|p| matches_attr(&query.soil_quality, &p.soil_quality))
            .filter(|p| matches_attr(&query.classification, &p.classification))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        matches.truncate(query.limit as usize);
        Ok(matches)
    }

    async fn recent_properties(
        &self,
        location: &str,
        limit: i64,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let inner = self.lock();
        let mut matches: Vec<PropertyRecord> = inner
            .properties
            .iter()
            .filter(|p| p.location == location)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn completed_sales_since(
        &self,
        location: &str,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError> {
        let inner = self.lock();
        let mut matches: Vec<ClosedSale> = inner
            .sales
            .iter()
            .filter(|s| s.status == SaleStatus::Completed && s.sale_date >= since)
            .filter_map(|s| {
                let property = inner.properties.iter().find(|p| p.id == s.property_id)?;
                if property.location != location {
                    return None;
                }
                Self::closed_sale(&inner, s)
            })
            .collect();
        matches.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn properties_for_seller(
        &self,
        seller_id: Uuid,
    ) -> Result<Vec<PropertyRecord>, DbError> {
        let inner = self.lock();
        let mut matches: Vec<PropertyRecord> = inner
            .properties
            .iter()
            .filter(|p| p.seller_id == seller_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(matches)
    }

    async fn seller_sales_since(
        &self,
        seller_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ClosedSale>, DbError> {
        let inner = self.lock();
        let mut matches: Vec<ClosedSale> = inner
            .sales
            .iter()
            .filter(|s| {
                s.seller_id == seller_id
                    && s.status == SaleStatus::Completed
                    && s.sale_date >= since
            })
            .filter_map(|s| Self::closed_sale(&inner, s))
            .collect();
        matches.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        matches.truncate(limit as usize);
        Ok(matches)
    }

    async fn seller_metrics(
        &self,
        seller_id: Uuid,
    ) -> Result<Option<SellerMetricsRecord>, DbError> {
        Ok(self.lock().metrics.get(&seller_id).cloned())
    }

    async fn record_view(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError> {
        let now = Utc::now();
        let mut inner = self.lock();
        let record = inner
            .metrics
            .entry(seller_id)
            .or_insert_with(|| SellerMetricsRecord::empty(seller_id, now));
        record.total_views += 1;
        record.last_updated = now;
        let snapshot = record.clone();
        inner.events.push(StoredEvent {
            seller_id,
            kind: MetricEventKind::View,
            days_to_sale: None,
            occurred_at: now,
        });
        Ok(snapshot)
    }

    async fn record_inquiry(&self, seller_id: Uuid) -> Result<SellerMetricsRecord, DbError> {
        let now = Utc::now();
        let mut inner = self.lock();
        let record = inner
            .metrics
            .entry(seller_id)
            .or_insert_with(|| SellerMetricsRecord::empty(seller_id, now));
        record.total_inquiries += 1;
        record.last_updated = now;
        let snapshot = record.clone();
        inner.events.push(StoredEvent {
            seller_id,
            kind: MetricEventKind::Inquiry,
            days_to_sale: None,
            occurred_at: now,
        });
        Ok(snapshot)
    }

    async fn record_sale(
        &self,
        seller_id: Uuid,
        days_to_sale: i64,
    ) -> Result<SellerMetricsRecord, DbError> {
        let now = Utc::now();
        let mut inner = self.lock();
        let previous = inner.metrics.get(&seller_id).map(|m| m.avg_time_to_sale);
        let record = inner
            .metrics
            .entry(seller_id)
            .or_insert_with(|| SellerMetricsRecord::empty(seller_id, now));
        record.avg_time_to_sale = analytics::seller::fold_time_to_sale(previous, days_to_sale);
        record.last_updated = now;
        let snapshot = record.clone();
        inner.events.push(StoredEvent {
            seller_id,
            kind: MetricEventKind::Sale,
            days_to_sale: Some(days_to_sale),
            occurred_at: now,
        });
        Ok(snapshot)
    }

    async fn seller_window_stats(
        &self,
        seller_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SellerWindowStats, DbError> {
        let inner = self.lock();
        let mut stats = SellerWindowStats::default();
        for event in inner
            .events
            .iter()
            .filter(|e| e.seller_id == seller_id && e.occurred_at > from && e.occurred_at <= to)
        {
            match event.kind {
                MetricEventKind::View => stats.views += 1,
                MetricEventKind::Inquiry => stats.inquiries += 1,
                MetricEventKind::Sale => {
                    stats.sales += 1;
                    stats.total_sale_days += event.days_to_sale.unwrap_or(0);
                }
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl SellerDirectory for InMemoryRepository {
    async fn resolve_seller(&self, account_id: &str) -> Result<Option<SellerAccount>, DbError> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .find(|a| a.account_id == account_id)
            .cloned())
    }
}

fn matches_attr(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(value) => actual.as_deref() == Some(value.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use core_types::PropertyStatus;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sold_property(location: &str, area: Decimal, days_ago: i64) -> PropertyRecord {
        PropertyRecord {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Terraced hillside parcel".to_string(),
            location: location.to_string(),
            price: dec!(1_000_000),
            area,
            status: PropertyStatus::Sold,
            water_source: None,
            soil_quality: None,
            classification: None,
            suitable_crops: vec![],
            image_urls: vec![],
            posted_at: Utc::now() - Duration::days(days_ago),
            view_count: 0,
            inquiry_count: 0,
        }
    }

    fn band_query(location: &str, min: Decimal, max: Decimal) -> ComparableQuery {
        ComparableQuery {
            location: location.to_string(),
            min_area: min,
            max_area: max,
            water_source: None,
            soil_quality: None,
            classification: None,
            limit: 20,
        }
    }

    #[tokio::test]
    async fn comparables_filter_by_location_band_and_status() {
        let repo = InMemoryRepository::new();
        repo.insert_property(sold_property("Nakuru", dec!(10), 1));
        repo.insert_property(sold_property("Nakuru", dec!(30), 2)); // outside band
        repo.insert_property(sold_property("Kitale", dec!(10), 3)); // wrong location
        let mut active = sold_property("Nakuru", dec!(10), 4);
        active.status = PropertyStatus::Active;
        repo.insert_property(active);

        let found = repo
            .comparable_sold_properties(&band_query("Nakuru", dec!(8), dec!(12)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].area, dec!(10));
    }

    #[tokio::test]
    async fn comparables_are_newest_first_and_capped() {
        let repo = InMemoryRepository::new();
        for day in 0..25 {
            repo.insert_property(sold_property("Nakuru", dec!(10), day));
        }
        let found = repo
            .comparable_sold_properties(&band_query("Nakuru", dec!(8), dec!(12)))
            .await
            .unwrap();
        assert_eq!(found.len(), 20);
        assert!(found.windows(2).all(|w| w[0].posted_at >= w[1].posted_at));
    }

    #[tokio::test]
    async fn counters_are_created_lazily_and_incremented() {
        let repo = InMemoryRepository::new();
        let seller = Uuid::new_v4();
        assert!(repo.seller_metrics(seller).await.unwrap().is_none());

        repo.record_view(seller).await.unwrap();
        repo.record_view(seller).await.unwrap();
        let after = repo.record_inquiry(seller).await.unwrap();
        assert_eq!(after.total_views, 2);
        assert_eq!(after.total_inquiries, 1);
    }

    #[tokio::test]
    async fn sale_average_folds_last_two_samples() {
        let repo = InMemoryRepository::new();
        let seller = Uuid::new_v4();
        let first = repo.record_sale(seller, 40).await.unwrap();
        assert_eq!(first.avg_time_to_sale, 40);
        let second = repo.record_sale(seller, 60).await.unwrap();
        assert_eq!(second.avg_time_to_sale, 50);
    }

    #[tokio::test]
    async fn window_stats_partition_by_timestamp() {
        let repo = InMemoryRepository::new();
        let seller = Uuid::new_v4();
        let now = Utc::now();
        repo.insert_event(seller, MetricEventKind::View, None, now - Duration::days(5));
        repo.insert_event(seller, MetricEventKind::View, None, now - Duration::days(45));
        repo.insert_event(
            seller,
            MetricEventKind::Sale,
            Some(30),
            now - Duration::days(45),
        );

        let recent = repo
            .seller_window_stats(seller, now - Duration::days(30), now)
            .await
            .unwrap();
        assert_eq!(recent.views, 1);
        assert_eq!(recent.sales, 0);

        let previous = repo
            .seller_window_stats(seller, now - Duration::days(60), now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(previous.views, 1);
        assert_eq!(previous.sales, 1);
        assert_eq!(previous.total_sale_days, 30);
    }

    #[tokio::test]
    async fn directory_resolves_accounts_verbatim() {
        let repo = InMemoryRepository::new();
        let account = SellerAccount {
            id: Uuid::new_v4(),
            account_id: "grower-77".to_string(),
            role: "seller".to_string(),
            active: true,
        };
        repo.insert_account(account.clone());

        let resolved = repo.resolve_seller("grower-77").await.unwrap();
        assert_eq!(resolved, Some(account));
        assert_eq!(repo.resolve_seller("nobody").await.unwrap(), None);
    }
}
